//! FAT volume classification and description.
//!
//! This module ties the FAT pieces together:
//! - Classifying the boot area through the layout cascade
//! - Decoding the chosen layout and scanning the root directory
//! - Displaying the volume layout
//! - Projecting the decoded record onto [`FileSystemInfo`]

pub mod bpb;
pub mod classifier;
pub mod dir_entry;
pub mod fat_type;
pub mod floppy;
pub mod report;

use getset::Getters;
use log::{trace, warn};
use std::fmt::Write as FmtWrite;

use self::bpb::NormalizedVolumeDescriptor;
use self::dir_entry::RootDirectoryScan;
use self::fat_type::FATType;
use crate::device::{self, SectorGeometry, SectorSource};
use crate::filesystem::classification::{AuxPurpose, Classification};
use crate::filesystem::fs_error::FsError;
use crate::filesystem::metadata::{Description, FileSystemInfo};
use crate::traits::{Detector, LayoutDisplay};

/// Structure for a FAT volume.
///
/// Essentially, it is the classification of the partition plus its decoded record.
#[derive(Debug, Clone, Getters)]
pub struct FATVol {
    #[get = "pub"]
    classification: Classification,
    #[get = "pub"]
    descriptor: NormalizedVolumeDescriptor,
    #[get = "pub"]
    geometry: SectorGeometry,
}

impl FATVol {
    /// Classifies and decodes the partition described by `geometry`.
    ///
    /// # Errors
    /// - `FsError::NotRecognized` if no FAT layout matched
    /// - `FsError::GeometryTooSmall` if the partition cannot hold a FAT volume
    /// - `FsError::Source` if the sector source failed inside the geometry
    pub fn open(source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<FATVol, FsError> {
        let classification = classifier::classify(source, geometry)?;
        let descriptor = bpb::decode(&classification, geometry)?;
        let scan = scan_root(source, geometry, &classification, &descriptor)?;

        Ok(Self {
            descriptor: descriptor.with_root_directory(scan),
            classification,
            geometry: *geometry,
        })
    }

    /// Normalized metadata projection.
    pub fn info(&self) -> FileSystemInfo {
        let d = &self.descriptor;
        let scan = d.root_directory().as_ref();

        FileSystemInfo {
            fs_type: d.subtype().to_string(),
            cluster_size: d.cluster_size_bytes(),
            clusters: d.total_clusters(),
            free_clusters: d.free_clusters(),
            volume_name: d.effective_label().unwrap_or_default().to_string(),
            volume_serial: d.serial_string(),
            creation_date: scan.and_then(RootDirectoryScan::created),
            modification_date: scan.and_then(RootDirectoryScan::modified),
            system_identifier: d.oem_name().clone(),
            bootable: d.bootable(),
            dirty: d.dirty(),
        }
    }

    fn bytes_per_sector(&self) -> u64 {
        u64::from(self.descriptor.bytes_per_sector().max(1))
    }

    /// Returns the starting sector of the reserved region.
    fn rsvd_start(&self) -> u64 {
        0
    }

    /// Returns the starting sector of the first FAT.
    fn fat_start(&self) -> u64 {
        self.rsvd_start() + u64::from(self.descriptor.reserved_sectors())
    }

    /// Returns the starting sector of the root directory.
    fn root_start(&self) -> u64 {
        self.fat_start()
            + u64::from(self.descriptor.sectors_per_fat()) * u64::from(self.descriptor.fat_count())
    }

    /// Returns the starting sector of the data region.
    fn data_start(&self) -> u64 {
        match self.descriptor.subtype() {
            FATType::FAT32 | FATType::FATPlus => self.root_start(),
            _ => {
                self.root_start()
                    + (u64::from(self.descriptor.root_entries()) * 32)
                        .div_ceil(self.bytes_per_sector())
            }
        }
    }

    /// Returns the ending sector of the volume.
    fn data_end(&self) -> u64 {
        self.descriptor.sector_count()
    }

    /// Returns the ending sector of the partition, in the volume's logical sectors.
    fn partition_end(&self) -> u64 {
        self.geometry.partition_bytes() / self.bytes_per_sector()
    }
}

/// Reads the root directory and looks for the volume label entry.
///
/// A root directory that lies outside the partition is reported and skipped.
fn scan_root(
    source: &dyn SectorSource,
    geometry: &SectorGeometry,
    classification: &Classification,
    descriptor: &NormalizedVolumeDescriptor,
) -> Result<Option<RootDirectoryScan>, FsError> {
    if let Some(root) = classification.aux_buffer(AuxPurpose::RainbowRoot) {
        return dir_entry::scan_root_directory(root);
    }

    let offset = descriptor.root_directory_offset();
    let len = descriptor.root_directory_bytes();
    if len == 0 || offset + len > geometry.partition_bytes() {
        warn!(
            "Root directory at byte {offset} ({len} bytes) lies outside the partition, skipping the label scan"
        );
        return Ok(None);
    }

    trace!("reading {len} bytes of root directory at byte {offset}");
    let start = geometry.partition_start() * u64::from(geometry.bytes_per_sector());
    let buf = device::read_bytes(source, start + offset, len as usize)?;
    dir_entry::scan_root_directory(&buf)
}

/// Implements the LayoutDisplay trait for FATVol
impl LayoutDisplay for FATVol {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());
        let title = format!(" {} Volume Layout ", self.descriptor.subtype());

        writeln!(out, "{}┌{:─^55}┐", indent, title)?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;

        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Reserved",
            self.rsvd_start(),
            self.fat_start(),
            "Boot + Reserved"
        )?;
        for i in 0..u64::from(self.descriptor.fat_count()) {
            let fat_i_start = self.fat_start() + i * u64::from(self.descriptor.sectors_per_fat());
            let fat_i_end = fat_i_start + u64::from(self.descriptor.sectors_per_fat());
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                format!("FAT #{}", i),
                fat_i_start,
                fat_i_end,
                "FAT Tables"
            )?;
        }
        if self.data_start() > self.root_start() {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                "Root Dir",
                self.root_start(),
                self.data_start(),
                "Root Directory"
            )?;
        }
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Data",
            self.data_start(),
            self.data_end(),
            "Cluster Data"
        )?;
        if self.data_end() < self.partition_end() {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                "",
                self.data_end(),
                self.partition_end(),
                "Volume Slack"
            )?;
        }

        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        Ok(out)
    }
}

/// Detector for the FAT family of layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FatDetector;

impl Detector for FatDetector {
    type Metadata = NormalizedVolumeDescriptor;

    fn name(&self) -> &'static str {
        "FAT"
    }

    fn identify(&self, source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<bool, FsError> {
        classifier::identify(source, geometry)
    }

    fn describe(
        &self,
        source: &dyn SectorSource,
        geometry: &SectorGeometry,
    ) -> Result<Description<Self::Metadata>, FsError> {
        let vol = FATVol::open(source, geometry)?;
        let info = vol.info();
        let report = vol.descriptor.to_string();

        Ok(Description::new(
            vol.descriptor.layout(),
            report,
            vol.descriptor,
            info,
        ))
    }
}
