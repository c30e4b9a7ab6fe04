//! System V family (XENIX, SVR2, SVR4, Coherent, 7th Edition) superblock recognition.

pub mod classifier;
pub mod report;
pub mod superblock;

use getset::Getters;

use self::superblock::SuperblockDescriptor;
use crate::device::{SectorGeometry, SectorSource};
use crate::filesystem::classification::Classification;
use crate::filesystem::fs_error::FsError;
use crate::filesystem::metadata::{Description, FileSystemInfo};
use crate::traits::{Detector, LayoutDisplay};

/// A classified and decoded System V family volume.
#[derive(Debug, Clone, Getters)]
pub struct SysvVol {
    #[get = "pub"]
    classification: Classification,
    #[get = "pub"]
    descriptor: SuperblockDescriptor,
    #[get = "pub"]
    geometry: SectorGeometry,
}

impl SysvVol {
    /// Locates and decodes the superblock of the partition described by `geometry`.
    ///
    /// # Errors
    /// - `FsError::NotRecognized` if no candidate location holds a known superblock
    /// - `FsError::GeometryTooSmall` if the partition cannot hold a superblock
    /// - `FsError::Source` if the sector source failed inside the geometry
    pub fn open(source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<SysvVol, FsError> {
        let classification = classifier::classify(source, geometry)?;
        let descriptor = superblock::decode(&classification, geometry)?;
        Ok(Self {
            classification,
            descriptor,
            geometry: *geometry,
        })
    }

    pub fn info(&self) -> FileSystemInfo {
        let d = &self.descriptor;
        FileSystemInfo {
            fs_type: d.fs_type().to_string(),
            cluster_size: d.block_size(),
            clusters: d.total_blocks(),
            free_clusters: Some(d.free_blocks()),
            volume_name: d.volume_name().clone(),
            volume_serial: None,
            creation_date: None,
            modification_date: d.last_update(),
            system_identifier: d.pack_name().clone(),
            bootable: false,
            dirty: d.clean() == Some(false),
        }
    }
}

impl LayoutDisplay for SysvVol {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        use std::fmt::Write;

        let mut out = String::new();
        let indent = " ".repeat(indent.into());
        let d = &self.descriptor;
        let sector_size = u64::from(self.geometry.bytes_per_sector());
        let sb_start = d.offset() / sector_size;
        // Block 0 is the boot block, block 1 the superblock, then the inode list.
        let blocks_to_sectors = |blocks: u64| blocks * d.block_size() / sector_size;
        let inodes_start = blocks_to_sectors(2);
        let data_start = blocks_to_sectors(2 + d.inode_blocks());
        let data_end = blocks_to_sectors(d.total_blocks());

        writeln!(out, "{}┌{:─^55}┐", indent, format!(" {} Layout ", d.fs_type()))?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(out, "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤", indent, "", "", "", "")?;
        for (region, start, end, description) in [
            ("Superblock", sb_start, sb_start + (512 / sector_size).max(1), "Superblock"),
            ("Inodes", inodes_start, data_start, "Inode List"),
            ("Data", data_start, data_end, "Data Blocks"),
        ] {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent, region, start, end, description
            )?;
        }
        if data_end < self.geometry.partition_length() {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                "",
                data_end,
                self.geometry.partition_length(),
                "Volume Slack"
            )?;
        }
        writeln!(out, "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘", indent, "", "", "", "")?;

        Ok(out)
    }
}

/// Detector for the System V family of superblocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysvDetector;

impl Detector for SysvDetector {
    type Metadata = SuperblockDescriptor;

    fn name(&self) -> &'static str {
        "System V"
    }

    fn identify(&self, source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<bool, FsError> {
        match classifier::classify(source, geometry) {
            Ok(_) => Ok(true),
            Err(FsError::NotRecognized | FsError::GeometryTooSmall { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn describe(
        &self,
        source: &dyn SectorSource,
        geometry: &SectorGeometry,
    ) -> Result<Description<Self::Metadata>, FsError> {
        let vol = SysvVol::open(source, geometry)?;
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
