//! FAT Bpb decoding.
//!
//! This module implements:
//! - Decoding of any classified BPB flavour into one [`NormalizedVolumeDescriptor`]
//! - FAT32 FSINFO sector parsing
//! - Boot code bootability and fingerprint
//! - A raw field dump of the boot sector through the chosen layout's offset table

use binread::{BinRead, BinReaderExt};
use getset::{CopyGetters, Getters};
use log::warn;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;

use super::dir_entry::RootDirectoryScan;
use super::fat_type::FATType;
use crate::device::SectorGeometry;
use crate::filesystem::classification::{AuxPurpose, Classification};
use crate::filesystem::fs_error::FsError;
use crate::filesystem::layout::{Field, LayoutDescriptor, LayoutView, Width};
use crate::filesystem::predicates;
use crate::utils;

/// Sum of the big-endian words of a bootable Atari boot sector.
pub const ATARI_BOOT_CHECKSUM: u16 = 0x1234;

const FSINFO_LEAD_SIG: u32 = 0x4161_5252;
const FSINFO_STRUCT_SIG: u32 = 0x6141_7272;
const FSINFO_TRAIL_SIG: u32 = 0xAA55_0000;
const FSINFO_UNKNOWN: u32 = 0xFFFF_FFFF;

/// FAT32 file system information sector.
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq, Serialize, CopyGetters)]
#[br(little)]
#[getset(get_copy = "pub")]
pub struct FsInfo {
    lead_sig: u32,
    #[br(pad_before = 480)]
    struct_sig: u32,
    /// Last known free cluster count, 0xFFFFFFFF if unknown
    free_count: u32,
    /// Hint for the next free cluster, 0xFFFFFFFF if unknown
    next_free: u32,
    #[br(pad_before = 12)]
    trail_sig: u32,
}

impl FsInfo {
    pub fn from_slice(buf: &[u8]) -> Result<Self, FsError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FsError::from)
    }

    pub fn is_valid(&self) -> bool {
        self.lead_sig == FSINFO_LEAD_SIG
            && self.struct_sig == FSINFO_STRUCT_SIG
            && self.trail_sig == FSINFO_TRAIL_SIG
    }

    pub fn known_free_count(&self) -> Option<u32> {
        match self.free_count {
            FSINFO_UNKNOWN => None,
            count => Some(count),
        }
    }
}

/// Fields only FAT32 layouts carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Fat32Fields {
    sectors_per_fat32: u32,
    mirror_flags: u16,
    version: u16,
    root_cluster: u32,
    fs_info_sector: u16,
    backup_sector: u16,
}

/// Fields specific to one family of layouts, beyond the canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VariantDetail {
    Atari {
        exec_flag: u16,
        load_mode: u16,
        boot_file: String,
        checksum: u16,
    },
    Apricot {
        version: String,
        operating_system: u8,
        write_protected: bool,
        copy_protected: bool,
        boot_type: u8,
        partition_count: u8,
        winchester: bool,
        sector_size: u16,
        sectors_per_track: u16,
        cylinders: u32,
        heads: u8,
    },
    /// Geometry taken from a hard-coded table.
    Fixed { description: &'static str },
}

/// Canonical decoded record of any FAT-family layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct NormalizedVolumeDescriptor {
    #[getset(get_copy = "pub")]
    layout: LayoutDescriptor,
    #[getset(get = "pub")]
    oem_name: String,
    /// Whether every byte of the OEM name is printable ASCII.
    #[getset(get_copy = "pub")]
    oem_name_printable: bool,
    #[getset(get_copy = "pub")]
    bytes_per_sector: u16,
    #[getset(get_copy = "pub")]
    sectors_per_cluster: u8,
    #[getset(get_copy = "pub")]
    reserved_sectors: u16,
    #[getset(get_copy = "pub")]
    fat_count: u8,
    #[getset(get_copy = "pub")]
    root_entries: u16,
    #[getset(get_copy = "pub")]
    sector_count: u64,
    #[getset(get_copy = "pub")]
    media_descriptor: u8,
    #[getset(get_copy = "pub")]
    sectors_per_fat: u32,
    #[getset(get_copy = "pub")]
    sectors_per_track: u16,
    #[getset(get_copy = "pub")]
    head_count: u16,
    #[getset(get_copy = "pub")]
    hidden_sectors: u64,
    #[getset(get_copy = "pub")]
    drive_number: u8,
    #[getset(get_copy = "pub")]
    volume_flags: u8,
    #[getset(get_copy = "pub")]
    signature_byte: u8,
    #[getset(get_copy = "pub")]
    serial_number: Option<u32>,
    /// Label stored in the BPB.
    #[getset(get = "pub")]
    volume_label: Option<String>,
    #[getset(get = "pub")]
    fs_type_tag: Option<String>,
    #[getset(get_copy = "pub")]
    boot_signature: u16,
    #[serde(skip)]
    #[getset(get = "pub")]
    boot_code: Vec<u8>,
    #[getset(get_copy = "pub")]
    fat32: Option<Fat32Fields>,

    #[getset(get_copy = "pub")]
    cluster_size_bytes: u64,
    #[getset(get_copy = "pub")]
    total_clusters: u64,
    #[getset(get_copy = "pub")]
    subtype: FATType,
    /// Root directory position in sectors of the underlying medium.
    #[getset(get_copy = "pub")]
    root_directory_sector: u64,
    /// Root directory position in bytes from the partition start.
    #[getset(get_copy = "pub")]
    root_directory_offset: u64,
    #[getset(get_copy = "pub")]
    root_directory_bytes: u64,
    #[getset(get_copy = "pub")]
    bootable: bool,
    /// SHA-256 of the boot code, for bootable volumes.
    #[getset(get = "pub")]
    boot_digest: Option<String>,
    #[getset(get_copy = "pub")]
    dirty: bool,
    #[getset(get_copy = "pub")]
    surface_scan: bool,
    #[getset(get_copy = "pub")]
    fs_info: Option<FsInfo>,
    #[getset(get = "pub")]
    detail: Option<VariantDetail>,
    #[getset(get = "pub")]
    root_directory: Option<RootDirectoryScan>,
}

impl NormalizedVolumeDescriptor {
    fn empty(layout: LayoutDescriptor) -> Self {
        Self {
            layout,
            oem_name: String::new(),
            oem_name_printable: false,
            bytes_per_sector: 0,
            sectors_per_cluster: 0,
            reserved_sectors: 0,
            fat_count: 0,
            root_entries: 0,
            sector_count: 0,
            media_descriptor: 0,
            sectors_per_fat: 0,
            sectors_per_track: 0,
            head_count: 0,
            hidden_sectors: 0,
            drive_number: 0,
            volume_flags: 0,
            signature_byte: 0,
            serial_number: None,
            volume_label: None,
            fs_type_tag: None,
            boot_signature: 0,
            boot_code: Vec::new(),
            fat32: None,
            cluster_size_bytes: 0,
            total_clusters: 0,
            subtype: FATType::FAT12,
            root_directory_sector: 0,
            root_directory_offset: 0,
            root_directory_bytes: 0,
            bootable: false,
            boot_digest: None,
            dirty: false,
            surface_scan: false,
            fs_info: None,
            detail: None,
            root_directory: None,
        }
    }

    /// Attaches the result of the root directory scan.
    pub fn with_root_directory(mut self, scan: Option<RootDirectoryScan>) -> Self {
        self.root_directory = scan;
        self
    }

    /// Label of the volume: the root directory label entry wins over the BPB label.
    pub fn effective_label(&self) -> Option<&str> {
        self.root_directory
            .as_ref()
            .map(|scan| scan.label().as_str())
            .or(self.volume_label.as_deref())
            .filter(|label| !label.is_empty())
    }

    /// Serial number formatted the way the layout's tooling prints it.
    pub fn serial_string(&self) -> Option<String> {
        self.serial_number.map(|serial| match self.layout {
            LayoutDescriptor::Atari => format!("{serial:06X}"),
            _ => format!("{serial:08X}"),
        })
    }

    /// Free clusters recorded by a valid FSINFO sector.
    pub fn free_clusters(&self) -> Option<u64> {
        self.fs_info
            .filter(FsInfo::is_valid)
            .and_then(|info| info.known_free_count())
            .map(u64::from)
    }
}

/// Maps a classified buffer onto the canonical record.
///
/// One pass over the chosen layout's offset table; layouts without a BPB start from their
/// hard-coded geometry.
pub fn decode(
    classification: &Classification,
    geometry: &SectorGeometry,
) -> Result<NormalizedVolumeDescriptor, FsError> {
    let layout = classification.layout();
    let view = classification.view(geometry.sector_scale());
    let mut d = NormalizedVolumeDescriptor::empty(layout);

    let mut sectors16 = 0;
    let mut big_sectors = 0;
    let mut huge_sectors = 0;
    let mut fat32 = Fat32Fields::default();

    if let Some(fixed) = classification.fixed() {
        d.bytes_per_sector = fixed.bytes_per_sector;
        d.sectors_per_cluster = fixed.sectors_per_cluster;
        d.reserved_sectors = fixed.reserved_sectors;
        d.fat_count = fixed.fat_count;
        d.root_entries = fixed.root_entries;
        d.media_descriptor = fixed.media;
        d.sectors_per_fat = u32::from(fixed.sectors_per_fat);
        d.sectors_per_track = fixed.sectors_per_track;
        d.head_count = fixed.heads;
        sectors16 = fixed.total_sectors;
        d.detail = Some(VariantDetail::Fixed {
            description: fixed.description,
        });
    }

    for spec in layout.fields() {
        let value = view.scaled(spec);
        let bytes = spec.read_bytes(view.reader());
        match spec.field {
            Field::OemName | Field::AtariOem => {
                d.oem_name = utils::oem_string(bytes);
                d.oem_name_printable = predicates::ascii_printable_run(bytes);
            }
            Field::ApricotVersion => {
                let text = bytes.split(|b| *b == 0).next().unwrap_or_default();
                d.oem_name = utils::c_string(bytes);
                d.oem_name_printable = predicates::ascii_printable_run(text);
            }
            Field::BytesPerSector => d.bytes_per_sector = value as u16,
            Field::SectorsPerCluster => d.sectors_per_cluster = value as u8,
            Field::ReservedSectors => d.reserved_sectors = value as u16,
            Field::FatCount => d.fat_count = value as u8,
            Field::RootEntries => d.root_entries = value as u16,
            Field::Sectors16 => sectors16 = value,
            Field::BigSectors => big_sectors = value,
            Field::HugeSectors => huge_sectors = value,
            Field::MediaDescriptor => d.media_descriptor = value as u8,
            Field::SectorsPerFat16 => d.sectors_per_fat = value as u32,
            Field::SectorsPerTrack => d.sectors_per_track = value as u16,
            Field::HeadCount => d.head_count = value as u16,
            Field::HiddenSectors16 | Field::HiddenSectors32 => d.hidden_sectors = value,
            Field::DriveNumber => d.drive_number = value as u8,
            Field::VolumeFlags => d.volume_flags = value as u8,
            Field::Signature => d.signature_byte = value as u8,
            Field::Serial => d.serial_number = Some(value as u32),
            Field::AtariSerial => {
                d.serial_number = Some(bytes.iter().rev().fold(0, |acc, b| (acc << 8) | u32::from(*b)))
            }
            Field::VolumeLabel => d.volume_label = Some(utils::oem_string(bytes)),
            Field::FsType => d.fs_type_tag = Some(utils::oem_string(bytes)),
            Field::BootSignature => d.boot_signature = value as u16,
            Field::BootCode => d.boot_code = bytes.to_vec(),
            Field::SectorsPerFat32 => fat32.sectors_per_fat32 = value as u32,
            Field::MirrorFlags => fat32.mirror_flags = value as u16,
            Field::Version => fat32.version = value as u16,
            Field::RootCluster => fat32.root_cluster = value as u32,
            Field::FsInfoSector => fat32.fs_info_sector = value as u16,
            Field::BackupSector => fat32.backup_sector = value as u16,
            _ => {}
        }
    }

    if layout.is_fat32() {
        d.sectors_per_fat = fat32.sectors_per_fat32;
        d.fat32 = Some(fat32);
    }

    d.sector_count = match layout {
        LayoutDescriptor::Fat32 => big_sectors,
        LayoutDescriptor::ShortFat32 if big_sectors != 0 => big_sectors,
        LayoutDescriptor::ShortFat32 => huge_sectors,
        LayoutDescriptor::Dos33 if big_sectors != 0 => big_sectors,
        _ if sectors16 != 0 => sectors16,
        _ => big_sectors,
    };

    d.cluster_size_bytes = u64::from(d.bytes_per_sector) * u64::from(d.sectors_per_cluster);
    d.total_clusters = d.sector_count / u64::from(d.sectors_per_cluster.max(1));
    d.subtype = FATType::detect(layout, fat32.version, d.total_clusters);

    locate_root_directory(&mut d, geometry);

    match layout {
        LayoutDescriptor::Atari => d.detail = Some(atari_detail(&view)),
        LayoutDescriptor::Apricot => d.detail = Some(apricot_detail(&view)),
        _ => {}
    }

    d.bootable = match layout {
        LayoutDescriptor::Atari => atari_checksum(classification.raw()) == ATARI_BOOT_CHECKSUM,
        LayoutDescriptor::Apricot
        | LayoutDescriptor::DecRainbow
        | LayoutDescriptor::LegacyFloppy => false,
        _ => predicates::x86_bootable(view.bytes(Field::Jump), d.boot_signature),
    };
    if d.bootable {
        d.boot_digest = Some(format!("{:x}", Sha256::digest(&d.boot_code)));
    }

    if matches!(
        layout,
        LayoutDescriptor::Fat32
            | LayoutDescriptor::ShortFat32
            | LayoutDescriptor::Ebpb
            | LayoutDescriptor::ShortEbpb
    ) && d.volume_flags & 0xF8 == 0
    {
        d.dirty = d.volume_flags & 0x01 != 0;
        d.surface_scan = d.volume_flags & 0x02 != 0;
    }

    if let Some(buf) = classification.aux_buffer(AuxPurpose::FsInfo) {
        let info = FsInfo::from_slice(buf)?;
        if !info.is_valid() {
            warn!(
                "FSINFO sector {} has bad signatures, ignoring its free cluster count",
                fat32.fs_info_sector
            );
        }
        d.fs_info = Some(info);
    }

    Ok(d)
}

/// Positions the root directory in both logical and underlying sectors.
fn locate_root_directory(d: &mut NormalizedVolumeDescriptor, geometry: &SectorGeometry) {
    let bps = u64::from(d.bytes_per_sector);
    let spc = u64::from(d.sectors_per_cluster);
    let before_root = u64::from(d.sectors_per_fat) * u64::from(d.fat_count)
        + u64::from(d.reserved_sectors);

    let (logical_sector, bytes) = match d.fat32 {
        Some(fat32) => (
            u64::from(fat32.root_cluster).saturating_sub(2) * spc + before_root,
            spc * bps,
        ),
        None => (before_root, u64::from(d.root_entries) * 32),
    };

    d.root_directory_offset = logical_sector * bps;
    d.root_directory_sector = d.root_directory_offset / u64::from(geometry.bytes_per_sector());
    d.root_directory_bytes = bytes;
}

/// Wrapping sum of the 256 big-endian words of an Atari boot sector.
pub fn atari_checksum(boot: &[u8]) -> u16 {
    boot.chunks_exact(2)
        .take(256)
        .fold(0u16, |acc, word| acc.wrapping_add(u16::from_be_bytes([word[0], word[1]])))
}

fn atari_detail(view: &LayoutView<'_>) -> VariantDetail {
    VariantDetail::Atari {
        exec_flag: view.raw(Field::AtariExecFlag) as u16,
        load_mode: view.raw(Field::AtariLoadMode) as u16,
        boot_file: utils::oem_string(view.bytes(Field::AtariBootFile)),
        checksum: atari_checksum(view.reader().bytes(0, 512)),
    }
}

fn apricot_detail(view: &LayoutView<'_>) -> VariantDetail {
    VariantDetail::Apricot {
        version: utils::c_string(view.bytes(Field::ApricotVersion)),
        operating_system: view.raw(Field::ApricotOs) as u8,
        write_protected: view.raw(Field::ApricotWriteProtected) != 0,
        copy_protected: view.raw(Field::ApricotCopyProtected) != 0,
        boot_type: view.raw(Field::ApricotBootType) as u8,
        partition_count: view.raw(Field::PartitionCount) as u8,
        winchester: view.raw(Field::ApricotWinchester) != 0,
        sector_size: view.raw(Field::ApricotSectorSize) as u16,
        sectors_per_track: view.raw(Field::SectorsPerTrack) as u16,
        cylinders: view.raw(Field::ApricotCylinders) as u32,
        heads: view.raw(Field::HeadCount) as u8,
    }
}

/// Raw boot sector fields, listed through the offset table of the chosen layout.
pub struct FieldDump<'a> {
    view: LayoutView<'a>,
}

impl<'a> FieldDump<'a> {
    pub fn new(classification: &'a Classification, geometry: &SectorGeometry) -> Self {
        Self {
            view: classification.view(geometry.sector_scale()),
        }
    }
}

/// Implements the Display trait for FieldDump
impl fmt::Display for FieldDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! field {
            ($name:expr, $offset:expr, $val:expr) => {{
                writeln!(f, "  {:<20} 0x{:>04X}: {}", $name, $offset, $val)?;
            }};
        }

        writeln!(f, "{} ({}):", self.view.layout(), self.view.reader().endian())?;

        let mut code = None;
        for spec in self.view.layout().fields() {
            let bytes = spec.read_bytes(self.view.reader());
            match (spec.field, spec.width) {
                (Field::BootCode, _) => code = Some((spec.offset, bytes)),
                (Field::OemName | Field::AtariOem | Field::VolumeLabel | Field::FsType, _)
                | (Field::AtariBootFile | Field::VolId | Field::ApricotVersion, _) => {
                    field!(spec.field.name(), spec.offset, format!("{:?}", utils::oem_string(bytes)))
                }
                (_, Width::Bytes(_)) => {
                    field!(spec.field.name(), spec.offset, format!("{bytes:02X?}"))
                }
                _ => field!(spec.field.name(), spec.offset, spec.read_raw(self.view.reader())),
            }
        }

        // Boot code last, as a hex dump
        if let Some((offset, bytes)) = code {
            writeln!(f, "\nBoot Code 0x{:04X} ({} bytes):", offset, bytes.len())?;
            for (i, chunk) in bytes.chunks(16).enumerate() {
                write!(f, "  0x{:04X}: ", offset + i * 16)?;
                for byte in chunk {
                    write!(f, "{byte:02X} ")?;
                }
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MediaKind;
    use crate::utils::Endian;

    fn dos33_floppy() -> Vec<u8> {
        let mut boot = vec![0u8; 1024];
        boot[..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        boot[3..11].copy_from_slice(b"IBM  3.3");
        boot[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
        boot[0x0D] = 1;
        boot[0x0E] = 1;
        boot[0x10] = 2;
        boot[0x11..0x13].copy_from_slice(&224u16.to_le_bytes());
        boot[0x13..0x15].copy_from_slice(&2880u16.to_le_bytes());
        boot[0x15] = 0xF0;
        boot[0x16] = 9;
        boot[0x18] = 18;
        boot[0x1A] = 2;
        boot[0x1FE] = 0x55;
        boot[0x1FF] = 0xAA;
        boot
    }

    #[test]
    fn decodes_through_the_offset_table() {
        let geometry = SectorGeometry::new(512, 2880, MediaKind::Other, 0, 2879).unwrap();
        let classification = Classification::new(LayoutDescriptor::Dos33, Endian::Little, dos33_floppy());
        let d = decode(&classification, &geometry).unwrap();

        assert_eq!(d.oem_name(), "IBM  3.3");
        assert_eq!(d.sector_count(), 2880);
        assert_eq!(d.cluster_size_bytes(), 512);
        assert_eq!(d.total_clusters(), 2880);
        assert_eq!(d.subtype(), FATType::FAT12);
        assert_eq!(d.root_directory_sector(), 19);
        assert_eq!(d.root_directory_bytes(), 224 * 32);
        assert!(d.bootable());
        assert_eq!(d.boot_digest().as_ref().map(String::len), Some(64));
    }

    #[test]
    fn optical_media_divides_sector_counts() {
        let geometry = SectorGeometry::new(2048, 720, MediaKind::OpticalDisc, 0, 719).unwrap();
        let classification = Classification::new(LayoutDescriptor::Dos33, Endian::Little, dos33_floppy());
        let d = decode(&classification, &geometry).unwrap();

        assert_eq!(d.sector_count(), 720);
        assert_eq!(d.reserved_sectors(), 1);
        // 19 logical sectors of 512 bytes sit inside the fifth 2048-byte sector
        assert_eq!(d.root_directory_offset(), 19 * 512);
        assert_eq!(d.root_directory_sector(), 4);
    }

    #[test]
    fn fsinfo_signatures() {
        let mut buf = vec![0u8; 512];
        buf[0..4].copy_from_slice(&FSINFO_LEAD_SIG.to_le_bytes());
        buf[0x1E4..0x1E8].copy_from_slice(&FSINFO_STRUCT_SIG.to_le_bytes());
        buf[0x1E8..0x1EC].copy_from_slice(&1234u32.to_le_bytes());
        buf[0x1EC..0x1F0].copy_from_slice(&FSINFO_UNKNOWN.to_le_bytes());
        buf[0x1FC..0x200].copy_from_slice(&FSINFO_TRAIL_SIG.to_le_bytes());

        let info = FsInfo::from_slice(&buf).unwrap();
        assert!(info.is_valid());
        assert_eq!(info.known_free_count(), Some(1234));
        assert_eq!(info.next_free(), FSINFO_UNKNOWN);

        buf[0] = 0;
        assert!(!FsInfo::from_slice(&buf).unwrap().is_valid());
    }

    #[test]
    fn atari_checksum_sums_big_endian_words() {
        let mut boot = vec![0u8; 512];
        boot[0] = 0x12;
        boot[1] = 0x30;
        boot[510] = 0x00;
        boot[511] = 0x04;
        assert_eq!(atari_checksum(&boot), 0x1234);
    }

    #[test]
    fn field_dump_lists_the_layout() {
        let geometry = SectorGeometry::new(512, 2880, MediaKind::Other, 0, 2879).unwrap();
        let classification = Classification::new(LayoutDescriptor::Dos33, Endian::Little, dos33_floppy());
        let dump = FieldDump::new(&classification, &geometry).to_string();

        assert!(dump.contains("oem_name"));
        assert!(dump.contains("\"IBM  3.3\""));
        assert!(dump.contains("Boot Code 0x0024"));
    }
}
