//! Layout Table Registry.
//!
//! Every historical on-disk layout is one [`LayoutDescriptor`] variant with its own static
//! offset table. Overlapping layouts (the many BPB flavours sharing one boot sector, the
//! System V superblocks sharing offsets) never alias each other: a buffer is viewed through
//! exactly one table at a time with a [`LayoutView`], and decoders walk the table of the
//! chosen variant instead of copying fields by hand per variant.

use serde::Serialize;
use std::fmt;

use crate::utils::FieldReader;

/// Offset of the 0x55 0xAA trailer in a boot sector.
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;

/// Canonical name of a field, shared by every layout that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Boot sector / BPB family.
    Jump,
    OemName,
    BytesPerSector,
    SectorsPerCluster,
    ReservedSectors,
    FatCount,
    RootEntries,
    Sectors16,
    MediaDescriptor,
    SectorsPerFat16,
    SectorsPerTrack,
    HeadCount,
    HiddenSectors16,
    HiddenSectors32,
    TotalSectors16,
    BigSectors,
    HugeSectors,
    DriveNumber,
    VolumeFlags,
    Signature,
    Serial,
    VolumeLabel,
    FsType,
    SectorsPerFat32,
    MirrorFlags,
    Version,
    RootCluster,
    FsInfoSector,
    BackupSector,
    VolId,
    BootCode,
    BootSignature,
    AtariOem,
    AtariSerial,
    AtariExecFlag,
    AtariLoadMode,
    AtariBootFile,
    AtariChecksum,
    ApricotVersion,
    ApricotOs,
    ApricotWriteProtected,
    ApricotCopyProtected,
    ApricotBootType,
    PartitionCount,
    ApricotWinchester,
    ApricotSectorSize,
    ApricotCylinders,
    // System V superblock family.
    InodeBlocks,
    FsSize,
    FreeCount,
    InodeCount,
    Modified,
    ReadOnly,
    UpdateTime,
    TotalFree,
    TotalFreeInodes,
    CylinderBlocks,
    GapBlocks,
    VolumeName,
    PackName,
    CleanFlag,
    State,
    Magic,
    BlockType,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Jump => "jump",
            Field::OemName => "oem_name",
            Field::BytesPerSector => "bytes_per_sector",
            Field::SectorsPerCluster => "sectors_per_cluster",
            Field::ReservedSectors => "reserved_sectors",
            Field::FatCount => "fat_count",
            Field::RootEntries => "root_entries",
            Field::Sectors16 => "sectors",
            Field::MediaDescriptor => "media",
            Field::SectorsPerFat16 => "sectors_per_fat",
            Field::SectorsPerTrack => "sectors_per_track",
            Field::HeadCount => "heads",
            Field::HiddenSectors16 => "hidden_sectors",
            Field::HiddenSectors32 => "hidden_sectors",
            Field::TotalSectors16 => "total_sectors",
            Field::BigSectors => "big_sectors",
            Field::HugeSectors => "huge_sectors",
            Field::DriveNumber => "drive_number",
            Field::VolumeFlags => "flags",
            Field::Signature => "signature",
            Field::Serial => "serial",
            Field::VolumeLabel => "volume_label",
            Field::FsType => "fs_type",
            Field::SectorsPerFat32 => "big_sectors_per_fat",
            Field::MirrorFlags => "mirror_flags",
            Field::Version => "version",
            Field::RootCluster => "root_cluster",
            Field::FsInfoSector => "fsinfo_sector",
            Field::BackupSector => "backup_sector",
            Field::VolId => "vol_id",
            Field::BootCode => "boot_code",
            Field::BootSignature => "boot_signature",
            Field::AtariOem => "oem_name",
            Field::AtariSerial => "serial",
            Field::AtariExecFlag => "exec_flag",
            Field::AtariLoadMode => "load_mode",
            Field::AtariBootFile => "boot_file",
            Field::AtariChecksum => "checksum",
            Field::ApricotVersion => "version",
            Field::ApricotOs => "operating_system",
            Field::ApricotWriteProtected => "write_protected",
            Field::ApricotCopyProtected => "copy_protected",
            Field::ApricotBootType => "boot_type",
            Field::PartitionCount => "partition_count",
            Field::ApricotWinchester => "winchester",
            Field::ApricotSectorSize => "sector_size",
            Field::ApricotCylinders => "cylinders",
            Field::InodeBlocks => "s_isize",
            Field::FsSize => "s_fsize",
            Field::FreeCount => "s_nfree",
            Field::InodeCount => "s_ninode",
            Field::Modified => "s_fmod",
            Field::ReadOnly => "s_ronly",
            Field::UpdateTime => "s_time",
            Field::TotalFree => "s_tfree",
            Field::TotalFreeInodes => "s_tinode",
            Field::CylinderBlocks => "s_cylblks",
            Field::GapBlocks => "s_gapblks",
            Field::VolumeName => "s_fname",
            Field::PackName => "s_fpack",
            Field::CleanFlag => "s_clean",
            Field::State => "s_state",
            Field::Magic => "s_magic",
            Field::BlockType => "s_type",
        }
    }
}

/// On-disk width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U8,
    U16,
    /// Big-endian word inside an otherwise little-endian structure (Atari 68000 fields).
    BeU16,
    U32,
    U64,
    Bytes(usize),
}

/// Whether a field counts sectors that must be reconciled with the medium's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Unit,
    Sectors,
}

/// One row of an offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub offset: usize,
    pub width: Width,
    pub scale: Scale,
}

impl FieldSpec {
    pub fn size(&self) -> usize {
        match self.width {
            Width::U8 => 1,
            Width::U16 | Width::BeU16 => 2,
            Width::U32 => 4,
            Width::U64 => 8,
            Width::Bytes(len) => len,
        }
    }

    /// Integer value of the field, unscaled. Byte-string fields read as 0.
    pub fn read_raw(&self, reader: &FieldReader<'_>) -> u64 {
        match self.width {
            Width::U8 => u64::from(reader.u8(self.offset)),
            Width::U16 => u64::from(reader.u16(self.offset)),
            Width::BeU16 => u64::from(reader.be_u16(self.offset)),
            Width::U32 => u64::from(reader.u32(self.offset)),
            Width::U64 => reader.u64(self.offset),
            Width::Bytes(_) => 0,
        }
    }

    pub fn read_bytes<'a>(&self, reader: &FieldReader<'a>) -> &'a [u8] {
        reader.bytes(self.offset, self.size())
    }
}

const fn u8f(field: Field, offset: usize) -> FieldSpec {
    FieldSpec { field, offset, width: Width::U8, scale: Scale::Unit }
}

const fn u16f(field: Field, offset: usize) -> FieldSpec {
    FieldSpec { field, offset, width: Width::U16, scale: Scale::Unit }
}

const fn be16f(field: Field, offset: usize) -> FieldSpec {
    FieldSpec { field, offset, width: Width::BeU16, scale: Scale::Unit }
}

const fn u32f(field: Field, offset: usize) -> FieldSpec {
    FieldSpec { field, offset, width: Width::U32, scale: Scale::Unit }
}

const fn bytes(field: Field, offset: usize, len: usize) -> FieldSpec {
    FieldSpec { field, offset, width: Width::Bytes(len), scale: Scale::Unit }
}

const fn sectors(field: Field, offset: usize, width: Width) -> FieldSpec {
    FieldSpec { field, offset, width, scale: Scale::Sectors }
}

const fn boot_code(offset: usize) -> FieldSpec {
    bytes(Field::BootCode, offset, BOOT_SIGNATURE_OFFSET - offset)
}

const BOOT_SIGNATURE: FieldSpec = u16f(Field::BootSignature, BOOT_SIGNATURE_OFFSET);

// DOS 2.0 BPB, the prefix every x86 variant shares.
const JUMP: FieldSpec = bytes(Field::Jump, 0x000, 3);
const OEM_NAME: FieldSpec = bytes(Field::OemName, 0x003, 8);
const BPS: FieldSpec = u16f(Field::BytesPerSector, 0x00B);
const SPC: FieldSpec = u8f(Field::SectorsPerCluster, 0x00D);
const RSECTORS: FieldSpec = u16f(Field::ReservedSectors, 0x00E);
const FATS_NO: FieldSpec = u8f(Field::FatCount, 0x010);
const ROOT_ENT: FieldSpec = u16f(Field::RootEntries, 0x011);
const SECTORS: FieldSpec = sectors(Field::Sectors16, 0x013, Width::U16);
const MEDIA: FieldSpec = u8f(Field::MediaDescriptor, 0x015);
const SPFAT: FieldSpec = u16f(Field::SectorsPerFat16, 0x016);
const SPTRK: FieldSpec = u16f(Field::SectorsPerTrack, 0x018);
const HEADS: FieldSpec = u16f(Field::HeadCount, 0x01A);
const HSECTORS_16: FieldSpec = sectors(Field::HiddenSectors16, 0x01C, Width::U16);
const HSECTORS_32: FieldSpec = sectors(Field::HiddenSectors32, 0x01C, Width::U32);
const BIG_SECTORS: FieldSpec = sectors(Field::BigSectors, 0x020, Width::U32);

static DOS20: [FieldSpec; 12] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT,
    boot_code(0x018), BOOT_SIGNATURE,
];

static DOS30: [FieldSpec; 15] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_16, boot_code(0x01E), BOOT_SIGNATURE,
];

static DOS32: [FieldSpec; 16] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_16,
    sectors(Field::TotalSectors16, 0x01E, Width::U16),
    boot_code(0x020),
    BOOT_SIGNATURE,
];

static DOS33: [FieldSpec; 16] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_32, BIG_SECTORS, boot_code(0x024), BOOT_SIGNATURE,
];

static SHORT_EBPB: [FieldSpec; 20] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_32, BIG_SECTORS,
    u8f(Field::DriveNumber, 0x024),
    u8f(Field::VolumeFlags, 0x025),
    u8f(Field::Signature, 0x026),
    u32f(Field::Serial, 0x027),
    boot_code(0x02B),
    BOOT_SIGNATURE,
];

static EBPB: [FieldSpec; 22] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_32, BIG_SECTORS,
    u8f(Field::DriveNumber, 0x024),
    u8f(Field::VolumeFlags, 0x025),
    u8f(Field::Signature, 0x026),
    u32f(Field::Serial, 0x027),
    bytes(Field::VolumeLabel, 0x02B, 11),
    bytes(Field::FsType, 0x036, 8),
    boot_code(0x03E),
    BOOT_SIGNATURE,
];

static SHORT_FAT32: [FieldSpec; 27] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_32, BIG_SECTORS,
    u32f(Field::SectorsPerFat32, 0x024),
    u16f(Field::MirrorFlags, 0x028),
    u16f(Field::Version, 0x02A),
    u32f(Field::RootCluster, 0x02C),
    u16f(Field::FsInfoSector, 0x030),
    u16f(Field::BackupSector, 0x032),
    u8f(Field::DriveNumber, 0x040),
    u8f(Field::VolumeFlags, 0x041),
    u8f(Field::Signature, 0x042),
    u32f(Field::Serial, 0x043),
    sectors(Field::HugeSectors, 0x052, Width::U64),
    boot_code(0x05A),
    BOOT_SIGNATURE,
];

static FAT32: [FieldSpec; 28] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_32, BIG_SECTORS,
    u32f(Field::SectorsPerFat32, 0x024),
    u16f(Field::MirrorFlags, 0x028),
    u16f(Field::Version, 0x02A),
    u32f(Field::RootCluster, 0x02C),
    u16f(Field::FsInfoSector, 0x030),
    u16f(Field::BackupSector, 0x032),
    u8f(Field::DriveNumber, 0x040),
    u8f(Field::VolumeFlags, 0x041),
    u8f(Field::Signature, 0x042),
    u32f(Field::Serial, 0x043),
    bytes(Field::VolumeLabel, 0x047, 11),
    bytes(Field::FsType, 0x052, 8),
    boot_code(0x05A),
    BOOT_SIGNATURE,
];

static MSX: [FieldSpec; 17] = [
    JUMP, OEM_NAME, BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS,
    HSECTORS_16,
    // 0x1E holds the MSX-DOS 1 boot jump, 0x26 the undelete flag, 0x30 the DOS 2 jump.
    bytes(Field::VolId, 0x020, 6),
    u32f(Field::Serial, 0x027),
    boot_code(0x032),
    BOOT_SIGNATURE,
];

static ATARI: [FieldSpec; 20] = [
    bytes(Field::Jump, 0x000, 2),
    bytes(Field::AtariOem, 0x002, 6),
    bytes(Field::AtariSerial, 0x008, 3),
    BPS, SPC, RSECTORS, FATS_NO, ROOT_ENT, SECTORS, MEDIA, SPFAT, SPTRK, HEADS, HSECTORS_16,
    be16f(Field::AtariExecFlag, 0x01E),
    be16f(Field::AtariLoadMode, 0x020),
    bytes(Field::AtariBootFile, 0x02E, 11),
    bytes(Field::BootCode, 0x03A, 0x1FE - 0x03A),
    be16f(Field::AtariChecksum, 0x1FE),
    u16f(Field::BootSignature, 0x1FE),
];

static APRICOT: [FieldSpec; 19] = [
    bytes(Field::ApricotVersion, 0x000, 8),
    u8f(Field::ApricotOs, 0x008),
    u8f(Field::ApricotWriteProtected, 0x009),
    u8f(Field::ApricotCopyProtected, 0x00A),
    u8f(Field::ApricotBootType, 0x00B),
    u8f(Field::PartitionCount, 0x00C),
    u8f(Field::ApricotWinchester, 0x00D),
    u16f(Field::ApricotSectorSize, 0x00E),
    u16f(Field::SectorsPerTrack, 0x010),
    u32f(Field::ApricotCylinders, 0x012),
    u8f(Field::HeadCount, 0x016),
    u16f(Field::BytesPerSector, 0x050),
    u8f(Field::SectorsPerCluster, 0x052),
    u16f(Field::ReservedSectors, 0x053),
    u8f(Field::FatCount, 0x055),
    u16f(Field::RootEntries, 0x056),
    sectors(Field::Sectors16, 0x058, Width::U16),
    u8f(Field::MediaDescriptor, 0x05A),
    u16f(Field::SectorsPerFat16, 0x05B),
];

static DEC_RAINBOW: [FieldSpec; 2] = [bytes(Field::Jump, 0x000, 1), boot_code(0x000)];

static LEGACY_FLOPPY: [FieldSpec; 0] = [];

// System V family; offsets are relative to the start of the superblock.

static XENIX_V1: [FieldSpec; 16] = [
    u16f(Field::InodeBlocks, 0x000),
    u32f(Field::FsSize, 0x002),
    u16f(Field::FreeCount, 0x006),
    u16f(Field::InodeCount, 0x198),
    u8f(Field::Modified, 0x264),
    u8f(Field::ReadOnly, 0x265),
    u32f(Field::UpdateTime, 0x266),
    u32f(Field::TotalFree, 0x26A),
    u16f(Field::TotalFreeInodes, 0x26E),
    u16f(Field::CylinderBlocks, 0x270),
    u16f(Field::GapBlocks, 0x272),
    bytes(Field::VolumeName, 0x278, 6),
    bytes(Field::PackName, 0x27E, 6),
    u8f(Field::CleanFlag, 0x284),
    u32f(Field::Magic, 0x3F8),
    u32f(Field::BlockType, 0x3FC),
];

static XENIX_V3: [FieldSpec; 16] = [
    u16f(Field::InodeBlocks, 0x000),
    u32f(Field::FsSize, 0x002),
    u16f(Field::FreeCount, 0x006),
    u16f(Field::InodeCount, 0x0D0),
    u8f(Field::Modified, 0x19C),
    u8f(Field::ReadOnly, 0x19D),
    u32f(Field::UpdateTime, 0x19E),
    u32f(Field::TotalFree, 0x1A2),
    u16f(Field::TotalFreeInodes, 0x1A6),
    u16f(Field::CylinderBlocks, 0x1A8),
    u16f(Field::GapBlocks, 0x1AA),
    bytes(Field::VolumeName, 0x1B0, 6),
    bytes(Field::PackName, 0x1B6, 6),
    u8f(Field::CleanFlag, 0x1BC),
    u32f(Field::Magic, 0x1F0),
    u32f(Field::BlockType, 0x1F4),
];

static SYSV_R2: [FieldSpec; 16] = [
    u16f(Field::InodeBlocks, 0x000),
    u32f(Field::FsSize, 0x002),
    u16f(Field::FreeCount, 0x006),
    u16f(Field::InodeCount, 0x0D0),
    u8f(Field::Modified, 0x19C),
    u8f(Field::ReadOnly, 0x19D),
    u32f(Field::UpdateTime, 0x19E),
    u16f(Field::CylinderBlocks, 0x1A2),
    u16f(Field::GapBlocks, 0x1A4),
    u32f(Field::TotalFree, 0x1AA),
    u16f(Field::TotalFreeInodes, 0x1AE),
    bytes(Field::VolumeName, 0x1B0, 6),
    bytes(Field::PackName, 0x1B6, 6),
    u32f(Field::State, 0x1F4),
    u32f(Field::Magic, 0x1F8),
    u32f(Field::BlockType, 0x1FC),
];

static SYSV_R4: [FieldSpec; 16] = [
    u16f(Field::InodeBlocks, 0x000),
    u32f(Field::FsSize, 0x004),
    u16f(Field::FreeCount, 0x008),
    u16f(Field::InodeCount, 0x0D4),
    u8f(Field::Modified, 0x1A2),
    u8f(Field::ReadOnly, 0x1A3),
    u32f(Field::UpdateTime, 0x1A4),
    u16f(Field::CylinderBlocks, 0x1A8),
    u16f(Field::GapBlocks, 0x1AA),
    u32f(Field::TotalFree, 0x1B0),
    u16f(Field::TotalFreeInodes, 0x1B4),
    bytes(Field::VolumeName, 0x1B8, 6),
    bytes(Field::PackName, 0x1BE, 6),
    u32f(Field::State, 0x1F4),
    u32f(Field::Magic, 0x1F8),
    u32f(Field::BlockType, 0x1FC),
];

static COHERENT: [FieldSpec; 11] = [
    u16f(Field::InodeBlocks, 0x000),
    u32f(Field::FsSize, 0x002),
    u16f(Field::FreeCount, 0x006),
    u16f(Field::InodeCount, 0x108),
    u8f(Field::Modified, 0x1D4),
    u8f(Field::ReadOnly, 0x1D5),
    u32f(Field::UpdateTime, 0x1D6),
    u32f(Field::TotalFree, 0x1DA),
    u16f(Field::TotalFreeInodes, 0x1DE),
    bytes(Field::VolumeName, 0x1E4, 6),
    bytes(Field::PackName, 0x1EA, 6),
];

static UNIX_V7: [FieldSpec; 11] = [
    u16f(Field::InodeBlocks, 0x000),
    u32f(Field::FsSize, 0x002),
    u16f(Field::FreeCount, 0x006),
    u16f(Field::InodeCount, 0x0D0),
    u8f(Field::Modified, 0x19C),
    u8f(Field::ReadOnly, 0x19D),
    u32f(Field::UpdateTime, 0x19E),
    u32f(Field::TotalFree, 0x1A6),
    u16f(Field::TotalFreeInodes, 0x1AA),
    bytes(Field::VolumeName, 0x1AC, 6),
    bytes(Field::PackName, 0x1B2, 6),
];

/// Layout families; each has its own cascade and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Family {
    Fat,
    SysV,
}

/// One historical on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LayoutDescriptor {
    /// Atari ST GEMDOS boot sector.
    Atari,
    /// MSX-DOS boot sector carrying a `VOL_ID` marker.
    Msx,
    /// DOS 2.0 BPB.
    Dos20,
    /// DOS 3.0 BPB with geometry and 16-bit hidden sectors.
    Dos30,
    /// DOS 3.2 BPB with a 16-bit total sector count.
    Dos32,
    /// DOS 3.31 BPB with 32-bit hidden and big sector counts.
    Dos33,
    /// DOS 3.4 extended BPB without label and type.
    ShortEbpb,
    /// DOS 4.0 extended BPB.
    Ebpb,
    /// FAT32 BPB without label and type (signature 0x28).
    ShortFat32,
    /// FAT32 BPB.
    Fat32,
    /// ACT Apricot disk label.
    Apricot,
    /// DEC Rainbow floppy, no BPB at all.
    DecRainbow,
    /// Pre-BPB floppy identified by its FAT id byte.
    LegacyFloppy,
    /// XENIX superblock (1 KiB, magic at 0x3F8).
    XenixV1,
    /// XENIX 3 superblock (512 bytes, magic at 0x1F0).
    XenixV3,
    /// System V Release 2 superblock.
    SysVR2,
    /// System V Release 4 superblock.
    SysVR4,
    /// Mark Williams Coherent superblock.
    Coherent,
    /// UNIX 7th Edition superblock.
    UnixV7,
}

impl LayoutDescriptor {
    pub const ALL: [LayoutDescriptor; 19] = [
        LayoutDescriptor::Atari,
        LayoutDescriptor::Msx,
        LayoutDescriptor::Dos20,
        LayoutDescriptor::Dos30,
        LayoutDescriptor::Dos32,
        LayoutDescriptor::Dos33,
        LayoutDescriptor::ShortEbpb,
        LayoutDescriptor::Ebpb,
        LayoutDescriptor::ShortFat32,
        LayoutDescriptor::Fat32,
        LayoutDescriptor::Apricot,
        LayoutDescriptor::DecRainbow,
        LayoutDescriptor::LegacyFloppy,
        LayoutDescriptor::XenixV1,
        LayoutDescriptor::XenixV3,
        LayoutDescriptor::SysVR2,
        LayoutDescriptor::SysVR4,
        LayoutDescriptor::Coherent,
        LayoutDescriptor::UnixV7,
    ];

    pub fn family(self) -> Family {
        match self {
            LayoutDescriptor::XenixV1
            | LayoutDescriptor::XenixV3
            | LayoutDescriptor::SysVR2
            | LayoutDescriptor::SysVR4
            | LayoutDescriptor::Coherent
            | LayoutDescriptor::UnixV7 => Family::SysV,
            _ => Family::Fat,
        }
    }

    /// Offset table of the layout.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            LayoutDescriptor::Atari => &ATARI,
            LayoutDescriptor::Msx => &MSX,
            LayoutDescriptor::Dos20 => &DOS20,
            LayoutDescriptor::Dos30 => &DOS30,
            LayoutDescriptor::Dos32 => &DOS32,
            LayoutDescriptor::Dos33 => &DOS33,
            LayoutDescriptor::ShortEbpb => &SHORT_EBPB,
            LayoutDescriptor::Ebpb => &EBPB,
            LayoutDescriptor::ShortFat32 => &SHORT_FAT32,
            LayoutDescriptor::Fat32 => &FAT32,
            LayoutDescriptor::Apricot => &APRICOT,
            LayoutDescriptor::DecRainbow => &DEC_RAINBOW,
            LayoutDescriptor::LegacyFloppy => &LEGACY_FLOPPY,
            LayoutDescriptor::XenixV1 => &XENIX_V1,
            LayoutDescriptor::XenixV3 => &XENIX_V3,
            LayoutDescriptor::SysVR2 => &SYSV_R2,
            LayoutDescriptor::SysVR4 => &SYSV_R4,
            LayoutDescriptor::Coherent => &COHERENT,
            LayoutDescriptor::UnixV7 => &UNIX_V7,
        }
    }

    pub fn is_fat32(self) -> bool {
        matches!(self, LayoutDescriptor::Fat32 | LayoutDescriptor::ShortFat32)
    }

    /// Layouts that are FAT12 by convention whatever their cluster count.
    pub fn forces_fat12(self) -> bool {
        matches!(
            self,
            LayoutDescriptor::Msx
                | LayoutDescriptor::Atari
                | LayoutDescriptor::Apricot
                | LayoutDescriptor::DecRainbow
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            LayoutDescriptor::Atari => "Atari GEMDOS BPB",
            LayoutDescriptor::Msx => "MSX-DOS BPB",
            LayoutDescriptor::Dos20 => "DOS 2.0 BPB",
            LayoutDescriptor::Dos30 => "DOS 3.0 BPB",
            LayoutDescriptor::Dos32 => "DOS 3.2 BPB",
            LayoutDescriptor::Dos33 => "DOS 3.31 BPB",
            LayoutDescriptor::ShortEbpb => "DOS 3.4 short extended BPB",
            LayoutDescriptor::Ebpb => "DOS 4.0 extended BPB",
            LayoutDescriptor::ShortFat32 => "FAT32 short BPB",
            LayoutDescriptor::Fat32 => "FAT32 BPB",
            LayoutDescriptor::Apricot => "Apricot disk label",
            LayoutDescriptor::DecRainbow => "DEC Rainbow hard-coded geometry",
            LayoutDescriptor::LegacyFloppy => "pre-BPB floppy hard-coded geometry",
            LayoutDescriptor::XenixV1 => "XENIX superblock",
            LayoutDescriptor::XenixV3 => "XENIX 3 superblock",
            LayoutDescriptor::SysVR2 => "System V Release 2 superblock",
            LayoutDescriptor::SysVR4 => "System V Release 4 superblock",
            LayoutDescriptor::Coherent => "Coherent UNIX superblock",
            LayoutDescriptor::UnixV7 => "UNIX 7th Edition superblock",
        }
    }
}

impl fmt::Display for LayoutDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A buffer seen through the offset table of one layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutView<'a> {
    layout: LayoutDescriptor,
    reader: FieldReader<'a>,
    scale: u64,
}

impl<'a> LayoutView<'a> {
    /// `scale` divides every [`Scale::Sectors`] field; it is never 0.
    pub fn new(layout: LayoutDescriptor, reader: FieldReader<'a>, scale: u64) -> Self {
        Self {
            layout,
            reader,
            scale: scale.max(1),
        }
    }

    pub fn layout(&self) -> LayoutDescriptor {
        self.layout
    }

    pub fn reader(&self) -> &FieldReader<'a> {
        &self.reader
    }

    pub fn spec(&self, field: Field) -> Option<&'static FieldSpec> {
        self.layout.fields().iter().find(|spec| spec.field == field)
    }

    pub fn has(&self, field: Field) -> bool {
        self.spec(field).is_some()
    }

    /// Value of `field` as stored on disk, or 0 if the layout lacks it.
    pub fn raw(&self, field: Field) -> u64 {
        self.spec(field)
            .map(|spec| spec.read_raw(&self.reader))
            .unwrap_or(0)
    }

    /// Value of `field` with sector counts reconciled to the medium.
    pub fn uint(&self, field: Field) -> u64 {
        match self.spec(field) {
            Some(spec) => self.scaled(spec),
            None => 0,
        }
    }

    pub fn scaled(&self, spec: &FieldSpec) -> u64 {
        let raw = spec.read_raw(&self.reader);
        match spec.scale {
            Scale::Sectors => raw / self.scale,
            Scale::Unit => raw,
        }
    }

    /// Bytes of `field`, or an empty slice if the layout lacks it.
    pub fn bytes(&self, field: Field) -> &'a [u8] {
        match self.spec(field) {
            Some(spec) => spec.read_bytes(&self.reader),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_fit_their_structures() {
        for layout in LayoutDescriptor::ALL {
            let limit = match layout.family() {
                Family::Fat => 0x200,
                Family::SysV => 0x400,
            };
            for spec in layout.fields() {
                assert!(
                    spec.offset + spec.size() <= limit,
                    "{layout:?}.{} overruns the structure",
                    spec.field.name()
                );
            }
        }
    }

    #[test]
    fn fields_are_unique_per_layout() {
        for layout in LayoutDescriptor::ALL {
            let fields = layout.fields();
            for (i, spec) in fields.iter().enumerate() {
                assert!(
                    fields[i + 1..].iter().all(|other| other.field != spec.field),
                    "{layout:?} lists {} twice",
                    spec.field.name()
                );
            }
        }
    }

    #[test]
    fn msx_dos2_markers() {
        let mut buf = vec![0u8; 512];
        buf[0x20..0x26].copy_from_slice(b"VOL_ID");
        buf[0x27..0x2B].copy_from_slice(&0x0BAD_F00Du32.to_le_bytes());

        let view = LayoutView::new(LayoutDescriptor::Msx, FieldReader::little(&buf), 1);
        assert_eq!(view.bytes(Field::VolId), b"VOL_ID");
        assert_eq!(view.raw(Field::Serial), 0x0BAD_F00D);
        assert_eq!(view.spec(Field::BootCode).map(|spec| spec.offset), Some(0x32));
    }

    #[test]
    fn sector_fields_are_scaled() {
        let mut buf = vec![0u8; 512];
        buf[0x13..0x15].copy_from_slice(&2880u16.to_le_bytes());
        buf[0x0E..0x10].copy_from_slice(&1u16.to_le_bytes());

        let view = LayoutView::new(LayoutDescriptor::Dos20, FieldReader::little(&buf), 4);
        assert_eq!(view.uint(Field::Sectors16), 720);
        assert_eq!(view.raw(Field::Sectors16), 2880);
        assert_eq!(view.uint(Field::ReservedSectors), 1);
        assert_eq!(view.uint(Field::BigSectors), 0);
        assert!(!view.has(Field::BigSectors));
    }
}
