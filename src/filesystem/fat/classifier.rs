//! FAT classification cascade.
//!
//! Rules run in a fixed order and the first one that matches wins. Several rules can match
//! the same bytes, so the order is part of the behaviour: FAT32 before anything with a 16-bit
//! FAT, labelled formats (MSX, Apricot) before the generic BPBs, BPB-less media last.
//!
//! A rule answers `Ok(None)` when its coarse checks fail, and `InconsistentField` when they
//! passed but a later field contradicts them; both move on to the next rule. Only sector
//! source failures abort the cascade.

use log::{debug, info, trace};

use super::floppy::{self, DEC_RAINBOW, RAINBOW_FAT_LBAS, RAINBOW_ROOT_LBAS};
use crate::device::{self, SectorGeometry, SectorSource};
use crate::filesystem::classification::{AuxPurpose, Classification};
use crate::filesystem::fs_error::FsError;
use crate::filesystem::layout::{Field, LayoutDescriptor, LayoutView};
use crate::filesystem::predicates::{
    andos_oem, atari_jump, bounded_chs, fat12_terminator, is_allowed_cluster_size,
    is_power_of_two_16, sector_count_fits_partition,
};
use crate::utils::{Endian, FieldReader};

/// Boot sector plus the sector after it.
pub const BOOT_AREA_BYTES: usize = 1024;

/// A boot sector, one FAT sector and a second FAT copy at the very least.
pub const MIN_PARTITION_SECTORS: u64 = 3;

/// Size of the FSINFO structure read for FAT32 layouts.
const FSINFO_BYTES: usize = 512;

const RAINBOW_DISABLE_INTERRUPTS: u8 = 0xF3;
const RAINBOW_ROOT_ENTRIES: usize = 96;

type Rule = fn(&Candidate<'_>) -> Result<Option<Classification>, FsError>;

/// Cascade order; the first rule that matches wins.
const CASCADE: [(&str, Rule); 8] = [
    ("FAT32", long_fat32),
    ("short FAT32", short_fat32),
    ("MSX-DOS", msx),
    ("Apricot", apricot),
    ("extended BPB", extended_bpb),
    ("classic BPB", classic_bpb),
    ("DEC Rainbow", dec_rainbow),
    ("legacy floppy", legacy_floppy),
];

/// The buffers and geometry every rule looks at.
pub struct Candidate<'a> {
    boot: &'a [u8],
    second: &'a [u8],
    geometry: &'a SectorGeometry,
    source: &'a dyn SectorSource,
    /// Rules accept on the boot sector and first FAT sector without further reads.
    guards_only: bool,
}

impl<'a> Candidate<'a> {
    pub fn new(
        boot: &'a [u8],
        second: &'a [u8],
        geometry: &'a SectorGeometry,
        source: &'a dyn SectorSource,
    ) -> Self {
        Self {
            boot,
            second,
            geometry,
            source,
            guards_only: false,
        }
    }

    pub fn with_guards_only(mut self) -> Self {
        self.guards_only = true;
        self
    }

    fn view(&self, layout: LayoutDescriptor) -> LayoutView<'a> {
        LayoutView::new(layout, FieldReader::little(self.boot), self.geometry.sector_scale())
    }

    fn fits(&self, count: u64) -> bool {
        sector_count_fits_partition(count, self.geometry)
    }

    fn matched(&self, layout: LayoutDescriptor) -> Classification {
        Classification::new(layout, Endian::Little, self.boot.to_vec())
    }

    fn partition_byte(&self, offset: u64) -> u64 {
        self.geometry.partition_start() * u64::from(self.geometry.bytes_per_sector()) + offset
    }
}

/// Reads the first 1024 bytes of the partition, zero padded if the partition is shorter.
pub fn read_boot_area(
    source: &dyn SectorSource,
    geometry: &SectorGeometry,
) -> Result<Vec<u8>, FsError> {
    let sector_size = geometry.bytes_per_sector() as usize;
    let count = BOOT_AREA_BYTES
        .div_ceil(sector_size)
        .min(geometry.partition_length() as usize);

    let mut boot = source.read_sectors(geometry.partition_start(), count as u32)?;
    if boot.len() < BOOT_AREA_BYTES {
        boot.resize(BOOT_AREA_BYTES, 0);
    }
    Ok(boot)
}

/// Runs the cascade over the partition described by `geometry`.
///
/// # Errors
/// - `FsError::GeometryTooSmall` if the partition is shorter than [`MIN_PARTITION_SECTORS`]
/// - `FsError::NotRecognized` if no rule matched
/// - `FsError::Source` if a sector inside the geometry could not be read
pub fn classify(
    source: &dyn SectorSource,
    geometry: &SectorGeometry,
) -> Result<Classification, FsError> {
    run(source, geometry, false)
}

/// Whether any FAT layout matches, reading only the boot sector and the first FAT sector.
///
/// Rules that need more sectors (FSINFO, the DEC Rainbow FAT copies and root directory,
/// the second FAT copy of a pre-BPB floppy) accept on the checks made before those reads.
pub fn identify(source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<bool, FsError> {
    match run(source, geometry, true) {
        Ok(_) => Ok(true),
        Err(FsError::NotRecognized | FsError::GeometryTooSmall { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

fn run(
    source: &dyn SectorSource,
    geometry: &SectorGeometry,
    guards_only: bool,
) -> Result<Classification, FsError> {
    let available = geometry.partition_length();
    if available < MIN_PARTITION_SECTORS {
        return Err(FsError::GeometryTooSmall {
            required: MIN_PARTITION_SECTORS,
            available,
        });
    }

    let boot = read_boot_area(source, geometry)?;
    let second = source.read_sector(geometry.partition_start() + 1)?;
    let candidate = Candidate::new(&boot, &second, geometry, source);
    if guards_only {
        classify_buffers(&candidate.with_guards_only())
    } else {
        classify_buffers(&candidate)
    }
}

/// Runs the cascade over buffers that were already read.
pub fn classify_buffers(candidate: &Candidate<'_>) -> Result<Classification, FsError> {
    for (name, rule) in CASCADE {
        match rule(candidate) {
            Ok(Some(found)) => {
                info!("FAT cascade matched {}", found.layout());
                return Ok(found);
            }
            Ok(None) => debug!("{name}: rejected"),
            Err(FsError::InconsistentField { field, reason }) => {
                debug!("{name}: skipped, inconsistent `{field}`: {reason}")
            }
            Err(err) => return Err(err),
        }
    }

    Err(FsError::NotRecognized)
}

/// Checks shared by both FAT32 layouts.
fn fat32_prefix(view: &LayoutView<'_>) -> bool {
    is_power_of_two_16(view.raw(Field::BytesPerSector) as u16)
        && is_allowed_cluster_size(view.raw(Field::SectorsPerCluster) as u8)
        && view.raw(Field::FatCount) <= 2
        && view.uint(Field::Sectors16) == 0
        && view.raw(Field::SectorsPerFat16) == 0
}

/// Attaches the FSINFO sector when its number points inside the partition.
fn with_fsinfo(
    candidate: &Candidate<'_>,
    view: &LayoutView<'_>,
    found: Classification,
) -> Result<Classification, FsError> {
    if candidate.guards_only {
        return Ok(found);
    }

    let sector = view.raw(Field::FsInfoSector);
    let offset = sector * view.raw(Field::BytesPerSector);
    if sector == 0 || offset + FSINFO_BYTES as u64 > candidate.geometry.partition_bytes() {
        debug!("FSINFO sector {sector} lies outside the partition");
        return Ok(found);
    }

    trace!("reading FSINFO sector {sector}");
    let buf = device::read_bytes(candidate.source, candidate.partition_byte(offset), FSINFO_BYTES)?;
    Ok(found.with_aux(AuxPurpose::FsInfo, buf))
}

fn long_fat32(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let view = candidate.view(LayoutDescriptor::Fat32);
    if !fat32_prefix(&view)
        || view.raw(Field::Signature) != 0x29
        || view.bytes(Field::FsType) != b"FAT32   "
    {
        return Ok(None);
    }

    let found = candidate.matched(LayoutDescriptor::Fat32);
    with_fsinfo(candidate, &view, found).map(Some)
}

fn short_fat32(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let view = candidate.view(LayoutDescriptor::ShortFat32);
    if !fat32_prefix(&view) || view.raw(Field::Signature) != 0x28 {
        return Ok(None);
    }

    let count = match view.uint(Field::BigSectors) {
        0 => view.uint(Field::HugeSectors),
        big => big,
    };
    if !candidate.fits(count) {
        return Err(FsError::inconsistent(
            "big_sectors",
            format!(
                "{count} sectors exceed the {}-sector partition",
                candidate.geometry.partition_length()
            ),
        ));
    }

    let found = candidate.matched(LayoutDescriptor::ShortFat32);
    with_fsinfo(candidate, &view, found).map(Some)
}

fn msx(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let view = candidate.view(LayoutDescriptor::Msx);
    let plausible = is_power_of_two_16(view.raw(Field::BytesPerSector) as u16)
        && is_allowed_cluster_size(view.raw(Field::SectorsPerCluster) as u8)
        && view.raw(Field::FatCount) <= 2
        && view.raw(Field::RootEntries) > 0
        && candidate.fits(view.uint(Field::Sectors16))
        && view.raw(Field::SectorsPerFat16) > 0
        && view.bytes(Field::VolId) == b"VOL_ID";

    Ok(plausible.then(|| candidate.matched(LayoutDescriptor::Msx)))
}

fn apricot(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let view = candidate.view(LayoutDescriptor::Apricot);
    let plausible = is_allowed_cluster_size(view.raw(Field::SectorsPerCluster) as u8)
        && view.raw(Field::FatCount) <= 2
        && view.raw(Field::RootEntries) > 0
        && candidate.fits(view.uint(Field::Sectors16))
        && view.raw(Field::SectorsPerFat16) > 0
        && view.raw(Field::PartitionCount) == 0;

    Ok(plausible.then(|| candidate.matched(LayoutDescriptor::Apricot)))
}

fn extended_bpb(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let view = candidate.view(LayoutDescriptor::Ebpb);
    let signature = view.raw(Field::Signature);
    let andos = andos_oem(view.bytes(Field::OemName));
    if !is_power_of_two_16(view.raw(Field::BytesPerSector) as u16)
        || !is_allowed_cluster_size(view.raw(Field::SectorsPerCluster) as u8)
        || view.raw(Field::FatCount) > 2
        || view.raw(Field::RootEntries) == 0
        || view.raw(Field::SectorsPerFat16) == 0
        || !(signature == 0x28 || signature == 0x29 || andos)
    {
        return Ok(None);
    }

    let count = match view.uint(Field::Sectors16) {
        0 => view.uint(Field::BigSectors),
        sectors => sectors,
    };
    if !candidate.fits(count) {
        return Err(FsError::inconsistent(
            "sectors",
            format!(
                "{count} sectors exceed the {}-sector partition",
                candidate.geometry.partition_length()
            ),
        ));
    }

    let layout = if signature == 0x29 || andos {
        LayoutDescriptor::Ebpb
    } else {
        LayoutDescriptor::ShortEbpb
    };
    Ok(Some(candidate.matched(layout)))
}

/// DOS 3.31 down to DOS 2.0, each reclassified as Atari when the jump is 68000 code.
fn classic_bpb(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let view = candidate.view(LayoutDescriptor::Dos33);
    if !is_power_of_two_16(view.raw(Field::BytesPerSector) as u16)
        || !is_allowed_cluster_size(view.raw(Field::SectorsPerCluster) as u8)
        || view.raw(Field::ReservedSectors) >= candidate.geometry.partition_length()
        || view.raw(Field::FatCount) > 2
        || view.raw(Field::RootEntries) == 0
        || view.raw(Field::SectorsPerFat16) == 0
    {
        return Ok(None);
    }

    let atari = atari_jump(view.bytes(Field::Jump), view.bytes(Field::OemName));
    let pick = |layout: LayoutDescriptor| -> Result<Option<Classification>, FsError> {
        let layout = if atari { LayoutDescriptor::Atari } else { layout };
        Ok(Some(candidate.matched(layout)))
    };

    let start = candidate.geometry.partition_start();
    let sectors = view.uint(Field::Sectors16);
    let big = view.uint(Field::BigSectors);
    let hidden = view.uint(Field::HiddenSectors32);

    // big_sectors wins whenever it is set
    let effective = if big != 0 { big } else { sectors };
    if effective > 0 && candidate.fits(effective) && hidden <= start {
        return pick(LayoutDescriptor::Dos33);
    }

    if !candidate.fits(sectors) {
        return Err(FsError::inconsistent(
            "sectors",
            format!(
                "{sectors} sectors exceed the {}-sector partition",
                candidate.geometry.partition_length()
            ),
        ));
    }

    let dos32 = candidate.view(LayoutDescriptor::Dos32);
    if dos32.raw(Field::HiddenSectors16) + dos32.raw(Field::Sectors16)
        == dos32.raw(Field::TotalSectors16)
    {
        return pick(LayoutDescriptor::Dos32);
    }

    let dos30 = candidate.view(LayoutDescriptor::Dos30);
    if bounded_chs(
        dos30.raw(Field::SectorsPerTrack) as u16,
        dos30.raw(Field::HeadCount) as u16,
    ) {
        return pick(LayoutDescriptor::Dos30);
    }

    pick(LayoutDescriptor::Dos20)
}

/// A root directory name byte the Rainbow formatter could have written.
fn rainbow_name_byte(b: u8) -> bool {
    (b >= 0x20 || b == 0x00 || b == 0x05) && b != 0xFF && b != 0x2E
}

fn dec_rainbow(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let geometry = candidate.geometry;
    if geometry.total_sectors() != DEC_RAINBOW.total_sectors
        || geometry.bytes_per_sector() != u32::from(DEC_RAINBOW.bytes_per_sector)
        || geometry.partition_start() != 0
        || candidate.boot.first() != Some(&RAINBOW_DISABLE_INTERRUPTS)
    {
        return Ok(None);
    }
    if candidate.guards_only {
        return Ok(Some(
            candidate
                .matched(LayoutDescriptor::DecRainbow)
                .with_fixed(&DEC_RAINBOW),
        ));
    }

    trace!("reading DEC Rainbow FAT copies");
    let fat1 = candidate.source.read_sector(RAINBOW_FAT_LBAS[0])?;
    let fat2 = candidate.source.read_sector(RAINBOW_FAT_LBAS[1])?;
    if fat1[..2] != fat2[..2] || fat1[0] & 0xF0 != 0xF0 || fat1[1] != 0xFF {
        return Err(FsError::inconsistent(
            "fat",
            format!(
                "FAT copies start {:02X?} and {:02X?}",
                &fat1[..2],
                &fat2[..2]
            ),
        ));
    }

    let mut root = Vec::with_capacity(RAINBOW_ROOT_LBAS.len() * 512);
    for lba in RAINBOW_ROOT_LBAS {
        root.extend(candidate.source.read_sector(lba)?);
    }
    let names_valid = root
        .chunks_exact(32)
        .take(RAINBOW_ROOT_ENTRIES)
        .all(|entry| entry[..11].iter().all(|b| rainbow_name_byte(*b)));
    if !names_valid {
        return Err(FsError::inconsistent(
            "root_directory",
            "name bytes outside the range a Rainbow formatter writes",
        ));
    }

    Ok(Some(
        candidate
            .matched(LayoutDescriptor::DecRainbow)
            .with_fixed(&DEC_RAINBOW)
            .with_aux(AuxPurpose::RainbowFat1, fat1)
            .with_aux(AuxPurpose::RainbowFat2, fat2)
            .with_aux(AuxPurpose::RainbowRoot, root),
    ))
}

/// Pre-BPB floppy: the FAT id byte and the medium's size select a hard-coded geometry.
fn legacy_floppy(candidate: &Candidate<'_>) -> Result<Option<Classification>, FsError> {
    let fat = candidate.second;
    let terminator = fat12_terminator(fat);
    if terminator < 0xFF0 {
        return Ok(None);
    }

    let geometry = candidate.geometry;
    let fat_id = fat[0];
    let Some(fixed) =
        floppy::lookup_legacy(fat_id, geometry.total_sectors(), geometry.bytes_per_sector())
    else {
        debug!(
            "no floppy format for FAT id 0x{fat_id:02X} on {} sectors of {} bytes",
            geometry.total_sectors(),
            geometry.bytes_per_sector()
        );
        return Ok(None);
    };

    let second_fat = u64::from(fixed.reserved_sectors) + u64::from(fixed.sectors_per_fat);
    if second_fat >= geometry.partition_length() {
        return Err(FsError::inconsistent(
            "sectors_per_fat",
            format!("second FAT at sector {second_fat} lies past the partition"),
        ));
    }

    let found = candidate
        .matched(LayoutDescriptor::LegacyFloppy)
        .with_fixed(fixed)
        .with_aux(AuxPurpose::FirstFat, fat.to_vec());
    if candidate.guards_only {
        return Ok(Some(found));
    }

    trace!("reading second FAT copy at sector {second_fat}");
    let copy = candidate
        .source
        .read_sector(geometry.partition_start() + second_fat)?;
    if copy.get(..3) != fat.get(..3) {
        return Err(FsError::inconsistent(
            "fat",
            format!(
                "second FAT copy starts {:02X?}, first starts {:02X?}",
                copy.get(..3),
                fat.get(..3)
            ),
        ));
    }

    Ok(Some(found.with_aux(AuxPurpose::SecondFat, copy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MediaKind, MemorySource};

    fn source(sectors: usize) -> MemorySource {
        MemorySource::new(vec![0u8; sectors * 512], 512, MediaKind::Other).unwrap()
    }

    #[test]
    fn tiny_partitions_are_rejected_before_reading() {
        let source = source(10);
        let geometry = SectorGeometry::partition(&source, 4, 2).unwrap();
        assert!(matches!(
            classify(&source, &geometry),
            Err(FsError::GeometryTooSmall {
                required: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn blank_media_is_not_recognized() {
        let source = source(64);
        let geometry = SectorGeometry::whole(&source).unwrap();
        assert!(matches!(
            classify(&source, &geometry),
            Err(FsError::NotRecognized)
        ));
    }

    #[test]
    fn boot_area_is_padded() {
        let source = MemorySource::new(vec![0xAAu8; 4 * 128], 128, MediaKind::Other).unwrap();
        let geometry = SectorGeometry::whole(&source).unwrap();
        let boot = read_boot_area(&source, &geometry).unwrap();
        assert_eq!(boot.len(), BOOT_AREA_BYTES);
        assert_eq!(boot[511], 0xAA);
        assert_eq!(boot[512], 0x00);
    }

    #[test]
    fn rainbow_name_bytes() {
        assert!(rainbow_name_byte(b'A'));
        assert!(rainbow_name_byte(0x00));
        assert!(rainbow_name_byte(0x05));
        assert!(rainbow_name_byte(0xE5));
        assert!(!rainbow_name_byte(0x2E));
        assert!(!rainbow_name_byte(0xFF));
        assert!(!rainbow_name_byte(0x01));
    }
}
