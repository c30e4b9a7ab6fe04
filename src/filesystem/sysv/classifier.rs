//! System V family classification.
//!
//! XENIX, System V, Coherent and 7th Edition superblocks share most offsets but differ in
//! byte order and in where (or whether) they carry a magic number. Candidate locations are
//! tried in order; at each one the magic-bearing layouts are checked first, then Coherent's
//! name markers and the 7th Edition plausibility heuristic in each half of the area.

use log::{debug, info};

use crate::device::{SectorGeometry, SectorSource};
use crate::filesystem::classification::Classification;
use crate::filesystem::fs_error::FsError;
use crate::filesystem::layout::{Field, LayoutDescriptor, LayoutView};
use crate::utils::{Endian, FieldReader};

/// Bytes read at each candidate location.
pub const SUPERBLOCK_AREA: usize = 1024;

/// Candidate superblock positions, in sectors from the partition start.
pub const SUPERBLOCK_LOCATIONS: [u64; 9] = [0, 2, 4, 8, 9, 15, 16, 18, 36];

pub const XENIX_MAGIC: u32 = 0x002B_5544;
pub const SYSV_MAGIC: u32 = 0xFD18_7E20;

/// Value `s_state + s_time` holds on a cleanly unmounted System V volume.
pub const SYSV_CLEAN_STATE: u32 = 0x7C26_9D38;

/// Free block and inode cache sizes of the 7th Edition superblock.
const V7_NICFREE: u64 = 50;
const V7_NICINOD: u64 = 100;

/// `s_fname` / `s_fpack` pairs written by Coherent's mkfs.
const COHERENT_NAMES: [(&[u8; 6], &[u8; 6]); 3] = [
    (b"noname", b"nopack"),
    (b"xxxxx\0", b"xxxxx\0"),
    (b"xxxxx ", b"xxxxx\n"),
];

/// Byte order in which `magic` reads back as `expected`.
fn magic_order(raw: u32, expected: u32) -> Option<Endian> {
    if raw == expected {
        Some(Endian::Little)
    } else if raw.swap_bytes() == expected {
        Some(Endian::Big)
    } else {
        None
    }
}

/// Block size encoded in `s_type`.
pub fn block_size(s_type: u64) -> Result<u64, FsError> {
    match s_type {
        1 => Ok(512),
        2 => Ok(1024),
        3 => Ok(2048),
        other => Err(FsError::inconsistent(
            "s_type",
            format!("unknown block size type {other}"),
        )),
    }
}

/// Reads the superblock area at every candidate location until a layout matches.
///
/// # Errors
/// - `FsError::GeometryTooSmall` if not even one area fits in the partition
/// - `FsError::NotRecognized` if no location holds a known superblock
/// - `FsError::Source` if a sector inside the geometry could not be read
pub fn classify(
    source: &dyn SectorSource,
    geometry: &SectorGeometry,
) -> Result<Classification, FsError> {
    let sector_size = u64::from(geometry.bytes_per_sector());
    let count = (SUPERBLOCK_AREA as u64).div_ceil(sector_size).max(1);
    let available = geometry.partition_length();
    if available < count {
        return Err(FsError::GeometryTooSmall {
            required: count,
            available,
        });
    }

    for location in SUPERBLOCK_LOCATIONS {
        if location + count > available {
            break;
        }

        let mut area = source.read_sectors(geometry.partition_start() + location, count as u32)?;
        area.resize(SUPERBLOCK_AREA.max(area.len()), 0);

        match classify_area(&area, geometry) {
            Ok(Some(found)) => {
                info!("{} at sector {location}", found.layout());
                let base = found.offset();
                return Ok(found.at_offset(location * sector_size + base));
            }
            Ok(None) => {}
            Err(FsError::InconsistentField { field, reason }) => {
                debug!("sector {location}: skipped, inconsistent `{field}`: {reason}")
            }
            Err(err) => return Err(err),
        }
    }

    Err(FsError::NotRecognized)
}

/// Classifies one 1 KiB area. The returned offset is relative to the area.
pub fn classify_area(
    area: &[u8],
    geometry: &SectorGeometry,
) -> Result<Option<Classification>, FsError> {
    let reader = FieldReader::little(area);

    if let Some(endian) = magic_order(reader.u32(0x3F8), XENIX_MAGIC) {
        return xenix(LayoutDescriptor::XenixV1, endian, area);
    }
    if let Some(endian) = magic_order(reader.u32(0x3F8), SYSV_MAGIC) {
        return sysv(endian, area, 0x200, geometry);
    }
    if let Some(endian) = magic_order(reader.u32(0x1F0), XENIX_MAGIC) {
        return xenix(LayoutDescriptor::XenixV3, endian, area);
    }
    if let Some(endian) = magic_order(reader.u32(0x1F8), SYSV_MAGIC) {
        return sysv(endian, area, 0, geometry);
    }
    // Magic-less superblocks sit in either half of the area.
    for base in [0, 0x200] {
        let sb = area.get(base..).unwrap_or_default();
        if coherent(sb) {
            return Ok(Some(superblock(LayoutDescriptor::Coherent, Endian::Pdp, area, base)));
        }
        if let Some(endian) = unix_v7(sb, geometry) {
            return Ok(Some(superblock(LayoutDescriptor::UnixV7, endian, area, base)));
        }
    }
    Ok(None)
}

fn superblock(layout: LayoutDescriptor, endian: Endian, area: &[u8], base: usize) -> Classification {
    let raw = area.get(base..).unwrap_or_default().to_vec();
    Classification::new(layout, endian, raw).at_offset(base as u64)
}

fn xenix(
    layout: LayoutDescriptor,
    endian: Endian,
    area: &[u8],
) -> Result<Option<Classification>, FsError> {
    let view = LayoutView::new(layout, FieldReader::new(area, endian), 1);
    block_size(view.raw(Field::BlockType))?;
    Ok(Some(superblock(layout, endian, area, 0)))
}

/// Whether `fsize` blocks of the superblock's own block size fit in the partition.
fn plausible_size(view: &LayoutView<'_>, block: u64, geometry: &SectorGeometry) -> bool {
    let fsize = view.raw(Field::FsSize);
    fsize > 0 && fsize.saturating_mul(block) <= geometry.partition_bytes()
}

/// Release 2 and Release 4 share the magic; R4 pads `s_isize` to four bytes.
fn sysv(
    endian: Endian,
    area: &[u8],
    base: usize,
    geometry: &SectorGeometry,
) -> Result<Option<Classification>, FsError> {
    let sb = area.get(base..).unwrap_or_default();
    let r4 = LayoutView::new(LayoutDescriptor::SysVR4, FieldReader::new(sb, endian), 1);
    let r2 = LayoutView::new(LayoutDescriptor::SysVR2, FieldReader::new(sb, endian), 1);
    let block = block_size(r4.raw(Field::BlockType))?;

    let padding_clear = FieldReader::new(sb, endian).u16(2) == 0;
    let layout = if padding_clear && plausible_size(&r4, block, geometry) {
        LayoutDescriptor::SysVR4
    } else if plausible_size(&r2, block, geometry) {
        LayoutDescriptor::SysVR2
    } else if plausible_size(&r4, block, geometry) {
        LayoutDescriptor::SysVR4
    } else {
        return Err(FsError::inconsistent(
            "s_fsize",
            format!(
                "neither R2 ({}) nor R4 ({}) block count fits the partition",
                r2.raw(Field::FsSize),
                r4.raw(Field::FsSize)
            ),
        ));
    };

    Ok(Some(superblock(layout, endian, area, base)))
}

fn coherent(area: &[u8]) -> bool {
    let view = LayoutView::new(LayoutDescriptor::Coherent, FieldReader::new(area, Endian::Pdp), 1);
    let fname = view.bytes(Field::VolumeName);
    let fpack = view.bytes(Field::PackName);
    COHERENT_NAMES
        .iter()
        .any(|(name, pack)| fname == name.as_slice() && fpack == pack.as_slice())
}

/// 7th Edition superblocks carry no magic: the caches must be in range and the size must
/// match the partition exactly at 512- or 1024-byte blocks.
fn unix_v7(sb: &[u8], geometry: &SectorGeometry) -> Option<Endian> {
    let bytes = geometry.partition_bytes();
    [Endian::Little, Endian::Pdp, Endian::Big]
        .into_iter()
        .find(|endian| {
            let view = LayoutView::new(LayoutDescriptor::UnixV7, FieldReader::new(sb, *endian), 1);
            let fsize = view.raw(Field::FsSize);
            let isize = view.raw(Field::InodeBlocks);
            fsize > 0
                && isize > 0
                && isize < fsize
                && view.raw(Field::FreeCount) <= V7_NICFREE
                && view.raw(Field::InodeCount) <= V7_NICINOD
                && (fsize * 512 == bytes || fsize * 1024 == bytes)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MediaKind;

    fn geometry(sectors: u64) -> SectorGeometry {
        SectorGeometry::new(512, sectors, MediaKind::Other, 0, sectors - 1).unwrap()
    }

    #[test]
    fn magic_byte_order() {
        assert_eq!(magic_order(XENIX_MAGIC, XENIX_MAGIC), Some(Endian::Little));
        assert_eq!(magic_order(XENIX_MAGIC.swap_bytes(), XENIX_MAGIC), Some(Endian::Big));
        assert_eq!(magic_order(0, XENIX_MAGIC), None);
    }

    #[test]
    fn block_types() {
        assert_eq!(block_size(2).unwrap(), 1024);
        assert!(matches!(
            block_size(7),
            Err(FsError::InconsistentField { field: "s_type", .. })
        ));
    }

    #[test]
    fn sysv_release_from_padding() {
        let mut area = vec![0u8; SUPERBLOCK_AREA];
        area[0x1F8..0x1FC].copy_from_slice(&SYSV_MAGIC.to_le_bytes());
        area[0x1FC..0x200].copy_from_slice(&2u32.to_le_bytes());
        area[4..8].copy_from_slice(&100u32.to_le_bytes());

        let found = classify_area(&area, &geometry(400)).unwrap().unwrap();
        assert_eq!(found.layout(), LayoutDescriptor::SysVR4);

        let mut area = vec![0u8; SUPERBLOCK_AREA];
        area[0x1F8..0x1FC].copy_from_slice(&SYSV_MAGIC.to_le_bytes());
        area[0x1FC..0x200].copy_from_slice(&2u32.to_le_bytes());
        area[2..6].copy_from_slice(&100u32.to_le_bytes());

        let found = classify_area(&area, &geometry(400)).unwrap().unwrap();
        assert_eq!(found.layout(), LayoutDescriptor::SysVR2);
    }

    #[test]
    fn coherent_markers() {
        let mut area = vec![0u8; SUPERBLOCK_AREA];
        area[0x1E4..0x1EA].copy_from_slice(b"noname");
        area[0x1EA..0x1F0].copy_from_slice(b"nopack");

        let found = classify_area(&area, &geometry(400)).unwrap().unwrap();
        assert_eq!(found.layout(), LayoutDescriptor::Coherent);
        assert_eq!(found.endian(), Endian::Pdp);
    }

    #[test]
    fn unix_v7_needs_an_exact_size() {
        let mut area = vec![0u8; SUPERBLOCK_AREA];
        area[0..2].copy_from_slice(&24u16.to_le_bytes());
        area[2..6].copy_from_slice(&400u32.to_le_bytes());
        area[6..8].copy_from_slice(&10u16.to_le_bytes());

        let found = classify_area(&area, &geometry(400)).unwrap().unwrap();
        assert_eq!(found.layout(), LayoutDescriptor::UnixV7);
        assert!(classify_area(&area, &geometry(401)).unwrap().is_none());
    }
}
