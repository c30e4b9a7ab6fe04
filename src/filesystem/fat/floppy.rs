//! Hard-coded geometries for FAT media that carry no BPB.

use serde::Serialize;

/// BPB-equivalent values for a medium identified without a BPB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FixedGeometry {
    pub description: &'static str,
    /// FAT id byte (media descriptor) the geometry is keyed on.
    pub media: u8,
    pub total_sectors: u64,
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub root_entries: u16,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub heads: u16,
}

/// DEC Rainbow 100 RX50 floppy.
pub static DEC_RAINBOW: FixedGeometry = FixedGeometry {
    description: "DEC Rainbow RX50 400 KiB",
    media: 0xFA,
    total_sectors: 800,
    bytes_per_sector: 512,
    sectors_per_cluster: 1,
    reserved_sectors: 1,
    fat_count: 2,
    root_entries: 96,
    sectors_per_fat: 3,
    sectors_per_track: 10,
    heads: 1,
};

/// FAT copies of a DEC Rainbow floppy.
pub const RAINBOW_FAT_LBAS: [u64; 2] = [0x14, 0x1A];

/// Root directory sectors of a DEC Rainbow floppy, in logical order.
pub const RAINBOW_ROOT_LBAS: [u64; 6] = [0x17, 0x19, 0x1B, 0x1D, 0x1E, 0x20];

const fn legacy(
    description: &'static str,
    media: u8,
    total_sectors: u64,
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    root_entries: u16,
    sectors_per_fat: u16,
    sectors_per_track: u16,
    heads: u16,
) -> FixedGeometry {
    FixedGeometry {
        description,
        media,
        total_sectors,
        bytes_per_sector,
        sectors_per_cluster,
        reserved_sectors: 1,
        fat_count: 2,
        root_entries,
        sectors_per_fat,
        sectors_per_track,
        heads,
    }
}

/// Pre-BPB floppy formats, keyed by `(media, total_sectors, bytes_per_sector)`.
pub static LEGACY_FLOPPIES: [FixedGeometry; 10] = [
    legacy("8\" single sided single density", 0xE5, 2002, 128, 4, 64, 1, 26, 1),
    legacy("8\" double sided single density", 0xFD, 4004, 128, 4, 68, 6, 26, 2),
    legacy("8\" single sided single density (DOS 2)", 0xFD, 2002, 128, 4, 68, 6, 26, 1),
    legacy("5.25\" single sided 160 KiB", 0xFE, 320, 512, 1, 64, 1, 8, 1),
    legacy("8\" single sided single density (IBM)", 0xFE, 2002, 128, 4, 68, 6, 26, 1),
    legacy("8\" double sided double density", 0xFE, 1232, 1024, 1, 192, 2, 8, 2),
    legacy("8\" single sided double density", 0xFE, 616, 1024, 1, 192, 1, 8, 1),
    legacy("5.25\" single sided 90 KiB", 0xFE, 720, 128, 2, 64, 4, 18, 1),
    legacy("5.25\" double sided 320 KiB", 0xFF, 640, 512, 2, 112, 1, 8, 2),
    legacy("5.25\" single sided 180 KiB", 0xFC, 360, 512, 1, 64, 2, 9, 1),
];

pub fn lookup_legacy(
    media: u8,
    total_sectors: u64,
    bytes_per_sector: u32,
) -> Option<&'static FixedGeometry> {
    LEGACY_FLOPPIES.iter().find(|geometry| {
        geometry.media == media
            && geometry.total_sectors == total_sectors
            && u32::from(geometry.bytes_per_sector) == bytes_per_sector
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_keys_are_unique() {
        for (i, a) in LEGACY_FLOPPIES.iter().enumerate() {
            for b in &LEGACY_FLOPPIES[i + 1..] {
                assert!(
                    (a.media, a.total_sectors, a.bytes_per_sector)
                        != (b.media, b.total_sectors, b.bytes_per_sector),
                    "{} and {} share a key",
                    a.description,
                    b.description
                );
            }
        }
    }

    #[test]
    fn lookup_by_fat_id() {
        let found = lookup_legacy(0xFE, 320, 512).unwrap();
        assert_eq!(found.root_entries, 64);
        assert_eq!(found.sectors_per_fat, 1);
        assert!(lookup_legacy(0xFE, 320, 1024).is_none());
        assert!(lookup_legacy(0xF0, 2880, 512).is_none());
    }
}
