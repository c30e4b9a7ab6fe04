//! Plausibility predicates shared by the classification cascades.
//!
//! Every function here is pure and cheap; the cascades combine them per candidate layout.

use crate::device::SectorGeometry;

/// Sectors-per-cluster values accepted for any BPB variant.
pub const ALLOWED_CLUSTER_SIZES: [u8; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Exactly one bit set.
pub fn is_power_of_two_16(x: u16) -> bool {
    x.count_ones() == 1
}

pub fn is_allowed_cluster_size(spc: u8) -> bool {
    ALLOWED_CLUSTER_SIZES.contains(&spc)
}

/// Every byte lies in `[0x20, 0x7F]`.
pub fn ascii_printable_run(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| (0x20..=0x7F).contains(b))
}

pub fn sector_count_fits_partition(count: u64, geometry: &SectorGeometry) -> bool {
    count <= geometry.partition_length()
}

pub fn bounded_chs(sectors_per_track: u16, heads: u16) -> bool {
    sectors_per_track > 0 && sectors_per_track < 64 && heads > 0 && heads < 256
}

/// OEM name whose first byte is a control character while the rest is printable.
///
/// Some ANDOS-formatted volumes carry such a name and a valid BPB without any EBPB
/// signature byte.
pub fn andos_oem(oem_name: &[u8]) -> bool {
    match oem_name.split_first() {
        Some((first, rest)) => oem_name.len() == 8 && *first < 0x20 && ascii_printable_run(rest),
        None => false,
    }
}

/// Jump bytes of a 68000 branch rather than x86 boot code.
///
/// `0x60` is `BRA.S`; `0xE9 0x00` is reserved to Atari unless the OEM name says NeXT.
pub fn atari_jump(jump: &[u8], oem_name: &[u8]) -> bool {
    match jump {
        [0x60, ..] => true,
        [0xE9, 0x00, ..] => oem_name != b"NEXT    ",
        _ => false,
    }
}

/// FAT12 entry 1, packed into the high nibble of byte 1 and all of byte 2.
pub fn fat12_terminator(fat: &[u8]) -> u16 {
    match fat {
        [_, lo, hi, ..] => (u16::from(*lo) >> 4) | (u16::from(*hi) << 4),
        _ => 0,
    }
}

/// Boot sector starting with an x86 `CLI` or a short forward jump, closed by `0xAA55`.
pub fn x86_bootable(jump: &[u8], boot_signature: u16) -> bool {
    let code = match jump {
        [0xFA, ..] => true,
        [0xEB, offset, ..] => *offset <= 0x7F,
        _ => false,
    };
    code && boot_signature == 0xAA55
}
