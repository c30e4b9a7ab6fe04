//! Master Boot Record parsing.
//!
//! The partition table is what turns a raw disk image into the per-partition
//! [`SectorGeometry`](crate::device::SectorGeometry) values the detectors work on.
use binread::{BinRead, BinReaderExt};
use getset::CopyGetters;
use serde::Serialize;
use std::fmt::Write;
use std::fmt::{self, Display};
use std::io;

use super::disk_error::DiskError;
use crate::device::SectorSource;
use crate::traits::LayoutDisplay;
use crate::utils::FieldReader;

/// The number of primary partitions supported by MBR.
pub const PART_CNT: usize = 4;

/// Offset of the partition table in the first sector.
const PART_TABLE_OFFSET: u64 = 446;

/// Represents the type of a partition table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PTType {
    /// FAT12, up to 32 MiB.
    Fat12,
    /// FAT16 in its CHS (0x04, 0x06) and LBA (0x0E) flavours.
    Fat16(u8),
    /// FAT32 in its CHS (0x0B) and LBA (0x0C) flavours.
    Fat32(u8),
    /// XENIX root (0x02) or usr (0x03).
    Xenix(u8),
    /// System V/386, shared with GNU HURD.
    SysV,
    /// Unsupported partition type, encapsulating the raw type byte.
    Unsupported(u8),
}

impl Display for PTType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PTType::Fat12 => write!(f, "FAT12"),
            PTType::Fat16(0x0E) => write!(f, "LBA FAT16"),
            PTType::Fat16(_) => write!(f, "FAT16"),
            PTType::Fat32(0x0C) => write!(f, "LBA FAT32"),
            PTType::Fat32(_) => write!(f, "FAT32"),
            PTType::Xenix(0x02) => write!(f, "XENIX root"),
            PTType::Xenix(_) => write!(f, "XENIX usr"),
            PTType::SysV => write!(f, "System V"),
            PTType::Unsupported(b) => write!(f, "Unknown 0x{:02X}", b),
        }
    }
}

impl PTType {
    /// Creates a `PTType` instance from the raw partition type byte.
    fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => PTType::Fat12,
            0x04 | 0x06 | 0x0E => PTType::Fat16(byte),
            0x0B | 0x0C => PTType::Fat32(byte),
            0x02 | 0x03 => PTType::Xenix(byte),
            0x63 => PTType::SysV,
            _ => PTType::Unsupported(byte),
        }
    }
}

/// On-disk partition table entry.
#[derive(BinRead, Debug)]
#[br(little)]
struct RawEntry {
    _status: u8,
    _chs_first: [u8; 3],
    pt_type: u8,
    _chs_last: [u8; 3],
    lba_start: u32,
    sector_cnt: u32,
}

/// Represents a single partition table entry.
#[derive(Debug, Clone, Copy, Serialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct PTEntry {
    /// The type of the partition.
    pt_type: PTType,
    /// The starting Logical Block Address (LBA) of the partition.
    lba_start: u32,
    /// The number of sectors in the partition.
    sector_cnt: u32,
}

impl From<RawEntry> for PTEntry {
    fn from(raw: RawEntry) -> Self {
        PTEntry {
            pt_type: PTType::from_byte(raw.pt_type),
            lba_start: raw.lba_start,
            sector_cnt: raw.sector_cnt,
        }
    }
}

/// Represents the boot signature of a Master Boot Record (MBR).
#[derive(Debug)]
enum BootSignature {
    /// Standard MBR boot signature (0x55AA).
    Mbr(u16),
    /// Unsupported boot signature, encapsulating the raw value.
    Unsupported(u16),
}

impl BootSignature {
    pub fn from_u16(sig: u16) -> BootSignature {
        match sig {
            // The signature 0x55AA is stored on disk in little-endian byte order.
            0xAA55 => BootSignature::Mbr(0xAA55),
            other => BootSignature::Unsupported(other),
        }
    }
}

/// Implements the trait Display for BootSignature by displaying its hex value.
impl fmt::Display for BootSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootSignature::Mbr(sig) => write!(f, "0x{:04X}", sig),
            BootSignature::Unsupported(sig) => write!(f, "0x{:04X}", sig),
        }
    }
}

/// Represents a Master Boot Record (MBR), including partition table entries
/// and the boot signature.
#[derive(Debug)]
pub struct Mbr {
    /// The partition table entries in the MBR.
    pt_entries: [PTEntry; PART_CNT],
    /// The boot signature of the MBR.
    boot_signature: BootSignature,
    sector_cnt: u64,
}

impl Mbr {
    /// Reads and validates the MBR in the first sector of `source`.
    ///
    /// # Errors
    /// - `DiskError::Source` if the first sector cannot be read
    /// - `DiskError::InvalidSignature` if sector 0 does not end with 0x55AA
    /// - `DiskError::PartitionTableNotSorted`, `DiskError::OverlappingPartitions` or
    ///   `DiskError::ParsingError` if the entries do not describe a usable table
    pub fn from_source(source: &dyn SectorSource) -> Result<Mbr, DiskError> {
        let buffer = source.read_sector(0)?;
        if buffer.len() < 512 {
            return Err(DiskError::ParsingError(format!(
                "{} byte sectors cannot hold a partition table",
                buffer.len()
            )));
        }

        let mut reader = io::Cursor::new(buffer.as_slice());
        reader.set_position(PART_TABLE_OFFSET);
        let mut raw = Vec::with_capacity(PART_CNT);
        for _ in 0..PART_CNT {
            raw.push(PTEntry::from(reader.read_le::<RawEntry>()?));
        }
        let pt_entries: [PTEntry; PART_CNT] = [raw[0], raw[1], raw[2], raw[3]];

        let mbr = Mbr {
            pt_entries,
            boot_signature: BootSignature::from_u16(FieldReader::little(&buffer).u16(510)),
            sector_cnt: source.total_sectors(),
        };

        mbr.validate()
    }

    /// Returns a vector of references to non-empty partition table entries.
    pub fn pt_entries(&self) -> Vec<&PTEntry> {
        self.pt_entries
            .iter()
            .filter(|entry| entry.sector_cnt != 0)
            .collect()
    }

    /// Validates the MBR by checking the partition table and boot signature.
    fn validate(self) -> Result<Self, DiskError> {
        self.check_signature()?
            .check_partition_table_sorted()?
            .check_partitions_non_overlapping()?
            .check_partitions_on_disk()
    }

    fn check_signature(self) -> Result<Self, DiskError> {
        match self.boot_signature {
            BootSignature::Unsupported(sig) => Err(DiskError::InvalidSignature(sig)),
            _ => Ok(self),
        }
    }

    fn check_partition_table_sorted(self) -> Result<Self, DiskError> {
        match self
            .pt_entries()
            .windows(2)
            .all(|pair| pair[0].lba_start <= pair[1].lba_start)
        {
            true => Ok(self),
            false => Err(DiskError::PartitionTableNotSorted),
        }
    }

    fn check_partitions_non_overlapping(self) -> Result<Self, DiskError> {
        match self.pt_entries().windows(2).any(|pair| {
            u64::from(pair[0].lba_start) + u64::from(pair[0].sector_cnt)
                > u64::from(pair[1].lba_start)
        }) {
            true => Err(DiskError::OverlappingPartitions),
            false => Ok(self),
        }
    }

    /// A boot sector without a partition table usually fails here: its boot code read as
    /// entries points outside the medium, or at sector 0 itself.
    fn check_partitions_on_disk(self) -> Result<Self, DiskError> {
        if self.pt_entries().is_empty() {
            return Err(DiskError::ParsingError(String::from(
                "partition table is empty",
            )));
        }
        let misplaced = self
            .pt_entries
            .iter()
            .filter(|entry| entry.sector_cnt != 0)
            .find(|entry| {
                entry.lba_start == 0
                    || u64::from(entry.lba_start) + u64::from(entry.sector_cnt) > self.sector_cnt
            })
            .map(|entry| (entry.lba_start, entry.sector_cnt));

        match misplaced {
            Some((start, count)) => Err(DiskError::ParsingError(format!(
                "partition at LBA {start} ({count} sectors) does not fit a {} sector disk",
                self.sector_cnt
            ))),
            None => Ok(self),
        }
    }
}

/// Prints the layout of the disk based on the Master Boot Record.
impl LayoutDisplay for Mbr {
    fn display_layout(&self, indent: u8) -> Result<String, fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());

        let mut last_end = 0;
        let disk_end = self.sector_cnt;

        writeln!(out, "{}┌{:─^55}┐", indent, " Master Boot Record Layout ")?;
        writeln!(out, "{}├{:<45}{:>10}┤", indent, "Disk Size", disk_end)?;
        writeln!(
            out,
            "{}├{:<45}{:>10}┤",
            indent,
            "Boot Signature",
            format!("{:>10}", self.boot_signature)
        )?;
        writeln!(out, "{}├{:─^55}┤", indent, "")?;

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

        for (i, entry) in self.pt_entries().iter().enumerate() {
            let start = u64::from(entry.lba_start());
            let end = start + u64::from(entry.sector_cnt());

            if start > last_end {
                writeln!(
                    out,
                    "{}│{:^12}│{:>12}│{:>12}│{:^16}│",
                    indent, "", last_end, start, "Unallocated"
                )?;
            }

            writeln!(
                out,
                "{}│{:^12}│{:>12}│{:>12}│{:^16}│",
                indent,
                format!("Part #{}", i + 1),
                start,
                end,
                entry.pt_type().to_string()
            )?;

            last_end = end;
        }

        if last_end < disk_end {
            writeln!(
                out,
                "{}│{:^12}│{:>12}│{:>12}│{:^16}│",
                indent, "", last_end, disk_end, "Unallocated"
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MediaKind, MemorySource};

    fn entry(buf: &mut [u8], slot: usize, pt_type: u8, start: u32, count: u32) {
        let offset = 446 + slot * 16;
        buf[offset + 4] = pt_type;
        buf[offset + 8..offset + 12].copy_from_slice(&start.to_le_bytes());
        buf[offset + 12..offset + 16].copy_from_slice(&count.to_le_bytes());
    }

    fn disk(build: impl FnOnce(&mut [u8])) -> MemorySource {
        let mut data = vec![0u8; 512 * 200];
        build(&mut data);
        data[510] = 0x55;
        data[511] = 0xAA;
        MemorySource::new(data, 512, MediaKind::Other).unwrap()
    }

    #[test]
    fn reads_primary_partitions() {
        let source = disk(|buf| {
            entry(buf, 0, 0x01, 1, 99);
            entry(buf, 1, 0x63, 100, 100);
        });
        let mbr = Mbr::from_source(&source).unwrap();
        let entries = mbr.pt_entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pt_type(), PTType::Fat12);
        assert_eq!(entries[1].pt_type(), PTType::SysV);
        assert_eq!(entries[1].lba_start(), 100);

        let layout = mbr.display_layout(0).unwrap();
        assert!(layout.contains("Part #2"));
        assert!(layout.contains("System V"));
    }

    #[test]
    fn rejects_overlapping_and_unsorted_tables() {
        let overlapping = disk(|buf| {
            entry(buf, 0, 0x06, 1, 120);
            entry(buf, 1, 0x06, 100, 50);
        });
        assert!(matches!(
            Mbr::from_source(&overlapping),
            Err(DiskError::OverlappingPartitions)
        ));

        let unsorted = disk(|buf| {
            entry(buf, 0, 0x06, 100, 50);
            entry(buf, 1, 0x06, 1, 50);
        });
        assert!(matches!(
            Mbr::from_source(&unsorted),
            Err(DiskError::PartitionTableNotSorted)
        ));
    }

    #[test]
    fn rejects_entries_past_the_disk() {
        let source = disk(|buf| entry(buf, 0, 0x0C, 1, 1000));
        assert!(matches!(
            Mbr::from_source(&source),
            Err(DiskError::ParsingError(_))
        ));
    }
}
