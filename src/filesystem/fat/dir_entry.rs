//! FAT directory entry structure and the root directory scan.
//!
//! Only the root directory is ever read: its volume-label entry carries the label and the
//! timestamps reported for the volume.

use binread::{BinRead, BinReaderExt};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use getset::{CopyGetters, Getters};
use serde::Serialize;
use std::io;

use crate::filesystem::fs_error::FsError;
use crate::utils;

/// Size of a directory entry in bytes.
pub const DIR_ENTRY_SIZE: usize = 32;

const END_OF_DIRECTORY: u8 = 0x00;
const DELETED: u8 = 0xE5;
const DOT_ENTRY: u8 = 0x2E;

/// FAT directory entry structure.
///
/// Each directory entry is exactly 32 bytes. Timestamps are stored as packed DOS date
/// and time words.
#[derive(BinRead, Debug, Clone, Getters, CopyGetters)]
#[br(little)]
pub struct DirEntry {
    /// Filename in 8.3 format (8 characters name + 3 characters extension)
    #[getset(get = "pub")]
    name: [u8; 11],
    /// File attributes byte
    #[getset(get_copy = "pub")]
    attr: u8,
    /// NT reserved (unused)
    _n_t_res: u8,
    /// Creation time, 10 ms units past the 2 s resolution of `crt_time`
    crt_time_tenth: u8,
    crt_time: u16,
    crt_date: u16,
    lst_acc_date: u16,
    /// High 16 bits of first cluster number
    _fst_clus_hi: u16,
    wrt_time: u16,
    wrt_date: u16,
    /// Low 16 bits of first cluster number
    _fst_clus_lo: u16,
    /// File size in bytes (0 for directories)
    _file_size: u32,
}

impl DirEntry {
    /// Creates a directory entry from a byte slice of at least 32 bytes.
    pub fn from_slice(buf: &[u8]) -> Result<Self, FsError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FsError::from)
    }

    /// Volume label entries have the label bit set, optionally with the archive bit.
    pub fn is_volume_label(&self) -> bool {
        matches!(self.attr, 0x08 | 0x28)
    }

    pub fn label(&self) -> String {
        utils::oem_string(&self.name)
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        let date = dos_date(self.crt_date)?;
        let time = dos_time(self.crt_time)?;
        let extra = TimeDelta::milliseconds(i64::from(self.crt_time_tenth) * 10);
        date.and_time(time).checked_add_signed(extra)
    }

    pub fn modified(&self) -> Option<NaiveDateTime> {
        Some(dos_date(self.wrt_date)?.and_time(dos_time(self.wrt_time)?))
    }

    /// Access dates carry no time of day.
    pub fn accessed(&self) -> Option<NaiveDateTime> {
        Some(dos_date(self.lst_acc_date)?.and_time(NaiveTime::MIN))
    }
}

/// Decodes a packed DOS date: bits 9-15 year since 1980, 5-8 month, 0-4 day.
pub fn dos_date(date: u16) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        1980 + i32::from(date >> 9),
        u32::from((date >> 5) & 0x0F),
        u32::from(date & 0x1F),
    )
}

/// Decodes a packed DOS time: bits 11-15 hours, 5-10 minutes, 0-4 seconds / 2.
pub fn dos_time(time: u16) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(
        u32::from(time >> 11),
        u32::from((time >> 5) & 0x3F),
        u32::from(time & 0x1F) * 2,
    )
}

/// What the root directory says about the volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct RootDirectoryScan {
    #[getset(get = "pub")]
    label: String,
    #[getset(get_copy = "pub")]
    created: Option<NaiveDateTime>,
    #[getset(get_copy = "pub")]
    modified: Option<NaiveDateTime>,
    #[getset(get_copy = "pub")]
    accessed: Option<NaiveDateTime>,
}

/// Scans root directory entries for the first volume-label entry.
///
/// The scan stops at the end-of-directory marker; deleted and dot entries are skipped.
pub fn scan_root_directory(buf: &[u8]) -> Result<Option<RootDirectoryScan>, FsError> {
    for raw in buf.chunks_exact(DIR_ENTRY_SIZE) {
        match raw[0] {
            END_OF_DIRECTORY => break,
            DELETED | DOT_ENTRY => continue,
            _ => {}
        }

        let entry = DirEntry::from_slice(raw)?;
        if entry.is_volume_label() {
            return Ok(Some(RootDirectoryScan {
                label: entry.label(),
                created: entry.created(),
                modified: entry.modified(),
                accessed: entry.accessed(),
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &[u8; 11], attr: u8) -> [u8; 32] {
        let mut raw = [0u8; 32];
        raw[..11].copy_from_slice(name);
        raw[11] = attr;
        raw
    }

    #[test]
    fn packed_dates() {
        // 2003-07-15
        let date = ((2003 - 1980) << 9) | (7 << 5) | 15;
        assert_eq!(dos_date(date), NaiveDate::from_ymd_opt(2003, 7, 15));
        assert_eq!(dos_date(0), None);

        // 13:45:58
        let time = (13 << 11) | (45 << 5) | 29;
        assert_eq!(dos_time(time), NaiveTime::from_hms_opt(13, 45, 58));
        assert_eq!(dos_time(30), None);
    }

    #[test]
    fn label_entry_after_files() {
        let mut root = Vec::new();
        root.extend_from_slice(&entry(b"COMMAND COM", 0x20));
        let mut deleted = entry(b"XOLDLBL    ", 0x08);
        deleted[0] = DELETED;
        root.extend_from_slice(&deleted);

        let mut label = entry(b"BACKUP 1   ", 0x28);
        let date: u16 = ((1991 - 1980) << 9) | (3 << 5) | 2;
        let time: u16 = (10 << 11) | (30 << 5) | 5;
        label[22..24].copy_from_slice(&time.to_le_bytes());
        label[24..26].copy_from_slice(&date.to_le_bytes());
        root.extend_from_slice(&label);
        root.extend_from_slice(&[0u8; 64]);

        let scan = scan_root_directory(&root).unwrap().unwrap();
        assert_eq!(scan.label(), "BACKUP 1");
        assert_eq!(
            scan.modified(),
            NaiveDate::from_ymd_opt(1991, 3, 2)
                .unwrap()
                .and_hms_opt(10, 30, 10)
        );
        assert_eq!(scan.created(), None);
    }

    #[test]
    fn stops_at_end_marker() {
        let mut root = vec![0u8; 32];
        root.extend_from_slice(&entry(b"LATE LABEL ", 0x08));
        assert_eq!(scan_root_directory(&root).unwrap(), None);
    }

    #[test]
    fn creation_time_adds_hundredths() {
        let mut raw = entry(b"VOL        ", 0x08);
        let date: u16 = ((2000 - 1980) << 9) | (1 << 5) | 1;
        let time: u16 = (12 << 11) | 29;
        raw[13] = 150;
        raw[14..16].copy_from_slice(&time.to_le_bytes());
        raw[16..18].copy_from_slice(&date.to_le_bytes());

        let entry = DirEntry::from_slice(&raw).unwrap();
        let expected = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 59, 500)
            .unwrap();
        assert_eq!(entry.created(), Some(expected));
    }
}
