//! System V family superblock decoding.

use chrono::{DateTime, NaiveDateTime};
use getset::{CopyGetters, Getters};
use serde::Serialize;

use super::classifier::{SYSV_CLEAN_STATE, block_size};
use crate::device::SectorGeometry;
use crate::filesystem::classification::Classification;
use crate::filesystem::fs_error::FsError;
use crate::filesystem::layout::{Field, LayoutDescriptor};
use crate::utils::{self, Endian};

/// `s_clean` value of a cleanly unmounted XENIX volume.
pub const XENIX_CLEAN: u64 = 0x46;

/// Canonical decoded record of any System V family superblock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct SuperblockDescriptor {
    #[getset(get_copy = "pub")]
    layout: LayoutDescriptor,
    #[getset(get_copy = "pub")]
    endian: Endian,
    /// Byte offset of the superblock from the partition start.
    #[getset(get_copy = "pub")]
    offset: u64,
    #[getset(get_copy = "pub")]
    block_size: u64,
    #[getset(get_copy = "pub")]
    total_blocks: u64,
    #[getset(get_copy = "pub")]
    free_blocks: u64,
    #[getset(get_copy = "pub")]
    inode_blocks: u64,
    #[getset(get_copy = "pub")]
    free_inodes: u64,
    /// Entries in the superblock's free block cache.
    #[getset(get_copy = "pub")]
    cached_free_blocks: u64,
    /// Entries in the superblock's free inode cache.
    #[getset(get_copy = "pub")]
    cached_free_inodes: u64,
    #[getset(get_copy = "pub")]
    last_update: Option<NaiveDateTime>,
    #[getset(get = "pub")]
    volume_name: String,
    #[getset(get = "pub")]
    pack_name: String,
    #[getset(get_copy = "pub")]
    read_only: bool,
    #[getset(get_copy = "pub")]
    modified: bool,
    /// Clean state, for the layouts that record one.
    #[getset(get_copy = "pub")]
    clean: Option<bool>,
    #[getset(get_copy = "pub")]
    cylinder_blocks: u64,
    #[getset(get_copy = "pub")]
    gap_blocks: u64,
}

impl SuperblockDescriptor {
    pub fn fs_type(&self) -> &'static str {
        match self.layout {
            LayoutDescriptor::XenixV1 | LayoutDescriptor::XenixV3 => "XENIX fs",
            LayoutDescriptor::SysVR4 => "SVR4 fs",
            LayoutDescriptor::SysVR2 => "SVR2 fs",
            LayoutDescriptor::Coherent => "Coherent fs",
            _ => "UNIX 7th Edition fs",
        }
    }
}

/// Maps a classified superblock onto the canonical record.
pub fn decode(
    classification: &Classification,
    geometry: &SectorGeometry,
) -> Result<SuperblockDescriptor, FsError> {
    let layout = classification.layout();
    let view = classification.view(1);
    let mut d = SuperblockDescriptor {
        layout,
        endian: classification.endian(),
        offset: classification.offset(),
        block_size: 512,
        total_blocks: 0,
        free_blocks: 0,
        inode_blocks: 0,
        free_inodes: 0,
        cached_free_blocks: 0,
        cached_free_inodes: 0,
        last_update: None,
        volume_name: String::new(),
        pack_name: String::new(),
        read_only: false,
        modified: false,
        clean: None,
        cylinder_blocks: 0,
        gap_blocks: 0,
    };

    let mut time = 0;
    let mut clean_flag = None;
    let mut state = None;
    let mut s_type = None;

    for spec in layout.fields() {
        let value = spec.read_raw(view.reader());
        match spec.field {
            Field::InodeBlocks => d.inode_blocks = value,
            Field::FsSize => d.total_blocks = value,
            Field::FreeCount => d.cached_free_blocks = value,
            Field::InodeCount => d.cached_free_inodes = value,
            Field::Modified => d.modified = value != 0,
            Field::ReadOnly => d.read_only = value != 0,
            Field::UpdateTime => time = value,
            Field::TotalFree => d.free_blocks = value,
            Field::TotalFreeInodes => d.free_inodes = value,
            Field::CylinderBlocks => d.cylinder_blocks = value,
            Field::GapBlocks => d.gap_blocks = value,
            Field::VolumeName => d.volume_name = name(spec.read_bytes(view.reader())),
            Field::PackName => d.pack_name = name(spec.read_bytes(view.reader())),
            Field::CleanFlag => clean_flag = Some(value),
            Field::State => state = Some(value),
            Field::BlockType => s_type = Some(value),
            _ => {}
        }
    }

    d.block_size = match (s_type, layout) {
        (Some(s_type), _) => block_size(s_type)?,
        (None, LayoutDescriptor::UnixV7) if d.total_blocks * 512 != geometry.partition_bytes() => 1024,
        (None, _) => 512,
    };

    if time != 0 {
        d.last_update = DateTime::from_timestamp(time as i64, 0).map(|dt| dt.naive_utc());
    }

    d.clean = match (clean_flag, state) {
        (Some(flag), _) => Some(flag == XENIX_CLEAN),
        (None, Some(state)) => Some(state as u32 == SYSV_CLEAN_STATE.wrapping_sub(time as u32)),
        (None, None) => None,
    };

    Ok(d)
}

/// Volume and pack names are NUL padded, and Coherent ends them with a newline.
fn name(bytes: &[u8]) -> String {
    utils::c_string(bytes).trim_end().to_string()
}
