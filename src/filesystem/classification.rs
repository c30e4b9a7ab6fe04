//! Result of running a classification cascade over one partition.

use getset::{CopyGetters, Getters};
use std::collections::BTreeMap;

use super::fat::floppy::FixedGeometry;
use super::layout::{LayoutDescriptor, LayoutView};
use crate::utils::{Endian, FieldReader};

/// Why an auxiliary buffer was read while classifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuxPurpose {
    /// First sector of the first FAT copy.
    FirstFat,
    /// First sector of the second FAT copy.
    SecondFat,
    /// FAT32 file system information sector.
    FsInfo,
    RainbowFat1,
    RainbowFat2,
    /// The interleaved DEC Rainbow root directory, concatenated.
    RainbowRoot,
}

/// The one layout chosen for a partition, with every buffer needed to decode it.
///
/// Built once by a cascade and never reinterpreted under another layout afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Classification {
    #[getset(get_copy = "pub")]
    layout: LayoutDescriptor,
    #[getset(get_copy = "pub")]
    endian: Endian,
    /// Bytes the layout's offset table applies to.
    #[getset(get = "pub")]
    raw: Vec<u8>,
    #[getset(get = "pub")]
    aux: BTreeMap<AuxPurpose, Vec<u8>>,
    /// Hard-coded geometry for layouts that carry no BPB.
    #[getset(get_copy = "pub")]
    fixed: Option<&'static FixedGeometry>,
    /// Byte offset of `raw` from the start of the partition.
    #[getset(get_copy = "pub")]
    offset: u64,
}

impl Classification {
    pub fn new(layout: LayoutDescriptor, endian: Endian, raw: Vec<u8>) -> Self {
        Self {
            layout,
            endian,
            raw,
            aux: BTreeMap::new(),
            fixed: None,
            offset: 0,
        }
    }

    pub fn with_aux(mut self, purpose: AuxPurpose, buf: Vec<u8>) -> Self {
        self.aux.insert(purpose, buf);
        self
    }

    pub fn with_fixed(mut self, fixed: &'static FixedGeometry) -> Self {
        self.fixed = Some(fixed);
        self
    }

    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn aux_buffer(&self, purpose: AuxPurpose) -> Option<&[u8]> {
        self.aux.get(&purpose).map(Vec::as_slice)
    }

    /// The raw buffer seen through the chosen layout's offset table.
    pub fn view(&self, scale: u64) -> LayoutView<'_> {
        LayoutView::new(self.layout, FieldReader::new(&self.raw, self.endian), scale)
    }
}
