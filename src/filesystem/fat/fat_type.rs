//! Enum for the different FAT types (FAT12, FAT16, FAT32, FAT+).
//!
//! The subtype follows from the layout and the cluster count, not from the `fs_type` label
//! some layouts carry.

use serde::Serialize;
use std::fmt;

use crate::filesystem::layout::LayoutDescriptor;

/// Clusters below this count make a FAT12 volume.
pub const FAT12_CLUSTER_LIMIT: u64 = 4089;

/// Represents the different types of FAT filesystems.
///
/// # Values
/// - `FAT12`: 12-bit File Allocation Table entries
/// - `FAT16`: 16-bit File Allocation Table entries
/// - `FAT32`: 32-bit File Allocation Table entries
/// - `FATPlus`: FAT32 layout with a non-zero version, used by FAT+ for files over 4 GiB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FATType {
    FAT12,
    FAT16,
    FAT32,
    FATPlus,
}

impl FATType {
    /// Determines the subtype of a volume.
    ///
    /// FAT32 layouts are FAT32 unless their version is non-zero. Layouts that are FAT12 by
    /// convention ignore the cluster count; every other layout is FAT12 below
    /// [`FAT12_CLUSTER_LIMIT`] clusters and FAT16 from there.
    pub fn detect(layout: LayoutDescriptor, version: u16, total_clusters: u64) -> Self {
        if layout.is_fat32() {
            return match version {
                0 => FATType::FAT32,
                _ => FATType::FATPlus,
            };
        }

        if layout.forces_fat12() || total_clusters < FAT12_CLUSTER_LIMIT {
            FATType::FAT12
        } else {
            FATType::FAT16
        }
    }
}

impl fmt::Display for FATType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FATType::FAT12 => "FAT12",
            FATType::FAT16 => "FAT16",
            FATType::FAT32 => "FAT32",
            FATType::FATPlus => "FAT+",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_threshold() {
        assert_eq!(FATType::detect(LayoutDescriptor::Dos33, 0, 4088), FATType::FAT12);
        assert_eq!(FATType::detect(LayoutDescriptor::Dos33, 0, 4089), FATType::FAT16);
    }

    #[test]
    fn conventional_fat12_layouts() {
        assert_eq!(FATType::detect(LayoutDescriptor::Atari, 0, 60000), FATType::FAT12);
        assert_eq!(FATType::detect(LayoutDescriptor::Msx, 0, 60000), FATType::FAT12);
    }

    #[test]
    fn fat32_versions() {
        assert_eq!(FATType::detect(LayoutDescriptor::Fat32, 0, 10), FATType::FAT32);
        assert_eq!(FATType::detect(LayoutDescriptor::ShortFat32, 1, 10), FATType::FATPlus);
    }
}
