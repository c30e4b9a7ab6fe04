//! Disk image opening and partition selection.
//!
//! This module provides functionality for:
//! - Opening a raw disk image as a sector source
//! - Reading its MBR when it has one, or treating the whole image as one volume
//! - Turning a partition number into the geometry the detectors work on
//! - Displaying disk layout information

use getset::Getters;
use log::{debug, info};
use std::path::{Path, PathBuf};

use super::disk_error::DiskError;
use super::mbr::Mbr;
use crate::device::{ImageFile, MediaKind, SectorGeometry, SectorSource};
use crate::traits::LayoutDisplay;

/// Represents a disk image with its optional partition table.
#[derive(Debug, Getters)]
pub struct Disk {
    /// The open disk image file path.
    #[get = "pub"]
    file_path: PathBuf,
    /// The image, read as fixed-size sectors.
    #[get = "pub"]
    source: ImageFile,
    /// The partition table found on the disk, if any.
    #[get = "pub"]
    part_table: Option<Mbr>,
}

impl Disk {
    /// Opens a disk image file and reads its partition table.
    ///
    /// An image whose first sector is not a valid MBR is treated as a single unpartitioned
    /// volume (a floppy image, or a partition extracted on its own).
    ///
    /// # Errors
    /// - Returns `DiskError::Source` if the file cannot be opened or read
    pub fn from_file(path: &Path, sector_size: u32, media: MediaKind) -> Result<Self, DiskError> {
        let source = ImageFile::open(path, sector_size, media)?;

        let part_table = match Mbr::from_source(&source) {
            Ok(mbr) => {
                info!("{}: {} partition(s)", path.display(), mbr.pt_entries().len());
                Some(mbr)
            }
            Err(DiskError::Source(err)) => return Err(DiskError::Source(err)),
            Err(err) => {
                debug!("{}: no usable MBR ({err}), reading the whole image", path.display());
                None
            }
        };

        Ok(Disk {
            file_path: path.to_path_buf(),
            source,
            part_table,
        })
    }

    /// Number of volumes on the disk: one per partition, or the whole image.
    pub fn volume_count(&self) -> usize {
        match &self.part_table {
            Some(mbr) => mbr.pt_entries().len(),
            None => 1,
        }
    }

    /// Geometry of partition `part_nb` (1-based), or of the whole image when `None`.
    ///
    /// # Errors
    /// - `DiskError::NoSuchPartition` if the partition table has no such entry
    /// - `DiskError::Source` if the entry does not describe a valid geometry
    pub fn geometry(&self, part_nb: Option<u8>) -> Result<SectorGeometry, DiskError> {
        let (Some(nb), Some(mbr)) = (part_nb, &self.part_table) else {
            return Ok(SectorGeometry::whole(&self.source)?);
        };

        let entries = mbr.pt_entries();
        let entry = usize::from(nb)
            .checked_sub(1)
            .and_then(|idx| entries.get(idx))
            .ok_or(DiskError::NoSuchPartition {
                requested: nb,
                available: entries.len(),
            })?;

        Ok(SectorGeometry::partition(
            &self.source,
            u64::from(entry.lba_start()),
            u64::from(entry.sector_cnt()),
        )?)
    }

    /// Prints the partition table layout, or the image size when there is none.
    pub fn print_layout(&self, indent: u8) -> Result<(), std::fmt::Error> {
        match &self.part_table {
            Some(mbr) => print!("{}", mbr.display_layout(indent)?),
            None => println!(
                "{}Unpartitioned image: {} sectors of {} bytes",
                " ".repeat(indent.into()),
                self.source.total_sectors(),
                self.source.sector_size()
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unpartitioned_image_is_one_volume() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 512 * 16]).unwrap();

        let disk = Disk::from_file(file.path(), 512, MediaKind::Other).unwrap();
        assert!(disk.part_table().is_none());
        assert_eq!(disk.volume_count(), 1);

        let geometry = disk.geometry(Some(1)).unwrap();
        assert_eq!(geometry.partition_start(), 0);
        assert_eq!(geometry.partition_length(), 16);
    }

    #[test]
    fn partition_numbers_are_one_based() {
        let mut image = vec![0u8; 512 * 64];
        image[446 + 4] = 0x63;
        image[446 + 8..446 + 12].copy_from_slice(&8u32.to_le_bytes());
        image[446 + 12..446 + 16].copy_from_slice(&56u32.to_le_bytes());
        image[510] = 0x55;
        image[511] = 0xAA;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&image).unwrap();

        let disk = Disk::from_file(file.path(), 512, MediaKind::Other).unwrap();
        let geometry = disk.geometry(Some(1)).unwrap();
        assert_eq!(geometry.partition_start(), 8);
        assert_eq!(geometry.partition_end(), 63);
        assert!(matches!(
            disk.geometry(Some(2)),
            Err(DiskError::NoSuchPartition { requested: 2, available: 1 })
        ));
        assert!(matches!(
            disk.geometry(Some(0)),
            Err(DiskError::NoSuchPartition { .. })
        ));
    }
}
