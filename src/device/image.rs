//! Concrete sector sources: a raw image file on disk and an in-memory buffer.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use getset::Getters;
use log::trace;

use super::device_error::SourceError;
use super::geometry::MediaKind;
use super::{SectorSource, check_bounds};

/// A raw disk image read straight from a file.
#[derive(Debug, Getters)]
pub struct ImageFile {
    file: File,
    #[get = "pub"]
    path: PathBuf,
    sector_size: u32,
    total_sectors: u64,
    media_kind: MediaKind,
}

impl ImageFile {
    /// Opens `path` as a sequence of `sector_size`-byte sectors.
    ///
    /// A trailing partial sector is not addressable.
    pub fn open(path: &Path, sector_size: u32, media_kind: MediaKind) -> Result<Self, SourceError> {
        if sector_size == 0 {
            return Err(SourceError::InvalidGeometry(String::from(
                "sector size must be greater than 0",
            )));
        }

        let file = File::open(path)?;
        let total_sectors = file.metadata()?.len() / u64::from(sector_size);

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sector_size,
            total_sectors,
            media_kind,
        })
    }
}

impl SectorSource for ImageFile {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn total_sectors(&self) -> u64 {
        self.total_sectors
    }

    fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    fn read_sectors(&self, lba: u64, count: u32) -> Result<Vec<u8>, SourceError> {
        check_bounds(lba, count, self.total_sectors)?;
        trace!("reading {count} sector(s) at LBA {lba}");

        let mut buffer = vec![0; count as usize * self.sector_size as usize];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(u64::from(self.sector_size) * lba))?;
        file.read_exact(&mut buffer).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to read sector {lba}: {err}"),
            )
        })?;

        Ok(buffer)
    }
}

/// An image held in memory, used for fixtures and for images already loaded by the caller.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    sector_size: u32,
    media_kind: MediaKind,
}

impl MemorySource {
    pub fn new(data: Vec<u8>, sector_size: u32, media_kind: MediaKind) -> Result<Self, SourceError> {
        if sector_size == 0 {
            return Err(SourceError::InvalidGeometry(String::from(
                "sector size must be greater than 0",
            )));
        }

        Ok(Self {
            data,
            sector_size,
            media_kind,
        })
    }
}

impl SectorSource for MemorySource {
    fn sector_size(&self) -> u32 {
        self.sector_size
    }

    fn total_sectors(&self) -> u64 {
        self.data.len() as u64 / u64::from(self.sector_size)
    }

    fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    fn read_sectors(&self, lba: u64, count: u32) -> Result<Vec<u8>, SourceError> {
        check_bounds(lba, count, self.total_sectors())?;

        let start = lba as usize * self.sector_size as usize;
        let end = start + count as usize * self.sector_size as usize;
        Ok(self.data[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn image_file_reads_whole_sectors() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        let mut data = vec![0u8; 1024 + 100];
        data[512] = 0xAB;
        tmp.write_all(&data).unwrap();

        let image = ImageFile::open(tmp.path(), 512, MediaKind::Other).unwrap();
        assert_eq!(image.total_sectors(), 2);
        assert_eq!(image.read_sector(1).unwrap()[0], 0xAB);
        assert!(matches!(
            image.read_sector(2),
            Err(SourceError::OutOfBounds { .. })
        ));
    }
}
