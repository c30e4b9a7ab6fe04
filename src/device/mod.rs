//! Sector Source: the block-level view of a medium that every detector reads from.
//!
//! Detectors never manage storage themselves. They receive a [`SectorSource`] and a
//! [`SectorGeometry`] describing the partition to look at, and only ever read from it.

pub mod device_error;
pub mod geometry;
pub mod image;

pub use device_error::SourceError;
pub use geometry::{MediaKind, SectorGeometry};
pub use image::{ImageFile, MemorySource};

/// Fixed-size block reads by logical block address.
pub trait SectorSource {
    /// Size in bytes of one sector of the medium.
    fn sector_size(&self) -> u32;

    /// Number of addressable sectors.
    fn total_sectors(&self) -> u64;

    fn media_kind(&self) -> MediaKind;

    /// Reads `count` consecutive sectors starting at `lba`.
    ///
    /// # Errors
    /// - `SourceError::OutOfBounds` if the range ends past [`total_sectors`](Self::total_sectors)
    /// - `SourceError::Io` if the medium cannot be read
    fn read_sectors(&self, lba: u64, count: u32) -> Result<Vec<u8>, SourceError>;

    fn read_sector(&self, lba: u64) -> Result<Vec<u8>, SourceError> {
        self.read_sectors(lba, 1)
    }
}

/// Fails with `OutOfBounds` unless `count` sectors starting at `lba` exist on the medium.
pub(crate) fn check_bounds(lba: u64, count: u32, total: u64) -> Result<(), SourceError> {
    match lba.checked_add(u64::from(count)) {
        Some(end) if end <= total => Ok(()),
        _ => Err(SourceError::OutOfBounds { lba, count, total }),
    }
}

/// Reads `len` bytes starting at absolute byte `offset` of the medium.
///
/// The covering sectors are read and sliced, which lets a layout whose logical sector
/// differs from the medium's physical sector be addressed exactly.
pub fn read_bytes(
    source: &dyn SectorSource,
    offset: u64,
    len: usize,
) -> Result<Vec<u8>, SourceError> {
    if len == 0 {
        return Ok(Vec::new());
    }

    let sector_size = u64::from(source.sector_size());
    let first = offset / sector_size;
    let last = (offset + len as u64 - 1) / sector_size;
    let count = u32::try_from(last - first + 1).map_err(|_| SourceError::OutOfBounds {
        lba: first,
        count: u32::MAX,
        total: source.total_sectors(),
    })?;

    let buf = source.read_sectors(first, count)?;
    let skip = (offset % sector_size) as usize;
    match buf.get(skip..skip + len) {
        Some(slice) => Ok(slice.to_vec()),
        None => Err(SourceError::OutOfBounds {
            lba: first,
            count,
            total: source.total_sectors(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_source() -> MemorySource {
        let data: Vec<u8> = (0..2048u32).map(|i| (i / 512) as u8).collect();
        MemorySource::new(data, 512, MediaKind::Other).unwrap()
    }

    #[test]
    fn read_bytes_spans_sector_boundaries() {
        let source = numbered_source();
        let bytes = read_bytes(&source, 510, 4).unwrap();
        assert_eq!(bytes, vec![0, 0, 1, 1]);
    }

    #[test]
    fn read_past_the_end_is_a_hard_failure() {
        let source = numbered_source();
        assert!(matches!(
            source.read_sectors(3, 2),
            Err(SourceError::OutOfBounds { lba: 3, count: 2, total: 4 })
        ));
        assert!(read_bytes(&source, 2040, 16).is_err());
    }
}
