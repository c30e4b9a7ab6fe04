//! Partition geometry handed to the detectors.

use getset::CopyGetters;
use serde::Serialize;
use std::fmt;

use super::SectorSource;
use super::device_error::SourceError;

/// Kind of medium the sectors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MediaKind {
    /// 2048-byte physical sectors carrying a FAT laid out in 512-byte logical sectors.
    OpticalDisc,
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::OpticalDisc => write!(f, "optical disc"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// Sector geometry of the partition being examined.
///
/// `partition_start` and `partition_end` are inclusive LBAs on the medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, Serialize)]
#[getset(get_copy = "pub")]
pub struct SectorGeometry {
    bytes_per_sector: u32,
    total_sectors: u64,
    media_kind: MediaKind,
    partition_start: u64,
    partition_end: u64,
}

impl SectorGeometry {
    /// Builds a geometry, checking `partition_end > partition_start` and that the partition
    /// lies on the medium.
    pub fn new(
        bytes_per_sector: u32,
        total_sectors: u64,
        media_kind: MediaKind,
        partition_start: u64,
        partition_end: u64,
    ) -> Result<Self, SourceError> {
        if bytes_per_sector == 0 {
            return Err(SourceError::InvalidGeometry(String::from(
                "sector size must be greater than 0",
            )));
        }
        if partition_end <= partition_start {
            return Err(SourceError::InvalidGeometry(format!(
                "partition end {partition_end} must be after its start {partition_start}"
            )));
        }
        if partition_end >= total_sectors {
            return Err(SourceError::InvalidGeometry(format!(
                "partition end {partition_end} lies past the last sector {}",
                total_sectors.saturating_sub(1)
            )));
        }

        Ok(Self {
            bytes_per_sector,
            total_sectors,
            media_kind,
            partition_start,
            partition_end,
        })
    }

    /// Geometry covering the whole medium.
    pub fn whole(source: &dyn SectorSource) -> Result<Self, SourceError> {
        Self::new(
            source.sector_size(),
            source.total_sectors(),
            source.media_kind(),
            0,
            source.total_sectors().saturating_sub(1),
        )
    }

    /// Geometry of `sector_cnt` sectors starting at `start` on `source`.
    pub fn partition(
        source: &dyn SectorSource,
        start: u64,
        sector_cnt: u64,
    ) -> Result<Self, SourceError> {
        Self::new(
            source.sector_size(),
            source.total_sectors(),
            source.media_kind(),
            start,
            (start + sector_cnt).saturating_sub(1),
        )
    }

    /// Number of sectors in the partition.
    pub fn partition_length(&self) -> u64 {
        self.partition_end - self.partition_start + 1
    }

    /// Size of the partition in bytes.
    pub fn partition_bytes(&self) -> u64 {
        self.partition_length() * u64::from(self.bytes_per_sector)
    }

    /// Divisor applied to sector-count fields before they are compared with this geometry.
    pub fn sector_scale(&self) -> u64 {
        match self.media_kind {
            MediaKind::OpticalDisc => 4,
            MediaKind::Other => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_must_follow_start() {
        assert!(SectorGeometry::new(512, 100, MediaKind::Other, 10, 10).is_err());
        assert!(SectorGeometry::new(512, 100, MediaKind::Other, 10, 100).is_err());
        let geometry = SectorGeometry::new(512, 100, MediaKind::Other, 10, 99).unwrap();
        assert_eq!(geometry.partition_length(), 90);
        assert_eq!(geometry.partition_bytes(), 90 * 512);
    }

    #[test]
    fn optical_media_scale_sector_counts() {
        let optical = SectorGeometry::new(2048, 10, MediaKind::OpticalDisc, 0, 9).unwrap();
        assert_eq!(optical.sector_scale(), 4);
    }
}
