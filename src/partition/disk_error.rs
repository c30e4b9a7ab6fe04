//! Error types for disk and partition operations.
//!
//! This module provides error handling for various disk and partition-related operations,
//! including I/O errors, partition table validation, and boot signature verification.

use std::io;
use thiserror;

use crate::device::SourceError;

/// Represents errors that can occur while opening a disk image and its partition table.
#[derive(thiserror::Error, Debug)]
pub enum DiskError {
    /// Wraps an I/O error that occurred during disk operations.
    #[error("I/O error: {0}")]
    Io(io::Error),
    /// Indicates that the partition table entries are not in ascending order by starting sector.
    #[error("Partition table is not sorted")]
    PartitionTableNotSorted,
    /// Indicates that two or more partitions have overlapping sectors.
    #[error("Some partitions are overlapping")]
    OverlappingPartitions,
    /// Indicates that the boot signature is not valid.
    /// Contains the invalid signature value that was found.
    #[error("Invalid signature: 0x{0:04X}")]
    InvalidSignature(u16),
    /// Parsing error
    #[error("Parsing error: {0}")]
    ParsingError(String),
    /// The requested partition is not in the partition table.
    #[error("No partition #{requested}; the disk has {available}")]
    NoSuchPartition { requested: u8, available: usize },
    /// The sector source failed or the geometry is invalid.
    #[error("Sector source error: {0}")]
    Source(SourceError),
}

/// Converts standard I/O errors into DiskError.
impl From<io::Error> for DiskError {
    fn from(err: io::Error) -> Self {
        DiskError::Io(err)
    }
}

impl From<SourceError> for DiskError {
    fn from(err: SourceError) -> Self {
        DiskError::Source(err)
    }
}

impl From<binread::Error> for DiskError {
    fn from(err: binread::Error) -> Self {
        DiskError::ParsingError(err.to_string())
    }
}
