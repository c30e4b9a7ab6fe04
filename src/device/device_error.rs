//! Error types for sector-level access.

use std::io;
use thiserror;

/// Errors raised by a [`SectorSource`](super::SectorSource) or while building a geometry.
///
/// These are contract violations between the caller and the medium, not format mismatches:
/// detectors propagate them instead of falling through to the next candidate layout.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Wraps an I/O error raised by the underlying image file.
    #[error("I/O error: {0}")]
    Io(io::Error),
    /// A read asked for sectors past the end of the medium.
    #[error("Read of {count} sector(s) at LBA {lba} runs past the end of the medium ({total} sectors)")]
    OutOfBounds { lba: u64, count: u32, total: u64 },
    /// The geometry handed to a detector is not self-consistent.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        SourceError::Io(err)
    }
}
