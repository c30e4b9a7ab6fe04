//! Error types for volume classification and decoding.
//!
//! Only two variants are real failures: `Source` (the medium could not deliver sectors the
//! geometry promised) and `BinReadError`. The others describe negative or partial results:
//! a detector returns `NotRecognized` when no layout matched, `GeometryTooSmall` when the
//! partition cannot hold the smallest candidate, and the cascades use `InconsistentField`
//! internally to skip a single candidate layout.

use thiserror::Error;

use crate::device::SourceError;

#[derive(Error, Debug)]
pub enum FsError {
    /// No candidate layout matched the volume.
    #[error("No known on-disk layout matched the volume")]
    NotRecognized,

    /// The partition is shorter than the minimum a detector needs; nothing was read.
    #[error("Partition spans {available} sector(s); at least {required} are needed")]
    GeometryTooSmall { required: u64, available: u64 },

    /// A field failed a plausibility check after a coarser check of the same layout passed.
    #[error("Inconsistent field `{field}`: {reason}")]
    InconsistentField { field: &'static str, reason: String },

    /// The sector source failed; the geometry and the medium disagree.
    #[error("Sector source error: `{0}`")]
    Source(SourceError),

    /// Parsing error while decoding a fixed structure.
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

impl FsError {
    pub(crate) fn inconsistent(field: &'static str, reason: impl Into<String>) -> Self {
        FsError::InconsistentField {
            field,
            reason: reason.into(),
        }
    }
}

/// Converts sector source errors into FsError.
impl From<SourceError> for FsError {
    fn from(err: SourceError) -> Self {
        FsError::Source(err)
    }
}

/// Converts BinRead errors into FsError.
impl From<binread::Error> for FsError {
    fn from(err: binread::Error) -> Self {
        FsError::BinReadError(err)
    }
}
