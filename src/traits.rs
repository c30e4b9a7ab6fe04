//! Declaration of traits reused across the code.

use std::fmt;

use crate::device::{SectorGeometry, SectorSource};
use crate::filesystem::fs_error::FsError;
use crate::filesystem::metadata::Description;

/// Implementation of the LayoutDisplay trait.
/// It is used to display the layout of a given structure such as a disk or partition.
pub trait LayoutDisplay {
    fn display_layout(&self, indent: u8) -> Result<String, fmt::Error>;
}

/// A family of on-disk layouts that can be recognized on a partition.
///
/// Detectors only read from the source; they never keep state between calls.
pub trait Detector {
    /// Decoded record of the family.
    type Metadata;

    fn name(&self) -> &'static str;

    /// Whether any layout of the family matches the partition.
    fn identify(&self, source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<bool, FsError>;

    /// Classifies and decodes the partition into a report and its metadata.
    fn describe(
        &self,
        source: &dyn SectorSource,
        geometry: &SectorGeometry,
    ) -> Result<Description<Self::Metadata>, FsError>;
}
