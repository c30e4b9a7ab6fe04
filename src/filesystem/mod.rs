//! Legacy volume layout recognition.
//!
//! Two families of layouts are recognized, each with its own cascade:
//! - [`fat`]: boot sectors carrying a BIOS Parameter Block, and the BPB-less FAT floppies
//! - [`sysv`]: XENIX, System V, Coherent and 7th Edition superblocks
//!
//! [`describe_any`] and [`identify_any`] try the FAT family first and fall back to System V.

pub mod classification;
pub mod fat;
pub mod fs_error;
pub mod layout;
pub mod metadata;
pub mod predicates;
pub mod sysv;

use log::debug;
use serde::Serialize;

use self::fat::FatDetector;
use self::fat::bpb::NormalizedVolumeDescriptor;
use self::fs_error::FsError;
use self::layout::LayoutDescriptor;
use self::metadata::{Description, FileSystemInfo};
use self::sysv::SysvDetector;
use self::sysv::superblock::SuperblockDescriptor;
use crate::device::{SectorGeometry, SectorSource};
use crate::traits::Detector;

/// A description produced by whichever family recognized the partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "family", content = "description")]
pub enum AnyDescription {
    Fat(Description<NormalizedVolumeDescriptor>),
    SysV(Description<SuperblockDescriptor>),
}

impl AnyDescription {
    pub fn layout(&self) -> LayoutDescriptor {
        match self {
            AnyDescription::Fat(d) => d.layout(),
            AnyDescription::SysV(d) => d.layout(),
        }
    }

    pub fn report(&self) -> &str {
        match self {
            AnyDescription::Fat(d) => d.report(),
            AnyDescription::SysV(d) => d.report(),
        }
    }

    pub fn info(&self) -> &FileSystemInfo {
        match self {
            AnyDescription::Fat(d) => d.info(),
            AnyDescription::SysV(d) => d.info(),
        }
    }
}

/// Whether `err` only means "not this family".
fn falls_through(err: &FsError) -> bool {
    matches!(err, FsError::NotRecognized | FsError::GeometryTooSmall { .. })
}

/// Whether any known layout matches the partition.
pub fn identify_any(source: &dyn SectorSource, geometry: &SectorGeometry) -> Result<bool, FsError> {
    Ok(FatDetector.identify(source, geometry)? || SysvDetector.identify(source, geometry)?)
}

/// Describes the partition with the first family that recognizes it.
///
/// # Errors
/// - `FsError::NotRecognized` if neither family recognizes the partition
/// - any other error raised while reading or decoding
pub fn describe_any(
    source: &dyn SectorSource,
    geometry: &SectorGeometry,
) -> Result<AnyDescription, FsError> {
    match FatDetector.describe(source, geometry) {
        Ok(d) => return Ok(AnyDescription::Fat(d)),
        Err(err) if falls_through(&err) => debug!("{}: {err}", FatDetector.name()),
        Err(err) => return Err(err),
    }
    match SysvDetector.describe(source, geometry) {
        Ok(d) => Ok(AnyDescription::SysV(d)),
        Err(err) if falls_through(&err) => {
            debug!("{}: {err}", SysvDetector.name());
            Err(FsError::NotRecognized)
        }
        Err(err) => Err(err),
    }
}
