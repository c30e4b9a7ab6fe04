//! Normalized metadata projection shared by every detector.

use chrono::NaiveDateTime;
use getset::{CopyGetters, Getters};
use serde::Serialize;

use super::layout::LayoutDescriptor;

/// File system summary consumed by the rest of an image-analysis tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct FileSystemInfo {
    #[getset(get = "pub")]
    pub(crate) fs_type: String,
    #[getset(get_copy = "pub")]
    pub(crate) cluster_size: u64,
    #[getset(get_copy = "pub")]
    pub(crate) clusters: u64,
    #[getset(get_copy = "pub")]
    pub(crate) free_clusters: Option<u64>,
    #[getset(get = "pub")]
    pub(crate) volume_name: String,
    #[getset(get = "pub")]
    pub(crate) volume_serial: Option<String>,
    #[getset(get_copy = "pub")]
    pub(crate) creation_date: Option<NaiveDateTime>,
    #[getset(get_copy = "pub")]
    pub(crate) modification_date: Option<NaiveDateTime>,
    #[getset(get = "pub")]
    pub(crate) system_identifier: String,
    #[getset(get_copy = "pub")]
    pub(crate) bootable: bool,
    #[getset(get_copy = "pub")]
    pub(crate) dirty: bool,
}

/// Everything `describe` produces for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct Description<M> {
    #[getset(get_copy = "pub")]
    layout: LayoutDescriptor,
    /// Human-readable prose report.
    #[getset(get = "pub")]
    report: String,
    /// The decoded record of the chosen layout.
    #[getset(get = "pub")]
    metadata: M,
    #[getset(get = "pub")]
    info: FileSystemInfo,
}

impl<M> Description<M> {
    pub fn new(layout: LayoutDescriptor, report: String, metadata: M, info: FileSystemInfo) -> Self {
        Self {
            layout,
            report,
            metadata,
            info,
        }
    }
}
