//! Partitioned disk images.
//!
//! - [`mbr`]: Master Boot Record parsing and validation
//! - [`disk`]: an opened image and the geometry of each of its partitions

pub mod disk;
pub mod disk_error;
pub mod mbr;

pub use disk::Disk;
pub use disk_error::DiskError;
