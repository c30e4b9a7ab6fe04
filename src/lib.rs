//!
//! volume_forensics: A library and CLI for recognizing legacy on-disk volume layouts.
//!
//! This crate provides tools for:
//! - Reading disk images as fixed-size sectors and parsing Master Boot Records (MBR)
//! - Classifying FAT boot sectors, from DOS 2.0 to FAT32 and the Atari, MSX, Apricot
//!   and DEC Rainbow variants
//! - Classifying XENIX, System V, Coherent and 7th Edition superblocks
//! - Handling user commands and printing volume reports and layouts
//!
//! The library is designed for extensibility and can be used both as a CLI tool and as a Rust library.
//!
//! # Re-exports
//! - [`FATVol`]: FAT volume abstraction
//! - [`SysvVol`]: System V family volume abstraction
//! - [`Disk`]: Disk image with its optional partition table

pub mod commands;
pub mod device;
pub mod filesystem;
pub mod partition;
pub mod traits;
pub mod utils;

/// FAT volume abstraction (see [`filesystem::fat::FATVol`]).
pub use crate::filesystem::fat::FATVol;
/// System V family volume abstraction (see [`filesystem::sysv::SysvVol`]).
pub use crate::filesystem::sysv::SysvVol;
/// Disk image with its optional partition table (see [`partition::disk::Disk`]).
pub use crate::partition::disk::Disk;
pub use crate::partition::disk_error::DiskError;
pub use crate::filesystem::{AnyDescription, describe_any, identify_any};
