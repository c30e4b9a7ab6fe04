//! Prose report of a decoded FAT volume.

use std::fmt;

use super::bpb::{NormalizedVolumeDescriptor, VariantDetail};
use crate::filesystem::layout::LayoutDescriptor;

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl fmt::Display for NormalizedVolumeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} file system ({})", self.subtype(), self.layout())?;

        if !self.oem_name().is_empty() {
            let printable = if self.oem_name_printable() { "" } else { " (not printable)" };
            writeln!(f, "OEM name: {:?}{printable}", self.oem_name())?;
        }
        writeln!(f, "Bytes per sector: {}", self.bytes_per_sector())?;
        writeln!(f, "Sectors per cluster: {}", self.sectors_per_cluster())?;
        writeln!(f, "Cluster size: {} bytes", self.cluster_size_bytes())?;
        writeln!(f, "Reserved sectors: {}", self.reserved_sectors())?;
        writeln!(f, "Number of FATs: {}", self.fat_count())?;
        if self.fat32().is_none() {
            writeln!(f, "Root directory entries: {}", self.root_entries())?;
        }
        writeln!(f, "Sectors: {}", self.sector_count())?;
        writeln!(f, "Clusters: {}", self.total_clusters())?;
        writeln!(f, "Media descriptor: 0x{:02X}", self.media_descriptor())?;
        writeln!(f, "Sectors per FAT: {}", self.sectors_per_fat())?;
        if self.sectors_per_track() != 0 || self.head_count() != 0 {
            writeln!(f, "Sectors per track: {}", self.sectors_per_track())?;
            writeln!(f, "Heads: {}", self.head_count())?;
        }
        if self.hidden_sectors() != 0 {
            writeln!(f, "Hidden sectors: {}", self.hidden_sectors())?;
        }

        match self.layout() {
            LayoutDescriptor::ShortEbpb
            | LayoutDescriptor::Ebpb
            | LayoutDescriptor::ShortFat32
            | LayoutDescriptor::Fat32 => {
                writeln!(f, "Drive number: 0x{:02X}", self.drive_number())?;
                writeln!(f, "Extended signature: 0x{:02X}", self.signature_byte())?;
                writeln!(f, "Volume dirty: {}", yes_no(self.dirty()))?;
                writeln!(f, "Surface scan requested: {}", yes_no(self.surface_scan()))?;
            }
            _ => {}
        }
        if let Some(serial) = self.serial_string() {
            writeln!(f, "Serial number: {serial}")?;
        }
        if let Some(label) = self.volume_label() {
            writeln!(f, "BPB volume label: {label:?}")?;
        }
        if let Some(tag) = self.fs_type_tag() {
            writeln!(f, "File system type: {tag:?}")?;
        }

        if let Some(fat32) = self.fat32() {
            writeln!(f, "Root directory cluster: {}", fat32.root_cluster())?;
            writeln!(f, "FSINFO sector: {}", fat32.fs_info_sector())?;
            writeln!(f, "Backup boot sector: {}", fat32.backup_sector())?;
            writeln!(f, "Mirror flags: 0x{:04X}", fat32.mirror_flags())?;
            writeln!(f, "Version: {}.{}", fat32.version() >> 8, fat32.version() & 0xFF)?;
        }
        match self.free_clusters() {
            Some(free) => writeln!(f, "Free clusters: {free}")?,
            None if self.fs_info().is_some() => writeln!(f, "Free clusters: unknown")?,
            None => {}
        }

        match self.detail() {
            Some(VariantDetail::Atari {
                exec_flag,
                load_mode,
                boot_file,
                checksum,
            }) => {
                writeln!(f, "Executable flag: 0x{exec_flag:04X}")?;
                writeln!(f, "Load mode: 0x{load_mode:04X}")?;
                writeln!(f, "Boot file: {boot_file:?}")?;
                writeln!(f, "Boot checksum: 0x{checksum:04X}")?;
            }
            Some(VariantDetail::Apricot {
                version,
                operating_system,
                write_protected,
                copy_protected,
                boot_type,
                partition_count,
                winchester,
                sector_size,
                sectors_per_track,
                cylinders,
                heads,
            }) => {
                writeln!(f, "Apricot label version: {version:?}")?;
                writeln!(f, "Operating system: {operating_system}")?;
                writeln!(f, "Write protected: {}", yes_no(*write_protected))?;
                writeln!(f, "Copy protected: {}", yes_no(*copy_protected))?;
                writeln!(f, "Boot type: {boot_type}")?;
                writeln!(f, "Partitions: {partition_count}")?;
                writeln!(f, "Winchester: {}", yes_no(*winchester))?;
                writeln!(f, "Physical sector size: {sector_size}")?;
                writeln!(
                    f,
                    "Physical geometry: {cylinders} cylinders, {heads} heads, {sectors_per_track} sectors per track"
                )?;
            }
            Some(VariantDetail::Fixed { description }) => {
                writeln!(f, "Geometry: {description} (no BPB)")?;
            }
            None => {}
        }

        if let Some(scan) = self.root_directory() {
            writeln!(f, "Root directory label: {:?}", scan.label())?;
            if let Some(created) = scan.created() {
                writeln!(f, "Volume created: {created}")?;
            }
            if let Some(modified) = scan.modified() {
                writeln!(f, "Volume modified: {modified}")?;
            }
            if let Some(accessed) = scan.accessed() {
                writeln!(f, "Volume accessed: {}", accessed.date())?;
            }
        }

        writeln!(f, "Bootable: {}", yes_no(self.bootable()))?;
        if let Some(digest) = self.boot_digest() {
            writeln!(f, "Boot code SHA-256: {digest}")?;
        }

        Ok(())
    }
}
