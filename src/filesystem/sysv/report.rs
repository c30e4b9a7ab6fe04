//! Prose report of a decoded System V family superblock.

use std::fmt;

use super::superblock::SuperblockDescriptor;

impl fmt::Display for SuperblockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}, {} byte order)", self.fs_type(), self.layout(), self.endian())?;
        writeln!(f, "Superblock offset: {} bytes", self.offset())?;
        writeln!(f, "Block size: {}", self.block_size())?;
        writeln!(f, "Blocks: {}", self.total_blocks())?;
        writeln!(f, "Free blocks: {}", self.free_blocks())?;
        writeln!(f, "Inode blocks: {}", self.inode_blocks())?;
        writeln!(f, "Free inodes: {}", self.free_inodes())?;
        writeln!(
            f,
            "Cached free blocks / inodes: {} / {}",
            self.cached_free_blocks(),
            self.cached_free_inodes()
        )?;
        if self.cylinder_blocks() != 0 || self.gap_blocks() != 0 {
            writeln!(
                f,
                "Interleave: {} blocks per cylinder, gap {}",
                self.cylinder_blocks(),
                self.gap_blocks()
            )?;
        }
        if !self.volume_name().is_empty() {
            writeln!(f, "Volume name: {:?}", self.volume_name())?;
        }
        if !self.pack_name().is_empty() {
            writeln!(f, "Pack name: {:?}", self.pack_name())?;
        }
        match self.last_update() {
            Some(time) => writeln!(f, "Last update: {time}")?,
            None => writeln!(f, "Last update: never")?,
        }
        writeln!(f, "Read only: {}", if self.read_only() { "yes" } else { "no" })?;
        writeln!(f, "Modified flag: {}", if self.modified() { "set" } else { "clear" })?;
        match self.clean() {
            Some(true) => writeln!(f, "State: clean")?,
            Some(false) => writeln!(f, "State: dirty")?,
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::device::{MediaKind, SectorGeometry};
    use crate::filesystem::classification::Classification;
    use crate::filesystem::layout::LayoutDescriptor;
    use crate::filesystem::sysv::superblock;
    use crate::utils::Endian;

    #[test]
    fn report_names_the_release() {
        let mut raw = vec![0u8; 512];
        raw[2..6].copy_from_slice(&0x180u32.to_be_bytes());
        raw[0x1B0..0x1B4].copy_from_slice(b"usr\0");
        raw[0x1FC..0x200].copy_from_slice(&1u32.to_be_bytes());

        let geometry = SectorGeometry::new(512, 0x200, MediaKind::Other, 0, 0x1FF).unwrap();
        let classification = Classification::new(LayoutDescriptor::SysVR2, Endian::Big, raw);
        let report = superblock::decode(&classification, &geometry)
            .unwrap()
            .to_string();

        assert!(report.starts_with("SVR2 fs"));
        assert!(report.contains("Blocks: 384"));
        assert!(report.contains("Volume name: \"usr\""));
        assert!(report.contains("Last update: never"));
        assert!(report.contains("State: dirty"));
    }
}
