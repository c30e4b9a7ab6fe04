//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use volume_forensics::device::{MediaKind, MemorySource, SectorGeometry};

pub const SECTOR: usize = 512;

/// A 512-byte boot sector under construction.
#[derive(Clone)]
pub struct Boot(pub Vec<u8>);

impl Boot {
    /// Blank sector closed by the 0xAA55 signature.
    pub fn blank() -> Self {
        let mut buf = vec![0u8; SECTOR];
        buf[0x1FE] = 0x55;
        buf[0x1FF] = 0xAA;
        Boot(buf)
    }

    /// x86 short jump and an OEM name.
    pub fn dos(oem: &[u8; 8]) -> Self {
        Self::blank().bytes(0, &[0xEB, 0x3C, 0x90]).bytes(3, oem)
    }

    pub fn u8(mut self, offset: usize, value: u8) -> Self {
        self.0[offset] = value;
        self
    }

    pub fn u16(self, offset: usize, value: u16) -> Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn u32(self, offset: usize, value: u32) -> Self {
        self.bytes(offset, &value.to_le_bytes())
    }

    pub fn bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.0[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// DOS 2.0 BPB fields at 0x0B.
    pub fn bpb(
        self,
        bps: u16,
        spc: u8,
        reserved: u16,
        fats: u8,
        root: u16,
        sectors: u16,
        media: u8,
        spfat: u16,
    ) -> Self {
        self.u16(0x0B, bps)
            .u8(0x0D, spc)
            .u16(0x0E, reserved)
            .u8(0x10, fats)
            .u16(0x11, root)
            .u16(0x13, sectors)
            .u8(0x15, media)
            .u16(0x16, spfat)
    }

    /// 360 KiB floppy BPB: 720 sectors, 2 sectors per cluster, 112 root entries.
    pub fn floppy_360k(oem: &[u8; 8]) -> Self {
        Self::dos(oem)
            .bpb(512, 2, 1, 2, 112, 720, 0xFD, 2)
            .u16(0x18, 9)
            .u16(0x1A, 2)
    }

    /// DOS 4.0 extended BPB with signature 0x29.
    pub fn ebpb(self, serial: u32, label: &[u8; 11], fs_type: &[u8; 8]) -> Self {
        self.u8(0x24, 0x80)
            .u8(0x26, 0x29)
            .u32(0x27, serial)
            .bytes(0x2B, label)
            .bytes(0x36, fs_type)
    }

    /// Sets the last word so the big-endian word sum is the Atari boot checksum.
    pub fn with_atari_checksum(mut self) -> Self {
        let sum = self.0[..0x1FE]
            .chunks_exact(2)
            .fold(0u16, |acc, w| acc.wrapping_add(u16::from_be_bytes([w[0], w[1]])));
        let last = 0x1234u16.wrapping_sub(sum);
        self.0[0x1FE..0x200].copy_from_slice(&last.to_be_bytes());
        self
    }
}

/// A zeroed image of `sectors` sectors of `SECTOR` bytes.
pub fn image(sectors: usize) -> Vec<u8> {
    vec![0u8; sectors * SECTOR]
}

pub fn put(image: &mut [u8], offset: usize, bytes: &[u8]) {
    image[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Image of `sectors` sectors starting with `boot`.
pub fn image_with(sectors: usize, boot: &Boot) -> Vec<u8> {
    let mut image = image(sectors);
    put(&mut image, 0, &boot.0);
    image
}

pub const fn dos_date(year: u16, month: u16, day: u16) -> u16 {
    ((year - 1980) << 9) | (month << 5) | day
}

pub const fn dos_time(hour: u16, minute: u16, second: u16) -> u16 {
    (hour << 11) | (minute << 5) | (second / 2)
}

/// Root directory entry carrying a volume label.
pub fn label_entry(name: &[u8; 11], date: u16, time: u16) -> [u8; 32] {
    let mut entry = [0u8; 32];
    entry[..11].copy_from_slice(name);
    entry[11] = 0x08;
    entry[0x0E..0x10].copy_from_slice(&time.to_le_bytes());
    entry[0x10..0x12].copy_from_slice(&date.to_le_bytes());
    entry[0x12..0x14].copy_from_slice(&date.to_le_bytes());
    entry[0x16..0x18].copy_from_slice(&time.to_le_bytes());
    entry[0x18..0x1A].copy_from_slice(&date.to_le_bytes());
    entry
}

pub fn memory(image: Vec<u8>) -> MemorySource {
    MemorySource::new(image, SECTOR as u32, MediaKind::Other).unwrap()
}

pub fn whole(source: &MemorySource) -> SectorGeometry {
    SectorGeometry::whole(source).unwrap()
}

/// The "MSDOS5.0" 1.44 MB floppy: 2880 sectors, 4 sectors per cluster, two 9-sector FATs,
/// 512 root entries at sector 19.
pub fn msdos5_floppy() -> Vec<u8> {
    let boot = Boot::dos(b"MSDOS5.0")
        .bpb(512, 4, 1, 2, 512, 2880, 0xF0, 9)
        .u16(0x18, 18)
        .u16(0x1A, 2)
        .ebpb(0x1234_ABCD, b"NO NAME    ", b"FAT12   ");
    let mut image = image_with(2880, &boot);
    put(
        &mut image,
        19 * SECTOR,
        &label_entry(b"MYDISK     ", dos_date(1995, 8, 24), dos_time(11, 30, 42)),
    );
    image
}

/// FAT32 volume of 2048 sectors: 32 reserved, two 16-sector FATs, root at cluster 2.
pub fn fat32_volume(signature: u8) -> Vec<u8> {
    let boot = Boot::dos(b"MSWIN4.1")
        .bpb(512, 1, 32, 2, 0, 0, 0xF8, 0)
        .u16(0x18, 63)
        .u16(0x1A, 255)
        .u32(0x20, 2048)
        .u32(0x24, 16)
        .u32(0x2C, 2)
        .u16(0x30, 1)
        .u16(0x32, 6)
        .u8(0x40, 0x80)
        .u8(0x42, signature)
        .u32(0x43, 0xCAFE_F00D)
        .bytes(0x47, b"BIGVOLUME  ")
        .bytes(0x52, b"FAT32   ");
    let mut image = image_with(2048, &boot);

    let fsinfo = SECTOR;
    put(&mut image, fsinfo, &0x4161_5252u32.to_le_bytes());
    put(&mut image, fsinfo + 484, &0x6141_7272u32.to_le_bytes());
    put(&mut image, fsinfo + 488, &1500u32.to_le_bytes());
    put(&mut image, fsinfo + 492, &3u32.to_le_bytes());
    put(&mut image, fsinfo + 508, &0xAA55_0000u32.to_le_bytes());

    put(
        &mut image,
        64 * SECTOR,
        &label_entry(b"ROOTLABEL  ", dos_date(2001, 3, 9), dos_time(8, 0, 0)),
    );
    image
}

/// Writes a little- or big-endian u32.
pub fn put_u32(image: &mut [u8], offset: usize, value: u32, big: bool) {
    let bytes = if big { value.to_be_bytes() } else { value.to_le_bytes() };
    put(image, offset, &bytes);
}

pub fn put_u16(image: &mut [u8], offset: usize, value: u16, big: bool) {
    let bytes = if big { value.to_be_bytes() } else { value.to_le_bytes() };
    put(image, offset, &bytes);
}
