mod common;

use common::*;
use volume_forensics::device::MemorySource;
use volume_forensics::filesystem::layout::LayoutDescriptor;
use volume_forensics::filesystem::metadata::Description;
use volume_forensics::filesystem::sysv::classifier::{SYSV_CLEAN_STATE, SYSV_MAGIC, XENIX_MAGIC};
use volume_forensics::filesystem::sysv::superblock::SuperblockDescriptor;
use volume_forensics::filesystem::sysv::{SysvDetector, SysvVol};
use volume_forensics::traits::{Detector, LayoutDisplay};
use volume_forensics::utils::Endian;
use volume_forensics::{AnyDescription, describe_any};

/// XENIX superblock in the second kilobyte of a 400 sector disk.
fn xenix_disk() -> MemorySource {
    let mut image = image(400);
    let sb = 1024;
    put_u16(&mut image, sb, 12, false);
    put_u32(&mut image, sb + 0x002, 200, false);
    put_u32(&mut image, sb + 0x266, 0x2000_0000, false);
    put_u32(&mut image, sb + 0x26A, 150, false);
    put(&mut image, sb + 0x278, b"xenix\0");
    put(&mut image, sb + 0x27E, b"pack0\0");
    image[sb + 0x284] = 0x46;
    put_u32(&mut image, sb + 0x3F8, XENIX_MAGIC, false);
    put_u32(&mut image, sb + 0x3FC, 2, false);
    memory(image)
}

/// System V superblock at byte 512.
fn sysv_disk(r4: bool, big: bool) -> MemorySource {
    let mut image = image(400);
    let sb = 512;
    let time = 0x3000_0000u32;
    put_u16(&mut image, sb, 8, big);
    if r4 {
        put_u32(&mut image, sb + 0x004, 100, big);
        put_u32(&mut image, sb + 0x1A4, time, big);
        put(&mut image, sb + 0x1B8, b"root\0\0");
    } else {
        put_u32(&mut image, sb + 0x002, 300, big);
        put_u16(&mut image, sb + 0x006, 5, big);
        put_u32(&mut image, sb + 0x19E, time, big);
        put(&mut image, sb + 0x1B0, b"usr\0\0\0");
    }
    put_u32(&mut image, sb + 0x1F4, SYSV_CLEAN_STATE.wrapping_sub(time), big);
    put_u32(&mut image, sb + 0x1F8, SYSV_MAGIC, big);
    put_u32(&mut image, sb + 0x1FC, if r4 { 2 } else { 1 }, big);
    memory(image)
}

fn describe(source: &MemorySource) -> Description<SuperblockDescriptor> {
    SysvDetector.describe(source, &whole(source)).unwrap()
}

#[test]
fn xenix_superblock() {
    let source = xenix_disk();
    let description = describe(&source);
    let sb = description.metadata();

    assert_eq!(description.layout(), LayoutDescriptor::XenixV1);
    assert_eq!(sb.offset(), 1024);
    assert_eq!(sb.block_size(), 1024);
    assert_eq!(sb.total_blocks(), 200);
    assert_eq!(sb.free_blocks(), 150);
    assert_eq!(sb.clean(), Some(true));

    let info = description.info();
    assert_eq!(info.fs_type(), "XENIX fs");
    assert_eq!(info.volume_name(), "xenix");
    assert_eq!(info.system_identifier(), "pack0");
    assert_eq!(info.free_clusters(), Some(150));
    assert!(!info.dirty());
    assert!(info.modification_date().is_some());
}

#[test]
fn system_v_releases_and_byte_orders() {
    let r4 = describe(&sysv_disk(true, false));
    assert_eq!(r4.layout(), LayoutDescriptor::SysVR4);
    assert_eq!(r4.metadata().endian(), Endian::Little);
    assert_eq!(r4.metadata().total_blocks(), 100);
    assert_eq!(r4.metadata().offset(), 512);
    assert_eq!(r4.metadata().clean(), Some(true));
    assert_eq!(r4.info().volume_name(), "root");

    let r2 = describe(&sysv_disk(false, true));
    assert_eq!(r2.layout(), LayoutDescriptor::SysVR2);
    assert_eq!(r2.metadata().endian(), Endian::Big);
    assert_eq!(r2.metadata().block_size(), 512);
    assert_eq!(r2.metadata().total_blocks(), 300);
    assert_eq!(r2.metadata().clean(), Some(true));
    assert_eq!(r2.info().volume_name(), "usr");
}

#[test]
fn coherent_superblock_in_block_one() {
    let mut image = image(400);
    let sb = 512;
    put(&mut image, sb + 2, &[0x00, 0x00, 0x90, 0x01]);
    put(&mut image, sb + 0x1E4, b"noname");
    put(&mut image, sb + 0x1EA, b"nopack");

    let description = describe(&memory(image));
    assert_eq!(description.layout(), LayoutDescriptor::Coherent);
    assert_eq!(description.metadata().endian(), Endian::Pdp);
    assert_eq!(description.metadata().total_blocks(), 400);
    assert_eq!(description.metadata().offset(), 512);
    assert_eq!(description.info().fs_type(), "Coherent fs");
}

#[test]
fn seventh_edition_superblock() {
    let mut image = image(400);
    let sb = 512;
    put_u16(&mut image, sb, 24, false);
    put_u32(&mut image, sb + 2, 400, false);
    put_u16(&mut image, sb + 6, 10, false);

    let source = memory(image);
    let vol = SysvVol::open(&source, &whole(&source)).unwrap();
    assert_eq!(vol.descriptor().layout(), LayoutDescriptor::UnixV7);
    assert_eq!(vol.descriptor().block_size(), 512);
    assert_eq!(vol.descriptor().clean(), None);
    assert!(!vol.info().dirty());

    let table = vol.display_layout(0).unwrap();
    assert!(table.contains("Inodes"));
    assert!(table.contains("UNIX 7th Edition fs"));
}

#[test]
fn any_family_falls_back_to_system_v() {
    let source = sysv_disk(true, false);
    let description = describe_any(&source, &whole(&source)).unwrap();

    assert!(matches!(description, AnyDescription::SysV(_)));
    assert_eq!(description.layout(), LayoutDescriptor::SysVR4);
    assert!(description.report().starts_with("SVR4 fs"));
    assert_eq!(description.info().cluster_size(), 1024);
}

#[test]
fn blank_disk_is_not_a_superblock() {
    let source = memory(image(400));
    assert!(!SysvDetector.identify(&source, &whole(&source)).unwrap());
}
