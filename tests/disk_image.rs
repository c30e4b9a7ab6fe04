mod common;

use common::*;
use std::io::Write;
use volume_forensics::device::{ImageFile, MediaKind, SectorGeometry, SectorSource};
use volume_forensics::filesystem::layout::LayoutDescriptor;
use volume_forensics::{AnyDescription, Disk, describe_any};

/// Disk with a FAT12 floppy in partition 1 and a System V volume in partition 2.
fn partitioned_image() -> Vec<u8> {
    let mut image = image(63 + 720 + 400);

    put(&mut image, 446 + 4, &[0x01]);
    put_u32(&mut image, 446 + 8, 63, false);
    put_u32(&mut image, 446 + 12, 720, false);
    put(&mut image, 462 + 4, &[0x63]);
    put_u32(&mut image, 462 + 8, 783, false);
    put_u32(&mut image, 462 + 12, 400, false);
    put(&mut image, 510, &[0x55, 0xAA]);

    let boot = Boot::floppy_360k(b"IBM  3.3").u32(0x1C, 63);
    put(&mut image, 63 * SECTOR, &boot.0);
    put(
        &mut image,
        (63 + 5) * SECTOR,
        &label_entry(b"PART ONE   ", dos_date(1990, 1, 2), dos_time(3, 4, 6)),
    );

    let sb = 784 * SECTOR;
    put_u16(&mut image, sb, 8, false);
    put_u32(&mut image, sb + 4, 100, false);
    put_u32(&mut image, sb + 0x1F8, 0xFD18_7E20, false);
    put_u32(&mut image, sb + 0x1FC, 2, false);
    image
}

fn write_image(image: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(image).unwrap();
    file
}

#[test]
fn partitions_are_described_independently() {
    let file = write_image(&partitioned_image());
    let disk = Disk::from_file(file.path(), 512, MediaKind::Other).unwrap();
    assert_eq!(disk.volume_count(), 2);

    let first = disk.geometry(Some(1)).unwrap();
    let fat = describe_any(disk.source(), &first).unwrap();
    assert!(matches!(fat, AnyDescription::Fat(_)));
    assert_eq!(fat.layout(), LayoutDescriptor::Dos33);
    assert_eq!(fat.info().volume_name(), "PART ONE");

    let second = disk.geometry(Some(2)).unwrap();
    let sysv = describe_any(disk.source(), &second).unwrap();
    assert_eq!(sysv.layout(), LayoutDescriptor::SysVR4);
    assert_eq!(sysv.info().clusters(), 100);
}

#[test]
fn image_file_reads_sectors() {
    let file = write_image(&msdos5_floppy());
    let source = ImageFile::open(file.path(), 512, MediaKind::Other).unwrap();
    assert_eq!(source.total_sectors(), 2880);

    let geometry = SectorGeometry::whole(&source).unwrap();
    let description = describe_any(&source, &geometry).unwrap();
    assert_eq!(description.layout(), LayoutDescriptor::Ebpb);
    assert_eq!(description.info().volume_name(), "MYDISK");
}

#[test]
fn reads_past_the_image_fail() {
    let file = write_image(&image(4));
    let source = ImageFile::open(file.path(), 512, MediaKind::Other).unwrap();
    assert!(source.read_sectors(3, 2).is_err());
}
