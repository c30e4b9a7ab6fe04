//! This is the main entry point for the volume inspection tool.
//!
//! The program provides an interactive command-line interface for recognizing the
//! on-disk layout of legacy volumes. Users open a disk image, pick a partition, and ask
//! for its report, region table or metadata.

use log::{LevelFilter, error, info, warn};
use std::{
    io::{self, Write},
    path::Path,
};
use volume_forensics::commands::Command;
use volume_forensics::device::{MediaKind, SectorGeometry};
use volume_forensics::filesystem::fat::FATVol;
use volume_forensics::filesystem::fat::bpb::FieldDump;
use volume_forensics::filesystem::fat::classifier;
use volume_forensics::filesystem::fs_error::FsError;
use volume_forensics::filesystem::sysv::SysvVol;
use volume_forensics::filesystem::{describe_any, identify_any};
use volume_forensics::traits::LayoutDisplay;
use volume_forensics::{Disk, DiskError};

/// Represents the runtime state of the program.
///
/// This struct keeps track of the currently opened disk image and the settings used to
/// open and inspect it.
struct RunState {
    /// The currently opened disk image.
    disk: Option<Disk>,
    /// Partition in inspection mode, the whole image when unset
    part_nb: Option<u8>,
    /// The size of a sector
    sector_size: u32,
    /// Media kind of the next image
    media: MediaKind,
    /// Log verbosity, 0 to 4
    verbosity: usize,
}

impl RunState {
    /// Geometry of the volume under inspection.
    fn geometry(&self) -> Option<(&Disk, SectorGeometry)> {
        let Some(disk) = &self.disk else {
            warn!("Open disk image first");
            return None;
        };
        match disk.geometry(self.part_nb) {
            Ok(geometry) => Some((disk, geometry)),
            Err(err) => {
                error!("{err}");
                None
            }
        }
    }
}

fn level(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    stderrlog::new()
        .module(module_path!())
        .module("volume_forensics")
        .verbosity(4usize)
        .init()
        .unwrap();

    let mut run_state = RunState {
        disk: None,
        part_nb: None,
        sector_size: 512,
        media: MediaKind::Other,
        verbosity: 1,
    };
    log::set_max_level(level(run_state.verbosity));

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!("Failed to read command: {err}");
                break;
            }
        }
        let cmd = Command::from_string(&s);

        match cmd {
            Command::Open(path) => {
                match Disk::from_file(Path::new(&path), run_state.sector_size, run_state.media) {
                    Ok(disk) => {
                        run_state.disk = Some(disk);
                        run_state.part_nb = None;
                    }
                    Err(err) => {
                        error!("{err}");
                    }
                }
            }
            Command::Quit => break,
            Command::Print => match &run_state.disk {
                Some(disk) => {
                    if let Err(e) = disk.print_layout(3) {
                        error!("Print layout error: {e}");
                    }
                }
                None => error!("Open disk image first"),
            },
            Command::Partition(part_nb) => {
                if let Some(disk) = &run_state.disk {
                    match disk.geometry(Some(part_nb)) {
                        Ok(geometry) => {
                            info!(
                                "Partition #{part_nb}: sectors {} to {}",
                                geometry.partition_start(),
                                geometry.partition_end()
                            );
                            run_state.part_nb = Some(part_nb);
                        }
                        Err(DiskError::NoSuchPartition { available, .. }) => error!(
                            "Invalid partition number. There are {available} valid partitions on disk."
                        ),
                        Err(err) => error!("{err}"),
                    }
                } else {
                    warn!("Open disk image first");
                }
            }
            Command::Identify => {
                if let Some((disk, geometry)) = run_state.geometry() {
                    match identify_any(disk.source(), &geometry) {
                        Ok(true) => println!("Known layout"),
                        Ok(false) => println!("No known layout"),
                        Err(err) => error!("{err}"),
                    }
                }
            }
            Command::Describe => {
                if let Some((disk, geometry)) = run_state.geometry() {
                    match describe_any(disk.source(), &geometry) {
                        Ok(description) => print!("{}", description.report()),
                        Err(err) => error!("{err}"),
                    }
                }
            }
            Command::Layout => {
                if let Some((disk, geometry)) = run_state.geometry() {
                    print_volume_layout(disk, &geometry);
                }
            }
            Command::Meta => {
                if let Some((disk, geometry)) = run_state.geometry() {
                    match describe_any(disk.source(), &geometry) {
                        Ok(description) => match serde_json::to_string_pretty(description.info()) {
                            Ok(json) => println!("{json}"),
                            Err(err) => error!("JSON encoding failed: {err}"),
                        },
                        Err(err) => error!("{err}"),
                    }
                }
            }
            Command::Fields => {
                if let Some((disk, geometry)) = run_state.geometry() {
                    match classifier::classify(disk.source(), &geometry) {
                        Ok(classification) => {
                            print!("{}", FieldDump::new(&classification, &geometry))
                        }
                        Err(err) => error!("{err}"),
                    }
                }
            }
            Command::SectorSize(size) => {
                run_state.sector_size = size;
                info!("Images will be opened with {size} byte sectors");
            }
            Command::Media(media) => {
                run_state.media = media;
                info!("Images will be opened as {media} media");
            }
            Command::Verbose(verbosity) => {
                run_state.verbosity = verbosity;
                log::set_max_level(level(verbosity));
            }
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
        }
    }
}

/// Prints the region table of whichever family recognizes the volume.
fn print_volume_layout(disk: &Disk, geometry: &SectorGeometry) {
    let layout = match FATVol::open(disk.source(), geometry) {
        Ok(vol) => vol.display_layout(3),
        Err(FsError::NotRecognized | FsError::GeometryTooSmall { .. }) => {
            match SysvVol::open(disk.source(), geometry) {
                Ok(vol) => vol.display_layout(3),
                Err(err) => {
                    error!("{err}");
                    return;
                }
            }
        }
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    match layout {
        Ok(out) => print!("{out}"),
        Err(e) => error!("Print layout error: {e}"),
    }
}
