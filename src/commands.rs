//! This module defines the `Command` enum and its associated methods for parsing
//! and handling user commands in the volume inspection tool.
//!
//! The `Command` enum represents various commands that the user can input,
//! such as quitting the program, opening a file, describing a volume, or handling
//! invalid or unknown commands.

use crate::device::MediaKind;

/// Represents a user command in the volume inspection tool.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Command to quit the program.
    Quit,
    /// Command to open a disk image, encapsulating the file path as a `String`.
    Open(String),
    /// Command to print the partition layout of the disk.
    Print,
    /// Select the partition to analyse.
    Partition(u8),
    /// Report whether a known layout matches the selected volume.
    Identify,
    /// Print the prose report of the selected volume.
    Describe,
    /// Print the region table of the selected volume.
    Layout,
    /// Print the metadata projection of the selected volume as JSON.
    Meta,
    /// Dump the raw boot sector fields of the selected FAT volume.
    Fields,
    /// Sector size used to open the next image.
    SectorSize(u32),
    /// Media kind used to open the next image.
    Media(MediaKind),
    /// Log verbosity: 0 for errors only, up to 4 for trace.
    Verbose(usize),
    /// Command for an unknown input, encapsulating the raw input as a `String`.
    Unknown(String),
    /// Command for invalid input, encapsulating an error message as a `String`.
    Invalid(String),
    /// Command for an empty input.
    Empty,
}

/// Parses the single numeric argument of `cmd`.
fn number_arg<T: std::str::FromStr>(
    cmd: &str,
    arg: Option<&str>,
    build: impl FnOnce(T) -> Command,
) -> Command {
    match arg {
        Some(arg) => match arg.parse::<T>() {
            Ok(nb) => build(nb),
            Err(_) => Command::Invalid(format!(
                "Arg parsing error: '{cmd}' expects an unsigned integer."
            )),
        },
        None => Command::Invalid(format!("Missing arg: '{cmd}' expects an unsigned integer.")),
    }
}

impl Command {
    /// Parses a string into a `Command` instance.
    ///
    /// # Parameters
    /// - `s`: A string slice representing the user input.
    ///
    /// # Returns
    /// - `Command::Open` with the file path if the input starts with "open" followed by an argument.
    /// - `Command::Partition`, `Command::SectorSize` and `Command::Verbose` with their numeric argument.
    /// - `Command::Media` if the input is "media optical" or "media other".
    /// - `Command::Unknown` if the input does not match any known command.
    /// - `Command::Invalid` if an argument is missing or malformed.
    /// - `Command::Empty` if the input is empty or contains only whitespace.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("quit") => Command::Quit,
            Some("open") => match parts.next() {
                Some(arg) => Command::Open(arg.to_string()),
                None => Command::Invalid(String::from(
                    "Missing arg: 'open' expects the path to a disk image.",
                )),
            },
            Some("print") => Command::Print,
            Some("part") => number_arg("part", parts.next(), Command::Partition),
            Some("identify") => Command::Identify,
            Some("describe") => Command::Describe,
            Some("layout") => Command::Layout,
            Some("meta") => Command::Meta,
            Some("fields") => Command::Fields,
            Some("sector") => number_arg("sector", parts.next(), |size: u32| match size {
                0 => Command::Invalid(String::from("Sector size must be greater than 0.")),
                size => Command::SectorSize(size),
            }),
            Some("media") => match parts.next() {
                Some("optical") => Command::Media(MediaKind::OpticalDisc),
                Some("other") => Command::Media(MediaKind::Other),
                _ => Command::Invalid(String::from(
                    "Arg parsing error: 'media' expects 'optical' or 'other'.",
                )),
            },
            Some("verbose") => number_arg("verbose", parts.next(), Command::Verbose),
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(Command::from_string("open disk.img\n"), Command::Open("disk.img".into()));
        assert_eq!(Command::from_string("part 2"), Command::Partition(2));
        assert_eq!(Command::from_string("sector 2048"), Command::SectorSize(2048));
        assert_eq!(
            Command::from_string("media optical"),
            Command::Media(MediaKind::OpticalDisc)
        );
        assert_eq!(Command::from_string("  describe  "), Command::Describe);
        assert_eq!(Command::from_string(""), Command::Empty);
    }

    #[test]
    fn reports_bad_arguments() {
        assert!(matches!(Command::from_string("part x"), Command::Invalid(_)));
        assert!(matches!(Command::from_string("sector 0"), Command::Invalid(_)));
        assert!(matches!(Command::from_string("media floppy"), Command::Invalid(_)));
        assert!(matches!(Command::from_string("open"), Command::Invalid(_)));
        assert_eq!(Command::from_string("tree"), Command::Unknown("tree".into()));
    }
}
