//! Byte-level helpers shared by every decoder.
//!
//! All multi-byte reads go through [`FieldReader`], which is bound to one byte order
//! at construction. Nothing in the crate keeps a "current endianness" anywhere else.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;
use std::fmt;

/// Byte order of the multi-byte fields of an on-disk structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Endian {
    Little,
    Big,
    /// PDP-11 order: 16-bit words are little-endian, 32-bit values store the high word first.
    Pdp,
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Endian::Little => "little-endian",
            Endian::Big => "big-endian",
            Endian::Pdp => "PDP-endian",
        };
        write!(f, "{s}")
    }
}

/// Reads fixed-width integers out of a sector buffer in one byte order.
///
/// Bytes past the end of the buffer read as zero, so a truncated buffer degrades into
/// implausible field values instead of a panic.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    endian: Endian,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8], endian: Endian) -> Self {
        Self { buf, endian }
    }

    pub fn little(buf: &'a [u8]) -> Self {
        Self::new(buf, Endian::Little)
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    fn window<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(slice) = self.buf.get(offset..offset + N) {
            out.copy_from_slice(slice);
        }
        out
    }

    pub fn u8(&self, offset: usize) -> u8 {
        self.buf.get(offset).copied().unwrap_or(0)
    }

    pub fn u16(&self, offset: usize) -> u16 {
        let raw = self.window::<2>(offset);
        match self.endian {
            Endian::Little | Endian::Pdp => LittleEndian::read_u16(&raw),
            Endian::Big => BigEndian::read_u16(&raw),
        }
    }

    /// Reads a big-endian word regardless of the reader's byte order.
    pub fn be_u16(&self, offset: usize) -> u16 {
        BigEndian::read_u16(&self.window::<2>(offset))
    }

    pub fn u32(&self, offset: usize) -> u32 {
        let raw = self.window::<4>(offset);
        match self.endian {
            Endian::Little => LittleEndian::read_u32(&raw),
            Endian::Big => BigEndian::read_u32(&raw),
            Endian::Pdp => LittleEndian::read_u32(&raw).rotate_left(16),
        }
    }

    pub fn u64(&self, offset: usize) -> u64 {
        let raw = self.window::<8>(offset);
        match self.endian {
            Endian::Little | Endian::Pdp => LittleEndian::read_u64(&raw),
            Endian::Big => BigEndian::read_u64(&raw),
        }
    }

    /// Returns `len` bytes at `offset`, or an empty slice if the range is out of the buffer.
    pub fn bytes(&self, offset: usize, len: usize) -> &'a [u8] {
        self.buf.get(offset..offset + len).unwrap_or(&[])
    }
}

/// Upper half of IBM code page 437, indexed by `byte - 0x80`.
const CP437_HIGH: &str = "ÇüéâäàåçêëèïîìÄÅÉæÆôöòûùÿÖÜ¢£¥₧ƒáíóúñÑªº¿⌐¬½¼¡«»░▒▓│┤╡╢╖╕╣║╗╝╜╛┐└┴┬├─┼╞╟╚╔╩╦╠═╬╧╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀αßΓπΣσµτΦΘΩδ∞φε∩≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{a0}";

/// Decodes an OEM (code page 437) string and trims the space/NUL padding on the right.
pub fn oem_string(bytes: &[u8]) -> String {
    let decoded: String = bytes
        .iter()
        .map(|&b| match b {
            0x00..=0x7F => char::from(b),
            _ => CP437_HIGH.chars().nth(usize::from(b - 0x80)).unwrap_or('?'),
        })
        .collect();
    decoded.trim_end_matches([' ', '\0']).to_string()
}

/// Interprets `bytes` as a NUL-terminated string, keeping any other padding.
pub fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_in_the_requested_order() {
        let buf = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(FieldReader::new(&buf, Endian::Little).u32(0), 0x0403_0201);
        assert_eq!(FieldReader::new(&buf, Endian::Big).u32(0), 0x0102_0304);
        assert_eq!(FieldReader::new(&buf, Endian::Pdp).u32(0), 0x0201_0403);
        assert_eq!(FieldReader::new(&buf, Endian::Pdp).u16(2), 0x0403);
    }

    #[test]
    fn out_of_range_reads_are_zero() {
        let buf = [0xFF; 3];
        let reader = FieldReader::little(&buf);
        assert_eq!(reader.u32(0), 0);
        assert_eq!(reader.u8(5), 0);
        assert!(reader.bytes(2, 4).is_empty());
    }

    #[test]
    fn oem_strings_are_trimmed_and_decoded() {
        assert_eq!(oem_string(b"NO NAME    "), "NO NAME");
        assert_eq!(oem_string(&[b'A', 0x81, b' ', 0]), "Aü");
        assert_eq!(c_string(b"xxxxx \0"), "xxxxx ");
    }
}
