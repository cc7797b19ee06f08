//! EBCDIC code page conversion
//!
//! The buffer stores raw EBCDIC bytes; conversion to display characters
//! happens only at the edges (keyboard input, screen snapshots, RPQ names)
//! through a [`CharsetCodec`] keyed by character-set id.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// CP037 (EBCDIC US/Canada) to Unicode, one entry per code point
const EBCDIC_CP037_TO_ASCII: [char; 256] = [
    // 0x00-0x0F: Control characters
    '\x00', '\x01', '\x02', '\x03', '\u{009C}', '\t', '\u{0086}', '\x7F',
    '\u{0097}', '\u{008D}', '\u{008E}', '\x0B', '\x0C', '\r', '\x0E', '\x0F',
    // 0x10-0x1F: Control characters
    '\x10', '\x11', '\x12', '\x13', '\u{009D}', '\u{0085}', '\x08', '\u{0087}',
    '\x18', '\x19', '\u{0092}', '\u{008F}', '\x1C', '\x1D', '\x1E', '\x1F',
    // 0x20-0x2F: Control characters and special
    '\u{0080}', '\u{0081}', '\u{0082}', '\u{0083}', '\u{0084}', '\n', '\x17', '\x1B',
    '\u{0088}', '\u{0089}', '\u{008A}', '\u{008B}', '\u{008C}', '\x05', '\x06', '\x07',
    // 0x30-0x3F: Control characters
    '\u{0090}', '\u{0091}', '\x16', '\u{0093}', '\u{0094}', '\u{0095}', '\u{0096}', '\x04',
    '\u{0098}', '\u{0099}', '\u{009A}', '\u{009B}', '\x14', '\x15', '\u{009E}', '\x1A',
    // 0x40-0x4F: Space and special characters
    ' ', '\u{00A0}', '\u{00E2}', '\u{00E4}', '\u{00E0}', '\u{00E1}', '\u{00E3}', '\u{00E5}',
    '\u{00E7}', '\u{00F1}', '\u{00A2}', '.', '<', '(', '+', '|',
    // 0x50-0x5F: Ampersand and special characters
    '&', '\u{00E9}', '\u{00EA}', '\u{00EB}', '\u{00E8}', '\u{00ED}', '\u{00EE}', '\u{00EF}',
    '\u{00EC}', '\u{00DF}', '!', '$', '*', ')', ';', '\u{00AC}',
    // 0x60-0x6F: Dash and special characters
    '-', '/', '\u{00C2}', '\u{00C4}', '\u{00C0}', '\u{00C1}', '\u{00C3}', '\u{00C5}',
    '\u{00C7}', '\u{00D1}', '\u{00A6}', ',', '%', '_', '>', '?',
    // 0x70-0x7F: Special characters and quotes
    '\u{00F8}', '\u{00C9}', '\u{00CA}', '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}',
    '\u{00CC}', '`', ':', '#', '@', '\'', '=', '"',
    // 0x80-0x8F: Special character and lowercase a-i
    '\u{00D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', '\u{00AB}', '\u{00BB}', '\u{00F0}', '\u{00FD}', '\u{00FE}', '\u{00B1}',
    // 0x90-0x9F: Degree symbol and lowercase j-r
    '\u{00B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p',
    'q', 'r', '\u{00AA}', '\u{00BA}', '\u{00E6}', '\u{00B8}', '\u{00C6}', '\u{00A4}',
    // 0xA0-0xAF: Micro sign and lowercase s-z
    '\u{00B5}', '~', 's', 't', 'u', 'v', 'w', 'x',
    'y', 'z', '\u{00A1}', '\u{00BF}', '\u{00D0}', '\u{00DD}', '\u{00DE}', '\u{00AE}',
    // 0xB0-0xBF: Caret and special characters
    '^', '\u{00A3}', '\u{00A5}', '\u{00B7}', '\u{00A9}', '\u{00A7}', '\u{00B6}', '\u{00BC}',
    '\u{00BD}', '\u{00BE}', '[', ']', '\u{00AF}', '\u{00A8}', '\u{00B4}', '\u{00D7}',
    // 0xC0-0xCF: Left brace and uppercase A-I
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', '\u{00AD}', '\u{00F4}', '\u{00F6}', '\u{00F2}', '\u{00F3}', '\u{00F5}',
    // 0xD0-0xDF: Right brace and uppercase J-R
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P',
    'Q', 'R', '\u{00B9}', '\u{00FB}', '\u{00FC}', '\u{00F9}', '\u{00FA}', '\u{00FF}',
    // 0xE0-0xEF: Backslash and uppercase S-Z
    '\\', '\u{00F7}', 'S', 'T', 'U', 'V', 'W', 'X',
    'Y', 'Z', '\u{00B2}', '\u{00D4}', '\u{00D6}', '\u{00D2}', '\u{00D3}', '\u{00D5}',
    // 0xF0-0xFF: Digits 0-9 and special characters
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', '\u{00B3}', '\u{00DB}', '\u{00DC}', '\u{00D9}', '\u{00DA}', '\u{009F}',
];

/// Unicode to CP037, built on first use from the forward table
static ASCII_TO_EBCDIC_CP037: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(256);
    for (byte, &ch) in EBCDIC_CP037_TO_ASCII.iter().enumerate() {
        map.entry(ch).or_insert(byte as u8);
    }
    map
});

/// EBCDIC space
pub const EBCDIC_SPACE: u8 = 0x40;

/// Convert an EBCDIC byte to a character
///
/// ```
/// use tn3270r::protocol_common::ebcdic::ebcdic_to_ascii;
///
/// assert_eq!(ebcdic_to_ascii(0xC1), 'A');
/// assert_eq!(ebcdic_to_ascii(0xF0), '0');
/// ```
pub fn ebcdic_to_ascii(byte: u8) -> char {
    EBCDIC_CP037_TO_ASCII[byte as usize]
}

/// Convert a character to EBCDIC; unmapped characters become an EBCDIC space
///
/// ```
/// use tn3270r::protocol_common::ebcdic::ascii_to_ebcdic;
///
/// assert_eq!(ascii_to_ebcdic('a'), 0x81);
/// assert_eq!(ascii_to_ebcdic('\u{263A}'), 0x40);
/// ```
pub fn ascii_to_ebcdic(ch: char) -> u8 {
    try_ascii_to_ebcdic(ch).unwrap_or(EBCDIC_SPACE)
}

/// Convert a character to EBCDIC, if CP037 can represent it
pub fn try_ascii_to_ebcdic(ch: char) -> Option<u8> {
    ASCII_TO_EBCDIC_CP037.get(&ch).copied()
}

pub fn ebcdic_to_ascii_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| ebcdic_to_ascii(b)).collect()
}

pub fn ascii_to_ebcdic_vec(s: &str) -> Vec<u8> {
    s.chars().map(ascii_to_ebcdic).collect()
}

/// Character-set conversion used by a session
///
/// `lcid` is the character-set id carried in cell attributes; 0x00 is the
/// base set.
pub trait CharsetCodec: Send + Sync {
    /// Display character for a raw buffer byte
    fn decode(&self, lcid: u8, byte: u8) -> char;

    /// Raw byte for a typed character, or `None` if it has no encoding
    fn encode(&self, ch: char) -> Option<u8>;

    /// Code page name, for diagnostics
    fn name(&self) -> &str;
}

/// CP037 for every character set
#[derive(Debug, Clone, Copy, Default)]
pub struct Cp037Codec;

impl CharsetCodec for Cp037Codec {
    fn decode(&self, _lcid: u8, byte: u8) -> char {
        ebcdic_to_ascii(byte)
    }

    fn encode(&self, ch: char) -> Option<u8> {
        try_ascii_to_ebcdic(ch)
    }

    fn name(&self) -> &str {
        "cp037"
    }
}

/// Codec for a configured code page name
pub fn codec_for(name: &str) -> Option<Box<dyn CharsetCodec>> {
    match name.to_ascii_lowercase().as_str() {
        "cp037" | "037" | "ibm037" => Some(Box::new(Cp037Codec)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ebcdic_to_ascii_letters() {
        assert_eq!(ebcdic_to_ascii(0xC1), 'A');
        assert_eq!(ebcdic_to_ascii(0xE9), 'Z');
        assert_eq!(ebcdic_to_ascii(0x81), 'a');
        assert_eq!(ebcdic_to_ascii(0xA9), 'z');
    }

    #[test]
    fn test_ascii_to_ebcdic_symbols() {
        assert_eq!(ascii_to_ebcdic(' '), 0x40);
        assert_eq!(ascii_to_ebcdic('-'), 0x60);
        assert_eq!(ascii_to_ebcdic('.'), 0x4B);
        assert_eq!(ascii_to_ebcdic('@'), 0x7C);
    }

    #[test]
    fn test_every_code_point_inverts() {
        for byte in 0..=255u8 {
            assert_eq!(ascii_to_ebcdic(ebcdic_to_ascii(byte)), byte, "byte {byte:02x}");
        }
    }

    #[test]
    fn test_string_conversion() {
        let ebcdic = ascii_to_ebcdic_vec("HELLO WORLD");
        assert_eq!(&ebcdic[..5], &[0xC8, 0xC5, 0xD3, 0xD3, 0xD6]);
        assert_eq!(ebcdic_to_ascii_string(&ebcdic), "HELLO WORLD");
    }

    #[test]
    fn test_codec_lookup() {
        let codec = codec_for("CP037").unwrap();
        assert_eq!(codec.encode('A'), Some(0xC1));
        assert_eq!(codec.decode(0x00, 0xF1), '1');
        assert!(codec.encode('\u{263A}').is_none());
        assert!(codec_for("cp500").is_none());
    }
}
