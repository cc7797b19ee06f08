//! Protocol-independent helpers
//!
//! - [`ebcdic`] - EBCDIC/ASCII conversion and charset codecs
//!
//! ```
//! use tn3270r::protocol_common::ebcdic::{ebcdic_to_ascii, ascii_to_ebcdic};
//!
//! assert_eq!(ebcdic_to_ascii(0xC1), 'A');
//! assert_eq!(ascii_to_ebcdic('A'), 0xC1);
//! ```

pub mod ebcdic;

pub use ebcdic::{
    ascii_to_ebcdic, ascii_to_ebcdic_vec, codec_for, ebcdic_to_ascii, ebcdic_to_ascii_string,
    CharsetCodec, Cp037Codec,
};
