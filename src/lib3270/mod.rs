//! IBM 3270 data stream implementation
//!
//! The 3270 is a block-mode terminal: the host writes a whole screen image
//! at once (outbound), the operator edits unprotected fields locally, and an
//! attention key sends the modified data back (inbound).
//!
//! # Architecture
//!
//! - [`codes`] - command, order, WCC, AID and structured field constants
//! - [`attributes`] - field and character attributes
//! - [`buffer`] - the cell grid and buffer addressing
//! - [`field`] - fields derived from the buffer, read replies
//! - [`stream`] - byte-level reader and writer for data streams
//! - [`protocol`] - the outbound data stream interpreter
//! - [`producer`] - inbound frame construction
//! - [`query`] - Query Reply structured fields
//! - [`keyboard`] - field-aware operator editing
//! - [`status`] - operator information area state
//!
//! # Example
//!
//! ```rust
//! use tn3270r::lib3270::{process_outbound, Buffer, Fields};
//!
//! let mut buffer = Buffer::new(24, 80).unwrap();
//! // Erase/Write, WCC unlock, SF unprotected, "HI"
//! let outcome = process_outbound(&[0xF5, 0xC2, 0x1D, 0x40, 0xC8, 0xC9], &mut buffer).unwrap();
//! assert!(outcome.erased);
//!
//! let fields = Fields::build(&mut buffer);
//! assert_eq!(fields.len(), 1);
//! ```

pub mod attributes;
pub mod buffer;
pub mod codes;
pub mod field;
pub mod keyboard;
pub mod producer;
pub mod protocol;
pub mod query;
pub mod status;
pub mod stream;

pub use attributes::{Attributes, DEFAULT_ATTRS};
pub use buffer::{addressing, Address, Buffer, Cell, ScreenSize};
pub use codes::*;
pub use field::{Field, Fields};
pub use keyboard::{KeyEvent, KeyOutcome, KeyboardEditor};
pub use producer::Producer;
pub use protocol::{process_outbound, Outcome, ReplyRequest};
pub use status::Status;
pub use stream::{InboundWriter, OutboundReader, StructuredField};

pub use crate::protocol_common::ebcdic::{ascii_to_ebcdic, ebcdic_to_ascii};
