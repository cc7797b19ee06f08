//! TN3270R: IBM 3270 terminal emulation core
//!
//! Interprets the outbound 3270 data stream into a field-structured
//! character buffer, edits it the way a 3270 keyboard would, and produces
//! the inbound frames a terminal sends back to the host.

/// PROTOCOL COMMON: EBCDIC conversion and charset codecs
pub mod protocol_common;

/// LIB3270: IBM 3270 data stream, buffer, fields and keyboard
pub mod lib3270;

/// Session configuration and persistence
pub mod config;

/// Error types
pub mod error;

/// One terminal session and its observers
pub mod session;

/// Tokio worker running a session
pub mod controller;

pub use config::{SessionConfig, TerminalConfig};
pub use controller::{SessionCommand, SessionEvent, SessionWorker};
pub use error::{TN3270Error, TN3270Result};
pub use session::{Session, TerminalObserver};
