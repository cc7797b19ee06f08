//! Error types for TN3270R
//!
//! Errors are grouped per component and folded into [`TN3270Error`]. Only
//! stream corruption, out-of-range addresses and unsupported orders are
//! fatal; they end the owning session and never the process.

use std::io;
use thiserror::Error;

/// Top-level error type for TN3270R operations
#[derive(Debug, Error)]
pub enum TN3270Error {
    /// Outbound data stream errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Buffer addressing errors
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Outbound data stream errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A read promised by the protocol ran past the end of the stream
    #[error("outbound data stream corrupted at offset {offset}: needed {needed} byte(s), {available} available")]
    StreamCorrupted { offset: usize, needed: usize, available: usize },
    /// Structured field length cannot hold its own header
    #[error("structured field at offset {offset} has invalid length {length}")]
    InvalidStructuredFieldLength { offset: usize, length: u16 },
    /// Order with no implementation
    #[error("unsupported order {mnemonic} (0x{order:02X})")]
    Unsupported { order: u8, mnemonic: &'static str },
}

/// Buffer addressing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Address outside `[0, len)`
    #[error("buffer address {addr} out of range for a {len}-cell buffer")]
    OutOfRange { addr: usize, len: usize },
    #[error("{rows}x{cols} is not a valid buffer size")]
    InvalidSize { rows: usize, cols: usize },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {parameter}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    #[error("configuration file {path}: {source}")]
    FileError {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Session lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Session has been torn down after a fatal error or shutdown
    #[error("session {id} is closed")]
    Closed { id: String },
}

impl TN3270Error {
    /// Whether the error must end the owning session
    pub fn is_fatal(&self) -> bool {
        matches!(self, TN3270Error::Protocol(_) | TN3270Error::Buffer(_))
    }
}

/// Result type alias for TN3270R operations
pub type TN3270Result<T> = Result<T, TN3270Error>;

/// Specialized result types for different components
pub type ProtocolResult<T> = Result<T, ProtocolError>;
pub type BufferResult<T> = Result<T, BufferError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
