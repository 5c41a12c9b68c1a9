//! Error types for XMP extraction
//!
//! Every failure a decoder can report is a distinct variant so that callers
//! can tell "not this kind of file" apart from "this file is corrupt" and
//! from "no metadata present".

use thiserror::Error;

/// Error types for XMP extraction
#[derive(Debug, Error)]
pub enum XmpError {
    /// Magic number or identity tag mismatch at the start of the container
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// The decoder needs random access but the byte source is sequential
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The cross-reference table could not be located
    #[error("Cross-reference table not found: {0}")]
    TableNotFound(String),

    /// A structural field could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Redundant length fields inside the container disagree
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),

    /// The container was parsed completely but holds no XMP packet
    #[error("XMP packet not found")]
    PacketNotFound,

    /// No decoder is registered for the requested format key
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The object holding the packet has no successor to bound its extent
    #[error("No object follows object {0}; cannot bound the XMP packet")]
    UnboundedObject(u32),

    /// The payload exists but is stored in a form that is not decoded
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// IO error (short reads surface as `UnexpectedEof`)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for XMP extraction
pub type XmpResult<T> = Result<T, XmpError>;
