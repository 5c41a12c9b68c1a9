//! File handler trait for XMP extraction
//!
//! This module defines the trait that all file format handlers implement,
//! giving every format the same shape: byte source in, packet text out.

use crate::core::error::XmpResult;
use crate::core::packet::XmpPacket;
use crate::files::source::ByteSource;
use std::io::{Read, Seek};

/// Default number of bytes read when scanning a PDF object for a packet
pub const DEFAULT_SCAN_LEN: usize = 1024;

/// Options for XMP extraction.
///
/// Use the builder pattern to configure options.
///
/// # Example
///
/// ```rust
/// use xmpdump::XmpOptions;
///
/// let options = XmpOptions::default().trim_packet().scan_len(4096);
/// assert!(options.trim_packet);
/// assert_eq!(options.scan_len, 4096);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct XmpOptions {
    /// Bytes read from each PDF object when looking for the begin marker
    pub scan_len: usize,
    /// Cut the InDesign result down to the begin/end markers, as the PDF
    /// decoder does. Off by default: the first candidate stream is returned
    /// verbatim.
    pub trim_packet: bool,
}

impl Default for XmpOptions {
    fn default() -> Self {
        Self {
            scan_len: DEFAULT_SCAN_LEN,
            trim_packet: false,
        }
    }
}

impl XmpOptions {
    /// Set the PDF scan window size.
    ///
    /// Values below the length of the begin marker can never match and are
    /// raised to it.
    pub fn scan_len(mut self, len: usize) -> Self {
        self.scan_len = len.max(crate::core::packet::XPACKET_BEGIN.len());
        self
    }

    /// Apply begin/end marker slicing to the InDesign result.
    pub fn trim_packet(mut self) -> Self {
        self.trim_packet = true;
        self
    }
}

/// Trait for file format handlers
///
/// All file format handlers (InDesign, PDF, PNG, ...) implement this trait
/// to provide a unified interface for extracting the XMP packet. Handlers
/// are stateless between calls.
pub trait FileHandler: Send + Sync {
    /// Check if this handler can handle the given file
    ///
    /// This method peeks at the file header to determine if it matches the
    /// expected format. The reader is rewound to where it started.
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<bool>;

    /// Extract the XMP packet from a byte source
    ///
    /// # Returns
    ///
    /// * `Ok(XmpPacket)` if a packet was located
    /// * `Err(XmpError::PacketNotFound)` if the container holds none
    /// * `Err(XmpError)` for any other failure
    fn read_xmp(&self, source: &mut ByteSource<'_>, options: &XmpOptions)
        -> XmpResult<XmpPacket>;

    /// Get the name of the file format this handler supports
    fn format_name(&self) -> &'static str;

    /// Get the file extensions this handler supports
    ///
    /// A slice of lowercase extensions (e.g., &["psd", "psb"])
    fn extensions(&self) -> &'static [&'static str];
}

/// Read up to `N` bytes from the current position and rewind to it.
///
/// Returns `None` when the stream is shorter than `N`.
pub(crate) fn peek_header<R: Read + Seek, const N: usize>(
    reader: &mut R,
) -> XmpResult<Option<[u8; N]>> {
    let pos = reader.stream_position()?;
    let mut header = [0u8; N];
    let result = reader.read_exact(&mut header);
    reader.seek(std::io::SeekFrom::Start(pos))?;
    match result {
        Ok(()) => Ok(Some(header)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}
