//! Delegated decoders
//!
//! Some formats are not decoded by this crate's own handlers but by a
//! separate document decoder: the decoder turns the byte source into a
//! document handle, and the handle is then asked for its XMP text. A
//! [`DelegatedHandler`] adapts such a decoder to the [`FileHandler`]
//! contract so it can sit in the registry next to the built-in handlers.
//!
//! Errors from either step are passed through unchanged.

use crate::core::error::XmpResult;
use crate::core::packet::XmpPacket;
use crate::files::handler::{FileHandler, XmpOptions};
use crate::files::source::ByteSource;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use tracing::debug;

/// Number of leading bytes offered to [`DocumentDecoder::can_handle`]
pub const DETECTION_HEADER_LEN: u64 = 64;

/// A decoded document that can report its embedded XMP
pub trait XmpDocument {
    /// The document's XMP packet as text
    fn xmp_string(&self) -> XmpResult<String>;
}

/// Decoder producing a document handle from a byte source
pub trait DocumentDecoder: Send + Sync {
    /// Decode the whole document
    fn decode(&self, source: &mut ByteSource<'_>) -> XmpResult<Box<dyn XmpDocument>>;

    /// Whether `header` (up to [`DETECTION_HEADER_LEN`] leading bytes)
    /// looks like this decoder's format
    fn can_handle(&self, header: &[u8]) -> bool;
}

/// [`FileHandler`] backed by a [`DocumentDecoder`]
#[derive(Clone)]
pub struct DelegatedHandler {
    format_name: &'static str,
    extensions: &'static [&'static str],
    decoder: Arc<dyn DocumentDecoder>,
}

impl DelegatedHandler {
    /// Wrap a decoder under a format name and its file extensions
    pub fn new<D: DocumentDecoder + 'static>(
        format_name: &'static str,
        extensions: &'static [&'static str],
        decoder: D,
    ) -> Self {
        Self::from_shared(format_name, extensions, Arc::new(decoder))
    }

    /// Wrap a decoder that is shared with other owners
    pub fn from_shared(
        format_name: &'static str,
        extensions: &'static [&'static str],
        decoder: Arc<dyn DocumentDecoder>,
    ) -> Self {
        Self {
            format_name,
            extensions,
            decoder,
        }
    }
}

impl fmt::Debug for DelegatedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedHandler")
            .field("format_name", &self.format_name)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl FileHandler for DelegatedHandler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<bool> {
        let pos = reader.stream_position()?;
        let mut header = Vec::new();
        let result = Read::take(&mut *reader, DETECTION_HEADER_LEN).read_to_end(&mut header);
        reader.seek(SeekFrom::Start(pos))?;
        result?;
        Ok(self.decoder.can_handle(&header))
    }

    fn read_xmp(
        &self,
        source: &mut ByteSource<'_>,
        _options: &XmpOptions,
    ) -> XmpResult<XmpPacket> {
        let document = self.decoder.decode(source)?;
        debug!(format = self.format_name, "delegated decode finished");
        Ok(XmpPacket::new(document.xmp_string()?))
    }

    fn format_name(&self) -> &'static str {
        self.format_name
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }
}
