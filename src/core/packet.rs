//! XMP packet value
//!
//! An XMP packet is a run of XML text wrapped in `<?xpacket begin=...?>` /
//! `<?xpacket end=...?>` processing instructions. The decoders in
//! [`crate::files::formats`] hand their result back as an [`XmpPacket`].

use crate::core::error::{XmpError, XmpResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt;

/// Literal that opens every XMP packet
pub const XPACKET_BEGIN: &[u8] = b"<?xpacket begin=";

/// Literal that opens the closing processing instruction of an XMP packet
pub const XPACKET_END: &[u8] = b"<?xpacket end";

/// Extracted XMP packet text, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmpPacket(String);

impl XmpPacket {
    /// Wrap already-decoded packet text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Build a packet from raw bytes, which must be valid UTF-8
    pub fn from_bytes(bytes: Vec<u8>) -> XmpResult<Self> {
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|e| XmpError::ParseError(format!("Invalid UTF-8 in XMP: {}", e)))
    }

    /// Cut the packet out of a larger window.
    ///
    /// The result starts at the first begin marker (inclusive) and stops at
    /// the first end marker found after it (exclusive). A window without a
    /// begin marker yields [`XmpError::PacketNotFound`]; a begin marker with
    /// no end marker after it is a [`XmpError::ParseError`].
    pub fn slice_between_markers(window: &[u8]) -> XmpResult<Self> {
        let begin = find_bytes(window, XPACKET_BEGIN).ok_or(XmpError::PacketNotFound)?;
        let end = find_bytes(&window[begin..], XPACKET_END)
            .map(|offset| begin + offset)
            .ok_or_else(|| {
                XmpError::ParseError("XMP packet has no end marker".to_string())
            })?;
        Self::from_bytes(window[begin..end].to_vec())
    }

    /// Packet text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the packet and return its text
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the text carries both the begin and the end marker
    pub fn is_delimited(&self) -> bool {
        let bytes = self.0.as_bytes();
        match find_bytes(bytes, XPACKET_BEGIN) {
            Some(begin) => find_bytes(&bytes[begin..], XPACKET_END).is_some(),
            None => false,
        }
    }

    /// Run the text through an XML tokenizer and report the first
    /// syntax error, if any.
    ///
    /// Decoders never call this themselves; the INDD decoder in particular
    /// returns its candidate stream unvalidated.
    pub fn check_well_formed(&self) -> XmpResult<()> {
        let mut reader = Reader::from_str(&self.0);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => return Ok(()),
                Ok(_) => {}
                Err(e) => {
                    return Err(XmpError::ParseError(format!(
                        "Malformed XMP at byte {}: {}",
                        reader.error_position(),
                        e
                    )))
                }
            }
        }
    }
}

impl fmt::Display for XmpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for XmpPacket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<XmpPacket> for String {
    fn from(packet: XmpPacket) -> Self {
        packet.0
    }
}

/// Position of the first occurrence of `needle` in `haystack`
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
