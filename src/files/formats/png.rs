//! PNG file format handler
//!
//! This module extracts the XMP packet from PNG files. Only a forward-only
//! byte source is needed.
//!
//! PNG XMP Storage:
//! - XMP Packet is stored in iTXt chunk with keyword "XML:com.adobe.xmp"
//! - iTXt chunk format: keyword (null-terminated) + compression flag + compression method + language tag + translated keyword + text
//! - For XMP, compression flag is 0 (uncompressed)

use crate::core::error::{XmpError, XmpResult};
use crate::core::packet::XmpPacket;
use crate::files::handler::{peek_header, FileHandler, XmpOptions};
use crate::files::source::{read_u32_be, ByteSource};
use std::io::{Read, Seek};
use tracing::{debug, trace};

/// PNG file signature
const PNG_SIGNATURE: &[u8; 8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// XMP keyword in iTXt chunk, with its null terminator
const XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp\0";

/// PNG chunk type for iTXt
const CHUNK_TYPE_ITXT: &[u8; 4] = b"iTXt";

/// PNG chunk type for IEND (end of file)
const CHUNK_TYPE_IEND: &[u8; 4] = b"IEND";

/// PNG file handler for XMP metadata
#[derive(Debug, Clone, Copy)]
pub struct PngHandler;

impl FileHandler for PngHandler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<bool> {
        Ok(peek_header::<_, 8>(reader)?.as_ref() == Some(PNG_SIGNATURE))
    }

    fn read_xmp(
        &self,
        source: &mut ByteSource<'_>,
        _options: &XmpOptions,
    ) -> XmpResult<XmpPacket> {
        Self::extract(source)
    }

    fn format_name(&self) -> &'static str {
        "PNG"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png"]
    }
}

impl PngHandler {
    /// Read the XMP packet from a PNG stream
    ///
    /// Chunks are read in order until the first XMP iTXt chunk or IEND,
    /// whichever comes first. Bytes after IEND are never read. Only iTXt
    /// payloads are buffered; every other chunk is skipped by its declared
    /// length.
    ///
    /// # Returns
    ///
    /// * `Ok(XmpPacket)` with the chunk's text field
    /// * `Err(XmpError::InvalidContainer)` if the signature does not match
    /// * `Err(XmpError::PacketNotFound)` if IEND is reached first
    pub fn extract(source: &mut ByteSource<'_>) -> XmpResult<XmpPacket> {
        let mut signature = [0u8; 8];
        source.read_exact(&mut signature)?;

        if signature != *PNG_SIGNATURE {
            return Err(XmpError::InvalidContainer(
                "Not a valid PNG file".to_string(),
            ));
        }

        loop {
            let (length, chunk_type) = Self::read_chunk_header(source)?;
            trace!(
                chunk_type = %String::from_utf8_lossy(&chunk_type),
                len = length,
                "chunk"
            );

            if chunk_type == *CHUNK_TYPE_IEND {
                return Err(XmpError::PacketNotFound);
            }

            if chunk_type != *CHUNK_TYPE_ITXT {
                // Payload and CRC
                source.skip_exact(u64::from(length) + 4)?;
                continue;
            }

            let data = source.read_payload(u64::from(length))?;
            let _crc = read_u32_be(source)?;

            if Self::is_xmp_itxt(&data) {
                let text = Self::extract_xmp_from_itxt(&data)?;
                debug!(len = text.len(), "found XMP iTXt chunk");
                return XmpPacket::from_bytes(text.to_vec());
            }
        }
    }

    /// Chunk length and type
    fn read_chunk_header(source: &mut ByteSource<'_>) -> XmpResult<(u32, [u8; 4])> {
        let length = read_u32_be(source)?;

        let mut chunk_type = [0u8; 4];
        source.read_exact(&mut chunk_type)?;

        Ok((length, chunk_type))
    }

    /// Check if an iTXt chunk contains XMP data
    fn is_xmp_itxt(data: &[u8]) -> bool {
        data.starts_with(XMP_KEYWORD)
    }

    /// Text field of an XMP iTXt chunk.
    ///
    /// Skips compression flag, compression method, language tag and
    /// translated keyword.
    fn extract_xmp_from_itxt(data: &[u8]) -> XmpResult<&[u8]> {
        let rest = &data[XMP_KEYWORD.len()..];
        let (compression_flag, rest) = match rest {
            [flag, _method, rest @ ..] => (*flag, rest),
            _ => {
                return Err(XmpError::ParseError(
                    "iTXt chunk ends inside its header".to_string(),
                ))
            }
        };

        if compression_flag != 0 {
            return Err(XmpError::NotSupported(
                "Compressed XMP in PNG is not supported".to_string(),
            ));
        }

        let rest = skip_null_terminated(rest, "language tag")?;
        skip_null_terminated(rest, "translated keyword")
    }
}

/// Bytes after the next null terminator
fn skip_null_terminated<'a>(data: &'a [u8], field: &str) -> XmpResult<&'a [u8]> {
    data.iter()
        .position(|&b| b == 0)
        .map(|end| &data[end + 1..])
        .ok_or_else(|| {
            XmpError::ParseError(format!("iTXt {} is not null-terminated", field))
        })
}
