//! PSD (Photoshop) document decoder
//!
//! Photoshop files are read through the delegated decoder boundary: the
//! [`PsdDecoder`] decodes the file into a [`PsdDocument`] handle, and the
//! handle reports the XMP resource.
//!
//! ## PSD File Structure
//!
//! PSD files have the following structure:
//! 1. **Header** (26 bytes):
//!    - Signature: "8BPS" (4 bytes)
//!    - Version: 1 (PSD) or 2 (PSB) (2 bytes)
//!    - Reserved: 6 bytes (zeros)
//!    - Channels: 2 bytes (big-endian)
//!    - Height: 4 bytes (big-endian)
//!    - Width: 4 bytes (big-endian)
//!    - Depth: 2 bytes (big-endian)
//!    - Color mode: 2 bytes (big-endian)
//!
//! 2. **Color Mode Data Section**:
//!    - Length: 4 bytes (big-endian)
//!    - Data: variable
//!
//! 3. **Image Resources Section**:
//!    - Length: 4 bytes (big-endian)
//!    - Resources: variable (XMP is stored here as resource ID 1060)
//!
//! The layer and image data sections that follow are never read.
//!
//! ## XMP Storage
//!
//! XMP metadata is stored in the Image Resources section as a Photoshop Image Resource (PSIR)
//! with ID 1060 (0x0424). The image resource format is:
//! - Type: "8BIM" (4 bytes)
//! - ID: 2 bytes (big-endian)
//! - Name: Pascal string (length byte + chars, padded to even)
//! - Data length: 4 bytes (big-endian)
//! - Data: variable (padded to even)

use crate::core::error::{XmpError, XmpResult};
use crate::files::delegate::{DelegatedHandler, DocumentDecoder, XmpDocument};
use crate::files::source::{read_u16_be, read_u32_be, read_u8, ByteSource};
use std::io::Read;
use tracing::{debug, trace};

// PSD signature
const PSD_SIGNATURE: &[u8; 4] = b"8BPS";

// Image resource signature
const PSIR_SIGNATURE: &[u8; 4] = b"8BIM";

// Image resource IDs
const PSIR_XMP: u16 = 1060;

// Minimum image resource size: type(4) + id(2) + name(2) + data_len(4) = 12
const MIN_PSIR_SIZE: u64 = 12;

/// Fixed-size file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsdHeader {
    /// 1 for PSD, 2 for PSB
    pub version: u16,
    pub channels: u16,
    pub height: u32,
    pub width: u32,
    pub depth: u16,
    pub color_mode: u16,
}

impl PsdHeader {
    fn read<R: Read + ?Sized>(reader: &mut R) -> XmpResult<Self> {
        let mut signature = [0u8; 4];
        reader.read_exact(&mut signature)?;
        if signature != *PSD_SIGNATURE {
            return Err(XmpError::InvalidContainer(
                "Not a valid PSD file".to_string(),
            ));
        }

        let version = read_u16_be(reader)?;
        if version != 1 && version != 2 {
            return Err(XmpError::InvalidContainer(format!(
                "Unknown PSD version {}",
                version
            )));
        }

        let mut reserved = [0u8; 6];
        reader.read_exact(&mut reserved)?;

        Ok(Self {
            version,
            channels: read_u16_be(reader)?,
            height: read_u32_be(reader)?,
            width: read_u32_be(reader)?,
            depth: read_u16_be(reader)?,
            color_mode: read_u16_be(reader)?,
        })
    }

    /// Whether this is a large-document (PSB) file
    pub fn is_large_document(&self) -> bool {
        self.version == 2
    }
}

/// Decoded Photoshop document: the header and the XMP resource, if any
#[derive(Debug, Clone)]
pub struct PsdDocument {
    pub header: PsdHeader,
    xmp: Option<Vec<u8>>,
}

impl PsdDocument {
    /// Decode the header and image resources from a forward-only stream
    pub fn decode(source: &mut ByteSource<'_>) -> XmpResult<Self> {
        let header = PsdHeader::read(source)?;
        debug!(
            version = header.version,
            width = header.width,
            height = header.height,
            "PSD header"
        );

        // Skip color mode data section
        let color_mode_len = u64::from(read_u32_be(source)?);
        source.skip_exact(color_mode_len)?;

        let psir_len = u64::from(read_u32_be(source)?);
        let xmp = Self::find_xmp_resource(source, psir_len)?;

        Ok(Self { header, xmp })
    }

    /// Walk the image resources section looking for XMP (ID 1060)
    fn find_xmp_resource(source: &mut ByteSource<'_>, psir_len: u64) -> XmpResult<Option<Vec<u8>>> {
        let mut consumed = 0u64;

        while consumed + MIN_PSIR_SIZE <= psir_len {
            let mut rsrc_type = [0u8; 4];
            source.read_exact(&mut rsrc_type)?;
            if rsrc_type != *PSIR_SIGNATURE {
                // Unknown resource type; the rest of the section is opaque
                debug!(offset = consumed, "unknown image resource signature");
                break;
            }

            let rsrc_id = read_u16_be(source)?;

            // Name is padded to make total (length byte + chars) even
            let name_len = u64::from(read_u8(source)?);
            let name_padded_len = name_len + (name_len + 1) % 2;
            source.skip_exact(name_padded_len)?;

            let data_len = u64::from(read_u32_be(source)?);
            trace!(id = rsrc_id, len = data_len, "image resource");

            if rsrc_id == PSIR_XMP {
                return source.read_payload(data_len).map(Some);
            }

            // Data is padded to even
            let data_padded_len = data_len + data_len % 2;
            consumed += 4 + 2 + 1 + name_padded_len + 4 + data_padded_len;
            if consumed > psir_len {
                break;
            }
            source.skip_exact(data_padded_len)?;
        }

        Ok(None)
    }

    /// Raw bytes of the XMP resource
    pub fn xmp_bytes(&self) -> Option<&[u8]> {
        self.xmp.as_deref()
    }
}

impl XmpDocument for PsdDocument {
    fn xmp_string(&self) -> XmpResult<String> {
        let data = self.xmp.as_ref().ok_or(XmpError::PacketNotFound)?;
        String::from_utf8(data.clone())
            .map_err(|e| XmpError::ParseError(format!("Invalid UTF-8 in XMP: {}", e)))
    }
}

/// Photoshop decoder for the delegated handler boundary
#[derive(Debug, Default, Clone, Copy)]
pub struct PsdDecoder;

impl PsdDecoder {
    /// Registry handler for `.psd` and `.psb` files
    pub fn handler() -> DelegatedHandler {
        DelegatedHandler::new("PSD", &["psd", "psb"], PsdDecoder)
    }
}

impl DocumentDecoder for PsdDecoder {
    fn decode(&self, source: &mut ByteSource<'_>) -> XmpResult<Box<dyn XmpDocument>> {
        Ok(Box::new(PsdDocument::decode(source)?))
    }

    /// Check "8BPS" signature and version 1 (PSD) or 2 (PSB)
    fn can_handle(&self, header: &[u8]) -> bool {
        match header {
            [s0, s1, s2, s3, v0, v1, ..] => {
                [*s0, *s1, *s2, *s3] == *PSD_SIGNATURE
                    && matches!(u16::from_be_bytes([*v0, *v1]), 1 | 2)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::handler::{FileHandler, XmpOptions};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const XMP: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?><x:xmpmeta xmlns:x="adobe:ns:meta/"/><?xpacket end="w"?>"#;

    fn resource(id: u16, name: &[u8], data: &[u8]) -> Vec<u8> {
        let mut out = PSIR_SIGNATURE.to_vec();
        out.extend_from_slice(&id.to_be_bytes());
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        if (name.len() + 1) % 2 != 0 {
            out.push(0);
        }
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(data);
        if data.len() % 2 != 0 {
            out.push(0);
        }
        out
    }

    fn create_psd(version: u16, resources: &[Vec<u8>]) -> Vec<u8> {
        let mut psd = PSD_SIGNATURE.to_vec();
        psd.extend_from_slice(&version.to_be_bytes());
        psd.extend_from_slice(&[0; 6]); // reserved
        psd.extend_from_slice(&3u16.to_be_bytes()); // channels
        psd.extend_from_slice(&100u32.to_be_bytes()); // height
        psd.extend_from_slice(&200u32.to_be_bytes()); // width
        psd.extend_from_slice(&8u16.to_be_bytes()); // depth
        psd.extend_from_slice(&3u16.to_be_bytes()); // RGB

        // Color mode data: 3 bytes
        psd.extend_from_slice(&3u32.to_be_bytes());
        psd.extend_from_slice(&[1, 2, 3]);

        let section = resources.concat();
        psd.extend_from_slice(&(section.len() as u32).to_be_bytes());
        psd.extend(section);

        // Layer and mask section; never read
        psd.extend_from_slice(&[0; 8]);
        psd
    }

    fn decode(data: &[u8]) -> XmpResult<PsdDocument> {
        let mut bytes = data;
        PsdDocument::decode(&mut ByteSource::sequential(&mut bytes))
    }

    #[test]
    fn test_decode_header() {
        let doc = decode(&create_psd(2, &[])).unwrap();
        assert_eq!(doc.header.width, 200);
        assert_eq!(doc.header.height, 100);
        assert!(doc.header.is_large_document());
        assert!(doc.xmp_bytes().is_none());
        assert!(matches!(doc.xmp_string(), Err(XmpError::PacketNotFound)));
    }

    #[test]
    fn test_xmp_after_other_resources() {
        let data = create_psd(
            1,
            &[
                resource(1005, b"", &[0; 16]),
                resource(1033, b"abc", &[7; 5]),
                resource(PSIR_XMP, b"", XMP.as_bytes()),
            ],
        );
        let doc = decode(&data).unwrap();
        assert_eq!(doc.xmp_string().unwrap(), XMP);
    }

    #[test]
    fn test_unknown_resource_signature_stops_walk() {
        let mut bogus = resource(PSIR_XMP, b"", XMP.as_bytes());
        bogus[..4].copy_from_slice(b"MeSa");
        let doc = decode(&create_psd(1, &[bogus])).unwrap();
        assert!(doc.xmp_bytes().is_none());
    }

    #[test]
    fn test_invalid_signature_and_version() {
        let mut data = create_psd(1, &[]);
        data[0] = b'X';
        assert!(matches!(decode(&data), Err(XmpError::InvalidContainer(_))));

        let data = create_psd(3, &[]);
        assert!(matches!(decode(&data), Err(XmpError::InvalidContainer(_))));
    }

    #[test]
    fn test_truncated_resource() {
        let mut data = create_psd(1, &[resource(PSIR_XMP, b"", XMP.as_bytes())]);
        data.truncate(data.len() - 30);
        assert!(matches!(decode(&data), Err(XmpError::IoError(_))));
    }

    #[test]
    fn test_handler_round_trip() {
        let data = create_psd(1, &[resource(PSIR_XMP, b"", XMP.as_bytes())]);
        let handler = PsdDecoder::handler();

        let mut cursor = Cursor::new(data.clone());
        assert!(handler.can_handle(&mut cursor).unwrap());

        let mut bytes = data.as_slice();
        let packet = handler
            .read_xmp(&mut ByteSource::sequential(&mut bytes), &XmpOptions::default())
            .unwrap();
        assert_eq!(packet.as_str(), XMP);
    }

    #[test]
    fn test_can_handle_header() {
        assert!(PsdDecoder.can_handle(b"8BPS\x00\x01"));
        assert!(PsdDecoder.can_handle(b"8BPS\x00\x02rest"));
        assert!(!PsdDecoder.can_handle(b"8BPS\x00\x03"));
        assert!(!PsdDecoder.can_handle(b"8BP"));
        assert!(!PsdDecoder.can_handle(b"%PDF-1.4"));
    }
}
