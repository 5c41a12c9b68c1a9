//! InDesign file format handler
//!
//! This module extracts the XMP packet from Adobe InDesign documents.
//!
//! InDesign Layout:
//! - Two redundant 4096-byte master pages open the file. Each starts with a
//!   fixed GUID and carries the byte order of the object streams, a sequence
//!   number and the total page count. The copy with the higher sequence
//!   number is authoritative.
//! - The contiguous object section trails the page area. Each object is a
//!   32-byte marker (GUID, object UID, class ID, stream length, checksum)
//!   followed by a 4-byte inner length in the document's byte order and that
//!   many payload bytes.
//! - The XMP packet is the first object stream long enough to hold one.

use crate::core::error::{XmpError, XmpResult};
use crate::core::packet::XmpPacket;
use crate::files::handler::{peek_header, FileHandler, XmpOptions};
use crate::files::source::ByteSource;
use std::io::{Read, Seek};
use tracing::{debug, trace};

/// Size of each master page
const MASTER_PAGE_LENGTH: u64 = 4096;

/// Size of a database page
const PAGE_LENGTH: u64 = 4096;

/// Size of a contiguous object marker
const MARKER_LENGTH: u64 = 32;

/// Padding skipped ahead of every object marker
const PADDING_LENGTH: u64 = 2 * MARKER_LENGTH;

/// Shortest stream that can hold a packet: "x" + xpacket header + trailer
const MINIMUM_XMP_LENGTH: u32 = 4 + 53 + 19;

/// GUID opening each master page
const MASTER_PAGE_GUID: [u8; 16] = [
    0x06, 0x06, 0xed, 0xf5, 0xd8, 0x1d, 0x46, 0xe5, 0xbd, 0x31, 0xef, 0xe7, 0xfe, 0x74, 0xb7, 0x1d,
];

/// GUID of a contiguous object header marker
const HEADER_MARKER_GUID: [u8; 16] = [
    0xde, 0x39, 0x39, 0x79, 0x51, 0x88, 0x4b, 0x6c, 0x8e, 0x63, 0xee, 0xf8, 0xae, 0xe0, 0xdd, 0x38,
];

/// GUID of a contiguous object trailer marker
const TRAILER_MARKER_GUID: [u8; 16] = [
    0xfd, 0xce, 0xdb, 0x70, 0xf7, 0x86, 0x4b, 0x4f, 0xa4, 0xd3, 0xc7, 0x28, 0xb3, 0x41, 0x71, 0x06,
];

// Master page field offsets (all multi-byte fields little-endian)
const MAGIC_OFFSET: usize = 16;
const ENDIAN_OFFSET: usize = 24;
const SEQUENCE_OFFSET: usize = 264;
const FILE_PAGES_OFFSET: usize = 280;

/// InDesign file handler for XMP metadata
#[derive(Debug, Clone, Copy)]
pub struct InddHandler;

impl FileHandler for InddHandler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<bool> {
        Ok(peek_header::<_, 16>(reader)? == Some(MASTER_PAGE_GUID))
    }

    fn read_xmp(
        &self,
        source: &mut ByteSource<'_>,
        options: &XmpOptions,
    ) -> XmpResult<XmpPacket> {
        InddDocument::decode(source)?.into_packet(options)
    }

    fn format_name(&self) -> &'static str {
        "InDesign"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["indd"]
    }
}

/// Byte order of the object streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// 1 is little endian; any other flag value is big endian
    fn from_flag(flag: u8) -> Self {
        match flag {
            1 => ByteOrder::LittleEndian,
            _ => ByteOrder::BigEndian,
        }
    }

    fn read_u32<R: Read>(self, reader: &mut R) -> XmpResult<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(buf),
            ByteOrder::BigEndian => u32::from_be_bytes(buf),
        })
    }
}

/// One of the two redundant master pages
#[derive(Debug, Clone)]
pub struct MasterPage {
    pub magic: [u8; 8],
    /// Raw object stream byte order flag, see [`MasterPage::byte_order`]
    pub endian_flag: u8,
    pub sequence_number: u64,
    pub file_pages: u32,
}

impl MasterPage {
    fn read(source: &mut ByteSource<'_>) -> XmpResult<Self> {
        let mut page = vec![0u8; MASTER_PAGE_LENGTH as usize];
        source.read_exact(&mut page)?;

        if page[..16] != MASTER_PAGE_GUID {
            return Err(XmpError::InvalidContainer(
                "Master page GUID mismatch; not an InDesign file".to_string(),
            ));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&page[MAGIC_OFFSET..MAGIC_OFFSET + 8]);
        let endian_flag = page[ENDIAN_OFFSET];
        let sequence_number = u64::from_le_bytes(le_field(&page, SEQUENCE_OFFSET));
        let file_pages = u32::from_le_bytes(le_field(&page, FILE_PAGES_OFFSET));

        debug!(
            magic = %String::from_utf8_lossy(&magic),
            sequence_number,
            file_pages,
            "InDesign master page"
        );

        Ok(Self {
            magic,
            endian_flag,
            sequence_number,
            file_pages,
        })
    }

    /// Byte order of the object streams. Only meaningful for the
    /// authoritative copy; a stale copy may carry any flag value.
    pub fn byte_order(&self) -> ByteOrder {
        ByteOrder::from_flag(self.endian_flag)
    }
}

fn le_field<const N: usize>(page: &[u8], offset: usize) -> [u8; N] {
    let mut field = [0u8; N];
    field.copy_from_slice(&page[offset..offset + N]);
    field
}

/// Kind of a contiguous object marker, decided by its GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Header,
    Trailer,
    Other,
}

/// Contiguous object marker
#[derive(Debug, Clone)]
pub struct ObjectMarker {
    pub guid: [u8; 16],
    pub object_uid: u32,
    pub object_class_id: u32,
    pub stream_length: u32,
    pub checksum: u32,
}

impl ObjectMarker {
    /// Read a marker, or `None` on a clean end of stream
    fn read(source: &mut ByteSource<'_>) -> XmpResult<Option<Self>> {
        let mut raw = [0u8; MARKER_LENGTH as usize];
        if !source.read_record(&mut raw)? {
            return Ok(None);
        }

        let mut guid = [0u8; 16];
        guid.copy_from_slice(&raw[..16]);
        Ok(Some(Self {
            guid,
            object_uid: u32::from_le_bytes(le_field(&raw, 16)),
            object_class_id: u32::from_le_bytes(le_field(&raw, 20)),
            stream_length: u32::from_le_bytes(le_field(&raw, 24)),
            checksum: u32::from_le_bytes(le_field(&raw, 28)),
        }))
    }

    pub fn kind(&self) -> MarkerKind {
        if self.guid == HEADER_MARKER_GUID {
            MarkerKind::Header
        } else if self.guid == TRAILER_MARKER_GUID {
            MarkerKind::Trailer
        } else {
            MarkerKind::Other
        }
    }
}

/// The parts of an InDesign document needed to find its XMP packet
#[derive(Debug, Clone)]
pub struct InddDocument {
    pub pages: u32,
    pub byte_order: ByteOrder,
    /// Object streams long enough to hold a packet, in file order
    pub streams: Vec<Vec<u8>>,
}

impl InddDocument {
    /// Parse the master pages and collect candidate object streams.
    ///
    /// Works on sequential sources; seeking is used when available.
    pub fn decode(source: &mut ByteSource<'_>) -> XmpResult<Self> {
        let first = MasterPage::read(source)?;
        let second = MasterPage::read(source)?;

        let master = if second.sequence_number > first.sequence_number {
            second
        } else {
            first
        };
        debug!(
            sequence_number = master.sequence_number,
            pages = master.file_pages,
            byte_order = ?master.byte_order(),
            "selected authoritative master page"
        );

        if master.file_pages < 2 {
            return Err(XmpError::InvalidContainer(format!(
                "Page count {} does not cover the master pages",
                master.file_pages
            )));
        }

        let section_offset = u64::from(master.file_pages) * PAGE_LENGTH - 2 * MARKER_LENGTH;
        debug!(offset = section_offset, "contiguous object section");

        let mut padding = PADDING_LENGTH;
        if !source.seek_to(section_offset)? {
            // Forward-only: land directly on the first marker
            let first_marker = section_offset + PADDING_LENGTH;
            source.skip(first_marker - 2 * MASTER_PAGE_LENGTH)?;
            padding = 0;
        }

        let byte_order = master.byte_order();
        let mut streams = Vec::new();
        loop {
            source.skip(padding)?;
            padding = PADDING_LENGTH;

            let Some(marker) = ObjectMarker::read(source)? else {
                break;
            };
            trace!(
                kind = ?marker.kind(),
                uid = marker.object_uid,
                class = marker.object_class_id,
                stream_length = marker.stream_length,
                checksum = marker.checksum,
                "contiguous object marker"
            );

            let inner_length = byte_order.read_u32(source)?;
            if inner_length < MINIMUM_XMP_LENGTH {
                source.skip(u64::from(inner_length))?;
                continue;
            }

            if marker.stream_length.checked_sub(4) != Some(inner_length) {
                return Err(XmpError::CorruptStream(format!(
                    "Object {} inner length {} does not match stream length {}",
                    marker.object_uid, inner_length, marker.stream_length
                )));
            }

            streams.push(source.read_payload(u64::from(inner_length))?);
        }

        debug!(candidates = streams.len(), "collected object streams");

        Ok(Self {
            pages: master.file_pages,
            byte_order,
            streams,
        })
    }

    /// Turn the first candidate stream into the packet.
    ///
    /// The stream is not checked for packet markers unless
    /// [`XmpOptions::trim_packet`] is set.
    pub fn into_packet(self, options: &XmpOptions) -> XmpResult<XmpPacket> {
        let stream = self
            .streams
            .into_iter()
            .next()
            .ok_or(XmpError::PacketNotFound)?;

        if options.trim_packet {
            XmpPacket::slice_between_markers(&stream)
        } else {
            XmpPacket::from_bytes(stream)
        }
    }
}
