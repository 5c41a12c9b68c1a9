//! PDF file format handler
//!
//! This module extracts the XMP packet from PDF files without building the
//! object graph.
//!
//! PDF XMP Storage:
//! - XMP is stored in a Metadata stream object, uncompressed by convention
//! - The packet is embedded with standard markers:
//!   `<?xpacket begin="..." id="W5M0MpCehiHzreSzNTczkc9d"?>` ... `<?xpacket end="w"?>`
//!
//! Extraction:
//! 1. Read the table offset from the line after the last `startxref`.
//! 2. Parse the cross-reference table at that offset.
//! 3. Scan in-use objects in table order for the begin marker. Table
//!    offsets are treated as claims, not guarantees; each one is confirmed by
//!    reading the object.
//! 4. Bound the owning object by the offset of the object numbered one
//!    higher, and cut the packet out of that range.

pub mod xref;

use crate::core::error::{XmpError, XmpResult};
use crate::core::packet::{find_bytes, XmpPacket, XPACKET_BEGIN};
use crate::files::handler::{peek_header, FileHandler, XmpOptions};
use crate::files::source::ByteSource;
use std::io::{BufReader, Read, Seek, SeekFrom};
use tracing::{debug, trace};
use xref::{CrossReferenceTable, EntryStatus, LineReader, ObjectReference, STARTXREF};

/// PDF file signature
const PDF_SIGNATURE: &[u8; 5] = b"%PDF-";

/// Keyword closing an indirect object; scan windows stop here
const ENDOBJ: &[u8] = b"endobj";

/// PDF file handler for XMP metadata
#[derive(Debug, Clone, Copy)]
pub struct PdfHandler;

impl FileHandler for PdfHandler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<bool> {
        Ok(peek_header::<_, 5>(reader)?.as_ref() == Some(PDF_SIGNATURE))
    }

    fn read_xmp(
        &self,
        source: &mut ByteSource<'_>,
        options: &XmpOptions,
    ) -> XmpResult<XmpPacket> {
        let reader = source.require_seek(self.format_name())?;
        Self::extract(reader, options.scan_len)
    }

    fn format_name(&self) -> &'static str {
        "PDF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["pdf"]
    }
}

impl PdfHandler {
    /// Read the XMP packet from a PDF file
    ///
    /// # Arguments
    ///
    /// * `reader` - A reader implementing `Read + Seek`
    /// * `scan_len` - Bytes read from each object when looking for the packet
    ///
    /// # Returns
    ///
    /// The packet text from its begin marker up to, not including, its end
    /// marker.
    pub fn extract<R: Read + Seek + ?Sized>(
        reader: &mut R,
        scan_len: usize,
    ) -> XmpResult<XmpPacket> {
        let xref_offset = Self::find_xref_offset(reader)?;
        debug!(offset = xref_offset, "cross-reference table offset");

        reader.seek(SeekFrom::Start(xref_offset))?;
        let table = CrossReferenceTable::decode(BufReader::new(&mut *reader))?;
        debug!(%table, "decoded cross-reference table");

        let owner = Self::find_packet_object(reader, &table, scan_len)?;
        let next = owner
            .id
            .checked_add(1)
            .and_then(|id| table.get(id))
            .ok_or(XmpError::UnboundedObject(owner.id))?;

        let extent = next
            .offset
            .checked_sub(owner.offset)
            .filter(|&len| len > 0)
            .ok_or_else(|| {
                XmpError::ParseError(format!(
                    "Object {} at offset {} does not precede object {} at offset {}",
                    owner.id, owner.offset, next.id, next.offset
                ))
            })?;
        debug!(object = owner.id, offset = owner.offset, extent, "packet object extent");

        let window = read_window(reader, owner.offset, extent)?;
        if window.len() as u64 != extent {
            return Err(XmpError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "object {} extends past the end of the file",
                    owner.id
                ),
            )));
        }

        XmpPacket::slice_between_markers(&window)
    }

    /// Scan the file line by line for `startxref` and parse the line after
    /// the last occurrence as the table offset
    fn find_xref_offset<R: Read + Seek + ?Sized>(reader: &mut R) -> XmpResult<u64> {
        let mut lines = LineReader::new(BufReader::new(reader));
        let mut found: Option<Option<Vec<u8>>> = None;

        while let Some(line) = lines.next_line()? {
            if line.trim_ascii() == STARTXREF {
                found = Some(lines.next_line()?);
            }
        }

        match found {
            None => Err(XmpError::TableNotFound(
                "no 'startxref' keyword in file".to_string(),
            )),
            Some(None) => Err(XmpError::ParseError(
                "'startxref' is not followed by an offset".to_string(),
            )),
            Some(Some(value)) => xref::parse_number(value.trim_ascii(), "startxref offset"),
        }
    }

    /// First in-use object, in table order, whose scan window holds the
    /// begin marker
    fn find_packet_object<'t, R: Read + Seek + ?Sized>(
        reader: &mut R,
        table: &'t CrossReferenceTable,
        scan_len: usize,
    ) -> XmpResult<&'t ObjectReference> {
        for reference in table
            .references
            .iter()
            .filter(|r| r.status == EntryStatus::InUse)
        {
            let window = read_window(reader, reference.offset, scan_len as u64)?;
            let window = match find_bytes(&window, ENDOBJ) {
                Some(end) => &window[..end],
                None => &window[..],
            };

            if find_bytes(window, XPACKET_BEGIN).is_some() {
                debug!(object = reference.id, offset = reference.offset, "found packet");
                return Ok(reference);
            }
            trace!(object = reference.id, offset = reference.offset, "no packet");
        }

        Err(XmpError::PacketNotFound)
    }
}

/// Read up to `len` bytes at `offset`; shorter at end of file
fn read_window<R: Read + Seek + ?Sized>(reader: &mut R, offset: u64, len: u64) -> XmpResult<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut window = Vec::new();
    Read::take(&mut *reader, len).read_to_end(&mut window)?;
    Ok(window)
}
