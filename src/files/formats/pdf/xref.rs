//! Cross-reference table of a PDF file
//!
//! Only the classic, line-oriented table is understood:
//!
//! ```text
//! xref
//! 0 6
//! 0000000000 65535 f
//! 0000000017 00000 n
//! ...
//! ```
//!
//! The first line after `xref` holds the first object number and the number
//! of entries; each entry line holds a byte offset, a generation number and
//! an in-use (`n`) or free (`f`) flag. Lines may end in CR, LF or CRLF.

use crate::core::error::{XmpError, XmpResult};
use std::fmt;
use std::io::{self, BufRead};

/// Keyword opening a cross-reference table
pub const XREF_START: &[u8] = b"xref";

/// Keyword preceding the cross-reference table offset in the trailer
pub const STARTXREF: &[u8] = b"startxref";

/// In-use / free flag of a table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    InUse,
    Free,
}

/// One entry of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    /// Object number, implied by the entry's position in the table
    pub id: u32,
    pub offset: u64,
    pub generation: u16,
    pub status: EntryStatus,
}

/// Parsed cross-reference table (first subsection only)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReferenceTable {
    pub object_start: u32,
    pub object_count: u32,
    pub references: Vec<ObjectReference>,
}

impl CrossReferenceTable {
    /// Parse a table whose `xref` keyword is the next line of `reader`
    pub fn decode<R: BufRead>(reader: R) -> XmpResult<Self> {
        let mut lines = LineReader::new(reader);

        let header = lines.next_line()?.unwrap_or_default();
        if header.trim_ascii() != XREF_START {
            return Err(XmpError::TableNotFound(format!(
                "expected 'xref', found '{}'",
                String::from_utf8_lossy(header.trim_ascii())
            )));
        }

        let counts = lines
            .next_line()?
            .ok_or_else(|| XmpError::ParseError("Cross-reference table is empty".to_string()))?;
        let (object_start, object_count) = match fields(&counts).as_slice() {
            [start, count] => (
                parse_number::<u32>(start, "object start")?,
                parse_number::<u32>(count, "object count")?,
            ),
            other => {
                return Err(XmpError::ParseError(format!(
                    "Expected object start and object count, got {} field(s)",
                    other.len()
                )))
            }
        };

        let mut references = Vec::new();
        for index in 0..object_count {
            let line = lines.next_line()?.ok_or_else(|| {
                XmpError::ParseError(format!(
                    "Cross-reference table ends after {} of {} entries",
                    index, object_count
                ))
            })?;

            let entry = fields(&line);
            if entry.len() < 2 {
                return Err(XmpError::ParseError(format!(
                    "Malformed cross-reference entry: '{}'",
                    String::from_utf8_lossy(&line)
                )));
            }

            let status = match entry.get(2).copied() {
                None | Some(b"n") => EntryStatus::InUse,
                Some(b"f") => EntryStatus::Free,
                Some(flag) => {
                    return Err(XmpError::ParseError(format!(
                        "Unknown cross-reference entry flag '{}'",
                        String::from_utf8_lossy(flag)
                    )))
                }
            };

            let id = object_start.checked_add(index).ok_or_else(|| {
                XmpError::ParseError("Object number overflows the table".to_string())
            })?;

            references.push(ObjectReference {
                id,
                offset: parse_number(entry[0], "object offset")?,
                generation: parse_number(entry[1], "object generation")?,
                status,
            });
        }

        Ok(Self {
            object_start,
            object_count,
            references,
        })
    }

    /// Look up the entry for object `id`
    pub fn get(&self, id: u32) -> Option<&ObjectReference> {
        self.references.iter().find(|r| r.id == id)
    }
}

impl fmt::Display for CrossReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CrossReferenceTable with {} references, ID range {} - {}",
            self.references.len(),
            self.object_start,
            u64::from(self.object_start) + u64::from(self.object_count)
        )
    }
}

/// Splits a byte stream into lines ending in CR, LF or CRLF
pub(crate) struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next line without its terminator, or `None` at end of stream
    pub(crate) fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok((!line.is_empty()).then_some(line));
            }

            match buf.iter().position(|&b| b == b'\r' || b == b'\n') {
                Some(i) => {
                    let terminator = buf[i];
                    line.extend_from_slice(&buf[..i]);
                    self.inner.consume(i + 1);
                    if terminator == b'\r' {
                        self.skip_line_feed()?;
                    }
                    return Ok(Some(line));
                }
                None => {
                    let n = buf.len();
                    line.extend_from_slice(buf);
                    self.inner.consume(n);
                }
            }
        }
    }

    fn skip_line_feed(&mut self) -> io::Result<()> {
        if self.inner.fill_buf()?.first() == Some(&b'\n') {
            self.inner.consume(1);
        }
        Ok(())
    }
}

/// Whitespace-separated fields of a line
fn fields(line: &[u8]) -> Vec<&[u8]> {
    line.split(|b| b.is_ascii_whitespace())
        .filter(|field| !field.is_empty())
        .collect()
}

/// Parse a decimal field
pub(crate) fn parse_number<T: std::str::FromStr>(field: &[u8], what: &str) -> XmpResult<T> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            XmpError::ParseError(format!(
                "Invalid {}: '{}'",
                what,
                String::from_utf8_lossy(field)
            ))
        })
}
