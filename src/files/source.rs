//! Byte sources handed to the format decoders
//!
//! A decoder borrows a [`ByteSource`] for the duration of one call. The
//! source is either seekable or sequential-only; decoders that need random
//! access ask for it through [`ByteSource::require_seek`] and fail fast when
//! it is not available.

use crate::core::error::{XmpError, XmpResult};
use std::io::{self, Read, Seek, SeekFrom};

/// Anything that can be both read and seeked
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Caller-owned byte stream presented uniformly to all decoders
pub enum ByteSource<'a> {
    /// Random access is available
    Seekable(&'a mut dyn ReadSeek),
    /// Forward-only; skipping discards bytes
    Sequential(&'a mut dyn Read),
}

impl<'a> ByteSource<'a> {
    /// Borrow a seekable reader
    pub fn seekable<R: Read + Seek>(reader: &'a mut R) -> Self {
        ByteSource::Seekable(reader)
    }

    /// Borrow a forward-only reader
    pub fn sequential<R: Read>(reader: &'a mut R) -> Self {
        ByteSource::Sequential(reader)
    }

    /// Whether this source supports seeking
    pub fn is_seekable(&self) -> bool {
        matches!(self, ByteSource::Seekable(_))
    }

    /// Get random access to the underlying reader.
    ///
    /// `format` names the decoder asking, for the error message.
    pub fn require_seek(&mut self, format: &str) -> XmpResult<&mut (dyn ReadSeek + 'a)> {
        match self {
            ByteSource::Seekable(reader) => Ok(&mut **reader),
            ByteSource::Sequential(_) => Err(XmpError::UnsupportedSource(format!(
                "{} decoding requires a seekable source",
                format
            ))),
        }
    }

    /// Seek to an absolute offset, if the source allows it
    pub fn seek_to(&mut self, offset: u64) -> XmpResult<bool> {
        match self {
            ByteSource::Seekable(reader) => {
                reader.seek(SeekFrom::Start(offset))?;
                Ok(true)
            }
            ByteSource::Sequential(_) => Ok(false),
        }
    }

    /// Move forward `len` bytes.
    ///
    /// Seekable sources seek relative to the current position, which may
    /// land past the end of the stream; the next read then reports EOF.
    /// Sequential sources discard bytes and stop early at EOF. Returns the
    /// number of bytes skipped.
    pub fn skip(&mut self, len: u64) -> XmpResult<u64> {
        match self {
            ByteSource::Seekable(reader) => {
                let delta = i64::try_from(len).map_err(|_| {
                    XmpError::ParseError(format!("Skip length {} is out of range", len))
                })?;
                reader.seek(SeekFrom::Current(delta))?;
                Ok(len)
            }
            ByteSource::Sequential(reader) => {
                let skipped = io::copy(&mut Read::take(&mut **reader, len), &mut io::sink())?;
                Ok(skipped)
            }
        }
    }

    /// Skip exactly `len` bytes, failing if a sequential source ends first
    pub fn skip_exact(&mut self, len: u64) -> XmpResult<()> {
        let skipped = self.skip(len)?;
        if skipped != len {
            return Err(XmpError::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected to skip {} bytes, stream ended after {}", len, skipped),
            )));
        }
        Ok(())
    }

    /// Read exactly `len` bytes.
    ///
    /// The buffer grows with the data actually read, so an untrusted length
    /// field never triggers a large allocation on its own.
    pub fn read_payload(&mut self, len: u64) -> XmpResult<Vec<u8>> {
        let mut payload = Vec::new();
        Read::take(&mut *self, len).read_to_end(&mut payload)?;
        if payload.len() as u64 != len {
            return Err(XmpError::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, got {}", len, payload.len()),
            )));
        }
        Ok(payload)
    }

    /// Fill `buf` completely, or report a clean end of stream.
    ///
    /// Returns `Ok(false)` when the stream ends before the first byte,
    /// `Ok(true)` when `buf` was filled, and `UnexpectedEof` when the stream
    /// ends part-way through.
    pub fn read_record(&mut self, buf: &mut [u8]) -> XmpResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(false),
            n if n == buf.len() => Ok(true),
            n => Err(XmpError::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record truncated after {} of {} bytes", n, buf.len()),
            ))),
        }
    }
}

impl Read for ByteSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ByteSource::Seekable(reader) => reader.read(buf),
            ByteSource::Sequential(reader) => reader.read(buf),
        }
    }
}

/// Read a big-endian u32
pub(crate) fn read_u32_be<R: Read + ?Sized>(reader: &mut R) -> XmpResult<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a big-endian u16
pub(crate) fn read_u16_be<R: Read + ?Sized>(reader: &mut R) -> XmpResult<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a single byte
pub(crate) fn read_u8<R: Read + ?Sized>(reader: &mut R) -> XmpResult<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}
