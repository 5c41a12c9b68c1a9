//! File handler registry for XMP extraction
//!
//! This module provides a registry value mapping format keys (lowercase file
//! extensions) to handlers. A registry is put together once with
//! [`HandlerRegistryBuilder`] and then only read; lookups are linear and the
//! first registration for a key wins.

use crate::core::error::{XmpError, XmpResult};
use crate::core::packet::XmpPacket;
use crate::files::delegate::DelegatedHandler;
use crate::files::handler::{FileHandler, XmpOptions};
use crate::files::source::ByteSource;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Enum of supported file handlers
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Handler {
    #[cfg(feature = "indd")]
    Indd(crate::files::formats::indd::InddHandler),
    #[cfg(feature = "pdf")]
    Pdf(crate::files::formats::pdf::PdfHandler),
    #[cfg(feature = "png")]
    Png(crate::files::formats::png::PngHandler),
    Delegated(DelegatedHandler),
}

impl FileHandler for Handler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<bool> {
        match self {
            #[cfg(feature = "indd")]
            Handler::Indd(h) => h.can_handle(reader),
            #[cfg(feature = "pdf")]
            Handler::Pdf(h) => h.can_handle(reader),
            #[cfg(feature = "png")]
            Handler::Png(h) => h.can_handle(reader),
            Handler::Delegated(h) => h.can_handle(reader),
        }
    }

    fn read_xmp(
        &self,
        source: &mut ByteSource<'_>,
        options: &XmpOptions,
    ) -> XmpResult<XmpPacket> {
        match self {
            #[cfg(feature = "indd")]
            Handler::Indd(h) => h.read_xmp(source, options),
            #[cfg(feature = "pdf")]
            Handler::Pdf(h) => h.read_xmp(source, options),
            #[cfg(feature = "png")]
            Handler::Png(h) => h.read_xmp(source, options),
            Handler::Delegated(h) => h.read_xmp(source, options),
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "indd")]
            Handler::Indd(h) => h.format_name(),
            #[cfg(feature = "pdf")]
            Handler::Pdf(h) => h.format_name(),
            #[cfg(feature = "png")]
            Handler::Png(h) => h.format_name(),
            Handler::Delegated(h) => h.format_name(),
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "indd")]
            Handler::Indd(h) => h.extensions(),
            #[cfg(feature = "pdf")]
            Handler::Pdf(h) => h.extensions(),
            #[cfg(feature = "png")]
            Handler::Png(h) => h.extensions(),
            Handler::Delegated(h) => h.extensions(),
        }
    }
}

#[cfg(feature = "indd")]
impl From<crate::files::formats::indd::InddHandler> for Handler {
    fn from(h: crate::files::formats::indd::InddHandler) -> Self {
        Handler::Indd(h)
    }
}

#[cfg(feature = "pdf")]
impl From<crate::files::formats::pdf::PdfHandler> for Handler {
    fn from(h: crate::files::formats::pdf::PdfHandler) -> Self {
        Handler::Pdf(h)
    }
}

#[cfg(feature = "png")]
impl From<crate::files::formats::png::PngHandler> for Handler {
    fn from(h: crate::files::formats::png::PngHandler) -> Self {
        Handler::Png(h)
    }
}

impl From<DelegatedHandler> for Handler {
    fn from(h: DelegatedHandler) -> Self {
        Handler::Delegated(h)
    }
}

/// Registry for file format handlers
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    entries: Vec<(String, Handler)>,
}

/// Collects `(key, handler)` registrations for a [`HandlerRegistry`]
#[derive(Debug, Default)]
pub struct HandlerRegistryBuilder {
    entries: Vec<(String, Handler)>,
}

impl HandlerRegistryBuilder {
    /// Register a handler under every extension it reports
    pub fn handler(mut self, handler: impl Into<Handler>) -> Self {
        let handler = handler.into();
        for ext in handler.extensions() {
            self.entries.push((ext.to_lowercase(), handler.clone()));
        }
        self
    }

    /// Register a handler under an explicit key
    ///
    /// A key that is already taken stays bound to its first handler.
    pub fn register(mut self, key: &str, handler: impl Into<Handler>) -> Self {
        self.entries.push((key.to_lowercase(), handler.into()));
        self
    }

    /// Register the built-in handlers (InDesign, PDF, PNG, PSD)
    pub fn with_defaults(self) -> Self {
        let builder = self;
        #[cfg(feature = "indd")]
        let builder = builder.handler(crate::files::formats::indd::InddHandler);
        #[cfg(feature = "pdf")]
        let builder = builder.handler(crate::files::formats::pdf::PdfHandler);
        #[cfg(feature = "png")]
        let builder = builder.handler(crate::files::formats::png::PngHandler);
        #[cfg(feature = "psd")]
        let builder = builder.handler(crate::files::formats::psd::PsdDecoder::handler());
        builder
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            entries: self.entries,
        }
    }
}

impl HandlerRegistry {
    /// Create a new handler registry with default handlers registered
    pub fn new() -> Self {
        Self::builder().with_defaults().build()
    }

    /// Start an empty registry
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Find a handler by file extension
    ///
    /// # Arguments
    ///
    /// * `extension` - Format key (e.g., "indd", "pdf", "png"); case-insensitive
    ///
    /// # Returns
    ///
    /// * `Some(&Handler)` for the first handler registered under the key
    /// * `None` if no handler matches the extension
    pub fn find_by_extension(&self, extension: &str) -> Option<&Handler> {
        let ext_lower = extension.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == ext_lower)
            .map(|(_, handler)| handler)
    }

    /// Find a handler by format detection
    ///
    /// This method tries each registered handler's `can_handle` method
    /// to determine which handler can process the file.
    ///
    /// # Arguments
    ///
    /// * `reader` - A reader implementing `Read + Seek`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(&Handler))` if a handler is found
    /// * `Ok(None)` if no handler can handle the file
    /// * `Err(XmpError)` if an error occurs during detection
    pub fn find_by_detection<R: Read + Seek>(&self, reader: &mut R) -> XmpResult<Option<&Handler>> {
        let saved_pos = reader.stream_position()?;

        for (_, handler) in &self.entries {
            reader.seek(SeekFrom::Start(saved_pos))?;
            if handler.can_handle(reader)? {
                reader.seek(SeekFrom::Start(saved_pos))?;
                return Ok(Some(handler));
            }
        }

        reader.seek(SeekFrom::Start(saved_pos))?;
        Ok(None)
    }

    /// Decode `source` with the handler registered under `key`
    ///
    /// # Returns
    ///
    /// * `Ok(XmpPacket)` from the selected handler
    /// * `Err(XmpError::UnsupportedFormat)` if no handler is registered for `key`
    /// * `Err(XmpError)` from the handler otherwise
    pub fn dump(
        &self,
        source: &mut ByteSource<'_>,
        key: &str,
        options: &XmpOptions,
    ) -> XmpResult<XmpPacket> {
        let handler = self
            .find_by_extension(key)
            .ok_or_else(|| XmpError::UnsupportedFormat(key.to_string()))?;
        debug!(key, format = handler.format_name(), "dispatch");
        handler.read_xmp(source, options)
    }

    /// Open a file and decode it with the handler for its extension
    pub fn dump_path<P: AsRef<Path>>(&self, path: P, options: &XmpOptions) -> XmpResult<XmpPacket> {
        let path = path.as_ref();
        let key = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| XmpError::UnsupportedFormat(path.display().to_string()))?;

        let mut reader = BufReader::new(File::open(path)?);
        self.dump(&mut ByteSource::seekable(&mut reader), key, options)
    }

    /// Registered `(key, handler)` pairs in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Handler)> {
        self.entries.iter().map(|(key, handler)| (key.as_str(), handler))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
