//! Tests for registry dispatch
//!
//! These tests verify key lookup, content detection and path-based
//! dispatch across the registered handlers.

#[path = "fixtures/mod.rs"]
mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xmpdump::files::PngHandler;
use xmpdump::{
    ByteSource, DelegatedHandler, DocumentDecoder, FileHandler, HandlerRegistry, XmpDocument,
    XmpError, XmpOptions, XmpResult,
};

/// Records every decode call and fails it
#[derive(Default)]
struct RecordingDecoder {
    calls: AtomicUsize,
}

impl DocumentDecoder for RecordingDecoder {
    fn decode(&self, _source: &mut ByteSource<'_>) -> XmpResult<Box<dyn XmpDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(XmpError::InvalidContainer("recording decoder".to_string()))
    }

    fn can_handle(&self, _header: &[u8]) -> bool {
        true
    }
}

#[test]
fn dispatch_invokes_only_the_selected_decoder() {
    let pdf = Arc::new(RecordingDecoder::default());
    let registry = HandlerRegistry::builder()
        .register("pdf", DelegatedHandler::from_shared("PDF", &["pdf"], pdf.clone()))
        .register("png", PngHandler)
        .build();

    let data = png_with_xmp(XMP);
    let mut bytes = data.as_slice();
    let packet = registry
        .dump(&mut ByteSource::sequential(&mut bytes), "png", &XmpOptions::default())
        .unwrap();

    assert_eq!(packet.as_str(), XMP);
    assert_eq!(pdf.calls.load(Ordering::SeqCst), 0);

    let mut bytes = data.as_slice();
    let result = registry.dump(&mut ByteSource::sequential(&mut bytes), "pdf", &XmpOptions::default());
    assert!(matches!(result, Err(XmpError::InvalidContainer(_))));
    assert_eq!(pdf.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unknown_key_is_unsupported_format() {
    let data = png_with_xmp(XMP);
    let mut bytes = data.as_slice();
    let result = xmpdump::dump_xmp(&mut ByteSource::sequential(&mut bytes), "gif");
    assert!(matches!(result, Err(XmpError::UnsupportedFormat(_))));
}

#[test]
fn keys_are_case_insensitive() {
    let data = png_with_xmp(XMP);
    let mut bytes = data.as_slice();
    let packet = xmpdump::dump_xmp(&mut ByteSource::sequential(&mut bytes), "PNG").unwrap();
    assert_eq!(packet.as_str(), XMP);
}

#[test]
fn duplicate_registration_keeps_first() {
    let shadowed = Arc::new(RecordingDecoder::default());
    let registry = HandlerRegistry::builder()
        .handler(PngHandler)
        .register("png", DelegatedHandler::from_shared("Other", &["png"], shadowed.clone()))
        .build();

    assert_eq!(registry.find_by_extension("png").unwrap().format_name(), "PNG");

    let data = png_with_xmp(XMP);
    let mut bytes = data.as_slice();
    registry
        .dump(&mut ByteSource::sequential(&mut bytes), "png", &XmpOptions::default())
        .unwrap();
    assert_eq!(shadowed.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn detection_finds_each_builtin_format() {
    let registry = HandlerRegistry::new();
    let cases = [
        (indd_with_xmp(XMP), "InDesign"),
        (pdf_with_xmp(XMP, "\n"), "PDF"),
        (png_with_xmp(XMP), "PNG"),
        (psd_with_xmp(XMP), "PSD"),
    ];

    for (data, expected) in cases {
        let mut cursor = Cursor::new(data);
        let handler = registry.find_by_detection(&mut cursor).unwrap().unwrap();
        assert_eq!(handler.format_name(), expected);
        assert_eq!(cursor.position(), 0);

        let packet = handler
            .read_xmp(&mut ByteSource::seekable(&mut cursor), &XmpOptions::default())
            .unwrap();
        assert!(packet.as_str().starts_with("<?xpacket begin="));
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_temp(suffix: &str, data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn dump_path_uses_extension() {
        let registry = HandlerRegistry::new();

        let file = write_temp(".indd", &indd_with_xmp(XMP));
        let packet = registry.dump_path(file.path(), &XmpOptions::default()).unwrap();
        assert_eq!(packet.as_str(), XMP);

        let file = write_temp(".PDF", &pdf_with_xmp(XMP, "\r\n"));
        let packet = registry.dump_path(file.path(), &XmpOptions::default()).unwrap();
        assert_eq!(packet.as_str(), xmp_without_trailer());
    }

    #[test]
    fn dump_path_without_extension() {
        let registry = HandlerRegistry::new();
        let file = write_temp("", &png_with_xmp(XMP));
        let result = registry.dump_path(file.path(), &XmpOptions::default());
        assert!(matches!(result, Err(XmpError::UnsupportedFormat(_))));
    }

    #[test]
    fn dump_path_missing_file() {
        let registry = HandlerRegistry::new();
        let result = registry.dump_path("doesnotexist.png", &XmpOptions::default());
        assert!(matches!(result, Err(XmpError::IoError(_))));
    }
}
