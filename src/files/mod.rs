//! File format support for XMP extraction
//!
//! This module provides the byte-source abstraction, the handler contract,
//! the format handlers and the registry dispatching between them. All
//! implementations are pure Rust over `std::io` traits.

pub mod delegate;
pub mod formats;
pub mod handler;
pub mod registry;
pub mod source;

pub use delegate::{DelegatedHandler, DocumentDecoder, XmpDocument};
#[cfg(feature = "indd")]
pub use formats::indd::InddHandler;
#[cfg(feature = "pdf")]
pub use formats::pdf::PdfHandler;
#[cfg(feature = "png")]
pub use formats::png::PngHandler;
#[cfg(feature = "psd")]
pub use formats::psd::{PsdDecoder, PsdDocument};
pub use handler::FileHandler;
pub use handler::XmpOptions;
pub use registry::{Handler, HandlerRegistry, HandlerRegistryBuilder};
pub use source::ByteSource;
