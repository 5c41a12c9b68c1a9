//! # xmpdump
//!
//! Extract the embedded XMP packet from InDesign, PDF, PNG and Photoshop
//! files without parsing the rest of the container.
//!
//! Every format handler shares one contract: a borrowed [`ByteSource`] goes
//! in, the packet text or a typed [`XmpError`] comes out. A
//! [`HandlerRegistry`] maps lowercase file extensions to handlers and
//! dispatches on them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use xmpdump::{ByteSource, HandlerRegistry, XmpOptions};
//! use std::fs::File;
//!
//! let registry = HandlerRegistry::new();
//! let mut file = File::open("brochure.indd")?;
//! let packet = registry.dump(
//!     &mut ByteSource::seekable(&mut file),
//!     "indd",
//!     &XmpOptions::default(),
//! )?;
//! println!("{}", packet);
//! # Ok::<(), xmpdump::XmpError>(())
//! ```
//!
//! Forward-only streams work too, for the formats that do not need random
//! access:
//!
//! ```rust,no_run
//! use xmpdump::{dump_xmp, ByteSource};
//!
//! let mut stdin = std::io::stdin().lock();
//! let packet = dump_xmp(&mut ByteSource::sequential(&mut stdin), "png")?;
//! # Ok::<(), xmpdump::XmpError>(())
//! ```
//!
//! ## Features
//!
//! - `indd`, `pdf`, `png`, `psd`: individual format handlers
//! - `full-formats`: all of the above
//! - `cli`: the `xmpdump` command-line tool

pub mod core;
pub mod files;

pub use crate::core::{XmpError, XmpPacket, XmpResult, XPACKET_BEGIN, XPACKET_END};
pub use files::{
    ByteSource, DelegatedHandler, DocumentDecoder, FileHandler, Handler, HandlerRegistry,
    HandlerRegistryBuilder, XmpDocument, XmpOptions,
};

/// Decode `source` as format `key` with the default handlers and options
///
/// Builds a fresh default registry on every call; keep a
/// [`HandlerRegistry`] around when dispatching repeatedly.
pub fn dump_xmp(source: &mut ByteSource<'_>, key: &str) -> XmpResult<XmpPacket> {
    HandlerRegistry::new().dump(source, key, &XmpOptions::default())
}
