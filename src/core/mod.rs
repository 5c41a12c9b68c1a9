//! XMP Core module
//!
//! This module contains the types shared by every format decoder: the
//! error taxonomy and the extracted packet value.

pub mod error;
pub mod packet;

pub use error::{XmpError, XmpResult};
pub use packet::{XmpPacket, XPACKET_BEGIN, XPACKET_END};
