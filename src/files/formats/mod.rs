//! File format handlers
//!
//! Each format handler locates the XMP packet inside one container format.
//! Handlers share no state and never depend on one another.

#[cfg(feature = "indd")]
pub mod indd;
#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "png")]
pub mod png;
#[cfg(feature = "psd")]
pub mod psd;
