//! Hash functions and encoding utilities
//!
//! SHA-256 is used for key fingerprints; base64 carries signatures inside
//! signature records.

pub mod base64;
pub mod sha;

pub use sha::{sha256, sha256_hex};
