//! # Signet - signed scripts for wiki documents
//!
//! Trusted authors sign script fragments embedded in user-editable pages; the
//! renderer verifies them and grants the signer's rights only while the
//! fragment executes.
//!
//! ## Crates
//!
//! - `signet_crypto` - RSA / SHA-256 primitives and base64
//! - `signet_key` - per-identity key pair storage
//! - `signet_core` - signing engine, discovery and authorization context
//! - `signet-cli` - command-line tool

// Re-export all sub-crates
pub use signet_core;
pub use signet_crypto;
pub use signet_key;
