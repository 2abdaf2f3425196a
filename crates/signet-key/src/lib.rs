//! Signet key management
//!
//! Signing identities own an RSA key pair persisted as two independent
//! artifacts: a public half `(modulus, public exponent)` and a private half
//! `(modulus, private exponent)`. Imported third-party keys only have the
//! public half.
//!
//! ```
//! use std::sync::Arc;
//! use signet_key::{KeyPairHandler, MemoryKeyStore};
//!
//! let handler = KeyPairHandler::with_key_bits(Arc::new(MemoryKeyStore::new()), 1024);
//! handler.generate_key_pair("alice").unwrap();
//! assert!(handler.public_key("alice").is_ok());
//! assert!(handler.public_key("bob").is_err());
//! ```

pub mod error;
pub mod handler;
pub mod key;
pub mod store;

pub use error::{Error, Result};
pub use handler::KeyPairHandler;
pub use key::{validate_identity, KeyArtifact, KeyHalf, KeyPairRecord};
pub use store::{create_key_store, FileKeyStore, KeyStore, KeyStoreConfig, MemoryKeyStore};
