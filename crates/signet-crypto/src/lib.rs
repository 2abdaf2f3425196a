//! Signet Cryptography Library
//!
//! This library provides the cryptographic primitives used to sign and verify
//! scripts embedded in wiki documents: RSA key generation, RSA/SHA-256
//! (PKCS#1 v1.5) signatures, raw key components and standard base64.

pub mod error;

// Cryptographic algorithm modules
pub mod asymmetric;
pub mod hash;

// Re-export commonly used types for convenience
pub use asymmetric::rsa::{
    public_key_from_components, verify_signature, Rsa, DEFAULT_KEY_BITS, DEFAULT_PUBLIC_EXPONENT,
};
pub use error::{Error, Result};
pub use hash::{base64, sha256, sha256_hex};
pub use rsa::{BigUint, RsaPublicKey};
