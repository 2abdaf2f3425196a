//! Asymmetric cryptography algorithms
//!
//! Only RSA is needed: script signatures are RSA/SHA-256 with PKCS#1 v1.5
//! padding, and keys are persisted as raw (modulus, exponent) components.

pub mod rsa;

pub use self::rsa::Rsa;
