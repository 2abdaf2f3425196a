mod rsa;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use self::rsa::{public_key_from_artifact, signing_key_from_artifacts};

// ============================================================================
// Key namespaces
// ============================================================================

/// The two disjoint namespaces key artifacts live in
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyHalf {
    Public,
    Private,
}

impl KeyHalf {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyHalf::Public => "public",
            KeyHalf::Private => "private",
        }
    }
}

impl fmt::Display for KeyHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that an identity names exactly one artifact per namespace.
///
/// Rejects empty names, path separators, `.`/`..` and control characters so
/// that no identity can reach another identity's files.
pub fn validate_identity(identity: &str) -> Result<()> {
    let invalid = identity.is_empty()
        || identity == "."
        || identity == ".."
        || identity
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(Error::invalid_identity(identity));
    }
    Ok(())
}

// ============================================================================
// Persisted artifact
// ============================================================================

/// One persisted key half: a big-integer modulus followed by a big-integer
/// exponent, both big-endian.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyArtifact {
    #[serde(with = "hex_bytes")]
    pub modulus: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub exponent: Vec<u8>,
}

impl KeyArtifact {
    pub fn new(modulus: Vec<u8>, exponent: Vec<u8>) -> Self {
        Self { modulus, exponent }
    }

    /// Serialized form written to disk
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(Error::serialization)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: Self = serde_json::from_slice(bytes).map_err(Error::deserialization)?;
        if artifact.modulus.is_empty() || artifact.exponent.is_empty() {
            return Err(Error::deserialization("empty modulus or exponent"));
        }
        Ok(artifact)
    }

    /// Modulus length in bits, ignoring leading zero bytes
    pub fn modulus_bits(&self) -> usize {
        let significant: &[u8] = match self.modulus.iter().position(|b| *b != 0) {
            Some(first) => &self.modulus[first..],
            None => return 0,
        };
        significant.len() * 8 - significant[0].leading_zeros() as usize
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Key pair record
// ============================================================================

/// Both halves of an identity's key material.
///
/// `private` is `None` for imported third-party keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPairRecord {
    pub identity: String,
    pub public: KeyArtifact,
    pub private: Option<KeyArtifact>,
}

impl KeyPairRecord {
    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        assert!(validate_identity("alice").is_ok());
        assert!(validate_identity("xwiki:XWiki.Admin").is_ok());
        assert!(validate_identity("").is_err());
        assert!(validate_identity("..").is_err());
        assert!(validate_identity("../private/alice").is_err());
        assert!(validate_identity("a\\b").is_err());
        assert!(validate_identity("line\nbreak").is_err());
    }

    #[test]
    fn test_artifact_layout() {
        let artifact = KeyArtifact::new(vec![0xc3, 0x01], vec![0x01, 0x00, 0x01]);
        let bytes = artifact.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();

        // modulus is written before the exponent
        let modulus_at = text.find("\"modulus\": \"c301\"").unwrap();
        let exponent_at = text.find("\"exponent\": \"010001\"").unwrap();
        assert!(modulus_at < exponent_at);

        assert_eq!(KeyArtifact::from_bytes(&bytes).unwrap(), artifact);
    }

    #[test]
    fn test_artifact_rejects_garbage() {
        assert!(KeyArtifact::from_bytes(b"not json").is_err());
        assert!(KeyArtifact::from_bytes(br#"{"modulus":"zz","exponent":"01"}"#).is_err());
        assert!(KeyArtifact::from_bytes(br#"{"modulus":"","exponent":"01"}"#).is_err());
    }

    #[test]
    fn test_modulus_bits() {
        assert_eq!(KeyArtifact::new(vec![0x00, 0x80, 0x00], vec![3]).modulus_bits(), 16);
        assert_eq!(KeyArtifact::new(vec![0x01], vec![3]).modulus_bits(), 1);
        assert_eq!(KeyArtifact::new(vec![0x00], vec![3]).modulus_bits(), 0);
    }
}
