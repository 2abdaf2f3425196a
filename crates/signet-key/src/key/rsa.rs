use signet_crypto::{public_key_from_components, Rsa, RsaPublicKey, DEFAULT_PUBLIC_EXPONENT};

use super::{validate_identity, KeyArtifact, KeyPairRecord};
use crate::error::{Error, Result};

impl KeyPairRecord {
    /// Generate a fresh RSA key pair for `identity`
    pub fn generate(identity: &str, bits: usize) -> Result<Self> {
        validate_identity(identity)?;
        let key = Rsa::generate(bits).map_err(|e| {
            Error::GenerationError(format!("RSA-{} generation failed: {}", bits, e))
        })?;
        Ok(Self {
            identity: identity.to_string(),
            public: KeyArtifact::new(key.modulus(), key.public_exponent()),
            private: Some(KeyArtifact::new(key.modulus(), key.private_exponent())),
        })
    }
}

/// Rebuild an RSA public key from a public artifact
pub fn public_key_from_artifact(artifact: &KeyArtifact) -> Result<RsaPublicKey> {
    public_key_from_components(&artifact.modulus, &artifact.exponent).map_err(Error::CryptoError)
}

/// Rebuild a signing key from a private artifact.
///
/// The public exponent comes from the matching public artifact; when that is
/// missing the generator's default (65537) is assumed.
pub fn signing_key_from_artifacts(
    private: &KeyArtifact,
    public: Option<&KeyArtifact>,
) -> Result<Rsa> {
    let public_exponent = match public {
        Some(public) if public.modulus != private.modulus => {
            return Err(Error::EncodingError(
                "public and private key halves have different moduli".to_string(),
            ));
        }
        Some(public) => public.exponent.clone(),
        None => DEFAULT_PUBLIC_EXPONENT.to_be_bytes().to_vec(),
    };
    Rsa::from_components(&private.modulus, &public_exponent, &private.exponent)
        .map_err(Error::CryptoError)
}

#[cfg(test)]
mod tests {
    use signet_crypto::verify_signature;

    use super::*;

    #[test]
    fn test_generated_record_has_both_halves() {
        let record = KeyPairRecord::generate("alice", 1024).unwrap();
        assert_eq!(record.identity, "alice");
        assert!(record.has_private());
        assert_eq!(record.public.modulus_bits(), 1024);
        assert_eq!(record.public.exponent, vec![0x01, 0x00, 0x01]);
        assert_eq!(record.private.as_ref().unwrap().modulus, record.public.modulus);
    }

    #[test]
    fn test_generate_rejects_bad_identity() {
        assert!(matches!(
            KeyPairRecord::generate("../escape", 1024),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_artifacts_sign_and_verify() {
        let record = KeyPairRecord::generate("alice", 1024).unwrap();
        let private = record.private.as_ref().unwrap();

        let signing_key = signing_key_from_artifacts(private, Some(&record.public)).unwrap();
        let public_key = public_key_from_artifact(&record.public).unwrap();

        let signature = signing_key.sign(b"payload").unwrap();
        assert!(verify_signature(&public_key, b"payload", &signature));
    }

    #[test]
    fn test_private_half_alone_uses_default_exponent() {
        let record = KeyPairRecord::generate("alice", 1024).unwrap();
        let private = record.private.as_ref().unwrap();

        let signing_key = signing_key_from_artifacts(private, None).unwrap();
        let public_key = public_key_from_artifact(&record.public).unwrap();
        let signature = signing_key.sign(b"payload").unwrap();
        assert!(verify_signature(&public_key, b"payload", &signature));
    }

    #[test]
    fn test_mismatched_halves_rejected() {
        let first = KeyPairRecord::generate("alice", 1024).unwrap();
        let second = KeyPairRecord::generate("alice", 1024).unwrap();
        let result = signing_key_from_artifacts(first.private.as_ref().unwrap(), Some(&second.public));
        assert!(matches!(result, Err(Error::EncodingError(_))));
    }
}
