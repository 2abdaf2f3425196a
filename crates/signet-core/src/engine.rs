//! Signature generation and verification over the canonical message.

use std::sync::Arc;

use signet_crypto::{base64, verify_signature};
use signet_key::KeyPairHandler;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::record::SignatureRecord;
use crate::reference::{DocumentReference, UserReference};

/// Separator between signer and content in the canonical message
pub const SEPARATOR: &str = " : ";

/// Exact bytes that get signed: `signer : content` in UTF-8
pub fn canonical_message(signer: &UserReference, content: &str) -> Vec<u8> {
    format!("{}{}{}", signer, SEPARATOR, content).into_bytes()
}

pub struct SignatureEngine {
    keys: Arc<KeyPairHandler>,
}

impl SignatureEngine {
    pub fn new(keys: Arc<KeyPairHandler>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &Arc<KeyPairHandler> {
        &self.keys
    }

    /// Sign `content` as `signer` with the private key named `key_name`.
    ///
    /// Returns the signature in padded standard base64.
    pub fn sign(&self, content: &str, signer: &UserReference, key_name: &str) -> Result<String> {
        let key = self.keys.private_key(key_name)?;
        let signature = key
            .sign(&canonical_message(signer, content))
            .map_err(|e| CoreError::KeyUnavailable(format!("signing with {:?} failed: {}", key_name, e)))?;
        debug!(signer = %signer, key = key_name, "signed content");
        Ok(base64::encode(signature))
    }

    /// Like [`sign`](Self::sign), generating the key pair first when
    /// `key_name` has none yet
    pub fn sign_or_generate(
        &self,
        content: &str,
        signer: &UserReference,
        key_name: &str,
    ) -> Result<String> {
        self.keys.ensure_key_pair(key_name).map_err(|e| match e {
            signet_key::Error::GenerationError(msg) => CoreError::KeyGeneration(format!(
                "Could not create a signing key named {:?}: {}",
                key_name, msg
            )),
            other => other.into(),
        })?;
        self.sign(content, signer, key_name)
    }

    /// Check `record` against `content`, returning the precise failure.
    ///
    /// The record's author is resolved against `base`, the document holding
    /// the fragment.
    pub fn check(
        &self,
        record: &SignatureRecord,
        content: &str,
        base: &DocumentReference,
    ) -> Result<UserReference> {
        let signer = DocumentReference::resolve(&record.author, base)?;
        let signature = base64::decode(&record.signature).map_err(|e| {
            CoreError::SignatureInvalid(format!("signature of {:?} is not base64: {}", record.id, e))
        })?;
        let public_key = self.keys.public_key(&record.certificate)?;

        if !verify_signature(&public_key, &canonical_message(&signer, content), &signature) {
            warn!(id = %record.id, signer = %signer, key = %record.certificate, "signature does not match content");
            return Err(CoreError::SignatureInvalid(format!(
                "signature of {:?} does not match its content",
                record.id
            )));
        }
        Ok(signer)
    }

    /// Fail-closed verification: the signer, or `None` on any failure
    pub fn verify(
        &self,
        record: &SignatureRecord,
        content: &str,
        base: &DocumentReference,
    ) -> Option<UserReference> {
        match self.check(record, content, base) {
            Ok(signer) => Some(signer),
            Err(e) => {
                debug!(id = %record.id, error = %e, "verification failed");
                None
            }
        }
    }
}
