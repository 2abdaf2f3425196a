//! The signed-scripts service: authoring operations plus access to the
//! verifier the renderer uses.

use std::collections::BTreeMap;
use std::sync::Arc;

use signet_key::{create_key_store, KeyPairHandler, KeyStore};
use tracing::info;

use crate::config::Settings;
use crate::context::RequestContext;
use crate::discovery::ScriptDiscovery;
use crate::document::{DocumentRepository, MemoryDocumentRepository};
use crate::engine::SignatureEngine;
use crate::error::{CoreError, Result};
use crate::macros::MacroRegistry;
use crate::parser::{ParserRegistry, XWIKI_2_1};
use crate::record::{FileSignatureStore, MemorySignatureStore, SignatureRecord, SignatureStore};
use crate::reference::{DocumentReference, UserReference};
use crate::verifier::SignatureVerifier;

pub struct SignedScripts {
    keys: Arc<KeyPairHandler>,
    engine: Arc<SignatureEngine>,
    verifier: Arc<SignatureVerifier>,
    discovery: ScriptDiscovery,
}

impl SignedScripts {
    pub fn builder(keys: Arc<KeyPairHandler>) -> SignedScriptsBuilder {
        SignedScriptsBuilder::new(keys)
    }

    /// Wire every component from configuration
    pub fn from_settings(settings: &Settings, documents: Arc<dyn DocumentRepository>) -> Result<Self> {
        let store: Arc<dyn KeyStore> = Arc::from(create_key_store(settings.key_store_config())?);
        let keys = Arc::new(KeyPairHandler::with_key_bits(store, settings.keys.bits));

        let records: Arc<dyn SignatureStore> = match &settings.signatures.path {
            Some(path) => Arc::new(FileSignatureStore::new(path.clone())?),
            None => Arc::new(MemorySignatureStore::new()),
        };

        Ok(Self::builder(keys)
            .records(records)
            .documents(documents)
            .macros(settings.macro_registry())
            .guest(settings.guest()?)
            .default_syntax(settings.discovery.default_syntax.clone())
            .build())
    }

    pub fn keys(&self) -> &Arc<KeyPairHandler> {
        &self.keys
    }

    pub fn engine(&self) -> &Arc<SignatureEngine> {
        &self.engine
    }

    pub fn verifier(&self) -> &Arc<SignatureVerifier> {
        &self.verifier
    }

    pub fn discovery(&self) -> &ScriptDiscovery {
        &self.discovery
    }

    pub fn records(&self) -> &Arc<dyn SignatureStore> {
        self.verifier.records()
    }

    pub fn generate_key_pair(&self, key_name: &str) -> Result<()> {
        Ok(self.keys.generate_key_pair(key_name)?)
    }

    /// Sign `content` as the current user with `key_name`, creating the key
    /// pair on first use
    pub fn compute_signature(
        &self,
        ctx: &RequestContext,
        content: &str,
        key_name: &str,
    ) -> Result<String> {
        let signer = current_user(ctx)?;
        self.engine.sign_or_generate(content, signer, key_name)
    }

    /// Sign fragment `id` of the current document and store the record.
    ///
    /// Nothing is stored when signing fails.
    pub fn sign_fragment(
        &self,
        ctx: &RequestContext,
        id: &str,
        content: &str,
        key_name: &str,
    ) -> Result<SignatureRecord> {
        let signer = current_user(ctx)?;
        let signature = self.engine.sign_or_generate(content, signer, key_name)?;
        let record = SignatureRecord {
            id: id.to_string(),
            certificate: key_name.to_string(),
            signature,
            author: signer.to_string(),
        };
        self.records().save(ctx.document(), record.clone())?;
        info!(id, document = %ctx.document(), signer = %signer, key = key_name, "signed fragment");
        Ok(record)
    }

    /// Fragments of the current document the current user still has to sign
    pub fn find_scripts(&self, ctx: &RequestContext) -> BTreeMap<String, String> {
        self.discovery.find_scripts(ctx)
    }
}

fn current_user(ctx: &RequestContext) -> Result<&UserReference> {
    ctx.user().ok_or_else(|| {
        CoreError::InvalidReference("signing requires an authenticated user".to_string())
    })
}

pub struct SignedScriptsBuilder {
    keys: Arc<KeyPairHandler>,
    records: Option<Arc<dyn SignatureStore>>,
    documents: Option<Arc<dyn DocumentRepository>>,
    macros: MacroRegistry,
    parsers: ParserRegistry,
    guest: UserReference,
    default_syntax: String,
}

impl SignedScriptsBuilder {
    pub fn new(keys: Arc<KeyPairHandler>) -> Self {
        Self {
            keys,
            records: None,
            documents: None,
            macros: MacroRegistry::default(),
            parsers: ParserRegistry::default(),
            guest: DocumentReference::new("xwiki", "XWiki", "Guest"),
            default_syntax: XWIKI_2_1.to_string(),
        }
    }

    pub fn records(mut self, records: Arc<dyn SignatureStore>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn documents(mut self, documents: Arc<dyn DocumentRepository>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn macros(mut self, macros: MacroRegistry) -> Self {
        self.macros = macros;
        self
    }

    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn guest(mut self, guest: UserReference) -> Self {
        self.guest = guest;
        self
    }

    pub fn default_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.default_syntax = syntax.into();
        self
    }

    pub fn build(self) -> SignedScripts {
        let records: Arc<dyn SignatureStore> = match self.records {
            Some(records) => records,
            None => Arc::new(MemorySignatureStore::new()),
        };
        let documents: Arc<dyn DocumentRepository> = match self.documents {
            Some(documents) => documents,
            None => Arc::new(MemoryDocumentRepository::new()),
        };

        let engine = Arc::new(SignatureEngine::new(Arc::clone(&self.keys)));
        let verifier = Arc::new(SignatureVerifier::new(
            Arc::clone(&engine),
            records,
            self.guest,
        ));
        let discovery = ScriptDiscovery::new(
            Arc::new(self.parsers),
            Arc::new(self.macros),
            Arc::clone(&verifier),
            documents,
            self.default_syntax,
        );

        SignedScripts {
            keys: self.keys,
            engine,
            verifier,
            discovery,
        }
    }
}

#[cfg(test)]
mod tests {
    use signet_key::MemoryKeyStore;

    use super::*;

    fn service() -> SignedScripts {
        let keys = KeyPairHandler::with_key_bits(Arc::new(MemoryKeyStore::new()), 1024);
        SignedScripts::builder(Arc::new(keys)).build()
    }

    fn alice() -> UserReference {
        DocumentReference::new("xwiki", "XWiki", "Alice")
    }

    fn sandbox() -> DocumentReference {
        DocumentReference::new("xwiki", "Sandbox", "WebHome")
    }

    #[test]
    fn test_sign_fragment_stores_record() {
        let service = service();
        let ctx = RequestContext::new(sandbox(), Some(alice()));

        let record = service.sign_fragment(&ctx, "s1", "println 1", "alice-key").unwrap();
        assert_eq!(record.author, "xwiki:XWiki.Alice");
        assert_eq!(record.certificate, "alice-key");
        assert_eq!(service.records().find(&sandbox(), "s1").unwrap(), Some(record));

        assert_eq!(
            service.verifier().resolve_signer(&ctx, "s1", "println 1", None),
            Some(alice())
        );
    }

    #[test]
    fn test_anonymous_cannot_sign() {
        let service = service();
        let ctx = RequestContext::new(sandbox(), None);
        assert!(matches!(
            service.sign_fragment(&ctx, "s1", "x", "k"),
            Err(CoreError::InvalidReference(_))
        ));
        assert!(service.records().list(&sandbox()).unwrap().is_empty());
    }

    #[test]
    fn test_failed_signing_stores_nothing() {
        let service = service();
        let ctx = RequestContext::new(sandbox(), Some(alice()));
        assert!(service.sign_fragment(&ctx, "s1", "x", "../escape").is_err());
        assert!(service.records().list(&sandbox()).unwrap().is_empty());
    }

    #[test]
    fn test_compute_signature_generates_lazily() {
        let service = service();
        let ctx = RequestContext::new(sandbox(), Some(alice()));
        assert!(!service.keys().has_private_key("k").unwrap());
        let first = service.compute_signature(&ctx, "x", "k").unwrap();
        assert!(service.keys().has_private_key("k").unwrap());
        // PKCS#1 v1.5 is deterministic for a fixed key
        assert_eq!(service.compute_signature(&ctx, "x", "k").unwrap(), first);
    }

    #[test]
    fn test_from_settings_memory() {
        let settings = Settings::from_toml_str("[keys]\nstore = \"memory\"\nbits = 1024\n").unwrap();
        let documents = Arc::new(MemoryDocumentRepository::new());
        documents
            .insert(sandbox(), "{{groovy id=a}}1{{/groovy}}", "xwiki/2.1")
            .unwrap();

        let service = SignedScripts::from_settings(&settings, documents).unwrap();
        let ctx = RequestContext::new(sandbox(), Some(alice()));
        assert_eq!(service.find_scripts(&ctx).len(), 1);

        service.sign_fragment(&ctx, "a", "1", "alice-key").unwrap();
        assert!(service.find_scripts(&ctx).is_empty());
        assert_eq!(service.verifier().guest(), &DocumentReference::new("xwiki", "XWiki", "Guest"));
    }
}
