//! Entry points the macro-execution engine calls before running a fragment.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::{EntryGuard, RequestContext, SignMacroGuard, SignScope};
use crate::engine::SignatureEngine;
use crate::record::SignatureStore;
use crate::reference::{DocumentReference, UserReference};

pub struct SignatureVerifier {
    engine: Arc<SignatureEngine>,
    records: Arc<dyn SignatureStore>,
    guest: UserReference,
}

impl SignatureVerifier {
    pub fn new(
        engine: Arc<SignatureEngine>,
        records: Arc<dyn SignatureStore>,
        guest: UserReference,
    ) -> Self {
        Self {
            engine,
            records,
            guest,
        }
    }

    pub fn engine(&self) -> &Arc<SignatureEngine> {
        &self.engine
    }

    pub fn records(&self) -> &Arc<dyn SignatureStore> {
        &self.records
    }

    /// Identity unsigned sign wrappers are demoted to
    pub fn guest(&self) -> &UserReference {
        &self.guest
    }

    /// Document holding the fragment: the current one unless `content_doc`
    /// names another, resolved against the current one
    fn script_document(
        &self,
        ctx: &RequestContext,
        content_doc: Option<&str>,
    ) -> Option<DocumentReference> {
        match content_doc.filter(|doc| !doc.is_empty()) {
            None => Some(ctx.document().clone()),
            Some(doc) => match DocumentReference::resolve(doc, ctx.document()) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    warn!(content_doc = doc, error = %e, "cannot resolve content document");
                    None
                }
            },
        }
    }

    /// Validated signer of fragment `id` of `document`. Read-only.
    pub fn signer_in(
        &self,
        document: &DocumentReference,
        id: &str,
        content: &str,
    ) -> Option<UserReference> {
        let record = match self.records.find(document, id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(id, document = %document, "fragment is not signed");
                return None;
            }
            Err(e) => {
                warn!(id, document = %document, error = %e, "cannot load signature record");
                return None;
            }
        };
        self.engine.verify(&record, content, document)
    }

    /// Signer of a fragment without touching the authorization context
    pub fn resolve_signer(
        &self,
        ctx: &RequestContext,
        id: &str,
        content: &str,
        content_doc: Option<&str>,
    ) -> Option<UserReference> {
        let document = self.script_document(ctx, content_doc)?;
        self.signer_in(&document, id, content)
    }

    /// Verify a script fragment and push its signer for the guard's lifetime.
    ///
    /// On failure the context is left untouched.
    pub fn verify_and_elevate_script(
        &self,
        ctx: &RequestContext,
        id: &str,
        content: &str,
        content_doc: Option<&str>,
    ) -> Option<EntryGuard> {
        let signer = self.resolve_signer(ctx, id, content, content_doc)?;
        Some(ctx.authorization().elevate(signer))
    }

    /// Verify a sign wrapper and enter `(document, signer)` for the guard's
    /// lifetime.
    pub fn verify_and_elevate_sign_macro(
        &self,
        ctx: &RequestContext,
        id: &str,
        content: &str,
        content_doc: Option<&str>,
    ) -> Option<SignMacroGuard> {
        let document = self.script_document(ctx, content_doc)?;
        let signer = self.signer_in(&document, id, content)?;
        Some(ctx.authorization().enter_sign_scope(document, signer))
    }

    /// Scope for rendering a sign wrapper's subtree.
    ///
    /// A wrapper without an id, without a record or with a signature that does
    /// not match runs its subtree as the guest user.
    pub fn enter_sign_block(
        &self,
        ctx: &RequestContext,
        id: Option<&str>,
        content: &str,
        source: Option<&str>,
    ) -> SignScope {
        if let Some(guard) =
            id.and_then(|id| self.verify_and_elevate_sign_macro(ctx, id, content, source))
        {
            return SignScope::Elevated(guard);
        }
        debug!(id = id.unwrap_or(""), guest = %self.guest, "sign block demoted");
        SignScope::Demoted(ctx.authorization().elevate(self.guest.clone()))
    }
}

#[cfg(test)]
mod tests {
    use signet_key::{KeyPairHandler, MemoryKeyStore};

    use super::*;
    use crate::record::{MemorySignatureStore, SignatureRecord};

    struct Fixture {
        verifier: SignatureVerifier,
        ctx: RequestContext,
    }

    fn alice() -> UserReference {
        DocumentReference::new("xwiki", "XWiki", "Alice")
    }

    fn guest() -> UserReference {
        DocumentReference::new("xwiki", "XWiki", "Guest")
    }

    fn sandbox() -> DocumentReference {
        DocumentReference::new("xwiki", "Sandbox", "WebHome")
    }

    fn fixture() -> Fixture {
        let keys = KeyPairHandler::with_key_bits(Arc::new(MemoryKeyStore::new()), 1024);
        let engine = Arc::new(SignatureEngine::new(Arc::new(keys)));
        let verifier = SignatureVerifier::new(engine, Arc::new(MemorySignatureStore::new()), guest());
        Fixture {
            verifier,
            ctx: RequestContext::new(sandbox(), Some(alice())),
        }
    }

    fn sign(fixture: &Fixture, document: &DocumentReference, id: &str, content: &str) {
        let engine = fixture.verifier.engine();
        let signature = engine.sign_or_generate(content, &alice(), "alice-key").unwrap();
        fixture
            .verifier
            .records()
            .save(
                document,
                SignatureRecord {
                    id: id.to_string(),
                    certificate: "alice-key".to_string(),
                    signature,
                    author: alice().to_string(),
                },
            )
            .unwrap();
    }

    #[test]
    fn test_script_elevation_scope() {
        let fixture = fixture();
        sign(&fixture, &sandbox(), "s1", "println 1");
        let auth = fixture.ctx.authorization();

        {
            let guard = fixture
                .verifier
                .verify_and_elevate_script(&fixture.ctx, "s1", "println 1", None)
                .unwrap();
            assert_eq!(guard.identity(), &alice());
            assert_eq!(auth.peek_entry(), Some(alice()));
        }
        assert!(!auth.has_entry());
    }

    #[test]
    fn test_failed_verification_leaves_context() {
        let fixture = fixture();
        sign(&fixture, &sandbox(), "s1", "println 1");
        let auth = fixture.ctx.authorization();

        assert!(fixture
            .verifier
            .verify_and_elevate_script(&fixture.ctx, "s1", "println 2", None)
            .is_none());
        assert!(fixture
            .verifier
            .verify_and_elevate_script(&fixture.ctx, "unknown", "println 1", None)
            .is_none());
        assert!(fixture
            .verifier
            .verify_and_elevate_sign_macro(&fixture.ctx, "s1", "println 2", Some(""))
            .is_none());
        assert_eq!(auth.entry_depth(), 0);
        assert_eq!(auth.sign_macro_depth(), 0);
    }

    #[test]
    fn test_content_document_resolution() {
        let fixture = fixture();
        let included = DocumentReference::new("xwiki", "Library", "Scripts");
        sign(&fixture, &included, "lib", "println 3");

        // the fragment is not in the current document
        assert!(fixture
            .verifier
            .resolve_signer(&fixture.ctx, "lib", "println 3", None)
            .is_none());
        assert_eq!(
            fixture
                .verifier
                .resolve_signer(&fixture.ctx, "lib", "println 3", Some("Library.Scripts")),
            Some(alice())
        );

        let guard = fixture
            .verifier
            .verify_and_elevate_sign_macro(&fixture.ctx, "lib", "println 3", Some("xwiki:Library.Scripts"))
            .unwrap();
        assert_eq!(guard.document(), &included);
    }

    #[test]
    fn test_sign_block_demotes_to_guest() {
        let fixture = fixture();
        sign(&fixture, &sandbox(), "w", "{{groovy}}1{{/groovy}}");
        let auth = fixture.ctx.authorization();

        let scope = fixture
            .verifier
            .enter_sign_block(&fixture.ctx, Some("w"), "{{groovy}}1{{/groovy}}", None);
        assert!(scope.is_elevated());
        assert_eq!(scope.identity(), &alice());
        assert!(auth.is_inside_sign_macro());
        drop(scope);
        assert!(!auth.is_inside_sign_macro());

        for id in [None, Some("w"), Some("missing")] {
            let scope = fixture
                .verifier
                .enter_sign_block(&fixture.ctx, id, "{{groovy}}2{{/groovy}}", None);
            assert!(!scope.is_elevated());
            assert_eq!(auth.peek_entry(), Some(guest()));
            assert!(!auth.is_inside_sign_macro());
            drop(scope);
            assert!(!auth.has_entry());
        }
    }
}
