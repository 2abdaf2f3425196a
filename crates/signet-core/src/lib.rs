//! Signet core
//!
//! Trusted authors sign script fragments embedded in wiki documents. At render
//! time each fragment's signature is checked and, when valid, the fragment runs
//! with its signer's rights for exactly as long as the returned guard lives.
//!
//! ```
//! use std::sync::Arc;
//! use signet_core::{DocumentReference, RequestContext, SignedScripts};
//! use signet_key::{KeyPairHandler, MemoryKeyStore};
//!
//! let keys = KeyPairHandler::with_key_bits(Arc::new(MemoryKeyStore::new()), 1024);
//! let service = SignedScripts::builder(Arc::new(keys)).build();
//!
//! let alice = DocumentReference::new("xwiki", "XWiki", "Alice");
//! let page = DocumentReference::new("xwiki", "Sandbox", "WebHome");
//! let ctx = RequestContext::new(page, Some(alice.clone()));
//!
//! service.sign_fragment(&ctx, "s1", "println 1", "alice-key").unwrap();
//!
//! let guard = service
//!     .verifier()
//!     .verify_and_elevate_script(&ctx, "s1", "println 1", None)
//!     .unwrap();
//! assert_eq!(ctx.authorization().peek_entry(), Some(alice));
//! drop(guard);
//! assert!(!ctx.authorization().has_entry());
//! ```

pub mod config;
pub mod context;
pub mod discovery;
pub mod document;
pub mod engine;
pub mod error;
pub mod macros;
pub mod parser;
pub mod record;
pub mod reference;
pub mod service;
pub mod verifier;

// Re-export commonly used types
pub use config::Settings;
pub use context::{
    AuthorizationContext, EntryGuard, RequestContext, SignMacroEntry, SignMacroGuard, SignScope,
};
pub use discovery::ScriptDiscovery;
pub use document::{Document, DocumentRepository, MemoryDocumentRepository};
pub use engine::{canonical_message, SignatureEngine};
pub use error::{CoreError, Result};
pub use macros::{MacroDescriptor, MacroKind, MacroRegistry};
pub use parser::{MacroBlock, Parser, ParserRegistry, WikiParser, Xdom};
pub use record::{FileSignatureStore, MemorySignatureStore, SignatureRecord, SignatureStore};
pub use reference::{DocumentReference, UserReference};
pub use service::{SignedScripts, SignedScriptsBuilder};
pub use verifier::SignatureVerifier;
