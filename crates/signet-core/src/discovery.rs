//! Finds the fragments of a document that the editor still has to sign.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::document::DocumentRepository;
use crate::macros::MacroRegistry;
use crate::parser::{MacroBlock, ParserRegistry};
use crate::reference::{DocumentReference, UserReference};
use crate::verifier::SignatureVerifier;

pub struct ScriptDiscovery {
    parsers: Arc<ParserRegistry>,
    macros: Arc<MacroRegistry>,
    verifier: Arc<SignatureVerifier>,
    documents: Arc<dyn DocumentRepository>,
    default_syntax: String,
}

impl ScriptDiscovery {
    pub fn new(
        parsers: Arc<ParserRegistry>,
        macros: Arc<MacroRegistry>,
        verifier: Arc<SignatureVerifier>,
        documents: Arc<dyn DocumentRepository>,
        default_syntax: impl Into<String>,
    ) -> Self {
        Self {
            parsers,
            macros,
            verifier,
            documents,
            default_syntax: default_syntax.into(),
        }
    }

    pub fn macros(&self) -> &MacroRegistry {
        &self.macros
    }

    /// Signable fragments of `content` not validly signed by `editor`,
    /// as `id -> body`.
    ///
    /// An unknown syntax or unparsable content yields an empty map. When an id
    /// occurs twice the last occurrence decides.
    pub fn find_signable_fragments(
        &self,
        content: &str,
        syntax: &str,
        document: &DocumentReference,
        editor: Option<&UserReference>,
    ) -> BTreeMap<String, String> {
        let mut found = BTreeMap::new();

        let Some(parser) = self.parsers.get(syntax) else {
            warn!(syntax, document = %document, "no parser for syntax");
            return found;
        };
        let xdom = match parser.parse(content) {
            Ok(xdom) => xdom,
            Err(e) => {
                warn!(document = %document, error = %e, "failed to parse document");
                return found;
            }
        };

        let mut candidates = Vec::new();
        self.collect(&xdom.blocks, &mut candidates);
        debug!(document = %document, candidates = candidates.len(), "signable fragments");

        for (id, block) in candidates {
            let body = block.body();
            let signer = self.verifier.signer_in(document, id, body);
            let signed_by_editor = match (signer.as_ref(), editor) {
                (Some(signer), Some(editor)) => signer == editor,
                _ => false,
            };
            if signed_by_editor {
                found.remove(id);
            } else {
                found.insert(id.to_string(), body.to_string());
            }
        }
        found
    }

    /// Signable macros carrying an id. Bodies of signable macros are not
    /// searched: script bodies are code and a sign wrapper's subtree is
    /// covered by the wrapper's signature.
    fn collect<'a>(&self, blocks: &'a [MacroBlock], out: &mut Vec<(&'a str, &'a MacroBlock)>) {
        for block in blocks {
            if self.macros.is_signable(&block.name) {
                if let Some(id) = block.id() {
                    out.push((id, block));
                }
            } else {
                self.collect(&block.children, out);
            }
        }
    }

    /// Run discovery on the request's current document with the current user
    /// as editor
    pub fn find_scripts(&self, ctx: &RequestContext) -> BTreeMap<String, String> {
        let document = ctx.document();
        match self.documents.load(document) {
            Ok(Some(doc)) => {
                let syntax = if doc.syntax.is_empty() {
                    self.default_syntax.as_str()
                } else {
                    doc.syntax.as_str()
                };
                self.find_signable_fragments(&doc.content, syntax, document, ctx.user())
            }
            Ok(None) => {
                warn!(document = %document, "document not found");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(document = %document, error = %e, "failed to load document");
                BTreeMap::new()
            }
        }
    }
}
