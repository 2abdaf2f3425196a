//! Read access to document content.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CoreError, Result};
use crate::reference::DocumentReference;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    /// Syntax id of `content`
    pub syntax: String,
}

pub trait DocumentRepository: Send + Sync {
    /// `Ok(None)` when the document does not exist
    fn load(&self, reference: &DocumentReference) -> Result<Option<Document>>;
}

#[derive(Default)]
pub struct MemoryDocumentRepository {
    documents: RwLock<HashMap<DocumentReference, Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        reference: DocumentReference,
        content: impl Into<String>,
        syntax: impl Into<String>,
    ) -> Result<()> {
        let mut documents = self.documents.write().map_err(|_| lock_error())?;
        documents.insert(
            reference,
            Document {
                content: content.into(),
                syntax: syntax.into(),
            },
        );
        Ok(())
    }

    pub fn remove(&self, reference: &DocumentReference) -> Result<Option<Document>> {
        let mut documents = self.documents.write().map_err(|_| lock_error())?;
        Ok(documents.remove(reference))
    }
}

fn lock_error() -> CoreError {
    CoreError::StorageFailure("document repository lock poisoned".to_string())
}

impl DocumentRepository for MemoryDocumentRepository {
    fn load(&self, reference: &DocumentReference) -> Result<Option<Document>> {
        let documents = self.documents.read().map_err(|_| lock_error())?;
        Ok(documents.get(reference).cloned())
    }
}
