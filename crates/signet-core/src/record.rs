//! Persisted signature records.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::reference::DocumentReference;

/// Signature attached to one fragment of a document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Fragment id, unique within the document
    pub id: String,
    /// Key name whose public half verifies `signature`
    pub certificate: String,
    /// Standard padded base64
    pub signature: String,
    /// Serialized signer reference
    pub author: String,
}

/// Storage for signature records, keyed by document then fragment id.
///
/// Saving a record whose id already exists in the document replaces it.
pub trait SignatureStore: Send + Sync {
    fn find(&self, document: &DocumentReference, id: &str) -> Result<Option<SignatureRecord>>;

    fn save(&self, document: &DocumentReference, record: SignatureRecord) -> Result<()>;

    /// Returns whether a record was removed
    fn remove(&self, document: &DocumentReference, id: &str) -> Result<bool>;

    /// All records of a document ordered by id
    fn list(&self, document: &DocumentReference) -> Result<Vec<SignatureRecord>>;
}

fn lock_error() -> CoreError {
    CoreError::StorageFailure("signature store lock poisoned".to_string())
}

// ============================================================================
// In-memory store
// ============================================================================

type RecordMap = HashMap<DocumentReference, BTreeMap<String, SignatureRecord>>;

#[derive(Default)]
pub struct MemorySignatureStore {
    records: RwLock<RecordMap>,
}

impl MemorySignatureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignatureStore for MemorySignatureStore {
    fn find(&self, document: &DocumentReference, id: &str) -> Result<Option<SignatureRecord>> {
        let records = self.records.read().map_err(|_| lock_error())?;
        Ok(records.get(document).and_then(|doc| doc.get(id)).cloned())
    }

    fn save(&self, document: &DocumentReference, record: SignatureRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| lock_error())?;
        records
            .entry(document.clone())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    fn remove(&self, document: &DocumentReference, id: &str) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| lock_error())?;
        Ok(records
            .get_mut(document)
            .map(|doc| doc.remove(id).is_some())
            .unwrap_or(false))
    }

    fn list(&self, document: &DocumentReference) -> Result<Vec<SignatureRecord>> {
        let records = self.records.read().map_err(|_| lock_error())?;
        Ok(records
            .get(document)
            .map(|doc| doc.values().cloned().collect())
            .unwrap_or_default())
    }
}

// ============================================================================
// File store
// ============================================================================

/// On-disk form of one document's records
#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecords {
    document: String,
    records: Vec<SignatureRecord>,
}

/// One JSON file per document under `root`, named after the SHA-256 of the
/// serialized document reference.
///
/// Files are replaced atomically. A file that no longer decodes is moved
/// aside to `<name>.json.corrupt` by the next save for its document.
pub struct FileSignatureStore {
    root: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl FileSignatureStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.exists() && !root.is_dir() {
            return Err(CoreError::StorageFailure(format!(
                "signature store path {} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, document: &DocumentReference) -> PathBuf {
        let name = signet_crypto::sha256_hex(document.to_string().as_bytes());
        self.root.join(format!("{}.json", name))
    }

    fn read(&self, document: &DocumentReference) -> Result<Option<Vec<u8>>> {
        let path = self.document_path(document);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&path)?))
    }

    fn load(&self, document: &DocumentReference) -> Result<BTreeMap<String, SignatureRecord>> {
        match self.read(document)? {
            Some(bytes) => decode_records(document, &bytes),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Like `load`, but an undecodable file is moved aside instead of
    /// blocking every later save for the document
    fn load_for_update(
        &self,
        document: &DocumentReference,
    ) -> Result<BTreeMap<String, SignatureRecord>> {
        let Some(bytes) = self.read(document)? else {
            return Ok(BTreeMap::new());
        };
        match decode_records(document, &bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                let path = self.document_path(document);
                let aside = path.with_extension("json.corrupt");
                std::fs::rename(&path, &aside)?;
                warn!(
                    document = %document,
                    path = %aside.display(),
                    error = %e,
                    "moved unreadable signature records aside"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn store(
        &self,
        document: &DocumentReference,
        records: BTreeMap<String, SignatureRecord>,
    ) -> Result<()> {
        let path = self.document_path(document);
        if records.is_empty() {
            if path.is_file() {
                std::fs::remove_file(&path)?;
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.root)?;
        let stored = DocumentRecords {
            document: document.to_string(),
            records: records.into_values().collect(),
        };
        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(&serde_json::to_vec_pretty(&stored)?)?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| CoreError::from(e.error))?;
        debug!(document = %document, path = %path.display(), "wrote signature records");
        Ok(())
    }
}

fn decode_records(
    document: &DocumentReference,
    bytes: &[u8],
) -> Result<BTreeMap<String, SignatureRecord>> {
    let stored: DocumentRecords = serde_json::from_slice(bytes)?;
    if stored.document != document.to_string() {
        return Err(CoreError::StorageFailure(format!(
            "record file of {} holds records of {}",
            document, stored.document
        )));
    }
    Ok(stored
        .records
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect())
}

impl SignatureStore for FileSignatureStore {
    fn find(&self, document: &DocumentReference, id: &str) -> Result<Option<SignatureRecord>> {
        let _guard = self.lock.read().map_err(|_| lock_error())?;
        Ok(self.load(document)?.remove(id))
    }

    fn save(&self, document: &DocumentReference, record: SignatureRecord) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| lock_error())?;
        let mut records = self.load_for_update(document)?;
        records.insert(record.id.clone(), record);
        self.store(document, records)
    }

    fn remove(&self, document: &DocumentReference, id: &str) -> Result<bool> {
        let _guard = self.lock.write().map_err(|_| lock_error())?;
        let mut records = self.load(document)?;
        if records.remove(id).is_none() {
            return Ok(false);
        }
        self.store(document, records)?;
        Ok(true)
    }

    fn list(&self, document: &DocumentReference) -> Result<Vec<SignatureRecord>> {
        let _guard = self.lock.read().map_err(|_| lock_error())?;
        Ok(self.load(document)?.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn record(id: &str, signature: &str) -> SignatureRecord {
        SignatureRecord {
            id: id.to_string(),
            certificate: "alice-key".to_string(),
            signature: signature.to_string(),
            author: "xwiki:XWiki.Alice".to_string(),
        }
    }

    fn sandbox() -> DocumentReference {
        DocumentReference::new("xwiki", "Sandbox", "WebHome")
    }

    fn exercise(store: &dyn SignatureStore) {
        let doc = sandbox();
        let other = DocumentReference::new("xwiki", "Main", "WebHome");

        assert_eq!(store.find(&doc, "a").unwrap(), None);

        store.save(&doc, record("b", "YmI=")).unwrap();
        store.save(&doc, record("a", "YWE=")).unwrap();
        store.save(&doc, record("a", "QUE=")).unwrap();

        assert_eq!(store.find(&doc, "a").unwrap(), Some(record("a", "QUE=")));
        assert_eq!(store.find(&other, "a").unwrap(), None);

        let ids: Vec<_> = store.list(&doc).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.remove(&doc, "a").unwrap());
        assert!(!store.remove(&doc, "a").unwrap());
        assert_eq!(store.list(&doc).unwrap(), vec![record("b", "YmI=")]);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemorySignatureStore::new());
    }

    #[test]
    fn test_file_store() {
        let temp_dir = TempDir::new().unwrap();
        exercise(&FileSignatureStore::new(temp_dir.path().join("records")).unwrap());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let doc = sandbox();
        FileSignatureStore::new(temp_dir.path())
            .unwrap()
            .save(&doc, record("a", "YWE="))
            .unwrap();

        let reopened = FileSignatureStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.find(&doc, "a").unwrap(), Some(record("a", "YWE=")));

        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_file_store_removes_empty_documents() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSignatureStore::new(temp_dir.path()).unwrap();
        let doc = sandbox();
        store.save(&doc, record("a", "YWE=")).unwrap();
        store.remove(&doc, "a").unwrap();
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSignatureStore::new(temp_dir.path()).unwrap();
        let doc = sandbox();
        std::fs::write(store.document_path(&doc), b"{ nope").unwrap();
        assert!(matches!(store.find(&doc, "a"), Err(CoreError::StorageFailure(_))));
    }

    #[test]
    fn test_save_recovers_from_torn_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSignatureStore::new(temp_dir.path()).unwrap();
        let doc = sandbox();
        store.save(&doc, record("a", "YWE=")).unwrap();

        let path = store.document_path(&doc);
        std::fs::write(&path, br#"{"document": "xwiki:Sandbox.WebHome", "reco"#).unwrap();

        store.save(&doc, record("b", "YmI=")).unwrap();
        assert_eq!(store.list(&doc).unwrap(), vec![record("b", "YmI=")]);
        assert!(path.with_extension("json.corrupt").is_file());
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSignatureStore::new(temp_dir.path()).unwrap();
        let doc = sandbox();
        for id in ["a", "b", "c"] {
            store.save(&doc, record(id, "YWE=")).unwrap();
        }
        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(format!(
            "{}.json",
            signet_crypto::sha256_hex(doc.to_string().as_bytes())
        ))]);
    }
}
