use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use super::KeyStore;
use crate::error::{Error, Result};
use crate::key::{validate_identity, KeyArtifact, KeyHalf};

/// File-based key store
///
/// Layout: `<root>/public/<identity>` and `<root>/private/<identity>`, one
/// artifact per file.
pub struct FileKeyStore {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl FileKeyStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if path.exists() && !path.is_dir() {
            return Err(Error::Other(format!(
                "key store path {} is not a directory",
                path.display()
            )));
        }
        Ok(Self {
            path,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.path
    }

    fn namespace_dir(&self, half: KeyHalf) -> PathBuf {
        self.path.join(half.as_str())
    }

    /// Path of one artifact; the identity is validated first
    fn artifact_path(&self, identity: &str, half: KeyHalf) -> Result<PathBuf> {
        validate_identity(identity)?;
        Ok(self.namespace_dir(half).join(identity))
    }
}

impl KeyStore for FileKeyStore {
    fn write(&self, identity: &str, half: KeyHalf, artifact: &KeyArtifact) -> Result<()> {
        let artifact_path = self.artifact_path(identity, half)?;
        let bytes = artifact.to_bytes()?;

        let _guard = self
            .lock
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;

        std::fs::create_dir_all(self.namespace_dir(half))?;
        std::fs::write(&artifact_path, bytes)?;

        #[cfg(unix)]
        if half == KeyHalf::Private {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&artifact_path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn read(&self, identity: &str, half: KeyHalf) -> Result<Option<KeyArtifact>> {
        let artifact_path = self.artifact_path(identity, half)?;
        let _guard = self
            .lock
            .read()
            .map_err(|_| Error::lock_error("Failed to acquire read lock"))?;

        if !artifact_path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&artifact_path)?;
        KeyArtifact::from_bytes(&bytes).map(Some)
    }

    fn exists(&self, identity: &str, half: KeyHalf) -> Result<bool> {
        let artifact_path = self.artifact_path(identity, half)?;
        let _guard = self
            .lock
            .read()
            .map_err(|_| Error::lock_error("Failed to acquire read lock"))?;
        Ok(artifact_path.is_file())
    }

    fn delete(&self, identity: &str) -> Result<()> {
        let public_path = self.artifact_path(identity, KeyHalf::Public)?;
        let private_path = self.artifact_path(identity, KeyHalf::Private)?;

        let _guard = self
            .lock
            .write()
            .map_err(|_| Error::lock_error("Failed to acquire write lock"))?;

        if !public_path.is_file() && !private_path.is_file() {
            return Err(Error::identity_not_found(identity));
        }
        for path in [public_path, private_path] {
            if path.is_file() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn list(&self, half: KeyHalf) -> Result<Vec<String>> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| Error::lock_error("Failed to acquire read lock"))?;

        let dir = self.namespace_dir(half);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut identities = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_identity(name).is_ok() {
                    identities.push(name.to_string());
                }
            }
        }

        identities.sort();
        Ok(identities)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn artifact(tag: u8) -> KeyArtifact {
        KeyArtifact::new(vec![0xc0, tag], vec![0x01, 0x00, 0x01])
    }

    #[test]
    fn test_file_store_layout() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.write("alice", KeyHalf::Public, &artifact(1)).unwrap();
        store.write("alice", KeyHalf::Private, &artifact(2)).unwrap();

        assert!(temp_dir.path().join("public").join("alice").is_file());
        assert!(temp_dir.path().join("private").join("alice").is_file());

        assert_eq!(store.read("alice", KeyHalf::Public).unwrap(), Some(artifact(1)));
        assert_eq!(store.read("alice", KeyHalf::Private).unwrap(), Some(artifact(2)));
    }

    #[test]
    fn test_missing_artifact_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();

        assert_eq!(store.read("nobody", KeyHalf::Public).unwrap(), None);
        assert!(!store.exists("nobody", KeyHalf::Private).unwrap());
        assert!(store.list(KeyHalf::Public).unwrap().is_empty());
    }

    #[test]
    fn test_write_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.write("alice", KeyHalf::Public, &artifact(1)).unwrap();
        store.write("alice", KeyHalf::Public, &artifact(9)).unwrap();
        assert_eq!(store.read("alice", KeyHalf::Public).unwrap(), Some(artifact(9)));
    }

    #[test]
    fn test_no_prefix_matching() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.write("alice", KeyHalf::Public, &artifact(1)).unwrap();
        assert_eq!(store.read("alic", KeyHalf::Public).unwrap(), None);
        assert_eq!(store.read("alice2", KeyHalf::Public).unwrap(), None);
        assert!(store.read("../public/alice", KeyHalf::Private).is_err());
    }

    #[test]
    fn test_list_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();

        store.write("bob", KeyHalf::Public, &artifact(1)).unwrap();
        store.write("alice", KeyHalf::Public, &artifact(2)).unwrap();
        store.write("alice", KeyHalf::Private, &artifact(3)).unwrap();

        assert_eq!(store.list(KeyHalf::Public).unwrap(), vec!["alice", "bob"]);
        assert_eq!(store.list(KeyHalf::Private).unwrap(), vec!["alice"]);

        store.delete("alice").unwrap();
        assert!(!store.exists("alice", KeyHalf::Public).unwrap());
        assert!(!store.exists("alice", KeyHalf::Private).unwrap());
        assert!(matches!(store.delete("alice"), Err(Error::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_private_artifact_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();
        store.write("alice", KeyHalf::Private, &artifact(1)).unwrap();

        let mode = std::fs::metadata(temp_dir.path().join("private").join("alice"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_artifact_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(temp_dir.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("public")).unwrap();
        std::fs::write(temp_dir.path().join("public").join("alice"), b"\x00\x01").unwrap();

        assert!(matches!(
            store.read("alice", KeyHalf::Public),
            Err(Error::EncodingError(_))
        ));
    }
}
