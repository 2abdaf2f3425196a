pub mod export;
pub mod import;
pub mod keygen;
pub mod list;
pub mod scan;
pub mod sign;
pub mod verify;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use signet_core::{DocumentReference, MemoryDocumentRepository, Settings, SignedScripts, UserReference};
use signet_key::KeyArtifact;

use crate::error::{CliError, CliResult};

pub const DEFAULT_CONFIG: &str = "config/signet.toml";

/// Records go here when the configuration names no directory
const DEFAULT_SIGNATURES: &str = "data/signatures";

/// Settings plus the service built from them
pub struct Workspace {
    pub settings: Settings,
    pub service: SignedScripts,
}

impl Workspace {
    pub fn open(config: Option<&Path>) -> CliResult<Self> {
        let mut settings = load_settings(config)?;
        if settings.signatures.path.is_none() {
            settings.signatures.path = Some(PathBuf::from(DEFAULT_SIGNATURES));
        }
        let service =
            SignedScripts::from_settings(&settings, Arc::new(MemoryDocumentRepository::new()))?;
        tracing::debug!(
            keys = %settings.keys.path.display(),
            store = ?settings.keys.store,
            "workspace opened"
        );
        Ok(Self { settings, service })
    }

    /// Resolve a document given as `Page`, `Space.Page` or `wiki:Space.Page`
    pub fn document(&self, input: &str) -> CliResult<DocumentReference> {
        Ok(DocumentReference::resolve(input, &self.settings.base_reference())?)
    }

    /// Resolve a user; bare names live in the `XWiki` space
    pub fn user(&self, input: &str) -> CliResult<UserReference> {
        let base = DocumentReference::new(self.settings.users.default_wiki.clone(), "XWiki", "WebHome");
        Ok(DocumentReference::resolve(input, &base)?)
    }
}

fn load_settings(config: Option<&Path>) -> CliResult<Settings> {
    match config {
        Some(path) => Ok(Settings::load(path)?),
        None if Path::new(DEFAULT_CONFIG).is_file() => Ok(Settings::load(DEFAULT_CONFIG)?),
        None => Ok(Settings::default()),
    }
}

pub fn read_content(file: &Path) -> CliResult<String> {
    if !file.is_file() {
        return Err(CliError::FileNotFound(file.display().to_string()));
    }
    Ok(std::fs::read_to_string(file)?)
}

/// Short modulus fingerprint for display
pub fn fingerprint(artifact: &KeyArtifact) -> String {
    signet_crypto::sha256_hex(&artifact.modulus)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn memory_workspace(dir: &TempDir) -> Workspace {
        let path = dir.path().join("signet.toml");
        std::fs::write(
            &path,
            format!(
                "[keys]\nstore = \"memory\"\nbits = 1024\n[signatures]\npath = {:?}\n[users]\ndefault_wiki = \"dev\"\n",
                dir.path().join("records")
            ),
        )
        .unwrap();
        Workspace::open(Some(&path)).unwrap()
    }

    #[test]
    fn test_reference_resolution() {
        let dir = TempDir::new().unwrap();
        let workspace = memory_workspace(&dir);

        assert_eq!(
            workspace.document("Sandbox.WebHome").unwrap(),
            DocumentReference::new("dev", "Sandbox", "WebHome")
        );
        assert_eq!(
            workspace.user("Alice").unwrap(),
            DocumentReference::new("dev", "XWiki", "Alice")
        );
        assert_eq!(
            workspace.user("xwiki:XWiki.Admin").unwrap(),
            DocumentReference::new("xwiki", "XWiki", "Admin")
        );
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Workspace::open(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_read_content() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("script.groovy");
        assert!(matches!(read_content(&file), Err(CliError::FileNotFound(_))));
        std::fs::write(&file, "println 1").unwrap();
        assert_eq!(read_content(&file).unwrap(), "println 1");
    }

    #[test]
    fn test_list_marks_imported_keys() {
        let dir = TempDir::new().unwrap();
        let workspace = memory_workspace(&dir);
        assert!(list::key_names(&workspace).unwrap().is_empty());

        keygen::handle(&workspace, "alice".into()).unwrap();
        let public = dir.path().join("alice.pub");
        export::handle(&workspace, "alice".into(), Some(public.clone())).unwrap();
        import::handle(&workspace, "partner".into(), public).unwrap();

        assert_eq!(
            list::key_names(&workspace).unwrap(),
            vec![("alice".to_string(), true), ("partner".to_string(), false)]
        );
    }

    #[test]
    fn test_sign_then_verify_round_trip() {
        let dir = TempDir::new().unwrap();
        let workspace = memory_workspace(&dir);
        let file = dir.path().join("fragment");
        std::fs::write(&file, "println 1").unwrap();

        sign::handle(
            &workspace,
            "alice".into(),
            "Alice".into(),
            "Sandbox.WebHome".into(),
            "s1".into(),
            file.clone(),
        )
        .unwrap();
        verify::handle(&workspace, "Sandbox.WebHome".into(), "s1".into(), file.clone()).unwrap();

        std::fs::write(&file, "println 2").unwrap();
        assert!(verify::handle(&workspace, "Sandbox.WebHome".into(), "s1".into(), file).is_err());
    }
}
