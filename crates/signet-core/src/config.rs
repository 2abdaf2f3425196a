use std::path::{Path, PathBuf};

use serde::Deserialize;
use signet_key::KeyStoreConfig;

use crate::error::{CoreError, Result};
use crate::macros::{MacroDescriptor, MacroRegistry};
use crate::parser::XWIKI_2_1;
use crate::reference::{DocumentReference, UserReference};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keys: KeyCfg,
    pub signatures: SignaturesCfg,
    pub discovery: DiscoveryCfg,
    pub users: UsersCfg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreKind {
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyCfg {
    pub store: KeyStoreKind,
    pub path: PathBuf,
    pub bits: usize,
}

impl Default for KeyCfg {
    fn default() -> Self {
        Self {
            store: KeyStoreKind::File,
            path: PathBuf::from("data/keys"),
            bits: signet_crypto::DEFAULT_KEY_BITS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignaturesCfg {
    /// Record directory; in-memory records when absent
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryCfg {
    pub default_syntax: String,
    /// Extra macros to treat as script macros
    pub script_macros: Vec<String>,
}

impl Default for DiscoveryCfg {
    fn default() -> Self {
        Self {
            default_syntax: XWIKI_2_1.to_string(),
            script_macros: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersCfg {
    pub guest: String,
    pub default_wiki: String,
}

impl Default for UsersCfg {
    fn default() -> Self {
        Self {
            guest: "xwiki:XWiki.Guest".to_string(),
            default_wiki: "xwiki".to_string(),
        }
    }
}

impl Settings {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let path = config_path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        if settings.keys.bits < 512 {
            return Err(CoreError::Config(format!(
                "keys.bits = {} is too small",
                settings.keys.bits
            )));
        }
        Ok(settings)
    }

    pub fn key_store_config(&self) -> KeyStoreConfig {
        match self.keys.store {
            KeyStoreKind::Memory => KeyStoreConfig::Memory,
            KeyStoreKind::File => KeyStoreConfig::File {
                path: self.keys.path.clone(),
            },
        }
    }

    /// Reference partial references are resolved against
    pub fn base_reference(&self) -> DocumentReference {
        DocumentReference::new(self.users.default_wiki.clone(), "Main", "WebHome")
    }

    pub fn guest(&self) -> Result<UserReference> {
        let base = DocumentReference::new(self.users.default_wiki.clone(), "XWiki", "WebHome");
        DocumentReference::resolve(&self.users.guest, &base)
            .map_err(|e| CoreError::Config(format!("users.guest: {}", e)))
    }

    /// Default registry plus the configured script macros
    pub fn macro_registry(&self) -> MacroRegistry {
        let mut registry = MacroRegistry::default();
        for name in &self.discovery.script_macros {
            registry.register(MacroDescriptor::script(name.as_str()));
        }
        registry
    }
}
