//! Auth bundle nodes and the on-disk credential store.
//!
//! The store writes `[API] APPKEY / APPSECRET`. Files ending in `.ini`, such as
//! the `config.ini` left by earlier plugin installs, are read and written as
//! INI with unquoted values. Every other path uses TOML.

use crate::client::Credentials;
use crate::error::{LiblibError, Result};
use ini::Ini;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "liblib.toml";
pub const CONFIG_SECTION: &str = "API";
pub const APPKEY_KEY: &str = "APPKEY";
pub const APPSECRET_KEY: &str = "APPSECRET";

/// The credential bundle passed between nodes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub appkey: String,
    pub appsecret: String,
}

impl AuthInfo {
    pub fn new(appkey: impl Into<String>, appsecret: impl Into<String>) -> Result<Self> {
        let appkey = appkey.into();
        let appsecret = appsecret.into();
        if appkey.is_empty() || appsecret.is_empty() {
            return Err(LiblibError::Validation(
                "Appkey and Appsecret are required".into(),
            ));
        }
        Ok(Self { appkey, appsecret })
    }

    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::new(&self.appkey, &self.appsecret)
    }
}

impl fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfo")
            .field("appkey", &self.appkey)
            .field("appsecret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Toml,
    Ini,
}

impl StoreFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ini") => StoreFormat::Ini,
            _ => StoreFormat::Toml,
        }
    }
}

/// Credentials persisted as `[API] APPKEY / APPSECRET`.
/// Other sections in the file are left untouched on save.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `LIBLIB_CONFIG_PATH` when set, the default file name otherwise.
    pub fn from_env() -> Self {
        match std::env::var("LIBLIB_CONFIG_PATH") {
            Ok(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StoreFormat {
        StoreFormat::from_path(&self.path)
    }

    pub fn save(&self, auth: &AuthInfo) -> Result<()> {
        match self.format() {
            StoreFormat::Toml => self.save_toml(auth)?,
            StoreFormat::Ini => self.save_ini(auth)?,
        }
        log::info!("Saved LibLib credentials to {}", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<AuthInfo> {
        if !self.path.exists() {
            return Err(LiblibError::Config(format!(
                "Config file {} not found, save credentials first",
                self.path.display()
            )));
        }

        let (appkey, appsecret) = match self.format() {
            StoreFormat::Toml => self.load_toml()?,
            StoreFormat::Ini => self.load_ini()?,
        };
        match (
            appkey.filter(|v| !v.is_empty()),
            appsecret.filter(|v| !v.is_empty()),
        ) {
            (Some(appkey), Some(appsecret)) => Ok(AuthInfo { appkey, appsecret }),
            _ => Err(LiblibError::Config(format!(
                "No credentials in {}, save credentials first",
                self.path.display()
            ))),
        }
    }

    fn save_toml(&self, auth: &AuthInfo) -> Result<()> {
        let mut document = if self.path.exists() {
            self.read_document()?
        } else {
            toml::Table::new()
        };

        let section = document
            .entry(CONFIG_SECTION)
            .or_insert(toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(section) = section else {
            return Err(LiblibError::Config(format!(
                "[{}] in {} is not a section",
                CONFIG_SECTION,
                self.path.display()
            )));
        };
        section.insert(APPKEY_KEY.into(), toml::Value::String(auth.appkey.clone()));
        section.insert(
            APPSECRET_KEY.into(),
            toml::Value::String(auth.appsecret.clone()),
        );

        let contents = toml::to_string(&document)
            .map_err(|e| LiblibError::Config(format!("Cannot serialize config: {}", e)))?;
        fs::write(&self.path, contents).map_err(|e| {
            LiblibError::Config(format!("Cannot write {}: {}", self.path.display(), e))
        })
    }

    fn load_toml(&self) -> Result<(Option<String>, Option<String>)> {
        let document = self.read_document()?;
        let section = document.get(CONFIG_SECTION).and_then(|v| v.as_table());
        let field = |key: &str| {
            section
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .map(String::from)
        };
        Ok((field(APPKEY_KEY), field(APPSECRET_KEY)))
    }

    fn save_ini(&self, auth: &AuthInfo) -> Result<()> {
        let mut document = if self.path.exists() {
            self.read_ini()?
        } else {
            Ini::new()
        };

        document
            .with_section(Some(CONFIG_SECTION))
            .set(APPKEY_KEY, auth.appkey.as_str())
            .set(APPSECRET_KEY, auth.appsecret.as_str());

        document.write_to_file(&self.path).map_err(|e| {
            LiblibError::Config(format!("Cannot write {}: {}", self.path.display(), e))
        })
    }

    fn load_ini(&self) -> Result<(Option<String>, Option<String>)> {
        let document = self.read_ini()?;
        let section = document.section(Some(CONFIG_SECTION));
        let field = |key: &str| section.and_then(|s| s.get(key)).map(String::from);
        Ok((field(APPKEY_KEY), field(APPSECRET_KEY)))
    }

    fn read_ini(&self) -> Result<Ini> {
        Ini::load_from_file(&self.path).map_err(|e| {
            LiblibError::Config(format!("Invalid config file {}: {}", self.path.display(), e))
        })
    }

    fn read_document(&self) -> Result<toml::Table> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            LiblibError::Config(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        raw.parse::<toml::Table>().map_err(|e| {
            LiblibError::Config(format!("Invalid config file {}: {}", self.path.display(), e))
        })
    }
}

pub struct AuthInfoNode;

impl AuthInfoNode {
    pub fn make(appkey: &str, appsecret: &str) -> Result<AuthInfo> {
        AuthInfo::new(appkey, appsecret)
    }
}

pub struct SaveAuthInfoNode {
    store: CredentialStore,
}

impl SaveAuthInfoNode {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    pub fn execute(&self, auth_info: &AuthInfo) -> Result<()> {
        self.store.save(auth_info)
    }
}

pub struct LoadAuthInfoNode {
    store: CredentialStore,
}

impl LoadAuthInfoNode {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    pub fn execute(&self) -> Result<AuthInfo> {
        self.store.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_auth_info() {
        let auth = AuthInfoNode::make("key", "secret").unwrap();
        assert_eq!(auth.appkey, "key");
        assert!(auth.credentials().is_ok());

        assert!(AuthInfoNode::make("", "secret").unwrap_err().is_validation());
        assert!(AuthInfoNode::make("key", "").unwrap_err().is_validation());
        assert!(!format!("{:?}", auth).contains("\"secret\""));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("liblib.toml"));

        let auth = AuthInfo::new("key", "secret").unwrap();
        SaveAuthInfoNode::new(store.clone()).execute(&auth).unwrap();

        let loaded = LoadAuthInfoNode::new(store.clone()).execute().unwrap();
        assert_eq!(loaded, auth);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("[API]"));
        assert!(raw.contains("APPKEY = \"key\""));
    }

    #[test]
    fn test_save_overwrites_and_keeps_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liblib.toml");
        fs::write(
            &path,
            "[API]\nAPPKEY = \"old\"\nAPPSECRET = \"old\"\n\n[UI]\ntheme = \"dark\"\n",
        )
        .unwrap();

        let store = CredentialStore::new(&path);
        store.save(&AuthInfo::new("new-key", "new-secret").unwrap()).unwrap();

        assert_eq!(store.load().unwrap().appkey, "new-key");
        let document: toml::Table = fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(document["UI"]["theme"].as_str(), Some("dark"));
    }

    #[test]
    fn test_load_plugin_ini_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[API]\nAPPKEY = abc\nAPPSECRET = def\n\n[UI]\ntheme = dark\n").unwrap();

        let store = CredentialStore::new(&path);
        assert_eq!(store.format(), StoreFormat::Ini);
        let loaded = LoadAuthInfoNode::new(store.clone()).execute().unwrap();
        assert_eq!(loaded, AuthInfo::new("abc", "def").unwrap());

        store.save(&AuthInfo::new("new-key", "new-secret").unwrap()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("APPKEY=new-key") || raw.contains("APPKEY = new-key"));
        assert!(raw.contains("theme"));
        assert_eq!(store.load().unwrap().appsecret, "new-secret");
    }

    #[test]
    fn test_ini_save_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("config.ini"));
        let auth = AuthInfo::new("key", "secret").unwrap();

        SaveAuthInfoNode::new(store.clone()).execute(&auth).unwrap();
        assert_eq!(store.load().unwrap(), auth);

        fs::write(store.path(), "[API]\nAPPKEY =\nAPPSECRET = s\n").unwrap();
        assert!(matches!(store.load(), Err(LiblibError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("absent.toml"));
        assert!(matches!(store.load(), Err(LiblibError::Config(_))));
    }

    #[test]
    fn test_load_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liblib.toml");

        fs::write(&path, "[OTHER]\nkey = 1\n").unwrap();
        assert!(matches!(
            CredentialStore::new(&path).load(),
            Err(LiblibError::Config(_))
        ));

        fs::write(&path, "[API]\nAPPKEY = \"\"\nAPPSECRET = \"s\"\n").unwrap();
        assert!(matches!(
            CredentialStore::new(&path).load(),
            Err(LiblibError::Config(_))
        ));
    }
}
