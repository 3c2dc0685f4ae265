//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "PLATEBOOK_ROOT_FOLDER";
/// Comma-separated admin e-mail allowlist
pub const ENV_ADMIN_EMAILS: &str = "PLATEBOOK_ADMIN_EMAILS";
/// Gemini API credential
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// OAuth client id that admin ID tokens must be issued for
pub const ENV_GOOGLE_CLIENT_ID: &str = "PLATEBOOK_GOOGLE_CLIENT_ID";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "platebook.db";
/// Object storage directory inside the root folder
pub const STORAGE_DIR: &str = "storage";

/// Optional TOML configuration file
///
/// Every field is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    /// Base URL used when building links to stored objects
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub admin_emails: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub google_client_id: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load the platform config file, falling back to defaults
    ///
    /// A missing file is normal; an unreadable or invalid one is logged and
    /// ignored so the service still starts.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Self::default()
            }
        }
    }
}

/// `~/.config/platebook/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("platebook").join("config.toml"))
}

/// Root folder resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("platebook"))
        .unwrap_or_else(|| PathBuf::from("./platebook_data"))
}

/// Database path for a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Object storage directory for a root folder
pub fn storage_path(root_folder: &Path) -> PathBuf {
    root_folder.join(STORAGE_DIR)
}

/// Create the root folder and storage directory if missing
pub fn ensure_root_folder(root_folder: &Path) -> Result<()> {
    std::fs::create_dir_all(root_folder)?;
    std::fs::create_dir_all(storage_path(root_folder))?;
    Ok(())
}

/// Split a comma-separated allowlist into trimmed, lowercased e-mails
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Admin allowlist: environment first, then TOML
pub fn resolve_admin_emails(toml_config: &TomlConfig) -> Vec<String> {
    if let Ok(raw) = std::env::var(ENV_ADMIN_EMAILS) {
        let emails = parse_admin_emails(&raw);
        if !emails.is_empty() {
            return emails;
        }
    }

    toml_config
        .admin_emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Gemini credential: environment first, then TOML
///
/// `None` is not a startup error; the parse endpoint reports it per request.
pub fn resolve_gemini_api_key(toml_config: &TomlConfig) -> Option<String> {
    if let Ok(key) = std::env::var(ENV_GEMINI_API_KEY) {
        if is_valid_key(&key) {
            tracing::info!("Gemini API key loaded from environment variable");
            return Some(key);
        }
    }

    match &toml_config.gemini_api_key {
        Some(key) if is_valid_key(key) => {
            tracing::info!("Gemini API key loaded from TOML config");
            Some(key.clone())
        }
        _ => None,
    }
}

/// Expected ID-token audience: environment first, then TOML
///
/// `None` accepts tokens for any audience.
pub fn resolve_google_client_id(toml_config: &TomlConfig) -> Option<String> {
    std::env::var(ENV_GOOGLE_CLIENT_ID)
        .ok()
        .filter(|id| is_valid_key(id))
        .or_else(|| toml_config.google_client_id.clone().filter(|id| is_valid_key(id)))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
