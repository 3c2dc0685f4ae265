//! Server configuration
//!
//! Command-line arguments (each with an environment fallback) layered over
//! the optional TOML config file.

use clap::Parser;
use platebook_common::config::{
    database_path, resolve_admin_emails, resolve_gemini_api_key, resolve_google_client_id,
    resolve_root_folder, storage_path, TomlConfig,
};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5740;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Command-line arguments for platebook
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "platebook")]
#[command(about = "Food review blog backend with Beli import")]
#[command(version)]
pub struct Cli {
    /// Root folder holding the database and stored objects
    #[arg(short, long, env = "PLATEBOOK_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PLATEBOOK_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "PLATEBOOK_BIND")]
    pub bind: Option<String>,

    /// Externally visible base URL used in links to stored files
    #[arg(long, env = "PLATEBOOK_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// TOML config file (defaults to the platform config dir)
    #[arg(short, long, env = "PLATEBOOK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind: String,
    pub public_base_url: String,
    pub admin_emails: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub google_client_id: Option<String>,
}

impl ServerConfig {
    /// CLI (and its env fallbacks) → TOML → defaults
    pub fn resolve(cli: &Cli, toml_config: &TomlConfig) -> Self {
        let port = cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
        let bind = cli
            .bind
            .clone()
            .or_else(|| toml_config.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let public_base_url = cli
            .public_base_url
            .clone()
            .or_else(|| toml_config.public_base_url.clone())
            .unwrap_or_else(|| format!("http://{}:{}", bind, port));

        Self {
            root_folder: resolve_root_folder(cli.root_folder.as_deref(), toml_config),
            port,
            bind,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            admin_emails: resolve_admin_emails(toml_config),
            gemini_api_key: resolve_gemini_api_key(toml_config),
            google_client_id: resolve_google_client_id(toml_config),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        database_path(&self.root_folder)
    }

    pub fn storage_path(&self) -> PathBuf {
        storage_path(&self.root_folder)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
