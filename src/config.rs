use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(
    name = "solemate",
    about = "Terminal client for the SoleMate feet review service"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to data directory (session, local storage)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the SoleMate REST API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Host the image library server binds to
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port the image library server binds to
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Skip confirmation prompts for destructive actions
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub feed: FeedConfig,
    pub admin: AdminConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Where `/api/minigame/library` is served. Defaults to the local server.
    pub library_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `images/<folder>/...`.
    pub public_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub token_key: String,
    pub cookie_name: String,
    pub max_age_hours: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub latest_reviews: usize,
    pub admin_latest_reviews: usize,
    pub poll_seconds: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AdminConfig {
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            library_url: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_dir: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: "solemate_token".to_string(),
            cookie_name: "token".to_string(),
            max_age_hours: 12,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latest_reviews: 14,
            admin_latest_reviews: 12,
            poll_seconds: 60,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref api_url) = cli.api_url {
            config.api.base_url = api_url.clone();
        }
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        if config.api.library_url.is_none() {
            config.api.library_url = Some(format!(
                "http://{}:{}",
                config.server.host, config.server.port
            ));
        }
        if config.server.public_dir.is_none() {
            config.server.public_dir = Some(data_dir.join("public"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".solemate")
        })
    }

    pub fn library_url(&self) -> &str {
        self.api.library_url.as_deref().unwrap_or_default()
    }

    pub fn public_dir(&self) -> PathBuf {
        self.server
            .public_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("public"))
    }
}
