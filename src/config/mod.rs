//! Configuration and credential storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{StoredToken, TokenStore};
use crate::live::{ChannelSettings, Endpoint};
use crate::models::UserInfo;
use crate::sync::{ReconnectPolicy, SyncOptions};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_WS_URL: &str = "ws://127.0.0.1:9000";

/// Live channel reconnect settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    /// Give up after this many attempts in a row (unlimited when absent)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_secs: 1,
            max_backoff_secs: 64,
            max_attempts: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat service base URL (REST API lives under `/api/`)
    pub server_url: String,
    /// Live channel WebSocket URL; `{chat_id}` is replaced per room
    pub ws_url: String,
    /// WebSocket keepalive ping interval
    pub ping_interval_secs: u64,
    /// Server-side directory attachments are stored under
    pub upload_dir: String,
    /// Stored session token (JWT from login)
    pub access_token: Option<StoredToken>,
    /// User the token belongs to
    pub user: Option<UserInfo>,
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            ping_interval_secs: 30,
            upload_dir: "uploads".to_string(),
            access_token: None,
            user: None,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "pairchat", "pairchat")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Apply one-off overrides from the command line.
    pub fn with_overrides(mut self, server_url: Option<String>, ws_url: Option<String>) -> Self {
        if let Some(url) = server_url {
            self.server_url = url;
        }
        if let Some(url) = ws_url {
            self.ws_url = url;
        }
        self
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let r = &self.reconnect;
        if !r.enabled {
            return ReconnectPolicy::Never;
        }
        ReconnectPolicy::Backoff {
            initial: Duration::from_secs(r.initial_backoff_secs.max(1)),
            max: Duration::from_secs(r.max_backoff_secs.max(r.initial_backoff_secs).max(1)),
            max_attempts: r.max_attempts,
        }
    }

    pub fn sync_options(&self) -> Result<SyncOptions> {
        Ok(SyncOptions {
            endpoint: Endpoint::new(&self.ws_url)?,
            channel: ChannelSettings {
                ping_interval: Duration::from_secs(self.ping_interval_secs),
            },
            reconnect: self.reconnect_policy(),
        })
    }
}

impl TokenStore for Config {
    fn get_access_token(&self) -> Option<StoredToken> {
        self.access_token.clone()
    }

    fn set_access_token(&mut self, token: StoredToken) {
        self.access_token = Some(token);
    }

    fn get_user(&self) -> Option<UserInfo> {
        self.user.clone()
    }

    fn set_user(&mut self, user: UserInfo) {
        self.user = Some(user);
    }

    fn clear_tokens(&mut self) {
        self.access_token = None;
        self.user = None;
    }
}
