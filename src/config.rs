use std::{
    collections::HashMap,
    env,
    fs::{self, File},
    io::prelude::*,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::logging::DrowseLogger;

/// Top-level configuration for the application, loaded from a TOML file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DrowseConfig {
    /// Interface to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent client connections.
    #[serde(default = "default_max_conn")]
    pub max_conn: u32,

    /// New connections per second allowed from one IP address, 0 disables the limit.
    #[serde(default = "default_cooldown")]
    pub cooldown: u32,

    /// Text of the login disconnect sent after a join attempt.
    #[serde(default = "default_disconnect_message")]
    pub disconnect_message: String,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub status: StatusConfig,

    #[serde(flatten)]
    pub other_fields: HashMap<String, toml::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WebhookConfig {
    /// Endpoint that receives a POST for every join attempt.
    pub url: Option<String>,
    /// Only notify when the client sent a login start with a player name.
    pub require_user: bool,
    /// Request timeout in seconds.
    pub timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StatusConfig {
    pub sleeping_motd: String,
    pub starting_motd: String,
    /// Seconds the starting MOTD stays up after a join attempt.
    pub starting_timeout: u64,
    pub max_players: i32,
    pub version: String,
    /// 0 derives the protocol number from `version`.
    pub protocol: i32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    25565
}

fn default_max_conn() -> u32 {
    65535
}

fn default_cooldown() -> u32 {
    10
}

fn default_disconnect_message() -> String {
    "🚀 Server is waking up! Please try again in a few minutes.".to_string()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            require_user: false,
            timeout: 5,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            sleeping_motd: "🌙 Server sleeping, join to wake up!".to_string(),
            starting_motd: "⚡ Server starting up...".to_string(),
            starting_timeout: 300,
            max_players: 20,
            version: "1.21.8".to_string(),
            protocol: 0,
        }
    }
}

impl Default for DrowseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_conn: default_max_conn(),
            cooldown: default_cooldown(),
            disconnect_message: default_disconnect_message(),
            webhook: WebhookConfig::default(),
            status: StatusConfig::default(),
            other_fields: HashMap::new(),
        }
    }
}

/// `DROWSE_CONFIG` if set, otherwise `settings.toml` in the working directory.
pub fn config_path() -> std::io::Result<PathBuf> {
    match dotenvy::var("DROWSE_CONFIG") {
        Ok(path) => Ok(PathBuf::from(path)),
        Err(_) => Ok(env::current_dir()?.join("settings.toml")),
    }
}

impl DrowseConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = fs::read_to_string(path).map_err(ConfigLoadError::Io)?;
        let config: Self = toml::from_str(&raw).map_err(ConfigLoadError::Parse)?;

        for (key, value) in &config.other_fields {
            DrowseLogger::unknown_config_key(key, value);
        }

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_str = toml::to_string(&self)?;
        let mut file = File::create(path)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl WebhookConfig {
    /// The configured URL, ignoring blank values.
    pub fn url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Upper bound for the starting window, one year.
pub const MAX_STARTING_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

impl StatusConfig {
    /// Clamped to [`MAX_STARTING_TIMEOUT`].
    pub fn starting_timeout(&self) -> Duration {
        Duration::from_secs(self.starting_timeout).min(MAX_STARTING_TIMEOUT)
    }

    /// Protocol number advertised in status responses.
    pub fn protocol(&self) -> i32 {
        net::resolve_protocol(&self.version, self.protocol)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Could not open config")]
    Io(#[from] std::io::Error),
    #[error("Could not parse")]
    Parse(#[from] toml::de::Error),
}
