//! Configuration system for FSS.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $FSS_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/fss/config.toml
//!   3. ~/.config/fss/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration, shared by the daemon and the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FssConfig {
    pub link: LinkConfig,
    pub exchange: ExchangeConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Network interface name. Empty = must be given on the command line.
    pub interface: String,
    /// Hardware address of the responder peer, `aa:bb:cc:dd:ee:ff` form.
    pub peer_mac: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// How long the client waits for a reply, in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Target phrase: the responder counts its occurrences, the client
    /// uses it to render the matched substring.
    pub phrase: String,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for FssConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            exchange: ExchangeConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            peer_mac: "00:04:00:00:00:00".to_string(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self { timeout_ms: 3000 }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            phrase: "word".to_string(),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("fss")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FssConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            FssConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("FSS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&FssConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply FSS_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("FSS_LINK__INTERFACE") {
            self.link.interface = v;
        }
        if let Ok(v) = std::env::var("FSS_LINK__PEER_MAC") {
            self.link.peer_mac = v;
        }
        if let Ok(v) = std::env::var("FSS_EXCHANGE__TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.exchange.timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("FSS_SEARCH__PHRASE") {
            self.search.phrase = v;
        }
    }
}
