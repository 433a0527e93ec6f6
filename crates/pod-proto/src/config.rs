use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub cover: CoverConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

/// Line-protocol chat connection. The defaults are the platform's public
/// anonymous read-only credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_server")]
    pub server: String,
    #[serde(default = "default_chat_port")]
    pub port: u16,
    #[serde(default = "default_chat_nickname")]
    pub nickname: String,
    #[serde(default = "default_chat_token")]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Wall-clock interval between remote transport polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverConfig {
    #[serde(default = "default_cover_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 0.0 - 1.0, applied to every engine on start.
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Explicit mpv path; PATH is searched when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpv_binary: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Site the channel handle is appended to for stream resolution.
    #[serde(default = "default_live_url_base")]
    pub url_base: String,
    /// Explicit streamlink path; PATH is searched when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streamlink_binary: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            server: default_chat_server(),
            port: default_chat_port(),
            nickname: default_chat_nickname(),
            token: default_chat_token(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_cover_timeout_ms(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            mpv_binary: None,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            url_base: default_live_url_base(),
            streamlink_binary: None,
        }
    }
}

fn default_chat_server() -> String {
    "irc.chat.twitch.tv".to_string()
}

fn default_chat_port() -> u16 {
    6697
}

fn default_chat_nickname() -> String {
    "justinfan12345".to_string()
}

fn default_chat_token() -> String {
    "oauth:schmoopiie".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_cover_timeout_ms() -> u64 {
    5000
}

fn default_volume() -> f32 {
    0.5
}

fn default_live_url_base() -> String {
    "https://www.twitch.tv".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
