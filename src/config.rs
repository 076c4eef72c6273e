use crate::error::StitchError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_titles_path")]
    pub titles_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8888 }
fn default_static_dir() -> PathBuf { PathBuf::from("public") }
fn default_titles_path() -> PathBuf { PathBuf::from("etc/titles.json") }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            titles_path: default_titles_path(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_rss_feed_url")]
    pub rss_feed_url: String,
    #[serde(default = "default_steamdb_search_url")]
    pub steamdb_search_url: String,
    #[serde(default = "default_storefront_url")]
    pub storefront_url: String,
    #[serde(default = "default_twitch_search_url")]
    pub twitch_search_url: String,
}

fn default_timeout_ms() -> u64 { 3000 }
fn default_user_agent() -> String { "request".to_string() }
fn default_rss_feed_url() -> String { "http://feeds.ign.com/ign/pc-reviews/".to_string() }
fn default_steamdb_search_url() -> String { "https://steamdb.info/search/".to_string() }
fn default_storefront_url() -> String { "https://store.steampowered.com/api/appdetails".to_string() }
fn default_twitch_search_url() -> String { "https://api.twitch.tv/kraken/search/streams".to_string() }

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            rss_feed_url: default_rss_feed_url(),
            steamdb_search_url: default_steamdb_search_url(),
            storefront_url: default_storefront_url(),
            twitch_search_url: default_twitch_search_url(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_rss_items")]
    pub max_rss_items: usize,
    #[serde(default = "default_max_stream_preview")]
    pub max_stream_preview: usize,
}

fn default_server_url() -> String { "http://127.0.0.1:8888".to_string() }
fn default_max_rss_items() -> usize { 10 }
fn default_max_stream_preview() -> usize { 3 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            timeout_ms: default_timeout_ms(),
            max_rss_items: default_max_rss_items(),
            max_stream_preview: default_max_stream_preview(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server or client cannot run with.
    pub fn validate(&self) -> std::result::Result<(), StitchError> {
        if self.server.port == 0 {
            return Err(StitchError::Config("server.port must be non-zero".into()));
        }
        if self.upstream.timeout_ms == 0 || self.client.timeout_ms == 0 {
            return Err(StitchError::Config("timeout_ms must be greater than zero".into()));
        }
        if self.client.max_rss_items == 0 {
            return Err(StitchError::Config("client.max_rss_items must be greater than zero".into()));
        }
        if self.client.max_stream_preview == 0 {
            return Err(StitchError::Config(
                "client.max_stream_preview must be greater than zero".into(),
            ));
        }
        let urls = [
            ("upstream.rss_feed_url", &self.upstream.rss_feed_url),
            ("upstream.steamdb_search_url", &self.upstream.steamdb_search_url),
            ("upstream.storefront_url", &self.upstream.storefront_url),
            ("upstream.twitch_search_url", &self.upstream.twitch_search_url),
            ("client.server_url", &self.client.server_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http") {
                return Err(StitchError::Config(format!("{} is not an http(s) URL: {}", name, url)));
            }
        }
        Ok(())
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }

    /// Twitch `Client-ID`, if one is configured in the environment.
    pub fn twitch_client_id() -> Option<String> {
        match std::env::var("TWITCH_CLIENT_ID") {
            Ok(id) if !id.trim().is_empty() => Some(sanitize_key(&id)),
            _ => None,
        }
    }
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.upstream.timeout_ms, 3000);
        assert_eq!(config.client.max_rss_items, 10);
        assert_eq!(config.client.max_stream_preview, 3);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.titles_path, PathBuf::from("etc/titles.json"));
        assert_eq!(config.client.server_url, "http://127.0.0.1:8888");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config: Config = toml::from_str("").unwrap();
        config.client.max_rss_items = 0;
        assert!(matches!(config.validate(), Err(StitchError::Config(_))));

        let mut config: Config = toml::from_str("").unwrap();
        config.upstream.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(StitchError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config: Config = toml::from_str("[client]\nserver_url = \"localhost:8888\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client.server_url"));
    }

    #[test]
    fn test_sanitize_key_strips_invisible_chars() {
        assert_eq!(sanitize_key("\u{feff}abc123\r\n"), "abc123");
    }
}
