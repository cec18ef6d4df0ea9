use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub static CONFIG_FILE: &str = "chat-embed.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application identifier sent to the imgur API as `Client-ID`
    #[serde(default = "default_imgur_client_id")]
    pub imgur_client_id: String,
    #[serde(default = "default_imgur_api_base")]
    pub imgur_api_base: String,
    #[serde(default = "default_bluesky_api_base")]
    pub bluesky_api_base: String,
    /// Redirect prefix used for images the embedding page cannot load directly
    #[serde(default = "default_cors_proxy")]
    pub cors_proxy: String,
    /// Resource fetched once at startup to see whether the image host blocks us
    #[serde(default = "default_image_host_probe_url")]
    pub image_host_probe_url: String,
    /// Origin of the page embeds are shown in
    #[serde(default = "default_embed_origin")]
    pub embed_origin: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Entry lifetime in seconds, 0 keeps entries until evicted by capacity
    #[serde(default)]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub dark_theme: bool,
}

fn default_imgur_client_id() -> String {
    "546c25a59c58ad7".into()
}

fn default_imgur_api_base() -> String {
    "https://api.imgur.com/3".into()
}

fn default_bluesky_api_base() -> String {
    "https://public.api.bsky.app/xrpc".into()
}

fn default_cors_proxy() -> String {
    "https://proxy.duckduckgo.com/iu/".into()
}

fn default_image_host_probe_url() -> String {
    "https://i.imgur.com/removed.png".into()
}

fn default_embed_origin() -> String {
    "https://www.twitch.tv".into()
}

fn default_cache_capacity() -> u64 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            imgur_client_id: default_imgur_client_id(),
            imgur_api_base: default_imgur_api_base(),
            bluesky_api_base: default_bluesky_api_base(),
            cors_proxy: default_cors_proxy(),
            image_host_probe_url: default_image_host_probe_url(),
            embed_origin: default_embed_origin(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: 0,
            request_timeout_secs: default_request_timeout_secs(),
            dark_theme: false,
        }
    }
}

impl Config {
    pub fn get_config() -> Result<Self> {
        Ok(Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("CHAT_EMBED_"))
            .extract()?)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shared HTTP client for every outbound lookup
    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.request_timeout())
            .user_agent(concat!("chat-embed/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: Config = Figment::new()
            .merge(Toml::string("cache_capacity = 10\ndark_theme = true"))
            .extract()
            .unwrap();
        assert_eq!(10, config.cache_capacity);
        assert!(config.dark_theme);
        assert_eq!("https://api.imgur.com/3", config.imgur_api_base);
        assert_eq!(None, config.cache_ttl());
    }

    #[test]
    fn ttl_enabled_when_nonzero() {
        let config = Config {
            cache_ttl_secs: 30,
            ..Default::default()
        };
        assert_eq!(Some(Duration::from_secs(30)), config.cache_ttl());
    }
}
