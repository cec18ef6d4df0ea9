//! Ordered dispatch from a link to the provider that knows how to embed it.

use std::time::Duration;

use async_trait::async_trait;
use mini_moka::sync::Cache;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::media::imgur::ImgurApi;
use super::media::{giphy, youtube, MediaRewriter};
use super::matchers::{direct_media, has_fediverse_prefix};
use super::probe::{self, origin};
use super::{bluesky, fediverse, tweet, Embed};
use crate::config::Config;

/// Anything that turns a link into an [`Embed`]. Failures are reported as
/// [`Embed::Unrecognized`], never as errors.
#[async_trait]
pub trait EmbedResolver: Send + Sync {
    async fn resolve(&self, url: &Url) -> Embed;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Imgur,
    Giphy,
    YouTube,
    Twitter,
    Bluesky,
    CannotEmbed(&'static str),
    Fediverse,
}

struct Rule {
    matches: fn(&Url) -> bool,
    provider: Provider,
}

/// Checked top to bottom, the first matching rule wins. Direct media links are
/// handled before any of these.
static RULES: &[Rule] = &[
    Rule {
        matches: is_imgur,
        provider: Provider::Imgur,
    },
    Rule {
        matches: is_giphy,
        provider: Provider::Giphy,
    },
    Rule {
        matches: is_youtube,
        provider: Provider::YouTube,
    },
    Rule {
        matches: is_twitter,
        provider: Provider::Twitter,
    },
    Rule {
        matches: is_bluesky,
        provider: Provider::Bluesky,
    },
    Rule {
        matches: is_tenor,
        provider: Provider::CannotEmbed("tenor gifs can't be shown inline"),
    },
    Rule {
        matches: has_fediverse_prefix,
        provider: Provider::Fediverse,
    },
];

/// Host without a leading `www.`
fn bare_host(url: &Url) -> &str {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host)
}

fn is_imgur(url: &Url) -> bool {
    matches!(bare_host(url), "imgur.com" | "m.imgur.com" | "i.imgur.com")
}

fn is_giphy(url: &Url) -> bool {
    bare_host(url) == "giphy.com"
}

fn is_youtube(url: &Url) -> bool {
    matches!(bare_host(url), "youtube.com" | "m.youtube.com" | "youtu.be")
}

fn is_twitter(url: &Url) -> bool {
    matches!(
        bare_host(url),
        "twitter.com" | "mobile.twitter.com" | "x.com"
    )
}

fn is_bluesky(url: &Url) -> bool {
    url.host_str() == Some("bsky.app")
}

fn is_tenor(url: &Url) -> bool {
    bare_host(url) == "tenor.com"
}

fn provider_for(url: &Url) -> Option<Provider> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(url))
        .map(|rule| rule.provider)
}

pub struct Resolver {
    client: Client,
    rewriter: MediaRewriter,
    imgur: ImgurApi,
    bluesky_api_base: Box<str>,
    /// Nodeinfo verdicts per origin, so each host is probed once
    federated_hosts: Cache<Box<str>, bool>,
}

impl Resolver {
    pub fn new(client: Client, config: &Config, rewriter: MediaRewriter) -> Self {
        Self {
            client,
            rewriter,
            imgur: ImgurApi::new(&config.imgur_api_base, &config.imgur_client_id),
            bluesky_api_base: config.bluesky_api_base.as_str().into(),
            federated_hosts: Cache::builder()
                .max_capacity(1024)
                .time_to_live(Duration::from_secs(24 * 60 * 60))
                .build(),
        }
    }

    /// Build a resolver from config, running the image host probe first
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = config.http_client()?;
        let blocked = probe::image_host_blocked(
            &client,
            &config.image_host_probe_url,
            &config.embed_origin,
        )
        .await;
        let rewriter = MediaRewriter::new(blocked, config.cors_proxy.as_str());
        Ok(Self::new(client, config, rewriter))
    }

    async fn is_federated(&self, url: &Url) -> bool {
        let key = origin(url);
        if let Some(federated) = self.federated_hosts.get(&key) {
            return federated;
        }
        let federated = probe::is_federated(&self.client, url).await;
        self.federated_hosts.insert(key, federated);
        federated
    }
}

#[async_trait]
impl EmbedResolver for Resolver {
    async fn resolve(&self, url: &Url) -> Embed {
        if let Some(media) = direct_media(url) {
            return self.rewriter.direct(url, media);
        }

        let Some(provider) = provider_for(url) else {
            return Embed::Unrecognized;
        };
        debug!(%url, ?provider, "resolving link");
        match provider {
            Provider::Imgur => self.imgur.resolve(&self.client, &self.rewriter, url).await,
            Provider::Giphy => giphy::resolve(&self.rewriter, url),
            Provider::YouTube => youtube::resolve(&self.rewriter, url),
            Provider::Twitter => tweet::resolve(url),
            Provider::Bluesky => bluesky::resolve(&self.client, &self.bluesky_api_base, url).await,
            Provider::CannotEmbed(reason) => Embed::unembeddable(reason),
            Provider::Fediverse => {
                if self.is_federated(url).await {
                    fediverse::resolve(&self.client, url).await
                } else {
                    Embed::Unrecognized
                }
            }
        }
    }
}
