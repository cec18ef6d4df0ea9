use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use mini_moka::sync::Cache;
use tracing::debug;
use url::Url;

use super::matchers::parse_link;
use super::resolver::{EmbedResolver, Resolver};
use super::Embed;

/// Identity of a link for caching: host, path and query. Scheme, port,
/// credentials and fragment don't change what a link resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Box<str>);

impl CacheKey {
    pub fn new(url: &Url) -> Option<Self> {
        let host = url.host_str()?;
        let key = match url.query() {
            Some(query) => format!("{host}{}?{query}", url.path()),
            None => format!("{host}{}", url.path()),
        };
        Some(Self(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

type Pending = Shared<BoxFuture<'static, Embed>>;

/// Memoizes resolutions, including unrecognized and unembeddable links.
///
/// Concurrent lookups of the same unseen link share a single resolution.
/// Resolutions run as their own task, so they finish and fill the cache even
/// if every caller stops waiting.
pub struct EmbedCache<R = Resolver> {
    resolver: Arc<R>,
    entries: Cache<CacheKey, Embed>,
    in_flight: Arc<Mutex<HashMap<CacheKey, Pending>>>,
}

impl<R> EmbedCache<R>
where
    R: EmbedResolver + 'static,
{
    pub fn new(resolver: R, max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            resolver: Arc::new(resolver),
            entries: builder.build(),
            in_flight: Arc::default(),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Resolve a link as found in a chat message
    pub async fn get_or_resolve(&self, link: &str) -> Embed {
        match parse_link(link) {
            Some(url) => self.get_or_resolve_url(url).await,
            None => {
                debug!(%link, "not an http link");
                Embed::Unrecognized
            }
        }
    }

    pub async fn get_or_resolve_url(&self, url: Url) -> Embed {
        let Some(key) = CacheKey::new(&url) else {
            return Embed::Unrecognized;
        };
        if let Some(embed) = self.entries.get(&key) {
            return embed;
        }
        let pending = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            // A resolution may have finished between the lookup above and taking the lock
            if let Some(embed) = self.entries.get(&key) {
                return embed;
            }
            in_flight
                .entry(key.clone())
                .or_insert_with(|| self.spawn_resolution(key, url))
                .clone()
        };
        pending.await
    }

    /// Resolve every link of one message concurrently, results are in link order
    pub async fn resolve_message<'a, I>(&self, links: I) -> Vec<Embed>
    where
        I: IntoIterator<Item = &'a str>,
    {
        future::join_all(links.into_iter().map(|link| self.get_or_resolve(link))).await
    }

    fn spawn_resolution(&self, key: CacheKey, url: Url) -> Pending {
        let resolver = Arc::clone(&self.resolver);
        let entries = self.entries.clone();
        let in_flight = InFlightEntry {
            in_flight: Arc::clone(&self.in_flight),
            key,
        };
        let task = tokio::spawn(async move {
            let embed = resolver.resolve(&url).await;
            debug!(key = %in_flight.key, ?embed, "resolved link");
            entries.insert(in_flight.key.clone(), embed.clone());
            embed
        });
        task.map(|result| match result {
            Ok(embed) => embed,
            Err(e) => {
                debug!(error = %e, "resolution task failed");
                Embed::Unrecognized
            }
        })
        .boxed()
        .shared()
    }
}

/// Removes its key from the in-flight map when the resolution task ends,
/// whether it finished or panicked
struct InFlightEntry {
    in_flight: Arc<Mutex<HashMap<CacheKey, Pending>>>,
    key: CacheKey,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
