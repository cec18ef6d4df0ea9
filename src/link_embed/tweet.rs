use tracing::debug;
use url::Url;

use super::matchers::tweet_path;
use super::Embed;

/// Rebuild the status url from its user and id, dropping any trailing path or query
pub(crate) fn resolve(url: &Url) -> Embed {
    match tweet_path(url) {
        Some(tweet) => Embed::SocialPost {
            url: format!("https://twitter.com/{}/status/{}", tweet.user, tweet.id).into(),
        },
        None => {
            debug!(%url, "twitter link is not a status");
            Embed::Unrecognized
        }
    }
}
