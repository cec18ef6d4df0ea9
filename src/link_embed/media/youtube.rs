use tracing::debug;
use url::Url;

use super::MediaRewriter;
use crate::link_embed::matchers::youtube_id;
use crate::link_embed::Embed;

/// Videos are shown as their medium quality thumbnail
pub(crate) fn resolve(rewriter: &MediaRewriter, url: &Url) -> Embed {
    match youtube_id(url) {
        Some(id) => Embed::media(
            rewriter.rewrite_str(&format!("https://img.youtube.com/vi/{id}/mqdefault.jpg"), false),
            false,
        ),
        None => {
            debug!(%url, "youtube link without a video id");
            Embed::Unrecognized
        }
    }
}
