use tracing::debug;
use url::Url;

use super::MediaRewriter;
use crate::link_embed::matchers::giphy_id;
use crate::link_embed::Embed;

pub(crate) fn resolve(rewriter: &MediaRewriter, url: &Url) -> Embed {
    match giphy_id(url) {
        Some(id) => Embed::media(
            rewriter.rewrite_str(&format!("https://media1.giphy.com/media/{id}/giphy.gif"), false),
            false,
        ),
        None => {
            debug!(%url, "giphy link without a gif id");
            Embed::Unrecognized
        }
    }
}
