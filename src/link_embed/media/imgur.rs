use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::MediaRewriter;
use crate::error::{fetch_json, FetchError};
use crate::link_embed::matchers::{direct_media, imgur_path, ImgurPath};
use crate::link_embed::Embed;

#[derive(Debug, Clone)]
pub(crate) struct ImgurApi {
    api_base: Box<str>,
    client_id: Box<str>,
}

#[derive(Deserialize, Debug)]
struct Response {
    data: Data,
}

/// Albums and galleries list their media in `images`, single images are the data itself
#[derive(Deserialize, Debug)]
struct Data {
    #[serde(default)]
    images: Vec<Item>,
    #[serde(flatten)]
    item: Item,
}

#[derive(Deserialize, Debug)]
struct Item {
    link: Option<Box<str>>,
    mp4: Option<Box<str>>,
}

impl ImgurApi {
    pub(crate) fn new(api_base: &str, client_id: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').into(),
            client_id: client_id.into(),
        }
    }

    pub(crate) async fn resolve(&self, client: &Client, rewriter: &MediaRewriter, url: &Url) -> Embed {
        let endpoint = match imgur_path(url) {
            Some(ImgurPath::Album(id)) => format!("{}/album/{id}", self.api_base),
            Some(ImgurPath::Gallery(id)) => format!("{}/gallery/{id}", self.api_base),
            Some(ImgurPath::Image(id)) => format!("{}/image/{id}", self.api_base),
            Some(ImgurPath::Collection) => {
                return Embed::unembeddable("imgur tag and user pages can't be shown inline")
            }
            None => {
                debug!(%url, "imgur link without an image id");
                return Embed::Unrecognized;
            }
        };

        match self.first_media(client, &endpoint).await {
            Ok((media, is_video)) => Embed::media(rewriter.rewrite_str(&media, is_video), is_video),
            Err(e) => {
                debug!(%url, error = %e, "imgur lookup failed");
                Embed::Unrecognized
            }
        }
    }

    /// First media item of the album, video variant preferred
    async fn first_media(&self, client: &Client, endpoint: &str) -> Result<(Box<str>, bool), FetchError> {
        let request = client
            .get(endpoint)
            .header(header::AUTHORIZATION, format!("Client-ID {}", self.client_id));
        let response: Response = fetch_json(request).await?;
        let Data { images, item } = response.data;
        let item = images.into_iter().next().unwrap_or(item);

        match item {
            Item { mp4: Some(mp4), .. } => Ok((mp4, true)),
            Item { link: Some(link), .. } => {
                let is_video = Url::parse(&link)
                    .ok()
                    .and_then(|url| direct_media(&url))
                    .map_or(false, |media| media.is_video);
                Ok((link, is_video))
            }
            _ => Err(FetchError::NoMedia),
        }
    }
}
