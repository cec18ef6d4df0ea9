pub(crate) mod giphy;
pub(crate) mod imgur;
pub(crate) mod youtube;

use tracing::debug;
use url::Url;

use super::matchers::DirectMedia;
use super::Embed;

/// Host rewrites applied to every media url before it is handed out
#[derive(Debug, Clone)]
pub struct MediaRewriter {
    proxy_image_host: bool,
    cors_proxy: Box<str>,
}

impl MediaRewriter {
    /// Hotlinks to this giphy cdn are rejected, `media1` serves the same files
    const GIPHY_BLOCKED_HOST: &'static str = "media.giphy.com";
    const GIPHY_ALTERNATE_HOST: &'static str = "media1.giphy.com";
    const IMAGE_HOST: &'static str = "i.imgur.com";

    /// `proxy_image_host` is the verdict of the startup capability probe
    pub fn new(proxy_image_host: bool, cors_proxy: impl Into<Box<str>>) -> Self {
        Self {
            proxy_image_host,
            cors_proxy: cors_proxy.into(),
        }
    }

    /// Only images go through the proxy, it doesn't serve video
    pub fn rewrite(&self, mut url: Url, is_video: bool) -> Box<str> {
        let host = url.host_str().unwrap_or_default().to_owned();
        match host.as_str() {
            Self::GIPHY_BLOCKED_HOST => match url.set_host(Some(Self::GIPHY_ALTERNATE_HOST)) {
                Ok(()) => url.as_str().into(),
                Err(e) => {
                    debug!(%url, error = %e, "could not rewrite giphy host");
                    url.as_str().into()
                }
            },
            Self::IMAGE_HOST if self.proxy_image_host && !is_video => {
                match Url::parse_with_params(&self.cors_proxy, &[("u", url.as_str())]) {
                    Ok(proxied) => proxied.as_str().into(),
                    Err(e) => {
                        debug!(proxy = %self.cors_proxy, error = %e, "invalid cors proxy, using original url");
                        url.as_str().into()
                    }
                }
            }
            _ => url.as_str().into(),
        }
    }

    /// Rewrite a url given as text, text that does not parse is passed through
    pub(crate) fn rewrite_str(&self, url: &str, is_video: bool) -> Box<str> {
        match Url::parse(url) {
            Ok(url) => self.rewrite(url, is_video),
            Err(_) => url.into(),
        }
    }

    pub(crate) fn direct(&self, url: &Url, media: DirectMedia) -> Embed {
        Embed::media(self.rewrite(url.clone(), media.is_video), media.is_video)
    }
}

impl Default for MediaRewriter {
    fn default() -> Self {
        Self::new(false, "https://proxy.duckduckgo.com/iu/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn giphy_cdn_rewritten() {
        let rewriter = MediaRewriter::default();
        assert_eq!(
            "https://media1.giphy.com/media/abc/giphy.gif",
            &*rewriter.rewrite(url("https://media.giphy.com/media/abc/giphy.gif"), false)
        );
        assert_eq!(
            "https://media2.giphy.com/media/abc/giphy.gif",
            &*rewriter.rewrite(url("https://media2.giphy.com/media/abc/giphy.gif"), false)
        );
    }

    #[test]
    fn image_host_proxied_only_when_blocked() {
        let image = "https://i.imgur.com/abcde.png";
        assert_eq!(image, &*MediaRewriter::default().rewrite(url(image), false));

        let rewriter = MediaRewriter::new(true, "https://proxy.example.com/iu/");
        assert_eq!(
            "https://proxy.example.com/iu/?u=https%3A%2F%2Fi.imgur.com%2Fabcde.png",
            &*rewriter.rewrite(url(image), false)
        );
        assert_eq!(
            "https://example.com/abcde.png",
            &*rewriter.rewrite(url("https://example.com/abcde.png"), false)
        );
    }

    #[test]
    fn image_host_videos_not_proxied() {
        let rewriter = MediaRewriter::new(true, "https://proxy.example.com/iu/");
        let video = "https://i.imgur.com/abcde.mp4";
        assert_eq!(video, &*rewriter.rewrite(url(video), true));
        assert_eq!(
            Embed::media(video, true),
            rewriter.direct(&url(video), DirectMedia { is_video: true })
        );
    }

    #[test]
    fn unparseable_text_passes_through() {
        assert_eq!("not a url", &*MediaRewriter::default().rewrite_str("not a url", false));
    }
}
