mod bluesky;
mod cache;
mod fediverse;
pub mod matchers;
mod media;
pub mod probe;
mod resolver;
mod tweet;

use serde::Serialize;

pub use cache::{CacheKey, EmbedCache};
pub use media::MediaRewriter;
pub use resolver::{EmbedResolver, Resolver};

/// What a link resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embed {
    /// No provider claims the link, or resolving it failed
    Unrecognized,
    ImageOrVideo {
        url: Box<str>,
        is_video: bool,
    },
    SocialPost {
        url: Box<str>,
    },
    MicroblogSnapshot {
        avatar_url: Option<Box<str>>,
        author_profile_url: Box<str>,
        handle: Box<str>,
        display_name: Box<str>,
        content: PostContent,
    },
    /// The provider is known but its content cannot be shown inline
    Unembeddable {
        reason: Box<str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "body", rename_all = "snake_case")]
pub enum PostContent {
    Text(Box<str>),
    Html(Box<str>),
}

impl Embed {
    fn media(url: impl Into<Box<str>>, is_video: bool) -> Self {
        Embed::ImageOrVideo {
            url: url.into(),
            is_video,
        }
    }

    fn unembeddable(reason: impl Into<Box<str>>) -> Self {
        Embed::Unembeddable {
            reason: reason.into(),
        }
    }
}
