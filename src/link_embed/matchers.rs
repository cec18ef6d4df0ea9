//! URL shape matchers for every supported provider.
//!
//! Matchers never perform I/O and never fail: a URL that does not have the
//! expected shape is simply `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Parse a link taken from a chat message, only http(s) links with a host are accepted
pub fn parse_link(link: &str) -> Option<Url> {
    let url = Url::parse(link.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMedia {
    pub is_video: bool,
}

/// Links that point straight at an image or video file
pub fn direct_media(url: &Url) -> Option<DirectMedia> {
    static EXT_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\.(?P<ext>jpe?g|png|gif|avif|webp|mp4)$").unwrap()
    });
    let extension = EXT_RE.captures(url.path())?.name("ext")?.as_str();
    Some(DirectMedia {
        is_video: extension.eq_ignore_ascii_case("mp4"),
    })
}

/// Top level giphy pages that share the `/<token>` shape of short links
static GIPHY_PAGES: &[&str] = &[
    "gifs", "explore", "stickers", "search", "trending", "clips", "categories",
    "reactions", "artists", "channel", "upload", "create", "login", "signup", "apps",
];

/// `/gifs/funny-cat-1234abcd` style short links, the id is the token after the last hyphen
pub fn giphy_id(url: &Url) -> Option<Box<str>> {
    static PATH_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^/(?:gifs/)?(?:[A-Za-z0-9_]+-)*(?P<id>[A-Za-z0-9_]+)/?$").unwrap()
    });
    PATH_RE
        .captures(url.path())
        .and_then(|cap| cap.name("id"))
        .map(|id| id.as_str())
        .filter(|id| !GIPHY_PAGES.iter().any(|page| page.eq_ignore_ascii_case(id)))
        .map(Into::into)
}

pub fn youtube_id(url: &Url) -> Option<Box<str>> {
    static YT_ID_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:youtu\.be/|youtube\.com/watch\?v=)(?P<id>[\w\-]+)").unwrap()
    });
    YT_ID_RE
        .captures(url.as_str())
        .and_then(|cap| cap.name("id"))
        .map(|id| id.as_str().into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetPath {
    pub user: Box<str>,
    /// Snowflake ids overflow an f64, so they are never parsed
    pub id: Box<str>,
}

pub fn tweet_path(url: &Url) -> Option<TweetPath> {
    static TWEET_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^/(?P<user>[A-Za-z0-9_]{4,15})/status/(?P<id>\d+)(?:/|$)").unwrap()
    });
    let cap = TWEET_RE.captures(url.path())?;
    Some(TweetPath {
        user: cap.name("user")?.as_str().into(),
        id: cap.name("id")?.as_str().into(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueskyPath {
    /// Handle (possibly a custom domain) or DID
    pub user: Box<str>,
    pub id: Box<str>,
}

pub fn bluesky_path(url: &Url) -> Option<BlueskyPath> {
    static POST_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^/profile/(?P<user>[A-Za-z0-9_.:\-]+)/post/(?P<id>[A-Za-z0-9]+)/?$")
            .unwrap()
    });
    let cap = POST_RE.captures(url.path())?;
    Some(BlueskyPath {
        user: cap.name("user")?.as_str().into(),
        id: cap.name("id")?.as_str().into(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FediversePath {
    pub user: Box<str>,
    pub remote_host: Option<Box<str>>,
    pub id: Box<str>,
}

/// Cheap pre-check before a host is probed for federation support
pub fn has_fediverse_prefix(url: &Url) -> bool {
    url.path().starts_with("/@")
}

pub fn fediverse_path(url: &Url) -> Option<FediversePath> {
    static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^/@(?P<user>[A-Za-z0-9_.]+)(?:@(?P<host>[A-Za-z0-9.\-]+))?/(?P<id>\d+)/?$")
            .unwrap()
    });
    let cap = STATUS_RE.captures(url.path())?;
    Some(FediversePath {
        user: cap.name("user")?.as_str().into(),
        remote_host: cap.name("host").map(|h| h.as_str().into()),
        id: cap.name("id")?.as_str().into(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImgurPath {
    Album(Box<str>),
    Gallery(Box<str>),
    Image(Box<str>),
    /// Tag, topic and user pages list many posts and are not resolved
    Collection,
}

pub fn imgur_path(url: &Url) -> Option<ImgurPath> {
    static COLLECTION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^/(?:t|topic|user)/").unwrap());
    static ALBUM_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^/(?P<kind>a|gallery)/(?:[A-Za-z0-9_]+-)*(?P<id>[A-Za-z0-9]+)/?$").unwrap()
    });
    static IMAGE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^/(?P<id>[A-Za-z0-9]{5,})(?:\.gifv)?/?$").unwrap());

    let path = url.path();
    if COLLECTION_RE.is_match(path) {
        return Some(ImgurPath::Collection);
    }
    if let Some(cap) = ALBUM_RE.captures(path) {
        let id: Box<str> = cap.name("id")?.as_str().into();
        return match cap.name("kind")?.as_str() {
            "a" => Some(ImgurPath::Album(id)),
            _ => Some(ImgurPath::Gallery(id)),
        };
    }
    IMAGE_RE
        .captures(path)
        .and_then(|cap| cap.name("id"))
        .map(|id| ImgurPath::Image(id.as_str().into()))
}
