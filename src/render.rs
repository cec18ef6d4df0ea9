//! Host independent description of how an [`Embed`] should be shown.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::OffsetDateTime;

use crate::link_embed::{Embed, PostContent};

static TWITTER_WIDGET_SCRIPT: &str = "https://platform.twitter.com/widgets.js";

/// State owned by the surrounding page that affects rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext {
    pub dark_theme: bool,
    /// Notices stay hidden until this moment, set when the user asks for fewer reminders
    pub suppress_notices_until: Option<OffsetDateTime>,
}

impl RenderContext {
    fn notices_suppressed(&self, now: OffsetDateTime) -> bool {
        self.suppress_notices_until.map_or(false, |until| now < until)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Image,
    Video,
}

/// Event after which a hidden element may be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadySignal {
    Load,
    CanPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// A script found in injected markup. Scripts inserted as markup never run,
/// so these must be recreated as fresh script elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub src: Option<Box<str>>,
    pub inline: Option<Box<str>>,
}

/// Markup with its scripts split out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Markup {
    pub html: Box<str>,
    pub scripts: Vec<Script>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderSpec {
    Media {
        kind: ElementKind,
        src: Box<str>,
        /// The element starts hidden and is revealed on this signal
        reveal_on: ReadySignal,
        muted: bool,
        looping: bool,
        autoplay: bool,
    },
    SocialPostWidget {
        post_url: Box<str>,
        theme: Theme,
        markup: Markup,
    },
    Card {
        avatar_url: Option<Box<str>>,
        profile_url: Box<str>,
        handle: Box<str>,
        display_name: Box<str>,
        body: Markup,
    },
    Notice {
        message: Box<str>,
        dismissible: bool,
        /// Offer the "hide these for a while" option next to dismissal
        offer_suppression: bool,
    },
}

pub fn render(embed: &Embed, ctx: &RenderContext) -> Option<RenderSpec> {
    render_at(embed, ctx, OffsetDateTime::now_utc())
}

pub fn render_at(embed: &Embed, ctx: &RenderContext, now: OffsetDateTime) -> Option<RenderSpec> {
    match embed {
        Embed::Unrecognized => None,
        Embed::ImageOrVideo { url, is_video } => Some(media(url, *is_video)),
        Embed::SocialPost { url } => Some(social_post(url, ctx.dark_theme)),
        Embed::MicroblogSnapshot {
            avatar_url,
            author_profile_url,
            handle,
            display_name,
            content,
        } => Some(RenderSpec::Card {
            avatar_url: avatar_url.clone(),
            profile_url: author_profile_url.clone(),
            handle: handle.clone(),
            display_name: display_name.clone(),
            body: post_body(content),
        }),
        Embed::Unembeddable { .. } if ctx.notices_suppressed(now) => None,
        Embed::Unembeddable { reason } => Some(RenderSpec::Notice {
            message: reason.clone(),
            dismissible: true,
            offer_suppression: true,
        }),
    }
}

fn media(url: &str, is_video: bool) -> RenderSpec {
    if is_video {
        RenderSpec::Media {
            kind: ElementKind::Video,
            src: url.into(),
            reveal_on: ReadySignal::CanPlay,
            muted: true,
            looping: true,
            autoplay: true,
        }
    } else {
        RenderSpec::Media {
            kind: ElementKind::Image,
            src: url.into(),
            reveal_on: ReadySignal::Load,
            muted: false,
            looping: false,
            autoplay: false,
        }
    }
}

fn social_post(url: &str, dark_theme: bool) -> RenderSpec {
    let theme = if dark_theme { Theme::Dark } else { Theme::Light };
    let theme_attr = match theme {
        Theme::Dark => "dark",
        Theme::Light => "light",
    };
    let html = format!(
        r#"<blockquote class="twitter-tweet" data-dnt="true" data-theme="{theme_attr}"><a href="{}"></a></blockquote>"#,
        html_escape::encode_double_quoted_attribute(url)
    );
    RenderSpec::SocialPostWidget {
        post_url: url.into(),
        theme,
        markup: Markup {
            html: html.into(),
            scripts: vec![Script {
                src: Some(TWITTER_WIDGET_SCRIPT.into()),
                inline: None,
            }],
        },
    }
}

fn post_body(content: &PostContent) -> Markup {
    match content {
        PostContent::Text(text) => Markup {
            html: html_escape::encode_text(text).replace('\n', "<br>").into(),
            scripts: Vec::new(),
        },
        PostContent::Html(html) => extract_scripts(html),
    }
}

/// Split `<script>` elements out of markup
pub fn extract_scripts(html: &str) -> Markup {
    static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?is)<script\b(?P<attrs>[^>]*)>(?P<body>.*?)</script\s*>").unwrap()
    });
    static SRC_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?i)\bsrc\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).unwrap()
    });

    let scripts = SCRIPT_RE
        .captures_iter(html)
        .map(|cap| {
            let src = cap
                .name("attrs")
                .and_then(|attrs| SRC_RE.captures(attrs.as_str()))
                .and_then(|src| src.name("dq").or_else(|| src.name("sq")))
                .map(|src| html_escape::decode_html_entities(src.as_str()).into());
            let inline = cap
                .name("body")
                .map(|body| body.as_str().trim())
                .filter(|body| !body.is_empty())
                .map(Into::into);
            Script { src, inline }
        })
        .collect();

    Markup {
        html: SCRIPT_RE.replace_all(html, "").into(),
        scripts,
    }
}
