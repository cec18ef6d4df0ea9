//! Turns links posted in chat into inline embeds.
//!
//! [`EmbedCache::get_or_resolve`] classifies a link, resolves it through the
//! matching provider and remembers the outcome. [`render`] turns the resulting
//! [`Embed`] into a description the page can build elements from.

pub mod config;
pub mod error;
pub mod link_embed;
pub mod render;

pub use config::Config;
pub use link_embed::{CacheKey, Embed, EmbedCache, EmbedResolver, PostContent, Resolver};
pub use render::{render, RenderContext, RenderSpec};
