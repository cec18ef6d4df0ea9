use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::matchers::bluesky_path;
use super::{Embed, PostContent};
use crate::error::{fetch_json, FetchError};

#[derive(Deserialize, Debug)]
struct ThreadResponse {
    thread: Thread,
}

#[derive(Deserialize, Debug)]
struct Thread {
    post: Post,
}

#[derive(Deserialize, Debug)]
struct Post {
    author: Author,
    record: Record,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Author {
    handle: Box<str>,
    display_name: Option<Box<str>>,
    avatar: Option<Box<str>>,
}

#[derive(Deserialize, Debug)]
struct Record {
    #[serde(default)]
    text: Box<str>,
}

pub(crate) async fn resolve(client: &Client, api_base: &str, url: &Url) -> Embed {
    let Some(post) = bluesky_path(url) else {
        debug!(%url, "bluesky link is not a post");
        return Embed::Unrecognized;
    };
    let uri = format!("at://{}/app.bsky.feed.post/{}", post.user, post.id);
    match fetch_post(client, api_base, &uri).await {
        Ok(post) => snapshot(post),
        Err(e) => {
            debug!(%url, %uri, error = %e, "bluesky post lookup failed");
            Embed::Unrecognized
        }
    }
}

async fn fetch_post(client: &Client, api_base: &str, uri: &str) -> Result<Post, FetchError> {
    let endpoint = format!(
        "{}/app.bsky.feed.getPostThread",
        api_base.trim_end_matches('/')
    );
    let request = client
        .get(endpoint)
        .query(&[("uri", uri), ("depth", "0"), ("parentHeight", "0")]);
    let response: ThreadResponse = fetch_json(request).await?;
    Ok(response.thread.post)
}

fn snapshot(post: Post) -> Embed {
    let Author {
        handle,
        display_name,
        avatar,
    } = post.author;
    let display_name = display_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| handle.clone());
    Embed::MicroblogSnapshot {
        avatar_url: avatar,
        author_profile_url: format!("https://bsky.app/profile/{handle}").into(),
        handle: format!("@{handle}").into(),
        display_name,
        content: PostContent::Text(post.record.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn post_thread_mapped_to_snapshot() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/app.bsky.feed.getPostThread")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "uri".into(),
                    "at://alice.example.com/app.bsky.feed.post/3kabc123".into(),
                ),
                Matcher::UrlEncoded("depth".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"thread":{"$type":"app.bsky.feed.defs#threadViewPost","post":{
                    "uri":"at://did:plc:abc/app.bsky.feed.post/3kabc123",
                    "author":{"did":"did:plc:abc","handle":"alice.example.com",
                        "displayName":"Alice","avatar":"https://cdn.bsky.app/avatar.jpg"},
                    "record":{"$type":"app.bsky.feed.post","text":"hello\nworld"}}}}"#,
            )
            .create_async()
            .await;

        let url = Url::parse("https://bsky.app/profile/alice.example.com/post/3kabc123").unwrap();
        let embed = resolve(&Client::new(), &server.url(), &url).await;

        mock.assert_async().await;
        assert_eq!(
            Embed::MicroblogSnapshot {
                avatar_url: Some("https://cdn.bsky.app/avatar.jpg".into()),
                author_profile_url: "https://bsky.app/profile/alice.example.com".into(),
                handle: "@alice.example.com".into(),
                display_name: "Alice".into(),
                content: PostContent::Text("hello\nworld".into()),
            },
            embed
        );
    }

    #[tokio::test]
    async fn missing_display_name_falls_back_to_handle() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/app.bsky.feed.getPostThread")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"thread":{"post":{"author":{"handle":"bob.bsky.social","displayName":""},
                    "record":{"text":"hi"}}}}"#,
            )
            .create_async()
            .await;

        let url = Url::parse("https://bsky.app/profile/bob.bsky.social/post/3kxyz").unwrap();
        let Embed::MicroblogSnapshot {
            display_name,
            avatar_url,
            ..
        } = resolve(&Client::new(), &server.url(), &url).await
        else {
            panic!("expected a snapshot");
        };
        assert_eq!("bob.bsky.social", &*display_name);
        assert_eq!(None, avatar_url);
    }

    #[tokio::test]
    async fn deleted_post_unrecognized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/app.bsky.feed.getPostThread")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"NotFound","message":"Post not found"}"#)
            .create_async()
            .await;

        let url = Url::parse("https://bsky.app/profile/bob.bsky.social/post/3kxyz").unwrap();
        assert_eq!(Embed::Unrecognized, resolve(&Client::new(), &server.url(), &url).await);
    }

    #[tokio::test]
    async fn profile_link_not_fetched() {
        let url = Url::parse("https://bsky.app/profile/bob.bsky.social").unwrap();
        assert_eq!(
            Embed::Unrecognized,
            resolve(&Client::new(), "http://127.0.0.1:9", &url).await
        );
    }
}
