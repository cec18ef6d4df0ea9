//! Live lookups used to classify hosts that can't be told apart by url shape.

use reqwest::{header, Client};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::fetch_json;

/// Relations a nodeinfo discovery document advertises its schema under
static NODEINFO_SCHEMAS: [&str; 2] = [
    "http://nodeinfo.diaspora.software/ns/schema/2.0",
    "http://nodeinfo.diaspora.software/ns/schema/2.1",
];

#[derive(Deserialize, Debug)]
struct Discovery {
    links: Vec<Link>,
}

#[derive(Deserialize, Debug)]
struct Link {
    rel: Box<str>,
}

/// Origin of a url as used for api calls, e.g. `https://mastodon.social`
pub fn origin(url: &Url) -> Box<str> {
    url.origin().ascii_serialization().into()
}

/// Whether the url's host serves a nodeinfo discovery document, i.e. it's a federated server.
/// Failures of any kind mean "no".
pub async fn is_federated(client: &Client, url: &Url) -> bool {
    let endpoint = format!("{}/.well-known/nodeinfo", origin(url));
    let request = client.get(&endpoint).header(header::ACCEPT, "application/json");
    match fetch_json::<Discovery>(request).await {
        Ok(discovery) => discovery
            .links
            .iter()
            .any(|link| NODEINFO_SCHEMAS.contains(&&*link.rel)),
        Err(e) => {
            debug!(%endpoint, error = %e, "nodeinfo probe failed");
            false
        }
    }
}

/// One-time check whether the image host refuses requests made on behalf of `embed_origin`.
/// A request that never gets an answer counts as not blocked.
pub async fn image_host_blocked(client: &Client, probe_url: &str, embed_origin: &str) -> bool {
    let response = client
        .get(probe_url)
        .header(header::ORIGIN, embed_origin)
        .header(header::REFERER, format!("{}/", embed_origin.trim_end_matches('/')))
        .send()
        .await;
    let blocked = match response {
        Ok(response) => !response.status().is_success(),
        Err(e) => {
            debug!(%probe_url, error = %e, "image host probe failed");
            false
        }
    };
    info!(%probe_url, blocked, "probed image host");
    blocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn server_url(server: &Server, path: &str) -> Url {
        Url::parse(&format!("{}{path}", server.url())).unwrap()
    }

    #[tokio::test]
    async fn nodeinfo_schema_detected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/.well-known/nodeinfo")
            .with_status(200)
            .with_body(
                r#"{"links":[{"rel":"http://nodeinfo.diaspora.software/ns/schema/2.0",
                    "href":"https://mastodon.example/nodeinfo/2.0"}]}"#,
            )
            .create_async()
            .await;

        assert!(is_federated(&Client::new(), &server_url(&server, "/@alice/1")).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn other_relations_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/.well-known/nodeinfo")
            .with_status(200)
            .with_body(r#"{"links":[{"rel":"http://example.com/ns/schema/2.0","href":"x"}]}"#)
            .create_async()
            .await;

        assert!(!is_federated(&Client::new(), &server_url(&server, "/@alice/1")).await);
    }

    #[tokio::test]
    async fn not_found_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/.well-known/nodeinfo")
            .with_status(404)
            .create_async()
            .await;

        assert!(!is_federated(&Client::new(), &server_url(&server, "/@alice/1")).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unparseable_document_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/.well-known/nodeinfo")
            .with_status(200)
            .with_body("<html>hello</html>")
            .create_async()
            .await;

        assert!(!is_federated(&Client::new(), &server_url(&server, "/@alice/1")).await);
    }

    #[tokio::test]
    async fn unreachable_host_rejected() {
        let url = Url::parse("http://127.0.0.1:9/@alice/1").unwrap();
        assert!(!is_federated(&Client::new(), &url).await);
    }

    #[tokio::test]
    async fn image_host_block_detection() {
        let mut server = Server::new_async().await;
        let _blocked = server
            .mock("GET", "/blocked.png")
            .match_header("referer", "https://www.twitch.tv/")
            .with_status(403)
            .create_async()
            .await;
        let _open = server
            .mock("GET", "/open.png")
            .with_status(200)
            .with_body("png")
            .create_async()
            .await;

        let client = Client::new();
        let origin = "https://www.twitch.tv";
        assert!(image_host_blocked(&client, &format!("{}/blocked.png", server.url()), origin).await);
        assert!(!image_host_blocked(&client, &format!("{}/open.png", server.url()), origin).await);
        assert!(!image_host_blocked(&client, "http://127.0.0.1:9/x.png", origin).await);
    }
}
