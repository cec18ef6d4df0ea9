use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::matchers::fediverse_path;
use super::probe::origin;
use super::{Embed, PostContent};
use crate::error::{fetch_json, FetchError};

#[derive(Deserialize, Debug)]
struct Status {
    content: Box<str>,
    account: Account,
}

#[derive(Deserialize, Debug)]
struct Account {
    acct: Box<str>,
    url: Box<str>,
    #[serde(default)]
    display_name: Box<str>,
    avatar: Option<Box<str>>,
}

/// Resolve a status on a host already known to be federated
pub(crate) async fn resolve(client: &Client, url: &Url) -> Embed {
    let Some(status) = fediverse_path(url) else {
        debug!(%url, "federated link is not a status");
        return Embed::Unrecognized;
    };
    match fetch_status(client, url, &status.id).await {
        Ok(status) => snapshot(status),
        Err(e) => {
            debug!(%url, error = %e, "status lookup failed");
            Embed::Unrecognized
        }
    }
}

async fn fetch_status(client: &Client, url: &Url, id: &str) -> Result<Status, FetchError> {
    let endpoint = format!("{}/api/v1/statuses/{id}", origin(url));
    fetch_json(client.get(endpoint)).await
}

fn snapshot(status: Status) -> Embed {
    let Account {
        acct,
        url,
        display_name,
        avatar,
    } = status.account;
    let display_name = if display_name.trim().is_empty() {
        acct.clone()
    } else {
        display_name
    };
    Embed::MicroblogSnapshot {
        avatar_url: avatar,
        author_profile_url: url,
        handle: format!("@{acct}").into(),
        display_name,
        content: PostContent::Html(status.content),
    }
}
