use std::sync::Arc;

use chat_embed::config::{Config, CONFIG_FILE};
use chat_embed::{render, EmbedCache, RenderContext, RenderSpec, Resolver};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Output<'a> {
    link: &'a str,
    #[serde(flatten)]
    spec: RenderSpec,
}

/// Read links from stdin, one per line, and print a render spec for each recognized one
async fn run(config: Config) -> anyhow::Result<()> {
    let resolver = Resolver::from_config(&config).await?;
    let cache = Arc::new(EmbedCache::new(
        resolver,
        config.cache_capacity,
        config.cache_ttl(),
    ));
    let ctx = RenderContext {
        dark_theme: config.dark_theme,
        suppress_notices_until: None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    while let Some(line) = lines.next_line().await? {
        let link = line.trim().to_owned();
        if link.is_empty() {
            continue;
        }
        let cache = Arc::clone(&cache);
        // Links are independent, a slow one shouldn't hold up the rest
        tasks.spawn(async move {
            let embed = cache.get_or_resolve(&link).await;
            if let Some(spec) = render(&embed, &ctx) {
                match serde_json::to_string(&Output { link: &link, spec }) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(%link, error = %e, "could not serialize render spec"),
                }
            }
        });
    }
    while tasks.join_next().await.is_some() {}
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::get_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Error reading {}: {}", CONFIG_FILE, e);
            std::process::exit(1);
        }
    };

    let mut sigterm = signal(SignalKind::terminate()).expect("Error creating SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Error creating SIGINT handler");

    tokio::select! {
        result = run(config) => {
            if let Err(e) = result {
                error!("Exited with error: {e:#}");
                std::process::exit(1);
            }
        }
        _ = sigterm.recv() => info!("Received SIGTERM, exiting"),
        _ = sigint.recv() => info!("Received SIGINT, exiting"),
    }
}
