//! Command-line surface and the two run modes: one feed per game, or a
//! single aggregate feed.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregate::{aggregate, AggregateOptions, SourceItems};
use crate::config::{self, FeedConfig, WriterConfig};
use crate::feeds::fetch_game_items;
use crate::hoyolab::{HoyolabClient, NewsSource};
use crate::models::{FeedMeta, FeedType};
use crate::writers::write_feed;

#[derive(Debug, Parser)]
#[command(name = "hoyolab-rss-feeds")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate HoYoLAB news feeds")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short = 'c', long)]
    pub config_path: Option<PathBuf>,

    /// Write ONE aggregated feed (instead of one per game) to this path
    #[arg(long)]
    pub single_feed_path: Option<PathBuf>,

    /// Format of the aggregated feed
    #[arg(long, value_enum, default_value_t = FeedType::Json)]
    pub single_feed_format: FeedType,

    /// Title of the aggregated feed
    #[arg(long, default_value = "Hoyolab - All Games")]
    pub single_feed_title: String,

    /// Home page URL of the aggregated feed
    #[arg(long, default_value = "https://www.hoyolab.com/")]
    pub single_home_url: String,

    /// Optional icon URL of the aggregated feed
    #[arg(long)]
    pub single_icon: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(short = 'l', long)]
    pub log_path: Option<PathBuf>,
}

pub async fn run(cli: Cli) -> Result<()> {
    let path = config::resolve_path(cli.config_path.as_deref());
    if !path.exists() {
        config::write_default(&path).await?;
        info!(path = %path.display(), "default config file created");
        return Ok(());
    }

    let feeds = config::load_from(&path)?;
    let source: Arc<dyn NewsSource> = Arc::new(HoyolabClient::new());

    match &cli.single_feed_path {
        None => create_feeds(source, feeds).await,
        Some(out) => {
            let options = AggregateOptions::from_args(
                Some(cli.single_feed_title.as_str()),
                Some(cli.single_home_url.as_str()),
                cli.single_icon.as_deref(),
            )?;
            let writer = WriterConfig {
                feed_type: cli.single_feed_format,
                path: out.clone(),
                url: None,
            };
            create_aggregate_feed(source, feeds, &options, &writer).await
        }
    }
}

/// Fetch one game and write all of its configured files.
pub async fn create_feed(source: &dyn NewsSource, feed: &FeedConfig) -> Result<()> {
    let title = feed.meta.display_title();
    let formats: Vec<&str> = feed.writers.iter().map(|w| w.feed_type.name()).collect();
    info!(feed = %title, formats = %formats.join(" & "), "creating feed");

    let items = fetch_game_items(source, &feed.meta).await?;
    for writer in &feed.writers {
        write_feed(writer, &feed.meta, &items).await?;
    }

    info!(feed = %title, items = items.len(), "feed written");
    Ok(())
}

/// Legacy mode: every configured game concurrently, each to its own files.
pub async fn create_feeds(source: Arc<dyn NewsSource>, feeds: Vec<FeedConfig>) -> Result<()> {
    let mut tasks = tokio::task::JoinSet::new();
    for feed in feeds {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let title = feed.meta.display_title();
            create_feed(source.as_ref(), &feed)
                .await
                .with_context(|| format!("feed \"{title}\""))
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined.context("feed task panicked")? {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %format!("{e:#}"), "feed not updated");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} feed(s) failed");
    }
    Ok(())
}

/// Aggregate mode: fetch all games concurrently, merge in config order and
/// write once. A game whose fetch fails contributes no items.
pub async fn create_aggregate_feed(
    source: Arc<dyn NewsSource>,
    feeds: Vec<FeedConfig>,
    options: &AggregateOptions,
    writer: &WriterConfig,
) -> Result<()> {
    let handles: Vec<_> = feeds
        .into_iter()
        .map(|feed| {
            let source = Arc::clone(&source);
            let meta: FeedMeta = feed.meta;
            tokio::spawn(async move {
                let items = fetch_game_items(source.as_ref(), &meta).await;
                (meta, items)
            })
        })
        .collect();

    let mut sources = Vec::with_capacity(handles.len());
    for handle in handles {
        let (meta, items) = handle.await.context("fetch task panicked")?;
        let items = items.unwrap_or_else(|e| {
            warn!(game = %meta.game, error = %format!("{e:#}"), "omitting game from aggregate feed");
            Vec::new()
        });
        sources.push(SourceItems { meta, items });
    }

    let merged = aggregate(sources, options)?;
    let meta = FeedMeta::from(&merged.meta);
    write_feed(writer, &meta, &merged.items).await?;

    info!(
        path = %writer.path.display(),
        format = %writer.feed_type,
        items = merged.items.len(),
        "aggregate feed written"
    );
    Ok(())
}
