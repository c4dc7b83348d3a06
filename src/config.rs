// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::{config_url, Category, FeedMeta, FeedType, Game, Language, DEFAULT_CATEGORY_SIZE};

const ENV_PATH: &str = "HOYOLAB_FEEDS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "hoyolab-rss-feeds.toml";

/// Written when no config file exists yet.
pub const DEFAULT_CONFIG: &str = r#"# One table per game: honkai, genshin, themis, starrail, zenless, nexus.
# The first table also provides language and categories for an aggregate feed.

[genshin]
feed.json.path = "genshin.json"
# feed.json.url = "https://example.org/genshin.json"
# feed.atom.path = "genshin.xml"
# title = "Genshin Impact News"
# icon = "https://example.org/genshin.png"
# home_page_url = "https://www.hoyolab.com/circles/2"
category_size = 5
categories = ["Notices", "Events", "Info"]
language = "en-us"
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub feed_type: FeedType,
    pub path: PathBuf,
    /// Public URL of the written file (`feed_url` / `rel="self"`).
    pub url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub meta: FeedMeta,
    pub writers: Vec<WriterConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGameConfig {
    feed: RawFeedFiles,
    title: Option<String>,
    icon: Option<String>,
    home_page_url: Option<String>,
    category_size: Option<i64>,
    categories: Option<Vec<String>>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFeedFiles {
    json: Option<RawFeedFile>,
    atom: Option<RawFeedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFeedFile {
    path: PathBuf,
    url: Option<String>,
}

/// Config path resolution:
/// 1) explicit path (CLI)
/// 2) $HOYOLAB_FEEDS_CONFIG
/// 3) ./hoyolab-rss-feeds.toml
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    match std::env::var(ENV_PATH) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Load all feed configs from a TOML file, in file order.
pub fn load_from(path: &Path) -> Result<Vec<FeedConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing config {}", path.display()))
}

pub async fn write_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(path, DEFAULT_CONFIG)
        .await
        .with_context(|| format!("writing default config to {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Vec<FeedConfig>> {
    let table: toml::Table = toml::from_str(s).context("invalid TOML")?;
    if table.is_empty() {
        bail!("config contains no feeds");
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(table.len());
    for (name, value) in table {
        let game: Game = name.parse()?;
        if !seen.insert(game) {
            bail!("game \"{name}\" is configured more than once");
        }
        let raw: RawGameConfig = value
            .try_into()
            .with_context(|| format!("invalid config for [{name}]"))?;
        let feed = build_feed_config(game, raw).with_context(|| format!("invalid config for [{name}]"))?;
        warn_on_duplicate_paths(&feed);
        out.push(feed);
    }
    Ok(out)
}

fn build_feed_config(game: Game, raw: RawGameConfig) -> Result<FeedConfig> {
    let mut meta = FeedMeta::new(game);

    let size = raw.category_size.unwrap_or(DEFAULT_CATEGORY_SIZE as i64);
    meta.category_size = usize::try_from(size)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| ConfigError::InvalidValue {
            field: "category_size",
            reason: format!("must be at least 1, got {size}"),
        })?;

    if let Some(names) = raw.categories {
        let mut categories = Vec::with_capacity(names.len());
        for name in names {
            let c: Category = name.parse()?;
            if !categories.contains(&c) {
                categories.push(c);
            }
        }
        if !categories.is_empty() {
            meta.categories = categories;
        }
    }

    if let Some(lang) = raw.language {
        meta.language = lang.parse::<Language>()?;
    }
    meta.title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    meta.icon = raw.icon.map(|s| config_url("icon", &s)).transpose()?;
    meta.home_page_url = raw
        .home_page_url
        .map(|s| config_url("home_page_url", &s))
        .transpose()?;

    let mut writers = Vec::new();
    for (feed_type, file) in [(FeedType::Json, raw.feed.json), (FeedType::Atom, raw.feed.atom)] {
        if let Some(file) = file {
            writers.push(WriterConfig {
                feed_type,
                path: file.path,
                url: file.url.map(|s| config_url("url", &s)).transpose()?,
            });
        }
    }
    if writers.is_empty() {
        return Err(anyhow!("at least one of feed.json or feed.atom is required"));
    }

    Ok(FeedConfig { meta, writers })
}

fn warn_on_duplicate_paths(feed: &FeedConfig) {
    let mut paths = HashSet::new();
    if feed.writers.iter().any(|w| !paths.insert(&w.path)) {
        tracing::warn!(
            feed = %feed.meta.display_title(),
            "writers for this feed share an output path"
        );
    }
}
