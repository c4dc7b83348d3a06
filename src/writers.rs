//! JSON Feed 1.1 and Atom 1.0 output.
//!
//! Rendering is pure so it can be tested byte for byte; [`write_feed`] only
//! adds the file I/O.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use reqwest::Url;
use serde::Serialize;
use std::io::Write;

use crate::config::WriterConfig;
use crate::models::{FeedItem, FeedMeta, FeedType};

const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn item_tags(item: &FeedItem) -> Vec<String> {
    let mut tags = vec![item.category().title()];
    if let Some(game) = item.game() {
        tags.push(game.title());
    }
    tags
}

// ---------------------------------------------------------------------------
// JSON Feed
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: String,
    language: &'static str,
    home_page_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    feed_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    items: Vec<JsonFeedItem<'a>>,
}

#[derive(Serialize)]
struct JsonAuthor<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct JsonFeedItem<'a> {
    id: String,
    url: String,
    title: &'a str,
    authors: Vec<JsonAuthor<'a>>,
    tags: Vec<String>,
    content_html: &'a str,
    date_published: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    game: Option<&'static str>,
}

impl<'a> From<&'a FeedItem> for JsonFeedItem<'a> {
    fn from(item: &'a FeedItem) -> Self {
        Self {
            id: item.id().to_string(),
            url: item.url(),
            title: item.title(),
            authors: vec![JsonAuthor {
                name: item.author(),
            }],
            tags: item_tags(item),
            content_html: item.content(),
            date_published: rfc3339(item.published()),
            date_modified: item.updated().map(rfc3339),
            summary: item.summary(),
            image: item.image().map(Url::as_str),
            game: item.game().map(|g| g.name()),
        }
    }
}

pub fn render_json_feed(meta: &FeedMeta, items: &[FeedItem], feed_url: Option<&Url>) -> Result<String> {
    let feed = JsonFeed {
        version: JSON_FEED_VERSION,
        title: meta.display_title(),
        language: meta.language.code(),
        home_page_url: meta.display_home_page_url(),
        feed_url: feed_url.map(Url::as_str),
        icon: meta.icon.as_ref().map(Url::as_str),
        items: items.iter().map(JsonFeedItem::from).collect(),
    };
    serde_json::to_string(&feed).context("serializing JSON feed")
}

// ---------------------------------------------------------------------------
// Atom
// ---------------------------------------------------------------------------

fn text_element<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    start.extend_attributes(attrs.iter().copied());
    w.write_event(Event::Start(start))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn empty_element<W: Write>(w: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut start = BytesStart::new(name);
    start.extend_attributes(attrs.iter().copied());
    w.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_entry<W: Write>(w: &mut Writer<W>, item: &FeedItem) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new("entry")))?;

    let published_day = item.published().date_naive().format("%Y-%m-%d");
    text_element(w, "id", &[], &format!("tag:hoyolab.com,{published_day}:{}", item.id()))?;
    text_element(w, "title", &[], item.title())?;
    let url = item.url();
    empty_element(
        w,
        "link",
        &[("href", url.as_str()), ("rel", "alternate"), ("type", "text/html")],
    )?;
    for tag in item_tags(item) {
        empty_element(w, "category", &[("term", tag.as_str())])?;
    }
    text_element(w, "published", &[], &rfc3339(item.published()))?;
    text_element(
        w,
        "updated",
        &[],
        &rfc3339(item.updated().unwrap_or(item.published())),
    )?;

    w.write_event(Event::Start(BytesStart::new("author")))?;
    text_element(w, "name", &[], item.author())?;
    w.write_event(Event::End(BytesEnd::new("author")))?;

    text_element(w, "content", &[("type", "html")], item.content())?;
    if let Some(summary) = item.summary() {
        text_element(w, "summary", &[], summary)?;
    }

    w.write_event(Event::End(BytesEnd::new("entry")))?;
    Ok(())
}

/// Render an Atom document. `updated` is the feed-level timestamp.
pub fn render_atom_feed(
    meta: &FeedMeta,
    items: &[FeedItem],
    feed_url: Option<&Url>,
    updated: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("feed");
    root.push_attribute(("xmlns", ATOM_NS));
    root.push_attribute(("xml:lang", meta.language.code()));
    w.write_event(Event::Start(root))?;

    text_element(
        &mut w,
        "id",
        &[],
        &format!("tag:hoyolab.com,2021:/official/{}", meta.game.code()),
    )?;
    text_element(&mut w, "title", &[], &meta.display_title())?;
    text_element(&mut w, "updated", &[], &rfc3339(updated))?;
    let home = meta.display_home_page_url();
    empty_element(
        &mut w,
        "link",
        &[
            ("href", home.as_str()),
            ("rel", "alternate"),
            ("type", "text/html"),
        ],
    )?;
    if let Some(url) = feed_url {
        empty_element(
            &mut w,
            "link",
            &[
                ("href", url.as_str()),
                ("rel", "self"),
                ("type", "application/atom+xml"),
            ],
        )?;
    }
    if let Some(icon) = &meta.icon {
        text_element(&mut w, "icon", &[], icon.as_str())?;
    }

    for item in items {
        write_entry(&mut w, item)?;
    }

    w.write_event(Event::End(BytesEnd::new("feed")))?;
    Ok(w.into_inner())
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Render `items` in the writer's format and write them to its path.
pub async fn write_feed(config: &WriterConfig, meta: &FeedMeta, items: &[FeedItem]) -> Result<()> {
    let bytes = match config.feed_type {
        FeedType::Json => render_json_feed(meta, items, config.url.as_ref())?.into_bytes(),
        FeedType::Atom => render_atom_feed(meta, items, config.url.as_ref(), Utc::now())?,
    };

    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::write(&config.path, bytes).await.with_context(|| {
        format!(
            "could not write {} feed to {}",
            config.feed_type,
            config.path.display()
        )
    })?;

    tracing::debug!(path = %config.path.display(), format = %config.feed_type, items = items.len(), "feed written");
    Ok(())
}
