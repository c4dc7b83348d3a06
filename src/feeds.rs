// src/feeds.rs
use anyhow::{Context, Result};
use futures::future::try_join_all;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::hoyolab::NewsSource;
use crate::item::build;
use crate::models::{Category, FeedItem, FeedMeta, RawFeedItem};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_built_total", "Items that passed validation.");
        describe_counter!(
            "feed_items_rejected_total",
            "Fetched items dropped because a field was invalid."
        );
        describe_counter!(
            "feed_fetch_errors_total",
            "Failed upstream fetches (one per game category)."
        );
    });
}

/// Build raw items, dropping (and logging) the invalid ones.
fn build_valid(source: &str, category: Category, raws: Vec<RawFeedItem>) -> Vec<FeedItem> {
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        let raw_id = raw.id.clone();
        match build(raw) {
            Ok(item) => out.push(item),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source,
                    category = %category,
                    id = ?raw_id,
                    "skipping invalid item"
                );
                counter!("feed_items_rejected_total").increment(1);
            }
        }
    }
    counter!("feed_items_built_total").increment(out.len() as u64);
    out
}

/// Keep the newest `size` items of one category, newest first.
fn cap_category(mut items: Vec<FeedItem>, size: usize) -> Vec<FeedItem> {
    items.sort_by(|a, b| b.id().cmp(&a.id()));
    items.truncate(size);
    items
}

/// Fetch every configured category of one game and return its items,
/// newest (highest id) first.
pub async fn fetch_game_items(source: &dyn NewsSource, meta: &FeedMeta) -> Result<Vec<FeedItem>> {
    ensure_metrics_described();

    let categories: &[Category] = if meta.categories.is_empty() {
        &Category::ALL
    } else {
        &meta.categories
    };

    // All categories are requested at once; results keep category order.
    let fetches = categories.iter().map(|&category| async move {
        match source
            .fetch_category(meta.game, meta.language, category, meta.category_size)
            .await
        {
            Ok(raws) => Ok((category, raws)),
            Err(e) => {
                counter!("feed_fetch_errors_total").increment(1);
                Err(e).with_context(|| {
                    format!("fetching {} {} from {}", meta.game.title(), category.title(), source.name())
                })
            }
        }
    });
    let fetched = try_join_all(fetches).await?;

    let mut combined = Vec::new();
    for (category, raws) in fetched {
        let items = build_valid(source.name(), category, raws);
        tracing::debug!(game = %meta.game, category = %category, count = items.len(), "category fetched");
        combined.extend(cap_category(items, meta.category_size));
    }

    combined.sort_by(|a, b| b.id().cmp(&a.id()));
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: i64) -> RawFeedItem {
        RawFeedItem {
            id: Some(json!(id)),
            title: Some(format!("Post {id}")),
            author: Some("Staff".into()),
            content: Some("<p>x</p>".into()),
            category: Some("events".into()),
            published: Some(json!(1_700_000_000 + id)),
            ..Default::default()
        }
    }

    #[test]
    fn invalid_items_are_skipped() {
        let mut bad = raw(2);
        bad.title = Some("   ".into());
        let items = build_valid("test", Category::Events, vec![raw(1), bad, raw(3)]);
        let ids: Vec<i64> = items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn cap_keeps_newest() {
        let items = build_valid("test", Category::Events, (1..=6).map(raw).collect());
        let capped = cap_category(items, 3);
        let ids: Vec<i64> = capped.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![6, 5, 4]);
    }
}
