//! Merging several games' items into one feed.

use reqwest::Url;

use crate::error::ConfigError;
use crate::models::{config_url, AggregateFeedMeta, FeedItem, FeedMeta, Game};

/// One source's metadata and its already ordered items.
#[derive(Debug, Clone)]
pub struct SourceItems {
    pub meta: FeedMeta,
    pub items: Vec<FeedItem>,
}

/// Caller-supplied overrides for the merged feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub title: Option<String>,
    pub home_page_url: Option<Url>,
    pub icon: Option<Url>,
}

impl AggregateOptions {
    /// Build from loose strings, treating blank values as absent.
    pub fn from_args(
        title: Option<&str>,
        home_page_url: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Self, ConfigError> {
        fn blank_to_none(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        Ok(Self {
            title: blank_to_none(title).map(str::to_string),
            home_page_url: blank_to_none(home_page_url)
                .map(|s| config_url("home_page_url", s))
                .transpose()?,
            icon: blank_to_none(icon)
                .map(|s| config_url("icon", s))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub items: Vec<FeedItem>,
    pub meta: AggregateFeedMeta,
}

/// Concatenate in source order, then stable-sort by id, newest first.
/// Equal ids keep the order of first appearance.
pub fn merge_items<I>(lists: I) -> Vec<FeedItem>
where
    I: IntoIterator<Item = Vec<FeedItem>>,
{
    let mut merged: Vec<FeedItem> = lists.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.id.cmp(&a.id));
    merged
}

/// Merge all sources into one ordered item list plus metadata inherited from
/// the first source. Category filtering is not reapplied here.
///
/// With no sources at all the metadata falls back to [`FeedMeta::new`]
/// defaults with [`Game::Honkai`] as placeholder.
pub fn aggregate(
    sources: Vec<SourceItems>,
    options: &AggregateOptions,
) -> Result<Aggregate, ConfigError> {
    let home_page_url = options
        .home_page_url
        .clone()
        .ok_or(ConfigError::MissingHomePageUrl)?;

    let first = sources
        .first()
        .map(|s| s.meta.clone())
        .unwrap_or_else(|| FeedMeta::new(Game::Honkai));

    let meta = AggregateFeedMeta {
        game: first.game,
        category_size: first.category_size,
        categories: first.categories,
        language: first.language,
        title: options.title.clone(),
        icon: options.icon.clone(),
        home_page_url,
    };

    let items = merge_items(sources.into_iter().map(|s| s.items));
    Ok(Aggregate { items, meta })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_page_url_is_mandatory() {
        let err = aggregate(Vec::new(), &AggregateOptions::default()).unwrap_err();
        assert_eq!(err, ConfigError::MissingHomePageUrl);
    }

    #[test]
    fn blank_args_are_absent() {
        let opts = AggregateOptions::from_args(Some("  "), Some(""), None).unwrap();
        assert_eq!(opts, AggregateOptions::default());
    }

    #[test]
    fn bad_icon_is_a_config_error() {
        let err = AggregateOptions::from_args(None, Some("https://www.hoyolab.com/"), Some("icon.png"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { field: "icon", .. }));
    }

    #[test]
    fn no_sources_is_empty_not_error() {
        let opts = AggregateOptions::from_args(None, Some("https://www.hoyolab.com/"), None).unwrap();
        let agg = aggregate(Vec::new(), &opts).unwrap();
        assert!(agg.items.is_empty());
        assert_eq!(agg.meta.game, Game::Honkai);
        assert_eq!(agg.meta.home_page_url.as_str(), "https://www.hoyolab.com/");
    }
}
