// src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{ConfigError, ParseError};

/// Case-insensitive lookup in a precomputed `(name, value)` table.
fn lookup<T: Copy>(table: &[(&str, T)], enumeration: &'static str, s: &str) -> Result<T, ParseError> {
    let needle = s.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(needle))
        .map(|(_, v)| *v)
        .ok_or_else(|| ParseError::new(enumeration, s))
}

/// Upper-case variant name to title case ("NOTICES" -> "Notices").
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Category {
    Notices = 1,
    Events = 2,
    Info = 3,
}

const CATEGORY_NAMES: &[(&str, Category)] = &[
    ("NOTICES", Category::Notices),
    ("EVENTS", Category::Events),
    ("INFO", Category::Info),
];

impl Category {
    pub const ALL: [Category; 3] = [Category::Notices, Category::Events, Category::Info];

    /// Numeric code used by the upstream API (`type` parameter).
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Notices => "NOTICES",
            Self::Events => "EVENTS",
            Self::Info => "INFO",
        }
    }

    pub fn title(self) -> String {
        title_case(self.name())
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(CATEGORY_NAMES, "category", s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Supported titles. Codes are the upstream `gids`; 3, 5 and 7 are not games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Game {
    Honkai = 1,
    Genshin = 2,
    Themis = 4,
    Starrail = 6,
    Zenless = 8,
    Nexus = 9,
}

const GAME_NAMES: &[(&str, Game)] = &[
    ("HONKAI", Game::Honkai),
    ("GENSHIN", Game::Genshin),
    ("THEMIS", Game::Themis),
    ("STARRAIL", Game::Starrail),
    ("ZENLESS", Game::Zenless),
    ("NEXUS", Game::Nexus),
];

impl Game {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Honkai => "HONKAI",
            Self::Genshin => "GENSHIN",
            Self::Themis => "THEMIS",
            Self::Starrail => "STARRAIL",
            Self::Zenless => "ZENLESS",
            Self::Nexus => "NEXUS",
        }
    }

    pub fn title(self) -> String {
        title_case(self.name())
    }
}

impl FromStr for Game {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(GAME_NAMES, "game", s)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    German,
    #[default]
    English,
    Spanish,
    French,
    Indonesian,
    Italian,
    Japanese,
    Korean,
    Portuguese,
    Russian,
    Thai,
    Turkish,
    Vietnamese,
    ChineseCn,
    ChineseTw,
}

/// Accepts both the region code and the variant name.
const LANGUAGE_NAMES: &[(&str, Language)] = &[
    ("de-de", Language::German),
    ("en-us", Language::English),
    ("es-es", Language::Spanish),
    ("fr-fr", Language::French),
    ("id-id", Language::Indonesian),
    ("it-it", Language::Italian),
    ("ja-jp", Language::Japanese),
    ("ko-kr", Language::Korean),
    ("pt-pt", Language::Portuguese),
    ("ru-ru", Language::Russian),
    ("th-th", Language::Thai),
    ("tr-tr", Language::Turkish),
    ("vi-vn", Language::Vietnamese),
    ("zh-cn", Language::ChineseCn),
    ("zh-tw", Language::ChineseTw),
    ("GERMAN", Language::German),
    ("ENGLISH", Language::English),
    ("SPANISH", Language::Spanish),
    ("FRENCH", Language::French),
    ("INDONESIAN", Language::Indonesian),
    ("ITALIAN", Language::Italian),
    ("JAPANESE", Language::Japanese),
    ("KOREAN", Language::Korean),
    ("PORTUGUESE", Language::Portuguese),
    ("RUSSIAN", Language::Russian),
    ("THAI", Language::Thai),
    ("TURKISH", Language::Turkish),
    ("VIETNAMESE", Language::Vietnamese),
    ("CHINESE_CN", Language::ChineseCn),
    ("CHINESE_TW", Language::ChineseTw),
];

impl Language {
    /// Lowercase locale tag, as sent in `x-rpc-language` and written to feeds.
    pub fn code(self) -> &'static str {
        match self {
            Self::German => "de-de",
            Self::English => "en-us",
            Self::Spanish => "es-es",
            Self::French => "fr-fr",
            Self::Indonesian => "id-id",
            Self::Italian => "it-it",
            Self::Japanese => "ja-jp",
            Self::Korean => "ko-kr",
            Self::Portuguese => "pt-pt",
            Self::Russian => "ru-ru",
            Self::Thai => "th-th",
            Self::Turkish => "tr-tr",
            Self::Vietnamese => "vi-vn",
            Self::ChineseCn => "zh-cn",
            Self::ChineseTw => "zh-tw",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(LANGUAGE_NAMES, "language", s)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// FeedType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum FeedType {
    Json,
    Atom,
}

impl FeedType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Atom => "atom",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

/// Parse an absolute http(s) URL.
pub fn parse_http_url(s: &str) -> Option<Url> {
    Url::parse(s.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

pub(crate) fn config_url(field: &'static str, s: &str) -> Result<Url, ConfigError> {
    parse_http_url(s).ok_or_else(|| ConfigError::InvalidUrl {
        field,
        value: s.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Feed metadata
// ---------------------------------------------------------------------------

pub const DEFAULT_CATEGORY_SIZE: usize = 5;

/// Metadata of a single-game feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    pub game: Game,
    /// Max items kept per category.
    pub category_size: usize,
    pub categories: Vec<Category>,
    pub language: Language,
    pub title: Option<String>,
    pub icon: Option<Url>,
    pub home_page_url: Option<Url>,
}

impl FeedMeta {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            category_size: DEFAULT_CATEGORY_SIZE,
            categories: Category::ALL.to_vec(),
            language: Language::default(),
            title: None,
            icon: None,
            home_page_url: None,
        }
    }

    /// Configured title, or "<Game> News".
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("{} News", self.game.title()))
    }

    /// Configured home page, or the game's HoYoLAB circle.
    pub fn display_home_page_url(&self) -> String {
        match &self.home_page_url {
            Some(u) => u.to_string(),
            None => format!("https://www.hoyolab.com/circles/{}", self.game.code()),
        }
    }
}

/// Metadata of a feed merged from several games.
///
/// `game` is only a placeholder inherited from the first source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateFeedMeta {
    pub game: Game,
    pub category_size: usize,
    pub categories: Vec<Category>,
    pub language: Language,
    pub title: Option<String>,
    pub icon: Option<Url>,
    pub home_page_url: Url,
}

impl From<&AggregateFeedMeta> for FeedMeta {
    fn from(meta: &AggregateFeedMeta) -> Self {
        Self {
            game: meta.game,
            category_size: meta.category_size,
            categories: meta.categories.clone(),
            language: meta.language,
            title: meta.title.clone(),
            icon: meta.icon.clone(),
            home_page_url: Some(meta.home_page_url.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Untrusted item fields as delivered by a fetch client.
///
/// `id` and the timestamps stay loosely typed: upstream sends ids as strings
/// and times as unix seconds, fixtures may use numbers and RFC 3339.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawFeedItem {
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub published: Option<serde_json::Value>,
    pub updated: Option<serde_json::Value>,
    pub image: Option<String>,
    pub summary: Option<String>,
    pub game: Option<String>,
}

/// One validated announcement. Only constructed by [`crate::item::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) category: Category,
    pub(crate) published: DateTime<Utc>,
    pub(crate) updated: Option<DateTime<Utc>>,
    pub(crate) image: Option<Url>,
    pub(crate) summary: Option<String>,
    pub(crate) game: Option<Game>,
}

impl FeedItem {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Original markup, verbatim.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn published(&self) -> DateTime<Utc> {
        self.published
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn image(&self) -> Option<&Url> {
        self.image.as_ref()
    }

    /// Plain-text summary.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn game(&self) -> Option<Game> {
        self.game
    }

    /// Article page on HoYoLAB.
    pub fn url(&self) -> String {
        format!("https://www.hoyolab.com/article/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!("events".parse::<Category>().unwrap(), Category::Events);
        assert_eq!("Notices".parse::<Category>().unwrap(), Category::Notices);
        assert_eq!(" INFO ".parse::<Category>().unwrap(), Category::Info);
    }

    #[test]
    fn unknown_category_carries_raw_value() {
        let err = "bogus".parse::<Category>().unwrap_err();
        assert_eq!(err.enumeration, "category");
        assert_eq!(err.value, "bogus");
    }

    #[test]
    fn game_codes_are_sparse() {
        assert_eq!(Game::Honkai.code(), 1);
        assert_eq!(Game::Themis.code(), 4);
        assert_eq!(Game::Nexus.code(), 9);
        assert_eq!("starRail".parse::<Game>().unwrap(), Game::Starrail);
        assert!("hoyolab".parse::<Game>().is_err());
    }

    #[test]
    fn language_accepts_code_and_name() {
        assert_eq!("ZH-CN".parse::<Language>().unwrap(), Language::ChineseCn);
        assert_eq!("japanese".parse::<Language>().unwrap(), Language::Japanese);
        assert_eq!(Language::ChineseTw.to_string(), "zh-tw");
    }

    #[test]
    fn titles_are_title_cased() {
        assert_eq!(Category::Notices.title(), "Notices");
        assert_eq!(Game::Starrail.title(), "Starrail");
        assert_eq!(FeedMeta::new(Game::Genshin).display_title(), "Genshin News");
    }

    #[test]
    fn default_home_page_points_at_circle() {
        let meta = FeedMeta::new(Game::Zenless);
        assert_eq!(
            meta.display_home_page_url(),
            "https://www.hoyolab.com/circles/8"
        );
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert!(parse_http_url("https://example.org/a.png").is_some());
        assert!(parse_http_url("ftp://example.org/a.png").is_none());
        assert!(parse_http_url("not a url").is_none());
    }
}
