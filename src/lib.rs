// src/lib.rs
// Library surface for the binary and integration tests.

pub mod error;
pub mod models;

// Pure core: markup normalization, item validation, multi-game merge
pub mod aggregate;
pub mod item;
pub mod normalize;

// Collaborators: config, upstream API, per-game pipeline, output files, CLI
pub mod app;
pub mod config;
pub mod feeds;
pub mod hoyolab;
pub mod writers;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, merge_items, Aggregate, AggregateOptions, SourceItems};
pub use crate::error::{ConfigError, FeedError, ParseError, ValidationError};
pub use crate::item::build;
pub use crate::models::{
    AggregateFeedMeta, Category, FeedItem, FeedMeta, FeedType, Game, Language, RawFeedItem,
};
pub use crate::normalize::normalize;
