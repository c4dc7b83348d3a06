// src/hoyolab.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::{Category, Game, Language, RawFeedItem};

pub const DEFAULT_API_BASE: &str = "https://bbs-api-os.hoyolab.com/community/post/wapi";

/// Anything that can deliver raw items for one game category.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Up to `limit` of the newest posts of `category`, newest first.
    async fn fetch_category(
        &self,
        game: Game,
        language: Language,
        category: Category,
        limit: usize,
    ) -> Result<Vec<RawFeedItem>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    retcode: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct NewsList {
    #[serde(default)]
    list: Vec<NewsListEntry>,
}

#[derive(Debug, Deserialize)]
struct NewsListEntry {
    post: PostRef,
}

#[derive(Debug, Deserialize)]
struct PostRef {
    post_id: Value,
}

#[derive(Debug, Deserialize)]
struct PostFullData {
    post: PostFull,
}

#[derive(Debug, Deserialize)]
struct PostFull {
    post: Post,
    user: Option<User>,
    #[serde(default)]
    cover_list: Vec<ImageRef>,
    #[serde(default)]
    image_list: Vec<ImageRef>,
    #[serde(default)]
    last_modify_time: i64,
}

#[derive(Debug, Deserialize)]
struct Post {
    post_id: Value,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    desc: String,
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    nickname: String,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    #[serde(default)]
    url: String,
}

fn unwrap_envelope<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    let env: Envelope<T> =
        serde_json::from_str(body).with_context(|| format!("parsing {what} response"))?;
    if env.retcode != 0 {
        bail!("{what} failed with retcode {}: {}", env.retcode, env.message);
    }
    env.data.ok_or_else(|| anyhow!("{what} response has no data"))
}

/// Post ids from a `getNewsList` response body.
pub fn parse_news_list(body: &str) -> Result<Vec<Value>> {
    let list: NewsList = unwrap_envelope(body, "getNewsList")?;
    Ok(list.list.into_iter().map(|e| e.post.post_id).collect())
}

/// Map a `getPostFull` response body to raw item fields.
pub fn parse_post_full(body: &str, game: Game, category: Category) -> Result<RawFeedItem> {
    let data: PostFullData = unwrap_envelope(body, "getPostFull")?;
    let full = data.post;
    let post = full.post;

    // Video and some image posts carry no HTML body.
    let content = if post.content.trim().is_empty() || post.content.trim_start().starts_with('{') {
        format!("<p>{}</p>", post.desc)
    } else {
        post.content
    };

    let image = full
        .cover_list
        .iter()
        .chain(full.image_list.iter())
        .map(|i| i.url.trim())
        .find(|u| !u.is_empty())
        .map(str::to_string);

    let published = post.created_at;
    let updated = Some(full.last_modify_time).filter(|t| published.is_some_and(|p| *t > p));

    Ok(RawFeedItem {
        id: Some(post.post_id),
        title: Some(post.subject),
        author: full.user.map(|u| u.nickname),
        content: Some(content),
        category: Some(category.name().to_string()),
        published: published.map(|t| json!(t)),
        updated: updated.map(|t| json!(t)),
        image,
        summary: Some(post.desc).filter(|d| !d.trim().is_empty()),
        game: Some(game.name().to_string()),
    })
}

const MAX_ATTEMPTS: u8 = 6;

/// Delay after failed attempt `attempt` (1-based): 500 ms, doubling.
fn backoff(attempt: u8) -> Duration {
    let exp = u32::from(attempt.clamp(1, MAX_ATTEMPTS) - 1);
    Duration::from_millis(500u64 << exp)
}

/// HTTP client for the public HoYoLAB news API.
#[derive(Clone)]
pub struct HoyolabClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    max_retries: u8,
}

impl Default for HoyolabClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HoyolabClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Total attempts per request, clamped to `1..=MAX_ATTEMPTS`.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.clamp(1, MAX_ATTEMPTS);
        self
    }

    async fn get_text(&self, endpoint: &str, query: &[(&str, String)], language: Language) -> Result<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .get(&url)
                .query(query)
                .header("Origin", "https://www.hoyolab.com")
                .header("x-rpc-language", language.code())
                .timeout(self.timeout)
                .send()
                .await
                .and_then(|rsp| rsp.error_for_status());

            match res {
                Ok(rsp) => return rsp.text().await.with_context(|| format!("{endpoint} body")),
                Err(e) if attempt < self.max_retries => {
                    tracing::debug!(error = %e, endpoint, attempt, "hoyolab request failed, retrying");
                    tokio::time::sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(anyhow!("{endpoint} request failed: {e}")),
            }
        }
    }
}

#[async_trait]
impl NewsSource for HoyolabClient {
    async fn fetch_category(
        &self,
        game: Game,
        language: Language,
        category: Category,
        limit: usize,
    ) -> Result<Vec<RawFeedItem>> {
        let query = [
            ("gids", game.code().to_string()),
            ("page_size", limit.to_string()),
            ("type", category.code().to_string()),
        ];
        let body = self.get_text("getNewsList", &query, language).await?;
        let ids = parse_news_list(&body)?;

        let mut out = Vec::with_capacity(ids.len());
        for id in ids.into_iter().take(limit) {
            let id = match id {
                Value::String(s) => s,
                other => other.to_string(),
            };
            let query = [
                ("post_id", id.clone()),
                ("read", "1".to_string()),
                ("scene", "1".to_string()),
            ];
            let body = self.get_text("getPostFull", &query, language).await?;
            let raw = parse_post_full(&body, game, category)
                .with_context(|| format!("post {id}"))?;
            out.push(raw);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "HoYoLAB"
    }
}
