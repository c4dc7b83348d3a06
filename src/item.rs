//! Validation of raw fetched fields into [`FeedItem`]s.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{FeedResult, ValidationError};
use crate::models::{parse_http_url, Category, FeedItem, Game, RawFeedItem};
use crate::normalize::normalize;

/// Build a validated item. Fails on the first invalid field.
///
/// `title` and `author` are trimmed, `content` is kept verbatim and
/// `summary` is reduced to plain text.
pub fn build(raw: RawFeedItem) -> FeedResult<FeedItem> {
    let id = parse_id(raw.id.as_ref())?;
    let title = required_text("title", raw.title)?;
    let author = required_text("author", raw.author)?;

    let content = raw
        .content
        .ok_or(ValidationError::Missing { field: "content" })?;
    if content.trim().is_empty() {
        return Err(ValidationError::Empty { field: "content" }.into());
    }

    let category: Category = raw
        .category
        .ok_or(ValidationError::Missing { field: "category" })?
        .parse()?;

    let published = match raw.published.as_ref() {
        Some(v) => parse_timestamp("published", v)?,
        None => return Err(ValidationError::Missing { field: "published" }.into()),
    };
    let updated = raw
        .updated
        .as_ref()
        .map(|v| parse_timestamp("updated", v))
        .transpose()?;

    let image = match non_blank(raw.image) {
        Some(s) => Some(parse_http_url(&s).ok_or(ValidationError::InvalidUrl {
            field: "image",
            value: s,
        })?),
        None => None,
    };

    let summary = normalize(raw.summary.as_deref()).filter(|s| !s.is_empty());

    let game = non_blank(raw.game)
        .map(|g| g.parse::<Game>())
        .transpose()?;

    Ok(FeedItem {
        id,
        title,
        author,
        content,
        category,
        published,
        updated,
        image,
        summary,
        game,
    })
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing { field })?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

fn parse_id(value: Option<&Value>) -> Result<i64, ValidationError> {
    let value = value.ok_or(ValidationError::Missing { field: "id" })?;
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::NotAnInteger {
        field: "id",
        value: value_text(value),
    })
}

/// Unix seconds (number or digit string), RFC 3339, RFC 2822 or
/// `YYYY-MM-DD HH:MM:SS` taken as UTC.
fn parse_timestamp(field: &'static str, value: &Value) -> Result<DateTime<Utc>, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|s| DateTime::from_timestamp(s, 0)),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::InvalidTimestamp {
        field,
        value: value_text(value),
    })
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
