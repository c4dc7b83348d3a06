//! Markup to plain text conversion for contexts that cannot render HTML.
//!
//! The conversion is a fixed, ordered list of [`Rule`]s. Order matters:
//! entities are decoded before any tag is looked at, structural tags
//! (bullets, breaks, paragraphs, lists, images, anchors) are rewritten before
//! the generic tag stripper runs, and punctuation/whitespace repair come last.
//! Bump [`VERSION`] whenever a rule or the order changes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Revision of the rule set below.
pub const VERSION: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    DecodeEntities,
    GlyphBullets,
    LineBreaks,
    Paragraphs,
    ListItems,
    Images,
    Anchors,
    StripTags,
    PunctuationSpacing,
    Whitespace,
}

/// Rules in the order [`normalize`] applies them.
pub const PIPELINE: [Rule; 10] = [
    Rule::DecodeEntities,
    Rule::GlyphBullets,
    Rule::LineBreaks,
    Rule::Paragraphs,
    Rule::ListItems,
    Rule::Images,
    Rule::Anchors,
    Rule::StripTags,
    Rule::PunctuationSpacing,
    Rule::Whitespace,
];

/// Convert markup to readable plain text. Never fails; `None` stays `None`.
pub fn normalize(text: Option<&str>) -> Option<String> {
    text.map(normalize_str)
}

pub fn normalize_str(text: &str) -> String {
    PIPELINE
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Self::DecodeEntities => "decode-entities",
            Self::GlyphBullets => "glyph-bullets",
            Self::LineBreaks => "line-breaks",
            Self::Paragraphs => "paragraphs",
            Self::ListItems => "list-items",
            Self::Images => "images",
            Self::Anchors => "anchors",
            Self::StripTags => "strip-tags",
            Self::PunctuationSpacing => "punctuation-spacing",
            Self::Whitespace => "whitespace",
        }
    }

    /// Apply this single rule.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::DecodeEntities => decode_entities(text),
            Self::GlyphBullets => RE_GLYPH.replace_all(text, "\n• ").into_owned(),
            Self::LineBreaks => RE_BR.replace_all(text, "\n").into_owned(),
            Self::Paragraphs => {
                let joined = RE_PARA_JOIN.replace_all(text, "${1}\n\n");
                RE_PARA.replace_all(&joined, "").into_owned()
            }
            Self::ListItems => {
                let out = RE_LI_OPEN.replace_all(text, "• ");
                let out = RE_LI_CLOSE.replace_all(&out, "\n");
                RE_LIST.replace_all(&out, "").into_owned()
            }
            Self::Images => RE_IMG
                .replace_all(text, |caps: &Captures<'_>| render_image(&caps[1]))
                .into_owned(),
            Self::Anchors => RE_ANCHOR
                .replace_all(text, |caps: &Captures<'_>| {
                    render_anchor(&caps[1], &caps[2])
                })
                .into_owned(),
            Self::StripTags => RE_TAG.replace_all(text, "").into_owned(),
            Self::PunctuationSpacing => RE_TOKEN
                .replace_all(text, |caps: &Captures<'_>| space_after_punctuation(&caps[0]))
                .into_owned(),
            Self::Whitespace => collapse_whitespace(text),
        }
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| re(r"&(nbsp|amp|lt|gt);"));
static RE_GLYPH: Lazy<Regex> = Lazy::new(|| re(r"[▌■]"));
static RE_BR: Lazy<Regex> = Lazy::new(|| re(r"(?i)<br\s*/?>"));
static RE_PARA_JOIN: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)(</[a-z][a-z0-9]*\s*>)\s*<p(?:[\s/][^>]*)?>"));
static RE_PARA: Lazy<Regex> = Lazy::new(|| re(r"(?i)</?p(?:[\s/][^>]*)?>"));
static RE_LI_OPEN: Lazy<Regex> = Lazy::new(|| re(r"(?i)<li(?:[\s/][^>]*)?>"));
static RE_LI_CLOSE: Lazy<Regex> = Lazy::new(|| re(r"(?i)</li\s*>"));
static RE_LIST: Lazy<Regex> = Lazy::new(|| re(r"(?i)</?(?:ul|ol)(?:[\s/][^>]*)?>"));
static RE_IMG: Lazy<Regex> = Lazy::new(|| re(r"(?is)<img\b([^>]*)>"));
static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| re(r"(?is)<a\b([^>]*)>(.*?)</a\s*>"));
static RE_ATTR: Lazy<Regex> = Lazy::new(|| {
    re(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});
// A complete tag, or a single-word fragment cut off at the end of input.
// An unterminated `<word` followed by more text is left as literal text.
static RE_TAG: Lazy<Regex> =
    Lazy::new(|| re(r"<[A-Za-z/!?][^<>]*>|<[A-Za-z/!?][^<>\s]*$"));
static RE_TOKEN: Lazy<Regex> = Lazy::new(|| re(r"\S+"));
static RE_MISSING_SPACE: Lazy<Regex> = Lazy::new(|| re(r"[.!?;:][\p{L}\p{N}]"));
static RE_WS_RUN: Lazy<Regex> = Lazy::new(|| re(r"\s+"));
static RE_CRLF: Lazy<Regex> = Lazy::new(|| re(r"\r\n?"));
static RE_LINE_EDGE: Lazy<Regex> = Lazy::new(|| re(r"[^\S\n]*\n[^\S\n]*"));
static RE_HSPACE: Lazy<Regex> = Lazy::new(|| re(r"[^\S\n]{2,}"));
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| re(r"\n{3,}"));

/// Single pass, so `&amp;lt;` decodes to `&lt;` and not `<`.
/// Double-escaped input therefore keeps one level of escaping, and running
/// the result through [`normalize`] again decodes that level too.
fn decode_entities(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &Captures<'_>| match &caps[1] {
            "nbsp" => " ",
            "amp" => "&",
            "lt" => "<",
            _ => ">",
        })
        .into_owned()
}

/// Value of attribute `name` inside a tag's attribute text, if non-blank.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    RE_ATTR
        .captures_iter(attrs)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| {
            caps.get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|v| !v.is_empty())
}

fn render_image(attrs: &str) -> String {
    match (attribute(attrs, "alt"), attribute(attrs, "src")) {
        (Some(alt), Some(src)) => format!("[img: {alt} — {src}]"),
        (None, Some(src)) => format!("[img: {src}]"),
        (Some(alt), None) => format!("[img: {alt}]"),
        (None, None) => "[img]".to_string(),
    }
}

fn render_anchor(attrs: &str, inner: &str) -> String {
    let stripped = RE_TAG.replace_all(inner, "");
    let text = RE_WS_RUN.replace_all(&stripped, " ").trim().to_string();
    match (text.is_empty(), attribute(attrs, "href")) {
        (false, Some(url)) => format!("{text} ({url})"),
        (true, Some(url)) => url,
        _ => text,
    }
}

fn looks_like_address(token: &str) -> bool {
    token.contains("://")
        || token.contains('@')
        || token
            .get(..4)
            .is_some_and(|p| p.eq_ignore_ascii_case("www."))
}

/// `Destiny.After` -> `Destiny. After`. URLs, e-mail addresses and numbers
/// such as `4.2` or `10:00` are left untouched.
fn space_after_punctuation(token: &str) -> String {
    if looks_like_address(token) {
        return token.to_string();
    }

    let mut out = String::with_capacity(token.len() + 4);
    let mut last = 0;
    for m in RE_MISSING_SPACE.find_iter(token) {
        let mut chars = m.as_str().chars();
        let (Some(mark), Some(next)) = (chars.next(), chars.next()) else {
            continue;
        };
        let prev = token[..m.start()].chars().next_back();
        let numeric = prev.is_some_and(|c| c.is_ascii_digit()) && next.is_ascii_digit();
        if numeric {
            continue;
        }
        let split = m.start() + mark.len_utf8();
        out.push_str(&token[last..split]);
        out.push(' ');
        last = split;
    }
    out.push_str(&token[last..]);
    out
}

fn collapse_whitespace(text: &str) -> String {
    let out = RE_CRLF.replace_all(text, "\n");
    let out = RE_LINE_EDGE.replace_all(&out, "\n");
    let out = RE_HSPACE.replace_all(&out, " ");
    let out = RE_BLANK_LINES.replace_all(&out, "\n\n");
    out.trim().to_string()
}
