// tests/item_build.rs
use hoyolab_rss_feeds::{build, Category, FeedError, Game, ParseError, RawFeedItem, ValidationError};
use serde_json::json;

fn raw() -> RawFeedItem {
    RawFeedItem {
        id: Some(json!(4242)),
        title: Some("Version 4.2 Update Notice".into()),
        author: Some("Paimon".into()),
        content: Some("  <p>Dear Travelers,</p><p>Maintenance soon.</p>  ".into()),
        category: Some("NOTICES".into()),
        published: Some(json!("2024-01-02T03:04:05Z")),
        updated: Some(json!(1_704_200_000)),
        image: Some("https://upload-os-bbs.hoyolab.com/banner.png".into()),
        summary: Some("<p>Maintenance&nbsp;soon.</p><p>Stay tuned.</p>".into()),
        game: Some("genshin".into()),
    }
}

fn validation(err: FeedError) -> ValidationError {
    match err {
        FeedError::Validation(v) => v,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn builds_complete_item() {
    let item = build(raw()).expect("valid item");
    assert_eq!(item.id(), 4242);
    assert_eq!(item.author(), "Paimon");
    assert_eq!(item.category(), Category::Notices);
    assert_eq!(item.game(), Some(Game::Genshin));
    assert_eq!(item.published().timestamp(), 1_704_164_645);
    assert_eq!(item.updated().map(|t| t.timestamp()), Some(1_704_200_000));
    assert_eq!(
        item.image().map(|u| u.as_str()),
        Some("https://upload-os-bbs.hoyolab.com/banner.png")
    );
    assert_eq!(item.url(), "https://www.hoyolab.com/article/4242");
}

#[test]
fn content_is_kept_verbatim_and_summary_is_plain() {
    let item = build(raw()).unwrap();
    assert_eq!(
        item.content(),
        "  <p>Dear Travelers,</p><p>Maintenance soon.</p>  "
    );
    assert_eq!(item.summary(), Some("Maintenance soon.\n\nStay tuned."));
}

#[test]
fn empty_title_after_trim_names_title() {
    let err = build(RawFeedItem {
        title: Some(" \t ".into()),
        ..raw()
    })
    .unwrap_err();
    let v = validation(err);
    assert_eq!(v.field(), "title");
    assert_eq!(v, ValidationError::Empty { field: "title" });
}

#[test]
fn empty_author_and_content_are_rejected() {
    let err = build(RawFeedItem {
        author: Some(String::new()),
        ..raw()
    })
    .unwrap_err();
    assert_eq!(validation(err).field(), "author");

    let err = build(RawFeedItem {
        content: Some("\n".into()),
        ..raw()
    })
    .unwrap_err();
    assert_eq!(validation(err).field(), "content");
}

#[test]
fn id_must_be_present_and_integral() {
    let err = build(RawFeedItem { id: None, ..raw() }).unwrap_err();
    assert_eq!(validation(err), ValidationError::Missing { field: "id" });

    let err = build(RawFeedItem {
        id: Some(json!("12a")),
        ..raw()
    })
    .unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::NotAnInteger {
            field: "id",
            value: "12a".into()
        }
    );
}

#[test]
fn published_must_parse() {
    let err = build(RawFeedItem {
        published: None,
        ..raw()
    })
    .unwrap_err();
    assert_eq!(validation(err).field(), "published");

    let err = build(RawFeedItem {
        published: Some(json!("last tuesday")),
        ..raw()
    })
    .unwrap_err();
    assert!(matches!(
        validation(err),
        ValidationError::InvalidTimestamp { field: "published", .. }
    ));
}

#[test]
fn unknown_category_is_a_parse_error() {
    let err = build(RawFeedItem {
        category: Some("bogus".into()),
        ..raw()
    })
    .unwrap_err();
    assert_eq!(err, FeedError::Parse(ParseError::new("category", "bogus")));
}

#[test]
fn unknown_game_is_a_parse_error() {
    let err = build(RawFeedItem {
        game: Some("Hoyolab".into()),
        ..raw()
    })
    .unwrap_err();
    match err {
        FeedError::Parse(p) => {
            assert_eq!(p.enumeration, "game");
            assert_eq!(p.value, "Hoyolab");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn image_must_be_http_url() {
    let err = build(RawFeedItem {
        image: Some("banner.png".into()),
        ..raw()
    })
    .unwrap_err();
    assert_eq!(validation(err).field(), "image");
}

#[test]
fn raw_items_reject_unknown_fields() {
    let ok: RawFeedItem = serde_json::from_str(r#"{"id": 1, "title": "t"}"#).unwrap();
    assert_eq!(ok.id, Some(json!(1)));

    let bad = serde_json::from_str::<RawFeedItem>(r#"{"id": 1, "views": 10}"#);
    assert!(bad.is_err());
}
