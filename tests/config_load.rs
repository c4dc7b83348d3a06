// tests/config_load.rs
use hoyolab_rss_feeds::config::{load_from, resolve_path, write_default, DEFAULT_CONFIG_PATH};
use hoyolab_rss_feeds::{Category, FeedType, Game, Language};
use std::{env, fs};

#[test]
fn full_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feeds.toml");
    fs::write(
        &path,
        r#"
[zenless]
feed.json.path = "out/zzz.json"
feed.json.url = "https://example.org/zzz.json"
feed.atom.path = "out/zzz.xml"
title = "  ZZZ News  "
icon = "https://example.org/zzz.png"
category_size = 3
categories = ["events", "Events", "INFO"]
language = "Japanese"

[honkai]
feed.atom.path = "honkai.xml"
categories = []
"#,
    )
    .unwrap();

    let feeds = load_from(&path).unwrap();
    assert_eq!(feeds.len(), 2);

    let zzz = &feeds[0];
    assert_eq!(zzz.meta.game, Game::Zenless);
    assert_eq!(zzz.meta.title.as_deref(), Some("ZZZ News"));
    assert_eq!(zzz.meta.category_size, 3);
    assert_eq!(zzz.meta.categories, vec![Category::Events, Category::Info]);
    assert_eq!(zzz.meta.language, Language::Japanese);
    assert_eq!(
        zzz.meta.icon.as_ref().map(|u| u.as_str()),
        Some("https://example.org/zzz.png")
    );
    let kinds: Vec<FeedType> = zzz.writers.iter().map(|w| w.feed_type).collect();
    assert_eq!(kinds, vec![FeedType::Json, FeedType::Atom]);
    assert_eq!(
        zzz.writers[0].url.as_ref().map(|u| u.as_str()),
        Some("https://example.org/zzz.json")
    );

    let honkai = &feeds[1];
    assert_eq!(honkai.meta.categories, Category::ALL.to_vec());
    assert_eq!(honkai.meta.language, Language::English);
    assert_eq!(honkai.meta.category_size, 5);
}

#[test]
fn bad_values_name_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("unknown_game.toml", "[hoyolab]\nfeed.json.path = \"x.json\"\n", "hoyolab"),
        (
            "bad_category.toml",
            "[genshin]\nfeed.json.path = \"x.json\"\ncategories = [\"Videos\"]\n",
            "Videos",
        ),
        (
            "bad_icon.toml",
            "[genshin]\nfeed.json.path = \"x.json\"\nicon = \"ftp://x/y.png\"\n",
            "icon",
        ),
        (
            "unknown_key.toml",
            "[genshin]\nfeed.json.path = \"x.json\"\ncolour = \"red\"\n",
            "[genshin]",
        ),
        (
            "duplicate_game.toml",
            "[genshin]\nfeed.json.path = \"a.json\"\n[Genshin]\nfeed.json.path = \"b.json\"\n",
            "more than once",
        ),
    ];

    for (file, body, needle) in cases {
        let path = dir.path().join(file);
        fs::write(&path, body).unwrap();
        let err = load_from(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains(needle), "{file}: {msg}");
    }
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_from(&dir.path().join("nope.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("nope.toml"));
}

#[tokio::test]
async fn default_config_is_written_and_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("feeds.toml");

    write_default(&path).await.unwrap();

    let feeds = load_from(&path).unwrap();
    assert_eq!(feeds[0].meta.game, Game::Genshin);
    assert_eq!(feeds[0].writers[0].path.to_str(), Some("genshin.json"));
}

#[serial_test::serial]
#[test]
fn env_path_used_when_no_flag() {
    let tmp = tempfile::tempdir().unwrap();
    let p_env = tmp.path().join("from-env.toml");

    env::remove_var("HOYOLAB_FEEDS_CONFIG");
    assert_eq!(resolve_path(None).to_str(), Some(DEFAULT_CONFIG_PATH));

    env::set_var("HOYOLAB_FEEDS_CONFIG", p_env.display().to_string());
    assert_eq!(resolve_path(None), p_env);

    // blank env falls through to the default
    env::set_var("HOYOLAB_FEEDS_CONFIG", "  ");
    assert_eq!(resolve_path(None).to_str(), Some(DEFAULT_CONFIG_PATH));
    env::remove_var("HOYOLAB_FEEDS_CONFIG");
}
