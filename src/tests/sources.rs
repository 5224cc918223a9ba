use crate::dedup::SeenUrls;
use crate::sources::{chrome::ChromeSource, firefox::FirefoxSource, BrowserSource, TimeWindow};
use rusqlite::Connection;
use std::path::Path;

const WEBKIT_OFFSET_MS: i64 = 11_644_473_600_000;

fn unix_ms_to_webkit_micros(unix_ms: i64) -> i64 {
    (unix_ms + WEBKIT_OFFSET_MS) * 1000
}

fn write_chrome_history(profile: &Path, rows: &[(&str, &str, i64, i64, i64)]) {
    std::fs::create_dir_all(profile).unwrap();
    let db = Connection::open(profile.join("History")).unwrap();
    db.execute_batch(
        "CREATE TABLE urls (
            id INTEGER PRIMARY KEY,
            url LONGVARCHAR,
            title LONGVARCHAR,
            visit_count INTEGER,
            typed_count INTEGER,
            last_visit_time INTEGER
        )",
    )
    .unwrap();

    for (title, url, visits, typed, last_visit_ms) in rows {
        db.execute(
            "INSERT INTO urls (url, title, visit_count, typed_count, last_visit_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                url,
                title,
                visits,
                typed,
                unix_ms_to_webkit_micros(*last_visit_ms)
            ],
        )
        .unwrap();
    }
}

#[test]
fn chrome_history_converts_epochs_and_scores() {
    let base = tempfile::tempdir().unwrap();
    write_chrome_history(
        &base.path().join("Default"),
        &[
            ("Rust Language", "https://rust-lang.org", 10, 3, 1_700_000_300_000),
            ("Old Page", "https://old.example", 0, 0, 1_600_000_000_000),
            ("", "https://untitled.example", 4, 0, 1_700_000_000_000),
        ],
    );

    let source = ChromeSource::with_base_path(base.path());
    let items = source
        .import_history(&SeenUrls::new(), TimeWindow::EVERYTHING)
        .unwrap();

    // the untitled row is dropped by the adapter
    assert_eq!(items.len(), 2);

    // recency-descending source order
    assert_eq!(items[0].url, "https://rust-lang.org");
    assert_eq!(items[0].score, 1 + 10 + 3);
    assert_eq!(items[0].last_visit_time, Some(1_700_000_300_000));

    assert_eq!(items[1].url, "https://old.example");
    assert_eq!(items[1].score, 1);
}

#[test]
fn chrome_history_honors_the_time_window() {
    let base = tempfile::tempdir().unwrap();
    write_chrome_history(
        &base.path().join("Default"),
        &[
            ("Recent", "https://recent.example", 1, 0, 1_700_000_500_000),
            ("Ancient", "https://ancient.example", 1, 0, 1_500_000_000_000),
        ],
    );

    let source = ChromeSource::with_base_path(base.path());
    let items = source
        .import_history(&SeenUrls::new(), TimeWindow::since(1_600_000_000_000))
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://recent.example");

    let items = source
        .import_history(
            &SeenUrls::new(),
            TimeWindow::span(1_400_000_000_000, 1_600_000_000_000),
        )
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://ancient.example");
}

#[test]
fn chrome_profiles_are_isolated_from_broken_ones() {
    let base = tempfile::tempdir().unwrap();
    write_chrome_history(
        &base.path().join("Default"),
        &[("Fine", "https://fine.example", 1, 0, 1_700_000_000_000)],
    );

    // a profile whose History is not a database at all
    let broken = base.path().join("Profile 1");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("History"), b"not a sqlite file").unwrap();

    let source = ChromeSource::with_base_path(base.path());
    let items = source
        .import_history(&SeenUrls::new(), TimeWindow::EVERYTHING)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://fine.example");
}

#[test]
fn chrome_bookmarks_walk_the_folder_tree() {
    let base = tempfile::tempdir().unwrap();
    let profile = base.path().join("Default");
    std::fs::create_dir_all(&profile).unwrap();

    let added = unix_ms_to_webkit_micros(1_690_000_000_000).to_string();
    let tree = serde_json::json!({
        "roots": {
            "bookmark_bar": {
                "type": "folder",
                "name": "Bookmarks Bar",
                "children": [
                    {"type": "url", "name": "Rust", "url": "https://rust-lang.org", "date_added": added},
                    {
                        "type": "folder",
                        "name": "Dev",
                        "children": [
                            {"type": "url", "name": "Docs", "url": "https://docs.rs", "date_added": "0"},
                            {"type": "url", "name": "  ", "url": "https://blank-title.example", "date_added": "0"}
                        ]
                    }
                ]
            }
        }
    });
    std::fs::write(profile.join("Bookmarks"), tree.to_string()).unwrap();

    let source = ChromeSource::with_base_path(base.path());
    let items = source.import_bookmarks(&SeenUrls::new()).unwrap();

    assert_eq!(items.len(), 2);

    let rust = items.iter().find(|b| b.url == "https://rust-lang.org").unwrap();
    assert_eq!(rust.title, "Rust");
    assert_eq!(rust.folder.as_deref(), Some("bookmark_bar/Bookmarks Bar"));
    assert_eq!(rust.last_modified, Some(1_690_000_000_000));

    let docs = items.iter().find(|b| b.url == "https://docs.rs").unwrap();
    assert_eq!(docs.folder.as_deref(), Some("bookmark_bar/Bookmarks Bar/Dev"));
    assert_eq!(docs.last_modified, None);
}

fn write_places(profile: &Path) -> Connection {
    std::fs::create_dir_all(profile).unwrap();
    let db = Connection::open(profile.join("places.sqlite")).unwrap();
    db.execute_batch(
        "CREATE TABLE moz_places (id INTEGER PRIMARY KEY, url LONGVARCHAR, title LONGVARCHAR);
         CREATE TABLE moz_historyvisits (id INTEGER PRIMARY KEY, place_id INTEGER, visit_date INTEGER);
         CREATE TABLE moz_bookmarks (id INTEGER PRIMARY KEY, type INTEGER, fk INTEGER, title LONGVARCHAR, dateAdded INTEGER);",
    )
    .unwrap();
    db
}

#[test]
fn firefox_history_dedups_repeat_visits() {
    let base = tempfile::tempdir().unwrap();
    let db = write_places(&base.path().join("abc.default"));

    db.execute(
        "INSERT INTO moz_places (id, url, title) VALUES (1, 'https://a.example', 'Alpha')",
        [],
    )
    .unwrap();
    // two visits to the same place, newest first wins
    db.execute(
        "INSERT INTO moz_historyvisits (place_id, visit_date) VALUES (1, ?1), (1, ?2)",
        rusqlite::params![1_700_000_000_000_000_i64, 1_700_000_600_000_000_i64],
    )
    .unwrap();
    drop(db);

    let source = FirefoxSource::with_base_path(base.path());
    let items = source
        .import_history(&SeenUrls::new(), TimeWindow::EVERYTHING)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Alpha");
    assert_eq!(items[0].score, 1);
    assert_eq!(items[0].last_visit_time, Some(1_700_000_600_000));
}

#[test]
fn firefox_bookmarks_come_from_places() {
    let base = tempfile::tempdir().unwrap();
    let db = write_places(&base.path().join("abc.default"));

    db.execute(
        "INSERT INTO moz_places (id, url, title) VALUES
         (1, 'https://a.example', 'Alpha'),
         (2, 'https://b.example', 'Beta')",
        [],
    )
    .unwrap();
    // type 2 is a folder row and must not be returned
    db.execute(
        "INSERT INTO moz_bookmarks (type, fk, title, dateAdded) VALUES
         (1, 1, 'Alpha Bookmark', 1690000000000000),
         (2, 2, 'Some Folder', 1690000000000000)",
        [],
    )
    .unwrap();
    drop(db);

    let source = FirefoxSource::with_base_path(base.path());
    let items = source.import_bookmarks(&SeenUrls::new()).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Alpha Bookmark");
    assert_eq!(items[0].url, "https://a.example");
    assert_eq!(items[0].last_modified, Some(1_690_000_000_000));
}

#[test]
fn missing_base_paths_import_nothing() {
    let chrome = ChromeSource::with_base_path("/definitely/not/here");
    assert!(chrome
        .import_history(&SeenUrls::new(), TimeWindow::EVERYTHING)
        .unwrap()
        .is_empty());

    let firefox = FirefoxSource::with_base_path("/definitely/not/here");
    assert!(firefox.import_bookmarks(&SeenUrls::new()).unwrap().is_empty());
}
