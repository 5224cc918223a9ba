use crate::dedup::{dedup, SeenUrls};
use crate::records::{BookmarkItem, HistoryItem};

#[test]
fn first_source_wins_across_adapters() {
    let seen = SeenUrls::new();

    // two sources in one pass both report the same url
    let chrome = vec![
        HistoryItem::new("Dup from Chrome", "https://dup.com", 5, Some(1_000)),
        HistoryItem::new("Only Chrome", "https://chrome.com", 2, None),
    ];
    let firefox = vec![
        HistoryItem::new("Dup from Firefox", "https://dup.com", 9, Some(2_000)),
        HistoryItem::new("Only Firefox", "https://firefox.com", 1, None),
    ];

    let first = dedup(&seen, chrome);
    let second = dedup(&seen, firefox);

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].url, "https://firefox.com");

    let dup = first.iter().find(|item| item.url == "https://dup.com").unwrap();
    assert_eq!(dup.title, "Dup from Chrome");
    assert_eq!(dup.score, 5);
}

#[test]
fn repeats_within_one_batch_collapse() {
    let seen = SeenUrls::new();
    let items = vec![
        HistoryItem::new("First", "https://a.com", 1, None),
        HistoryItem::new("Second", "https://a.com", 2, None),
        HistoryItem::new("Third", "https://a.com", 3, None),
    ];

    let unique = dedup(&seen, items);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].title, "First");
}

#[test]
fn blank_tuples_are_dropped_silently() {
    let seen = SeenUrls::new();
    let items = vec![
        HistoryItem::new("", "https://a.com", 1, None),
        HistoryItem::new("   ", "https://b.com", 1, None),
        HistoryItem::new("Fine", "", 1, None),
        HistoryItem::new("Kept", "https://c.com", 1, None),
    ];

    let unique = dedup(&seen, items);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].url, "https://c.com");

    // dropped tuples never claim their url
    assert!(!seen.contains("https://a.com"));
    assert!(!seen.contains("https://b.com"));
}

#[test]
fn works_for_bookmarks_too() {
    let seen = SeenUrls::new();

    let history = dedup(
        &seen,
        vec![HistoryItem::new("Page", "https://a.com", 1, None)],
    );
    assert_eq!(history.len(), 1);

    // same pass, bookmark for an already-seen url is suppressed
    let bookmarks = dedup(
        &seen,
        vec![
            BookmarkItem::new("Page", "https://a.com", None, None),
            BookmarkItem::new("Other", "https://b.com", Some("bar".to_string()), None),
        ],
    );
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].url, "https://b.com");
}

#[test]
fn preserves_source_order() {
    let seen = SeenUrls::new();
    let items: Vec<HistoryItem> = (0..10)
        .map(|i| HistoryItem::new(format!("t{i}"), format!("https://{i}.com"), 1, None))
        .collect();

    let unique = dedup(&seen, items);
    let urls: Vec<String> = unique.iter().map(|item| item.url.clone()).collect();
    let expected: Vec<String> = (0..10).map(|i| format!("https://{i}.com")).collect();
    assert_eq!(urls, expected);
}
