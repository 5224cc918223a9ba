use super::{home_dir, snapshot_db, BrowserSource, SourceError, TimeWindow};
use crate::{
    dedup::SeenUrls,
    records::{BookmarkItem, HistoryItem, INITIAL_SCORE},
};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Seconds between the Windows/WebKit epoch (1601-01-01) and the Unix epoch.
const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

fn webkit_micros_to_unix_ms(micros: i64) -> i64 {
    micros / 1000 - WEBKIT_EPOCH_OFFSET_SECS * 1000
}

pub struct ChromeSource {
    base_path: PathBuf,
}

impl Default for ChromeSource {
    fn default() -> Self {
        let base_path = if cfg!(target_os = "macos") {
            home_dir().join("Library/Application Support/Google/Chrome")
        } else {
            home_dir().join(".config/google-chrome")
        };
        Self { base_path }
    }
}

impl ChromeSource {
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn profile_history(
        &self,
        profile: &Path,
        seen: &SeenUrls,
        window: TimeWindow,
    ) -> Result<Vec<HistoryItem>, SourceError> {
        let (_guard, snapshot) = snapshot_db(&profile.join("History"))?;
        let db = Connection::open_with_flags(&snapshot, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let mut sql = String::from(
            "SELECT title, url, last_visit_time, visit_count, typed_count FROM urls \
             WHERE title IS NOT NULL AND title != ''",
        );
        let mut params: Vec<i64> = Vec::new();
        if window.start_ms > 0 {
            params.push(window.start_ms / 1000);
            sql.push_str(&format!(
                " AND last_visit_time/1000000 - {WEBKIT_EPOCH_OFFSET_SECS} >= ?{}",
                params.len()
            ));
        }
        if let Some(end_ms) = window.end_ms {
            params.push(end_ms / 1000);
            sql.push_str(&format!(
                " AND last_visit_time/1000000 - {WEBKIT_EPOCH_OFFSET_SECS} < ?{}",
                params.len()
            ));
        }
        sql.push_str(" ORDER BY last_visit_time DESC");

        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (title, url, last_visit_time, visit_count, typed_count) = row?;
            if title.trim().is_empty() || !seen.first_sighting(&url) {
                continue;
            }

            let score = match visit_count {
                Some(visits) if visits > 0 => INITIAL_SCORE + visits + typed_count.unwrap_or(0),
                _ => INITIAL_SCORE,
            };

            items.push(HistoryItem::new(
                title.trim(),
                url,
                score,
                last_visit_time
                    .filter(|micros| *micros > 0)
                    .map(webkit_micros_to_unix_ms),
            ));
        }

        Ok(items)
    }

    fn profile_bookmarks(
        &self,
        profile: &Path,
        seen: &SeenUrls,
    ) -> Result<Vec<BookmarkItem>, SourceError> {
        let bookmarks_path = profile.join("Bookmarks");
        if !bookmarks_path.exists() {
            return Err(SourceError::Unavailable(bookmarks_path));
        }

        let tree: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&bookmarks_path)?)?;

        let mut items = Vec::new();
        if let Some(roots) = tree.get("roots").and_then(|roots| roots.as_object()) {
            for (root_name, root_node) in roots {
                extract_bookmarks(root_node, root_name, seen, &mut items);
            }
        }

        Ok(items)
    }
}

fn extract_bookmarks(
    node: &serde_json::Value,
    folder: &str,
    seen: &SeenUrls,
    out: &mut Vec<BookmarkItem>,
) {
    let name = node.get("name").and_then(|name| name.as_str()).unwrap_or("");

    match node.get("type").and_then(|kind| kind.as_str()) {
        Some("url") => {
            let url = node.get("url").and_then(|url| url.as_str()).unwrap_or("");
            if url.is_empty() || name.trim().is_empty() || !seen.first_sighting(url) {
                return;
            }

            // date_added is a stringified int64 of WebKit microseconds
            let added = node
                .get("date_added")
                .and_then(|added| added.as_str())
                .and_then(|added| added.parse::<i64>().ok())
                .filter(|micros| *micros > 0)
                .map(webkit_micros_to_unix_ms);

            out.push(BookmarkItem::new(
                name.trim(),
                url,
                Some(folder.to_string()),
                added,
            ));
        }
        _ => {
            if let Some(children) = node.get("children").and_then(|kids| kids.as_array()) {
                let path = if folder.is_empty() || name.is_empty() {
                    format!("{folder}{name}")
                } else {
                    format!("{folder}/{name}")
                };
                for child in children {
                    extract_bookmarks(child, &path, seen, out);
                }
            }
        }
    }
}

impl BrowserSource for ChromeSource {
    fn name(&self) -> &'static str {
        "chrome"
    }

    fn profiles(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(_) => {
                log::warn!("chrome base path does not exist: {:?}", self.base_path);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_dir() && (path.join("History").exists() || path.join("Bookmarks").exists())
            })
            .collect()
    }

    fn import_history(
        &self,
        seen: &SeenUrls,
        window: TimeWindow,
    ) -> Result<Vec<HistoryItem>, SourceError> {
        let mut all = Vec::new();
        for profile in self.profiles() {
            match self.profile_history(&profile, seen, window) {
                Ok(mut items) => {
                    log::info!("chrome: {} history items from {:?}", items.len(), profile);
                    all.append(&mut items);
                }
                Err(err) => {
                    log::error!("chrome: history import failed for {:?}: {err}", profile)
                }
            }
        }

        Ok(all)
    }

    fn import_bookmarks(&self, seen: &SeenUrls) -> Result<Vec<BookmarkItem>, SourceError> {
        let mut all = Vec::new();
        for profile in self.profiles() {
            match self.profile_bookmarks(&profile, seen) {
                Ok(mut items) => {
                    log::info!("chrome: {} bookmarks from {:?}", items.len(), profile);
                    all.append(&mut items);
                }
                Err(SourceError::Unavailable(path)) => {
                    log::debug!("chrome: no bookmarks file at {:?}", path)
                }
                Err(err) => {
                    log::error!("chrome: bookmark import failed for {:?}: {err}", profile)
                }
            }
        }

        Ok(all)
    }
}
