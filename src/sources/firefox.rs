use super::{home_dir, snapshot_db, BrowserSource, SourceError, TimeWindow};
use crate::{
    dedup::SeenUrls,
    records::{BookmarkItem, HistoryItem, INITIAL_SCORE},
};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

pub struct FirefoxSource {
    base_path: PathBuf,
}

impl Default for FirefoxSource {
    fn default() -> Self {
        let base_path = if cfg!(target_os = "macos") {
            home_dir().join("Library/Application Support/Firefox/Profiles")
        } else {
            home_dir().join(".mozilla/firefox")
        };
        Self { base_path }
    }
}

impl FirefoxSource {
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn open_places(&self, profile: &Path) -> Result<(tempfile::TempDir, Connection), SourceError> {
        let (guard, snapshot) = snapshot_db(&profile.join("places.sqlite"))?;
        let db = Connection::open_with_flags(&snapshot, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok((guard, db))
    }

    fn profile_history(
        &self,
        profile: &Path,
        seen: &SeenUrls,
        window: TimeWindow,
    ) -> Result<Vec<HistoryItem>, SourceError> {
        let (_guard, db) = self.open_places(profile)?;

        // one row per visit; the seen set keeps the most recent one
        let mut sql = String::from(
            "SELECT moz_places.title, moz_places.url, moz_historyvisits.visit_date \
             FROM moz_places \
             JOIN moz_historyvisits ON moz_places.id = moz_historyvisits.place_id \
             WHERE moz_places.title IS NOT NULL AND moz_places.title != ''",
        );
        let mut params: Vec<i64> = Vec::new();
        if window.start_ms > 0 {
            params.push(window.start_ms / 1000);
            sql.push_str(&format!(
                " AND moz_historyvisits.visit_date/1000000 >= ?{}",
                params.len()
            ));
        }
        if let Some(end_ms) = window.end_ms {
            params.push(end_ms / 1000);
            sql.push_str(&format!(
                " AND moz_historyvisits.visit_date/1000000 < ?{}",
                params.len()
            ));
        }
        sql.push_str(" ORDER BY moz_historyvisits.visit_date DESC");

        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (title, url, visit_date) = row?;
            if title.trim().is_empty() || !seen.first_sighting(&url) {
                continue;
            }

            items.push(HistoryItem::new(
                title.trim(),
                url,
                INITIAL_SCORE,
                visit_date.map(|micros| micros / 1000),
            ));
        }

        Ok(items)
    }

    fn profile_bookmarks(
        &self,
        profile: &Path,
        seen: &SeenUrls,
    ) -> Result<Vec<BookmarkItem>, SourceError> {
        let (_guard, db) = self.open_places(profile)?;

        let mut stmt = db.prepare(
            "SELECT moz_bookmarks.title, moz_places.url, moz_bookmarks.dateAdded \
             FROM moz_bookmarks \
             JOIN moz_places ON moz_bookmarks.fk = moz_places.id \
             WHERE moz_bookmarks.type = 1 \
             AND moz_bookmarks.title IS NOT NULL AND moz_bookmarks.title != '' \
             ORDER BY moz_bookmarks.dateAdded DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (title, url, date_added) = row?;
            if title.trim().is_empty() || !seen.first_sighting(&url) {
                continue;
            }

            items.push(BookmarkItem::new(
                title.trim(),
                url,
                None,
                date_added.map(|micros| micros / 1000),
            ));
        }

        Ok(items)
    }
}

impl BrowserSource for FirefoxSource {
    fn name(&self) -> &'static str {
        "firefox"
    }

    fn profiles(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(_) => {
                log::warn!("firefox base path does not exist: {:?}", self.base_path);
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.join("places.sqlite").exists())
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
                    log::info!("firefox: {} history items from {:?}", items.len(), profile);
                    all.append(&mut items);
                }
                Err(err) => {
                    log::error!("firefox: history import failed for {:?}: {err}", profile)
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
                    log::info!("firefox: {} bookmarks from {:?}", items.len(), profile);
                    all.append(&mut items);
                }
                Err(err) => {
                    log::error!("firefox: bookmark import failed for {:?}: {err}", profile)
                }
            }
        }

        Ok(all)
    }
}
