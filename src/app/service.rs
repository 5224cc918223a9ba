use crate::{
    config::Config,
    dedup::SeenUrls,
    merge,
    records::UnifiedRecord,
    search,
    sources::{BrowserSource, TimeWindow},
    store::HistoryStore,
};
use serde::Serialize;
use std::sync::{Arc, RwLock};

use super::errors::AppError;

pub struct App {
    sources: Vec<Arc<dyn BrowserSource>>,
    store: Arc<dyn HistoryStore>,
    config: Arc<RwLock<Config>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub history: usize,
    pub bookmarks: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RecentImport {
    pub new_records: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Counts {
    pub records: usize,
    pub bookmarks: usize,
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn days_ms(days: u64) -> i64 {
    days as i64 * 24 * 60 * 60 * 1000
}

fn format_ms(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|when| when.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

impl App {
    pub fn new(
        sources: Vec<Arc<dyn BrowserSource>>,
        store: Arc<dyn HistoryStore>,
        config: Arc<RwLock<Config>>,
    ) -> Self {
        Self {
            sources,
            store,
            config,
        }
    }

    pub fn config(&self) -> Arc<RwLock<Config>> {
        self.config.clone()
    }

    /// Ranked substring search over the persisted unified set.
    pub fn search(&self, term: &str) -> Result<Vec<UnifiedRecord>, AppError> {
        if term.trim().is_empty() && !term.starts_with(search::BOOKMARK_PREFIX) {
            return Err(AppError::InvalidInput("empty search term".to_string()));
        }

        let records = self.store.get_all()?;
        Ok(search::search(&records, term))
    }

    /// Full import: every profile of every source, history then bookmarks,
    /// merged into the persisted set. Returns how many tuples each kind
    /// contributed.
    pub fn import_from_browser(&self) -> Result<ImportSummary, AppError> {
        log::info!("starting full browser import");

        let history = self.collect_history(&SeenUrls::new(), TimeWindow::EVERYTHING);
        let history_count = history.len();
        self.merge_and_save(history)?;

        let bookmarks = self.collect_bookmarks(&SeenUrls::new());
        let bookmark_count = bookmarks.len();
        self.merge_and_save(bookmarks)?;

        log::info!("imported {history_count} history items and {bookmark_count} bookmarks");
        Ok(ImportSummary {
            history: history_count,
            bookmarks: bookmark_count,
        })
    }

    /// First-run backfill: walk the configured depth in bounded slices,
    /// newest first, so the freshest tuple wins the per-pass dedup. A failed
    /// slice is logged and skipped; the remaining slices still run.
    pub fn initialize_history(&self) -> Result<ImportSummary, AppError> {
        let (backfill_days, chunk_days) = {
            let config = self.config.read().unwrap();
            (config.backfill_days, config.chunk_days)
        };

        let now = now_ms();
        let horizon = now - days_ms(backfill_days);
        let chunk = days_ms(chunk_days);

        log::info!("starting initial history indexing back to {}", format_ms(horizon));

        let seen = SeenUrls::new();
        let mut history_count = 0;
        let mut chunk_end = now;
        while chunk_end > horizon {
            let chunk_start = (chunk_end - chunk).max(horizon);
            let items = self.collect_history(&seen, TimeWindow::span(chunk_start, chunk_end));
            history_count += items.len();
            if let Err(err) = self.merge_and_save(items) {
                log::error!(
                    "backfill chunk starting {} failed: {err}",
                    format_ms(chunk_start)
                );
            }
            chunk_end = chunk_start;
        }
        log::debug!("{} unique urls seen during backfill", seen.len());

        let bookmarks = self.collect_bookmarks(&SeenUrls::new());
        let bookmark_count = bookmarks.len();
        self.merge_and_save(bookmarks)?;

        log::info!(
            "initial indexing done: {history_count} history items, {bookmark_count} bookmarks"
        );
        Ok(ImportSummary {
            history: history_count,
            bookmarks: bookmark_count,
        })
    }

    /// Incremental import of records visited at or after `since_ms`.
    pub fn import_recent_history(&self, since_ms: i64) -> Result<RecentImport, AppError> {
        if since_ms <= 0 || since_ms > now_ms() {
            return Err(AppError::InvalidInput(format!(
                "bad cutoff timestamp: {since_ms}"
            )));
        }

        log::debug!("importing history since {}", format_ms(since_ms));
        let items = self.collect_history(&SeenUrls::new(), TimeWindow::since(since_ms));
        self.merge_and_save(items)
    }

    /// Re-read bookmarks from every source and merge them in. Returns the
    /// number of bookmark tuples reported.
    pub fn import_bookmarks(&self) -> Result<usize, AppError> {
        let bookmarks = self.collect_bookmarks(&SeenUrls::new());
        let count = bookmarks.len();
        self.merge_and_save(bookmarks)?;
        Ok(count)
    }

    pub fn counts(&self) -> Result<Counts, AppError> {
        let records = self.store.get_all()?;
        Ok(Counts {
            records: records.len(),
            bookmarks: records.iter().filter(|record| record.is_bookmark).count(),
        })
    }

    /// Removal hook for URLs deleted from browser history. Bookmarked
    /// records survive. Returns how many records were dropped.
    pub fn remove_urls(&self, urls: &[String]) -> Result<usize, AppError> {
        let records = self.store.get_all()?;
        let before = records.len();

        let kept: Vec<UnifiedRecord> = records
            .into_iter()
            .filter(|record| record.is_bookmark || !urls.contains(&record.url))
            .collect();

        let removed = before - kept.len();
        self.store.save(&kept)?;

        log::info!("removed {removed} records");
        Ok(removed)
    }

    /// The "all history cleared" hook: drop everything except bookmarks.
    pub fn clear_browsing_history(&self) -> Result<usize, AppError> {
        let records = self.store.get_all()?;
        let before = records.len();

        let kept: Vec<UnifiedRecord> = records
            .into_iter()
            .filter(|record| record.is_bookmark)
            .collect();

        let removed = before - kept.len();
        self.store.save(&kept)?;

        log::info!("history cleared, {} bookmarks preserved", kept.len());
        Ok(removed)
    }

    /// Wipe the unified set entirely, bookmarks included.
    pub fn reset(&self) -> Result<(), AppError> {
        self.store.save(&[])?;
        log::info!("history reset");
        Ok(())
    }

    fn merge_and_save(&self, incoming: Vec<UnifiedRecord>) -> Result<RecentImport, AppError> {
        let existing = self.store.get_all()?;
        let outcome = merge::merge(existing, incoming);
        let total = self.store.save(&outcome.records)?;

        Ok(RecentImport {
            new_records: outcome.new_count,
            total,
        })
    }

    // fan out adapter i/o, one worker per source; join in fixed source order
    // and reduce sequentially on this thread
    fn collect_history(&self, seen: &SeenUrls, window: TimeWindow) -> Vec<UnifiedRecord> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| {
                    let seen = seen.clone();
                    let source = Arc::clone(source);
                    scope.spawn(move || (source.name(), source.import_history(&seen, window)))
                })
                .collect();

            let mut all = Vec::new();
            for handle in handles {
                match handle.join() {
                    Ok((name, Ok(items))) => all.extend(
                        items
                            .into_iter()
                            .map(|item| item.into_unified(Some(name.to_string()))),
                    ),
                    Ok((name, Err(err))) => log::error!("{name}: history import failed: {err}"),
                    Err(_) => log::error!("history import worker panicked"),
                }
            }
            all
        })
    }

    fn collect_bookmarks(&self, seen: &SeenUrls) -> Vec<UnifiedRecord> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| {
                    let seen = seen.clone();
                    let source = Arc::clone(source);
                    scope.spawn(move || (source.name(), source.import_bookmarks(&seen)))
                })
                .collect();

            let mut all = Vec::new();
            for handle in handles {
                match handle.join() {
                    Ok((name, Ok(items))) => all.extend(
                        items
                            .into_iter()
                            .map(|item| item.into_unified(Some(name.to_string()))),
                    ),
                    Ok((name, Err(err))) => log::error!("{name}: bookmark import failed: {err}"),
                    Err(_) => log::error!("bookmark import worker panicked"),
                }
            }
            all
        })
    }
}
