use crate::{
    dedup::SeenUrls,
    records::{BookmarkItem, HistoryItem},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

pub mod chrome;
pub mod firefox;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("source data not found at {0}")]
    Unavailable(PathBuf),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("malformed bookmarks file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Half-open import window in Unix epoch milliseconds. `end_ms = None` means
/// "up to now"; `EVERYTHING` is the full-import form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: Option<i64>,
}

impl TimeWindow {
    pub const EVERYTHING: TimeWindow = TimeWindow {
        start_ms: 0,
        end_ms: None,
    };

    pub fn since(start_ms: i64) -> Self {
        TimeWindow {
            start_ms,
            end_ms: None,
        }
    }

    pub fn span(start_ms: i64, end_ms: i64) -> Self {
        TimeWindow {
            start_ms,
            end_ms: Some(end_ms),
        }
    }
}

/// Per-browser adapter. Implementations locate vendor profile directories,
/// snapshot any locked database before reading, and translate vendor epoch
/// encodings to Unix milliseconds. Output tuples carry trimmed titles in
/// recency-descending order; per-profile failures are logged and skipped so
/// one broken profile never aborts the pass.
pub trait BrowserSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn profiles(&self) -> Vec<PathBuf>;

    fn import_history(
        &self,
        seen: &SeenUrls,
        window: TimeWindow,
    ) -> Result<Vec<HistoryItem>, SourceError>;

    fn import_bookmarks(&self, seen: &SeenUrls) -> Result<Vec<BookmarkItem>, SourceError>;
}

pub fn default_sources() -> Vec<Arc<dyn BrowserSource>> {
    vec![
        Arc::new(chrome::ChromeSource::default()),
        Arc::new(firefox::FirefoxSource::default()),
    ]
}

/// Copy a possibly-locked vendor database into a scratch dir before opening.
/// The returned guard removes the snapshot when dropped.
pub(crate) fn snapshot_db(db_path: &Path) -> Result<(tempfile::TempDir, PathBuf), SourceError> {
    if !db_path.exists() {
        return Err(SourceError::Unavailable(db_path.to_path_buf()));
    }

    let dir = tempfile::Builder::new().prefix("recall-snapshot-").tempdir()?;
    let file_name = db_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("snapshot"));
    let copy_path = dir.path().join(file_name);
    std::fs::copy(db_path, &copy_path)?;

    Ok((dir, copy_path))
}

pub(crate) fn home_dir() -> PathBuf {
    homedir::my_home()
        .ok()
        .flatten()
        .unwrap_or_else(|| PathBuf::from("."))
}
