use serde::{Deserialize, Serialize};
use std::hash::Hash;

pub const INITIAL_SCORE: i64 = 1;

/// One merged record per URL across every browser and profile.
#[derive(Debug, Clone, Eq, Default, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub url: String,
    pub title: String,
    pub score: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit_time: Option<i64>,

    #[serde(default)]
    pub is_bookmark: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Hash for UnifiedRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state)
    }
}

impl PartialEq for UnifiedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

/// A raw visited-page tuple reported by a browser source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryItem {
    pub title: String,
    pub url: String,
    pub score: i64,
    pub last_visit_time: Option<i64>,
}

impl HistoryItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        score: i64,
        last_visit_time: Option<i64>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            score,
            last_visit_time,
        }
    }

    pub fn into_unified(self, source: Option<String>) -> UnifiedRecord {
        let title = normalize_title(&self.title, &self.url);
        UnifiedRecord {
            url: self.url,
            title,
            score: self.score.max(INITIAL_SCORE),
            last_visit_time: self.last_visit_time,
            is_bookmark: false,
            source,
        }
    }
}

/// A raw bookmark tuple reported by a browser source. Carries a folder path
/// instead of a score; the score is synthesized on merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkItem {
    pub title: String,
    pub url: String,
    pub folder: Option<String>,
    pub last_modified: Option<i64>,
}

impl BookmarkItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        folder: Option<String>,
        last_modified: Option<i64>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            folder,
            last_modified,
        }
    }

    pub fn into_unified(self, source: Option<String>) -> UnifiedRecord {
        let title = normalize_title(&self.title, &self.url);
        UnifiedRecord {
            url: self.url,
            title,
            score: INITIAL_SCORE,
            last_visit_time: self.last_modified,
            is_bookmark: true,
            source,
        }
    }
}

// title is never empty once a record enters the unified set
fn normalize_title(title: &str, url: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        url.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Minimal view over raw source tuples, enough for the deduplicator.
pub trait SourceRecord {
    fn url(&self) -> &str;
    fn title(&self) -> &str;
}

impl SourceRecord for HistoryItem {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl SourceRecord for BookmarkItem {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl SourceRecord for UnifiedRecord {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }
}
