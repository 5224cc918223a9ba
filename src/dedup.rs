use crate::records::SourceRecord;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

/// URLs already claimed during one import pass. Cloned into every adapter of
/// the pass so cross-source duplicates are suppressed; a new handle is
/// created for each pass.
#[derive(Debug, Clone, Default)]
pub struct SeenUrls {
    urls: Arc<Mutex<HashSet<String>>>,
}

impl SeenUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once per URL; the winning caller keeps the record.
    pub fn first_sighting(&self, url: &str) -> bool {
        self.urls.lock().unwrap().insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().unwrap().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.lock().unwrap().is_empty()
    }
}

/// Collapse raw tuples to at most one entry per URL, first one wins. Tuples
/// with a blank title or url are dropped silently. The shared set is mutated
/// so sequential calls within a pass keep suppressing repeats.
pub fn dedup<T: SourceRecord>(seen: &SeenUrls, items: impl IntoIterator<Item = T>) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| !item.url().is_empty() && !item.title().trim().is_empty())
        .filter(|item| seen.first_sighting(item.url()))
        .collect()
}
