use crate::records::{UnifiedRecord, INITIAL_SCORE};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub records: Vec<UnifiedRecord>,
    /// URLs that were not present before this merge.
    pub new_count: usize,
}

/// Reconcile a freshly imported batch against the persisted unified set.
///
/// One policy for every import path: score never decreases (max wins),
/// `is_bookmark` is sticky once true, and an incoming bookmark title replaces
/// the stored title only when non-empty. Result order is existing order
/// followed by newly inserted URLs in batch order; callers rank separately.
pub fn merge(existing: Vec<UnifiedRecord>, incoming: Vec<UnifiedRecord>) -> MergeOutcome {
    if incoming.is_empty() {
        return MergeOutcome {
            records: existing,
            new_count: 0,
        };
    }

    let mut order = Vec::with_capacity(existing.len() + incoming.len());
    let mut by_url: HashMap<String, UnifiedRecord> =
        HashMap::with_capacity(existing.len() + incoming.len());

    for record in existing {
        let record = clamp_score(record);
        let url = record.url.clone();
        if by_url.insert(url.clone(), record).is_none() {
            order.push(url);
        }
    }

    let mut new_count = 0;
    for record in incoming {
        let record = clamp_score(record);
        match by_url.get_mut(&record.url) {
            Some(current) => *current = reconcile(current, record),
            None => {
                new_count += 1;
                order.push(record.url.clone());
                by_url.insert(record.url.clone(), record);
            }
        }
    }

    let records: Vec<UnifiedRecord> = order
        .iter()
        .filter_map(|url| by_url.remove(url))
        .collect();

    // a duplicate key surviving the merge is a defect
    debug_assert_eq!(records.len(), order.len());

    MergeOutcome { records, new_count }
}

fn reconcile(current: &UnifiedRecord, incoming: UnifiedRecord) -> UnifiedRecord {
    let title = if incoming.is_bookmark && !incoming.title.trim().is_empty() {
        incoming.title
    } else {
        current.title.clone()
    };

    UnifiedRecord {
        url: incoming.url,
        title,
        score: current.score.max(incoming.score),
        last_visit_time: incoming.last_visit_time.or(current.last_visit_time),
        is_bookmark: current.is_bookmark || incoming.is_bookmark,
        source: incoming.source.or_else(|| current.source.clone()),
    }
}

// score starts at 1 and never goes below it
fn clamp_score(mut record: UnifiedRecord) -> UnifiedRecord {
    if record.score < INITIAL_SCORE {
        record.score = INITIAL_SCORE;
    }
    record
}
