use crate::records::UnifiedRecord;

/// Result page cap, applied after ranking.
pub const RESULT_LIMIT: usize = 50;

/// Query prefix restricting the candidate set to bookmarks.
pub const BOOKMARK_PREFIX: &str = "b:";

/// Ranked substring search over the unified set.
///
/// Every whitespace-separated query word must appear in the lower-cased title
/// or url. Matches are ordered by score descending, then last visit time
/// descending (records without a visit time sort last); ties keep input
/// order. Pure function, never errors; no matches is an empty vec.
///
/// A `b:` prefix filters to bookmarks and may be followed by an empty query,
/// which ranks all bookmarks. A blank query without the prefix matches
/// nothing.
pub fn search(records: &[UnifiedRecord], query: &str) -> Vec<UnifiedRecord> {
    let (bookmarks_only, term) = match query.strip_prefix(BOOKMARK_PREFIX) {
        Some(rest) => (true, rest.trim()),
        None => (false, query.trim()),
    };

    if !bookmarks_only && term.is_empty() {
        return Vec::new();
    }

    let term = term.to_lowercase();
    let words: Vec<&str> = term.split_whitespace().collect();

    let mut matches: Vec<UnifiedRecord> = records
        .iter()
        .filter(|record| !record.url.is_empty() && !record.title.is_empty())
        .filter(|record| record.is_bookmark || !bookmarks_only)
        .filter(|record| {
            let title = record.title.to_lowercase();
            let url = record.url.to_lowercase();
            words
                .iter()
                .all(|word| title.contains(word) || url.contains(word))
        })
        .cloned()
        .collect();

    // sort_by is stable, so ties beyond the two keys keep input order
    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.last_visit_time.cmp(&a.last_visit_time))
    });
    matches.truncate(RESULT_LIMIT);

    matches
}
