//! Overlap resolution - an ordered, non-overlapping subset of candidates.
//!
//! Earlier-starting candidates win; among equal starts, the one the checker
//! listed first wins.

use grammy_api::Suggestion;

/// Suggestions sorted ascending by offset and pairwise non-overlapping.
///
/// Only [`resolve`] and the registry's rebase construct one, so holding a
/// `ResolvedSet` is proof of the ordering invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet(Vec<Suggestion>);

impl ResolvedSet {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wrap a list the caller has already ordered and de-overlapped.
    pub(crate) fn from_ordered(suggestions: Vec<Suggestion>) -> Self {
        debug_assert!(is_ordered(&suggestions));
        Self(suggestions)
    }

    pub fn as_slice(&self) -> &[Suggestion] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Suggestion> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Suggestion> {
        self.0
    }
}

impl AsRef<[Suggestion]> for ResolvedSet {
    fn as_ref(&self) -> &[Suggestion] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a ResolvedSet {
    type Item = &'a Suggestion;
    type IntoIter = std::slice::Iter<'a, Suggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Sort by offset (stable) and greedily keep candidates that start at or
/// after the end of the last kept one.
pub fn resolve(mut candidates: Vec<Suggestion>) -> ResolvedSet {
    candidates.sort_by_key(|s| s.offset);

    let mut kept = Vec::with_capacity(candidates.len());
    let mut cursor = 0;
    for candidate in candidates {
        if candidate.offset >= cursor {
            cursor = candidate.end();
            kept.push(candidate);
        } else {
            tracing::debug!(
                "Dropping overlapping suggestion at {}..{} (cursor={})",
                candidate.offset,
                candidate.end(),
                cursor
            );
        }
    }

    ResolvedSet(kept)
}

/// Whether `suggestions` are sorted by offset and pairwise non-overlapping.
pub fn is_ordered(suggestions: &[Suggestion]) -> bool {
    suggestions
        .windows(2)
        .all(|pair| pair[0].offset <= pair[1].offset && pair[0].end() <= pair[1].offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammy_api::SuggestionId;

    fn span(offset: usize, length: usize, message: &str) -> Suggestion {
        Suggestion {
            id: SuggestionId::new(),
            message: message.to_string(),
            offset,
            length,
            original: "x".repeat(length),
            replacement: "y".to_string(),
            rule: "test".to_string(),
        }
    }

    fn messages(set: &ResolvedSet) -> Vec<&str> {
        set.iter().map(|s| s.message.as_str()).collect()
    }

    #[test]
    fn test_overlap_first_start_wins() {
        let set = resolve(vec![span(0, 5, "first"), span(3, 5, "second")]);
        assert_eq!(messages(&set), vec!["first"]);
    }

    #[test]
    fn test_unsorted_input_sorted() {
        let set = resolve(vec![span(10, 2, "c"), span(0, 2, "a"), span(5, 2, "b")]);
        assert_eq!(messages(&set), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_adjacent_spans_both_kept() {
        let set = resolve(vec![span(0, 3, "a"), span(3, 3, "b")]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_equal_offsets_keep_input_order() {
        let set = resolve(vec![span(2, 4, "listed first"), span(2, 1, "shorter")]);
        assert_eq!(messages(&set), vec!["listed first"]);
    }

    #[test]
    fn test_contained_span_dropped() {
        let set = resolve(vec![span(0, 10, "outer"), span(2, 2, "inner"), span(12, 1, "after")]);
        assert_eq!(messages(&set), vec!["outer", "after"]);
    }

    #[test]
    fn test_output_always_ordered() {
        let offsets = [7, 3, 3, 0, 12, 9, 1, 15, 4];
        let lengths = [3, 2, 6, 4, 1, 5, 1, 0, 2];
        let candidates = offsets
            .iter()
            .zip(lengths.iter())
            .map(|(&o, &l)| span(o, l, "c"))
            .collect();
        let set = resolve(candidates);
        assert!(is_ordered(set.as_slice()));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve(Vec::new()).is_empty());
    }
}
