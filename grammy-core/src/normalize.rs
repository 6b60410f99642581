//! Offset normalization - code-point matches to storage-unit suggestions.
//!
//! Checkers count characters; the live text is sliced in storage units.
//! Every match goes through a single lookup table built in one pass over the
//! text, so non-ASCII input never shifts an offset.

use grammy_api::{DEFAULT_RULE, RawMatch, Suggestion, SuggestionId};
use thiserror::Error;

/// The unit offsets are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageUnit {
    /// UTF-8 bytes, the addressing of a Rust `String`.
    #[default]
    Utf8,
    /// UTF-16 code units, the addressing of JavaScript and most GUI toolkits.
    Utf16,
}

impl StorageUnit {
    /// Width of one code point in this unit.
    pub fn width(self, c: char) -> usize {
        match self {
            StorageUnit::Utf8 => c.len_utf8(),
            StorageUnit::Utf16 => c.len_utf16(),
        }
    }
}

/// Monotonic map from code-point index to storage-unit start.
///
/// Holds `N + 1` entries for a text of `N` code points; the last entry is
/// the total storage length.
#[derive(Debug, Clone)]
pub struct OffsetTable {
    unit: StorageUnit,
    starts: Vec<usize>,
    /// Byte start of each code point, for slicing the Rust string.
    bytes: Vec<usize>,
}

impl OffsetTable {
    pub fn build(text: &str, unit: StorageUnit) -> Self {
        let mut starts = Vec::with_capacity(text.len() + 1);
        let mut bytes = Vec::with_capacity(text.len() + 1);
        let mut position = 0;

        for (byte, c) in text.char_indices() {
            starts.push(position);
            bytes.push(byte);
            position += unit.width(c);
        }
        starts.push(position);
        bytes.push(text.len());

        Self {
            unit,
            starts,
            bytes,
        }
    }

    pub fn unit(&self) -> StorageUnit {
        self.unit
    }

    /// Number of code points in the text.
    pub fn char_len(&self) -> usize {
        self.starts.len() - 1
    }

    /// Total storage length of the text.
    pub fn len_units(&self) -> usize {
        self.starts[self.char_len()]
    }

    /// Storage-unit start of code point `index`. `None` past the end.
    pub fn unit_offset(&self, index: usize) -> Option<usize> {
        self.starts.get(index).copied()
    }

    /// The text between two code-point indices.
    pub fn slice<'t>(&self, text: &'t str, start: usize, end: usize) -> Option<&'t str> {
        let from = *self.bytes.get(start)?;
        let to = *self.bytes.get(end)?;
        text.get(from..to)
    }
}

/// Why a raw match was dropped. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchRejection {
    #[error("malformed range {start}..{end} for text of {len} characters")]
    Malformed { start: usize, end: usize, len: usize },

    #[error("replacement equals original")]
    NoOp,
}

/// Normalize matches against a UTF-8 text.
pub fn normalize(text: &str, matches: Vec<RawMatch>) -> Vec<Suggestion> {
    normalize_in(text, matches, StorageUnit::Utf8)
}

/// Normalize matches, addressing the result in `unit`.
///
/// Malformed and no-op matches are dropped; the rest get fresh ids.
pub fn normalize_in(text: &str, matches: Vec<RawMatch>, unit: StorageUnit) -> Vec<Suggestion> {
    let table = OffsetTable::build(text, unit);
    let total = matches.len();

    let candidates: Vec<Suggestion> = matches
        .into_iter()
        .filter_map(|m| match to_candidate(&table, text, m) {
            Ok(candidate) => Some(candidate),
            Err(rejection) => {
                tracing::debug!("Dropping checker match: {}", rejection);
                None
            }
        })
        .collect();

    if candidates.len() < total {
        tracing::debug!(
            "Normalized {} of {} matches ({:?})",
            candidates.len(),
            total,
            unit
        );
    }
    candidates
}

fn to_candidate(
    table: &OffsetTable,
    text: &str,
    m: RawMatch,
) -> Result<Suggestion, MatchRejection> {
    let malformed = MatchRejection::Malformed {
        start: m.start,
        end: m.end,
        len: table.char_len(),
    };
    if m.start > m.end || m.end > table.char_len() {
        return Err(malformed);
    }

    let (Some(offset), Some(end)) = (table.unit_offset(m.start), table.unit_offset(m.end)) else {
        return Err(malformed);
    };
    let original = table.slice(text, m.start, m.end).ok_or(malformed)?;

    if original == m.replacement {
        return Err(MatchRejection::NoOp);
    }

    Ok(Suggestion {
        id: SuggestionId::new(),
        message: m.message,
        offset,
        length: end - offset,
        original: original.to_string(),
        replacement: m.replacement,
        rule: m.rule.unwrap_or_else(|| DEFAULT_RULE.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ascii() {
        let table = OffsetTable::build("abc", StorageUnit::Utf8);
        assert_eq!(table.char_len(), 3);
        assert_eq!(table.len_units(), 3);
        assert_eq!(table.unit_offset(3), Some(3));
        assert_eq!(table.unit_offset(4), None);
    }

    #[test]
    fn test_table_empty_text() {
        let table = OffsetTable::build("", StorageUnit::Utf16);
        assert_eq!(table.char_len(), 0);
        assert_eq!(table.len_units(), 0);
        assert_eq!(table.unit_offset(0), Some(0));
    }

    #[test]
    fn test_table_wide_character_utf16() {
        // 4 characters, the emoji takes two UTF-16 units.
        let table = OffsetTable::build("a😀bc", StorageUnit::Utf16);
        assert_eq!(table.char_len(), 4);
        assert_eq!(table.len_units(), 5);
        assert_eq!(table.unit_offset(2), Some(3));
        assert_eq!(table.unit_offset(4), Some(5));
    }

    #[test]
    fn test_table_wide_character_utf8() {
        let table = OffsetTable::build("a😀bc", StorageUnit::Utf8);
        assert_eq!(table.len_units(), 7);
        assert_eq!(table.unit_offset(2), Some(5));
        assert_eq!(table.slice("a😀bc", 1, 2), Some("😀"));
    }

    #[test]
    fn test_basic_match() {
        let text = "I has a apple.";
        let out = normalize(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].offset, 2);
        assert_eq!(out[0].length, 3);
        assert_eq!(out[0].original, "has");
        assert_eq!(out[0].replacement, "have");
        assert_eq!(out[0].rule, DEFAULT_RULE);
    }

    #[test]
    fn test_unicode_match_converts_to_bytes() {
        let text = "Hi 😀 there";
        let out = normalize(text, vec![RawMatch::new("Change", 3, 4, "🙂")]);
        assert_eq!(out.len(), 1);
        let s = &out[0];
        assert_eq!(s.original, "😀");
        assert_eq!(&text[s.offset..s.offset + s.length], "😀");
    }

    #[test]
    fn test_end_index_after_wide_character() {
        let text = "é😀ab";
        let out = normalize_in(text, vec![RawMatch::new("m", 2, 4, "xy")], StorageUnit::Utf16);
        assert_eq!(out[0].offset, 3);
        assert_eq!(out[0].length, 2);
        assert_eq!(out[0].original, "ab");

        let out = normalize(text, vec![RawMatch::new("m", 0, 4, "x")]);
        assert_eq!(out[0].end(), text.len());
    }

    #[test]
    fn test_malformed_matches_dropped_good_kept() {
        let text = "abcd";
        let out = normalize(
            text,
            vec![
                RawMatch::new("reversed", 3, 1, "x"),
                RawMatch::new("past end", 2, 5, "x"),
                RawMatch::new("far past end", 9, 12, "x"),
                RawMatch::new("ok", 1, 2, "B"),
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "ok");
    }

    #[test]
    fn test_noop_dropped() {
        let out = normalize("same", vec![RawMatch::new("noop", 0, 4, "same")]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_insertion_at_end_allowed() {
        let out = normalize("Hello", vec![RawMatch::new("punctuation", 5, 5, ".")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].offset, 5);
        assert_eq!(out[0].length, 0);
        assert_eq!(out[0].original, "");
    }

    #[test]
    fn test_ids_fresh_per_match() {
        let out = normalize(
            "ab",
            vec![RawMatch::new("a", 0, 1, "A"), RawMatch::new("b", 1, 2, "B")],
        );
        assert_ne!(out[0].id, out[1].id);
    }

    #[test]
    fn test_checker_rule_preserved() {
        let mut m = RawMatch::new("typo", 0, 3, "the");
        m.rule = Some("spelling".to_string());
        let out = normalize("teh cat", vec![m]);
        assert_eq!(out[0].rule, "spelling");
    }

    #[test]
    fn test_never_exceeds_text_length() {
        let text = "ñ😀ü ok 漢字";
        let n = text.chars().count();
        let mut matches = Vec::new();
        for start in 0..=n + 1 {
            for end in 0..=n + 1 {
                matches.push(RawMatch::new("mark", start, end, "#"));
            }
        }
        for s in normalize(text, matches) {
            assert!(s.end() <= text.len());
            assert!(s.matches(text));
        }
    }
}
