//! Suggestion registry - the active set and the text it is valid against.
//!
//! Both mutations (`replace_all` and `accept`) validate first and then swap
//! state in one step, so no reader ever sees a half-rebased set.

use grammy_api::{Suggestion, SuggestionId};

use crate::error::AcceptError;
use crate::overlap::ResolvedSet;

/// Result of a successful accept.
#[derive(Debug, Clone)]
pub struct Accepted {
    /// The live text with the replacement spliced in.
    pub text: String,
    /// The suggestion that was applied and removed.
    pub applied: Suggestion,
    /// The remaining suggestions, rebased onto `text`.
    pub suggestions: Vec<Suggestion>,
}

/// Owns the authoritative suggestion set for one text snapshot.
#[derive(Debug, Default)]
pub struct SuggestionRegistry {
    active: Vec<Suggestion>,
    snapshot: String,
}

impl SuggestionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot and its resolved set.
    pub fn replace_all(&mut self, text: impl Into<String>, set: ResolvedSet) {
        self.snapshot = text.into();
        self.active = set.into_vec();
        tracing::debug!(
            "Registry replaced: {} suggestion(s), snapshot_len={}",
            self.active.len(),
            self.snapshot.len()
        );
    }

    /// Drop every suggestion; `text` becomes the snapshot.
    pub fn invalidate(&mut self, text: &str) {
        self.active.clear();
        self.snapshot.clear();
        self.snapshot.push_str(text);
    }

    /// Apply suggestion `id` to `live_text`.
    ///
    /// The suggestion's `original` is re-checked against `live_text`, not the
    /// snapshot, because the caller's text is the canonical one. On success
    /// every suggestion starting at or after the applied range's end is
    /// shifted by the length delta. That includes one sharing the offset of
    /// an applied insertion.
    pub fn accept(&mut self, id: SuggestionId, live_text: &str) -> Result<Accepted, AcceptError> {
        let index = self
            .active
            .iter()
            .position(|s| s.id == id)
            .ok_or(AcceptError::NotFound(id))?;

        let target = &self.active[index];
        if !target.matches(live_text) {
            tracing::debug!(
                "Suggestion {} is stale: expected {:?} at {}..{}",
                id,
                target.original,
                target.offset,
                target.end()
            );
            return Err(AcceptError::StaleSuggestion(id));
        }

        let mut text = String::with_capacity(live_text.len() + target.replacement.len());
        text.push_str(&live_text[..target.offset]);
        text.push_str(&target.replacement);
        text.push_str(&live_text[target.end()..]);

        let applied = self.active.remove(index);
        let delta = applied.delta();
        for s in &mut self.active {
            if s.offset >= applied.end() {
                s.offset = s.offset.saturating_add_signed(delta);
            }
        }
        self.snapshot.clone_from(&text);

        tracing::debug!(
            "Accepted suggestion {} (delta={}), {} remaining",
            id,
            delta,
            self.active.len()
        );
        Ok(Accepted {
            text,
            applied,
            suggestions: self.active.clone(),
        })
    }

    pub fn get(&self, id: SuggestionId) -> Option<&Suggestion> {
        self.active.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: SuggestionId) -> bool {
        self.get(id).is_some()
    }

    /// The active set, ordered by offset.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.active
    }

    /// Copy of the active set as a resolved set.
    pub fn resolved(&self) -> ResolvedSet {
        ResolvedSet::from_ordered(self.active.clone())
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::overlap::{is_ordered, resolve};
    use grammy_api::RawMatch;

    fn registry_for(text: &str, matches: Vec<RawMatch>) -> SuggestionRegistry {
        let mut registry = SuggestionRegistry::new();
        registry.replace_all(text, resolve(normalize(text, matches)));
        registry
    }

    #[test]
    fn test_accept_basic_scenario() {
        let text = "I has a apple.";
        let mut registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        let s = registry.suggestions()[0].clone();
        assert_eq!((s.offset, s.length), (2, 3));
        assert_eq!(s.original, "has");

        let accepted = registry.accept(s.id, text).unwrap();
        assert_eq!(accepted.text, "I have a apple.");
        assert_eq!(accepted.applied.id, s.id);
        assert!(registry.is_empty());
        assert_eq!(registry.snapshot(), "I have a apple.");
    }

    #[test]
    fn test_accept_rebases_later_suggestions_only() {
        let text = "I has a apple and a orange.";
        let mut registry = registry_for(
            text,
            vec![
                RawMatch::new("article", 0, 1, "We"),
                RawMatch::new("agreement", 2, 5, "have"),
                RawMatch::new("article", 6, 7, "an"),
                RawMatch::new("article", 18, 19, "an"),
            ],
        );
        let before: Vec<_> = registry.suggestions().to_vec();
        let target = before[1].clone();

        let accepted = registry.accept(target.id, text).unwrap();
        let after = registry.suggestions();
        assert_eq!(after, accepted.suggestions.as_slice());
        assert_eq!(after.len(), 3);
        assert_eq!(after[0].offset, before[0].offset);
        assert_eq!(after[1].offset, before[2].offset + 1);
        assert_eq!(after[2].offset, before[3].offset + 1);

        for s in after {
            assert!(s.matches(&accepted.text), "{:?} lost its slice", s.original);
        }
        assert!(is_ordered(after));
    }

    #[test]
    fn test_accept_shrinking_replacement() {
        let text = "This is is a test of of it";
        let mut registry = registry_for(
            text,
            vec![
                RawMatch::new("repeated word", 5, 10, "is"),
                RawMatch::new("repeated word", 18, 23, "of"),
            ],
        );
        let first = registry.suggestions()[0].id;
        let accepted = registry.accept(first, text).unwrap();
        assert_eq!(accepted.text, "This is a test of of it");

        let second = registry.suggestions()[0].clone();
        assert_eq!(second.offset, 18 - 3);
        let accepted = registry.accept(second.id, &accepted.text).unwrap();
        assert_eq!(accepted.text, "This is a test of it");
    }

    #[test]
    fn test_accept_unknown_id_not_found() {
        let text = "I has a apple.";
        let mut registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        let missing = SuggestionId::new();
        assert_eq!(
            registry.accept(missing, text).unwrap_err(),
            AcceptError::NotFound(missing)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_accept_twice_not_found() {
        let text = "I has a apple.";
        let mut registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        let id = registry.suggestions()[0].id;
        let accepted = registry.accept(id, text).unwrap();
        assert_eq!(
            registry.accept(id, &accepted.text).unwrap_err(),
            AcceptError::NotFound(id)
        );
    }

    #[test]
    fn test_accept_stale_leaves_state_untouched() {
        let text = "I has a apple.";
        let mut registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        let id = registry.suggestions()[0].id;

        let edited = "I had a apple.";
        assert_eq!(
            registry.accept(id, edited).unwrap_err(),
            AcceptError::StaleSuggestion(id)
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot(), text);
    }

    #[test]
    fn test_accept_stale_when_live_text_shorter() {
        let text = "I has a apple.";
        let mut registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        let id = registry.suggestions()[0].id;
        assert_eq!(
            registry.accept(id, "I h").unwrap_err(),
            AcceptError::StaleSuggestion(id)
        );
    }

    #[test]
    fn test_accept_with_multibyte_text() {
        let text = "Café 😀 is verry good";
        let mut registry = registry_for(
            text,
            vec![
                RawMatch::new("emoji", 5, 6, "🙂"),
                RawMatch::new("spelling", 10, 15, "very"),
            ],
        );
        let emoji = registry.suggestions()[0].id;
        let accepted = registry.accept(emoji, text).unwrap();
        assert_eq!(accepted.text, "Café 🙂 is verry good");

        let spelling = registry.suggestions()[0].clone();
        assert_eq!(spelling.original, "verry");
        let accepted = registry.accept(spelling.id, &accepted.text).unwrap();
        assert_eq!(accepted.text, "Café 🙂 is very good");
    }

    fn insertion_and_span() -> (SuggestionRegistry, Suggestion, Suggestion) {
        let text = "Hello world";
        let registry = registry_for(
            text,
            vec![
                RawMatch::new("comma", 5, 5, ","),
                RawMatch::new("capitalize", 5, 11, " World"),
            ],
        );
        let set = registry.suggestions().to_vec();
        assert_eq!(set.len(), 2);
        assert_eq!((set[0].offset, set[0].length), (5, 0));
        assert_eq!((set[1].offset, set[1].length), (5, 6));
        (registry, set[0].clone(), set[1].clone())
    }

    #[test]
    fn test_accept_insertion_shifts_span_at_same_offset() {
        let (mut registry, insertion, span) = insertion_and_span();

        let accepted = registry.accept(insertion.id, "Hello world").unwrap();
        assert_eq!(accepted.text, "Hello, world");

        let survivor = registry.get(span.id).unwrap().clone();
        assert_eq!(survivor.offset, 6);
        assert!(survivor.matches(&accepted.text));

        let accepted = registry.accept(span.id, &accepted.text).unwrap();
        assert_eq!(accepted.text, "Hello, World");
    }

    #[test]
    fn test_accept_span_keeps_insertion_before_it() {
        let (mut registry, insertion, span) = insertion_and_span();

        let accepted = registry.accept(span.id, "Hello world").unwrap();
        assert_eq!(accepted.text, "Hello World");
        assert_eq!(registry.get(insertion.id).unwrap().offset, 5);

        let accepted = registry.accept(insertion.id, &accepted.text).unwrap();
        assert_eq!(accepted.text, "Hello, World");
    }

    #[test]
    fn test_replace_all_idempotent() {
        let text = "I has a apple.";
        let set = resolve(normalize(text, vec![RawMatch::new("agreement", 2, 5, "have")]));

        let mut registry = SuggestionRegistry::new();
        registry.replace_all(text, set.clone());
        let first: Vec<_> = registry.suggestions().to_vec();
        registry.replace_all(text, set);
        assert_eq!(registry.suggestions(), first.as_slice());
        assert_eq!(registry.snapshot(), text);
    }

    #[test]
    fn test_invalidate_clears() {
        let text = "I has a apple.";
        let mut registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        registry.invalidate("I has an apple.");
        assert!(registry.is_empty());
        assert_eq!(registry.snapshot(), "I has an apple.");
    }

    #[test]
    fn test_get_and_contains() {
        let text = "I has a apple.";
        let registry = registry_for(text, vec![RawMatch::new("agreement", 2, 5, "have")]);
        let id = registry.suggestions()[0].id;
        assert!(registry.contains(id));
        assert_eq!(registry.get(id).map(|s| s.original.as_str()), Some("has"));
        assert!(!registry.contains(SuggestionId::new()));
    }
}
