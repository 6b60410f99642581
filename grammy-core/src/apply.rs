//! Apply authority - stateless splice of one suggestion into caller-held text.
//!
//! Serves hosts that mediate accepts remotely. Remaining suggestions are not
//! recomputed; the caller rebases its own set.

use grammy_api::{ApplyRequest, ApplyResponse};

use crate::error::ApplyError;

pub fn apply_suggestion(request: &ApplyRequest) -> Result<ApplyResponse, ApplyError> {
    let text = &request.text;
    let s = &request.suggestion;

    let start = s.offset;
    let end = s.offset.checked_add(s.length).ok_or(ApplyError::InvalidRange)?;
    if end > text.len() {
        return Err(ApplyError::InvalidRange);
    }

    let slice = text.get(start..end).ok_or(ApplyError::TextChanged)?;
    if slice != s.original {
        return Err(ApplyError::TextChanged);
    }

    let mut new_text = String::with_capacity(text.len() + s.replacement.len());
    new_text.push_str(&text[..start]);
    new_text.push_str(&s.replacement);
    new_text.push_str(&text[end..]);

    Ok(ApplyResponse {
        text: new_text,
        matches: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammy_api::{Suggestion, SuggestionId};

    fn request(text: &str, offset: usize, length: usize, original: &str) -> ApplyRequest {
        ApplyRequest {
            text: text.to_string(),
            suggestion: Suggestion {
                id: SuggestionId::new(),
                message: "agreement".to_string(),
                offset,
                length,
                original: original.to_string(),
                replacement: "have".to_string(),
                rule: "llm".to_string(),
            },
        }
    }

    #[test]
    fn test_apply_splices() {
        let response = apply_suggestion(&request("I has a apple.", 2, 3, "has")).unwrap();
        assert_eq!(response.text, "I have a apple.");
        assert!(response.matches.is_empty());
    }

    #[test]
    fn test_apply_range_past_end() {
        assert_eq!(
            apply_suggestion(&request("I has", 4, 3, "has")).unwrap_err(),
            ApplyError::InvalidRange
        );
        assert_eq!(
            apply_suggestion(&request("I has", usize::MAX, 3, "has")).unwrap_err(),
            ApplyError::InvalidRange
        );
    }

    #[test]
    fn test_apply_text_changed() {
        assert_eq!(
            apply_suggestion(&request("I had a apple.", 2, 3, "has")).unwrap_err(),
            ApplyError::TextChanged
        );
    }

    #[test]
    fn test_apply_split_character_is_text_changed() {
        // Byte 1 is inside "é".
        assert_eq!(
            apply_suggestion(&request("é has", 1, 3, "has")).unwrap_err(),
            ApplyError::TextChanged
        );
    }
}
