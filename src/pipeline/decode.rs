//! Decoding: deterministic cleanup of the LLM's JSON wrapping, then strict
//! deserialization into the summary schema.
//!
//! ## Why is cleanup necessary?
//!
//! Even well-prompted models occasionally wrap the JSON object despite the
//! prompt saying not to:
//!
//! - ` ```json ... ``` ` fences around the object
//! - a sentence of prose before or after it ("Here is the summary:")
//! - trailing whitespace or a stray closing remark
//!
//! The cleanup rules here are cheap and deterministic, so the prompt can
//! stay focused on *what to extract* rather than formatting edge-cases.
//! After cleanup, deserialization is strict: a missing or mistyped required
//! field is a schema mismatch, not something to paper over.

use crate::schema::PaperResponse;
use once_cell::sync::Lazy;
use regex::Regex;

/// Why a response failed to decode.
#[derive(Debug, Clone)]
pub struct DecodeFailure {
    pub detail: String,
}

/// Decode a raw model response into a [`PaperResponse`].
///
/// Applies the cleanup rules in order, then deserializes. Returns
/// `Err(DecodeFailure)` when no JSON object can be found or the object
/// does not match the schema.
pub fn decode_response(raw: &str) -> Result<PaperResponse, DecodeFailure> {
    let s = strip_code_fences(raw);
    let s = slice_to_json_object(&s).ok_or_else(|| DecodeFailure {
        detail: "no JSON object found in response".into(),
    })?;
    serde_json::from_str(s).map_err(|e| DecodeFailure {
        detail: e.to_string(),
    })
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Slice to the outermost JSON object ──────────────────────────────

/// Cut leading/trailing prose by slicing from the first `{` to the last `}`.
///
/// Good enough for surrounding chatter; an unbalanced or truncated object
/// still fails cleanly in the deserializer with a precise message.
fn slice_to_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&input[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sample_response_json;

    #[test]
    fn bare_json_decodes() {
        let resp = decode_response(&sample_response_json()).unwrap();
        assert_eq!(resp.title, "Attention Is All You Need");
    }

    #[test]
    fn fenced_json_decodes() {
        let raw = format!("```json\n{}\n```", sample_response_json());
        let resp = decode_response(&raw).unwrap();
        assert_eq!(resp.authors.len(), 2);
    }

    #[test]
    fn fenced_json_without_language_tag_decodes() {
        let raw = format!("```\n{}\n```", sample_response_json());
        assert!(decode_response(&raw).is_ok());
    }

    #[test]
    fn prose_wrapped_json_decodes() {
        let raw = format!(
            "Here is the structured summary you asked for:\n\n{}\n\nLet me know if you need anything else.",
            sample_response_json()
        );
        let resp = decode_response(&raw).unwrap();
        assert_eq!(resp.future_work, "Apply to other modalities.");
    }

    #[test]
    fn response_without_json_is_rejected() {
        let err = decode_response("I cannot summarize this document.").unwrap_err();
        assert!(err.detail.contains("no JSON object"), "got: {}", err.detail);
    }

    #[test]
    fn missing_field_is_a_schema_mismatch() {
        let mut v: serde_json::Value =
            serde_json::from_str(&sample_response_json()).unwrap();
        v.as_object_mut().unwrap().remove("authors");
        let err = decode_response(&v.to_string()).unwrap_err();
        assert!(err.detail.contains("authors"), "got: {}", err.detail);
    }

    #[test]
    fn mistyped_field_is_a_schema_mismatch() {
        let mut v: serde_json::Value =
            serde_json::from_str(&sample_response_json()).unwrap();
        v.as_object_mut()
            .unwrap()
            .insert("authors".into(), serde_json::json!("Vaswani"));
        assert!(decode_response(&v.to_string()).is_err());
    }

    #[test]
    fn truncated_object_is_rejected() {
        let full = sample_response_json();
        let truncated = &full[..full.len() / 2];
        assert!(decode_response(truncated).is_err());
    }
}
