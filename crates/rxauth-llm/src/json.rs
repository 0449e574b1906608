//! JSON response parsing with fenced-code-block tolerance.
//!
//! Models asked for "JSON only" still wrap replies in markdown fences
//! often enough that unwrapping one fence is a required compatibility
//! behavior. Exactly one unwrap is attempted; anything still unparseable
//! is an error carrying the raw text.

use crate::error::{LlmError, LlmResult};

/// Strip a single ``` or ```json fence wrapping `content`, if present.
/// Returns the inner text trimmed; content without a fence passes through
/// trimmed.
pub fn strip_code_fence(content: &str) -> &str {
    if let Some(start) = content.find("```json") {
        let inner = &content[start + "```json".len()..];
        if let Some(end) = inner.find("```") {
            return inner[..end].trim();
        }
        return inner.trim();
    }
    if let Some(start) = content.find("```") {
        let inner = &content[start + "```".len()..];
        if let Some(end) = inner.find("```") {
            return inner[..end].trim();
        }
        return inner.trim();
    }
    content.trim()
}

/// Parse a model reply as strict JSON after one fence unwrap.
pub fn parse_json_response(content: &str) -> LlmResult<serde_json::Value> {
    let unwrapped = strip_code_fence(content);
    serde_json::from_str(unwrapped).map_err(|_| LlmError::ResponseParse {
        raw: content.to_string(),
    })
}
