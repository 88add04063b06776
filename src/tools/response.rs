//! Uniform result envelope for every tool.

use crate::error::DbError;
use schemars::JsonSchema;
use serde::Serialize;

/// `{ success, data?, error?, cached?, note? }`
///
/// A failed operation is still a well-formed response; callers tell the two
/// apart by `success` alone.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ToolResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present only on cacheable operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> ToolResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            cached: None,
            note: None,
        }
    }

    /// Failure envelope. With `redact` set, driver detail is reduced to its category.
    pub fn failure(err: &DbError, redact: bool) -> Self {
        let message = if redact {
            err.redacted_message()
        } else {
            err.to_string()
        };
        Self {
            success: false,
            data: None,
            error: Some(message),
            cached: None,
            note: None,
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = Some(cached);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Shorten caller input for log fields.
pub(crate) fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let mut chars = input.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
