//! Statutory text entries stored in the law database.

use serde::{Deserialize, Serialize};

/// A stored statutory text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    /// Backend-assigned, opaque.
    #[serde(deserialize_with = "crate::id::string_or_number")]
    pub id: String,
    pub text: String,
}

/// Request body for creating or updating a law: `{"text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawText {
    pub text: String,
}

impl LawText {
    /// Build a request body from user input.
    ///
    /// Returns `None` when the input is empty or whitespace-only; such input
    /// never reaches the backend.
    pub fn new(input: &str) -> Option<Self> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
        })
    }
}
