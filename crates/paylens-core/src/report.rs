//! Report history and the AI helper endpoints' request/response bodies.

use serde::{Deserialize, Serialize};

/// A stored analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "crate::id::string_or_number")]
    pub id: String,
    pub analysis_type: String,
    /// Free-form analysis payload as produced by the backend.
    #[serde(default)]
    pub analysis_result: serde_json::Value,
    /// ISO 8601 timestamp string.
    pub created_at: String,
}

impl HistoryEntry {
    /// The analysis as display text.
    ///
    /// String payloads are returned as-is, structured payloads pretty-printed.
    pub fn analysis_text(&self) -> String {
        match &self.analysis_result {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariseRequest {
    pub ai_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    pub report: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub law_description: String,
}

/// Suggested dynamic parameters and formulas for a law description.
///
/// The shape is owned by the backend's model prompt, so it stays untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: serde_json::Value,
}

/// Sections that dynamic rule parameters may refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionList {
    pub sections: Vec<String>,
}

impl SectionList {
    pub const DYNAMIC_PARAMS: &'static [&'static str] =
        &["payslip", "attendance", "contract", "employee"];

    pub fn dynamic_params() -> Self {
        Self {
            sections: Self::DYNAMIC_PARAMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
