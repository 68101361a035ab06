//! Locale string tables.
//!
//! A dictionary file is a JSON object, optionally nested; nested objects are
//! flattened into dotted keys (`{"laws": {"fetch_error": ".."}}` becomes
//! `laws.fetch_error`). Any key missing from the file falls back to the
//! built-in English text for that [`MessageKey`].

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::CoreError;

/// Strings the managers and the CLI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    LawsFetchError,
    LawAddError,
    LawUpdateError,
    LawDeleteError,
    LawDeleteConfirm,
    LawsEmpty,
    RulesFetchError,
    RuleSaveError,
    RuleDeleteError,
    RuleDeleteConfirm,
    RuleTestError,
    RulesEmpty,
    HistoryFetchError,
    HistoryEmpty,
    NothingToAnalyze,
    SummaryError,
    QuestionError,
    SuggestError,
    ExportError,
    Unexpected,
}

impl MessageKey {
    pub const ALL: &'static [MessageKey] = &[
        MessageKey::LawsFetchError,
        MessageKey::LawAddError,
        MessageKey::LawUpdateError,
        MessageKey::LawDeleteError,
        MessageKey::LawDeleteConfirm,
        MessageKey::LawsEmpty,
        MessageKey::RulesFetchError,
        MessageKey::RuleSaveError,
        MessageKey::RuleDeleteError,
        MessageKey::RuleDeleteConfirm,
        MessageKey::RuleTestError,
        MessageKey::RulesEmpty,
        MessageKey::HistoryFetchError,
        MessageKey::HistoryEmpty,
        MessageKey::NothingToAnalyze,
        MessageKey::SummaryError,
        MessageKey::QuestionError,
        MessageKey::SuggestError,
        MessageKey::ExportError,
        MessageKey::Unexpected,
    ];

    /// Dotted key used in dictionary files.
    pub fn key(self) -> &'static str {
        match self {
            MessageKey::LawsFetchError => "laws.fetch_error",
            MessageKey::LawAddError => "laws.add_error",
            MessageKey::LawUpdateError => "laws.update_error",
            MessageKey::LawDeleteError => "laws.delete_error",
            MessageKey::LawDeleteConfirm => "laws.delete_confirm",
            MessageKey::LawsEmpty => "laws.empty",
            MessageKey::RulesFetchError => "rules.fetch_error",
            MessageKey::RuleSaveError => "rules.save_error",
            MessageKey::RuleDeleteError => "rules.delete_error",
            MessageKey::RuleDeleteConfirm => "rules.delete_confirm",
            MessageKey::RuleTestError => "rules.test_error",
            MessageKey::RulesEmpty => "rules.empty",
            MessageKey::HistoryFetchError => "reports.fetch_error",
            MessageKey::HistoryEmpty => "reports.empty",
            MessageKey::NothingToAnalyze => "analysis.nothing_to_analyze",
            MessageKey::SummaryError => "analysis.summary_error",
            MessageKey::QuestionError => "analysis.question_error",
            MessageKey::SuggestError => "rules.suggest_error",
            MessageKey::ExportError => "reports.export_error",
            MessageKey::Unexpected => "errors.unexpected",
        }
    }

    pub fn english(self) -> &'static str {
        match self {
            MessageKey::LawsFetchError => "Failed to load laws.",
            MessageKey::LawAddError => "Failed to add law.",
            MessageKey::LawUpdateError => "Failed to update law.",
            MessageKey::LawDeleteError => "Failed to delete law.",
            MessageKey::LawDeleteConfirm => "Are you sure you want to delete this law?",
            MessageKey::LawsEmpty => "No laws found.",
            MessageKey::RulesFetchError => "Failed to load rules.",
            MessageKey::RuleSaveError => "Failed to save rule.",
            MessageKey::RuleDeleteError => "Failed to delete rule.",
            MessageKey::RuleDeleteConfirm => "Are you sure you want to delete this rule?",
            MessageKey::RuleTestError => "Failed to test rule.",
            MessageKey::RulesEmpty => "No rules found.",
            MessageKey::HistoryFetchError => "Failed to load report history.",
            MessageKey::HistoryEmpty => "No reports yet.",
            MessageKey::NothingToAnalyze => "Nothing to analyze yet.",
            MessageKey::SummaryError => "Failed to summarise the analysis.",
            MessageKey::QuestionError => "Failed to answer the question.",
            MessageKey::SuggestError => "Failed to suggest parameters.",
            MessageKey::ExportError => "Failed to export the report.",
            MessageKey::Unexpected => "An unexpected error occurred.",
        }
    }
}

/// A flat locale string table with English fallbacks.
#[derive(Debug, Clone)]
pub struct Dictionary {
    locale: String,
    entries: HashMap<String, String>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::english()
    }
}

impl Dictionary {
    /// The built-in English table.
    pub fn english() -> Self {
        let entries = MessageKey::ALL
            .iter()
            .map(|k| (k.key().to_string(), k.english().to_string()))
            .collect();
        Self {
            locale: "en".to_string(),
            entries,
        }
    }

    /// Parse a dictionary from JSON text.
    pub fn from_json(locale: &str, json: &str) -> Result<Self, CoreError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(root) = value else {
            return Err(CoreError::DictionaryShape);
        };

        let mut entries = HashMap::new();
        flatten("", &root, &mut entries);
        debug!(locale, count = entries.len(), "parsed dictionary");

        Ok(Self {
            locale: locale.to_string(),
            entries,
        })
    }

    /// Load a dictionary file. The locale is taken from the file stem
    /// (`he.json` → `he`).
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::DictionaryNotFound(path.to_path_buf()));
        }
        let locale = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("en")
            .to_string();
        let json = std::fs::read_to_string(path)?;
        let dict = Self::from_json(&locale, &json)?;
        info!(locale = %dict.locale, path = %path.display(), "loaded dictionary");
        Ok(dict)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Raw lookup by dotted key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Display text for `key`, falling back to English.
    pub fn text(&self, key: MessageKey) -> &str {
        self.get(key.key()).unwrap_or(key.english())
    }
}

fn flatten(
    prefix: &str,
    object: &serde_json::Map<String, serde_json::Value>,
    out: &mut HashMap<String, String>,
) {
    for (name, value) in object {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match value {
            serde_json::Value::Object(inner) => flatten(&key, inner, out),
            serde_json::Value::String(s) => {
                out.insert(key, s.clone());
            }
            // Numbers and bools keep their JSON text.
            serde_json::Value::Null | serde_json::Value::Array(_) => {}
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}
