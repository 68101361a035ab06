//! Structured compliance rules evaluated by the backend.
//!
//! A [`Rule`] pairs a law reference with an ordered list of [`Check`]s and an
//! ordered list of penalty expression lines. The client never evaluates these
//! expressions; it only stages, validates and ships them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One evaluable compliance condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub condition: String,
    #[serde(default)]
    pub amount_owed: String,
    pub violation_message: String,
}

impl Check {
    pub fn new(
        condition: impl Into<String>,
        amount_owed: impl Into<String>,
        violation_message: impl Into<String>,
    ) -> Self {
        Self {
            condition: condition.into(),
            amount_owed: amount_owed.into(),
            violation_message: violation_message.into(),
        }
    }
}

/// A rule as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(deserialize_with = "crate::id::string_or_number")]
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub law_reference: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effective_from: String,
    #[serde(default)]
    pub effective_to: Option<String>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub penalty: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
}

impl Rule {
    /// The editable part of this rule, used to pre-populate the edit form.
    pub fn draft(&self) -> RuleDraft {
        RuleDraft {
            name: self.name.clone(),
            law_reference: self.law_reference.clone(),
            description: self.description.clone(),
            effective_from: self.effective_from.clone(),
            effective_to: self.effective_to.clone(),
            checks: self.checks.clone(),
            penalty: self.penalty.clone(),
        }
    }
}

/// Rule definition without backend-assigned fields.
///
/// Body of create, update and test requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub law_reference: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effective_from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<String>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub penalty: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks submission.
    Error,
    /// Shown to the user, submission proceeds.
    Warning,
}

/// A problem found in a [`RuleDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleIssue {
    MissingName,
    EmptyCondition { index: usize },
    EmptyViolationMessage { index: usize },
    UnparsableDate { field: &'static str, value: String },
    EffectiveRangeInverted { from: String, to: String },
}

impl RuleIssue {
    pub fn severity(&self) -> Severity {
        match self {
            RuleIssue::MissingName
            | RuleIssue::EmptyCondition { .. }
            | RuleIssue::EmptyViolationMessage { .. } => Severity::Error,
            RuleIssue::UnparsableDate { .. } | RuleIssue::EffectiveRangeInverted { .. } => {
                Severity::Warning
            }
        }
    }
}

impl std::fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleIssue::MissingName => write!(f, "rule name is required"),
            RuleIssue::EmptyCondition { index } => {
                write!(f, "check #{} has an empty condition", index + 1)
            }
            RuleIssue::EmptyViolationMessage { index } => {
                write!(f, "check #{} has an empty violation message", index + 1)
            }
            RuleIssue::UnparsableDate { field, value } => {
                write!(f, "{field} '{value}' is not a YYYY-MM-DD date")
            }
            RuleIssue::EffectiveRangeInverted { from, to } => {
                write!(f, "effective_to {to} precedes effective_from {from}")
            }
        }
    }
}

impl RuleDraft {
    /// Every issue in this draft, in field order.
    ///
    /// Date problems are warnings only: the backend owns date semantics and may
    /// accept formats we do not parse.
    pub fn issues(&self) -> Vec<RuleIssue> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(RuleIssue::MissingName);
        }

        for (index, check) in self.checks.iter().enumerate() {
            if check.condition.trim().is_empty() {
                issues.push(RuleIssue::EmptyCondition { index });
            }
            if check.violation_message.trim().is_empty() {
                issues.push(RuleIssue::EmptyViolationMessage { index });
            }
        }

        let from = parse_date("effective_from", &self.effective_from, &mut issues);
        let to = self
            .effective_to
            .as_deref()
            .and_then(|to| parse_date("effective_to", to, &mut issues));

        if let (Some(from_date), Some(to_date)) = (from, to)
            && to_date < from_date
        {
            issues.push(RuleIssue::EffectiveRangeInverted {
                from: self.effective_from.clone(),
                to: self.effective_to.clone().unwrap_or_default(),
            });
        }

        issues
    }

    /// Issues that block submission.
    pub fn errors(&self) -> Vec<RuleIssue> {
        self.issues()
            .into_iter()
            .filter(|i| i.severity() == Severity::Error)
            .collect()
    }

    /// Issues that are surfaced but do not block submission.
    pub fn warnings(&self) -> Vec<RuleIssue> {
        self.issues()
            .into_iter()
            .filter(|i| i.severity() == Severity::Warning)
            .collect()
    }
}

/// Blank values are treated as "not provided" rather than malformed.
fn parse_date(field: &'static str, value: &str, issues: &mut Vec<RuleIssue>) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            issues.push(RuleIssue::UnparsableDate {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}

/// Body of `POST /api/test-rule`: the in-progress rule plus sample documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTestRequest {
    #[serde(flatten)]
    pub rule: RuleDraft,
    #[serde(default)]
    pub payslip_data: serde_json::Value,
    #[serde(default)]
    pub contract_data: serde_json::Value,
    #[serde(default)]
    pub attendance_data: serde_json::Value,
}
