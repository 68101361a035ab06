//! Rule collection manager and the rule editing form.

use paylens_core::{
    Check, CoreError, Dictionary, MessageKey, Rule, RuleDraft, RuleIssue, RuleTestRequest,
    Severity,
};
use tracing::{debug, info, warn};

use crate::laws::banner;
use crate::{ClientError, Confirm, Outcome, RuleApi};

/// Staging buffer for a rule being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleForm {
    draft: RuleDraft,
}

impl RuleForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_draft(draft: RuleDraft) -> Self {
        Self { draft }
    }

    pub fn draft(&self) -> &RuleDraft {
        &self.draft
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_law_reference(&mut self, law_reference: impl Into<String>) {
        self.draft.law_reference = law_reference.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_effective_from(&mut self, date: impl Into<String>) {
        self.draft.effective_from = date.into();
    }

    /// `None` or a blank string means the rule is ongoing.
    pub fn set_effective_to(&mut self, date: Option<String>) {
        self.draft.effective_to = date.filter(|d| !d.trim().is_empty());
    }

    // ── Checks ──

    pub fn checks(&self) -> &[Check] {
        &self.draft.checks
    }

    pub fn add_check(&mut self, check: Check) {
        self.draft.checks.push(check);
    }

    pub fn update_check(&mut self, index: usize, check: Check) -> Result<(), CoreError> {
        let len = self.draft.checks.len();
        let slot = self
            .draft
            .checks
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange {
                what: "checks",
                index,
                len,
            })?;
        *slot = check;
        Ok(())
    }

    pub fn remove_check(&mut self, index: usize) -> Result<Check, CoreError> {
        if index >= self.draft.checks.len() {
            return Err(CoreError::IndexOutOfRange {
                what: "checks",
                index,
                len: self.draft.checks.len(),
            });
        }
        Ok(self.draft.checks.remove(index))
    }

    // ── Penalty lines ──

    pub fn penalty(&self) -> &[String] {
        &self.draft.penalty
    }

    pub fn add_penalty_line(&mut self, line: impl Into<String>) {
        self.draft.penalty.push(line.into());
    }

    pub fn update_penalty_line(
        &mut self,
        index: usize,
        line: impl Into<String>,
    ) -> Result<(), CoreError> {
        let len = self.draft.penalty.len();
        let slot = self
            .draft
            .penalty
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange {
                what: "penalty lines",
                index,
                len,
            })?;
        *slot = line.into();
        Ok(())
    }

    pub fn remove_penalty_line(&mut self, index: usize) -> Result<String, CoreError> {
        if index >= self.draft.penalty.len() {
            return Err(CoreError::IndexOutOfRange {
                what: "penalty lines",
                index,
                len: self.draft.penalty.len(),
            });
        }
        Ok(self.draft.penalty.remove(index))
    }
}

/// Sample documents submitted with a rule test.
#[derive(Debug, Clone, Default)]
pub struct RuleSamples {
    pub payslip_data: serde_json::Value,
    pub contract_data: serde_json::Value,
    pub attendance_data: serde_json::Value,
}

pub struct RuleManager<A> {
    api: A,
    dict: Dictionary,
    rules: Vec<Rule>,
    selected: Option<String>,
    form: Option<RuleForm>,
    editing_rule: Option<String>,
    validation_errors: Vec<RuleIssue>,
    warnings: Vec<RuleIssue>,
    test_result: Option<serde_json::Value>,
    error: Option<String>,
}

impl<A: RuleApi> RuleManager<A> {
    pub fn new(api: A, dict: Dictionary) -> Self {
        Self {
            api,
            dict,
            rules: Vec::new(),
            selected: None,
            form: None,
            editing_rule: None,
            validation_errors: Vec::new(),
            warnings: Vec::new(),
            test_result: None,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn empty_message(&self) -> Option<&str> {
        self.rules
            .is_empty()
            .then(|| self.dict.text(MessageKey::RulesEmpty))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Blocking issues found by the last `submit` or `test`.
    pub fn validation_errors(&self) -> &[RuleIssue] {
        &self.validation_errors
    }

    /// Non-blocking issues found by the last `submit` or `test`.
    pub fn warnings(&self) -> &[RuleIssue] {
        &self.warnings
    }

    pub fn test_result(&self) -> Option<&serde_json::Value> {
        self.test_result.as_ref()
    }

    // ── Detail view ──

    /// Show a listed rule read-only. Returns `None` if it is not listed.
    pub fn select(&mut self, rule_id: &str) -> Option<&Rule> {
        let rule = self.rules.iter().find(|r| r.rule_id == rule_id)?;
        self.selected = Some(rule.rule_id.clone());
        Some(rule)
    }

    pub fn selected(&self) -> Option<&Rule> {
        let id = self.selected.as_deref()?;
        self.rules.iter().find(|r| r.rule_id == id)
    }

    // ── Form ──

    pub fn form(&self) -> Option<&RuleForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut RuleForm> {
        self.form.as_mut()
    }

    /// Id of the rule the open form will update; `None` when creating.
    pub fn editing_rule(&self) -> Option<&str> {
        self.editing_rule.as_deref()
    }

    /// Open an empty form for a new rule.
    pub fn start_create(&mut self) -> &mut RuleForm {
        self.editing_rule = None;
        self.clear_form_feedback();
        self.form.insert(RuleForm::new())
    }

    /// Open the form pre-populated from a listed rule.
    pub fn start_edit(&mut self, rule_id: &str) -> Option<&mut RuleForm> {
        let draft = self.rules.iter().find(|r| r.rule_id == rule_id)?.draft();
        self.editing_rule = Some(rule_id.to_string());
        self.clear_form_feedback();
        Some(self.form.insert(RuleForm::from_draft(draft)))
    }

    pub fn cancel_edit(&mut self) {
        self.form = None;
        self.editing_rule = None;
        self.clear_form_feedback();
    }

    fn clear_form_feedback(&mut self) {
        self.validation_errors.clear();
        self.warnings.clear();
        self.test_result = None;
    }

    /// Validate the open form, recording issues. Returns the draft when it
    /// has no blocking errors.
    fn validated_draft(&mut self) -> Option<RuleDraft> {
        let draft = self.form.as_ref()?.draft().clone();
        let (errors, warnings): (Vec<_>, Vec<_>) = draft
            .issues()
            .into_iter()
            .partition(|i| i.severity() == Severity::Error);
        for warning in &warnings {
            warn!(issue = %warning, "rule draft warning");
        }
        self.warnings = warnings;
        self.validation_errors = errors;
        if self.validation_errors.is_empty() {
            Some(draft)
        } else {
            debug!(count = self.validation_errors.len(), "rule draft rejected");
            None
        }
    }

    // ── Remote actions ──

    pub async fn load(&mut self) -> Outcome {
        match self.api.list_rules().await {
            Ok(rules) => {
                info!(count = rules.len(), "loaded rules");
                self.rules.clear();
                for rule in rules {
                    self.upsert(rule);
                }
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::RulesFetchError, err),
        }
    }

    /// Create or update depending on [`editing_rule`](Self::editing_rule).
    pub async fn submit(&mut self) -> Outcome {
        let Some(draft) = self.validated_draft() else {
            return Outcome::Skipped;
        };

        let result = match self.editing_rule.as_deref() {
            Some(rule_id) => self.api.update_rule(rule_id, &draft).await,
            None => self.api.create_rule(&draft).await,
        };

        match result {
            Ok(rule) => {
                info!(rule_id = %rule.rule_id, updated = self.editing_rule.is_some(), "rule saved");
                if let Some(old_id) = self.editing_rule.take()
                    && old_id != rule.rule_id
                {
                    self.rules.retain(|r| r.rule_id != old_id);
                }
                self.selected = Some(rule.rule_id.clone());
                self.upsert(rule);
                self.form = None;
                self.test_result = None;
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::RuleSaveError, err),
        }
    }

    pub async fn delete(&mut self, rule_id: &str, confirm: &impl Confirm) -> Outcome {
        if !confirm.confirm(self.dict.text(MessageKey::RuleDeleteConfirm)) {
            debug!(rule_id, "delete declined");
            return Outcome::Skipped;
        }

        match self.api.delete_rule(rule_id).await {
            Ok(()) => {
                info!(rule_id, "rule deleted");
                self.rules.retain(|r| r.rule_id != rule_id);
                if self.selected.as_deref() == Some(rule_id) {
                    self.selected = None;
                }
                if self.editing_rule.as_deref() == Some(rule_id) {
                    self.cancel_edit();
                }
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::RuleDeleteError, err),
        }
    }

    /// Evaluate the open form against sample data. Nothing is saved.
    pub async fn test(&mut self, samples: RuleSamples) -> Outcome {
        let Some(rule) = self.validated_draft() else {
            return Outcome::Skipped;
        };
        let request = RuleTestRequest {
            rule,
            payslip_data: samples.payslip_data,
            contract_data: samples.contract_data,
            attendance_data: samples.attendance_data,
        };

        match self.api.test_rule(&request).await {
            Ok(result) => {
                info!("rule test completed");
                self.test_result = Some(result);
                self.error = None;
                Outcome::Applied
            }
            Err(err) => {
                self.test_result = None;
                self.fail(MessageKey::RuleTestError, err)
            }
        }
    }

    fn upsert(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            Some(slot) => *slot = rule,
            None => self.rules.push(rule),
        }
    }

    fn fail(&mut self, fallback: MessageKey, err: ClientError) -> Outcome {
        let message = banner(&self.dict, fallback, &err);
        warn!(error = %err, message = %message, "rule action failed");
        self.error = Some(message);
        Outcome::Failed
    }
}
