use async_trait::async_trait;
use paylens_core::{Law, Rule, RuleDraft, RuleTestRequest};

use crate::ClientError;

/// Remote law collection.
#[async_trait]
pub trait LawApi: Send + Sync {
    async fn list_laws(&self) -> Result<Vec<Law>, ClientError>;
    async fn create_law(&self, text: &str) -> Result<Law, ClientError>;
    async fn update_law(&self, id: &str, text: &str) -> Result<Law, ClientError>;
    async fn delete_law(&self, id: &str) -> Result<(), ClientError>;
}

/// Remote rule collection and the rule evaluation endpoint.
#[async_trait]
pub trait RuleApi: Send + Sync {
    async fn list_rules(&self) -> Result<Vec<Rule>, ClientError>;
    async fn create_rule(&self, draft: &RuleDraft) -> Result<Rule, ClientError>;
    async fn update_rule(&self, rule_id: &str, draft: &RuleDraft) -> Result<Rule, ClientError>;
    async fn delete_rule(&self, rule_id: &str) -> Result<(), ClientError>;
    /// Evaluate a rule definition against sample data. Nothing is persisted.
    async fn test_rule(&self, request: &RuleTestRequest)
    -> Result<serde_json::Value, ClientError>;
}

/// Interactive confirmation before destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Pre-answered confirmation, e.g. from a `--yes` flag.
impl Confirm for bool {
    fn confirm(&self, _prompt: &str) -> bool {
        *self
    }
}

/// Result of a manager action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend confirmed the action and local state was reconciled.
    Applied,
    /// Rejected locally (empty input, nothing staged, confirmation declined,
    /// invalid draft). No request was issued.
    Skipped,
    /// The request failed; the error banner is set and state is unchanged.
    Failed,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}
