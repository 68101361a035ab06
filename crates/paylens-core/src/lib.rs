//! Core types shared by the PayLens proxy, client and CLI: laws, rules,
//! report history, manual-entry payloads, the display dictionary and the
//! transient UI stores.

mod error;
pub mod dictionary;
pub mod entry;
pub mod id;
pub mod law;
pub mod report;
pub mod rule;
pub mod stores;

pub use dictionary::{Dictionary, MessageKey};
pub use entry::{AttendanceRecord, ContractRecord, ManualEntry, PayslipRecord};
pub use error::CoreError;
pub use law::{Law, LawText};
pub use report::{
    Answer, HistoryEntry, QuestionRequest, SectionList, SuggestRequest, Suggestions,
    SummariseRequest, Summary,
};
pub use rule::{Check, Rule, RuleDraft, RuleIssue, RuleTestRequest, Severity};
pub use stores::{AnalysisStore, ManualEntryStore, OcrBuffers, OcrEditorStore};
