//! Law collection manager.
//!
//! Holds the locally displayed copy of the law collection and applies each
//! mutation only after the backend confirms it. Every action either
//! reconciles the collection, is rejected locally without a request, or sets
//! the single error banner and leaves state untouched.

use paylens_core::{Dictionary, Law, LawText, MessageKey};
use tracing::{debug, info, warn};

use crate::{ClientError, Confirm, LawApi, Outcome};

/// The single shared edit buffer. Only one law is edited at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub id: String,
    pub text: String,
}

pub struct LawManager<A> {
    api: A,
    dict: Dictionary,
    laws: Vec<Law>,
    input: String,
    edit: Option<EditBuffer>,
    error: Option<String>,
}

impl<A: LawApi> LawManager<A> {
    pub fn new(api: A, dict: Dictionary) -> Self {
        Self {
            api,
            dict,
            laws: Vec::new(),
            input: String::new(),
            edit: None,
            error: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn laws(&self) -> &[Law] {
        &self.laws
    }

    /// Text shown when the collection is empty, `None` otherwise.
    pub fn empty_message(&self) -> Option<&str> {
        self.laws
            .is_empty()
            .then(|| self.dict.text(MessageKey::LawsEmpty))
    }

    /// Most recent error, if the last failing action has not been superseded.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn edit(&self) -> Option<&EditBuffer> {
        self.edit.as_ref()
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.edit.as_ref().is_some_and(|e| e.id == id)
    }

    // ── Remote actions ──

    /// Replace the local collection with the backend's.
    pub async fn load(&mut self) -> Outcome {
        match self.api.list_laws().await {
            Ok(laws) => {
                info!(count = laws.len(), "loaded laws");
                self.laws = dedup_by_id(laws);
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::LawsFetchError, err),
        }
    }

    /// Create a law from the input buffer.
    pub async fn add(&mut self) -> Outcome {
        let Some(body) = LawText::new(&self.input) else {
            debug!("add skipped: empty input");
            return Outcome::Skipped;
        };

        match self.api.create_law(&body.text).await {
            Ok(law) => {
                info!(id = %law.id, "law added");
                self.upsert(law);
                self.input.clear();
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::LawAddError, err),
        }
    }

    /// Delete a law after the user confirms.
    pub async fn delete(&mut self, id: &str, confirm: &impl Confirm) -> Outcome {
        if !confirm.confirm(self.dict.text(MessageKey::LawDeleteConfirm)) {
            debug!(id, "delete declined");
            return Outcome::Skipped;
        }

        match self.api.delete_law(id).await {
            Ok(()) => {
                info!(id, "law deleted");
                self.laws.retain(|l| l.id != id);
                if self.is_editing(id) {
                    self.edit = None;
                }
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::LawDeleteError, err),
        }
    }

    /// Send the edit buffer. The buffer stays open on failure.
    pub async fn save_edit(&mut self) -> Outcome {
        let Some(edit) = self.edit.as_ref() else {
            debug!("save skipped: nothing staged");
            return Outcome::Skipped;
        };
        let Some(body) = LawText::new(&edit.text) else {
            debug!(id = %edit.id, "save skipped: empty text");
            return Outcome::Skipped;
        };
        let id = edit.id.clone();

        match self.api.update_law(&id, &body.text).await {
            Ok(law) => {
                info!(id = %id, returned = %law.id, "law updated");
                if law.id != id {
                    self.laws.retain(|l| l.id != id);
                }
                self.upsert(law);
                self.edit = None;
                self.error = None;
                Outcome::Applied
            }
            Err(err) => self.fail(MessageKey::LawUpdateError, err),
        }
    }

    // ── Local edit state ──

    /// Stage `law` for editing, discarding any other open edit.
    pub fn start_edit(&mut self, law: &Law) {
        if let Some(prev) = &self.edit
            && prev.id != law.id
        {
            debug!(from = %prev.id, to = %law.id, "abandoning open edit");
        }
        self.edit = Some(EditBuffer {
            id: law.id.clone(),
            text: law.text.clone(),
        });
    }

    /// Stage the listed law with `id`. Returns `false` if it is not listed.
    pub fn start_edit_by_id(&mut self, id: &str) -> bool {
        match self.laws.iter().find(|l| l.id == id).cloned() {
            Some(law) => {
                self.start_edit(&law);
                true
            }
            None => false,
        }
    }

    pub fn set_edit_text(&mut self, text: impl Into<String>) {
        if let Some(edit) = self.edit.as_mut() {
            edit.text = text.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    fn upsert(&mut self, law: Law) {
        match self.laws.iter_mut().find(|l| l.id == law.id) {
            Some(slot) => *slot = law,
            None => self.laws.push(law),
        }
    }

    fn fail(&mut self, fallback: MessageKey, err: ClientError) -> Outcome {
        let message = banner(&self.dict, fallback, &err);
        warn!(error = %err, message = %message, "law action failed");
        self.error = Some(message);
        Outcome::Failed
    }
}

/// Message for the error banner: backend detail, else the per-action text.
pub fn banner(dict: &Dictionary, fallback: MessageKey, err: &ClientError) -> String {
    if let Some(detail) = err.detail() {
        return detail.to_string();
    }
    if err.is_unexpected() {
        return dict.text(MessageKey::Unexpected).to_string();
    }
    dict.text(fallback).to_string()
}

fn dedup_by_id(laws: Vec<Law>) -> Vec<Law> {
    let mut out: Vec<Law> = Vec::with_capacity(laws.len());
    for law in laws {
        match out.iter_mut().find(|l| l.id == law.id) {
            Some(slot) => *slot = law,
            None => out.push(law),
        }
    }
    out
}
