//! Transient UI state containers.
//!
//! Three independent stores, each owned by whoever renders the feature:
//! the latest analysis text, the OCR correction editor, and the manual data
//! entry form. Nothing is persisted and no store reads another.

use serde::{Deserialize, Serialize};

use crate::ManualEntry;

// ── Analysis ──

/// Latest legal-analysis text shown to the user.
///
/// Empty means "nothing to analyse yet", which is a normal state.
#[derive(Debug, Clone, Default)]
pub struct AnalysisStore {
    text: String,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn get(&self) -> &str {
        &self.text
    }

    /// The text, or `None` when nothing has been analysed.
    pub fn current(&self) -> Option<&str> {
        if self.text.trim().is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_none()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

// ── OCR editor ──

/// Editable OCR output for the three source documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrBuffers {
    pub payslip: String,
    pub contract: String,
    pub attendance: String,
}

type SaveCallback = Box<dyn FnMut(OcrBuffers) + Send>;

/// State of the OCR correction editor.
#[derive(Default)]
pub struct OcrEditorStore {
    visible: bool,
    buffers: OcrBuffers,
    on_save: Option<SaveCallback>,
}

impl std::fmt::Debug for OcrEditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEditorStore")
            .field("visible", &self.visible)
            .field("buffers", &self.buffers)
            .field("on_save", &self.on_save.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl OcrEditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the editor with the given OCR text and save handler.
    pub fn open<F>(&mut self, buffers: OcrBuffers, on_save: F)
    where
        F: FnMut(OcrBuffers) + Send + 'static,
    {
        self.buffers = buffers;
        self.on_save = Some(Box::new(on_save));
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn buffers(&self) -> &OcrBuffers {
        &self.buffers
    }

    pub fn set_payslip(&mut self, text: impl Into<String>) {
        self.buffers.payslip = text.into();
    }

    pub fn set_contract(&mut self, text: impl Into<String>) {
        self.buffers.contract = text.into();
    }

    pub fn set_attendance(&mut self, text: impl Into<String>) {
        self.buffers.attendance = text.into();
    }

    /// Hand the edited buffers to the save handler and hide the editor.
    ///
    /// Returns `false` if no handler was registered.
    pub fn confirm(&mut self) -> bool {
        self.visible = false;
        match self.on_save.as_mut() {
            Some(on_save) => {
                on_save(self.buffers.clone());
                true
            }
            None => false,
        }
    }

    /// Empty every buffer, drop the handler and hide the editor.
    pub fn reset(&mut self) {
        self.visible = false;
        self.buffers = OcrBuffers::default();
        self.on_save = None;
    }
}

// ── Manual entry ──

/// State of the manual data entry modal.
#[derive(Debug, Clone, Default)]
pub struct ManualEntryStore {
    visible: bool,
    payload: Option<ManualEntry>,
}

impl ManualEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_payload(&mut self, payload: ManualEntry) {
        self.payload = Some(payload);
    }

    pub fn payload(&self) -> Option<&ManualEntry> {
        self.payload.as_ref()
    }

    /// Take the payload out, leaving the store empty but visible state intact.
    pub fn take_payload(&mut self) -> Option<ManualEntry> {
        self.payload.take()
    }

    pub fn reset(&mut self) {
        self.visible = false;
        self.payload = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn analysis_store_empty_state() {
        let mut store = AnalysisStore::new();
        assert!(store.is_empty());
        assert_eq!(store.current(), None);

        store.set("Overtime underpaid by 412.50");
        assert_eq!(store.current(), Some("Overtime underpaid by 412.50"));

        store.set("   ");
        assert!(store.is_empty());
        assert_eq!(store.get(), "   ");

        store.clear();
        assert_eq!(store.get(), "");
    }

    #[test]
    fn ocr_confirm_passes_edited_buffers() {
        let saved: Arc<Mutex<Option<OcrBuffers>>> = Arc::default();
        let sink = Arc::clone(&saved);

        let mut store = OcrEditorStore::new();
        store.open(
            OcrBuffers {
                payslip: "Gross 5OOO".into(),
                contract: "Hourly 38.5".into(),
                attendance: String::new(),
            },
            move |buffers| *sink.lock().unwrap() = Some(buffers),
        );
        assert!(store.is_visible());

        store.set_payslip("Gross 5000");
        store.set_attendance("2025-01-02 09:00-18:30");
        assert!(store.confirm());
        assert!(!store.is_visible());

        let saved = saved.lock().unwrap().clone().unwrap();
        assert_eq!(saved.payslip, "Gross 5000");
        assert_eq!(saved.contract, "Hourly 38.5");
        assert_eq!(saved.attendance, "2025-01-02 09:00-18:30");
    }

    #[test]
    fn ocr_confirm_without_handler() {
        let mut store = OcrEditorStore::new();
        store.set_contract("text");
        assert!(!store.confirm());
    }

    #[test]
    fn ocr_reset_clears_everything() {
        let mut store = OcrEditorStore::new();
        store.open(
            OcrBuffers {
                payslip: "a".into(),
                contract: "b".into(),
                attendance: "c".into(),
            },
            |_| {},
        );
        store.reset();
        assert!(!store.is_visible());
        assert_eq!(store.buffers(), &OcrBuffers::default());
        assert!(!store.confirm());
    }

    #[test]
    fn manual_entry_reset() {
        let mut store = ManualEntryStore::new();
        store.open();
        store.set_payload(ManualEntry {
            employee_id: "E-1".into(),
            ..Default::default()
        });
        assert!(store.is_visible());
        assert_eq!(store.payload().map(|p| p.employee_id.as_str()), Some("E-1"));

        store.reset();
        assert!(!store.is_visible());
        assert!(store.payload().is_none());
    }

    #[test]
    fn manual_entry_take_payload() {
        let mut store = ManualEntryStore::new();
        store.set_payload(ManualEntry::default());
        assert!(store.take_payload().is_some());
        assert!(store.payload().is_none());
    }
}
