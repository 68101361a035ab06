use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("dictionary file not found: {0}")]
    DictionaryNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dictionary root must be a JSON object")]
    DictionaryShape,

    #[error("index {index} out of range for {len} {what}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}
