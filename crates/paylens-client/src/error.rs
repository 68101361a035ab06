use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("server returned {status}: {}", detail.as_deref().unwrap_or(body.as_str()))]
    Backend {
        status: u16,
        /// `detail` or `error` field of the response body, if any.
        detail: Option<String>,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Build a backend error from a non-2xx response body.
    pub fn backend(status: u16, body: String) -> Self {
        let detail = extract_detail(&body);
        ClientError::Backend {
            status,
            detail,
            body,
        }
    }

    /// Human-readable message supplied by the backend, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Backend { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Failures that did not come from a request/response exchange.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, ClientError::Json(_) | ClientError::InvalidUrl(_))
    }
}

/// Pull `detail` (preferred) or `error` out of a JSON error body.
///
/// Validation errors arrive as `{"detail": [{"msg": ...}, ...]}`; their
/// messages are joined.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let field = value.get("detail").or_else(|| value.get("error"))?;
    match field {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}
