use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("backend URL not configured; set PAYLENS_BACKEND_URL or PAYLENS_PUBLIC_BACKEND_URL")]
    MissingBackendUrl,

    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
