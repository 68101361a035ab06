//! Proxy configuration.
//!
//! Two backend URL variables exist: a server-side one that never leaves the
//! proxy, and the public build-time one the browser bundle also sees. The
//! server-side value wins when both are set.

use std::net::SocketAddr;

use reqwest::Url;

use crate::ProxyError;

pub const BACKEND_URL_ENV: &str = "PAYLENS_BACKEND_URL";
pub const PUBLIC_BACKEND_URL_ENV: &str = "PAYLENS_PUBLIC_BACKEND_URL";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Backend base URL, validated, without a trailing slash.
    pub backend_url: Url,
    pub listen: SocketAddr,
}

impl ProxyConfig {
    /// Pick and validate the backend URL.
    pub fn resolve(
        server_url: Option<String>,
        public_url: Option<String>,
        listen: SocketAddr,
    ) -> Result<Self, ProxyError> {
        let raw = server_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| public_url.filter(|u| !u.trim().is_empty()))
            .ok_or(ProxyError::MissingBackendUrl)?;
        Ok(Self {
            backend_url: parse_backend_url(&raw)?,
            listen,
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, ProxyError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: &str| ProxyError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path"));
    }
    Ok(url)
}
