//! Single-attempt request forwarding and response relaying.

use axum::Json;
use axum::body::Bytes;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{info, warn};

use crate::ProxyState;

pub const BACKEND_UNREACHABLE: &str = "Failed to reach the backend service";
pub const INVALID_BODY: &str = "Request body must be valid JSON";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_DISPOSITION: &str = "attachment; filename=employee_data.xlsx";

/// Field name of a route's error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKey {
    Detail,
    Error,
}

impl ErrorKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKey::Detail => "detail",
            ErrorKey::Error => "error",
        }
    }
}

/// How a route relays the backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Json(ErrorKey),
    Spreadsheet,
}

impl Relay {
    fn error_key(self) -> ErrorKey {
        match self {
            Relay::Json(key) => key,
            Relay::Spreadsheet => ErrorKey::Error,
        }
    }
}

/// `{"<key>": message}` with the given status.
pub fn envelope(status: StatusCode, key: ErrorKey, message: &str) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(key.as_str().to_string(), Value::String(message.to_string()));
    (status, Json(Value::Object(body))).into_response()
}

/// Forward one inbound request to `upstream` under the backend base URL.
pub async fn forward(
    state: &ProxyState,
    method: Method,
    upstream: &[&str],
    headers: &HeaderMap,
    body: Bytes,
    relay: Relay,
) -> Response {
    let key = relay.error_key();

    let payload: Option<Value> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "rejecting non-JSON request body");
                return envelope(StatusCode::BAD_REQUEST, key, INVALID_BODY);
            }
        }
    };

    let Some(url) = state.upstream_url(upstream) else {
        warn!(?upstream, "backend URL cannot carry a path");
        return envelope(StatusCode::INTERNAL_SERVER_ERROR, key, BACKEND_UNREACHABLE);
    };

    let mut request = state.client.request(method.clone(), url.clone());
    if let Some(cookie) = merged_cookie(headers) {
        request = request.header(COOKIE, cookie);
    }
    if let Some(payload) = &payload {
        request = request.json(payload);
    }

    let upstream_resp = match request.send().await {
        Ok(resp) => resp,
        Err(err) => {
            warn!(%method, url = %url, error = %err, "backend request failed");
            return envelope(StatusCode::INTERNAL_SERVER_ERROR, key, BACKEND_UNREACHABLE);
        }
    };

    let status = upstream_resp.status();
    let cookies: Vec<HeaderValue> = upstream_resp
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .cloned()
        .collect();
    let content_type = upstream_resp.headers().get(CONTENT_TYPE).cloned();

    let bytes = match upstream_resp.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%method, url = %url, error = %err, "reading backend response failed");
            return envelope(StatusCode::INTERNAL_SERVER_ERROR, key, BACKEND_UNREACHABLE);
        }
    };

    info!(%method, url = %url, status = status.as_u16(), size = bytes.len(), "backend responded");

    let mut response = match relay {
        Relay::Json(key) => relay_json(status, content_type, bytes, key),
        Relay::Spreadsheet => relay_spreadsheet(status, content_type, bytes),
    };
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

/// All inbound `Cookie` headers as one `; `-separated value.
fn merged_cookie(headers: &HeaderMap) -> Option<HeaderValue> {
    let mut values = headers.get_all(COOKIE).iter();
    let first = values.next()?;
    let mut merged = first.as_bytes().to_vec();
    for value in values {
        merged.extend_from_slice(b"; ");
        merged.extend_from_slice(value.as_bytes());
    }
    HeaderValue::from_bytes(&merged).ok()
}

fn relay_json(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    bytes: Bytes,
    key: ErrorKey,
) -> Response {
    if !status.is_success() {
        return rewrap(status, key, &bytes);
    }
    let mut response = (status, bytes).into_response();
    let content_type =
        content_type.unwrap_or_else(|| HeaderValue::from_static("application/json"));
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
}

fn relay_spreadsheet(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    bytes: Bytes,
) -> Response {
    let is_json = content_type
        .as_ref()
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        return match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => (status, Json(value)).into_response(),
            Err(_) => rewrap(status, ErrorKey::Error, &bytes),
        };
    }
    if !status.is_success() {
        return rewrap(status, ErrorKey::Error, &bytes);
    }

    (
        status,
        [
            (CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (CONTENT_DISPOSITION, HeaderValue::from_static(EXPORT_DISPOSITION)),
        ],
        bytes,
    )
        .into_response()
}

/// Re-wrap a non-2xx backend body into the route's envelope.
///
/// Bodies that already carry `detail` or `error` pass through unchanged.
fn rewrap(status: StatusCode, key: ErrorKey, bytes: &[u8]) -> Response {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(obj)) if obj.contains_key("detail") || obj.contains_key("error") => {
            (status, Json(Value::Object(obj))).into_response()
        }
        Ok(Value::String(message)) => envelope(status, key, &message),
        Ok(value) if !value.is_null() => envelope(status, key, &value.to_string()),
        _ => {
            let text = String::from_utf8_lossy(bytes);
            let text = text.trim();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("Backend error")
            } else {
                text
            };
            envelope(status, key, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn cookie_headers_are_merged() {
        let mut headers = HeaderMap::new();
        assert_eq!(merged_cookie(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        assert_eq!(merged_cookie(&headers).unwrap(), "a=1");

        headers.append(COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(merged_cookie(&headers).unwrap(), "a=1; b=2");
    }

    #[tokio::test]
    async fn rewrap_keeps_existing_detail() {
        let resp = rewrap(
            StatusCode::NOT_FOUND,
            ErrorKey::Error,
            br#"{"detail":"Law not found","code":17}"#,
        );
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"detail": "Law not found", "code": 17})
        );
    }

    #[tokio::test]
    async fn rewrap_plain_text_uses_route_key() {
        let resp = rewrap(StatusCode::BAD_GATEWAY, ErrorKey::Detail, b"upstream timeout\n");
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"detail": "upstream timeout"})
        );
    }

    #[tokio::test]
    async fn rewrap_empty_body_uses_reason_phrase() {
        let resp = rewrap(StatusCode::UNPROCESSABLE_ENTITY, ErrorKey::Error, b"");
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"error": "Unprocessable Entity"})
        );
    }

    #[tokio::test]
    async fn rewrap_other_json_is_stringified() {
        let resp = rewrap(StatusCode::INTERNAL_SERVER_ERROR, ErrorKey::Detail, br#"{"msg":"x"}"#);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"detail": r#"{"msg":"x"}"#})
        );
    }

    #[tokio::test]
    async fn spreadsheet_success_sets_attachment_headers() {
        let resp = relay_spreadsheet(
            StatusCode::OK,
            Some(HeaderValue::from_static("application/octet-stream")),
            Bytes::from_static(b"PK\x03\x04"),
        );
        assert_eq!(resp.headers()[CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(resp.headers()[CONTENT_DISPOSITION], EXPORT_DISPOSITION);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"PK\x03\x04");
    }
}
