//! Same-origin proxy: forwards `/api/*` requests to the analysis backend and
//! relays the responses back unchanged.
//!
//! Every route is a pure translation step. No retries, no timeout overrides,
//! no business logic; a failed backend call is reported once and the caller
//! decides what to do next.

pub mod config;
mod error;
pub mod relay;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, post, put};
use paylens_core::SectionList;
use reqwest::Url;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use relay::{ErrorKey, Relay};

use relay::forward;

const LAWS: Relay = Relay::Json(ErrorKey::Detail);
const RULES: Relay = Relay::Json(ErrorKey::Detail);
const REPORTS: Relay = Relay::Json(ErrorKey::Error);

/// Shared, immutable proxy state. Cloned per request.
#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    backend_url: Arc<Url>,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            backend_url: Arc::new(config.backend_url.clone()),
        })
    }

    pub fn backend_url(&self) -> &Url {
        &self.backend_url
    }

    /// Backend URL for the given path segments; `None` if the base URL
    /// cannot carry a path.
    fn upstream_url(&self, segments: &[&str]) -> Option<Url> {
        let mut url = (*self.backend_url).clone();
        url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
        Some(url)
    }
}

pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/laws", get(list_laws).post(create_law))
        .route("/api/laws/:id", put(update_law).delete(delete_law))
        .route("/api/rules", get(list_rules).post(create_rule))
        .route("/api/rules/:id", put(update_rule).delete(delete_rule))
        .route("/api/test-rule", post(test_rule))
        .route("/api/export_excel", post(export_excel))
        .route("/api/history", get(history))
        .route("/api/summarise_analysis", post(summarise_analysis))
        .route("/api/question", post(question))
        .route("/api/suggest-params-formulas", post(suggest_params_formulas))
        .route("/api/dynamic-params-sections", get(dynamic_params_sections))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.listen` and serve until the process is stopped.
pub async fn serve(config: ProxyConfig) -> Result<(), ProxyError> {
    let state = ProxyState::new(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(
        addr = %listener.local_addr()?,
        backend = %config.backend_url,
        "paylens proxy listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "paylens-proxy",
    })
}

// ── Laws ──

async fn list_laws(State(state): State<ProxyState>, headers: HeaderMap) -> Response {
    forward(&state, Method::GET, &["laws"], &headers, Bytes::new(), LAWS).await
}

async fn create_law(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> Response {
    forward(&state, Method::POST, &["laws"], &headers, body, LAWS).await
}

async fn update_law(
    Path(id): Path<String>,
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, Method::PUT, &["laws", &id], &headers, body, LAWS).await
}

async fn delete_law(
    Path(id): Path<String>,
    State(state): State<ProxyState>,
    headers: HeaderMap,
) -> Response {
    forward(&state, Method::DELETE, &["laws", &id], &headers, Bytes::new(), LAWS).await
}

// ── Rules ──

async fn list_rules(State(state): State<ProxyState>, headers: HeaderMap) -> Response {
    forward(&state, Method::GET, &["rules"], &headers, Bytes::new(), RULES).await
}

async fn create_rule(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, Method::POST, &["rules"], &headers, body, RULES).await
}

async fn update_rule(
    Path(id): Path<String>,
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(&state, Method::PUT, &["rules", &id], &headers, body, RULES).await
}

async fn delete_rule(
    Path(id): Path<String>,
    State(state): State<ProxyState>,
    headers: HeaderMap,
) -> Response {
    forward(&state, Method::DELETE, &["rules", &id], &headers, Bytes::new(), RULES).await
}

async fn test_rule(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> Response {
    forward(&state, Method::POST, &["test-rule"], &headers, body, RULES).await
}

async fn suggest_params_formulas(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::POST,
        &["suggest-params-formulas"],
        &headers,
        body,
        RULES,
    )
    .await
}

async fn dynamic_params_sections() -> Json<SectionList> {
    Json(SectionList::dynamic_params())
}

// ── Reports ──

async fn export_excel(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::POST,
        &["export_excel"],
        &headers,
        body,
        Relay::Spreadsheet,
    )
    .await
}

async fn history(State(state): State<ProxyState>, headers: HeaderMap) -> Response {
    forward(&state, Method::GET, &["history"], &headers, Bytes::new(), REPORTS).await
}

async fn summarise_analysis(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    forward(
        &state,
        Method::POST,
        &["summarise_analysis"],
        &headers,
        body,
        REPORTS,
    )
    .await
}

async fn question(State(state): State<ProxyState>, headers: HeaderMap, body: Bytes) -> Response {
    forward(&state, Method::POST, &["question"], &headers, body, REPORTS).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_for(backend: &str) -> Router {
        let config = ProxyConfig::resolve(
            Some(backend.to_string()),
            None,
            config::DEFAULT_LISTEN.parse().unwrap(),
        )
        .unwrap();
        build_router(ProxyState::new(&config).unwrap())
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_laws_passes_body_through() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/laws"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "1", "text": "Minimum wage law"}])),
            )
            .mount(&backend)
            .await;

        let response = app_for(&backend.uri())
            .oneshot(request("GET", "/api/laws", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{"id": "1", "text": "Minimum wage law"}])
        );
    }

    #[tokio::test]
    async fn create_law_forwards_body_and_cookie() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/laws"))
            .and(header("cookie", "session=abc"))
            .and(body_json(json!({"text": "New law text"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "2", "text": "New law text"})),
            )
            .expect(1)
            .mount(&backend)
            .await;

        let mut req = request("POST", "/api/laws", Some(json!({"text": "New law text"})));
        req.headers_mut()
            .insert("cookie", "session=abc".parse().unwrap());
        let response = app_for(&backend.uri()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            json_body(response).await,
            json!({"id": "2", "text": "New law text"})
        );
    }

    #[tokio::test]
    async fn split_cookie_headers_reach_backend_as_one() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .and(header("cookie", "a=1; b=2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "no session"})))
            .mount(&backend)
            .await;

        let mut req = request("GET", "/api/history", None);
        req.headers_mut().append("cookie", "a=1".parse().unwrap());
        req.headers_mut().append("cookie", "b=2".parse().unwrap());
        let response = app_for(&backend.uri()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn json_route_forwards_set_cookie() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/laws"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "session=rotated; Path=/; HttpOnly")
                    .append_header("set-cookie", "csrf=xyz; Path=/")
                    .set_body_json(json!([])),
            )
            .mount(&backend)
            .await;

        let response = app_for(&backend.uri())
            .oneshot(request("GET", "/api/laws", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(
            cookies,
            vec!["session=rotated; Path=/; HttpOnly", "csrf=xyz; Path=/"]
        );
    }

    #[tokio::test]
    async fn update_and_delete_address_the_id() {
        let backend = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/laws/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "7", "text": "x"})))
            .expect(1)
            .mount(&backend)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rules/r-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
            .expect(1)
            .mount(&backend)
            .await;

        let app = app_for(&backend.uri());
        let response = app
            .clone()
            .oneshot(request("PUT", "/api/laws/7", Some(json!({"text": "x"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request("DELETE", "/api/rules/r-3", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"message": "deleted"}));
    }

    #[tokio::test]
    async fn error_statuses_are_preserved() {
        let backend = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/laws/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Law not found"})))
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/rules"))
            .respond_with(ResponseTemplate::new(422).set_body_string("name is required"))
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&backend)
            .await;

        let app = app_for(&backend.uri());

        let response = app
            .clone()
            .oneshot(request("PUT", "/api/laws/404", Some(json!({"text": "x"}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"detail": "Law not found"}));

        let response = app
            .clone()
            .oneshot(request("POST", "/api/rules", Some(json!({"name": ""}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await, json!({"detail": "name is required"}));

        let response = app
            .oneshot(request("GET", "/api/history", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Internal Server Error"})
        );
    }

    #[tokio::test]
    async fn export_json_error_passes_through() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/export_excel"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"message": "no reports selected", "code": "E_EMPTY"})),
            )
            .mount(&backend)
            .await;

        let response = app_for(&backend.uri())
            .oneshot(request("POST", "/api/export_excel", Some(json!({"report_ids": []}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"message": "no reports selected", "code": "E_EMPTY"})
        );
    }

    #[tokio::test]
    async fn export_streams_spreadsheet_with_cookies() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/export_excel"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session=rotated; Path=/; HttpOnly")
                    .set_body_raw(b"PK\x03\x04sheet".to_vec(), "application/octet-stream"),
            )
            .mount(&backend)
            .await;

        let response = app_for(&backend.uri())
            .oneshot(request("POST", "/api/export_excel", Some(json!({"report_ids": ["3"]}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], relay::XLSX_CONTENT_TYPE);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=employee_data.xlsx"
        );
        assert_eq!(
            response.headers()[SET_COOKIE],
            "session=rotated; Path=/; HttpOnly"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"PK\x03\x04sheet");
    }

    #[tokio::test]
    async fn unreachable_backend_is_generic_500() {
        let response = app_for("http://127.0.0.1:9")
            .oneshot(request("GET", "/api/laws", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"detail": relay::BACKEND_UNREACHABLE})
        );
    }

    #[tokio::test]
    async fn invalid_json_body_is_rejected_locally() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&backend)
            .await;

        let req = Request::builder()
            .method("POST")
            .uri("/api/question")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app_for(&backend.uri()).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": relay::INVALID_BODY}));
    }

    #[tokio::test]
    async fn backend_base_path_is_kept() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/summarise_analysis"))
            .and(body_json(json!({"ai_content": "Overtime underpaid"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Underpaid"})))
            .mount(&backend)
            .await;

        let response = app_for(&format!("{}/v1/", backend.uri()))
            .oneshot(request(
                "POST",
                "/api/summarise_analysis",
                Some(json!({"ai_content": "Overtime underpaid"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"summary": "Underpaid"}));
    }

    #[tokio::test]
    async fn dynamic_sections_are_served_locally() {
        let response = app_for("http://127.0.0.1:9")
            .oneshot(request("GET", "/api/dynamic-params-sections", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"sections": ["payslip", "attendance", "contract", "employee"]})
        );
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = app_for("http://127.0.0.1:9")
            .oneshot(request("GET", "/healthz", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }
}
