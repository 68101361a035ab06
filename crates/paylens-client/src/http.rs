//! HTTP client for the PayLens proxy's `/api` surface.

use async_trait::async_trait;
use paylens_core::{
    Answer, HistoryEntry, Law, LawText, QuestionRequest, Rule, RuleDraft, RuleTestRequest,
    SectionList, SuggestRequest, Suggestions, SummariseRequest, Summary,
};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{ClientError, LawApi, RuleApi};

const DEFAULT_EXPORT_FILENAME: &str = "employee_data.xlsx";

/// A downloaded spreadsheet export.
#[derive(Debug, Clone)]
pub struct Export {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Typed client for the proxy routes.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
}

impl BackendClient {
    /// Create a client for the given proxy base URL.
    ///
    /// `base_url` should be like `http://localhost:3000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: None,
        }
    }

    /// Send `cookie` as the `Cookie` header on every request.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.url(segments)?;
        info!(%method, url = %url, "calling proxy");
        let mut builder = self.client.request(method, url);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        Ok(builder)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let resp = self.request(Method::GET, segments)?.send().await?;
        decode(resp).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(method, segments)?.json(body).send().await?;
        decode(resp).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ClientError> {
        let resp = self.request(Method::DELETE, segments)?.send().await?;
        check(resp).await.map(|_| ())
    }

    // ── Reports ──

    /// Stored analysis reports, newest first as returned by the backend.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let entries: Vec<HistoryEntry> = self.get_json(&["api", "history"]).await?;
        info!(count = entries.len(), "fetched report history");
        Ok(entries)
    }

    pub async fn summarise(&self, ai_content: &str) -> Result<Summary, ClientError> {
        let body = SummariseRequest {
            ai_content: ai_content.to_string(),
        };
        self.send_json(Method::POST, &["api", "summarise_analysis"], &body)
            .await
    }

    pub async fn ask(&self, question: &str, report: &str) -> Result<Answer, ClientError> {
        let body = QuestionRequest {
            question: question.to_string(),
            report: report.to_string(),
        };
        self.send_json(Method::POST, &["api", "question"], &body)
            .await
    }

    /// Download a spreadsheet for the given report selection.
    pub async fn export_excel(
        &self,
        selection: &serde_json::Value,
    ) -> Result<Export, ClientError> {
        let resp = self
            .request(Method::POST, &["api", "export_excel"])?
            .json(selection)
            .send()
            .await?;
        let resp = check(resp).await?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());
        let bytes = resp.bytes().await?.to_vec();

        info!(filename = %filename, size = bytes.len(), "downloaded export");
        Ok(Export {
            filename,
            content_type,
            bytes,
        })
    }

    // ── Rule authoring helpers ──

    pub async fn suggest_params(&self, law_description: &str) -> Result<Suggestions, ClientError> {
        let body = SuggestRequest {
            law_description: law_description.to_string(),
        };
        self.send_json(Method::POST, &["api", "suggest-params-formulas"], &body)
            .await
    }

    pub async fn dynamic_sections(&self) -> Result<SectionList, ClientError> {
        self.get_json(&["api", "dynamic-params-sections"]).await
    }
}

#[async_trait]
impl LawApi for BackendClient {
    async fn list_laws(&self) -> Result<Vec<Law>, ClientError> {
        let laws: Vec<Law> = self.get_json(&["api", "laws"]).await?;
        info!(count = laws.len(), "fetched laws");
        Ok(laws)
    }

    async fn create_law(&self, text: &str) -> Result<Law, ClientError> {
        let body = LawText {
            text: text.to_string(),
        };
        self.send_json(Method::POST, &["api", "laws"], &body).await
    }

    async fn update_law(&self, id: &str, text: &str) -> Result<Law, ClientError> {
        let body = LawText {
            text: text.to_string(),
        };
        self.send_json(Method::PUT, &["api", "laws", id], &body)
            .await
    }

    async fn delete_law(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&["api", "laws", id]).await
    }
}

#[async_trait]
impl RuleApi for BackendClient {
    async fn list_rules(&self) -> Result<Vec<Rule>, ClientError> {
        let rules: Vec<Rule> = self.get_json(&["api", "rules"]).await?;
        info!(count = rules.len(), "fetched rules");
        Ok(rules)
    }

    async fn create_rule(&self, draft: &RuleDraft) -> Result<Rule, ClientError> {
        self.send_json(Method::POST, &["api", "rules"], draft).await
    }

    async fn update_rule(&self, rule_id: &str, draft: &RuleDraft) -> Result<Rule, ClientError> {
        self.send_json(Method::PUT, &["api", "rules", rule_id], draft)
            .await
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<(), ClientError> {
        self.delete(&["api", "rules", rule_id]).await
    }

    async fn test_rule(
        &self,
        request: &RuleTestRequest,
    ) -> Result<serde_json::Value, ClientError> {
        self.send_json(Method::POST, &["api", "test-rule"], request)
            .await
    }
}

/// Turn a non-2xx response into [`ClientError::Backend`].
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let err = ClientError::backend(status.as_u16(), body);
    warn!(status = status.as_u16(), error = %err, "proxy returned an error");
    Err(err)
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// `attachment; filename=employee_data.xlsx` → `employee_data.xlsx`.
fn attachment_filename(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
