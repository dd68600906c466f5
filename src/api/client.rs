//! Remote submission client for issue reports

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::endpoint_url;
use super::error::{parse_error_body, SubmissionError};
use super::session::AuthSession;
use crate::config::ApiConfig;
use crate::report::packager::SubmissionPayload;

/// Path of the issue collection relative to the API base URL
pub const ISSUES_PATH: &str = "issues/";

/// Server-side classification attached to an accepted report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiAnnotations {
    pub category: Option<String>,
    pub confidence: Option<f64>,
    /// Free-form analysis document (detected label, image quality, ...)
    pub analysis: Option<Value>,
}

impl AiAnnotations {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.confidence.is_none() && self.analysis.is_none()
    }
}

/// Successful submission outcome
#[derive(Debug, Clone, PartialEq)]
pub struct IssueReceipt {
    /// Opaque server-assigned identifier
    pub id: String,
    /// Present only when the server ran its classifier
    pub ai: Option<AiAnnotations>,
}

impl IssueReceipt {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ai: None,
        }
    }

    /// Parse a 2xx body leniently: missing or non-JSON bodies still count as success
    pub fn from_body(body: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return Self::new("unknown");
        };

        let id = match map.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        };

        let non_null = |key: &str| map.get(key).filter(|v| !v.is_null());
        let ai = AiAnnotations {
            category: non_null("ai_category")
                .and_then(Value::as_str)
                .map(str::to_string),
            confidence: non_null("ai_confidence").and_then(Value::as_f64),
            analysis: non_null("ai_analysis").cloned(),
        };

        Self {
            id,
            ai: (!ai.is_empty()).then_some(ai),
        }
    }
}

/// Boundary to whatever networking layer delivers reports.
///
/// Implementations own retry, timeout and backoff policy; the wizard only
/// calls `submit` once per attempt.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn submit(&self, payload: SubmissionPayload) -> Result<IssueReceipt, SubmissionError>;
}

/// Submits reports to the issue API over HTTP
pub struct HttpSubmissionClient {
    client: Client,
    base_url: String,
    session: AuthSession,
}

impl HttpSubmissionClient {
    /// Create a client with a default `reqwest` client
    pub fn new(base_url: impl Into<String>, session: AuthSession) -> Self {
        Self::with_client(Client::new(), base_url, session)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, session: AuthSession) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
        }
    }

    /// Create from config, applying the configured request timeout
    pub fn from_config(config: &ApiConfig, session: AuthSession) -> Result<Self, SubmissionError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config.base_url.clone(), session))
    }

    pub fn issues_url(&self) -> String {
        endpoint_url(&self.base_url, ISSUES_PATH)
    }
}

/// Build the `reqwest` client shared by login and submission
pub fn build_http_client(config: &ApiConfig) -> Result<Client, SubmissionError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| SubmissionError::network(format!("Failed to build HTTP client: {}", e)))
}

fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, payload: SubmissionPayload) -> Result<IssueReceipt, SubmissionError> {
        let url = self.issues_url();
        let form = payload.to_form();

        debug!(url = %url, photos = payload.file_parts.len(), "Submitting issue report");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.session.authorization())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(&response);
            let body = response.text().await.unwrap_or_default();
            let (message, field_errors) = parse_error_body(&body);

            warn!(status = status.as_u16(), "Issue submission rejected");

            return Err(match status.as_u16() {
                401 => SubmissionError::Unauthorized { message },
                403 => SubmissionError::Forbidden { message },
                429 => SubmissionError::RateLimited {
                    retry_after_secs: retry_after,
                },
                code => SubmissionError::rejected(
                    code,
                    message.unwrap_or_else(|| status.to_string()),
                    field_errors,
                ),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::network(e.to_string()))?;
        let receipt = IssueReceipt::from_body(&body);

        info!(id = %receipt.id, "Issue report accepted");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session::AuthScheme;

    #[test]
    fn test_receipt_with_ai_fields() {
        let body = r#"{
            "id": 42,
            "title": "Pothole",
            "ai_category": "road_damage",
            "ai_confidence": 0.87,
            "ai_analysis": {"detected_label": "pothole"}
        }"#;
        let receipt = IssueReceipt::from_body(body);
        assert_eq!(receipt.id, "42");
        let ai = receipt.ai.unwrap();
        assert_eq!(ai.category.as_deref(), Some("road_damage"));
        assert_eq!(ai.confidence, Some(0.87));
        assert_eq!(
            ai.analysis,
            Some(serde_json::json!({"detected_label": "pothole"}))
        );
    }

    #[test]
    fn test_receipt_without_ai_fields() {
        let receipt =
            IssueReceipt::from_body(r#"{"id": "abc", "ai_category": null, "ai_confidence": null}"#);
        assert_eq!(receipt.id, "abc");
        assert!(receipt.ai.is_none());
    }

    #[test]
    fn test_receipt_from_opaque_body() {
        assert_eq!(IssueReceipt::from_body("created").id, "unknown");
        assert_eq!(IssueReceipt::from_body("").id, "unknown");
    }

    #[test]
    fn test_issues_url() {
        let session = AuthSession::new("t", AuthScheme::Bearer);
        let client = HttpSubmissionClient::new("http://127.0.0.1:8000/api", session.clone());
        assert_eq!(client.issues_url(), "http://127.0.0.1:8000/api/issues/");

        let client = HttpSubmissionClient::new("http://127.0.0.1:8000/api/", session);
        assert_eq!(client.issues_url(), "http://127.0.0.1:8000/api/issues/");
    }
}
