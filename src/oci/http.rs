//! HTTP utilities for OCI REST API calls

use super::auth::RequestSigner;
use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Upper bound for a single retry back-off
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Response header carrying the next page cursor
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Request/response header used to correlate calls with OCI support
pub const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Error returned by an OCI endpoint
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed: {status} {code}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl ApiError {
    fn from_response(status: StatusCode, body: &str, request_id: Option<String>) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Self {
            status: status.as_u16(),
            code: field("code").unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            }),
            message: field("message").unwrap_or_default(),
            request_id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// True when the error chain carries an OCI 404
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ApiError>()
        .map(ApiError::is_not_found)
        .unwrap_or(false)
}

/// Retry behaviour for throttled and failed calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_attempts: u32,
    pub min_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 9,
            min_delay: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, status: StatusCode, attempt: u32) -> bool {
        attempt < self.max_attempts
            && (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
    }

    /// Exponential back-off starting at `min_delay`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.min_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }
}

/// A decoded OCI response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Value,
    pub next_page: Option<String>,
    pub request_id: Option<String>,
}

/// HTTP client wrapper for OCI API calls
#[derive(Clone)]
pub struct OciHttpClient {
    client: Client,
    signer: Arc<dyn RequestSigner>,
    retry: RetryPolicy,
}

impl OciHttpClient {
    /// Create a new HTTP client
    pub fn new(signer: Arc<dyn RequestSigner>, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("toci/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            signer,
            retry,
        })
    }

    /// Make a GET request to an OCI API
    pub async fn get(&self, url: Url) -> Result<ApiResponse> {
        self.execute(Method::GET, url, None).await
    }

    /// Make a POST request to an OCI API
    pub async fn post(&self, url: Url, body: &Value) -> Result<ApiResponse> {
        self.execute(Method::POST, url, Some(body)).await
    }

    async fn execute(&self, method: Method, url: Url, body: Option<&Value>) -> Result<ApiResponse> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .context("Failed to encode request body")?;
        let request_id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        let mut attempt = 0;

        loop {
            tracing::debug!("{} {} (attempt {})", method, url, attempt + 1);

            let mut builder = self
                .client
                .request(method.clone(), url.clone())
                .header(REQUEST_ID_HEADER, &request_id)
                .header(reqwest::header::ACCEPT, "application/json");
            if let Some(payload) = payload.as_ref() {
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(payload.clone());
            }
            let mut request = builder.build().context("Failed to build request")?;
            self.signer.sign(&mut request)?;

            let response = self
                .client
                .execute(request)
                .await
                .context("Failed to send request")?;

            let status = response.status();
            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string())
            };
            let next_page = header(NEXT_PAGE_HEADER);
            let response_id = header(REQUEST_ID_HEADER);
            let text = response
                .text()
                .await
                .context("Failed to read response body")?;

            if !status.is_success() {
                if self.retry.should_retry(status, attempt) {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!("{} {} returned {}, retrying in {:?}", method, url, status, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
                return Err(ApiError::from_response(status, &text, response_id).into());
            }

            let body = if text.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).context("Failed to parse response JSON")?
            };

            return Ok(ApiResponse {
                body,
                next_page,
                request_id: response_id,
            });
        }
    }
}

/// Format an OCI API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_oci_error(error: &anyhow::Error) -> String {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return match api.status {
            401 => "Authentication failed. Check the API key and fingerprint in your OCI config.".to_string(),
            403 | 404 if api.code == "NotAuthorizedOrNotFound" => {
                "Not authorized or resource not found. Check your IAM policies.".to_string()
            }
            403 => "Permission denied. Check your IAM policies.".to_string(),
            404 => "Resource not found.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 => format!("Invalid request: {}", api.code),
            409 => "Resource conflict.".to_string(),
            500..=599 => "OCI service temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        };
    }

    let error_str = format!("{:#}", error);
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_oci_body() {
        let body = r#"{"code":"NotAuthorizedOrNotFound","message":"Authorization failed or requested resource not found."}"#;
        let err = ApiError::from_response(StatusCode::NOT_FOUND, body, Some("abc".to_string()));
        assert_eq!(err.code, "NotAuthorizedOrNotFound");
        assert!(err.is_not_found());
        assert_eq!(err.request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_api_error_without_json_body() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>", None);
        assert_eq!(err.code, "Bad Gateway");
        assert!(err.message.is_empty());
    }

    #[test]
    fn test_is_not_found_through_context() {
        let err = anyhow::Error::from(ApiError::from_response(StatusCode::NOT_FOUND, "", None))
            .context("get db home");
        assert!(is_not_found(&err));
        assert!(!is_not_found(&anyhow::anyhow!("404")));
    }

    #[test]
    fn test_retry_policy() {
        let policy = RetryPolicy {
            max_attempts: 2,
            min_delay: Duration::from_millis(10),
        };
        assert!(policy.should_retry(StatusCode::TOO_MANY_REQUESTS, 0));
        assert!(policy.should_retry(StatusCode::SERVICE_UNAVAILABLE, 1));
        assert!(!policy.should_retry(StatusCode::SERVICE_UNAVAILABLE, 2));
        assert!(!policy.should_retry(StatusCode::NOT_FOUND, 0));
        assert_eq!(policy.delay(0), Duration::from_millis(10));
        assert_eq!(policy.delay(3), Duration::from_millis(80));
        assert_eq!(policy.delay(40), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(500);
        let out = sanitize_for_log(&long);
        assert!(out.contains("truncated, 500 bytes total"));
    }

    #[test]
    fn test_format_oci_error() {
        let err = anyhow::Error::from(ApiError::from_response(StatusCode::TOO_MANY_REQUESTS, "", None));
        assert!(format_oci_error(&err).contains("Rate limit"));
        assert_eq!(format_oci_error(&anyhow::anyhow!("boom")), "boom");
    }
}
