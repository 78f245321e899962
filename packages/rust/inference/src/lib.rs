//! HTTP client for the remote chat inference endpoint.
//!
//! The endpoint accepts `POST {"input": "...", "model": "..."}` as JSON and
//! answers with `{"response": "..."}`. This crate only moves bytes; deciding
//! what to show the user when a request fails is up to the caller.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use unibot_shared::{AppConfig, Result, UnibotError};
use url::Url;

/// Default timeout in seconds for one chat request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum response size we accept (2 MB).
const MAX_RESPONSE_SIZE: u64 = 2 * 1024 * 1024;

/// User-Agent string for inference requests.
const USER_AGENT: &str = concat!("unibot/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body sent to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub input: &'a str,
    pub model: &'a str,
}

/// Response body returned by the endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`InferenceClient`].
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Chat endpoint URL.
    pub api_url: Url,
    /// Model identifier sent with each request.
    pub model: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl InferenceOptions {
    pub fn new(api_url: Url, model: impl Into<String>) -> Self {
        Self {
            api_url,
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build options from loaded config. The URL must already be validated.
    pub fn from_config(api_url: Url, config: &AppConfig) -> Self {
        Self {
            api_url,
            model: config.inference.model.clone(),
            timeout_secs: config.inference.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one chat endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    opts: InferenceOptions,
}

impl InferenceClient {
    pub fn new(opts: InferenceOptions) -> Result<Self> {
        let http = build_client(&opts)?;
        Ok(Self { http, opts })
    }

    pub fn endpoint(&self) -> &Url {
        &self.opts.api_url
    }

    pub fn model(&self) -> &str {
        &self.opts.model
    }

    /// Send `input` and return the `response` field.
    ///
    /// `Ok(None)` means the endpoint answered successfully but without a
    /// usable response text.
    #[instrument(skip_all, fields(endpoint = %self.opts.api_url, model = %self.opts.model))]
    pub async fn ask(&self, input: &str) -> Result<Option<String>> {
        let url = self.opts.api_url.as_str();
        let body = ChatRequest {
            input,
            model: &self.opts.model,
        };

        debug!(input_len = input.len(), "sending chat request");

        let mut response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UnibotError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UnibotError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(too_large(url, len));
            }
        }

        // Content-Length may be absent, so the streamed bytes are capped too.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| UnibotError::Network(format!("{url}: failed to read body: {e}")))?
        {
            append_capped(&mut bytes, &chunk, url)?;
        }

        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| UnibotError::parse(format!("{url}: invalid JSON response: {e}")))?;

        let reply = parsed.response.filter(|r| !r.trim().is_empty());
        debug!(
            has_response = reply.is_some(),
            response_len = reply.as_ref().map_or(0, String::len),
            "chat response received"
        );
        Ok(reply)
    }
}

/// Append `chunk` to `buf` unless that would exceed [`MAX_RESPONSE_SIZE`].
fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], url: &str) -> Result<()> {
    let total = (buf.len() + chunk.len()) as u64;
    if total > MAX_RESPONSE_SIZE {
        return Err(too_large(url, total));
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

fn too_large(url: &str, len: u64) -> UnibotError {
    UnibotError::validation(format!(
        "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
    ))
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &InferenceOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| UnibotError::Network(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> InferenceClient {
        let url = Url::parse(&format!("{}/chat", server.uri())).unwrap();
        InferenceClient::new(InferenceOptions::new(url, "detrained")).unwrap()
    }

    #[tokio::test]
    async fn test_ask_posts_input_and_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "input": "When is spring break?",
                "model": "detrained"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Spring break starts March 22, 2025."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let reply = client.ask("When is spring break?").await.unwrap();
        assert_eq!(reply.as_deref(), Some("Spring break starts March 22, 2025."));
    }

    #[tokio::test]
    async fn test_missing_response_field_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.ask("hello?").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_response_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "   " })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.ask("hello?").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.ask("anyone there?").await.unwrap_err();
        assert!(matches!(err, UnibotError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, UnibotError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let url = Url::parse("http://127.0.0.1:9/chat").unwrap();
        let mut opts = InferenceOptions::new(url, "detrained");
        opts.timeout_secs = 2;
        let client = InferenceClient::new(opts).unwrap();
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, UnibotError::Network(_)));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let server = MockServer::start().await;

        let padding = "x".repeat(MAX_RESPONSE_SIZE as usize);
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "response": padding })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, UnibotError::Validation { .. }));
    }

    #[test]
    fn test_streamed_bytes_are_capped() {
        let url = "http://bot.example.edu/chat";
        let mut buf = Vec::new();
        let chunk = vec![b'x'; 1024 * 1024];

        append_capped(&mut buf, &chunk, url).unwrap();
        append_capped(&mut buf, &chunk, url).unwrap();
        assert_eq!(buf.len() as u64, MAX_RESPONSE_SIZE);

        let err = append_capped(&mut buf, b"y", url).unwrap_err();
        assert!(matches!(err, UnibotError::Validation { .. }));
        assert!(err.to_string().contains("too large"));
        assert_eq!(buf.len() as u64, MAX_RESPONSE_SIZE);
    }

    #[test]
    fn test_options_from_config() {
        let config = AppConfig::default();
        let url = Url::parse("https://bot.example.edu/chat").unwrap();
        let opts = InferenceOptions::from_config(url, &config);
        assert_eq!(opts.model, "detrained");
        assert_eq!(opts.timeout_secs, 30);
    }
}
