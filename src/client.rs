use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, multipart};
use url::Url;

use crate::backend::{Backend, TokenStream};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatRequest, ChatResponse, Document, HealthStatus, UploadReceipt};

/// Backend origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
/// Per-request deadline used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the Vera backend.
#[derive(Clone)]
pub struct VeraClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for VeraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeraClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl VeraClient {
    /// Create a client for the default origin and timeout.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every exchange.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The origin every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn record_failure(&self, endpoint: &str, error: Error) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        if let Some(logger) = &self.logger {
            logger.log_failure(endpoint, &error);
        }
        error
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process a non-2xx response into an application error.
    ///
    /// The backend reports failures as `{"detail": "..."}`; anything else is
    /// passed through verbatim. The status alone decides the error kind, so
    /// a body that cannot be read still yields an application error.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let reason = status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string();
        let Ok(body) = response.text().await else {
            return Error::api(status.as_u16(), reason);
        };

        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(String::from));
        let message = match detail {
            Some(detail) => detail,
            None if body.trim().is_empty() => reason,
            None => body,
        };
        Error::api(status.as_u16(), message)
    }

    /// Send a request and insist on a 2xx answer.
    async fn execute(&self, endpoint: &str, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            let err = self.map_transport_error(e);
            self.record_failure(endpoint, err)
        })?;

        if !response.status().is_success() {
            let err = Self::process_error_response(response).await;
            return Err(self.record_failure(endpoint, err));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Backend for VeraClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint("chat")?;
        let builder = self
            .client
            .post(url)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .json(request);
        let response = self.execute("/chat", builder).await?;

        let reply = response.json::<ChatResponse>().await.map_err(|e| {
            let err = Error::serialization(
                format!("Failed to parse response: {e}"),
                Some(Box::new(e)),
            );
            self.record_failure("/chat", err)
        })?;
        if let Some(logger) = &self.logger {
            logger.log_chat(request, &reply);
        }
        Ok(reply)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream> {
        let url = self.endpoint("chat/stream")?;
        let builder = self
            .client
            .post(url)
            .header(header::ACCEPT, HeaderValue::from_static("text/event-stream"))
            .json(request);
        let response = self.execute("/chat/stream", builder).await?;

        let logger = self.logger.clone();
        let tokens = process_sse(response.bytes_stream()).inspect(move |item| {
            if let Some(logger) = &logger {
                match item {
                    Ok(token) => logger.log_stream_token(token),
                    Err(err) => logger.log_failure("/chat/stream", err),
                }
            }
        });
        Ok(Box::pin(tokens))
    }

    async fn upload(&self, document: &Document) -> Result<UploadReceipt> {
        let url = self.endpoint("upload")?;
        let part = multipart::Part::bytes(document.bytes().to_vec())
            .file_name(document.file_name().to_string())
            .mime_str("application/pdf")
            .map_err(|e| {
                Error::http_client(format!("Invalid content type: {e}"), Some(Box::new(e)))
            })?;
        let form = multipart::Form::new().part("file", part);
        let builder = self.client.post(url).multipart(form);
        let response = self.execute("/upload", builder).await?;

        let receipt = UploadReceipt {
            status: response.status().as_u16(),
        };
        if let Some(logger) = &self.logger {
            logger.log_upload(document.file_name(), &receipt);
        }
        Ok(receipt)
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health")?;
        let builder = self
            .client
            .get(url)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        let response = self.execute("/health", builder).await?;

        let health = response.json::<HealthStatus>().await.map_err(|e| {
            let err = Error::serialization(
                format!("Failed to parse health response: {e}"),
                Some(Box::new(e)),
            );
            self.record_failure("/health", err)
        })?;
        if let Some(logger) = &self.logger {
            logger.log_health(&health);
        }
        Ok(health)
    }
}

/// Parse and normalise a backend origin.
///
/// Only `http` and `https` are accepted. The path always ends in `/` so that
/// endpoint names resolve beneath it rather than replacing its last segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(
            format!("unsupported scheme '{}' in {raw}", url.scheme()),
            Some("base_url".to_string()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = VeraClient::new().unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = VeraClient::with_options(
            Some("https://vera.example.com/api"),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://vera.example.com/api/");
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn endpoints_resolve_under_base() {
        let client = VeraClient::with_options(Some("http://10.0.0.5:8000/vera"), None).unwrap();
        assert_eq!(
            client.endpoint("chat").unwrap().as_str(),
            "http://10.0.0.5:8000/vera/chat"
        );
        assert_eq!(
            client.endpoint("chat/stream").unwrap().as_str(),
            "http://10.0.0.5:8000/vera/chat/stream"
        );
        assert_eq!(
            client.endpoint("upload").unwrap().as_str(),
            "http://10.0.0.5:8000/vera/upload"
        );
    }

    #[test]
    fn rejects_bad_origins() {
        assert!(matches!(
            VeraClient::with_options(Some("not a url"), None),
            Err(Error::Url { .. })
        ));
        assert!(matches!(
            parse_base_url("ftp://example.com/"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn debug_hides_logger() {
        let client = VeraClient::new().unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("127.0.0.1:8000"));
        assert!(debug.contains("logger: false"));
    }
}
