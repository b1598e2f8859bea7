//! Transport to the backend chat endpoint.
//!
//! The [`ChatBackend`] trait is the seam between the submission flow and the
//! network. [`HttpBackend`] is the production implementation over `reqwest`.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::StatusCode;

use crate::error::{Result, SubmitError};
use crate::wire::{self, ChatRequest};

/// Body bytes of a successful response, chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// What the backend answered to one request.
pub enum BackendResponse {
    /// 2xx with a readable body.
    Stream(ByteStream),
    /// 2xx without a body to read from.
    NoBody,
    /// Non-2xx. `body` is the raw response body.
    Failed {
        /// HTTP status code.
        status: u16,
        /// Raw body, usually JSON with a `detail` field.
        body: Vec<u8>,
    },
}

impl std::fmt::Debug for BackendResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::NoBody => f.write_str("NoBody"),
            Self::Failed { status, body } => f
                .debug_struct("Failed")
                .field("status", status)
                .field("body_len", &body.len())
                .finish(),
        }
    }
}

/// Trait for chat backends.
///
/// Implementations send one request and hand back the response without
/// interpreting its body. Errors returned here are transport failures.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the request and wait for the response headers.
    async fn send(&self, req: &ChatRequest) -> Result<BackendResponse>;
}

/// Backend reached over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpBackend {
    /// Create a backend for the given base URL (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend with a custom reqwest client.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self> {
        let endpoint = wire::chat_url(base_url);
        url::Url::parse(&endpoint)
            .map_err(|e| SubmitError::Unknown(format!("Invalid backend URL {endpoint}: {e}")))?;
        Ok(Self { http, endpoint })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, req: &ChatRequest) -> Result<BackendResponse> {
        let resp = self.http.post(&self.endpoint).json(req).send().await?;
        let status = resp.status();

        tracing::debug!(
            name: "chat.backend.response",
            status = status.as_u16(),
            endpoint = %self.endpoint,
            "Backend responded"
        );

        if !status.is_success() {
            let body = resp.bytes().await?.to_vec();
            return Ok(BackendResponse::Failed {
                status: status.as_u16(),
                body,
            });
        }

        // `fetch` exposes no body for these statuses.
        if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
            return Ok(BackendResponse::NoBody);
        }

        let bytes = resp
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(SubmitError::from));
        Ok(BackendResponse::Stream(Box::pin(bytes)))
    }
}
