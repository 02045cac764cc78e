//! HTTP sink: POSTs each batch payload to an endpoint.
//!
//! Uses async reqwest on a private current-thread tokio runtime but presents
//! the synchronous [`Sink`] interface the accumulator expects.

use std::io;
use std::time::Duration;

use crate::retry::{Backoff, Retryable, retry_with_backoff};
use crate::sink::Sink;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from a single POST attempt
#[derive(Debug)]
pub enum HttpError {
    /// Non-success status from the endpoint
    Status { status: u16, message: String },
    /// Connection, TLS or timeout failure
    Transport(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport(message) => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl Retryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            // 408 timeout, 429 rate limited, 5xx server side
            Self::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Transport(_) => true,
        }
    }
}

impl HttpError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Transport(e.to_string()),
        }
    }
}

/// Endpoint settings for [`HttpSink`]
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`
    pub token: Option<String>,
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl HttpSinkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            timeout: Duration::from_secs(60),
            backoff: Backoff::default(),
        }
    }
}

/// Sink that POSTs `application/json` payloads, retrying transient failures
pub struct HttpSink {
    config: HttpSinkConfig,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    sent: usize,
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("url", &self.config.url)
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()
            .map_err(io::Error::other)?;
        Ok(Self {
            config,
            client,
            runtime,
            sent: 0,
        })
    }

    /// Batches delivered successfully
    pub fn sent(&self) -> usize {
        self.sent
    }

    fn post_once(&self, payload: &[u8]) -> Result<(), HttpError> {
        self.runtime.block_on(async {
            let mut request = self
                .client
                .post(&self.config.url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload.to_vec());
            if let Some(token) = &self.config.token {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| HttpError::from_reqwest(&e))?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| e.to_string());
            Err(HttpError::Status {
                status: status.as_u16(),
                message,
            })
        })
    }
}

impl Sink for HttpSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let label = format!("batch {} -> {}", self.sent + 1, self.config.url);
        retry_with_backoff(&label, self.config.backoff, || self.post_once(payload))
            .map_err(io::Error::other)?;
        self.sent += 1;
        Ok(())
    }
}
