//! HTTP client for the topic-analysis backend.
//!
//! Talks to two endpoints:
//!
//! - `GET /analyze?topics=N`: run a fresh analysis (slow; bounded by the
//!   configured deadline, 60 s by default).
//! - `GET /results`: legacy: the last result the backend saved, 404 when
//!   there is none.
//!
//! The wire call sits behind the [`Transport`] trait so the deadline race
//! and the status/body handling can be tested without a server. The real
//! transport uses the synchronous `ureq` client.

pub mod deadline;

use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::schema::BackendConfig;
use crate::error::{AnalysisError, Result};
use crate::model::{self, AnalysisResult};

use deadline::{DeadlineError, run_with_deadline};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Raw HTTP reply: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET request.
///
/// Non-2xx statuses are replies, not errors; only failures to get any
/// reply at all are errors.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply>;
}

/// `ureq`-backed transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpReply> {
        // On Windows, "localhost" may try IPv6 (::1) first and stall when the
        // backend only binds IPv4.
        let url = url.replace("://localhost", "://127.0.0.1");

        match ureq::get(&url).timeout(timeout).call() {
            Ok(resp) => reply_from(resp),
            Err(ureq::Error::Status(_, resp)) => reply_from(resp),
            Err(ureq::Error::Transport(t)) => {
                if is_timeout(&t) {
                    Err(AnalysisError::Timeout(timeout))
                } else {
                    Err(AnalysisError::Network(t.to_string()))
                }
            }
        }
    }
}

/// Largest response body accepted. ureq's `into_string` stops at 10 MB,
/// which a result with many word-cloud images can exceed.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

fn reply_from(resp: ureq::Response) -> Result<HttpReply> {
    let status = resp.status();
    let body = read_body(resp.into_reader(), MAX_BODY_BYTES)?;
    Ok(HttpReply { status, body })
}

/// Read a UTF-8 body of at most `limit` bytes.
fn read_body(reader: impl Read, limit: u64) -> Result<String> {
    let mut body = String::new();
    reader
        .take(limit + 1)
        .read_to_string(&mut body)
        .map_err(|e| AnalysisError::Network(format!("failed to read response body: {e}")))?;
    if body.len() as u64 > limit {
        return Err(AnalysisError::Network(format!(
            "response body exceeds {limit} bytes"
        )));
    }
    Ok(body)
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            );
        }
        source = err.source();
    }
    false
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Error body returned by the backend on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Client for the analysis backend.
pub struct AnalysisClient<T: Transport = UreqTransport> {
    base_url: String,
    timeout: Duration,
    transport: Arc<T>,
}

impl AnalysisClient<UreqTransport> {
    /// Build a client from the resolved backend config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            UreqTransport,
        )
    }
}

impl<T: Transport> AnalysisClient<T> {
    pub fn new(base_url: &str, timeout: Duration, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            transport: Arc::new(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a fresh analysis with `topic_count` topics.
    ///
    /// The count is passed through unchecked; the backend decides what it
    /// accepts.
    pub fn analyze(&self, topic_count: i64) -> Result<AnalysisResult> {
        let url = format!("{}/analyze?topics={topic_count}", self.base_url);
        let start = Instant::now();
        log::info!("requesting analysis - topics={topic_count}, url={url}");

        let reply = self.get_with_deadline(url)?;
        log::debug!(
            "analysis reply - status={}, bytes={}, elapsed={:.2}s",
            reply.status,
            reply.body.len(),
            start.elapsed().as_secs_f32()
        );

        if !reply.is_success() {
            return Err(server_error(&reply));
        }

        Ok(model::parse(&reply.body)?)
    }

    /// Fetch the result the backend last saved.
    ///
    /// Returns `Ok(None)` when the backend has nothing saved (404).
    pub fn fetch_saved(&self) -> Result<Option<AnalysisResult>> {
        let url = format!("{}/results", self.base_url);
        let reply = self.get_with_deadline(url)?;

        if reply.status == 404 {
            log::debug!("no saved analysis result on the backend");
            return Ok(None);
        }
        if !reply.is_success() {
            return Err(server_error(&reply));
        }

        Ok(Some(model::parse(&reply.body)?))
    }

    /// Check whether the backend answers at all (any HTTP status counts).
    pub fn is_reachable(&self) -> bool {
        let url = format!("{}/", self.base_url);
        self.transport
            .get(&url, Duration::from_secs(5).min(self.timeout))
            .is_ok()
    }

    fn get_with_deadline(&self, url: String) -> Result<HttpReply> {
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;

        match run_with_deadline(timeout, move || transport.get(&url, timeout)) {
            Ok(reply) => reply,
            Err(DeadlineError::Exceeded(_)) => {
                log::warn!("analysis request abandoned after {}s", timeout.as_secs());
                Err(AnalysisError::Timeout(timeout))
            }
            Err(DeadlineError::WorkerLost) => Err(AnalysisError::Network(
                "request worker exited unexpectedly".to_string(),
            )),
        }
    }
}

fn server_error(reply: &HttpReply) -> AnalysisError {
    let message = serde_json::from_str::<ErrorBody>(&reply.body)
        .ok()
        .and_then(|body| body.error);
    log::error!(
        "backend error - status={}, message={}",
        reply.status,
        message.as_deref().unwrap_or("<none>")
    );
    AnalysisError::Server {
        status: reply.status,
        message,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
