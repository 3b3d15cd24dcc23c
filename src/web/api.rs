//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::client::{AnalysisClient, Transport};
use crate::config::TopiclensConfig;
use crate::model::AnalysisResult;
use crate::run::DashboardReport;

use super::content_type_json;

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Health API response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    version: &'static str,
    backend_url: String,
    backend_reachable: bool,
    timeout_secs: u64,
    restore_saved: bool,
    default_topics: u32,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
pub(crate) fn json_response<T: Serialize>(
    data: &T,
    status: u16,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status)))
}

/// Parse the `?topics=N` query parameter from a URL.
///
/// `None` when absent or not an integer. Signed and out-of-range counts
/// are passed through for the backend to reject.
pub(crate) fn parse_topics_param(url: &str) -> Option<i64> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == "topics" { v.trim().parse().ok() } else { None }
    })
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/health`: backend settings and reachability.
pub fn get_health<T: Transport>(
    cfg: &TopiclensConfig,
    client: &AnalysisClient<T>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let resp = HealthResponse {
        version: env!("CARGO_PKG_VERSION"),
        backend_url: client.base_url().to_string(),
        backend_reachable: client.is_reachable(),
        timeout_secs: client.timeout().as_secs(),
        restore_saved: cfg.backend.restore_saved,
        default_topics: cfg.dashboard.default_topics,
    };
    json_response(&resp, 200)
}

/// `GET /api/result`: the result currently on the dashboard.
pub fn get_result(current: Option<&AnalysisResult>) -> Result<Response<Cursor<Vec<u8>>>> {
    match current {
        Some(result) => json_response(&DashboardReport::new(result), 200),
        None => json_response(&serde_json::json!({ "error": "no analysis result yet" }), 404),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
