//! Embedded web dashboard for topiclens.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The analysis dashboard page, rendered server-side
//! - JSON API endpoints for health and the current result
//!
//! Launched via `topiclens serve` (default: `http://127.0.0.1:9747`).

pub mod api;
pub mod frontend;

use std::io::Cursor;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::logger::log_run;
use crate::client::{AnalysisClient, Transport, UreqTransport};
use crate::config::{self, TopiclensConfig};
use crate::controller::{AnalysisController, CollectedNotices};
use crate::render::chart::{ChartRegistry, ChartRenderer};
use crate::render::{Region, RenderContext};
use crate::run::run_log_entry;

use frontend::{PageView, render_page};

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server.
///
/// Blocks the current thread. Handles requests sequentially, so at most one
/// analysis is in flight. Errors are answered per-request without stopping
/// the server.
pub fn serve(addr: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or(cfg.web.addr.as_str()).to_string();
    let open = cfg.web.open_browser;

    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("topiclens dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open && let Err(e) = open_browser(&format!("http://{addr}")) {
        log::debug!("could not open browser: {e:#}");
    }

    let client = AnalysisClient::from_config(&cfg.backend);
    let mut dashboard = Dashboard::new(cfg, client);

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let resp = match dashboard.dispatch(&method, &url) {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("{method} {url} failed: {e:#}");
                error_response(&e)
            }
        };
        let status = resp.status_code().0;
        let _ = request.respond(resp);

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The single dashboard page and the controller that drives it.
pub struct Dashboard<T: Transport = UreqTransport> {
    cfg: TopiclensConfig,
    controller: AnalysisController<T, ChartRegistry, CollectedNotices>,
    registry: ChartRegistry,
    ctx: RenderContext,
    topic_count: i64,
}

impl<T: Transport> Dashboard<T> {
    pub fn new(cfg: TopiclensConfig, client: AnalysisClient<T>) -> Self {
        let registry = ChartRegistry::new();
        let controller = AnalysisController::new(
            client,
            ChartRenderer::new(registry.clone(), Region::Chart.element_id()),
            CollectedNotices::default(),
        );
        let topic_count = i64::from(cfg.dashboard.default_topics);
        Self {
            cfg,
            controller,
            registry,
            ctx: RenderContext::new(),
            topic_count,
        }
    }

    /// Dispatch an incoming request to the appropriate handler.
    pub fn dispatch(&mut self, method: &Method, url: &str) -> Result<Response<Cursor<Vec<u8>>>> {
        // Strip query string for path matching
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(self.index()),
            (&Method::Get, "/dashboard") => Ok(self.analyze(url)),

            (&Method::Get, "/api/health") => {
                api::get_health(&self.cfg, self.controller.client())
            }
            (&Method::Get, "/api/result") => api::get_result(self.controller.current()),

            _ => Ok(not_found()),
        }
    }

    /// `GET /`: a freshly loaded page, optionally showing the saved result.
    fn index(&mut self) -> Response<Cursor<Vec<u8>>> {
        self.controller.reset();
        self.ctx = RenderContext::new();
        self.topic_count = i64::from(self.cfg.dashboard.default_topics);

        if self.cfg.backend.restore_saved && self.controller.restore_saved(&mut self.ctx) {
            log::info!("restored saved analysis result");
        }

        self.page(&[])
    }

    /// `GET /dashboard?topics=N`: run one analysis and show the outcome.
    fn analyze(&mut self, url: &str) -> Response<Cursor<Vec<u8>>> {
        self.topic_count = api::parse_topics_param(url).unwrap_or_else(|| {
            log::warn!("missing or non-numeric topics parameter, using default");
            i64::from(self.cfg.dashboard.default_topics)
        });

        let start = std::time::Instant::now();
        let outcome = self.controller.run_analysis(self.topic_count, &mut self.ctx);
        let latency_ms = start.elapsed().as_millis() as u64;

        if self.cfg.logging.run_log {
            log_run(&run_log_entry(self.topic_count, &outcome, latency_ms));
        }

        let notices = self.controller.notifier_mut().drain();
        self.page(&notices)
    }

    fn page(&self, notices: &[String]) -> Response<Cursor<Vec<u8>>> {
        let panel = self.controller.panel();
        let charts = if panel.results_visible {
            self.registry.live()
        } else {
            Vec::new()
        };
        let html = render_page(&PageView {
            panel,
            ctx: &self.ctx,
            charts: &charts,
            notices,
            topic_count: self.topic_count,
            chart_js_url: &self.cfg.web.chart_js_url,
        });
        Response::from_data(html.into_bytes())
            .with_header(content_type_html())
            .with_status_code(StatusCode(200))
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = r#"{"error": "not found"}"#;
    Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json())
        .with_status_code(StatusCode(404))
}

/// 500 response carrying the error chain.
fn error_response(err: &anyhow::Error) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": format!("{err:#}") }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(500))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpReply;
    use std::io::Read;
    use std::time::Duration;

    /// Answers `/analyze` with a fixed reply and `/results` with 404.
    struct Backend(u16, &'static str);

    impl Transport for Backend {
        fn get(&self, url: &str, _timeout: Duration) -> crate::error::Result<HttpReply> {
            let (status, body) = if url.contains("/analyze") {
                (self.0, self.1)
            } else {
                (404, r#"{"error": "分析結果がありません。"}"#)
            };
            Ok(HttpReply {
                status,
                body: body.to_string(),
            })
        }
    }

    /// Succeeds for `topics=1`, fails any other analysis request.
    struct OnlyOneTopic;

    impl Transport for OnlyOneTopic {
        fn get(&self, url: &str, _timeout: Duration) -> crate::error::Result<HttpReply> {
            let (status, body) = if url.ends_with("/analyze?topics=1") {
                (200, BODY)
            } else {
                (500, r#"{"error": "boom"}"#)
            };
            Ok(HttpReply {
                status,
                body: body.to_string(),
            })
        }
    }

    /// Rejects every request, quoting the URL it was sent.
    struct EchoUrl;

    impl Transport for EchoUrl {
        fn get(&self, url: &str, _timeout: Duration) -> crate::error::Result<HttpReply> {
            Ok(HttpReply {
                status: 400,
                body: serde_json::json!({ "error": url }).to_string(),
            })
        }
    }

    const BODY: &str = r#"{
        "summary": {"total_receipts": 120, "total_products": 45, "n_topics": 1},
        "topics": [{"topic_name": "飲料", "top_products": ["水", "茶"]}],
        "stores": {"A": {"topic_ratios": [1.0]}}
    }"#;

    fn dashboard_with<T: Transport>(transport: T) -> Dashboard<T> {
        let mut cfg = TopiclensConfig::default();
        cfg.logging.run_log = false;
        cfg.backend.restore_saved = true;
        let client = AnalysisClient::new("http://backend", Duration::from_secs(5), transport);
        Dashboard::new(cfg, client)
    }

    fn dashboard(status: u16, body: &'static str) -> Dashboard<Backend> {
        dashboard_with(Backend(status, body))
    }

    fn body_of(resp: Response<Cursor<Vec<u8>>>) -> String {
        let mut out = String::new();
        resp.into_reader().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn index_is_idle_page_without_results() {
        let mut d = dashboard(200, BODY);
        let resp = d.dispatch(&Method::Get, "/").unwrap();
        assert_eq!(resp.status_code(), StatusCode(200));
        let html = body_of(resp);
        assert!(html.contains(r#"<div id="results" style="display:none">"#));
        assert!(!html.contains("new Chart("));
        assert!(!html.contains("class=\"notice\""));
    }

    #[test]
    fn dashboard_route_renders_results() {
        let mut d = dashboard(200, BODY);
        let html = body_of(d.dispatch(&Method::Get, "/dashboard?topics=3").unwrap());
        assert!(html.contains("120件のレシート"));
        assert!(html.contains("<strong>A店</strong>は<strong>飲料</strong>が最も多く"));
        assert!(html.contains("new Chart("));
        assert!(html.contains(r#"value="3""#));
        assert_eq!(d.registry.live_count(), 1);
    }

    #[test]
    fn backend_error_becomes_banner() {
        let mut d = dashboard(400, r#"{"error": "トピック数は2-10の間で指定してください"}"#);
        let html = body_of(d.dispatch(&Method::Get, "/dashboard?topics=12").unwrap());
        assert!(html.contains("分析エラー: トピック数は2-10の間で指定してください"));
        assert!(html.contains(r#"<div id="results" style="display:none">"#));
        assert!(html.contains("🔍 分析開始！</button>"));
    }

    #[test]
    fn reload_after_run_releases_chart() {
        let mut d = dashboard(200, BODY);
        d.dispatch(&Method::Get, "/dashboard?topics=3").unwrap();
        d.dispatch(&Method::Get, "/").unwrap();
        assert_eq!(d.registry.live_count(), 0);
        assert!(d.controller.current().is_none());
    }

    #[test]
    fn api_result_follows_dashboard() {
        let mut d = dashboard(200, BODY);
        let resp = d.dispatch(&Method::Get, "/api/result").unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));

        d.dispatch(&Method::Get, "/dashboard?topics=1").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&body_of(d.dispatch(&Method::Get, "/api/result").unwrap()))
                .unwrap();
        assert_eq!(json["result"]["summary"]["total_receipts"], 120);
    }

    #[test]
    fn unknown_route_is_json_404() {
        let mut d = dashboard(200, BODY);
        let resp = d.dispatch(&Method::Get, "/nope").unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
        assert!(body_of(resp).contains("not found"));
        let resp = d.dispatch(&Method::Post, "/dashboard").unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
    }

    #[test]
    fn api_result_is_gone_after_failed_rerun() {
        let mut d = dashboard_with(OnlyOneTopic);
        d.dispatch(&Method::Get, "/dashboard?topics=1").unwrap();
        let resp = d.dispatch(&Method::Get, "/api/result").unwrap();
        assert_eq!(resp.status_code(), StatusCode(200));

        let html = body_of(d.dispatch(&Method::Get, "/dashboard?topics=3").unwrap());
        assert!(html.contains("分析エラー: boom"));
        assert!(!html.contains("new Chart("));

        let resp = d.dispatch(&Method::Get, "/api/result").unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
    }

    #[test]
    fn negative_topic_count_reaches_backend() {
        let mut d = dashboard_with(EchoUrl);
        let html = body_of(d.dispatch(&Method::Get, "/dashboard?topics=-2").unwrap());
        assert!(html.contains("analyze?topics=-2"));
        assert!(html.contains(r#"value="-2""#));
    }

    #[test]
    fn non_numeric_topic_count_uses_default() {
        let mut d = dashboard_with(EchoUrl);
        let html = body_of(d.dispatch(&Method::Get, "/dashboard?topics=abc").unwrap());
        assert!(html.contains("analyze?topics=5"));
    }
}
