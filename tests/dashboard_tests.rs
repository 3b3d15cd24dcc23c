/// End-to-end dashboard tests.
///
/// Drive the controller against in-memory backends and check what lands in
/// each page region: the rendered sections, the notification on failure,
/// the control panel afterwards and the number of live charts.
use std::thread;
use std::time::Duration;

use topiclens::client::{AnalysisClient, HttpReply, Transport};
use topiclens::controller::{AnalysisController, CollectedNotices};
use topiclens::error::{AnalysisError, Result};
use topiclens::render::chart::{ChartRegistry, ChartRenderer};
use topiclens::render::markup::text_lines;
use topiclens::render::{Region, RenderContext};

// ---------------------------------------------------------------------------
// Fake backends
// ---------------------------------------------------------------------------

/// Replies with a fixed status and body.
struct Scripted {
    status: u16,
    body: String,
}

impl Scripted {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

impl Transport for Scripted {
    fn get(&self, _url: &str, _timeout: Duration) -> Result<HttpReply> {
        Ok(HttpReply {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Never answers within any reasonable deadline.
struct Stalled;

impl Transport for Stalled {
    fn get(&self, _url: &str, _timeout: Duration) -> Result<HttpReply> {
        thread::sleep(Duration::from_secs(2));
        Ok(HttpReply {
            status: 200,
            body: "{}".to_string(),
        })
    }
}

/// Connection refused.
struct Unreachable;

impl Transport for Unreachable {
    fn get(&self, _url: &str, _timeout: Duration) -> Result<HttpReply> {
        Err(AnalysisError::Network("connection refused".to_string()))
    }
}

fn controller<T: Transport>(
    transport: T,
    deadline: Duration,
) -> AnalysisController<T, ChartRegistry, CollectedNotices> {
    AnalysisController::new(
        AnalysisClient::new("http://backend:5000/", deadline, transport),
        ChartRenderer::new(ChartRegistry::new(), Region::Chart.element_id()),
        CollectedNotices::default(),
    )
}

const FULL: &str = r#"{
    "summary": {"total_receipts": 120, "total_products": 45, "n_topics": 3},
    "topics": [
        {"topic_name": "トピック1: 朝食", "top_products": ["パン", "牛乳", "卵"]},
        {"topic_name": "トピック2: 飲料", "top_products": ["水", "お茶"]},
        {"topic_name": "トピック3: 日用品", "top_products": []}
    ],
    "stores": {
        "西区": {"topic_ratios": [0.2, 0.5, 0.3], "receipt_count": 30},
        "中央区": {"topic_ratios": [0.6, 0.3, 0.1], "receipt_count": 50},
        "北区": {"topic_ratios": [0.1, 0.1, 0.8], "receipt_count": 40}
    },
    "store_wordclouds": {
        "西区": {"image": "data:image/png;base64,AAA", "product_count": 12,
                 "top_products": [["水", 9], ["パン", 5], ["卵", 4], ["肉", 1]]},
        "中央区": {"image": "data:image/png;base64,BBB", "product_count": 30,
                   "top_products": [["パン", 20], ["牛乳", 18]]}
    }
}"#;

// ---------------------------------------------------------------------------
// Successful runs
// ---------------------------------------------------------------------------

#[test]
fn full_result_fills_every_region() {
    let mut c = controller(Scripted::new(200, FULL), Duration::from_secs(5));
    let mut ctx = RenderContext::new();

    let report = c.run_analysis(3, &mut ctx).unwrap();
    assert_eq!((report.stores, report.topics), (3, 3));

    let summary = text_lines(ctx.nodes(Region::Summary)).join("\n");
    assert!(summary.contains("120件のレシート"));
    assert!(summary.contains("45種類"));
    assert!(summary.contains("3トピック"));

    let topics = text_lines(ctx.nodes(Region::Topics));
    assert!(topics.contains(&"主な商品: パン, 牛乳, 卵".to_string()));

    assert!(c.panel().results_visible);
    assert!(c.panel().is_idle());
    assert!(c.notifier_mut().messages.is_empty());
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let c = controller(Scripted::new(200, FULL), Duration::from_secs(5));
    assert_eq!(c.client().base_url(), "http://backend:5000");
}

#[test]
fn wordclouds_follow_fixed_store_order() {
    let mut c = controller(Scripted::new(200, FULL), Duration::from_secs(5));
    let mut ctx = RenderContext::new();
    c.run_analysis(3, &mut ctx).unwrap();

    let headings: Vec<String> = text_lines(ctx.nodes(Region::Wordclouds))
        .into_iter()
        .filter(|line| line.ends_with('店'))
        .collect();
    assert_eq!(headings, vec!["中央区店", "西区店"]);

    let lines = text_lines(ctx.nodes(Region::Wordclouds));
    assert!(lines.contains(&"上位3商品: 水, パン, 卵".to_string()));
}

#[test]
fn insights_cover_each_store_then_each_topic() {
    let mut c = controller(Scripted::new(200, FULL), Duration::from_secs(5));
    let mut ctx = RenderContext::new();
    c.run_analysis(3, &mut ctx).unwrap();

    let lines = text_lines(ctx.nodes(Region::Insights));
    assert_eq!(
        lines,
        vec![
            "西区店はトピック2: 飲料が最も多く、全体の50.0%を占めています",
            "中央区店はトピック1: 朝食が最も多く、全体の60.0%を占めています",
            "北区店はトピック3: 日用品が最も多く、全体の80.0%を占めています",
            "トピック1: 朝食は中央区店で最も多く、60.0%の割合です",
            "トピック2: 飲料は西区店で最も多く、50.0%の割合です",
            "トピック3: 日用品は北区店で最も多く、80.0%の割合です",
        ]
    );
}

#[test]
fn single_store_single_topic_yields_two_insights() {
    let body = r#"{
        "summary": {"total_receipts": 120, "total_products": 45, "n_topics": 1},
        "topics": [{"topic_name": "飲料", "top_products": ["水", "茶"]}],
        "stores": {"A": {"topic_ratios": [1.0]}}
    }"#;
    let mut c = controller(Scripted::new(200, body), Duration::from_secs(5));
    let mut ctx = RenderContext::new();
    c.run_analysis(1, &mut ctx).unwrap();

    assert_eq!(
        text_lines(ctx.nodes(Region::Insights)),
        vec![
            "A店は飲料が最も多く、全体の100.0%を占めています",
            "飲料はA店で最も多く、100.0%の割合です",
        ]
    );
    assert_eq!(
        text_lines(ctx.nodes(Region::Wordclouds)),
        vec!["ワードクラウドデータがありません"]
    );
}

#[test]
fn repeated_runs_leave_one_live_chart() {
    let mut c = controller(Scripted::new(200, FULL), Duration::from_secs(5));
    let mut ctx = RenderContext::new();

    c.run_analysis(3, &mut ctx).unwrap();
    c.run_analysis(3, &mut ctx).unwrap();
    c.run_analysis(3, &mut ctx).unwrap();

    let live = c.chart_engine().live();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].spec.data.labels, vec!["西区", "中央区", "北区"]);
    assert_eq!(live[0].spec.data.datasets[2].data, vec!["30.0", "10.0", "80.0"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn stalled_backend_times_out_and_restores_panel() {
    let mut c = controller(Stalled, Duration::from_millis(50));
    let mut ctx = RenderContext::new();

    let err = c.run_analysis(5, &mut ctx).unwrap_err();
    assert!(matches!(err, AnalysisError::Timeout(_)));
    assert_eq!(
        c.notifier_mut().messages,
        vec!["分析がタイムアウトしました。しばらく待ってから再試行してください。"]
    );
    assert!(c.panel().is_idle());
    assert!(!c.panel().results_visible);
    assert!(ctx.is_empty());
}

#[test]
fn server_error_without_message_is_unknown() {
    let mut c = controller(
        Scripted::new(500, "Internal Server Error"),
        Duration::from_secs(5),
    );
    assert!(c.run_analysis(5, &mut RenderContext::new()).is_err());
    assert_eq!(c.notifier_mut().messages, vec!["分析エラー: 不明なエラー"]);
}

#[test]
fn network_failure_uses_generic_prefix() {
    let mut c = controller(Unreachable, Duration::from_secs(5));
    let err = c.run_analysis(5, &mut RenderContext::new()).unwrap_err();
    assert!(err.is_network());

    let messages = c.notifier_mut().drain();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("エラーが発生しました: "));
    assert!(c.panel().is_idle());
}

#[test]
fn malformed_body_is_reported_once() {
    let mut c = controller(
        Scripted::new(200, r#"{"topics": [], "stores": {}}"#),
        Duration::from_secs(5),
    );
    let mut ctx = RenderContext::new();
    let err = c.run_analysis(5, &mut ctx).unwrap_err();

    assert_eq!(err.kind(), "malformed");
    assert_eq!(c.notifier_mut().messages.len(), 1);
    assert!(c.notifier_mut().messages[0].starts_with("エラーが発生しました: "));
    assert!(ctx.is_empty());
}
