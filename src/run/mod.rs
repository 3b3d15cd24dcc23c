use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analytics::logger::{RunLogEntry, log_run};
use crate::cli::{self, ConsoleNotifier, ReportFormat};
use crate::client::AnalysisClient;
use crate::config::{self, TopiclensConfig};
use crate::controller::{AnalysisController, ControlPanel, RunReport};
use crate::insights::{self, InsightFact};
use crate::model::AnalysisResult;
use crate::render::chart::{ChartRegistry, ChartRenderer, ChartSpec, build_chart_spec};
use crate::render::{Region, RenderContext};
use crate::web::frontend::{PageView, render_page};

/// Machine-readable dashboard: the model, its chart config and insights.
#[derive(Debug, Serialize)]
pub struct DashboardReport<'a> {
    pub result: &'a AnalysisResult,
    pub chart: ChartSpec,
    pub insights: Vec<String>,
    pub facts: Vec<InsightFact>,
}

impl<'a> DashboardReport<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        let facts = insights::derive(result);
        Self {
            result,
            chart: build_chart_spec(result),
            insights: facts.iter().map(ToString::to_string).collect(),
            facts,
        }
    }
}

/// Run one analysis from the command line and print the dashboard.
///
/// This is the entry point for `topiclens analyze`:
///
/// 1. Runs the analysis through the same controller the web dashboard uses
/// 2. Appends the outcome to `~/.topiclens/run-log.jsonl`
/// 3. Prints the dashboard as a table, JSON, or a standalone HTML page
pub fn execute(topics: Option<i64>, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let cfg = config::load();
    let topic_count = topics.unwrap_or(i64::from(cfg.dashboard.default_topics));

    let registry = ChartRegistry::new();
    let mut controller = AnalysisController::new(
        AnalysisClient::from_config(&cfg.backend),
        ChartRenderer::new(registry.clone(), Region::Chart.element_id()),
        ConsoleNotifier,
    );

    let mut ctx = RenderContext::new();
    let start = Instant::now();
    let outcome = controller.run_analysis(topic_count, &mut ctx);
    let latency_ms = start.elapsed().as_millis() as u64;

    if cfg.logging.run_log {
        log_run(&run_log_entry(topic_count, &outcome, latency_ms));
    }

    if let Err(err) = outcome {
        anyhow::bail!("analysis failed ({})", err.kind());
    }

    let Some(result) = controller.current() else {
        anyhow::bail!("analysis produced no result");
    };

    let rendered = match format {
        ReportFormat::Table => {
            cli::print_dashboard(&ctx, &registry);
            return Ok(());
        }
        ReportFormat::Json => serde_json::to_string_pretty(&DashboardReport::new(result))
            .context("failed to serialize dashboard")?,
        ReportFormat::Html => {
            render_standalone_page(&cfg, topic_count, controller.panel(), &ctx, &registry)
        }
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => {
            std::io::stdout()
                .write_all(rendered.as_bytes())
                .context("failed writing dashboard to stdout")?;
        }
    }

    Ok(())
}

fn render_standalone_page(
    cfg: &TopiclensConfig,
    topic_count: i64,
    panel: &ControlPanel,
    ctx: &RenderContext,
    registry: &ChartRegistry,
) -> String {
    render_page(&PageView {
        panel,
        ctx,
        charts: &registry.live(),
        notices: &[],
        topic_count,
        chart_js_url: &cfg.web.chart_js_url,
    })
}

pub(crate) fn run_log_entry(
    topic_count: i64,
    outcome: &crate::error::Result<RunReport>,
    latency_ms: u64,
) -> RunLogEntry {
    match outcome {
        Ok(report) => {
            let mut entry = RunLogEntry::new(topic_count, report.outcome, latency_ms);
            entry.stores = report.stores;
            entry.topics = report.topics;
            entry
        }
        Err(err) => {
            let mut entry = RunLogEntry::new(topic_count, err.kind(), latency_ms);
            entry.message = Some(err.user_message());
            entry
        }
    }
}
