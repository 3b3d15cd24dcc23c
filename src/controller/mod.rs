//! Analysis request lifecycle.
//!
//! One call to [`AnalysisController::run_analysis`]:
//!
//! 1. puts the control panel into its busy state (trigger disabled, busy
//!    label, results hidden, loading shown),
//! 2. fetches `/analyze` under the client's deadline,
//! 3. renders the five sections in order and reveals the results, or
//!    sends one notification describing the failure,
//! 4. restores the panel to idle.
//!
//! Step 4 is tied to a guard's `Drop`, so it runs on every exit path,
//! including early returns and panics inside a renderer.

use std::time::Instant;

use crate::client::{AnalysisClient, Transport};
use crate::error::Result;
use crate::model::AnalysisResult;
use crate::render::chart::{ChartEngine, ChartRenderer};
use crate::render::{self, RenderContext};

pub const IDLE_LABEL: &str = "🔍 分析開始！";
pub const BUSY_LABEL: &str = "分析中...";

// ---------------------------------------------------------------------------
// Control panel state
// ---------------------------------------------------------------------------

/// The page controls the controller is allowed to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPanel {
    pub trigger_enabled: bool,
    pub trigger_label: &'static str,
    pub loading_visible: bool,
    pub results_visible: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            trigger_enabled: true,
            trigger_label: IDLE_LABEL,
            loading_visible: false,
            results_visible: false,
        }
    }
}

impl ControlPanel {
    pub fn is_idle(&self) -> bool {
        self.trigger_enabled && self.trigger_label == IDLE_LABEL && !self.loading_visible
    }
}

/// Holds the panel busy until dropped.
struct BusyGuard<'a> {
    panel: &'a mut ControlPanel,
}

impl<'a> BusyGuard<'a> {
    fn engage(panel: &'a mut ControlPanel) -> Self {
        panel.trigger_enabled = false;
        panel.trigger_label = BUSY_LABEL;
        panel.results_visible = false;
        panel.loading_visible = true;
        Self { panel }
    }

    fn reveal_results(&mut self) {
        self.panel.results_visible = true;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.panel.trigger_enabled = true;
        self.panel.trigger_label = IDLE_LABEL;
        self.panel.loading_visible = false;
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Receives the single user-visible message for a failed run.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Collects notifications in memory (web page banner, tests).
#[derive(Debug, Default, Clone)]
pub struct CollectedNotices {
    pub messages: Vec<String>,
}

impl Notifier for CollectedNotices {
    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

impl CollectedNotices {
    /// Take all pending messages.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Summary of a completed run, for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: &'static str,
    pub stores: usize,
    pub topics: usize,
}

pub struct AnalysisController<T: Transport, E: ChartEngine, N: Notifier> {
    client: AnalysisClient<T>,
    chart: ChartRenderer<E>,
    notifier: N,
    panel: ControlPanel,
    current: Option<AnalysisResult>,
}

impl<T: Transport, E: ChartEngine, N: Notifier> AnalysisController<T, E, N> {
    pub fn new(client: AnalysisClient<T>, chart: ChartRenderer<E>, notifier: N) -> Self {
        Self {
            client,
            chart,
            notifier,
            panel: ControlPanel::default(),
            current: None,
        }
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn client(&self) -> &AnalysisClient<T> {
        &self.client
    }

    pub fn chart_engine(&self) -> &E {
        self.chart.engine()
    }

    /// The result currently on screen.
    pub fn current(&self) -> Option<&AnalysisResult> {
        self.current.as_ref()
    }

    /// Run one analysis and render it into `ctx`.
    ///
    /// Failures are reported through the notifier and also returned.
    pub fn run_analysis(
        &mut self,
        topic_count: i64,
        ctx: &mut RenderContext,
    ) -> Result<RunReport> {
        let start = Instant::now();
        let mut busy = BusyGuard::engage(&mut self.panel);

        let outcome = self.client.analyze(topic_count).and_then(|result| {
            render::display_results(&result, ctx, &mut self.chart)?;
            busy.reveal_results();
            Ok(result)
        });
        let latency_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                log::info!(
                    "analysis rendered - topics={}, stores={}, latency={}ms",
                    result.topics.len(),
                    result.stores.len(),
                    latency_ms
                );
                let report = RunReport {
                    outcome: "rendered",
                    stores: result.stores.len(),
                    topics: result.topics.len(),
                };
                self.current = Some(result);
                Ok(report)
            }
            Err(err) => {
                log::error!(
                    "analysis failed ({}) after {latency_ms}ms: {err}",
                    err.kind()
                );
                self.current = None;
                self.notifier.notify(&err.user_message());
                Err(err)
            }
        }
    }

    /// Back to a freshly loaded page: idle panel, no result, no live chart.
    pub fn reset(&mut self) {
        self.chart.clear();
        self.panel = ControlPanel::default();
        self.current = None;
    }

    /// Render a previously saved result, if the backend has one.
    ///
    /// "Nothing saved" is the normal case and stays silent; other failures
    /// are logged and otherwise ignored.
    pub fn restore_saved(&mut self, ctx: &mut RenderContext) -> bool {
        let restored: Result<Option<AnalysisResult>> =
            self.client.fetch_saved().and_then(|saved| {
                let Some(result) = saved else {
                    return Ok(None);
                };
                render::display_results(&result, ctx, &mut self.chart)?;
                Ok(Some(result))
            });

        match restored {
            Ok(Some(result)) => {
                self.panel.results_visible = true;
                self.current = Some(result);
                true
            }
            Ok(None) => false,
            Err(err) => {
                log::warn!("could not restore saved result: {err}");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
