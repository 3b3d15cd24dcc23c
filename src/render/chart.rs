//! Store × topic bar chart.
//!
//! [`build_chart_spec`] is pure: one dataset per topic, one value per store
//! in document order. Drawing goes through a [`ChartEngine`]; the
//! [`ChartRenderer`] keeps the handle of the chart it last created and
//! destroys it before creating the next one, so repeated renders leave a
//! single live chart.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;

use crate::insights::format_percent;
use crate::model::AnalysisResult;

use super::RenderError;
use super::markup::{Element, Node};
use super::palette::{BORDER_ALPHA, FILL_ALPHA, topic_color};

pub const CHART_TITLE: &str = "支店別トピック分布（%）";
const BORDER_WIDTH: u32 = 2;

// ---------------------------------------------------------------------------
// Chart specification (Chart.js config shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// Category axis: store names in document order.
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    /// Percentages with one decimal, one per label.
    pub data: Vec<String>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

/// Build the chart config for a result.
///
/// A store missing a ratio for some topic gets `"0.0"` there, keeping every
/// dataset the same length as `labels`.
pub fn build_chart_spec(result: &AnalysisResult) -> ChartSpec {
    let labels: Vec<String> = result.store_names().map(str::to_string).collect();

    let datasets = result
        .topics
        .iter()
        .enumerate()
        .map(|(index, topic)| Dataset {
            label: topic.topic_name.clone(),
            data: result
                .stores
                .iter()
                .map(|(_, stats)| {
                    format_percent(stats.topic_ratios.get(index).copied().unwrap_or(0.0))
                })
                .collect(),
            background_color: topic_color(index, FILL_ALPHA),
            border_color: topic_color(index, BORDER_ALPHA),
            border_width: BORDER_WIDTH,
        })
        .collect();

    ChartSpec {
        kind: "bar",
        data: ChartData { labels, datasets },
        options: chart_options(),
    }
}

fn chart_options() -> serde_json::Value {
    json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": {
            "title": { "display": true, "text": CHART_TITLE, "font": { "size": 16 } },
            "legend": { "position": "top" }
        },
        "scales": {
            "x": { "title": { "display": true, "text": "支店" } },
            "y": { "title": { "display": true, "text": "割合（%）" }, "beginAtZero": true }
        }
    })
}

// ---------------------------------------------------------------------------
// Engine seam
// ---------------------------------------------------------------------------

/// A live chart that must be released before its canvas is reused.
pub trait ChartHandle {
    fn destroy(self);
}

/// Something that can draw a [`ChartSpec`] onto a named canvas.
pub trait ChartEngine {
    type Handle: ChartHandle;

    fn create(&mut self, canvas: &str, spec: &ChartSpec) -> Result<Self::Handle, RenderError>;
}

/// Owns the chart drawn by the previous render.
pub struct ChartRenderer<E: ChartEngine> {
    engine: E,
    canvas: String,
    current: Option<E::Handle>,
}

impl<E: ChartEngine> ChartRenderer<E> {
    pub fn new(engine: E, canvas: impl Into<String>) -> Self {
        Self {
            engine,
            canvas: canvas.into(),
            current: None,
        }
    }

    /// Release the previous chart, draw a new one, and return the canvas
    /// markup for the chart region.
    pub fn render(&mut self, result: &AnalysisResult) -> Result<Vec<Node>, RenderError> {
        if let Some(previous) = self.current.take() {
            previous.destroy();
        }

        let spec = build_chart_spec(result);
        let handle = self.engine.create(&self.canvas, &spec)?;
        self.current = Some(handle);

        Ok(vec![
            Element::new("canvas")
                .attr("id", self.canvas.as_str())
                .into(),
        ])
    }

    /// Release the current chart, if any.
    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.destroy();
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

// ---------------------------------------------------------------------------
// In-process registry engine
// ---------------------------------------------------------------------------

/// A chart registered with a [`ChartRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub struct LiveChart {
    pub canvas: String,
    pub spec: ChartSpec,
}

/// Chart engine that keeps live chart specs in memory.
///
/// Page adapters read the live charts back out: the web dashboard embeds
/// them as Chart.js configs and the terminal prints them as tables.
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct ChartRegistry {
    charts: Rc<RefCell<BTreeMap<u64, LiveChart>>>,
    next_id: Rc<RefCell<u64>>,
}

pub struct RegisteredChart {
    id: u64,
    charts: Rc<RefCell<BTreeMap<u64, LiveChart>>>,
}

impl ChartHandle for RegisteredChart {
    fn destroy(self) {
        self.charts.borrow_mut().remove(&self.id);
    }
}

impl ChartEngine for ChartRegistry {
    type Handle = RegisteredChart;

    fn create(&mut self, canvas: &str, spec: &ChartSpec) -> Result<RegisteredChart, RenderError> {
        let mut charts = self.charts.borrow_mut();
        if charts.values().any(|c| c.canvas == canvas) {
            return Err(RenderError::Chart(format!(
                "canvas '{canvas}' is already in use"
            )));
        }

        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            *next
        };
        charts.insert(
            id,
            LiveChart {
                canvas: canvas.to_string(),
                spec: spec.clone(),
            },
        );

        Ok(RegisteredChart {
            id,
            charts: Rc::clone(&self.charts),
        })
    }
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> Vec<LiveChart> {
        self.charts.borrow().values().cloned().collect()
    }

    pub fn live_count(&self) -> usize {
        self.charts.borrow().len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
