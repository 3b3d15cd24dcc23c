//! Section renderers for the analysis dashboard.
//!
//! Each renderer is a pure function from (part of) an [`AnalysisResult`] to
//! markup nodes. Writing those nodes into the page goes through a
//! [`RenderContext`], which only exposes the five named result regions.
//! The chart is the one stateful renderer: it owns the live chart handle
//! and releases it before drawing again (see [`chart::ChartRenderer`]).

pub mod chart;
pub mod insights;
pub mod markup;
pub mod palette;
pub mod summary;
pub mod topics;
pub mod wordcloud;

use thiserror::Error;

use crate::model::AnalysisResult;

use chart::{ChartEngine, ChartRenderer};
use markup::Node;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chart engine rejected the chart: {0}")]
    Chart(String),
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Page regions a renderer may write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Summary,
    Topics,
    Chart,
    Wordclouds,
    Insights,
}

impl Region {
    /// Render order, which is also display order.
    pub const ALL: [Region; 5] = [
        Region::Summary,
        Region::Topics,
        Region::Chart,
        Region::Wordclouds,
        Region::Insights,
    ];

    /// DOM id of the region's container.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::Summary => "summaryInfo",
            Self::Topics => "topicsInfo",
            Self::Chart => "storeChart",
            Self::Wordclouds => "wordcloudsContainer",
            Self::Insights => "insights",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Summary => "📊 分析サマリー",
            Self::Topics => "🎯 発見された買い物トピック",
            Self::Chart => "📈 支店別トピック分布",
            Self::Wordclouds => "☁️ 支店別ワードクラウド",
            Self::Insights => "💡 分析インサイト",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Summary => 0,
            Self::Topics => 1,
            Self::Chart => 2,
            Self::Wordclouds => 3,
            Self::Insights => 4,
        }
    }
}

/// The result regions of one page, handed to renderers explicitly.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    regions: [Vec<Node>; 5],
}

/// Write access to exactly one region.
pub struct RegionSlot<'a> {
    nodes: &'a mut Vec<Node>,
}

impl RegionSlot<'_> {
    /// Replace the region's content (never appends to a previous render).
    pub fn replace(self, nodes: Vec<Node>) {
        *self.nodes = nodes;
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&mut self, region: Region) -> RegionSlot<'_> {
        RegionSlot {
            nodes: &mut self.regions[region.slot()],
        }
    }

    pub fn nodes(&self, region: Region) -> &[Node] {
        &self.regions[region.slot()]
    }

    pub fn is_empty(&self) -> bool {
        self.regions.iter().all(Vec::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Render all five sections in order: summary, topics, chart, word clouds,
/// insights. The first failing section aborts the rest.
pub fn display_results<E: ChartEngine>(
    result: &AnalysisResult,
    ctx: &mut RenderContext,
    chart: &mut ChartRenderer<E>,
) -> Result<(), RenderError> {
    ctx.region(Region::Summary)
        .replace(summary::render(&result.summary));
    ctx.region(Region::Topics).replace(topics::render(&result.topics));
    let canvas = chart.render(result)?;
    ctx.region(Region::Chart).replace(canvas);
    ctx.region(Region::Wordclouds)
        .replace(wordcloud::render(result.store_wordclouds.as_ref()));
    ctx.region(Region::Insights).replace(insights::render(result));
    Ok(())
}
