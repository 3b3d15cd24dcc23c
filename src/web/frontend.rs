//! Server-rendered HTML for the topiclens dashboard.
//!
//! The page shell (styles, form, region containers) is a string template;
//! the region contents come from the section renderers and the chart from
//! the live [`ChartRegistry`](crate::render::chart::ChartRegistry) entries,
//! embedded as Chart.js configs.

use v_htmlescape::escape;

use crate::controller::ControlPanel;
use crate::render::chart::LiveChart;
use crate::render::markup::to_html;
use crate::render::{Region, RenderContext};

/// Everything one page render needs.
pub struct PageView<'a> {
    pub panel: &'a ControlPanel,
    pub ctx: &'a RenderContext,
    pub charts: &'a [LiveChart],
    pub notices: &'a [String],
    pub topic_count: i64,
    pub chart_js_url: &'a str,
}

/// Render the full dashboard page.
pub fn render_page(view: &PageView<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>レシート分析ダッシュボード</title>
<style>{css}</style>
<script src="{chart_js}"></script>
</head>
<body>
<div class="app">
<header>
  <h1>🛒 支店別 買い物トピック分析</h1>
</header>
{notices}
<form class="controls" action="/dashboard" method="get" id="analyzeForm">
  <label for="topicCount">トピック数</label>
  <input type="number" id="topicCount" name="topics" value="{topic_count}" min="2" max="10">
  <button type="submit" id="analyzeBtn"{disabled}>{label}</button>
</form>
<div id="loading" class="loading"{loading_style}>⏳ 分析中です。しばらくお待ちください...</div>
<div id="results"{results_style}>
{sections}
</div>
</div>
<script>{busy_js}</script>
<script>{chart_js_init}</script>
</body>
</html>"#,
        css = INLINE_CSS,
        chart_js = escape(view.chart_js_url),
        notices = render_notices(view.notices),
        topic_count = view.topic_count,
        disabled = if view.panel.trigger_enabled {
            ""
        } else {
            " disabled"
        },
        label = escape(view.panel.trigger_label),
        loading_style = display_style(view.panel.loading_visible),
        results_style = display_style(view.panel.results_visible),
        sections = render_sections(view.ctx),
        busy_js = BUSY_JS,
        chart_js_init = render_chart_scripts(view.charts),
    )
}

fn display_style(visible: bool) -> &'static str {
    if visible {
        r#" style="display:block""#
    } else {
        r#" style="display:none""#
    }
}

fn render_notices(notices: &[String]) -> String {
    notices
        .iter()
        .map(|n| format!(r#"<div class="notice" role="alert">{}</div>"#, escape(n)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_sections(ctx: &RenderContext) -> String {
    Region::ALL
        .iter()
        .map(|&region| {
            let body = to_html(ctx.nodes(region));
            let body = if region == Region::Chart {
                format!(r#"<div class="chart-container">{body}</div>"#)
            } else {
                format!(r#"<div id="{}">{body}</div>"#, region.element_id())
            };
            format!(
                "<section class=\"card\">\n<h2>{}</h2>\n{body}\n</section>",
                region.title()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `new Chart(...)` call per live chart.
fn render_chart_scripts(charts: &[LiveChart]) -> String {
    charts
        .iter()
        .filter_map(|chart| {
            let config = serde_json::to_string(&chart.spec).ok()?;
            let canvas = serde_json::to_string(&chart.canvas).ok()?;
            Some(format!(
                "new Chart(document.getElementById({}).getContext('2d'), {});",
                escape_json_for_script(&canvas),
                escape_json_for_script(&config)
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep JSON from closing the surrounding `<script>` element.
fn escape_json_for_script(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Flip the form into its busy state while the browser waits for the
/// server-rendered result.
const BUSY_JS: &str = r#"
document.getElementById('analyzeForm').addEventListener('submit', function () {
  var btn = document.getElementById('analyzeBtn');
  btn.disabled = true;
  btn.textContent = '分析中...';
  document.getElementById('loading').style.display = 'block';
  document.getElementById('results').style.display = 'none';
});
"#;

const INLINE_CSS: &str = r#"
:root {
  --bg: #f5f7fb;
  --surface: #ffffff;
  --border: #e2e8f0;
  --text: #1f2937;
  --text-muted: #6b7280;
  --accent: #3b82f6;
  --red: #ef4444;
  --radius: 10px;
  --font: -apple-system, BlinkMacSystemFont, 'Hiragino Sans', 'Noto Sans JP', sans-serif;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); line-height: 1.6; }
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
header { margin-bottom: 20px; }
header h1 { font-size: 24px; }
.controls { display: flex; gap: 12px; align-items: center; margin-bottom: 20px; }
.controls input { width: 80px; padding: 6px 8px; border: 1px solid var(--border); border-radius: 6px; }
.controls button {
  padding: 8px 18px; border: none; border-radius: 6px;
  background: var(--accent); color: #fff; font-weight: 600; cursor: pointer;
}
.controls button:disabled { opacity: 0.6; cursor: wait; }
.loading { padding: 16px; color: var(--text-muted); }
.notice { padding: 12px 16px; margin-bottom: 16px; border-radius: 6px; background: #fef2f2; color: var(--red); border: 1px solid #fecaca; }
.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 20px; margin-bottom: 16px; }
.card h2 { font-size: 17px; margin-bottom: 12px; }
#topicsInfo, #wordcloudsContainer { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 12px; }
.topic-card, .wordcloud-card { border: 1px solid var(--border); border-radius: 8px; padding: 12px; }
.topic-card h4, .wordcloud-card h4 { margin-bottom: 6px; }
.products { color: var(--text-muted); font-size: 13px; }
.chart-container { position: relative; height: 400px; }
.wordcloud-image img { width: 100%; border-radius: 6px; }
.wordcloud-info { font-size: 13px; margin-top: 8px; }
.insight-item { padding: 8px 12px; border-left: 3px solid var(--accent); margin-bottom: 8px; background: #f8fafc; }
.error-message { color: var(--text-muted); padding: 12px; }
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model;
    use crate::render::chart::{ChartRegistry, ChartRenderer};
    use crate::render::display_results;

    fn rendered() -> (RenderContext, ChartRegistry) {
        let result = model::parse(
            r#"{
                "summary": {"total_receipts": 120, "total_products": 45, "n_topics": 1},
                "topics": [{"topic_name": "</script><b>", "top_products": ["水"]}],
                "stores": {"中央区": {"topic_ratios": [1.0]}}
            }"#,
        )
        .unwrap();
        let registry = ChartRegistry::new();
        let mut chart = ChartRenderer::new(registry.clone(), Region::Chart.element_id());
        let mut ctx = RenderContext::new();
        display_results(&result, &mut ctx, &mut chart).unwrap();
        (ctx, registry)
    }

    #[test]
    fn page_contains_regions_and_chart_script() {
        let (ctx, registry) = rendered();
        let mut panel = ControlPanel::default();
        panel.results_visible = true;
        let html = render_page(&PageView {
            panel: &panel,
            ctx: &ctx,
            charts: &registry.live(),
            notices: &[],
            topic_count: 5,
            chart_js_url: "https://cdn.jsdelivr.net/npm/chart.js",
        });

        assert!(html.contains(r#"<div id="summaryInfo">"#));
        assert!(html.contains("120件のレシート"));
        assert!(html.contains(r#"<canvas id="storeChart">"#));
        assert!(html.contains("new Chart(document.getElementById(\"storeChart\")"));
        assert!(html.contains(r#"<div id="results" style="display:block">"#));
        assert!(html.contains("🔍 分析開始！</button>"));
    }

    #[test]
    fn topic_names_cannot_break_out_of_script_or_markup() {
        let (ctx, registry) = rendered();
        let html = render_page(&PageView {
            panel: &ControlPanel::default(),
            ctx: &ctx,
            charts: &registry.live(),
            notices: &[],
            topic_count: 5,
            chart_js_url: "chart.js",
        });
        assert!(!html.contains("</script><b>"));
        assert!(html.contains(r#"<\/script><b>"#));
        assert!(html.contains("&lt;&#x2f;script&gt;"));
    }

    #[test]
    fn notices_and_busy_state_are_rendered() {
        let ctx = RenderContext::new();
        let panel = ControlPanel {
            trigger_enabled: false,
            trigger_label: "分析中...",
            loading_visible: true,
            results_visible: false,
        };
        let html = render_page(&PageView {
            panel: &panel,
            ctx: &ctx,
            charts: &[],
            notices: &["分析エラー: 不明なエラー".to_string()],
            topic_count: 3,
            chart_js_url: "chart.js",
        });
        assert!(html.contains(r#"<div class="notice" role="alert">分析エラー: 不明なエラー</div>"#));
        assert!(html.contains(r#"id="analyzeBtn" disabled>"#));
        assert!(html.contains(r#"<div id="loading" class="loading" style="display:block">"#));
        assert!(html.contains(r#"value="3""#));
    }
}
