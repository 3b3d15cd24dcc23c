//! CLI command implementations for topiclens.
//!
//! Provides subcommand handlers for:
//! - `topiclens analyze`: terminal rendering of the dashboard (see [`print_dashboard`])
//! - `topiclens history`: past analysis runs from the run log
//! - `topiclens health`: config files and backend reachability
//! - `topiclens config show|init`: configuration management

use anyhow::Result;
use colored::Colorize;

use crate::analytics::logger::{self, RunLogEntry};
use crate::client::AnalysisClient;
use crate::config;
use crate::controller::Notifier;
use crate::render::chart::{ChartRegistry, ChartSpec};
use crate::render::markup::text_lines;
use crate::render::{Region, RenderContext};

/// Output format for the run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Output format for `topiclens analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Json,
    Html,
}

impl ReportFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("html") => Self::Html,
            _ => Self::Table,
        }
    }
}

/// Prints failure notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str) {
        eprintln!("{}", message.red().bold());
    }
}

// ---------------------------------------------------------------------------
// topiclens analyze (table output)
// ---------------------------------------------------------------------------

/// Print every rendered region, with the live chart as a table.
pub fn print_dashboard(ctx: &RenderContext, charts: &ChartRegistry) {
    for region in Region::ALL {
        println!("{}", region.title().bold().cyan());
        println!("{}", "=".repeat(60));

        if region == Region::Chart {
            for chart in charts.live() {
                for line in chart_table(&chart.spec) {
                    println!("  {line}");
                }
            }
        } else {
            for line in text_lines(ctx.nodes(region)) {
                println!("  {line}");
            }
        }
        println!();
    }
}

/// Stores as rows, topics as columns, percentages in cells.
fn chart_table(spec: &ChartSpec) -> Vec<String> {
    let mut header = pad("支店", 10);
    for dataset in &spec.data.datasets {
        header.push_str(&format!(" {}", pad_left(&truncate(&dataset.label, 12), 12)));
    }

    let mut lines = vec![header, "-".repeat(10 + 13 * spec.data.datasets.len())];
    for (row, store) in spec.data.labels.iter().enumerate() {
        let mut line = pad(&truncate(store, 10), 10);
        for dataset in &spec.data.datasets {
            let value = dataset.data.get(row).map(String::as_str).unwrap_or("-");
            line.push_str(&format!(" {:>12}", format!("{value}%")));
        }
        lines.push(line);
    }
    lines
}

// ---------------------------------------------------------------------------
// topiclens history
// ---------------------------------------------------------------------------

/// Show recent analysis runs.
pub fn run_history(format: OutputFormat, limit: usize) -> Result<()> {
    let entries = logger::read_all_entries();

    if entries.is_empty() {
        println!(
            "{}",
            "No runs yet. Run `topiclens analyze` or use the dashboard.".yellow()
        );
        return Ok(());
    }

    let skip = entries.len().saturating_sub(limit);
    let recent = &entries[skip..];

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(recent)?),
        OutputFormat::Csv => print_history_csv(recent),
        OutputFormat::Table => print_history_table(recent),
    }

    Ok(())
}

fn print_history_table(entries: &[RunLogEntry]) {
    println!("{}", "topiclens Run History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<20} {:>6} {:<10} {:>10} {:>6}",
        "Time", "Topics", "Outcome", "Latency", "Stores"
    );
    println!("  {}", "-".repeat(58));

    for (i, entry) in entries.iter().rev().enumerate() {
        let line = format!(
            "  {:<20} {:>6} {:<10} {:>9}ms {:>6}",
            truncate(&entry.timestamp.replace('T', " "), 19),
            entry.topic_count,
            entry.outcome,
            format_number(entry.latency_ms),
            entry.stores,
        );
        let line = if !entry.succeeded() {
            line.red().to_string()
        } else if i % 2 == 1 {
            line.dimmed().to_string()
        } else {
            line
        };
        println!("{line}");
    }
}

fn print_history_csv(entries: &[RunLogEntry]) {
    println!("timestamp,topic_count,outcome,latency_ms,stores,topics");
    for e in entries {
        println!(
            "{},{},{},{},{},{}",
            e.timestamp, e.topic_count, e.outcome, e.latency_ms, e.stores, e.topics,
        );
    }
}

// ---------------------------------------------------------------------------
// topiclens health
// ---------------------------------------------------------------------------

/// Check config files and whether the backend answers.
pub fn run_health() -> Result<()> {
    println!("{}", "topiclens Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.topiclens/config.toml found"
        } else {
            "not found (run `topiclens config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".topiclens.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = AnalysisClient::from_config(&cfg.backend);
    let reachable = client.is_reachable();
    print_health_item(
        "Analysis backend",
        reachable,
        &if reachable {
            format!("reachable at {}", client.base_url())
        } else {
            format!("not reachable at {} (is the backend running?)", client.base_url())
        },
    );
    print_health_item(
        "Request deadline",
        true,
        &format!("{}s", cfg.backend.timeout_secs),
    );
    print_health_item(
        "Saved-result restore",
        true,
        if cfg.backend.restore_saved {
            "on (single-user deployments only)"
        } else {
            "off"
        },
    );

    let log_exists = logger::run_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Run log",
        cfg.logging.run_log,
        match (cfg.logging.run_log, log_exists) {
            (false, _) => "disabled",
            (true, true) => "~/.topiclens/run-log.jsonl",
            (true, false) => "no runs recorded yet",
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// topiclens config show | init
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective topiclens Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.topiclens/config.toml", global_exists);
    print_source(".topiclens.toml", project_exists);
    println!("  {} TOPICLENS_* environment variables", "·".dimmed());

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Write the default configuration file.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at your analysis backend.".dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_len.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Terminal column width: CJK characters occupy two cells.
fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| if (c as u32) >= 0x1100 { 2 } else { 1 })
        .sum()
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{s}{}", " ".repeat(fill))
}

fn pad_left(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{}{s}", " ".repeat(fill))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model;
    use crate::render::chart::build_chart_spec;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(60000), "60,000");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("中央区", 10), "中央区");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(ReportFormat::from_str_opt(Some("html")), ReportFormat::Html);
        assert_eq!(ReportFormat::from_str_opt(Some("xml")), ReportFormat::Table);
    }

    #[test]
    fn cjk_padding_accounts_for_double_width() {
        assert_eq!(display_width("北区"), 4);
        assert_eq!(pad("北区", 6), "北区  ");
        assert_eq!(pad_left("ab", 4), "  ab");
    }

    #[test]
    fn chart_table_has_row_per_store() {
        let result = model::parse(
            r#"{
                "summary": {"total_receipts": 2, "total_products": 2, "n_topics": 2},
                "topics": [{"topic_name": "t1"}, {"topic_name": "t2"}],
                "stores": {"北区": {"topic_ratios": [0.25, 0.75]}, "西区": {"topic_ratios": [1.0, 0.0]}}
            }"#,
        )
        .unwrap();

        let lines = chart_table(&build_chart_spec(&result));
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("北区"));
        assert!(lines[2].contains("25.0%"));
        assert!(lines[3].contains("100.0%"));
    }
}
