use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use topiclens::{cli, config, run, web};

#[derive(Debug, Parser)]
#[command(name = "topiclens")]
#[command(about = "Receipt topic analysis dashboard")]
#[command(version)]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one analysis against the backend and print the dashboard
    Analyze {
        /// Number of topics to extract (backend accepts 2-10)
        #[arg(long, allow_negative_numbers = true)]
        topics: Option<i64>,
        /// Output format: table (default), json, html
        #[arg(long, default_value = "table")]
        format: String,
        /// Write the json or html report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve the web dashboard
    Serve {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Show past analysis runs
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Show at most N most recent runs
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Check config files and backend reachability
    Health,
    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.topiclens/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let app = App::parse();

    let level = config::load().logging.level;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match app.command {
        Commands::Analyze {
            topics,
            format,
            output,
        } => {
            let fmt = cli::ReportFormat::from_str_opt(Some(&format));
            run::execute(topics, fmt, output.as_deref())
        }
        Commands::Serve { addr } => web::serve(addr.as_deref()),
        Commands::History { format, limit } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, limit)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
        },
    }
}
