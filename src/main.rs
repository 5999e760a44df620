// meetwidget - print today's meetings as JSON
// Thin CLI around the library pipeline

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use log::{error, info};
use meetwidget::utils::logging::{init_logging, log_error_with_context};
use meetwidget::{load_schedule, ScheduleResult, WidgetConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetwidget", version, about = "Show the day's meetings with join links")]
struct Cli {
    /// ICS source: http(s) or webcal URL, file:// URL, or a local path
    source: Option<String>,

    /// Config file (defaults to <config dir>/meetwidget/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Evaluate the schedule at this RFC 3339 instant instead of now
    #[arg(long, value_name = "RFC3339")]
    at: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    let now: DateTime<Local> = match &cli.at {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("--at must be an RFC 3339 timestamp, got '{}'", at))?
            .with_timezone(&Local),
        None => Local::now(),
    };

    let result = match WidgetConfig::load(cli.config.as_deref())
        .and_then(|config| config.source_or(cli.source.as_deref()).map(|source| (config, source)))
    {
        Ok((config, source)) => {
            info!("Loading schedule from {}", source);
            load_schedule(&source, &now, &config).await
        }
        Err(e) => {
            log_error_with_context(&e, "startup");
            ScheduleResult::from(e)
        }
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("failed to serialize schedule")?;
    println!("{}", json);

    if let Some(message) = result.error_message() {
        error!("{}", message);
        std::process::exit(1);
    }

    Ok(())
}
