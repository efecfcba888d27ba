//! OpsTriage command-line interface.
//!
//! Wires the configuration, the demo incident dataset and the resolution
//! pipeline into a handful of subcommands. Reports print as pretty JSON;
//! chat prints chunks as they arrive.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use triage_agents::{data, Orchestrator};
use triage_core::config::Config;
use triage_core::incident::IncidentStore;

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "Incident evidence aggregation and resolution reports"
)]
struct Cli {
    /// Emit logs as JSON instead of human-readable lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the seeded incidents.
    Incidents,
    /// Run the resolution pipeline for an incident.
    Resolve {
        /// Incident id (e.g. INC001).
        #[arg(short, long)]
        incident: String,
        /// Optional free-text question to focus the summary.
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Ask a question about an incident; the answer streams in.
    Chat {
        /// Incident id (e.g. INC001).
        #[arg(short, long)]
        incident: String,
        /// The question to ask.
        #[arg(short, long)]
        message: String,
    },
    /// Update the status of an incident.
    Status {
        /// Incident id (e.g. INC001).
        #[arg(short, long)]
        incident: String,
        /// New status: open, investigating or resolved.
        #[arg(short, long)]
        status: String,
    },
    /// Inspect or clear the result cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Print the retrieval accuracy report.
    Accuracy,
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Cache entry count and pipeline counters.
    Stats,
    /// Drop all cached evidence and exclusion state.
    Clear,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = Config::from_env().context("failed to load configuration")?;
    let store = Arc::new(IncidentStore::with_incidents(data::demo_incidents()));
    let orchestrator =
        Orchestrator::from_config(&config, Arc::clone(&store)).context("failed to assemble pipeline")?;

    match cli.command {
        Command::Incidents => {
            println!("{}", serde_json::to_string_pretty(&store.list())?);
        }
        Command::Resolve { incident, query } => {
            let report = orchestrator.resolve(&incident, &query).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Chat { incident, message } => {
            let mut stream = orchestrator.chat_stream(&incident, &message, &[]).await?;
            let mut stdout = std::io::stdout();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(text) => {
                        stdout.write_all(text.as_bytes())?;
                        stdout.flush()?;
                    }
                    Err(e) => {
                        eprintln!("\nchat stream error: {e}");
                        break;
                    }
                }
            }
            println!();
        }
        Command::Status { incident, status } => {
            let status = status.parse()?;
            let updated = store.update_status(&incident, status)?;
            // Cached evidence may reference the old status.
            orchestrator.cache().invalidate(&incident);
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Command::Cache { command } => match command {
            CacheCommand::Stats => {
                let stats = serde_json::json!({
                    "cached_incidents": orchestrator.cache().len(),
                    "pipeline": orchestrator.stats(),
                });
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            CacheCommand::Clear => {
                orchestrator.cache().clear();
                info!("Result cache cleared");
                println!("cache cleared");
            }
        },
        Command::Accuracy => {
            let report = orchestrator.cache().accuracy_report();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
