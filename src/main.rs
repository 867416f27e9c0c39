//! travel-assistant CLI
//!
//! Takes a free-text travel request, answers it with the start and
//! destination places plus their current weather, and prints the result.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

use travel_assistant::config::{AssistantConfig, ExtractionMode};
use travel_assistant::error::AssistantError;
use travel_assistant::orchestrator::QueryOrchestrator;
use travel_assistant::{logging, presentation};

/// Answer travel questions with places and current weather
///
/// Examples:
///   travel-assistant I want to go to Taipei 101
///   travel-assistant --mode tool-calling "From Banqiao to Taipei 101"
#[derive(Parser, Debug)]
#[command(name = "travel-assistant")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// The travel request, in your own words
    #[arg(value_name = "QUERY", required = true)]
    query: Vec<String>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How the language model is used; overrides the configured mode
    #[arg(short, long, value_enum)]
    mode: Option<ExtractionMode>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AssistantError>() {
                Some(app_err) => eprintln!("{}\n  caused by: {e:#}", app_err.user_message()),
                None => eprintln!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let query = query_text(&cli.query)?;

    let mut config = AssistantConfig::load_from_path(cli.config)?;
    if let Some(mode) = cli.mode {
        config.llm.mode = mode;
    }

    logging::init(&config.logging, cli.verbose)?;

    let orchestrator = QueryOrchestrator::from_config(&config)?;
    let started = Instant::now();
    info!(mode = ?orchestrator.mode(), "Answering travel query");

    match orchestrator.answer(&query).await {
        Ok(reply) => {
            println!("{}", presentation::render_reply(&reply));
            info!("Answered in {:.3}s", started.elapsed().as_secs_f64());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Travel query failed");
            bail!(presentation::render_error(&e))
        }
    }
}

/// Join the query words, rejecting input with nothing to ask
fn query_text(words: &[String]) -> Result<String, AssistantError> {
    let query = words.join(" ");
    let query = query.trim();
    if query.is_empty() {
        return Err(AssistantError::validation("please enter a travel request"));
    }
    Ok(query.to_string())
}
