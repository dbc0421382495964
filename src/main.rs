//! RAN Assistant CLI
//!
//! Ask questions about RAN configuration data from the command line.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use ran_assistant_core::{CapabilityFamily, ToolInput, Vendor};
use ran_assistant_tools::guidance_message;
use ran_config_assistant::services::{CapabilityClassifier, ClassifierVerdict};
use ran_config_assistant::storage::ConfigService;
use ran_config_assistant::AppState;

#[derive(Parser)]
#[command(name = "ran-assistant")]
#[command(about = "Question answering over RAN configuration data", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.ran-assistant/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question and print the response envelope
    Ask {
        /// Tool to use: network, gpl or misalignment
        #[arg(long, short)]
        family: CapabilityFamily,

        /// Print every sub-question with its attempts instead of the envelope
        #[arg(long)]
        details: bool,

        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show which capability and routes a question resolves to
    Classify {
        #[arg(long, short)]
        family: CapabilityFamily,

        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// List the capability registry
    Capabilities {
        #[arg(long, short)]
        family: Option<CapabilityFamily>,
    },

    /// Check the model and every configured backend
    Health,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_state(config: Option<PathBuf>) -> Result<AppState> {
    let service = match config {
        Some(path) => ConfigService::from_path(path)?,
        None => ConfigService::new()?,
    };
    tracing::debug!(path = %service.path().display(), "configuration loaded");
    Ok(AppState::from_config(service.get_config())?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            family,
            details,
            question,
        } => {
            let state = load_state(cli.config)?;
            let question = question.join(" ");
            let orchestrator = state.orchestrator();
            if details {
                print_json(&orchestrator.answer(family, &question).await)
            } else {
                print_json(&orchestrator.invoke(family, ToolInput::new(question)).await)
            }
        }
        Commands::Classify { family, question } => {
            let state = load_state(cli.config)?;
            let question = question.join(" ");
            let verdict = state
                .classifier()
                .classify(family, &question, Vendor::detect(&question))
                .await?;
            match verdict {
                ClassifierVerdict::Matched(classification) => {
                    let (primary, secondary) = classification.routes();
                    print_json(&json!({
                        "capability": classification.capability.key,
                        "identifier": classification.identifier,
                        "primary": primary,
                        "secondary": secondary,
                    }))
                }
                ClassifierVerdict::Unmatched(failure) => print_json(&json!({
                    "reason": failure.reason,
                    "detail": failure.detail,
                    "guidance": guidance_message(family, &failure),
                })),
            }
        }
        Commands::Capabilities { family } => {
            let registry = ran_assistant_core::CapabilityRegistry::builtin();
            for capability in registry.entries() {
                if family.is_some_and(|f| f != capability.family) {
                    continue;
                }
                println!(
                    "{:<24} {:<20} {:<8} {} -> {}",
                    capability.key,
                    capability.family.tool_name(),
                    capability.vendor.map(|v| v.label()).unwrap_or("-"),
                    capability.primary.table,
                    capability.secondary.table,
                );
            }
            Ok(())
        }
        Commands::Health => {
            let state = load_state(cli.config)?;
            let report = state.health().await;
            print_json(&report)?;
            if !report.is_healthy() {
                bail!("one or more components are unhealthy");
            }
            Ok(())
        }
    }
}
