// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod commands;
mod error;
mod notifier;

#[cfg(test)]
mod tests;

use clap::Parser;
use mukadam_bid_api::{MatchingEngine, SystemClock};
use mukadam_bid_audit::{Actor, Cause};
use mukadam_bid_domain::ScoringWeights;
use mukadam_bid_persistence::Persistence;
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use crate::commands::{Command, execute};
use crate::error::CliError;
use crate::notifier::LogNotifier;

/// Mukadam Bid - operator console for the job matching and bidding engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// JSON file with scoring weights (`rate`, `availability`, `reliability`, `crew`)
    #[arg(short, long, global = true)]
    weights: Option<String>,

    /// Operator recorded as the actor of every change
    #[arg(long, global = true, default_value = "operator")]
    actor: String,

    /// Free-text reason recorded with every change
    #[arg(long, global = true, default_value = "Operator console")]
    note: String,

    #[command(subcommand)]
    command: Command,
}

/// Reads scoring weights from a JSON file. Absent keys keep their defaults.
fn load_weights(path: &str) -> Result<ScoringWeights, CliError> {
    let content: String = std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CliError::InvalidWeights(e.to_string()))
}

fn build_engine(args: &Args) -> Result<MatchingEngine, CliError> {
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let engine: MatchingEngine = MatchingEngine::new(
        persistence,
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    );
    match &args.weights {
        Some(path) => Ok(engine.with_weights(load_weights(path)?)?),
        None => Ok(engine),
    }
}

fn run(args: Args) -> Result<Value, CliError> {
    let engine: MatchingEngine = build_engine(&args)?;
    let actor: Actor = Actor::new(args.actor, String::from("operator"));
    let cause: Cause = Cause::new(format!("cli-{}", args.command.name()), args.note);
    execute(&engine, args.command, &actor, &cause)
}

fn main() -> ExitCode {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let command: &'static str = args.command.name();
    match run(args).and_then(|value| Ok(serde_json::to_string_pretty(&value)?)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(command, error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}
