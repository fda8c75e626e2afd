//! `settleup`: settle a group's debts from a JSON document.
//!
//! Seeds an in-memory ledger from the input, runs (or previews) one
//! settlement, and prints the report as JSON on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use settleup_ledger::{MemoryLedgerStore, SettlementEngine};
use settleup_types::EngineConfig;

mod input;
mod logging;

use input::SettleInput;

#[derive(Parser)]
#[command(name = "settleup", version)]
#[command(about = "SettleUp - minimal transfers to clear a group's debts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and apply the settlement for one group
    Settle(SettleArgs),
}

#[derive(Args)]
struct SettleArgs {
    /// Input document: group id, existing ledger rows, ad-hoc obligations
    #[arg(short, long)]
    input: PathBuf,

    /// Engine config (JSON); missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compute the transfers without writing them
    #[arg(long)]
    dry_run: bool,

    /// Override the dust threshold
    #[arg(long)]
    epsilon: Option<Decimal>,

    /// Override the group lock timeout
    #[arg(long)]
    lock_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_logs, cli.verbose);

    match cli.command {
        Commands::Settle(args) => settle(args).await,
    }
}

async fn settle(args: SettleArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.epsilon, args.lock_timeout_ms).await?;

    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading input {}", args.input.display()))?;
    let input = SettleInput::from_json(&raw)
        .with_context(|| format!("parsing input {}", args.input.display()))?;

    let store = Arc::new(MemoryLedgerStore::new());
    let seeded = input.seed(&store).await.context("seeding ledger")?;
    tracing::debug!(group = %input.group_id, rows = seeded, "Ledger seeded");

    let engine = SettlementEngine::new(store, config)?;
    let report = if args.dry_run {
        engine
            .preview_settlement(&input.group_id, &input.obligations)
            .await?
    } else {
        engine
            .run_settlement(&input.group_id, &input.obligations)
            .await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn load_config(
    path: Option<&Path>,
    epsilon: Option<Decimal>,
    lock_timeout_ms: Option<u64>,
) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json(&raw)?
        }
        None => EngineConfig::default(),
    };
    if let Some(epsilon) = epsilon {
        config.balance_epsilon = epsilon;
    }
    if let Some(ms) = lock_timeout_ms {
        config.lock_timeout_ms = ms;
    }
    config.validate()?;
    Ok(config)
}
