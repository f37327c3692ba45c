// Copyright (c) 2026 Omniswap Contributors. MIT License.
// See LICENSE for details.

//! # Omniswap Client
//!
//! Entry point for the `omniswap` binary. Parses CLI arguments, initializes
//! logging, and runs one of three subcommands:
//!
//! - `reconcile`: find the transaction a wallet envelope produced
//! - `hash`: print the content hash of an envelope
//! - `version`: print build version information
//!
//! Results go to stdout, logs to stderr. A failed reconciliation exits
//! non-zero.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use omniswap_protocol::cell::decode_base64;
use omniswap_protocol::ledger::ToncenterClient;
use omniswap_protocol::message::Message;
use omniswap_protocol::reconcile::{HashReconciler, ReconcileRequest};

use cli::{Commands, HashArgs, OmniswapCli, ReconcileArgs};
use logging::LogFormat;

/// Default `EnvFilter` directives when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "omniswap=info,omniswap_protocol=info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = OmniswapCli::parse();

    match cli.command {
        Commands::Reconcile(args) => reconcile(args).await,
        Commands::Hash(args) => hash(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Resolves an envelope to its transaction id and prints it.
async fn reconcile(args: ReconcileArgs) -> Result<()> {
    logging::init_logging(DEFAULT_LOG_FILTER, LogFormat::from_str_lossy(&args.log_format));

    let request = ReconcileRequest::parse(&args.boc, &args.address)
        .context("invalid reconcile arguments")?;
    let ledger_config = args.ledger_config();
    let reconciler_config = args.reconciler_config();

    tracing::info!(
        endpoint = %ledger_config.endpoint,
        owner = %request.owner,
        envelope = %request.target,
        attempts = reconciler_config.retry.attempts(),
        delay_ms = reconciler_config.retry.delay.as_millis() as u64,
        window = reconciler_config.window,
        "searching for envelope transaction"
    );

    let ledger = ToncenterClient::new(ledger_config).context("failed to build ledger client")?;
    let reconciler = HashReconciler::new(ledger, reconciler_config);
    let tx = reconciler
        .reconcile_request(&request)
        .await
        .context("envelope could not be matched to a transaction")?;

    if args.json {
        let out = serde_json::json!({
            "transaction_id": tx.to_hex(),
            "envelope_hash": request.target.to_hex(),
            "owner": request.owner.to_string(),
        });
        println!("{out}");
    } else {
        println!("{tx}");
    }
    Ok(())
}

/// Prints the content hash of an envelope.
fn hash(args: HashArgs) -> Result<()> {
    logging::init_logging(DEFAULT_LOG_FILTER, LogFormat::from_str_lossy(&args.log_format));

    let root = decode_base64(&args.boc).context("failed to decode envelope")?;
    let message = Message::from_cell(&root).ok();
    if let Some(message) = &message {
        tracing::debug!(kind = %message.kind(), "envelope decoded as a message");
    }

    if args.json {
        let out = serde_json::json!({
            "hash": root.hash().to_hex(),
            "kind": message.as_ref().map(|m| m.kind().to_string()),
            "destination": message
                .as_ref()
                .and_then(|m| m.info.destination())
                .map(|a| a.to_string()),
        });
        println!("{out}");
    } else {
        println!("{}", root.hash());
    }
    Ok(())
}

/// Prints version information for the binary and protocol crate.
fn print_version() {
    println!("omniswap {}", env!("CARGO_PKG_VERSION"));
    println!("protocol {}", omniswap_protocol::config::PROTOCOL_VERSION);
    println!("rustc    {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
