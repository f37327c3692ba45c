//! # CLI Interface
//!
//! Defines the command-line argument structure for `omniswap` using
//! `clap` derive. Supports three subcommands: `reconcile`, `hash`, and
//! `version`. Every ledger and retry knob can also come from an
//! `OMNISWAP_*` environment variable.

use clap::{Parser, Subcommand};
use std::time::Duration;

use omniswap_protocol::config::{
    LedgerConfig, ReconcilerConfig, DEFAULT_LEDGER_ENDPOINT, LEDGER_REQUEST_TIMEOUT,
    MAX_RECONCILE_ATTEMPTS, RECONCILE_RETRY_DELAY_MS, TRANSACTION_WINDOW,
};
use omniswap_protocol::reconcile::RetryPolicy;

/// Omniswap client.
///
/// Finds the ledger transaction produced by a wallet envelope, or prints
/// the hash an envelope will be matched by.
#[derive(Parser, Debug)]
#[command(
    name = "omniswap",
    about = "Omniswap envelope reconciliation client",
    version,
    propagate_version = true
)]
pub struct OmniswapCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the owner's recent transactions until one was produced by the
    /// envelope, then print its id.
    Reconcile(ReconcileArgs),
    /// Print the content hash of an envelope.
    Hash(HashArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `reconcile` subcommand.
#[derive(Parser, Debug)]
pub struct ReconcileArgs {
    /// Base64 bag-of-cells envelope returned by the wallet.
    #[arg(long, env = "OMNISWAP_BOC")]
    pub boc: String,

    /// Owner (sender wallet) address, raw or user-friendly.
    #[arg(long, short = 'a', env = "OMNISWAP_ADDRESS")]
    pub address: String,

    /// Ledger indexer JSON-RPC endpoint.
    #[arg(long, env = "OMNISWAP_ENDPOINT", default_value = DEFAULT_LEDGER_ENDPOINT)]
    pub endpoint: String,

    /// Indexer API key, sent as `X-API-Key`.
    #[arg(long, env = "OMNISWAP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum number of attempts.
    #[arg(long, env = "OMNISWAP_ATTEMPTS", default_value_t = MAX_RECONCILE_ATTEMPTS)]
    pub attempts: u32,

    /// Delay between attempts, in milliseconds.
    #[arg(long, env = "OMNISWAP_DELAY_MS", default_value_t = RECONCILE_RETRY_DELAY_MS)]
    pub delay_ms: u64,

    /// Number of recent transactions inspected per attempt.
    #[arg(long, env = "OMNISWAP_WINDOW", default_value_t = TRANSACTION_WINDOW)]
    pub window: usize,

    /// Per-request timeout, in milliseconds.
    #[arg(long, env = "OMNISWAP_REQUEST_TIMEOUT_MS", default_value_t = LEDGER_REQUEST_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Log format: "pretty" or "json".
    #[arg(long, env = "OMNISWAP_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Print the result as a JSON object instead of a bare hash.
    #[arg(long)]
    pub json: bool,
}

impl ReconcileArgs {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone().filter(|key| !key.is_empty()),
            request_timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            window: self.window,
            retry: RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_ms)),
        }
    }
}

/// Arguments for the `hash` subcommand.
#[derive(Parser, Debug)]
pub struct HashArgs {
    /// Base64 bag-of-cells envelope.
    #[arg(long, env = "OMNISWAP_BOC")]
    pub boc: String,

    /// Log format: "pretty" or "json".
    #[arg(long, env = "OMNISWAP_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Print the result as a JSON object instead of a bare hash.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        OmniswapCli::command().debug_assert();
    }

    #[test]
    fn reconcile_defaults_match_protocol() {
        let cli = OmniswapCli::try_parse_from([
            "omniswap",
            "reconcile",
            "--boc",
            "te6cckEBAQEAAgAAAEysuc0=",
            "--address",
            "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c",
        ])
        .unwrap();

        let Commands::Reconcile(args) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.reconciler_config(), ReconcilerConfig::default());
        assert_eq!(args.ledger_config().endpoint, DEFAULT_LEDGER_ENDPOINT);
        assert!(!args.json);
    }

    #[test]
    fn reconcile_overrides_map_onto_configs() {
        let cli = OmniswapCli::try_parse_from([
            "omniswap",
            "reconcile",
            "--boc",
            "x",
            "-a",
            "0:00",
            "--attempts",
            "5",
            "--delay-ms",
            "200",
            "--window",
            "10",
            "--api-key",
            "",
            "--timeout-ms",
            "1500",
        ])
        .unwrap();

        let Commands::Reconcile(args) = cli.command else {
            panic!("expected reconcile");
        };
        let reconciler = args.reconciler_config();
        assert_eq!(reconciler.window, 10);
        assert_eq!(reconciler.retry.max_attempts, 5);
        assert_eq!(reconciler.retry.delay, Duration::from_millis(200));

        let ledger = args.ledger_config();
        assert!(ledger.api_key.is_none());
        assert_eq!(ledger.request_timeout, Duration::from_millis(1_500));
    }
}
