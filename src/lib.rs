//! legacy-send - repeated legacy memo transactions through a wallet context
//!
//! Drives a fixed-count demo loop that builds, signs, sends and confirms a
//! memo transaction per attempt, reporting per-attempt notifications and
//! aggregate confirmation timing once the run completes.

pub mod config;
pub mod network;
pub mod notify;
pub mod runner;
pub mod transaction;
pub mod trigger;
pub mod wallet;

pub use config::{ConfigError, Settings};
pub use network::{BlockhashConfirmation, LatestBlockhash, NetworkClient, NetworkError, SendOptions};
pub use notify::{Notification, Notifier, NotifyLevel, RecordingNotifier, TracingNotifier};
pub use runner::{run_legacy_batch, start_run, CancelToken, RunConfig, RunContext, RunHandle, RunSummary};
pub use trigger::{TriggerControl, TriggerError};
pub use wallet::{KeypairWallet, TransactionVersion, WalletContext, WalletError};

use thiserror::Error;

/// Error types for legacy-send operations
#[derive(Error, Debug)]
pub enum LegacySendError {
    #[error(transparent)]
    Wallet(#[from] wallet::WalletError),

    #[error(transparent)]
    Network(#[from] network::NetworkError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Number of attempts a single activation performs
pub const DEFAULT_NUM_TRIES: u32 = 10;

/// Pause after each confirmed attempt, in milliseconds
pub const DEFAULT_ATTEMPT_DELAY_MS: u64 = 10_000;

/// Public devnet endpoint
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
