//! Run procedure
//!
//! One activation runs a fixed number of sequential attempts. Each attempt
//! validates the wallet, fetches a blockhash, builds a memo transaction, lets
//! the wallet sign and submit it, then waits for confirmation. Failures are
//! caught per attempt and counted as skipped; the run itself never fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::network::{BlockhashConfirmation, NetworkClient, SendOptions};
use crate::notify::{Notifier, NotifyLevel};
use crate::transaction::build_legacy_memo_transaction;
use crate::wallet::{check_legacy_support, WalletContext};
use crate::{LegacySendError, DEFAULT_ATTEMPT_DELAY_MS, DEFAULT_NUM_TRIES};

/// Run parameters
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of sequential attempts
    pub num_tries: u32,
    /// Pause after a confirmed attempt
    pub attempt_delay: Duration,
    /// Commitment used for the blockhash fetch and the confirmation wait
    pub commitment: CommitmentConfig,
    /// Also pause after a failed attempt
    pub delay_after_failure: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_tries: DEFAULT_NUM_TRIES,
            attempt_delay: Duration::from_millis(DEFAULT_ATTEMPT_DELAY_MS),
            commitment: CommitmentConfig::confirmed(),
            delay_after_failure: false,
        }
    }
}

/// Collaborators a run needs, passed explicitly
#[derive(Clone)]
pub struct RunContext {
    pub wallet: Arc<dyn WalletContext>,
    pub connection: Arc<dyn NetworkClient>,
    pub notifier: Arc<dyn Notifier>,
}

impl RunContext {
    pub fn new(
        wallet: Arc<dyn WalletContext>,
        connection: Arc<dyn NetworkClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            wallet,
            connection,
            notifier,
        }
    }
}

/// Timing results of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds of each confirmed attempt, in attempt order
    pub durations_ms: Vec<f64>,
    /// Attempts that failed anywhere between validation and confirmation
    pub skipped: u32,
    pub cancelled: bool,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            durations_ms: Vec::new(),
            skipped: 0,
            cancelled: false,
        }
    }

    /// Mean of the confirmed attempts; `None` when nothing was confirmed
    pub fn average_ms(&self) -> Option<f64> {
        if self.durations_ms.is_empty() {
            return None;
        }
        Some(self.durations_ms.iter().sum::<f64>() / self.durations_ms.len() as f64)
    }

    pub fn succeeded(&self) -> usize {
        self.durations_ms.len()
    }

    /// Attempts that actually ran
    pub fn attempts(&self) -> usize {
        self.durations_ms.len() + self.skipped as usize
    }
}

/// Cooperative cancellation flag shared between a run and its handle
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a spawned run
pub struct RunHandle {
    cancel: CancelToken,
    task: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Stop before the next attempt or during the current pause
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to finish and return its summary
    pub async fn join(self) -> Result<RunSummary, LegacySendError> {
        self.task
            .await
            .map_err(|e| LegacySendError::Runtime(format!("run task failed: {}", e)))
    }
}

/// Spawn a run on the current tokio runtime
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn start_run(context: RunContext, config: RunConfig) -> RunHandle {
    spawn_run(context, config, ())
}

/// Spawn a run that keeps `guard` alive until the run ends
pub(crate) fn spawn_run<G>(context: RunContext, config: RunConfig, guard: G) -> RunHandle
where
    G: Send + 'static,
{
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move {
        let _guard = guard;
        run_legacy_batch(&context, &config, &token).await
    });
    RunHandle { cancel, task }
}

/// Execute every attempt of one run and log the summary
pub async fn run_legacy_batch(
    context: &RunContext,
    config: &RunConfig,
    cancel: &CancelToken,
) -> RunSummary {
    let mut summary = RunSummary::new();
    info!(
        "Starting run {} ({} attempts, {:?} pause)",
        summary.run_id, config.num_tries, config.attempt_delay
    );

    for attempt in 0..config.num_tries {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let start = Instant::now();
        let mut signature = None;

        match send_and_confirm(context, config, &mut signature).await {
            Ok(()) => {
                let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
                info!("Transaction {} completed in {}ms", attempt + 1, duration_ms);
                summary.durations_ms.push(duration_ms);

                if !pause(config.attempt_delay, cancel).await {
                    summary.cancelled = true;
                    break;
                }
            }
            Err(e) => {
                summary.skipped += 1;
                context.notifier.notify(
                    NotifyLevel::Error,
                    &format!("Transaction failed! {}", e),
                    signature.as_ref(),
                );

                if config.delay_after_failure && !pause(config.attempt_delay, cancel).await {
                    summary.cancelled = true;
                    break;
                }
            }
        }
    }

    if summary.cancelled {
        warn!("Run {} cancelled after {} attempts", summary.run_id, summary.attempts());
    }

    info!("Blockhash Summary: {:?}", summary.durations_ms);
    match summary.average_ms() {
        Some(average) => info!("Blockhash Average: {}", average),
        None => info!("Blockhash Average: n/a (no confirmed transactions)"),
    }
    info!("Skipped: {}", summary.skipped);

    summary.finished_at = Some(Utc::now());
    summary
}

/// One attempt; `signature` is filled as soon as the wallet returns one
async fn send_and_confirm(
    context: &RunContext,
    config: &RunConfig,
    signature: &mut Option<Signature>,
) -> Result<(), LegacySendError> {
    let payer = check_legacy_support(context.wallet.as_ref())?;

    let latest = context
        .connection
        .get_latest_blockhash_and_context(config.commitment)
        .await?;

    let transaction = build_legacy_memo_transaction(&payer, latest.blockhash);

    let sent = context
        .wallet
        .send_transaction(
            transaction,
            context.connection.as_ref(),
            SendOptions::with_min_context_slot(latest.context_slot),
        )
        .await?;
    *signature = Some(sent);
    context
        .notifier
        .notify(NotifyLevel::Info, "Transaction sent:", Some(&sent));

    let request = BlockhashConfirmation {
        signature: sent,
        blockhash: latest.blockhash,
        last_valid_block_height: latest.last_valid_block_height,
    };
    context
        .connection
        .confirm_transaction(&request, config.commitment)
        .await?;

    context
        .notifier
        .notify(NotifyLevel::Success, "Transaction successful!", Some(&sent));
    Ok(())
}

/// Sleep for `delay`; returns false if cancelled first
async fn pause(delay: Duration, cancel: &CancelToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    debug!("Pausing {:?} before next attempt", delay);
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}
