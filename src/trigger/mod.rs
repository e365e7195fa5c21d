//! Trigger control
//!
//! The control is enabled only while the wallet exposes a public key and
//! declares legacy transaction support. Each activation starts exactly one
//! run. Overlapping runs are allowed unless the re-entrancy guard is on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::runner::{spawn_run, RunConfig, RunContext, RunHandle};
use crate::wallet::TransactionVersion;

/// Text shown on the control
pub const TRIGGER_LABEL: &str = "Send 10 Legacy Transaction (devnet)";

/// Control wired to a wallet/connection context
pub struct TriggerControl {
    context: RunContext,
    config: RunConfig,
    guard_reentrancy: bool,
    in_flight: Arc<AtomicBool>,
}

impl TriggerControl {
    pub fn new(context: RunContext, config: RunConfig) -> Self {
        Self {
            context,
            config,
            guard_reentrancy: false,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Refuse activation while a previous run is still going
    pub fn with_reentrancy_guard(mut self, enabled: bool) -> Self {
        self.guard_reentrancy = enabled;
        self
    }

    pub fn label(&self) -> &'static str {
        TRIGGER_LABEL
    }

    pub fn is_enabled(&self) -> bool {
        let wallet = &self.context.wallet;
        wallet.public_key().is_some()
            && wallet
                .supported_transaction_versions()
                .is_some_and(|versions| versions.contains(&TransactionVersion::Legacy))
    }

    /// True while a guarded run is in flight
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start one run
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn activate(&self) -> Result<RunHandle, TriggerError> {
        if !self.is_enabled() {
            return Err(TriggerError::Disabled);
        }

        let guard = if self.guard_reentrancy {
            if self
                .in_flight
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                warn!("Activation ignored, a run is already in progress");
                return Err(TriggerError::RunInProgress);
            }
            Some(InFlightGuard(self.in_flight.clone()))
        } else {
            None
        };

        info!("{} activated", self.label());
        Ok(spawn_run(self.context.clone(), self.config.clone(), guard))
    }
}

/// Clears the in-flight flag when the run ends, even if it panics
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Error types for trigger activation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("control is disabled: wallet not connected or legacy transactions unsupported")]
    Disabled,

    #[error("a run is already in progress")]
    RunInProgress,
}
