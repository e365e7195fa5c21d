//! User-facing notifications

use parking_lot::Mutex;
use serde::Serialize;
use solana_sdk::signature::Signature;
use tracing::{error, info};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

/// Sink for per-attempt notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str, signature: Option<&Signature>);
}

/// Notifier that writes to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, signature: Option<&Signature>) {
        let signature = signature.map(|s| s.to_string()).unwrap_or_default();
        match level {
            NotifyLevel::Info => info!("ℹ️  {} {}", message, signature),
            NotifyLevel::Success => info!("✅ {} {}", message, signature),
            NotifyLevel::Error => error!("❌ {} {}", message, signature),
        }
    }
}

/// A single recorded notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
    pub signature: Option<String>,
}

/// Notifier that keeps every notification in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn count(&self, level: NotifyLevel) -> usize {
        self.entries.lock().iter().filter(|n| n.level == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, signature: Option<&Signature>) {
        self.entries.lock().push(Notification {
            level,
            message: message.to_string(),
            signature: signature.map(|s| s.to_string()),
        });
    }
}
