//! Wallet context for legacy-send
//!
//! A wallet exposes its public key while connected, declares which transaction
//! versions it can sign, and signs then submits transactions through a
//! network client.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::network::{NetworkClient, NetworkError, SendOptions};

/// Transaction format a wallet is able to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionVersion {
    Legacy,
    Number(u8),
}

impl std::fmt::Display for TransactionVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionVersion::Legacy => write!(f, "legacy"),
            TransactionVersion::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Connected wallet as seen by the run procedure
#[async_trait]
pub trait WalletContext: Send + Sync {
    /// Public key of the connected account, `None` while disconnected
    fn public_key(&self) -> Option<Pubkey>;

    /// Versions the wallet can sign, `None` if it predates versioned transactions
    fn supported_transaction_versions(&self) -> Option<HashSet<TransactionVersion>>;

    /// Sign `transaction` and submit it through `connection`
    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
        connection: &dyn NetworkClient,
        options: SendOptions,
    ) -> Result<Signature, WalletError>;
}

/// Check, in order, that the wallet is connected, supports versioned
/// transactions and supports the legacy version. Returns the payer key.
pub fn check_legacy_support(wallet: &dyn WalletContext) -> Result<Pubkey, WalletError> {
    let public_key = wallet.public_key().ok_or(WalletError::NotConnected)?;
    let versions = wallet
        .supported_transaction_versions()
        .ok_or(WalletError::VersionedTransactionsUnsupported)?;
    if !versions.contains(&TransactionVersion::Legacy) {
        return Err(WalletError::LegacyTransactionsUnsupported);
    }
    Ok(public_key)
}

/// Wallet backed by a local keypair
pub struct KeypairWallet {
    keypair: Keypair,
    connected: AtomicBool,
    supported_versions: Option<HashSet<TransactionVersion>>,
}

impl KeypairWallet {
    /// Wrap an existing keypair; the wallet starts connected
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            connected: AtomicBool::new(true),
            supported_versions: Some(
                [TransactionVersion::Legacy, TransactionVersion::Number(0)]
                    .into_iter()
                    .collect(),
            ),
        }
    }

    /// Create a wallet around a freshly generated keypair
    pub fn generate() -> Self {
        Self::new(Keypair::new())
    }

    /// Restore a wallet from a base58 encoded secret key
    pub fn from_base58(private_key: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(private_key.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKey(format!("base58 decode failed: {}", e)))?;

        let keypair = Keypair::try_from(&bytes[..])
            .map_err(|e| WalletError::InvalidKey(format!("invalid keypair bytes: {}", e)))?;

        info!("Wallet restored: {}", keypair.pubkey());
        Ok(Self::new(keypair))
    }

    /// Override the declared transaction versions
    pub fn with_supported_versions(mut self, versions: Option<HashSet<TransactionVersion>>) -> Self {
        self.supported_versions = versions;
        self
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletContext for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.is_connected().then(|| self.keypair.pubkey())
    }

    fn supported_transaction_versions(&self) -> Option<HashSet<TransactionVersion>> {
        self.supported_versions.clone()
    }

    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
        connection: &dyn NetworkClient,
        options: SendOptions,
    ) -> Result<Signature, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }

        let signed = VersionedTransaction::try_new(transaction.message, &[&self.keypair])
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        debug!(
            "Signed transaction {} (min context slot {:?})",
            signed.signatures[0], options.min_context_slot
        );

        Ok(connection.send_transaction(&signed, &options).await?)
    }
}

/// Error types for wallet operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet not connected!")]
    NotConnected,

    #[error("Wallet doesn't support versioned transactions!")]
    VersionedTransactionsUnsupported,

    #[error("Wallet doesn't support legacy transactions!")]
    LegacyTransactionsUnsupported,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid wallet key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Send(#[from] NetworkError),
}
