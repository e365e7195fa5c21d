//! Network client seam
//!
//! The run procedure only needs three things from the cluster: a recent
//! blockhash with its context slot, transaction submission and a blockhash
//! based confirmation wait. Everything else stays behind this trait.

#[cfg(feature = "rpc-client")]
mod rpc;

#[cfg(feature = "rpc-client")]
pub use rpc::RpcNetworkClient;

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
    signature::Signature,
    transaction::VersionedTransaction,
};
use thiserror::Error;

/// Latest blockhash together with the slot the node answered at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
    /// Slot of the response context, used as `min_context_slot` on submit
    pub context_slot: u64,
}

/// Blockhash-bounded confirmation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashConfirmation {
    pub signature: Signature,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Options forwarded with a transaction submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Reject the submission if the node has not reached this slot
    pub min_context_slot: Option<u64>,
    pub skip_preflight: bool,
    pub preflight_commitment: Option<CommitmentLevel>,
    pub max_retries: Option<usize>,
}

impl SendOptions {
    pub fn with_min_context_slot(slot: u64) -> Self {
        Self {
            min_context_slot: Some(slot),
            ..Self::default()
        }
    }
}

/// Cluster access consumed by wallets and the run procedure
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Fetch the latest blockhash and the context slot of the response
    async fn get_latest_blockhash_and_context(
        &self,
        commitment: CommitmentConfig,
    ) -> Result<LatestBlockhash, NetworkError>;

    /// Submit an already signed transaction
    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        options: &SendOptions,
    ) -> Result<Signature, NetworkError>;

    /// Wait until the signature reaches `commitment` or its blockhash expires
    async fn confirm_transaction(
        &self,
        request: &BlockhashConfirmation,
        commitment: CommitmentConfig,
    ) -> Result<(), NetworkError>;
}

/// Error types for network operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error(
        "Blockhash expired: block height {current_block_height} exceeded last valid block height {last_valid_block_height}"
    )]
    BlockhashExpired {
        last_valid_block_height: u64,
        current_block_height: u64,
    },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_options_min_context_slot() {
        let options = SendOptions::with_min_context_slot(42);
        assert_eq!(options.min_context_slot, Some(42));
        assert!(!options.skip_preflight);
        assert!(options.max_retries.is_none());
    }

    #[test]
    fn test_blockhash_expired_message() {
        let err = NetworkError::BlockhashExpired {
            last_valid_block_height: 100,
            current_block_height: 151,
        };
        let message = err.to_string();
        assert!(message.contains("151"));
        assert!(message.contains("100"));
    }
}
