//! In-memory wallet and network used by the test suites

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use legacy_send::{
    BlockhashConfirmation, KeypairWallet, LatestBlockhash, NetworkClient, NetworkError,
    RecordingNotifier, RunContext, SendOptions, TransactionVersion, WalletContext, WalletError,
};
use parking_lot::Mutex;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};

/// Network that accepts everything and records each submission
#[derive(Default)]
pub struct MockNetwork {
    pub sent: Mutex<Vec<(VersionedTransaction, SendOptions)>>,
    /// Submission indexes whose confirmation should fail
    pub fail_confirm_at: HashSet<usize>,
    slot: AtomicU64,
    pub confirm_commitments: Mutex<VecDeque<CommitmentConfig>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_confirmations(indexes: &[usize]) -> Self {
        Self {
            fail_confirm_at: indexes.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn sent_transactions(&self) -> Vec<(VersionedTransaction, SendOptions)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NetworkClient for MockNetwork {
    async fn get_latest_blockhash_and_context(
        &self,
        _commitment: CommitmentConfig,
    ) -> Result<LatestBlockhash, NetworkError> {
        let slot = self.slot.fetch_add(1, Ordering::SeqCst) + 100;
        Ok(LatestBlockhash {
            blockhash: Hash::new_unique(),
            last_valid_block_height: slot + 150,
            context_slot: slot,
        })
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        options: &SendOptions,
    ) -> Result<Signature, NetworkError> {
        self.sent.lock().push((transaction.clone(), options.clone()));
        Ok(transaction.signatures[0])
    }

    async fn confirm_transaction(
        &self,
        request: &BlockhashConfirmation,
        commitment: CommitmentConfig,
    ) -> Result<(), NetworkError> {
        self.confirm_commitments.lock().push_back(commitment);
        let index = self
            .sent
            .lock()
            .iter()
            .position(|(tx, _)| tx.signatures[0] == request.signature);

        match index {
            Some(i) if self.fail_confirm_at.contains(&i) => Err(NetworkError::BlockhashExpired {
                last_valid_block_height: request.last_valid_block_height,
                current_block_height: request.last_valid_block_height + 1,
            }),
            Some(_) => Ok(()),
            None => Err(NetworkError::TransactionFailed("unknown signature".to_string())),
        }
    }
}

/// Keypair wallet that reports itself disconnected on chosen attempts
pub struct FlakyWallet {
    inner: KeypairWallet,
    disconnected_on: HashSet<usize>,
    calls: AtomicUsize,
}

impl FlakyWallet {
    pub fn disconnected_on(attempts: &[usize]) -> Self {
        Self {
            inner: KeypairWallet::generate(),
            disconnected_on: attempts.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletContext for FlakyWallet {
    fn public_key(&self) -> Option<Pubkey> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.disconnected_on.contains(&call) {
            None
        } else {
            self.inner.public_key()
        }
    }

    fn supported_transaction_versions(&self) -> Option<HashSet<TransactionVersion>> {
        self.inner.supported_transaction_versions()
    }

    async fn send_transaction(
        &self,
        transaction: VersionedTransaction,
        connection: &dyn NetworkClient,
        options: SendOptions,
    ) -> Result<Signature, WalletError> {
        self.inner.send_transaction(transaction, connection, options).await
    }
}

pub struct Harness {
    pub network: Arc<MockNetwork>,
    pub notifier: Arc<RecordingNotifier>,
    pub context: RunContext,
}

pub fn harness(wallet: Arc<dyn WalletContext>, network: MockNetwork) -> Harness {
    let network = Arc::new(network);
    let notifier = Arc::new(RecordingNotifier::new());
    let context = RunContext::new(wallet, network.clone(), notifier.clone());
    Harness {
        network,
        notifier,
        context,
    }
}
