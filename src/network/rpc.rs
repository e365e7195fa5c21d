//! JSON-RPC backed network client

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_client::rpc_response::{Response, RpcBlockhash};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};
use tracing::{debug, info};

use super::{BlockhashConfirmation, LatestBlockhash, NetworkClient, NetworkError, SendOptions};

/// Default interval between signature status polls
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Network client talking to a Solana JSON-RPC endpoint
pub struct RpcNetworkClient {
    client: RpcClient,
    poll_interval: Duration,
}

impl RpcNetworkClient {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    pub async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, NetworkError> {
        self.client.get_balance(pubkey).await.map_err(rpc_error)
    }

    /// Request an airdrop and wait for it to land
    pub async fn request_airdrop(
        &self,
        pubkey: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, NetworkError> {
        let signature = self
            .client
            .request_airdrop(pubkey, lamports)
            .await
            .map_err(rpc_error)?;
        info!("Airdrop requested for {}: {}", pubkey, signature);

        self.client
            .poll_for_signature_with_commitment(&signature, self.client.commitment())
            .await
            .map_err(rpc_error)?;

        Ok(signature)
    }
}

#[async_trait]
impl NetworkClient for RpcNetworkClient {
    async fn get_latest_blockhash_and_context(
        &self,
        commitment: CommitmentConfig,
    ) -> Result<LatestBlockhash, NetworkError> {
        // The typed helpers drop the response context, so go through the raw request
        let response: Response<RpcBlockhash> = self
            .client
            .send(RpcRequest::GetLatestBlockhash, json!([commitment]))
            .await
            .map_err(rpc_error)?;

        let blockhash = Hash::from_str(&response.value.blockhash)
            .map_err(|e| NetworkError::InvalidResponse(format!("blockhash: {}", e)))?;

        debug!(
            "Latest blockhash {} (last valid height {}, context slot {})",
            blockhash, response.value.last_valid_block_height, response.context.slot
        );

        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: response.value.last_valid_block_height,
            context_slot: response.context.slot,
        })
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
        options: &SendOptions,
    ) -> Result<Signature, NetworkError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: options.preflight_commitment,
            max_retries: options.max_retries,
            min_context_slot: options.min_context_slot,
            ..RpcSendTransactionConfig::default()
        };

        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(rpc_error)
    }

    async fn confirm_transaction(
        &self,
        request: &BlockhashConfirmation,
        commitment: CommitmentConfig,
    ) -> Result<(), NetworkError> {
        loop {
            let statuses = self
                .client
                .get_signature_statuses(&[request.signature])
                .await
                .map_err(rpc_error)?
                .value;

            if let Some(Some(status)) = statuses.into_iter().next() {
                if let Some(err) = status.err.as_ref() {
                    return Err(NetworkError::TransactionFailed(err.to_string()));
                }
                if status.satisfies_commitment(commitment) {
                    return Ok(());
                }
            }

            let current_block_height = self
                .client
                .get_block_height_with_commitment(commitment)
                .await
                .map_err(rpc_error)?;
            if current_block_height > request.last_valid_block_height {
                return Err(NetworkError::BlockhashExpired {
                    last_valid_block_height: request.last_valid_block_height,
                    current_block_height,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn rpc_error(err: ClientError) -> NetworkError {
    NetworkError::Rpc(err.to_string())
}
