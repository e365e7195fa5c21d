//! legacy-send demonstration
//!
//! Sends a batch of legacy memo transactions to devnet through a local keypair
//! wallet and prints the timing summary.
//!
//! Usage: legacy-send [CONFIG_FILE]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use legacy_send::network::RpcNetworkClient;
use legacy_send::{KeypairWallet, RunContext, Settings, TracingNotifier, TriggerControl};
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(None, EnvFilter::DEFAULT_ENV))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref()).context("failed to load settings")?;

    info!("🌐 Using RPC endpoint: {}", settings.rpc_url);
    let connection = Arc::new(
        RpcNetworkClient::new(&settings.rpc_url, settings.commitment_config()?)
            .with_poll_interval(settings.confirm_poll_interval()),
    );

    let wallet = Arc::new(match &settings.wallet_private_key {
        Some(key) => KeypairWallet::from_base58(key).context("WALLET_PRIVATE_KEY is not a valid keypair")?,
        None => {
            let wallet = KeypairWallet::generate();
            warn!("⚠️  No WALLET_PRIVATE_KEY configured, generated {}", wallet.pubkey());
            wallet
        }
    });

    fund_if_empty(&connection, &wallet, settings.airdrop_sol).await;

    let context = RunContext::new(wallet, connection, Arc::new(TracingNotifier));
    let control = TriggerControl::new(context, settings.run_config()?)
        .with_reentrancy_guard(settings.guard_reentrancy);

    info!("🔘 {} (enabled: {})", control.label(), control.is_enabled());
    let handle = control.activate()?;

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, stopping after the current attempt");
            cancel.cancel();
        }
    });

    let summary = handle.join().await?;
    info!(
        "🎉 Run {} finished: {} confirmed, {} skipped",
        summary.run_id,
        summary.succeeded(),
        summary.skipped
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Load `.env` (or `env_file`) before reading `var`, so the filter may come from it
fn log_filter(env_file: Option<&Path>, var: &str) -> EnvFilter {
    let _ = match env_file {
        Some(path) => dotenv::from_path(path),
        None => dotenv::dotenv().map(|_| ()),
    };
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Request an airdrop when the wallet has no balance; failures only warn,
/// the run will report them as skipped attempts
async fn fund_if_empty(connection: &RpcNetworkClient, wallet: &KeypairWallet, airdrop_sol: f64) {
    let pubkey = wallet.pubkey();
    match connection.get_balance(&pubkey).await {
        Ok(0) if airdrop_sol > 0.0 => {
            let lamports = (airdrop_sol * LAMPORTS_PER_SOL as f64) as u64;
            info!("💧 Requesting {} SOL airdrop for {}", airdrop_sol, pubkey);
            if let Err(e) = connection.request_airdrop(&pubkey, lamports).await {
                warn!("⚠️  Airdrop failed: {}", e);
            }
        }
        Ok(balance) => info!("💰 Wallet {} balance: {} lamports", pubkey, balance),
        Err(e) => warn!("⚠️  Could not read balance for {}: {}", pubkey, e),
    }
}
