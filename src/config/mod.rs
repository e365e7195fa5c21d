//! Settings for the legacy-send binary
//!
//! Values come from built-in defaults, then an optional config file, then
//! environment variables (a `.env` file is loaded first if present).

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use thiserror::Error;

use crate::runner::RunConfig;
use crate::{DEFAULT_ATTEMPT_DELAY_MS, DEFAULT_NUM_TRIES, DEVNET_RPC_URL};

/// Prefix for every variable except `SOLANA_URL` and `WALLET_PRIVATE_KEY`
const ENV_PREFIX: &str = "LEGACY_SEND_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Base58 secret key; a throwaway wallet is generated when absent
    #[serde(default)]
    pub wallet_private_key: Option<String>,

    #[serde(default = "default_num_tries")]
    pub num_tries: u32,

    #[serde(default = "default_attempt_delay_ms")]
    pub attempt_delay_ms: u64,

    #[serde(default = "default_commitment")]
    pub commitment: String,

    #[serde(default = "default_confirm_poll_interval_ms")]
    pub confirm_poll_interval_ms: u64,

    #[serde(default)]
    pub delay_after_failure: bool,

    #[serde(default)]
    pub guard_reentrancy: bool,

    /// SOL requested for a generated wallet with no balance
    #[serde(default = "default_airdrop_sol")]
    pub airdrop_sol: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            wallet_private_key: None,
            num_tries: default_num_tries(),
            attempt_delay_ms: default_attempt_delay_ms(),
            commitment: default_commitment(),
            confirm_poll_interval_ms: default_confirm_poll_interval_ms(),
            delay_after_failure: false,
            guard_reentrancy: false,
            airdrop_sol: default_airdrop_sol(),
        }
    }
}

impl Settings {
    /// Load defaults, the optional file at `path`, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.merge_from_env()?;
        settings.validate()?;
        Ok(settings)
    }

    #[cfg(feature = "config-file")]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(|e| ConfigError::File(format!("{}: {}", path.display(), e)))
    }

    #[cfg(not(feature = "config-file"))]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Err(ConfigError::File(format!(
            "{}: built without the config-file feature",
            path.display()
        )))
    }

    pub fn merge_from_env(&mut self) -> Result<(), ConfigError> {
        self.merge_from_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn merge_from_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SOLANA_URL") {
            self.rpc_url = url;
        }
        if let Some(key) = lookup("WALLET_PRIVATE_KEY").filter(|k| !k.trim().is_empty()) {
            self.wallet_private_key = Some(key);
        }

        let prefixed = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = parse_var(&prefixed, "NUM_TRIES")? {
            self.num_tries = value;
        }
        if let Some(value) = parse_var(&prefixed, "ATTEMPT_DELAY_MS")? {
            self.attempt_delay_ms = value;
        }
        if let Some(value) = prefixed("COMMITMENT") {
            self.commitment = value;
        }
        if let Some(value) = parse_var(&prefixed, "CONFIRM_POLL_INTERVAL_MS")? {
            self.confirm_poll_interval_ms = value;
        }
        if let Some(value) = parse_var(&prefixed, "DELAY_AFTER_FAILURE")? {
            self.delay_after_failure = value;
        }
        if let Some(value) = parse_var(&prefixed, "GUARD_REENTRANCY")? {
            self.guard_reentrancy = value;
        }
        if let Some(value) = parse_var(&prefixed, "AIRDROP_SOL")? {
            self.airdrop_sol = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "rpc_url must be an http(s) URL, got '{}'",
                self.rpc_url
            )));
        }
        if self.num_tries == 0 {
            return Err(ConfigError::Invalid("num_tries must be at least 1".to_string()));
        }
        if self.confirm_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "confirm_poll_interval_ms must be positive".to_string(),
            ));
        }
        if !self.airdrop_sol.is_finite() || self.airdrop_sol < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "airdrop_sol must be a non-negative number, got {}",
                self.airdrop_sol
            )));
        }
        self.commitment_config()?;
        Ok(())
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig, ConfigError> {
        let commitment = CommitmentLevel::from_str(&self.commitment)
            .map_err(|_| ConfigError::Invalid(format!("unknown commitment '{}'", self.commitment)))?;
        Ok(CommitmentConfig { commitment })
    }

    pub fn attempt_delay(&self) -> Duration {
        Duration::from_millis(self.attempt_delay_ms)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }

    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        Ok(RunConfig {
            num_tries: self.num_tries,
            attempt_delay: self.attempt_delay(),
            commitment: self.commitment_config()?,
            delay_after_failure: self.delay_after_failure,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            ConfigError::Invalid(format!("Invalid {}{} value '{}': {}", ENV_PREFIX, name, raw, e))
        }),
        None => Ok(None),
    }
}

// Default value functions for serde
fn default_rpc_url() -> String {
    DEVNET_RPC_URL.to_string()
}

fn default_num_tries() -> u32 {
    DEFAULT_NUM_TRIES
}

fn default_attempt_delay_ms() -> u64 {
    DEFAULT_ATTEMPT_DELAY_MS
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_confirm_poll_interval_ms() -> u64 {
    500
}

fn default_airdrop_sol() -> f64 {
    1.0
}

/// Error types for configuration loading
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(settings.num_tries, 10);
        assert_eq!(settings.attempt_delay(), Duration::from_secs(10));
        assert_eq!(settings.commitment_config(), Ok(CommitmentConfig::confirmed()));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_merge_from_vars() {
        let env = vars(&[
            ("SOLANA_URL", "http://localhost:8899"),
            ("WALLET_PRIVATE_KEY", "  "),
            ("LEGACY_SEND_NUM_TRIES", "3"),
            ("LEGACY_SEND_ATTEMPT_DELAY_MS", "250"),
            ("LEGACY_SEND_COMMITMENT", "finalized"),
            ("LEGACY_SEND_GUARD_REENTRANCY", "true"),
        ]);

        let mut settings = Settings::default();
        settings
            .merge_from_vars(|name| env.get(name).cloned())
            .expect("Should merge");

        assert_eq!(settings.rpc_url, "http://localhost:8899");
        assert!(settings.wallet_private_key.is_none());
        assert_eq!(settings.num_tries, 3);
        assert_eq!(settings.attempt_delay(), Duration::from_millis(250));
        assert!(settings.guard_reentrancy);
        assert!(!settings.delay_after_failure);

        let run = settings.run_config().expect("Should build run config");
        assert_eq!(run.commitment, CommitmentConfig::finalized());
        assert_eq!(run.num_tries, 3);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let env = vars(&[("LEGACY_SEND_NUM_TRIES", "ten")]);
        let mut settings = Settings::default();
        let err = settings
            .merge_from_vars(|name| env.get(name).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("LEGACY_SEND_NUM_TRIES"));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.num_tries = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.commitment = "eventually".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.rpc_url = "api.devnet.solana.com".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.airdrop_sol = -1.0;
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Should create temp file");
        writeln!(file, "rpc_url = \"http://127.0.0.1:8899\"").unwrap();
        writeln!(file, "num_tries = 4").unwrap();
        writeln!(file, "delay_after_failure = true").unwrap();

        let settings = Settings::from_file(file.path()).expect("Should load file");
        assert_eq!(settings.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(settings.num_tries, 4);
        assert!(settings.delay_after_failure);
        assert_eq!(settings.attempt_delay_ms, 10_000);
        assert_eq!(settings.commitment, "confirmed");
    }
}
