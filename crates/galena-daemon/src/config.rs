// crates/galena-daemon/src/config.rs
//
// Runtime configuration for the Galena mining daemon.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;

use serde::Deserialize;

use galena_core::GalenaError;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Unix timestamp (seconds) of the network's genesis.
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: i64,

    /// Length of one chain epoch in seconds.
    #[serde(default = "default_epoch_duration_secs")]
    pub epoch_duration_secs: u64,

    /// This node's miner actor id.
    #[serde(default = "default_miner_id")]
    pub miner_id: u64,

    /// Path to the hex-encoded ed25519 worker secret key.
    #[serde(default = "default_worker_key_path")]
    pub worker_key_path: String,

    /// Seed for the local deterministic beacon.
    #[serde(default)]
    pub beacon_seed: u64,

    /// Chain epochs per beacon round.
    #[serde(default = "default_beacon_epochs_per_round")]
    pub beacon_epochs_per_round: u64,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_genesis_timestamp() -> i64 {
    // 2024-01-01T00:00:00Z, the devnet genesis.
    1_704_067_200
}

fn default_epoch_duration_secs() -> u64 {
    30
}

fn default_miner_id() -> u64 {
    1
}

fn default_worker_key_path() -> String {
    "~/.galena/worker.key".to_string()
}

fn default_beacon_epochs_per_round() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            genesis_timestamp: default_genesis_timestamp(),
            epoch_duration_secs: default_epoch_duration_secs(),
            miner_id: default_miner_id(),
            worker_key_path: default_worker_key_path(),
            beacon_seed: 0,
            beacon_epochs_per_round: default_beacon_epochs_per_round(),
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, GalenaError> {
        let contents =
            fs::read_to_string(path).map_err(|e| GalenaError::Config(e.to_string()))?;
        let config: DaemonConfig =
            toml::from_str(&contents).map_err(|e| GalenaError::Config(e.to_string()))?;
        Ok(config)
    }
}
