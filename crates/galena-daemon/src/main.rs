// crates/galena-daemon/src/main.rs
//
// Binary entrypoint for the Galena mining daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration, loads the
// worker signing key, wires the chain clock + ticket machine + worker into
// the mining scheduler, and drains the scheduler's output channel until a
// shutdown signal arrives.

mod config;
mod state;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use config::DaemonConfig;
use state::{NodeState, NodeStateMachine};

use galena_clock::{ChainClock, ChainEpochClock};
use galena_consensus::{ChainSampler, FixedPeriodBeacon, TicketMachine};
use galena_core::{
    Address, BeaconEntry, Block, GalenaError, Keypair, KeystoreSigner, Ticket, TipSet, TipSetKey,
};
use galena_mining::{DefaultWorker, HeadFunc, MiningScheduler, Output};

/// Galena Protocol daemon: schedules and produces blocks for one miner.
#[derive(Parser, Debug)]
#[command(name = "galena-daemon", version = "0.1.0", about = "Galena Protocol mining daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.galena/config.toml")]
    config: String,

    /// Start with the scheduler paused; epochs are observed but not mined.
    #[arg(long, default_value_t = false)]
    paused: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the
    // file is not found.
    let config = match DaemonConfig::load(&expand_tilde(&args.config)) {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", args.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                args.config,
                e
            );
            DaemonConfig::default()
        }
    };

    tracing::info!("Galena Protocol Daemon v0.1.0");
    tracing::info!("Genesis timestamp: {}", config.genesis_timestamp);
    tracing::info!("Epoch duration: {}s", config.epoch_duration_secs);
    tracing::info!("Miner: {}", Address::new_id(config.miner_id));

    let mut state_machine = NodeStateMachine::new();
    state_machine.transition(NodeState::Syncing)?;
    state_machine.transition(NodeState::Ready)?;

    // Clock misconfiguration is fatal here, before anything is spawned.
    let clock = Arc::new(ChainClock::new(
        config.genesis_timestamp,
        Duration::from_secs(config.epoch_duration_secs),
    )?);

    let (signer, worker_addr) = load_worker_key(&config);
    let miner_addr = Address::new_id(config.miner_id);

    let beacon = Arc::new(FixedPeriodBeacon::new(
        config.beacon_seed,
        config.beacon_epochs_per_round,
    )?);
    let worker = Arc::new(DefaultWorker::new(
        TicketMachine::new(ChainSampler::new()),
        Arc::new(signer),
        beacon,
        miner_addr,
        worker_addr,
    ));

    // The head starts at the genesis tipset and follows our own blocks.
    // Chain sync and fork choice live upstream of this daemon.
    let head = Arc::new(RwLock::new(genesis_tipset(clock.genesis_time())?));
    let head_func: HeadFunc = {
        let head = head.clone();
        Arc::new(move || {
            head.read()
                .map(|tipset| tipset.clone())
                .map_err(|_| GalenaError::HeadUnavailable("head lock poisoned".to_string()))
        })
    };

    let scheduler = MiningScheduler::new(worker, head_func, clock);
    if args.paused {
        scheduler.pause();
    }

    let shutdown = CancellationToken::new();
    let (mut outputs, tracker) = scheduler.start(shutdown.clone())?;
    state_machine.transition(NodeState::Mining)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            maybe_output = outputs.recv() => match maybe_output {
                Some(output) => handle_output(output, &head),
                None => break,
            }
        }
    }

    let _ = state_machine.transition(NodeState::ShuttingDown);
    shutdown.cancel();
    tracker.wait().await;
    tracing::info!("Galena daemon shut down gracefully");

    Ok(())
}

/// Record a mining attempt's result and advance the local head on success.
fn handle_output(output: Output, head: &Arc<RwLock<TipSet>>) {
    if let Some(e) = output.error {
        tracing::warn!("Mining attempt failed: {}", e);
    }
    let Some(block) = output.new_block else {
        return;
    };

    tracing::info!("Mined block at epoch {} by {}", block.height, block.miner);
    match TipSet::new(vec![block]) {
        Ok(tipset) => {
            if let Ok(mut current) = head.write() {
                *current = tipset;
            }
        }
        Err(e) => tracing::warn!("Could not form tipset from mined block: {}", e),
    }
}

/// The single-block tipset the chain starts from.
fn genesis_tipset(genesis_time: chrono::DateTime<chrono::Utc>) -> Result<TipSet, GalenaError> {
    let block = Block {
        miner: Address::new_id(0),
        ticket: Ticket::default(),
        parents: TipSetKey::default(),
        height: 0,
        beacon_entry: BeaconEntry::default(),
        timestamp: genesis_time,
    };
    TipSet::new(vec![block])
}

/// Load the worker signing key from disk.
///
/// Reads a hex-encoded ed25519 secret from the configured path. Falls back
/// to a freshly generated ephemeral key when the file is missing or
/// unparseable, so the daemon still runs on a first start.
fn load_worker_key(config: &DaemonConfig) -> (KeystoreSigner, Address) {
    let path = expand_tilde(&config.worker_key_path);
    let mut signer = KeystoreSigner::new();

    let keypair = match std::fs::read_to_string(&path) {
        Ok(hex_str) => match parse_secret(hex_str.trim()) {
            Some(secret) => {
                let keypair = Keypair::from_secret_bytes(&secret);
                tracing::info!("Worker key loaded from {}", path);
                keypair
            }
            None => {
                tracing::warn!("Invalid worker key at {}; using an ephemeral key", path);
                Keypair::generate()
            }
        },
        Err(_) => {
            tracing::warn!(
                "No worker key at {}; using an ephemeral key (tickets will not be \
                 attributable across restarts)",
                path
            );
            Keypair::generate()
        }
    };

    let addr = signer.add_key(keypair);
    tracing::info!("Worker address: {}", addr);
    (signer, addr)
}

/// Decode a 32-byte hex-encoded secret key. Returns None on invalid input.
fn parse_secret(hex_str: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(hex_str).ok()?;
    let secret: [u8; 32] = bytes.try_into().ok()?;
    Some(secret)
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.display(), &path[1..]);
        }
    }
    path.to_string()
}
