// crates/galena-consensus/src/beacon.rs
//
// Interface to the external randomness beacon that supplies election
// entries (drand-like public entropy).

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use galena_core::{BeaconEntry, ChainEpoch, GalenaError};

/// Source of per-round public randomness.
///
/// The beacon advances on its own schedule; several chain epochs may map to
/// the same beacon round.
#[async_trait]
pub trait Beacon: Send + Sync {
    /// The beacon entry whose round covers the given chain epoch.
    async fn entry_for_epoch(&self, epoch: ChainEpoch) -> Result<BeaconEntry, GalenaError>;

    /// True when `epoch` is the first chain epoch drawing from a new beacon
    /// round.
    fn is_new_period(&self, epoch: ChainEpoch) -> bool;
}

/// A deterministic beacon that derives each round's entry from a fixture
/// seed.
///
/// This does NOT talk to a real randomness network. It exists so the ticket
/// pipeline can run end-to-end, reproducibly, in nodes and tests that have
/// no beacon collaborator configured. A production deployment substitutes a
/// real beacon client behind the same trait.
pub struct FixedPeriodBeacon {
    seed: u64,
    epochs_per_round: u64,
}

impl FixedPeriodBeacon {
    /// Create a beacon advancing one round every `epochs_per_round` chain
    /// epochs.
    pub fn new(seed: u64, epochs_per_round: u64) -> Result<Self, GalenaError> {
        if epochs_per_round == 0 {
            return Err(GalenaError::Beacon(
                "epochs per beacon round must be non-zero".to_string(),
            ));
        }
        Ok(FixedPeriodBeacon {
            seed,
            epochs_per_round,
        })
    }

    fn round(&self, epoch: ChainEpoch) -> u64 {
        epoch / self.epochs_per_round
    }
}

#[async_trait]
impl Beacon for FixedPeriodBeacon {
    async fn entry_for_epoch(&self, epoch: ChainEpoch) -> Result<BeaconEntry, GalenaError> {
        let round = self.round(epoch);
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_be_bytes());
        hasher.update(round.to_be_bytes());
        Ok(BeaconEntry {
            round,
            data: hasher.finalize().to_vec(),
        })
    }

    fn is_new_period(&self, epoch: ChainEpoch) -> bool {
        epoch % self.epochs_per_round == 0
    }
}
