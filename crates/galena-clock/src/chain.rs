// crates/galena-clock/src/chain.rs
//
// The chain epoch clock: converts wall-clock time to a monotonically
// increasing epoch number and back. Pure arithmetic over a genesis timestamp
// and a fixed epoch duration; genesis is authoritative and there is no drift
// correction beyond subtraction.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use galena_core::{ChainEpoch, GalenaError};

/// Clock over chain epochs.
///
/// The epoch arithmetic lives in default methods so that the system clock
/// and the manually advanced fake produce identical epoch transitions from
/// identical parameters.
#[async_trait]
pub trait ChainEpochClock: Send + Sync {
    /// The network's genesis time.
    fn genesis_time(&self) -> DateTime<Utc>;

    /// The fixed length of one epoch.
    fn epoch_duration(&self) -> Duration;

    /// The clock's current time.
    fn now(&self) -> DateTime<Utc>;

    /// The epoch containing `time`: `floor((time - genesis) / duration)`,
    /// clamped to 0 before genesis.
    fn epoch_at(&self, time: DateTime<Utc>) -> ChainEpoch {
        let elapsed_ms = time
            .signed_duration_since(self.genesis_time())
            .num_milliseconds();
        if elapsed_ms <= 0 {
            return 0;
        }
        // Duration is at least one millisecond by construction.
        let duration_ms = self.epoch_duration().as_millis() as i64;
        (elapsed_ms / duration_ms) as ChainEpoch
    }

    /// The epoch containing the clock's current time.
    fn current_epoch(&self) -> ChainEpoch {
        self.epoch_at(self.now())
    }

    /// The instant at which `epoch` begins.
    fn epoch_start(&self, epoch: ChainEpoch) -> DateTime<Utc> {
        let duration_ms = self.epoch_duration().as_millis() as i64;
        self.genesis_time() + chrono::Duration::milliseconds(duration_ms * epoch as i64)
    }

    /// Suspend the caller until `epoch` has started. Level-triggered:
    /// returns immediately when the epoch's start time has already passed.
    async fn wait_for_epoch(&self, epoch: ChainEpoch);
}

/// A `ChainEpochClock` driven by the system clock.
pub struct ChainClock {
    genesis: DateTime<Utc>,
    duration: Duration,
}

impl ChainClock {
    /// Create a chain clock from a genesis unix timestamp (seconds) and a
    /// fixed epoch duration.
    ///
    /// Fails when the duration is shorter than one millisecond or the
    /// genesis timestamp is unrepresentable; both are construction-time
    /// misconfigurations, never runtime conditions.
    pub fn new(genesis_unix_secs: i64, epoch_duration: Duration) -> Result<Self, GalenaError> {
        validate_params(genesis_unix_secs, epoch_duration).map(|genesis| ChainClock {
            genesis,
            duration: epoch_duration,
        })
    }
}

#[async_trait]
impl ChainEpochClock for ChainClock {
    fn genesis_time(&self) -> DateTime<Utc> {
        self.genesis
    }

    fn epoch_duration(&self) -> Duration {
        self.duration
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn wait_for_epoch(&self, epoch: ChainEpoch) {
        let target = self.epoch_start(epoch);
        let now = self.now();
        if now >= target {
            return;
        }
        let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;
    }
}

/// Shared constructor validation for the real and fake clocks.
pub(crate) fn validate_params(
    genesis_unix_secs: i64,
    epoch_duration: Duration,
) -> Result<DateTime<Utc>, GalenaError> {
    if epoch_duration < Duration::from_millis(1) {
        return Err(GalenaError::Clock(
            "epoch duration must be at least one millisecond".to_string(),
        ));
    }
    DateTime::<Utc>::from_timestamp(genesis_unix_secs, 0).ok_or_else(|| {
        GalenaError::Clock(format!(
            "genesis timestamp {} is out of range",
            genesis_unix_secs
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: i64 = 1_234_567_890;

    #[test]
    fn test_zero_duration_is_a_construction_error() {
        let result = ChainClock::new(GENESIS, Duration::ZERO);
        assert!(matches!(result, Err(GalenaError::Clock(_))));
    }

    #[test]
    fn test_epoch_arithmetic() {
        let clock = ChainClock::new(GENESIS, Duration::from_secs(30)).unwrap();
        let genesis = clock.genesis_time();

        assert_eq!(clock.epoch_at(genesis), 0);
        assert_eq!(clock.epoch_at(genesis + chrono::Duration::seconds(29)), 0);
        assert_eq!(clock.epoch_at(genesis + chrono::Duration::seconds(30)), 1);
        assert_eq!(clock.epoch_at(genesis + chrono::Duration::seconds(75)), 2);
    }

    #[test]
    fn test_pre_genesis_clamps_to_epoch_zero() {
        let clock = ChainClock::new(GENESIS, Duration::from_secs(30)).unwrap();
        let before = clock.genesis_time() - chrono::Duration::seconds(120);
        assert_eq!(clock.epoch_at(before), 0);
    }

    #[test]
    fn test_epoch_start_inverts_epoch_at() {
        let clock = ChainClock::new(GENESIS, Duration::from_millis(500)).unwrap();
        for epoch in [0u64, 1, 7, 1000] {
            let start = clock.epoch_start(epoch);
            assert_eq!(clock.epoch_at(start), epoch);
            // One tick before the boundary still belongs to the prior epoch.
            if epoch > 0 {
                assert_eq!(
                    clock.epoch_at(start - chrono::Duration::milliseconds(1)),
                    epoch - 1
                );
            }
        }
    }

    #[tokio::test]
    async fn test_wait_for_elapsed_epoch_returns_immediately() {
        // Genesis far in the past: every small epoch has already started.
        let clock = ChainClock::new(GENESIS, Duration::from_secs(30)).unwrap();
        tokio::time::timeout(Duration::from_millis(50), clock.wait_for_epoch(1))
            .await
            .expect("wait_for_epoch should not block for an elapsed epoch");
    }
}
