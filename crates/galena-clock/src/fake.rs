// crates/galena-clock/src/fake.rs
//
// A manually advanceable chain clock for deterministic tests.
//
// Shares the epoch arithmetic of the trait's default methods with the real
// clock; only the time source differs. Waiters are woken through a watch
// channel whenever the clock is moved, so `wait_for_epoch` never depends on
// wall-clock time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use galena_core::{ChainEpoch, GalenaError};

use crate::chain::{validate_params, ChainEpochClock};

/// A fake `ChainEpochClock` whose time only moves when the test says so.
pub struct FakeChainClock {
    genesis: DateTime<Utc>,
    duration: Duration,
    now_ms: AtomicI64,
    tick: watch::Sender<i64>,
}

impl FakeChainClock {
    /// Create a fake clock positioned exactly at genesis.
    pub fn new(genesis_unix_secs: i64, epoch_duration: Duration) -> Result<Self, GalenaError> {
        let genesis = validate_params(genesis_unix_secs, epoch_duration)?;
        let genesis_ms = genesis.timestamp_millis();
        let (tick, _) = watch::channel(genesis_ms);
        Ok(FakeChainClock {
            genesis,
            duration: epoch_duration,
            now_ms: AtomicI64::new(genesis_ms),
            tick,
        })
    }

    /// Move the clock forward by `d` and wake every waiter.
    pub fn advance(&self, d: Duration) {
        let ms = self.now_ms.fetch_add(d.as_millis() as i64, Ordering::SeqCst) + d.as_millis() as i64;
        self.tick.send_replace(ms);
    }

    /// Jump the clock to an absolute time and wake every waiter.
    pub fn set(&self, time: DateTime<Utc>) {
        let ms = time.timestamp_millis();
        self.now_ms.store(ms, Ordering::SeqCst);
        self.tick.send_replace(ms);
    }
}

#[async_trait]
impl ChainEpochClock for FakeChainClock {
    fn genesis_time(&self) -> DateTime<Utc> {
        self.genesis
    }

    fn epoch_duration(&self) -> Duration {
        self.duration
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst))
            .unwrap_or(self.genesis)
    }

    async fn wait_for_epoch(&self, epoch: ChainEpoch) {
        let mut rx = self.tick.subscribe();
        loop {
            if self.now() >= self.epoch_start(epoch) {
                return;
            }
            // Err only if the sender is gone, which means the clock itself
            // was dropped; nothing left to wait for.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
