// crates/galena-mining/src/scheduler.rs
//
// The mining scheduler: wakes at each epoch boundary, decides how many null
// epochs have elapsed since the current head, and launches one cancellable
// worker attempt per epoch.
//
// One scheduling loop owns all launching and cancelling, so the current-job
// handle needs no lock. Each attempt runs under a child token of the
// shutdown token: a new boundary supersedes the previous attempt, and
// shutdown cancels whatever is still in flight. Every task, the loop
// included, is spawned on a TaskTracker; the tracker is closed only after
// the loop stops launching, so waiting on it is a race-free completion
// barrier.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use galena_clock::ChainEpochClock;
use galena_core::{ChainEpoch, GalenaError, TipSet};

use crate::output::Output;
use crate::worker::Worker;

/// Bound on buffered, unconsumed outputs. Workers race emission against
/// cancellation, so a stalled consumer delays at most one in-flight attempt
/// and never the loop itself.
const OUTPUT_CHANNEL_CAPACITY: usize = 16;

/// Supplied accessor for the current chain head, polled once per tick.
/// Errors are transient: the tick is skipped, not fatal.
pub type HeadFunc = Arc<dyn Fn() -> Result<TipSet, GalenaError> + Send + Sync>;

/// Drives per-epoch mining attempts off the chain epoch clock.
pub struct MiningScheduler<W, C> {
    worker: Arc<W>,
    head: HeadFunc,
    clock: Arc<C>,
    paused: Arc<AtomicBool>,
    started: AtomicBool,
}

impl<W, C> MiningScheduler<W, C>
where
    W: Worker,
    C: ChainEpochClock + 'static,
{
    pub fn new(worker: Arc<W>, head: HeadFunc, clock: Arc<C>) -> Self {
        MiningScheduler {
            worker,
            head,
            clock,
            paused: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
        }
    }

    /// Suspend launching. Epoch boundaries are still observed, so null-block
    /// counting stays correct while paused.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        tracing::info!("mining paused");
    }

    /// Resume launching at the next epoch boundary. The next attempt's null
    /// count covers every paused epoch.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        tracing::info!("mining resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Spawn the scheduling loop.
    ///
    /// Returns the output channel and the completion barrier: after
    /// cancelling `shutdown`, `tracker.wait()` releases only once the loop
    /// and every launched attempt have returned.
    ///
    /// The current, partially elapsed epoch is never mined; the first
    /// attempt fires at the next boundary. A node restarted mid-epoch
    /// therefore cannot mine the same epoch twice.
    pub fn start(
        &self,
        shutdown: CancellationToken,
    ) -> Result<(mpsc::Receiver<Output>, TaskTracker), GalenaError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(GalenaError::InvalidState(
                "scheduler already started".to_string(),
            ));
        }

        let (out_tx, out_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let tracker = TaskTracker::new();

        // Captured before spawning, so clock movement after `start` returns
        // cannot shift which epoch counts as "next".
        let first_epoch = self.clock.current_epoch() + 1;

        let mine_loop = SchedulingLoop {
            worker: self.worker.clone(),
            head: self.head.clone(),
            clock: self.clock.clone(),
            paused: self.paused.clone(),
        };
        let loop_tracker = tracker.clone();
        tracker.spawn(async move {
            mine_loop.run(shutdown, loop_tracker, out_tx, first_epoch).await;
        });

        Ok((out_rx, tracker))
    }
}

/// The state owned by the scheduling loop task.
struct SchedulingLoop<W, C> {
    worker: Arc<W>,
    head: HeadFunc,
    clock: Arc<C>,
    paused: Arc<AtomicBool>,
}

impl<W, C> SchedulingLoop<W, C>
where
    W: Worker,
    C: ChainEpochClock + 'static,
{
    async fn run(
        self,
        shutdown: CancellationToken,
        tracker: TaskTracker,
        out: mpsc::Sender<Output>,
        first_epoch: ChainEpoch,
    ) {
        tracing::info!("mining scheduler started (first epoch {})", first_epoch);

        let mut next_epoch = first_epoch;
        let mut current_job: Option<CancellationToken> = None;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = self.clock.wait_for_epoch(next_epoch) => {}
            }

            let epoch = next_epoch;
            next_epoch += 1;

            let base = match (self.head)() {
                Ok(tipset) => tipset,
                Err(e) => {
                    tracing::warn!("skipping epoch {}: head unavailable: {}", epoch, e);
                    continue;
                }
            };

            if self.paused.load(Ordering::SeqCst) {
                tracing::debug!("paused, not mining epoch {}", epoch);
                continue;
            }

            // Work for a passed epoch is stale: supersede it before the new
            // attempt launches. Idempotent when the job already finished.
            if let Some(job) = current_job.take() {
                job.cancel();
            }

            let null_count = epoch.saturating_sub(base.height());
            let job_token = shutdown.child_token();
            current_job = Some(job_token.clone());

            tracing::debug!(
                "epoch {}: launching mining attempt ({} null epochs past head)",
                epoch,
                null_count
            );

            let worker = self.worker.clone();
            let out = out.clone();
            tracker.spawn(async move {
                worker.mine(job_token, base, null_count, out).await;
            });
        }

        // In-flight attempts hold child tokens of `shutdown` and are already
        // observing cancellation. Freeze launches before anyone waits.
        tracker.close();
        tracing::info!("mining scheduler stopped");
    }
}
