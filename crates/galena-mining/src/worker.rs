// crates/galena-mining/src/worker.rs
//
// The mining worker: the capability the scheduler invokes once per epoch,
// and the default ticket-driven implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use galena_core::{Address, Block, GalenaError, Signer, TipSet};
use galena_consensus::{Beacon, RandomnessSampler, TicketMachine};

use crate::output::Output;

/// Capability to attempt one block for one epoch.
///
/// Implementations must select over `cancel`: once the token fires, stop
/// consuming resources and return without emitting partial output. The
/// scheduler never reuses a token for a later epoch. The return value is
/// advisory completion status; the scheduler does not use it for control
/// flow.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    async fn mine(
        &self,
        cancel: CancellationToken,
        base: TipSet,
        null_block_count: u64,
        out: mpsc::Sender<Output>,
    ) -> bool;
}

/// The production worker: draws the epoch's beacon entry, proves eligibility
/// with a ticket, and assembles a block on top of the base tipset.
pub struct DefaultWorker<S, R: RandomnessSampler, B> {
    ticket_machine: TicketMachine<R>,
    signer: Arc<S>,
    beacon: Arc<B>,
    miner_addr: Address,
    worker_addr: Address,
}

impl<S, R, B> DefaultWorker<S, R, B>
where
    S: Signer + 'static,
    R: RandomnessSampler + 'static,
    B: Beacon + 'static,
{
    pub fn new(
        ticket_machine: TicketMachine<R>,
        signer: Arc<S>,
        beacon: Arc<B>,
        miner_addr: Address,
        worker_addr: Address,
    ) -> Self {
        DefaultWorker {
            ticket_machine,
            signer,
            beacon,
            miner_addr,
            worker_addr,
        }
    }

    /// One block attempt. The attempt epoch is the base tipset's epoch plus
    /// the null count the scheduler observed this tick.
    async fn attempt(&self, base: &TipSet, null_block_count: u64) -> Result<Block, GalenaError> {
        let epoch = base.height() + null_block_count;

        let entry = self.beacon.entry_for_epoch(epoch).await?;
        let is_new_period = self.beacon.is_new_period(epoch);

        let ticket = self
            .ticket_machine
            .make_ticket(
                base.key(),
                epoch,
                &self.miner_addr,
                &entry,
                is_new_period,
                &self.worker_addr,
                self.signer.as_ref(),
            )
            .await?;

        Ok(Block {
            miner: self.miner_addr.clone(),
            ticket,
            parents: base.key().clone(),
            height: epoch,
            beacon_entry: entry,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl<S, R, B> Worker for DefaultWorker<S, R, B>
where
    S: Signer + 'static,
    R: RandomnessSampler + 'static,
    B: Beacon + 'static,
{
    async fn mine(
        &self,
        cancel: CancellationToken,
        base: TipSet,
        null_block_count: u64,
        out: mpsc::Sender<Output>,
    ) -> bool {
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            result = self.attempt(&base, null_block_count) => match result {
                Ok(block) => Output::new_block(block),
                Err(e) => {
                    tracing::warn!(
                        "mining attempt failed at {} null blocks past epoch {}: {}",
                        null_block_count,
                        base.height(),
                        e
                    );
                    Output::from_error(e)
                }
            },
        };

        // Emission races against cancellation: a stalled consumer must not
        // outlive this epoch's attempt.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            sent = out.send(output) => sent.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_consensus::{FakeSampler, FixedPeriodBeacon};
    use galena_core::{
        BeaconEntry, Keypair, KeystoreSigner, Ticket, TipSetKey, VrfProof,
    };

    fn genesis_tipset() -> TipSet {
        let block = Block {
            miner: Address::new_id(0),
            ticket: Ticket::new(VrfProof::new(vec![0u8; 8])),
            parents: TipSetKey::default(),
            height: 0,
            beacon_entry: BeaconEntry::default(),
            timestamp: chrono::DateTime::<Utc>::from_timestamp(1_234_567_890, 0).unwrap(),
        };
        TipSet::new(vec![block]).unwrap()
    }

    fn test_worker(signer: KeystoreSigner, worker_addr: Address) -> DefaultWorker<KeystoreSigner, FakeSampler, FixedPeriodBeacon> {
        DefaultWorker::new(
            TicketMachine::new(FakeSampler { seed: 0 }),
            Arc::new(signer),
            Arc::new(FixedPeriodBeacon::new(0, 10).unwrap()),
            Address::new_id(1),
            worker_addr,
        )
    }

    #[tokio::test]
    async fn test_mine_emits_a_valid_block() {
        let mut signer = KeystoreSigner::new();
        let worker_addr = signer.add_key(Keypair::generate());
        let worker = test_worker(signer, worker_addr.clone());

        let (tx, mut rx) = mpsc::channel(1);
        let base = genesis_tipset();
        let done = worker
            .mine(CancellationToken::new(), base.clone(), 3, tx)
            .await;
        assert!(done);

        let output = rx.recv().await.unwrap();
        let block = output.new_block.expect("attempt should produce a block");
        assert!(output.error.is_none());
        assert_eq!(block.height, 3);
        assert_eq!(block.parents, *base.key());

        // The emitted ticket must satisfy independent validation.
        let tm = TicketMachine::new(FakeSampler { seed: 0 });
        tm.is_valid_ticket(
            base.key(),
            &block.beacon_entry,
            false,
            3,
            &Address::new_id(1),
            &worker_addr,
            &block.ticket,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_signing_failure_reported_through_output() {
        // Signer controls no keys at all, so the ticket cannot be made.
        let stranger = Keypair::generate().address();
        let worker = test_worker(KeystoreSigner::new(), stranger);

        let (tx, mut rx) = mpsc::channel(1);
        worker
            .mine(CancellationToken::new(), genesis_tipset(), 0, tx)
            .await;

        let output = rx.recv().await.unwrap();
        assert!(output.new_block.is_none());
        assert!(matches!(output.error, Some(GalenaError::Signing(_))));
    }

    #[tokio::test]
    async fn test_cancelled_worker_emits_nothing() {
        let mut signer = KeystoreSigner::new();
        let worker_addr = signer.add_key(Keypair::generate());
        let worker = test_worker(signer, worker_addr);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, mut rx) = mpsc::channel(1);
        let done = worker
            .mine(cancel, genesis_tipset(), 0, tx)
            .await;
        assert!(!done);
        assert!(rx.try_recv().is_err());
    }
}
