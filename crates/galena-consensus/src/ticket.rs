// crates/galena-consensus/src/ticket.rs
//
// The ticket machine: creates and validates the VRF tickets that gate block
// production.
//
// Creation needs the private signing capability for the worker address;
// validation needs only the public key embedded in that address. Any peer
// can therefore re-derive the same verdict on any other node's election
// claim without trusting it.

use sha2::{Digest, Sha256};

use galena_core::{
    crypto, Address, BeaconEntry, ChainEpoch, GalenaError, Signer, Ticket, TipSetKey,
};

use crate::sampler::{RandomnessSampler, RandomnessTag};

/// Creates and validates election tickets against a randomness sampler.
pub struct TicketMachine<S: RandomnessSampler> {
    sampler: S,
}

impl<S: RandomnessSampler> TicketMachine<S> {
    pub fn new(sampler: S) -> Self {
        TicketMachine { sampler }
    }

    /// Produce a ticket for `{head, epoch, election_entry, is_new_period,
    /// miner}`, proven by the key controlling `worker_addr`.
    ///
    /// Fails with `GalenaError::Signing` (and no ticket) when the signer
    /// does not control `worker_addr`.
    pub async fn make_ticket<Sg>(
        &self,
        head: &TipSetKey,
        epoch: ChainEpoch,
        miner: &Address,
        election_entry: &BeaconEntry,
        is_new_period: bool,
        worker_addr: &Address,
        signer: &Sg,
    ) -> Result<Ticket, GalenaError>
    where
        Sg: Signer + ?Sized,
    {
        let input = self.ticket_vrf_input(head, epoch, miner, election_entry, is_new_period)?;
        let vrf_proof = signer.sign_bytes(worker_addr, &input).await?;
        Ok(Ticket::new(vrf_proof))
    }

    /// Check that `ticket` was produced by `worker_addr` for exactly the
    /// given tuple. `Ok(())` means valid.
    ///
    /// Pure function of its inputs: the entropy digest is recomputed
    /// independently and the proof verified against the public key embedded
    /// in `worker_addr`.
    pub fn is_valid_ticket(
        &self,
        head: &TipSetKey,
        election_entry: &BeaconEntry,
        is_new_period: bool,
        epoch: ChainEpoch,
        miner: &Address,
        worker_addr: &Address,
        ticket: &Ticket,
    ) -> Result<(), GalenaError> {
        if ticket.vrf_proof.is_empty() {
            return Err(GalenaError::MalformedInput(
                "ticket carries no VRF proof".to_string(),
            ));
        }
        if ticket.vrf_proof.as_bytes().len() != 64 {
            return Err(GalenaError::MalformedInput(format!(
                "VRF proof must be 64 bytes, got {}",
                ticket.vrf_proof.as_bytes().len()
            )));
        }
        let public_key = worker_addr.public_key().ok_or_else(|| {
            GalenaError::MalformedInput(format!(
                "worker address {} does not embed a public key",
                worker_addr
            ))
        })?;

        let input = self.ticket_vrf_input(head, epoch, miner, election_entry, is_new_period)?;
        let valid = crypto::verify_proof(public_key, &input, &ticket.vrf_proof)
            .map_err(|e| GalenaError::MalformedInput(e.to_string()))?;
        if valid {
            Ok(())
        } else {
            Err(GalenaError::InvalidTicket(format!(
                "proof does not verify for worker {} at epoch {}",
                worker_addr, epoch
            )))
        }
    }

    /// The entropy digest the VRF proof is taken over: the sampler's seed
    /// for `{head, epoch}` combined with the election entry, the new-period
    /// flag, the epoch, and the miner address.
    fn ticket_vrf_input(
        &self,
        head: &TipSetKey,
        epoch: ChainEpoch,
        miner: &Address,
        election_entry: &BeaconEntry,
        is_new_period: bool,
    ) -> Result<Vec<u8>, GalenaError> {
        let seed = self
            .sampler
            .sample(head, RandomnessTag::TicketProduction, epoch)?;

        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(election_entry.round.to_be_bytes());
        hasher.update(&election_entry.data);
        hasher.update([is_new_period as u8]);
        hasher.update(epoch.to_be_bytes());
        hasher.update(miner.to_bytes());
        Ok(hasher.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::FakeSampler;
    use galena_core::{Keypair, KeystoreSigner, Ticket, VrfProof};

    fn test_machine() -> TicketMachine<FakeSampler> {
        TicketMachine::new(FakeSampler { seed: 0 })
    }

    async fn require_valid_ticket(
        tm: &TicketMachine<FakeSampler>,
        head: &TipSetKey,
        epoch: ChainEpoch,
        miner: &Address,
        worker: &Address,
        signer: &KeystoreSigner,
    ) {
        let entry = BeaconEntry::default();
        let new_period = false;
        let ticket = tm
            .make_ticket(head, epoch, miner, &entry, new_period, worker, signer)
            .await
            .unwrap();

        tm.is_valid_ticket(head, &entry, new_period, epoch, miner, worker, &ticket)
            .unwrap();
    }

    #[tokio::test]
    async fn test_gen_valid_ticket_chain() {
        // Interleave 3 signers over a schedule of epochs; every ticket must
        // round-trip through validation.
        let head = TipSetKey::default();
        let miner = Address::new_id(1);

        let mut signer = KeystoreSigner::new();
        let addr1 = signer.add_key(Keypair::generate());
        let addr2 = signer.add_key(Keypair::generate());
        let addr3 = signer.add_key(Keypair::generate());

        let tm = test_machine();
        let schedule = [&addr1, &addr1, &addr1, &addr2, &addr3, &addr3, &addr1, &addr2];

        for (i, worker) in schedule.iter().enumerate() {
            require_valid_ticket(&tm, &head, i as ChainEpoch, &miner, worker, &signer).await;
        }
    }

    #[tokio::test]
    async fn test_make_ticket_fails_with_unknown_signer() {
        let head = TipSetKey::default();
        let miner = Address::new_id(1);
        let signer = KeystoreSigner::new();
        // An address whose key the signer does not hold.
        let bad_addr = Keypair::generate().address();

        let tm = test_machine();
        let result = tm
            .make_ticket(
                &head,
                1,
                &miner,
                &BeaconEntry::default(),
                false,
                &bad_addr,
                &signer,
            )
            .await;
        assert!(matches!(result, Err(GalenaError::Signing(_))));
    }

    #[tokio::test]
    async fn test_ticket_bound_to_worker_address() {
        let head = TipSetKey::default();
        let miner = Address::new_id(1);

        let mut signer = KeystoreSigner::new();
        let addr1 = signer.add_key(Keypair::generate());
        let addr2 = signer.add_key(Keypair::generate());

        let tm = test_machine();
        let entry = BeaconEntry::default();
        let ticket = tm
            .make_ticket(&head, 4, &miner, &entry, false, &addr1, &signer)
            .await
            .unwrap();

        // Validating under a different worker address must fail.
        let result = tm.is_valid_ticket(&head, &entry, false, 4, &miner, &addr2, &ticket);
        assert!(matches!(result, Err(GalenaError::InvalidTicket(_))));
    }

    #[tokio::test]
    async fn test_ticket_bound_to_tuple() {
        let head = TipSetKey::default();
        let miner = Address::new_id(1);

        let mut signer = KeystoreSigner::new();
        let worker = signer.add_key(Keypair::generate());

        let tm = test_machine();
        let entry = BeaconEntry::default();
        let ticket = tm
            .make_ticket(&head, 4, &miner, &entry, false, &worker, &signer)
            .await
            .unwrap();

        // Wrong epoch.
        assert!(matches!(
            tm.is_valid_ticket(&head, &entry, false, 5, &miner, &worker, &ticket),
            Err(GalenaError::InvalidTicket(_))
        ));
        // Flipped new-period flag.
        assert!(matches!(
            tm.is_valid_ticket(&head, &entry, true, 4, &miner, &worker, &ticket),
            Err(GalenaError::InvalidTicket(_))
        ));
        // Different election entry.
        let other_entry = BeaconEntry {
            round: 9,
            data: vec![1, 2, 3],
        };
        assert!(matches!(
            tm.is_valid_ticket(&head, &other_entry, false, 4, &miner, &worker, &ticket),
            Err(GalenaError::InvalidTicket(_))
        ));
    }

    #[tokio::test]
    async fn test_tampered_proof_rejected() {
        let head = TipSetKey::default();
        let miner = Address::new_id(1);

        let mut signer = KeystoreSigner::new();
        let worker = signer.add_key(Keypair::generate());

        let tm = test_machine();
        let entry = BeaconEntry::default();
        let ticket = tm
            .make_ticket(&head, 2, &miner, &entry, false, &worker, &signer)
            .await
            .unwrap();

        let mut bytes = ticket.vrf_proof.as_bytes().to_vec();
        bytes[0] ^= 0xff;
        let tampered = Ticket::new(VrfProof::new(bytes));

        let result = tm.is_valid_ticket(&head, &entry, false, 2, &miner, &worker, &tampered);
        assert!(matches!(result, Err(GalenaError::InvalidTicket(_))));
    }

    #[test]
    fn test_empty_proof_is_malformed() {
        let tm = test_machine();
        let worker = Keypair::generate().address();

        let result = tm.is_valid_ticket(
            &TipSetKey::default(),
            &BeaconEntry::default(),
            false,
            0,
            &Address::new_id(1),
            &worker,
            &Ticket::default(),
        );
        assert!(matches!(result, Err(GalenaError::MalformedInput(_))));
    }

    #[test]
    fn test_keyless_worker_address_is_malformed() {
        let tm = test_machine();
        let ticket = Ticket::new(VrfProof::new(vec![0u8; 64]));

        let result = tm.is_valid_ticket(
            &TipSetKey::default(),
            &BeaconEntry::default(),
            false,
            0,
            &Address::new_id(1),
            &Address::new_id(2),
            &ticket,
        );
        assert!(matches!(result, Err(GalenaError::MalformedInput(_))));
    }
}
