// crates/galena-core/src/block.rs
//
// Chain data structures: blocks, tipsets, tickets, and beacon entries.
//
// A Ticket is a marker of a tick of the chain's clock and the basis of
// leader election: it is the miner's VRF proof over the round's randomness.
// The tuple a ticket is bound to (tip, epoch, beacon entry, new-period flag,
// miner, worker) is carried out-of-band; the ticket itself is proof bytes
// only.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::crypto;
use crate::error::GalenaError;

/// Integer index over fixed-length time intervals since the genesis
/// timestamp. Epoch 0 starts at genesis.
pub type ChainEpoch = u64;

/// Output of a verifiable random function: an ed25519 signature over the
/// round's entropy digest, checkable by anyone holding the signer's public
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VrfProof(Vec<u8>);

impl VrfProof {
    pub fn new(bytes: Vec<u8>) -> Self {
        VrfProof(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A ticket proving eligibility to produce a block for one epoch.
///
/// Valid only for the exact tuple it was created against; it carries no
/// timestamp and no copy of that tuple.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ticket {
    /// The VRF proof over the round's ticket randomness.
    pub vrf_proof: VrfProof,
}

impl Ticket {
    pub fn new(vrf_proof: VrfProof) -> Self {
        Ticket { vrf_proof }
    }
}

/// One round of public randomness from the beacon collaborator.
///
/// Opaque to this crate: the `data` blob is folded into VRF inputs as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeaconEntry {
    /// Beacon round number.
    pub round: u64,
    /// The round's randomness payload.
    pub data: Vec<u8>,
}

/// Content hash identifying a block (SHA-256 of its canonical JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId([u8; 32]);

impl BlockId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Opaque, content-addressed identifier of a tipset: the sorted block ids of
/// its member blocks. Structural equality; produced upstream by chain
/// selection and only read here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TipSetKey(Vec<BlockId>);

impl TipSetKey {
    pub fn new(mut ids: Vec<BlockId>) -> Self {
        ids.sort();
        ids.dedup();
        TipSetKey(ids)
    }

    pub fn ids(&self) -> &[BlockId] {
        &self.0
    }

    /// Canonical bytes for binding this key into a digest.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() * 32);
        for id in &self.0 {
            out.extend_from_slice(id.as_bytes());
        }
        out
    }
}

impl fmt::Display for TipSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{{{}}}", ids.join(","))
    }
}

/// A block header as this subsystem sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Address of the miner that produced the block.
    pub miner: Address,
    /// The election ticket proving the miner's eligibility for this epoch.
    pub ticket: Ticket,
    /// Key of the parent tipset this block was mined on.
    pub parents: TipSetKey,
    /// Chain epoch of this block.
    pub height: ChainEpoch,
    /// The beacon entry the ticket was drawn against.
    pub beacon_entry: BeaconEntry,
    /// Wall-clock time at which the block was assembled.
    pub timestamp: DateTime<Utc>,
}

impl Block {
    /// Content hash of this block: SHA-256 over its canonical JSON encoding.
    pub fn id(&self) -> Result<BlockId, GalenaError> {
        let encoded = serde_json::to_vec(self)?;
        Ok(BlockId(crypto::hash_bytes(&encoded)))
    }
}

/// A non-empty group of blocks at the same height, forming one chain head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSet {
    blocks: Vec<Block>,
    key: TipSetKey,
}

impl TipSet {
    /// Build a tipset from its member blocks.
    ///
    /// Fails on an empty block list or on blocks at differing heights.
    pub fn new(blocks: Vec<Block>) -> Result<Self, GalenaError> {
        let first = blocks
            .first()
            .ok_or_else(|| GalenaError::MalformedInput("tipset must contain at least one block".to_string()))?;

        let height = first.height;
        if blocks.iter().any(|b| b.height != height) {
            return Err(GalenaError::MalformedInput(format!(
                "tipset blocks must share a height (expected {})",
                height
            )));
        }

        let mut ids = Vec::with_capacity(blocks.len());
        for block in &blocks {
            ids.push(block.id()?);
        }

        Ok(TipSet {
            blocks,
            key: TipSetKey::new(ids),
        })
    }

    /// Chain epoch of this tipset (the shared height of its blocks).
    pub fn height(&self) -> ChainEpoch {
        self.blocks[0].height
    }

    /// The content-addressed key of this tipset.
    pub fn key(&self) -> &TipSetKey {
        &self.key
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}
