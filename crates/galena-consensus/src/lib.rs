// crates/galena-consensus/src/lib.rs
//
// galena-consensus: Ticket-based leader election for the Galena Protocol.
//
// This crate implements the election machinery that converts "I claim
// eligibility to mine this epoch" into unforgeable, independently checkable
// proof: the ticket machine, the randomness sampler it draws from, and the
// beacon interface supplying external entropy.

pub mod beacon;
pub mod sampler;
pub mod ticket;

pub use beacon::{Beacon, FixedPeriodBeacon};
pub use sampler::{ChainSampler, FakeSampler, RandomnessSampler, RandomnessSeed, RandomnessTag};
pub use ticket::TicketMachine;
