// crates/galena-clock/src/lib.rs
//
// galena-clock: Chain epoch clock for the Galena Protocol.
//
// Converts wall-clock time into the chain's logical epoch numbers and lets
// callers suspend until an epoch boundary. The time source is injectable so
// the scheduler is deterministic under test.

pub mod chain;
pub mod fake;

pub use chain::{ChainClock, ChainEpochClock};
pub use fake::FakeChainClock;
