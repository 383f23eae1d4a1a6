// crates/galena-mining/src/lib.rs
//
// galena-mining: Block-production scheduling for the Galena Protocol.
//
// The scheduler converts epoch boundaries from the chain clock into
// cancellable mining attempts; the worker is the capability that performs
// one attempt, with a default implementation driving the ticket machine.

pub mod output;
pub mod scheduler;
pub mod worker;

pub use output::Output;
pub use scheduler::{HeadFunc, MiningScheduler};
pub use worker::{DefaultWorker, Worker};
