// crates/galena-mining/src/output.rs

use galena_core::{Block, GalenaError};

/// The result of one mining attempt for one epoch: a new block, an explicit
/// "nothing produced", or a failure.
///
/// One `Output` is created per attempt, consumed once from the scheduler's
/// output channel, then discarded. A failing worker reports here instead of
/// taking down the scheduling loop.
#[derive(Debug)]
pub struct Output {
    /// The freshly produced block, if the attempt won the epoch.
    pub new_block: Option<Block>,
    /// The failure, if the attempt errored.
    pub error: Option<GalenaError>,
}

impl Output {
    /// An attempt that produced a block.
    pub fn new_block(block: Block) -> Self {
        Output {
            new_block: Some(block),
            error: None,
        }
    }

    /// An attempt that completed without producing anything this epoch.
    pub fn empty() -> Self {
        Output {
            new_block: None,
            error: None,
        }
    }

    /// An attempt that failed.
    pub fn from_error(error: GalenaError) -> Self {
        Output {
            new_block: None,
            error: Some(error),
        }
    }
}
