//! QR-code treasure hunt.
//!
//! Steps are stored as (code, picture) pairs. Players are shown a picture,
//! find the QR label hidden there and scan it to get the next picture; the
//! last stored step is where the treasure is.

mod game;
mod session;
mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use game::{HuntGame, ScanOutcome};
pub use session::{HuntEvent, HuntSession, LineScanSource, ScanSource, StdinScanSource};
pub use store::{HuntStep, HuntStore, CREATE_STEPS_TABLE, HUNT_SCHEMA};

/// Order in which clues are handed out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HuntMode {
    /// Stored order.
    #[default]
    Sequential,
    /// Shuffled, with the treasure still last.
    Random,
}

impl fmt::Display for HuntMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Random => write!(f, "random"),
        }
    }
}
