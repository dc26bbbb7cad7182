//! Protocol constants and per-node configuration.

use std::{fmt, str::FromStr, time::Duration};

/// Largest value a transaction may carry, in bytes.
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024;

/// Signer count at which a record is reported as having reached quorum.
/// Reporting only: nothing is finalized when it is reached.
pub const DEFAULT_QUORUM_THRESHOLD: usize = 4;

/// How a node resolves an incoming record whose score does not beat the
/// stored one.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TieBreak {
    /// Only a strictly higher score replaces the stored record. Equal-score
    /// conflicts are dropped, so ties may never reconcile.
    #[default]
    Strict,
    /// Records with the same value and nonce have their signer sets unioned.
    /// Different values still need a strictly higher score.
    MergeSigners,
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub tie_break: TieBreak,
    /// Links a record may travel before nodes stop forwarding it.
    /// `None` floods without limit.
    pub max_hops: Option<u32>,
    pub max_value_size: usize,
    /// Upper bound of the random delay applied before handling each message
    /// in concurrent mode.
    pub processing_delay: Option<Duration>,
    pub quorum_threshold: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            tie_break: TieBreak::Strict,
            max_hops: None,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            processing_delay: None,
            quorum_threshold: DEFAULT_QUORUM_THRESHOLD,
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(TieBreak::Strict),
            "merge" | "merge-signers" => Ok(TieBreak::MergeSigners),
            other => Err(format!("unknown tie-break policy: {other}")),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::Strict => f.write_str("strict"),
            TieBreak::MergeSigners => f.write_str("merge"),
        }
    }
}
