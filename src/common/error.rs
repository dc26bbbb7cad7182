//! Error types for the gossip protocol.

use thiserror::Error;

use super::identity::{NodeId, TxKey};

/// Result type for gossip operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A relayed transaction must carry at least its proposer's attestation.
    #[error("transaction {key} carries no signers")]
    Unsigned { key: TxKey },

    /// Nonces start at 1 for every proposer.
    #[error("transaction {key} has nonce 0")]
    InvalidNonce { key: TxKey },

    #[error("transaction {key} value of {size} bytes exceeds limit of {limit}")]
    ValueTooLarge { key: TxKey, size: usize, limit: usize },

    #[error("proposed value of {size} bytes exceeds limit of {limit}")]
    ProposalTooLarge { size: usize, limit: usize },

    /// The neighbor's mailbox receiver has been dropped.
    #[error("mailbox of node {0} is closed")]
    MailboxClosed(NodeId),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("node index {index} out of range for network of {len} nodes")]
    UnknownNode { index: usize, len: usize },

    /// A node task panicked or was cancelled before returning its state.
    #[error("node task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
