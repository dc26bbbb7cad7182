/*
    Signature-quorum gossip. Nodes do not trust a proposer's value on its
    own: a record is worth as much as the number of distinct nodes that
    have attested to it (its score).

    A node that originates a record signs it, stores it and floods it to
    its neighbors. A node receiving a record signs and stores it the first
    time it sees the key; later it only replaces what it holds with a
    strictly higher-scored version, re-signing and re-flooding it. Because
    scores only grow and are bounded by the number of nodes, flooding dies
    out on its own and each key settles on its best-corroborated version.

    Signing here is attestation by identity: a node adds its id to the
    signer set. It is not a signature a third party could verify.
*/

pub mod common;
pub mod consensus;
pub mod network;

pub use common::{Error, NodeConfig, NodeId, Result, TieBreak, TxKey};
pub use consensus::{Decision, Envelope, Message, Transaction};
pub use network::{Network, Node, Topology};
