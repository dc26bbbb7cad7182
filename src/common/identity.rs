use std::fmt;

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest as ShaDigest, Sha256};

/*
    Identities are opaque random tokens. A node "signs" a record by adding
    its NodeId to the record's signer set: this is attestation by identity,
    not a signature a third party could verify.
*/

pub const ID_LEN: usize = 32;

pub type Digest = [u8; ID_LEN];

pub trait Hashable {
    fn hash(&self) -> Digest;
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub key: [u8; ID_LEN],
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxKey {
    pub key: Digest,
}

impl NodeId {
    pub fn random() -> Self {
        let mut key = [0u8; ID_LEN];
        OsRng.fill_bytes(&mut key);
        NodeId { key }
    }

    /// First four bytes in hex, enough to tell nodes apart in logs.
    pub fn short(&self) -> String {
        hex::encode(&self.key[..4])
    }
}

impl TxKey {
    /// Derives a fresh key bound to the proposal's content. The random salt
    /// keeps two identical proposals from colliding.
    pub fn derive(proposer: &NodeId, nonce: u64, value: &[u8]) -> Self {
        let mut salt = [0u8; ID_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut hasher = Sha256::new();
        hasher.update(proposer.as_ref());
        hasher.update(nonce.to_be_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
        hasher.update(salt);
        let result = hasher.finalize();
        let mut key = [0u8; ID_LEN];
        key.copy_from_slice(&result[..]);
        TxKey { key }
    }

    pub fn short(&self) -> String {
        hex::encode(&self.key[..4])
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

impl AsRef<[u8]> for TxKey {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

impl From<&[u8; ID_LEN]> for NodeId {
    fn from(bytes: &[u8; ID_LEN]) -> Self {
        NodeId { key: *bytes }
    }
}

impl From<&[u8; ID_LEN]> for TxKey {
    fn from(bytes: &[u8; ID_LEN]) -> Self {
        TxKey { key: *bytes }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}

impl fmt::Display for TxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

impl fmt::Debug for TxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxKey({})", self.short())
    }
}
