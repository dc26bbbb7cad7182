use std::collections::BTreeSet;

use sha2::{Digest as ShaDigest, Sha256};

use crate::common::{Digest, Error, Hashable, NodeId, Result, TxKey};

/*
    A transaction is a record identified by its key, carrying a value fixed
    at proposal time, the proposer's nonce, and the set of nodes that have
    attested to this exact (key, value, nonce) triple. Only the signer set
    ever grows; its size is the transaction's score.
*/

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    key: TxKey,
    value: Vec<u8>,
    nonce: u64,
    signers: BTreeSet<NodeId>,
}

impl Transaction {
    /// Fresh, unsigned transaction with a newly derived key.
    pub fn create(proposer: &NodeId, nonce: u64, value: Vec<u8>) -> Self {
        Transaction {
            key: TxKey::derive(proposer, nonce, &value),
            value,
            nonce,
            signers: BTreeSet::new(),
        }
    }

    /// Rebuilds a transaction received from outside the process. Callers
    /// must run [`Transaction::validate`] before acting on it.
    pub fn from_parts(
        key: TxKey,
        value: Vec<u8>,
        nonce: u64,
        signers: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Transaction {
            key,
            value,
            nonce,
            signers: signers.into_iter().collect(),
        }
    }

    pub fn key(&self) -> &TxKey {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn signers(&self) -> &BTreeSet<NodeId> {
        &self.signers
    }

    pub fn score(&self) -> usize {
        self.signers.len()
    }

    pub fn is_signed_by(&self, id: &NodeId) -> bool {
        self.signers.contains(id)
    }

    /// Copy with `signer` attesting. Already present means unchanged.
    pub fn with_signer(&self, signer: NodeId) -> Self {
        let mut signed = self.clone();
        signed.signers.insert(signer);
        signed
    }

    /// True when both attest to the same (key, value, nonce) triple,
    /// whatever their signers.
    pub fn same_payload(&self, other: &Transaction) -> bool {
        self.hash() == other.hash()
    }

    /// Copy carrying the union of both signer sets. Only meaningful for
    /// transactions with the same payload.
    pub fn merged_with(&self, other: &Transaction) -> Self {
        let mut merged = self.clone();
        merged.signers.extend(other.signers.iter().copied());
        merged
    }

    pub fn validate(&self, max_value_size: usize) -> Result<()> {
        if self.signers.is_empty() {
            return Err(Error::Unsigned { key: self.key });
        }
        if self.nonce == 0 {
            return Err(Error::InvalidNonce { key: self.key });
        }
        if self.value.len() > max_value_size {
            return Err(Error::ValueTooLarge {
                key: self.key,
                size: self.value.len(),
                limit: max_value_size,
            });
        }
        Ok(())
    }
}

impl Hashable for Transaction {
    /// Digest of the attested (key, value, nonce) triple. Signers are not
    /// part of it.
    fn hash(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.key.as_ref());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update((self.value.len() as u64).to_be_bytes());
        hasher.update(&self.value);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result[..]);
        digest
    }
}
