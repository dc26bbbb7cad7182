use std::collections::HashMap;

use crate::common::TxKey;
use super::transaction::Transaction;

/// Best-known record per key. Never lets a stored score go down.
#[derive(Default, Debug)]
pub struct Store {
    records: HashMap<TxKey, Transaction>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            records: HashMap::new(),
        }
    }

    pub fn get(&self, key: &TxKey) -> Option<&Transaction> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &TxKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn score(&self, key: &TxKey) -> usize {
        self.records.get(key).map_or(0, Transaction::score)
    }

    /// Stores `tx` unless that would lower the score held for its key.
    /// Returns whether the record was written.
    pub fn put(&mut self, tx: Transaction) -> bool {
        if tx.score() < self.score(tx.key()) {
            return false;
        }
        self.records.insert(*tx.key(), tx);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TxKey> {
        self.records.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NodeId;

    #[test]
    fn test_put_refuses_lower_score() {
        let (a, b) = (NodeId::random(), NodeId::random());
        let tx = Transaction::create(&a, 1, b"X".to_vec());
        let mut store = Store::new();

        assert!(store.put(tx.with_signer(a).with_signer(b)));
        assert!(!store.put(tx.with_signer(a)));
        assert_eq!(store.score(tx.key()), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_scores_zero() {
        let store = Store::new();
        assert_eq!(store.score(&TxKey::from(&[1u8; 32])), 0);
        assert!(store.is_empty());
    }
}
