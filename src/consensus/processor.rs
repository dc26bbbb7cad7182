use crate::common::{NodeId, TieBreak};
use super::transaction::Transaction;

/*
    The acceptance rule, kept free of I/O so every scheduling mode runs
    the same code:

      - unseen key: sign, store, rebroadcast
      - seen key, strictly higher score: store the re-signed record, rebroadcast
      - seen key, otherwise: drop, unless the tie-break merges signer sets

    Every record produced here carries the deciding node's own identity,
    and each accepted record scores strictly higher than the one it
    replaces. Scores are bounded by the number of nodes, so a key can only
    be accepted finitely many times and flooding terminates.
*/

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Decision {
    /// First sight of the key.
    Insert(Transaction),
    /// Higher-scored record replaces the stored one.
    Replace(Transaction),
    /// Same payload with new signers, unioned into the stored record.
    Merge(Transaction),
    Reject {
        local_score: usize,
        incoming_score: usize,
    },
}

impl Decision {
    /// The record to store and rebroadcast, if any.
    pub fn accepted(&self) -> Option<&Transaction> {
        match self {
            Decision::Insert(tx) | Decision::Replace(tx) | Decision::Merge(tx) => Some(tx),
            Decision::Reject { .. } => None,
        }
    }

    pub fn into_accepted(self) -> Option<Transaction> {
        match self {
            Decision::Insert(tx) | Decision::Replace(tx) | Decision::Merge(tx) => Some(tx),
            Decision::Reject { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Insert(_) => "insert",
            Decision::Replace(_) => "replace",
            Decision::Merge(_) => "merge",
            Decision::Reject { .. } => "reject",
        }
    }
}

pub fn resolve(
    local: Option<&Transaction>,
    incoming: &Transaction,
    me: NodeId,
    tie_break: TieBreak,
) -> Decision {
    let Some(stored) = local else {
        return Decision::Insert(incoming.with_signer(me));
    };

    let local_score = stored.score();
    let incoming_score = incoming.score();

    if tie_break == TieBreak::MergeSigners && stored.same_payload(incoming) {
        let merged = stored.merged_with(incoming).with_signer(me);
        if merged.score() > local_score {
            return Decision::Merge(merged);
        }
        return Decision::Reject {
            local_score,
            incoming_score,
        };
    }

    if incoming_score > local_score {
        return Decision::Replace(incoming.with_signer(me));
    }

    Decision::Reject {
        local_score,
        incoming_score,
    }
}
