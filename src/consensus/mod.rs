pub mod message;
pub mod peers;
pub mod processor;
pub mod store;
pub mod transaction;

pub use message::*;
pub use peers::*;
pub use processor::*;
pub use store::*;
pub use transaction::*;

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use crate::common::{NodeId, TieBreak};
    use crate::network::InFlight;
    use super::*;

    /// Hand-driven relay along 0 -> 1 -> 2 using only the rule, a store per
    /// node and raw channels.
    #[tokio::test]
    async fn test_relay_chain() {
        let in_flight = InFlight::new();
        let ids = [NodeId::random(), NodeId::random(), NodeId::random()];
        let mut stores = [Store::new(), Store::new(), Store::new()];

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let to_1 = Peers::new(vec![Mailbox::new(ids[1], tx1, in_flight.clone())]);
        let to_2 = Peers::new(vec![Mailbox::new(ids[2], tx2, in_flight.clone())]);

        let proposal = Transaction::create(&ids[0], 1, b"X".to_vec()).with_signer(ids[0]);
        stores[0].put(proposal.clone());
        to_1.broadcast(&Envelope::new(proposal.clone(), 1));

        let Some(Message::Gossip(envelope)) = rx1.recv().await else {
            panic!("Wrong Message Type");
        };
        let accepted = resolve(stores[1].get(envelope.tx.key()), &envelope.tx, ids[1], TieBreak::Strict)
            .into_accepted()
            .unwrap();
        stores[1].put(accepted.clone());
        to_2.broadcast(&Envelope::new(accepted, envelope.hops + 1));

        let Some(Message::Gossip(envelope)) = rx2.recv().await else {
            panic!("Wrong Message Type");
        };
        assert_eq!(envelope.hops, 2);
        let accepted = resolve(stores[2].get(envelope.tx.key()), &envelope.tx, ids[2], TieBreak::Strict)
            .into_accepted()
            .unwrap();
        stores[2].put(accepted);

        let record = stores[2].get(proposal.key()).unwrap();
        assert_eq!(record.score(), 3);
        assert_eq!(record.value(), b"X");
        assert!(ids.iter().all(|id| record.is_signed_by(id)));
        assert_eq!(stores[1].score(proposal.key()), 2);
    }
}
