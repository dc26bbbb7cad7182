use std::ops::ControlFlow;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};

use crate::{
    common::{Error, NodeConfig, NodeId, Result, TxKey},
    consensus::{resolve, Envelope, Mailbox, Message, Peers, Store, Transaction},
};
use super::inflight::InFlight;

/// Per-node counters of what the acceptance rule did.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NodeStats {
    pub received: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub malformed: u64,
    pub sent: u64,
    pub dropped: u64,
}

/// A gossip participant. Owns its store and the read end of its mailbox;
/// other nodes only ever hold its [`Mailbox`].
pub struct Node {
    id: NodeId,
    label: String,
    nonce: u64,
    store: Store,
    peers: Peers,
    inbox: UnboundedReceiver<Message>,
    mailbox: Mailbox,
    in_flight: InFlight,
    config: NodeConfig,
    stats: NodeStats,
}

impl Node {
    pub fn new(label: impl Into<String>, config: NodeConfig) -> Self {
        Self::with_in_flight(label, config, InFlight::new())
    }

    /// Node sharing a quiescence counter with the rest of its network.
    pub fn with_in_flight(label: impl Into<String>, config: NodeConfig, in_flight: InFlight) -> Self {
        let id = NodeId::random();
        let (tx, inbox) = mpsc::unbounded_channel();
        Node {
            id,
            label: label.into(),
            nonce: 0,
            store: Store::new(),
            peers: Peers::default(),
            inbox,
            mailbox: Mailbox::new(id, tx, in_flight.clone()),
            in_flight,
            config,
            stats: NodeStats::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    pub fn neighbors(&self) -> Vec<NodeId> {
        self.peers.ids()
    }

    /// Attaches the neighbor set. Neighbors are static for the run, so this
    /// is called once during setup.
    pub fn connect(&mut self, neighbors: Vec<Mailbox>) {
        tracing::debug!(node = %self.label, neighbors = neighbors.len(), "connected");
        self.peers = Peers::new(neighbors);
    }

    pub fn has_quorum(&self, key: &TxKey) -> bool {
        self.store.score(key) >= self.config.quorum_threshold
    }

    /// Attests to `tx`. Signing twice changes nothing.
    pub fn sign(&self, tx: &Transaction) -> Transaction {
        tx.with_signer(self.id)
    }

    /// Originates a new record: self-signs, stores and floods it.
    pub fn propose(&mut self, value: Vec<u8>) -> Result<TxKey> {
        if value.len() > self.config.max_value_size {
            return Err(Error::ProposalTooLarge {
                size: value.len(),
                limit: self.config.max_value_size,
            });
        }

        self.nonce += 1;
        let tx = self.sign(&Transaction::create(&self.id, self.nonce, value));
        let key = *tx.key();
        self.store.put(tx.clone());
        tracing::debug!(node = %self.label, key = %key, nonce = self.nonce, "proposed transaction");

        self.broadcast(Envelope::new(tx, 1));
        Ok(key)
    }

    /// Floods `envelope` to every neighbor, in neighbor order.
    pub fn broadcast(&mut self, envelope: Envelope) {
        let delivery = self.peers.broadcast(&envelope);
        self.stats.sent += delivery.sent as u64;
        for e in delivery.failed {
            self.stats.dropped += 1;
            tracing::warn!(node = %self.label, key = %envelope.tx.key(), "dropping send: {}", e);
        }
    }

    /// Drains the mailbox until it is observed empty. Returns the number of
    /// messages handled.
    pub fn process(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.inbox.try_recv() {
                Ok(message) => {
                    handled += 1;
                    if self.handle(message).is_break() {
                        tracing::debug!(node = %self.label, "ignoring shutdown while draining");
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Actor loop: handles messages as they arrive until told to stop, then
    /// hands the node back for inspection.
    pub async fn run(mut self) -> Self {
        tracing::info!(node = %self.label, id = %self.id, "node started");
        while let Some(message) = self.inbox.recv().await {
            if !message.is_control() {
                if let Some(delay) = self.config.processing_delay {
                    let pause = jitter(delay);
                    tokio::time::sleep(pause).await;
                }
            }
            if self.handle(message).is_break() {
                break;
            }
        }
        tracing::info!(node = %self.label, records = self.store.len(), "node stopped");
        self
    }

    fn handle(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::Gossip(envelope) => self.receive(envelope),
            Message::Propose(value) => {
                if let Err(e) = self.propose(value) {
                    tracing::warn!(node = %self.label, "proposal refused: {}", e);
                }
            }
            Message::Shutdown => return ControlFlow::Break(()),
        }
        self.in_flight.done();
        ControlFlow::Continue(())
    }

    fn receive(&mut self, envelope: Envelope) {
        self.stats.received += 1;
        let Envelope { tx, hops } = envelope;

        if let Err(e) = tx.validate(self.config.max_value_size) {
            self.stats.malformed += 1;
            tracing::warn!(node = %self.label, hops, "rejecting malformed transaction: {}", e);
            return;
        }

        let decision = resolve(self.store.get(tx.key()), &tx, self.id, self.config.tie_break);
        tracing::debug!(
            node = %self.label,
            key = %tx.key(),
            local_score = self.store.score(tx.key()),
            incoming_score = tx.score(),
            decision = decision.label(),
            "received transaction"
        );

        let Some(accepted) = decision.into_accepted() else {
            self.stats.rejected += 1;
            return;
        };

        self.stats.accepted += 1;
        self.store.put(accepted.clone());

        let next = hops.saturating_add(1);
        if self.config.max_hops.is_some_and(|max| next > max) {
            tracing::debug!(node = %self.label, key = %accepted.key(), hops, "hop limit reached, not forwarding");
            return;
        }
        self.broadcast(Envelope::new(accepted, next));
    }
}

fn jitter(max: Duration) -> Duration {
    rand::thread_rng().gen_range(Duration::ZERO..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TieBreak;

    fn wire(nodes: &mut [Node], edges: &[(usize, usize)]) {
        let mailboxes: Vec<Mailbox> = nodes.iter().map(Node::mailbox).collect();
        for (i, node) in nodes.iter_mut().enumerate() {
            let neighbors = edges
                .iter()
                .filter_map(|&(a, b)| match (a == i, b == i) {
                    (true, _) => Some(mailboxes[b].clone()),
                    (_, true) => Some(mailboxes[a].clone()),
                    _ => None,
                })
                .collect();
            node.connect(neighbors);
        }
    }

    fn nodes(n: usize, config: &NodeConfig) -> Vec<Node> {
        let in_flight = InFlight::new();
        (0..n)
            .map(|i| Node::with_in_flight(i.to_string(), config.clone(), in_flight.clone()))
            .collect()
    }

    #[test]
    fn test_sign_is_idempotent() {
        let node = Node::new("a", NodeConfig::default());
        let tx = Transaction::create(&NodeId::random(), 1, b"X".to_vec());

        let once = node.sign(&tx);
        let twice = node.sign(&once);

        assert_eq!(once.score(), 1);
        assert_eq!(twice.signers(), once.signers());
    }

    #[test]
    fn test_propose_stores_and_floods() {
        let mut network = nodes(3, &NodeConfig::default());
        wire(&mut network, &[(0, 1), (0, 2)]);

        let key = network[0].propose(b"X".to_vec()).unwrap();

        assert_eq!(network[0].nonce(), 1);
        assert_eq!(network[0].store().score(&key), 1);
        assert_eq!(network[0].stats().sent, 2);
        assert_eq!(network[1].process(), 1);
        assert_eq!(network[2].process(), 1);
        assert_eq!(network[1].store().score(&key), 2);
    }

    #[test]
    fn test_propose_refuses_oversized_value() {
        let config = NodeConfig {
            max_value_size: 4,
            ..NodeConfig::default()
        };
        let mut node = Node::new("a", config);

        assert!(matches!(
            node.propose(vec![0u8; 5]),
            Err(Error::ProposalTooLarge { size: 5, limit: 4 })
        ));
        assert_eq!(node.nonce(), 0);
        assert!(node.store().is_empty());
    }

    #[test]
    fn test_malformed_transaction_is_not_stored_or_forwarded() {
        let mut network = nodes(2, &NodeConfig::default());
        wire(&mut network, &[(0, 1)]);
        let unsigned = Transaction::create(&NodeId::random(), 1, b"X".to_vec());

        network[0]
            .mailbox()
            .deliver(Message::Gossip(Envelope::new(unsigned.clone(), 1)))
            .unwrap();
        network[0].process();

        assert!(!network[0].store().contains(unsigned.key()));
        assert_eq!(network[0].stats().malformed, 1);
        assert_eq!(network[0].stats().sent, 0);
        assert_eq!(network[1].process(), 0);
    }

    #[test]
    fn test_tie_is_rejected_when_strict() {
        // A and B never talk to C directly; their versions are injected.
        let mut c = Node::new("c", NodeConfig::default());
        let (a, b) = (NodeId::random(), NodeId::random());
        let tx = Transaction::create(&a, 1, b"X".to_vec());

        c.mailbox().deliver(Message::Gossip(Envelope::new(tx.with_signer(a), 1))).unwrap();
        c.mailbox().deliver(Message::Gossip(Envelope::new(tx.with_signer(b), 1))).unwrap();
        c.process();

        let record = c.store().get(tx.key()).unwrap();
        assert!(record.is_signed_by(&a));
        assert!(!record.is_signed_by(&b));
        assert_eq!(record.score(), 2);
        assert_eq!(c.stats().accepted, 1);
        assert_eq!(c.stats().rejected, 1);
    }

    #[test]
    fn test_tie_is_merged_when_configured() {
        let config = NodeConfig {
            tie_break: TieBreak::MergeSigners,
            ..NodeConfig::default()
        };
        let mut c = Node::new("c", config);
        let (a, b) = (NodeId::random(), NodeId::random());
        let tx = Transaction::create(&a, 1, b"X".to_vec());

        c.mailbox().deliver(Message::Gossip(Envelope::new(tx.with_signer(a), 1))).unwrap();
        c.mailbox().deliver(Message::Gossip(Envelope::new(tx.with_signer(b), 1))).unwrap();
        c.process();

        let record = c.store().get(tx.key()).unwrap();
        assert_eq!(record.score(), 3);
        assert!(record.is_signed_by(&a) && record.is_signed_by(&b) && record.is_signed_by(&c.id()));
    }

    #[test]
    fn test_hop_limit_stops_forwarding() {
        let config = NodeConfig {
            max_hops: Some(1),
            ..NodeConfig::default()
        };
        let mut network = nodes(3, &config);
        wire(&mut network, &[(0, 1), (1, 2)]);

        let key = network[0].propose(b"X".to_vec()).unwrap();
        network[1].process();

        assert_eq!(network[1].store().score(&key), 2);
        assert_eq!(network[1].stats().sent, 0);
        assert_eq!(network[2].process(), 0);
    }

    #[test]
    fn test_closed_neighbor_is_skipped() {
        let mut network = nodes(3, &NodeConfig::default());
        wire(&mut network, &[(0, 1), (0, 2)]);
        let gone = network.remove(1);
        drop(gone);

        let key = network[0].propose(b"X".to_vec()).unwrap();

        assert_eq!(network[0].stats().dropped, 1);
        assert_eq!(network[0].stats().sent, 1);
        assert_eq!(network[1].process(), 1);
        assert!(network[1].store().contains(&key));
    }

    #[tokio::test]
    async fn test_run_accepts_proposals_and_stops() {
        let node = Node::new("solo", NodeConfig::default());
        let mailbox = node.mailbox();
        let handle = tokio::spawn(node.run());

        mailbox.deliver(Message::Propose(b"X".to_vec())).unwrap();
        mailbox.deliver(Message::Shutdown).unwrap();
        let node = handle.await.unwrap();

        assert_eq!(node.nonce(), 1);
        assert_eq!(node.store().len(), 1);
    }
}
