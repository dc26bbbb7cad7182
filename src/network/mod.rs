pub mod inflight;
pub mod node;
pub mod topology;

pub use inflight::InFlight;
pub use node::{Node, NodeStats};
pub use topology::Topology;

use tokio::task::JoinSet;

use crate::{
    common::{Error, NodeConfig, Result, TxKey},
    consensus::{Mailbox, Message},
};

/*
    Links are point-to-point, reliable and FIFO per sender/receiver pair:
    each node owns an unbounded mailbox and its neighbors hold the write
    end. Nothing else crosses node boundaries.

    Two schedules drive the same nodes:
      - sequential: every node drains its mailbox in index order, round
        after round, until nothing is in flight. Deterministic, used as the
        reference mode.
      - concurrent: one task per node, each awaiting its own mailbox. The
        shared in-flight counter tells when the whole network is quiescent.
*/

pub struct Network {
    nodes: Vec<Node>,
    topology: Topology,
    in_flight: InFlight,
}

impl Network {
    /// Creates one node per topology position, labelled by its index, and
    /// wires each to its neighbors in adjacency order.
    pub fn new(topology: Topology, config: NodeConfig) -> Self {
        let in_flight = InFlight::new();
        let mut nodes: Vec<Node> = (0..topology.len())
            .map(|i| Node::with_in_flight(i.to_string(), config.clone(), in_flight.clone()))
            .collect();

        let mailboxes: Vec<_> = nodes.iter().map(Node::mailbox).collect();
        for (node, adjacent) in nodes.iter_mut().zip(topology.adjacency()) {
            let neighbors = adjacent
                .iter()
                .map(|&j| mailboxes[j].clone())
                .collect();
            node.connect(neighbors);
        }

        Network {
            nodes,
            topology,
            in_flight,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Result<&Node> {
        let len = self.nodes.len();
        self.nodes.get(index).ok_or(Error::UnknownNode { index, len })
    }

    pub fn node_mut(&mut self, index: usize) -> Result<&mut Node> {
        let len = self.nodes.len();
        self.nodes.get_mut(index).ok_or(Error::UnknownNode { index, len })
    }

    /// Messages queued or being handled anywhere in the network.
    pub fn pending(&self) -> usize {
        self.in_flight.pending()
    }

    pub fn propose(&mut self, index: usize, value: Vec<u8>) -> Result<TxKey> {
        self.node_mut(index)?.propose(value)
    }

    /// Round-robin drain until quiescent. Returns the number of rounds.
    pub fn run_sequential(&mut self) -> usize {
        let mut rounds = 0;
        while !self.in_flight.is_idle() {
            let handled: usize = self.nodes.iter_mut().map(Node::process).sum();
            rounds += 1;
            tracing::debug!(round = rounds, handled, pending = self.in_flight.pending(), "round complete");
        }
        tracing::info!(rounds, "network quiescent");
        rounds
    }

    /// Runs every node as its own task until the network is quiescent, then
    /// stops them and takes them back.
    ///
    /// If a node task fails, the remaining tasks are still stopped and
    /// joined, the surviving nodes are handed back in index order and the
    /// first failure is returned. The in-flight count is then unreliable, so
    /// the network should not be run again.
    pub async fn run_concurrent(&mut self) -> Result<()> {
        let nodes = std::mem::take(&mut self.nodes);
        let mailboxes: Vec<_> = nodes.iter().map(Node::mailbox).collect();
        let mut tasks = JoinSet::new();
        for (index, node) in nodes.into_iter().enumerate() {
            tasks.spawn(async move { (index, node.run().await) });
        }
        self.supervise(tasks, &mailboxes).await
    }

    async fn supervise(&mut self, mut tasks: JoinSet<(usize, Node)>, mailboxes: &[Mailbox]) -> Result<()> {
        let mut stopped = Vec::with_capacity(mailboxes.len());
        let mut failure = None;

        // A node task only ends early by failing, so either event stops the run.
        tokio::select! {
            _ = self.in_flight.wait_idle() => {
                tracing::info!(nodes = mailboxes.len(), "network quiescent");
            }
            Some(joined) = tasks.join_next() => {
                tracing::warn!("node task ended before quiescence");
                match joined {
                    Ok(node) => stopped.push(node),
                    Err(e) => failure = Some(Error::from(e)),
                }
            }
        }

        for mailbox in mailboxes {
            if let Err(e) = mailbox.deliver(Message::Shutdown) {
                tracing::debug!("skipping shutdown: {}", e);
            }
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(node) => stopped.push(node),
                Err(e) => {
                    tracing::error!("node task failed: {}", e);
                    failure.get_or_insert(Error::from(e));
                }
            }
        }

        stopped.sort_by_key(|(index, _)| *index);
        self.nodes = stopped.into_iter().map(|(_, node)| node).collect();
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of nodes holding `key`.
    pub fn holders(&self, key: &TxKey) -> usize {
        self.nodes.iter().filter(|n| n.store().contains(key)).count()
    }

    /// Every node holds `key` with the same value and nonce.
    pub fn converged_on(&self, key: &TxKey) -> bool {
        let mut records = self.nodes.iter().map(|n| n.store().get(key));
        let Some(Some(first)) = records.next() else {
            return false;
        };
        records.all(|r| r.is_some_and(|r| r.same_payload(first)))
    }

    /// Every node holds `key` with the very same signer set.
    pub fn unanimous_on(&self, key: &TxKey) -> bool {
        let mut records = self.nodes.iter().map(|n| n.store().get(key));
        let Some(Some(first)) = records.next() else {
            return false;
        };
        records.all(|r| r.is_some_and(|r| r == first))
    }
}
