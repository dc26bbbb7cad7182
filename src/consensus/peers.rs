use tokio::sync::mpsc::UnboundedSender;

use crate::{
    common::{Error, NodeId, Result},
    network::InFlight,
};
use super::message::{Envelope, Message};

/// Write end of a node's inbound queue. Anyone may deliver; only the owning
/// node receives.
#[derive(Clone, Debug)]
pub struct Mailbox {
    id: NodeId,
    tx: UnboundedSender<Message>,
    in_flight: InFlight,
}

impl Mailbox {
    pub fn new(id: NodeId, tx: UnboundedSender<Message>, in_flight: InFlight) -> Self {
        Mailbox { id, tx, in_flight }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Enqueues without blocking. Fails only once the owner is gone, which
    /// is permanent, so callers drop rather than retry.
    pub fn deliver(&self, message: Message) -> Result<()> {
        let counted = !message.is_control();
        if counted {
            self.in_flight.add();
        }
        if self.tx.send(message).is_err() {
            if counted {
                self.in_flight.done();
            }
            return Err(Error::MailboxClosed(self.id));
        }
        Ok(())
    }
}

/// Outcome of flooding one envelope to every neighbor.
#[derive(Debug, Default)]
pub struct Delivery {
    pub sent: usize,
    pub failed: Vec<Error>,
}

/// Ordered neighbor set of one node, fixed once wired.
#[derive(Clone, Debug, Default)]
pub struct Peers {
    pub members: Vec<Mailbox>,
}

impl Peers {
    pub fn new(members: Vec<Mailbox>) -> Self {
        Peers { members }
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.members.iter().map(Mailbox::id).collect()
    }

    /// Sends a copy to every neighbor in order. One failed neighbor never
    /// keeps the rest from receiving it.
    pub fn broadcast(&self, envelope: &Envelope) -> Delivery {
        let mut delivery = Delivery::default();
        for member in &self.members {
            match member.deliver(Message::Gossip(envelope.clone())) {
                Ok(()) => delivery.sent += 1,
                Err(e) => delivery.failed.push(e),
            }
        }
        delivery
    }
}
