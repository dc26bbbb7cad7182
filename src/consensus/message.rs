use super::transaction::Transaction;

/*
    Everything a node receives arrives through its mailbox as a Message.
    Gossip carries a transaction across one link; Propose and Shutdown are
    driver controls so a running node can be fed and stopped without
    touching its state from outside.
*/

#[derive(Clone, Debug)]
pub enum Message {
    Gossip(Envelope),
    Propose(Vec<u8>),
    Shutdown,
}

/// A transaction in transit, with the number of links it has crossed.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub tx: Transaction,
    pub hops: u32,
}

impl Envelope {
    pub fn new(tx: Transaction, hops: u32) -> Self {
        Envelope { tx, hops }
    }
}

impl Message {
    /// Control messages are not counted as in-flight traffic.
    pub fn is_control(&self) -> bool {
        matches!(self, Message::Shutdown)
    }
}
