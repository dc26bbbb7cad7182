use std::sync::Arc;

use tokio::sync::watch;

/*
    Quiescence detector. Every counted message is added before it enters a
    mailbox and marked done only after its receiver has finished handling
    it, rebroadcasts included. Since a node enqueues its rebroadcasts before
    marking the triggering message done, the count can only reach zero when
    no message is queued or being handled anywhere.
*/

#[derive(Clone, Debug)]
pub struct InFlight {
    count: Arc<watch::Sender<usize>>,
}

impl InFlight {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        InFlight {
            count: Arc::new(count),
        }
    }

    pub fn add(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    pub fn done(&self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub fn pending(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Resolves once nothing is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}
