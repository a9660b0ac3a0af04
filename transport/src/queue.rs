//! A single-consumer action queue.
//!
//! Outbound writes from any thread land here as closures; the owner of the
//! queue drains it from one place so per-connection write buffers never
//! see concurrent mutation.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

type Action = Box<dyn FnOnce() + Send>;

/// Thread-safe FIFO of deferred actions.
///
/// Cloning shares the underlying channel; any clone may push, and any
/// clone may drain, but draining from exactly one thread is the intended
/// shape.
#[derive(Clone)]
pub struct ActionQueue {
    tx: Sender<Action>,
    rx: Receiver<Action>,
}

impl ActionQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Enqueues an action. Never blocks.
    pub fn push(&self, action: impl FnOnce() + Send + 'static) {
        // The receiver half lives in self, so the channel cannot be closed.
        let _ = self.tx.send(Box::new(action));
    }

    /// Runs every action queued so far, in push order.
    pub fn drain(&self) {
        loop {
            match self.rx.try_recv() {
                Ok(action) => action(),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Number of actions waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.rx.len())
            .finish()
    }
}
