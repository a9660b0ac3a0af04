//! Per-tag frame handler registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use wire::{Frame, PacketTag};

use crate::PlayerId;

type Handler = Arc<dyn Fn(&Frame, PlayerId) + Send + Sync>;

/// Maps packet tags to the callbacks interested in them.
///
/// Handlers run on the connection's reader task, in registration order.
/// A handler that needs to write back should go through the endpoint's
/// send methods, which defer the actual socket work to the action queue.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<PacketTag, Vec<Handler>>>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to every inbound frame carrying `tag`.
    pub fn on(&self, tag: PacketTag, handler: impl Fn(&Frame, PlayerId) + Send + Sync + 'static) {
        self.handlers
            .write()
            .entry(tag)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Runs every handler registered for the frame's tag.
    ///
    /// Batch sentinels and unknown frames never reach handlers; the read
    /// loop consumes those itself.
    pub fn dispatch(&self, frame: &Frame, from: PlayerId) {
        let handlers = {
            let map = self.handlers.read();
            match map.get(&frame.tag()) {
                Some(list) => list.clone(),
                None => return,
            }
        };
        for handler in &handlers {
            handler(frame, from);
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tags", &self.handlers.read().len())
            .finish()
    }
}
