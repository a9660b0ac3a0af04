//! Entity synchronization over the relay.

use codec::Value;
use transport::PlayerId;
use wire::PacketTag;

use crate::object_id::extract_player_id;

/// A game object that can broadcast its state.
///
/// Ownership is encoded in the object ID; only the owning endpoint
/// synchronizes an entity, everyone else receives the resulting packets.
pub trait Replicated: Send {
    /// The packed session-wide ID, owner in the high bits.
    fn object_id(&self) -> u64;

    /// Emits zero or more state packets through `send`.
    fn synchronize(&mut self, send: &mut dyn FnMut(PacketTag, Value));
}

/// The set of entities an endpoint knows about.
#[derive(Default)]
pub struct EntityRegistry {
    entities: Vec<Box<dyn Replicated>>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: Box<dyn Replicated>) {
        self.entities.push(entity);
    }

    /// Drops the entity with the given object ID, if registered.
    pub fn remove(&mut self, object_id: u64) {
        self.entities.retain(|entity| entity.object_id() != object_id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Runs the synchronize hook of every entity owned by `local_player`.
    pub fn synchronize(
        &mut self,
        local_player: PlayerId,
        send: &mut dyn FnMut(PacketTag, Value),
    ) {
        for entity in &mut self.entities {
            if extract_player_id(entity.object_id()) == local_player {
                entity.synchronize(send);
            }
        }
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entities", &self.entities.len())
            .finish()
    }
}
