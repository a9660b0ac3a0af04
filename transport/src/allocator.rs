//! Sequential player ID assignment.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::{PlayerId, FIRST_REMOTE_PLAYER_ID, MAX_PLAYER_ID};

/// Hands out player IDs for remote connections.
///
/// IDs start at [`FIRST_REMOTE_PLAYER_ID`] and are never reused, so a
/// reconnecting player gets a fresh identity. The 12-bit wire field bounds
/// the space; allocation past [`MAX_PLAYER_ID`] fails.
#[derive(Debug)]
pub struct PlayerAllocator {
    next: AtomicU16,
}

impl PlayerAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU16::new(FIRST_REMOTE_PLAYER_ID),
        }
    }

    /// Claims the next ID, or `None` once the space is exhausted.
    pub fn allocate(&self) -> Option<PlayerId> {
        // The counter must stop at MAX_PLAYER_ID + 1: a plain fetch_add
        // would wrap after enough refused attempts and start reissuing
        // IDs already held by connected players.
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                (next <= MAX_PLAYER_ID).then_some(next + 1)
            })
            .ok()
    }

    /// How many IDs have been handed out.
    #[must_use]
    pub fn issued(&self) -> u16 {
        self.next.load(Ordering::SeqCst) - FIRST_REMOTE_PLAYER_ID
    }
}

impl Default for PlayerAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_two() {
        let allocator = PlayerAllocator::new();
        assert_eq!(allocator.allocate(), Some(2));
        assert_eq!(allocator.allocate(), Some(3));
        assert_eq!(allocator.allocate(), Some(4));
        // The fourth arrival after three earlier joins gets 5.
        assert_eq!(allocator.allocate(), Some(5));
        assert_eq!(allocator.issued(), 4);
    }

    #[test]
    fn exhaustion_returns_none() {
        let allocator = PlayerAllocator::new();
        for _ in FIRST_REMOTE_PLAYER_ID..=MAX_PLAYER_ID {
            assert!(allocator.allocate().is_some());
        }
        assert_eq!(allocator.allocate(), None);
    }

    #[test]
    fn exhausted_allocator_never_wraps() {
        let allocator = PlayerAllocator::new();
        for _ in FIRST_REMOTE_PLAYER_ID..=MAX_PLAYER_ID {
            assert!(allocator.allocate().is_some());
        }
        // Refused attempts must not advance the counter: a full u16 cycle
        // of retries would otherwise wrap it around to 0, 1 (the host's
        // ID), and then IDs still held by connected players.
        for _ in 0..=u32::from(u16::MAX) {
            assert_eq!(allocator.allocate(), None);
        }
        assert_eq!(allocator.issued(), MAX_PLAYER_ID - FIRST_REMOTE_PLAYER_ID + 1);
    }
}
