//! Session-wide object identifiers.
//!
//! An object ID packs the owning player into the high 12 bits and a
//! per-owner counter into the low 52, so every endpoint can mint IDs with
//! no coordination and ownership is recoverable from the ID alone.

use transport::PlayerId;
use wire::PLAYER_ID_BITS;

/// Bits available to the per-owner counter.
pub const OBJECT_COUNTER_BITS: u32 = 64 - PLAYER_ID_BITS;

/// Mask selecting the counter portion of an object ID.
pub const OBJECT_COUNTER_MASK: u64 = (1 << OBJECT_COUNTER_BITS) - 1;

/// Packs an owner and counter into one object ID.
///
/// Counters wider than 52 bits are truncated into the counter field.
#[must_use]
pub const fn create_id(player: PlayerId, counter: u64) -> u64 {
    ((player as u64) << OBJECT_COUNTER_BITS) | (counter & OBJECT_COUNTER_MASK)
}

/// The owning player encoded in an object ID.
#[must_use]
pub const fn extract_player_id(id: u64) -> PlayerId {
    (id >> OBJECT_COUNTER_BITS) as PlayerId
}

/// The counter portion of an object ID.
#[must_use]
pub const fn extract_object_id(id: u64) -> u64 {
    id & OBJECT_COUNTER_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_extract() {
        let id = create_id(7, 42);
        assert_eq!(id, (7u64 << 52) | 42);
        assert_eq!(extract_player_id(id), 7);
        assert_eq!(extract_object_id(id), 42);
    }

    #[test]
    fn counter_uses_the_full_52_bits() {
        let max_counter = (1u64 << 52) - 1;
        let id = create_id(3, max_counter);
        assert_eq!(extract_player_id(id), 3);
        assert_eq!(extract_object_id(id), max_counter);
    }

    #[test]
    fn oversized_counter_cannot_leak_into_the_player_field() {
        let id = create_id(3, u64::MAX);
        assert_eq!(extract_player_id(id), 3);
        assert_eq!(extract_object_id(id), OBJECT_COUNTER_MASK);
    }

    #[test]
    fn max_player_id_survives() {
        let id = create_id(4095, 1);
        assert_eq!(extract_player_id(id), 4095);
        assert_eq!(extract_object_id(id), 1);
    }
}
