//! The packet-type registration table.

use std::collections::BTreeMap;

use schema::{selector_width, SchemaType};

use crate::error::{WireError, WireResult};
use crate::tag::{PacketTag, Reliability};

/// One registered application packet type.
#[derive(Debug, Clone)]
pub struct PacketEntry {
    pub schema: SchemaType,
    pub reliability: Reliability,
}

/// The per-process registry mapping tags to schemas and reliability
/// classes.
///
/// Built once at startup; both endpoints must build identical tables for
/// the tag widths and body layouts to line up.
#[derive(Debug, Clone)]
pub struct PacketTable {
    entries: BTreeMap<PacketTag, PacketEntry>,
    tag_bits: u32,
}

impl PacketTable {
    /// Starts building a table with auto-sized tags.
    #[must_use]
    pub fn builder() -> PacketTableBuilder {
        PacketTableBuilder {
            entries: BTreeMap::new(),
            auto_size_tags: true,
        }
    }

    /// The wire width of every tag written against this table.
    #[must_use]
    pub const fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    /// Looks up the schema registered for `tag`.
    #[must_use]
    pub fn schema(&self, tag: PacketTag) -> Option<&SchemaType> {
        self.entries.get(&tag).map(|entry| &entry.schema)
    }

    /// Looks up the declared reliability class for `tag`.
    #[must_use]
    pub fn reliability(&self, tag: PacketTag) -> Option<Reliability> {
        self.entries.get(&tag).map(|entry| entry.reliability)
    }

    /// Resolves the channel for an outgoing packet.
    ///
    /// An explicit override always wins. Without one, the declared class is
    /// used; a [`Reliability::Both`] declaration demands an override, so its
    /// absence is an error at the point of send.
    pub fn reliability_for_send(
        &self,
        tag: PacketTag,
        explicit: Option<Reliability>,
    ) -> WireResult<Reliability> {
        match explicit {
            Some(Reliability::Both) | None => {}
            Some(choice) => return Ok(choice),
        }
        match self.reliability(tag) {
            None => Err(WireError::UnknownTag { tag }),
            Some(Reliability::Both) => Err(WireError::AmbiguousReliability { tag }),
            Some(declared) => Ok(declared),
        }
    }

    /// Iterates registered application tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = PacketTag> + '_ {
        self.entries.keys().copied()
    }
}

/// Builder for [`PacketTable`].
#[derive(Debug)]
pub struct PacketTableBuilder {
    entries: BTreeMap<PacketTag, PacketEntry>,
    auto_size_tags: bool,
}

impl PacketTableBuilder {
    /// Chooses between compact and full-width (16-bit) tag encoding.
    #[must_use]
    pub fn auto_size_tags(mut self, enabled: bool) -> Self {
        self.auto_size_tags = enabled;
        self
    }

    /// Registers an application packet type.
    ///
    /// Rejects reserved tags, duplicate registrations, and invalid schemas
    /// here rather than at send time.
    pub fn register(
        mut self,
        tag: PacketTag,
        schema: SchemaType,
        reliability: Reliability,
    ) -> WireResult<Self> {
        if tag.is_reserved() {
            return Err(WireError::ReservedTag { tag });
        }
        schema.validate()?;
        if self.entries.contains_key(&tag) {
            return Err(WireError::DuplicateTag { tag });
        }
        self.entries.insert(tag, PacketEntry { schema, reliability });
        Ok(self)
    }

    /// Finalizes the table and fixes the tag width.
    #[must_use]
    pub fn build(self) -> PacketTable {
        let highest = self
            .entries
            .keys()
            .next_back()
            .map_or(PacketTag::PLAYER_CONNECTED, |tag| *tag)
            .0
            .max(PacketTag::PLAYER_CONNECTED.0);
        let tag_bits = if self.auto_size_tags {
            selector_width(usize::from(highest) + 1)
        } else {
            16
        };
        PacketTable {
            entries: self.entries,
            tag_bits,
        }
    }
}
