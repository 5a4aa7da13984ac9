use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Entity Identity
// ============================================================================
//
// The dispatch core never inspects the entity that raised an event. It only
// needs a stable, hashable identity to fold into the event hash, so the
// originator is represented by this opaque id rather than a reference to
// the entity itself.
//
// ============================================================================

/// Opaque identity of a domain entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// 64-bit projection of this id, used by the composite event hash.
    pub(crate) fn hash_part(&self) -> u64 {
        let bits = self.0.as_u128();
        super::event::fold_hash_parts(&[(bits >> 64) as u64, bits as u64])
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Anything with an [`EntityId`] can raise domain events.
pub trait Entity {
    fn entity_id(&self) -> EntityId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn test_entity_id_round_trips_through_uuid() {
        let uuid = Uuid::new_v4();
        let id = EntityId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_hash_part_is_deterministic() {
        let id = EntityId::new();
        assert_eq!(id.hash_part(), id.hash_part());
    }
}
