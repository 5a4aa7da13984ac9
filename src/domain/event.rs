use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::{Entity, EntityId};

// ============================================================================
// Event Identity
// ============================================================================
//
// Wraps a typed event payload with the identity every domain event carries:
// a unique id, the id of the entity that raised it, a version/branch logical
// clock, and a UTC timestamp.
//
// Equality is by `id` alone. The hash is a composite over all identity
// fields, so it is only stable while those fields are unchanged. Records are
// treated as immutable once published; do not hand the same `id` to records
// that differ in the other fields if they end up in hash-based containers.
//
// ============================================================================

/// Marker trait for event payloads routed by the dispatcher.
///
/// The routing key is the exact Rust type of the payload, never a supertype;
/// `event_type` only names the type for log lines and metric labels.
pub trait DomainEvent:
    Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static
{
    fn event_type() -> &'static str
    where
        Self: Sized;
}

/// A domain event as published: identity plus typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord<E> {
    /// Unique per record, assigned once at construction.
    pub id: Uuid,

    /// Identity of the entity that raised the event. Not serialized; records
    /// read back from a wire or store come back with the source unset.
    #[serde(skip)]
    pub source: Option<EntityId>,

    /// Position within `branch`.
    pub version: i64,
    /// Distinguishes divergent histories of the same entity.
    pub branch: i64,

    /// When the event was produced. Kept in UTC so records from different
    /// systems stay comparable.
    pub timestamp: DateTime<Utc>,

    pub payload: E,
}

impl<E: DomainEvent> EventRecord<E> {
    /// Build a record with no source, as a deserialization path would.
    /// Never fails; version starts at 1 on branch 0.
    pub fn new(payload: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: None,
            version: 1,
            branch: 0,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Build a record raised by `source`.
    pub fn raised_by(source: &impl Entity, payload: E) -> Self {
        Self::new(payload).with_source(source.entity_id())
    }

    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn with_branch(mut self, branch: i64) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn event_type(&self) -> &'static str {
        E::event_type()
    }
}

// ============================================================================
// Composite Hash
// ============================================================================

const HASH_SEED: u64 = 17;
const HASH_FACTOR: u64 = 31;

/// Folded in place of the source hash when no source is set, so hashing a
/// sourceless record is well-defined instead of a fault.
const UNSET_SOURCE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Order-sensitive multiplicative fold. A plain XOR would collapse records
/// whose fields happen to cancel out; the seed/factor fold keeps field order
/// significant.
pub(crate) fn fold_hash_parts(parts: &[u64]) -> u64 {
    parts
        .iter()
        .fold(HASH_SEED, |acc, part| acc.wrapping_mul(HASH_FACTOR).wrapping_add(*part))
}

impl<E> EventRecord<E> {
    /// Composite hash over source, branch, id, timestamp and version, in
    /// that order. Never panics, with or without a source.
    pub fn composite_hash(&self) -> u64 {
        let source = self.source.map_or(UNSET_SOURCE, |id| id.hash_part());
        let id_bits = self.id.as_u128();
        fold_hash_parts(&[
            source,
            self.branch as u64,
            (id_bits >> 64) as u64,
            id_bits as u64,
            self.timestamp.timestamp_micros() as u64,
            self.version as u64,
        ])
    }
}

impl<E> PartialEq for EventRecord<E> {
    /// Two records are the same event iff their ids are equal. Source,
    /// version, branch and timestamp do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for EventRecord<E> {}

impl<E> Hash for EventRecord<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.composite_hash());
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct PingRecorded {
        endpoint: String,
    }

    impl DomainEvent for PingRecorded {
        fn event_type() -> &'static str {
            "PingRecorded"
        }
    }

    struct Probe {
        id: EntityId,
    }

    impl Entity for Probe {
        fn entity_id(&self) -> EntityId {
            self.id
        }
    }

    fn ping() -> PingRecorded {
        PingRecorded {
            endpoint: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn test_new_record_defaults() {
        let record = EventRecord::new(ping());
        assert_eq!(record.version, 1);
        assert_eq!(record.branch, 0);
        assert!(record.source.is_none());
        assert_eq!(record.event_type(), "PingRecorded");
    }

    #[test]
    fn test_raised_by_sets_source() {
        let probe = Probe { id: EntityId::new() };
        let record = EventRecord::raised_by(&probe, ping());
        assert_eq!(record.source, Some(probe.id));
    }

    #[test]
    fn test_equality_follows_id_only() {
        let record = EventRecord::new(ping());
        let mutated = record
            .clone()
            .with_version(42)
            .with_branch(7)
            .with_timestamp(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record, mutated);
    }

    #[test]
    fn test_distinct_ids_are_not_equal() {
        let a = EventRecord::new(ping());
        let b = EventRecord::new(ping());
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_stable_across_calls() {
        let record = EventRecord::raised_by(&Probe { id: EntityId::new() }, ping());
        assert_eq!(record.composite_hash(), record.composite_hash());

        let via_trait = {
            use std::collections::hash_map::DefaultHasher;
            let run = || {
                let mut hasher = DefaultHasher::new();
                record.hash(&mut hasher);
                hasher.finish()
            };
            (run(), run())
        };
        assert_eq!(via_trait.0, via_trait.1);
    }

    #[test]
    fn test_hash_without_source_uses_sentinel() {
        let record = EventRecord::new(ping());
        // Must not panic, and must differ from the same record with a source.
        let bare = record.composite_hash();
        let sourced = record.clone().with_source(EntityId::new()).composite_hash();
        assert_ne!(bare, sourced);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let base = EventRecord::new(ping())
            .with_timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        // Swapping version and branch values must change the composite.
        let a = base.clone().with_version(1).with_branch(2).composite_hash();
        let b = base.clone().with_version(2).with_branch(1).composite_hash();
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_drops_source() {
        let probe = Probe { id: EntityId::new() };
        let record = EventRecord::raised_by(&probe, ping()).with_version(3);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("source"));

        let restored: EventRecord<PingRecorded> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
        assert_eq!(restored.version, 3);
        assert!(restored.source.is_none());
    }
}
