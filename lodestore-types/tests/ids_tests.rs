use lodestore_types::{MutationId, RecordKey, PRIMARY_KEY_SEPARATOR};
use std::collections::HashSet;
use std::str::FromStr;

// ── MutationId ────────────────────────────────────────────────────

#[test]
fn mutation_id_new_is_unique() {
    let a = MutationId::new();
    let b = MutationId::new();
    assert_ne!(a, b);
}

#[test]
fn mutation_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = MutationId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn mutation_id_display_and_parse() {
    let id = MutationId::new();
    let s = id.to_string();
    let parsed = MutationId::from_str(&s).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn mutation_id_from_str_invalid() {
    assert!(MutationId::from_str("garbage").is_err());
}

#[test]
fn mutation_id_hash_and_eq() {
    let id = MutationId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id); // duplicate
    assert_eq!(set.len(), 1);
}

#[test]
fn mutation_id_serialization_roundtrip() {
    let id = MutationId::new();
    let json = serde_json::to_string(&id).unwrap();
    let parsed: MutationId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

// ── RecordKey ─────────────────────────────────────────────────────

#[test]
fn record_key_single_value() {
    let key = RecordKey::from_values(["p1"]);
    assert_eq!(key.as_str(), "p1");
}

#[test]
fn record_key_composite_joins_with_separator() {
    let key = RecordKey::from_values(["tenant-a", "42"]);
    assert_eq!(key.as_str(), format!("tenant-a{PRIMARY_KEY_SEPARATOR}42"));
}

#[test]
fn record_key_from_str_and_string() {
    let a: RecordKey = "p1".into();
    let b: RecordKey = String::from("p1").into();
    assert_eq!(a, b);
}

#[test]
fn record_key_orders_lexicographically() {
    let a = RecordKey::from_values(["a"]);
    let b = RecordKey::from_values(["b"]);
    assert!(a < b);
}
