mod common;

use common::{item, Item};
use firetree::{ChangeEvent, ChangeKind, LocalCache};
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn kinds<T>(events: &[ChangeEvent<T>]) -> Vec<(String, ChangeKind)> {
    events
        .iter()
        .map(|e| (e.key().to_string(), e.kind))
        .collect()
}

// ========== End-to-end Frame Sequence ==========

#[test]
fn test_items_frame_sequence() {
    let mut cache: LocalCache<Item> = LocalCache::new();

    let events = cache.apply("/", r#"{"k1":{"name":"a"}}"#).unwrap();
    assert_eq!(kinds(&events), vec![("k1".to_string(), ChangeKind::Added)]);
    assert_eq!(cache.get("k1"), Some(&item("a", 0)));

    let events = cache.apply("/k1", r#"{"name":"b"}"#).unwrap();
    assert_eq!(kinds(&events), vec![("k1".to_string(), ChangeKind::Changed)]);
    assert_eq!(cache.get("k1"), Some(&item("b", 0)));

    let events = cache.apply("/k1", "").unwrap();
    assert_eq!(kinds(&events), vec![("k1".to_string(), ChangeKind::Deleted)]);
    assert!(cache.is_empty());
}

// ========== Upsert Accumulation ==========

/// Applying upserts one by one ends in the same state as merging them into
/// one JSON object, whatever the order of independent keys.
#[test]
fn test_upserts_match_cumulative_merge() {
    let updates: Vec<(&str, Value)> = vec![
        ("/a", json!({"name": "a1"})),
        ("/b", json!({"name": "b1", "count": 2})),
        ("/a/count", json!(5)),
        ("/c", json!({"count": 1})),
        ("/b", json!({"name": "b2"})),
        ("/a/name", json!("a2")),
    ];

    let mut cumulative = Value::Object(Default::default());
    for (path, value) in &updates {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut target = &mut cumulative;
        for segment in &segments[..segments.len() - 1] {
            target = target
                .as_object_mut()
                .unwrap()
                .entry(segment.to_string())
                .or_insert_with(|| json!({}));
        }
        let leaf = segments[segments.len() - 1];
        let slot = target
            .as_object_mut()
            .unwrap()
            .entry(leaf.to_string())
            .or_insert(Value::Null);
        firetree::cache::merge_json(slot, value);
    }
    let expected: BTreeMap<String, Item> = serde_json::from_value(cumulative).unwrap();

    let mut forward: LocalCache<Item> = LocalCache::new();
    for (path, value) in &updates {
        forward.apply(path, &value.to_string()).unwrap();
    }

    // Same-key updates keep their relative order; independent keys move.
    let mut shuffled: Vec<_> = updates.iter().filter(|(p, _)| p.starts_with("/c")).collect();
    shuffled.extend(updates.iter().filter(|(p, _)| p.starts_with("/b")));
    shuffled.extend(updates.iter().filter(|(p, _)| p.starts_with("/a")));
    let mut reordered: LocalCache<Item> = LocalCache::new();
    for (path, value) in shuffled {
        reordered.apply(path, &value.to_string()).unwrap();
    }

    for cache in [&forward, &reordered] {
        let actual: BTreeMap<String, Item> = cache
            .entities()
            .into_iter()
            .map(|e| e.into_parts())
            .collect();
        assert_eq!(actual, expected);
    }
    assert_eq!(forward.get("a"), Some(&item("a2", 5)));
    assert_eq!(forward.get("b"), Some(&item("b2", 2)));
}

#[test]
fn test_same_key_last_write_wins() {
    let mut cache: LocalCache<String> = LocalCache::new();
    cache.apply("/k", "\"first\"").unwrap();
    cache.apply("/k", "\"second\"").unwrap();
    assert_eq!(cache.get("k").map(String::as_str), Some("second"));
}

// ========== Deletion ==========

#[test]
fn test_delete_never_inserted_is_silent() {
    let mut cache = LocalCache::with_entries([("a".to_string(), item("x", 1))]);
    let before = cache.entities();
    let events = cache.apply("/missing", "").unwrap();
    assert!(events.is_empty());
    assert_eq!(cache.entities(), before);
}

#[test]
fn test_nested_delete_removes_top_level_entity() {
    let mut cache = LocalCache::with_entries([("a".to_string(), item("x", 1))]);
    let events = cache.apply("/a/count", "").unwrap();
    assert_eq!(kinds(&events), vec![("a".to_string(), ChangeKind::Deleted)]);
    assert!(cache.get("a").is_none());
}

// ========== Dynamic Values ==========

#[test]
fn test_json_value_entities() {
    let mut cache: LocalCache<Value> = LocalCache::new();
    cache.apply("/", r#"{"u1":{"profile":{"age":3,"name":"ann"}}}"#).unwrap();
    let events = cache.apply("/u1/profile/age", "4").unwrap();
    assert_eq!(kinds(&events), vec![("u1".to_string(), ChangeKind::Changed)]);
    assert_eq!(
        cache.get("u1"),
        Some(&json!({"profile": {"age": 4, "name": "ann"}}))
    );
}

#[test]
fn test_patch_with_null_child_removes_field() {
    let mut cache: LocalCache<Value> = LocalCache::new();
    cache.apply("/u1", r#"{"a":1,"b":2}"#).unwrap();
    cache.apply("/u1", r#"{"a":null}"#).unwrap();
    assert_eq!(cache.get("u1"), Some(&json!({"b": 2})));
}

#[test]
fn test_array_payload_uses_index_keys() {
    let mut cache: LocalCache<Item> = LocalCache::new();
    let events = cache.apply("/", r#"[{"name":"zero"},null,{"name":"two"}]"#).unwrap();
    assert_eq!(
        kinds(&events),
        vec![
            ("0".to_string(), ChangeKind::Added),
            ("2".to_string(), ChangeKind::Added)
        ]
    );
}

// ========== Object Mode ==========

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Settings {
    #[serde(default)]
    theme: String,
    #[serde(rename = "fontSize", default)]
    font_size: u32,
    #[serde(default)]
    flags: BTreeMap<String, bool>,
}

firetree::tree_record!(Settings { theme, font_size as "fontSize", flags });

#[test]
fn test_object_mode_nested_map() {
    let mut cache = LocalCache::object(Settings::default());
    let events = cache.apply("/flags/beta", "true").unwrap();
    assert_eq!(kinds(&events), vec![("flags".to_string(), ChangeKind::Changed)]);

    cache.apply("/fontSize", "14").unwrap();
    cache.apply("/font_size", "15").unwrap();
    let settings = cache.value().unwrap();
    assert_eq!(settings.font_size, 15);
    assert_eq!(settings.flags.get("beta"), Some(&true));
}

#[test]
fn test_object_mode_root_merge() {
    let mut cache = LocalCache::object(Settings {
        theme: "dark".into(),
        ..Default::default()
    });
    let events = cache.apply("/", r#"{"fontSize":12}"#).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key(), "");
    let settings = cache.value().unwrap();
    assert_eq!(settings.theme, "dark");
    assert_eq!(settings.font_size, 12);
}
