//! Addressing typed values by path segment.
//!
//! [`TreeNode`] is the field resolver the cache walks with. At every step
//! the current value decides how a segment is interpreted:
//!
//! | Value | Segment means | Missing child |
//! |-------|---------------|---------------|
//! | `HashMap`/`BTreeMap<String, V>` | entry key | inserted as `V::default()` |
//! | struct via [`tree_record!`](crate::tree_record) | field name or alias | [`TreeError::Path`] |
//! | `Option<V>` | forwarded to `V` | `Some(V::default())` |
//! | `serde_json::Value` | object key | inserted as `null` |
//! | scalars, `String`, `Vec<V>` | nothing (leaf) | [`TreeError::Path`] |
//!
//! Writes decode the whole payload before touching `self`, so a failed
//! write leaves the node as it was.

use crate::core::error::{Result, TreeError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A value the local cache can navigate and write into.
pub trait TreeNode {
    /// Step into the child addressed by `segment`.
    fn descend(&mut self, segment: &str) -> Result<&mut dyn TreeNode>;

    /// Write `payload` at this node.
    ///
    /// Collections merge every decoded entry (overwriting existing keys) and
    /// return the keys they touched. Structured values merge only the fields
    /// present in the payload. Leaves are replaced.
    fn upsert(&mut self, payload: &Value) -> Result<Vec<String>>;

    /// Return to the empty value.
    fn reset(&mut self);
}

/// Write `payload` at `segments` below `node`.
pub fn write_at(node: &mut dyn TreeNode, segments: &[String], payload: &Value) -> Result<Vec<String>> {
    match segments.split_first() {
        None => node.upsert(payload),
        Some((head, rest)) => write_at(node.descend(head)?, rest, payload),
    }
}

/// Reset the value at `segments` below `node`.
pub fn reset_at(node: &mut dyn TreeNode, segments: &[String]) -> Result<()> {
    match segments.split_first() {
        None => {
            node.reset();
            Ok(())
        }
        Some((head, rest)) => reset_at(node.descend(head)?, rest),
    }
}

/// Field-name matching used by [`tree_record!`](crate::tree_record).
///
/// A segment matches when it equals `name` ignoring ASCII case and
/// underscores (`displayName` matches `display_name`), or when it equals the
/// alias exactly.
pub fn field_matches(segment: &str, name: &str, alias: Option<&str>) -> bool {
    if alias == Some(segment) {
        return true;
    }
    let mut lhs = segment.bytes().filter(|b| *b != b'_');
    let mut rhs = name.bytes().filter(|b| *b != b'_');
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => continue,
            _ => return false,
        }
    }
}

/// Merge `patch` into `target` the way the store applies a partial update.
///
/// Objects merge key by key, recursively; a `null` member removes the key.
/// Anything else replaces the target outright.
pub fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(current), Value::Object(changes)) => {
            for (key, change) in changes {
                if change.is_null() {
                    current.remove(key);
                } else {
                    merge_json(current.entry(key.clone()).or_insert(Value::Null), change);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Merge `payload` onto a structured value, all or nothing.
///
/// The current value is serialized, merged with the payload and decoded
/// back; `target` is only replaced when the result decodes.
pub fn merge_record<T>(target: &mut T, payload: &Value) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut current = serde_json::to_value(&*target)?;
    merge_json(&mut current, payload);
    *target = serde_json::from_value(current)
        .map_err(|e| TreeError::Decode(format!("cannot merge payload: {}", e)))?;
    Ok(())
}

/// Decode a collection payload into its entries.
///
/// The store sends collections with consecutive integer keys as JSON arrays;
/// those become index keys with `null` slots skipped.
pub fn decode_entries<V: DeserializeOwned>(payload: &Value) -> Result<Vec<(String, V)>> {
    match payload {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| Ok((k.clone(), decode_value(k, v)?)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| {
                let key = i.to_string();
                let value = decode_value(&key, v)?;
                Ok((key, value))
            })
            .collect(),
        other => Err(TreeError::Decode(format!(
            "expected a collection, got {}",
            json_type(other)
        ))),
    }
}

fn decode_value<V: DeserializeOwned>(key: &str, value: &Value) -> Result<V> {
    V::deserialize(value).map_err(|e| TreeError::Decode(format!("entry '{}': {}", key, e)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

macro_rules! leaf_node {
    ($($ty:ty),* $(,)?) => {$(
        impl TreeNode for $ty {
            fn descend(&mut self, segment: &str) -> Result<&mut dyn TreeNode> {
                Err(TreeError::unresolved(
                    segment,
                    concat!("`", stringify!($ty), "` has no children"),
                ))
            }

            fn upsert(&mut self, payload: &Value) -> Result<Vec<String>> {
                *self = <$ty>::deserialize(payload).map_err(|e| {
                    TreeError::Decode(format!(concat!("expected ", stringify!($ty), ": {}"), e))
                })?;
                Ok(Vec::new())
            }

            fn reset(&mut self) {
                *self = <$ty>::default();
            }
        }
    )*};
}

leaf_node!(String, bool, char, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<V> TreeNode for Vec<V>
where
    V: DeserializeOwned,
{
    fn descend(&mut self, segment: &str) -> Result<&mut dyn TreeNode> {
        Err(TreeError::unresolved(segment, "lists are written whole"))
    }

    fn upsert(&mut self, payload: &Value) -> Result<Vec<String>> {
        *self = Vec::<V>::deserialize(payload)
            .map_err(|e| TreeError::Decode(format!("expected a list: {}", e)))?;
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl<V> TreeNode for Option<V>
where
    V: TreeNode + Default,
{
    fn descend(&mut self, segment: &str) -> Result<&mut dyn TreeNode> {
        self.get_or_insert_with(V::default).descend(segment)
    }

    fn upsert(&mut self, payload: &Value) -> Result<Vec<String>> {
        if payload.is_null() {
            *self = None;
            return Ok(Vec::new());
        }
        match self {
            Some(value) => value.upsert(payload),
            None => {
                let mut value = V::default();
                let keys = value.upsert(payload)?;
                *self = Some(value);
                Ok(keys)
            }
        }
    }

    fn reset(&mut self) {
        *self = None;
    }
}

macro_rules! map_node {
    ($map:ident) => {
        impl<V> TreeNode for $map<String, V>
        where
            V: TreeNode + DeserializeOwned + Default + 'static,
        {
            fn descend(&mut self, segment: &str) -> Result<&mut dyn TreeNode> {
                Ok(self.entry(segment.to_string()).or_default())
            }

            fn upsert(&mut self, payload: &Value) -> Result<Vec<String>> {
                let entries = decode_entries::<V>(payload)?;
                let keys = entries.iter().map(|(k, _)| k.clone()).collect();
                self.extend(entries);
                Ok(keys)
            }

            fn reset(&mut self) {
                self.clear();
            }
        }
    };
}

map_node!(HashMap);
map_node!(BTreeMap);

impl TreeNode for Value {
    fn descend(&mut self, segment: &str) -> Result<&mut dyn TreeNode> {
        if !self.is_object() {
            *self = Value::Object(serde_json::Map::new());
        }
        match self {
            Value::Object(map) => Ok(map.entry(segment.to_string()).or_insert(Value::Null)),
            _ => Err(TreeError::unresolved(segment, "not an object")),
        }
    }

    fn upsert(&mut self, payload: &Value) -> Result<Vec<String>> {
        merge_json(self, payload);
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        *self = Value::Null;
    }
}

/// Implement [`TreeNode`] for a struct from an explicit field table.
///
/// Each listed field becomes addressable by its name (ignoring case and
/// underscores) and, optionally, by an alias that should match the field's
/// serde name. Unlisted fields are still merged by payloads written at the
/// struct itself, they just cannot be descended into.
///
/// ```
/// use firetree::tree_record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Profile {
///     name: String,
///     age: u32,
///     #[serde(rename = "zip")]
///     postal_code: Option<String>,
/// }
///
/// tree_record!(Profile { name, age, postal_code as "zip" });
/// ```
#[macro_export]
macro_rules! tree_record {
    ($ty:ty { $($field:ident $(as $alias:literal)?),* $(,)? }) => {
        impl $crate::cache::TreeNode for $ty {
            fn descend(
                &mut self,
                segment: &str,
            ) -> $crate::Result<&mut dyn $crate::cache::TreeNode> {
                $(
                    if $crate::cache::field_matches(
                        segment,
                        stringify!($field),
                        None $(.or(Some($alias)))?,
                    ) {
                        return Ok(&mut self.$field);
                    }
                )*
                Err($crate::TreeError::Path {
                    segment: segment.to_string(),
                    reason: concat!("no such field on `", stringify!($ty), "`").to_string(),
                })
            }

            fn upsert(
                &mut self,
                payload: &$crate::cache::JsonValue,
            ) -> $crate::Result<Vec<String>> {
                $crate::cache::merge_record(self, payload)?;
                Ok(Vec::new())
            }

            fn reset(&mut self) {
                *self = <$ty as Default>::default();
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
        #[serde(default)]
        street: String,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Person {
        #[serde(default)]
        name: String,
        #[serde(default)]
        age: u32,
        #[serde(default)]
        address: Option<Address>,
        #[serde(default)]
        tags: BTreeMap<String, bool>,
        #[serde(rename = "nick", default)]
        nickname: String,
    }

    crate::tree_record!(Address { city, street });
    crate::tree_record!(Person { name, age, address, tags, nickname as "nick" });

    fn segs(path: &str) -> Vec<String> {
        path.split('/').filter(|s| !s.is_empty()).map(String::from).collect()
    }

    // ========== Field Matching Tests ==========

    #[test]
    fn test_field_matches_case_insensitive() {
        assert!(field_matches("Age", "age", None));
        assert!(field_matches("AGE", "age", None));
        assert!(!field_matches("ages", "age", None));
    }

    #[test]
    fn test_field_matches_ignores_underscores() {
        assert!(field_matches("displayName", "display_name", None));
        assert!(field_matches("DISPLAY_NAME", "display_name", None));
    }

    #[test]
    fn test_field_matches_alias() {
        assert!(field_matches("nick", "nickname", Some("nick")));
        assert!(!field_matches("Nick", "other", Some("nick")));
    }

    // ========== Merge Tests ==========

    #[test]
    fn test_merge_json_deep() {
        let mut target = json!({"a": {"x": 1, "y": 2}, "b": 1});
        merge_json(&mut target, &json!({"a": {"y": 3}}));
        assert_eq!(target, json!({"a": {"x": 1, "y": 3}, "b": 1}));
    }

    #[test]
    fn test_merge_json_null_removes() {
        let mut target = json!({"a": 1, "b": 2});
        merge_json(&mut target, &json!({"a": null}));
        assert_eq!(target, json!({"b": 2}));
    }

    #[test]
    fn test_merge_json_scalar_replaces() {
        let mut target = json!({"a": 1});
        merge_json(&mut target, &json!(5));
        assert_eq!(target, json!(5));
    }

    #[test]
    fn test_merge_record_keeps_siblings() {
        let mut person = Person {
            name: "ann".into(),
            age: 3,
            ..Default::default()
        };
        merge_record(&mut person, &json!({"age": 30})).unwrap();
        assert_eq!(person.name, "ann");
        assert_eq!(person.age, 30);
    }

    #[test]
    fn test_merge_record_failure_leaves_value() {
        let mut person = Person {
            name: "ann".into(),
            ..Default::default()
        };
        let before = person.clone();
        assert!(merge_record(&mut person, &json!({"age": "old"})).is_err());
        assert_eq!(person, before);
    }

    // ========== Navigation Tests ==========

    #[test]
    fn test_write_leaf_through_record() {
        let mut person = Person::default();
        write_at(&mut person, &segs("age"), &json!(30)).unwrap();
        assert_eq!(person.age, 30);
    }

    #[test]
    fn test_write_through_alias() {
        let mut person = Person::default();
        write_at(&mut person, &segs("nick"), &json!("al")).unwrap();
        assert_eq!(person.nickname, "al");
    }

    #[test]
    fn test_write_materializes_option() {
        let mut person = Person::default();
        write_at(&mut person, &segs("address/city"), &json!("Lisbon")).unwrap();
        assert_eq!(person.address.unwrap().city, "Lisbon");
    }

    #[test]
    fn test_write_into_nested_map() {
        let mut person = Person::default();
        write_at(&mut person, &segs("tags/admin"), &json!(true)).unwrap();
        assert_eq!(person.tags.get("admin"), Some(&true));
    }

    #[test]
    fn test_unknown_field_is_path_error() {
        let mut person = Person::default();
        let err = write_at(&mut person, &segs("height"), &json!(1)).unwrap_err();
        assert!(matches!(err, TreeError::Path { ref segment, .. } if segment == "height"));
    }

    #[test]
    fn test_leaf_has_no_children() {
        let mut person = Person::default();
        let err = write_at(&mut person, &segs("age/months"), &json!(1)).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_leaf_type_mismatch() {
        let mut value = 5u32;
        assert!(value.upsert(&json!("five")).is_err());
        assert_eq!(value, 5);
    }

    #[test]
    fn test_map_upsert_returns_keys() {
        let mut map: HashMap<String, u32> = HashMap::new();
        map.insert("a".into(), 1);
        let keys = map.upsert(&json!({"a": 2, "b": 3})).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(map["a"], 2);
        assert_eq!(map["b"], 3);
    }

    #[test]
    fn test_map_upsert_all_or_nothing() {
        let mut map: BTreeMap<String, u32> = BTreeMap::new();
        assert!(map.upsert(&json!({"a": 1, "b": "x"})).is_err());
        assert!(map.is_empty());
    }

    #[test]
    fn test_map_descend_materializes_default() {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        map.descend("k").unwrap();
        assert_eq!(map.get("k").map(String::as_str), Some(""));
    }

    #[test]
    fn test_decode_entries_array() {
        let entries = decode_entries::<String>(&json!([null, "a", "b"])).unwrap();
        assert_eq!(
            entries,
            vec![("1".to_string(), "a".to_string()), ("2".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn test_decode_entries_rejects_scalar() {
        assert!(decode_entries::<String>(&json!("x")).is_err());
    }

    #[test]
    fn test_option_upsert_null_clears() {
        let mut value = Some("x".to_string());
        value.upsert(&Value::Null).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_json_value_navigation() {
        let mut value = Value::Null;
        write_at(&mut value, &segs("a/b"), &json!(1)).unwrap();
        assert_eq!(value, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_reset_at() {
        let mut person = Person {
            age: 9,
            ..Default::default()
        };
        reset_at(&mut person, &segs("age")).unwrap();
        assert_eq!(person.age, 0);
    }
}
