//! # JSON Record Decoding
//!
//! Turns a JSON document into a [`Record`] shaped by the schema. The
//! decoder checks structure and scalar kinds only; constraints are the
//! validator's business.
//!
//! Mapping:
//!
//! - object, for a message-typed value → record
//! - array → repeated field
//! - object, for a map field → entries, keys parsed to the key kind
//! - bool / number / string → the field's scalar kind
//! - `null` → field left unset
//!
//! `bytes` fields take a string and store its UTF-8 bytes; `enum` fields
//! take the numeric value.

use std::collections::BTreeMap;

use msgcheck_core::{
    Cardinality, FieldDescriptor, FieldValue, MapKey, MapKeyKind, Record, SchemaSource, TypeName,
    Value, ValueKind,
};
use serde_json::Value as Json;
use thiserror::Error;

/// Why a JSON document could not be decoded into a record.
///
/// Every variant names the JSON pointer of the offending node (`""` is the
/// document root).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The requested record type is not in the schema.
    #[error("at '{pointer}': unknown record type {type_name}")]
    UnknownType {
        /// Location of the record.
        pointer: String,
        /// The missing type.
        type_name: String,
    },

    /// The object carries a member the record type does not declare.
    #[error("at '{pointer}': {type_name} has no field '{field}'")]
    UnknownField {
        /// Location of the member.
        pointer: String,
        /// The record type.
        type_name: String,
        /// The undeclared member name.
        field: String,
    },

    /// The JSON node has the wrong shape for the declared field.
    #[error("at '{pointer}': expected {expected}, found {found}")]
    Mismatch {
        /// Location of the node.
        pointer: String,
        /// What the schema asks for.
        expected: String,
        /// The JSON type actually present.
        found: String,
    },

    /// A map key does not parse as the declared key kind.
    #[error("at '{pointer}': map key '{key}' is not a valid {expected}")]
    BadMapKey {
        /// Location of the entry.
        pointer: String,
        /// The raw key.
        key: String,
        /// The declared key kind.
        expected: String,
    },
}

/// Decode `json` as a record of `type_name`.
///
/// # Errors
///
/// Returns the first [`DecodeError`] met in document order.
pub fn decode_record(
    schema: &dyn SchemaSource,
    type_name: &TypeName,
    json: &Json,
) -> Result<Record, DecodeError> {
    decode_at(schema, type_name, json, "")
}

fn decode_at(
    schema: &dyn SchemaSource,
    type_name: &TypeName,
    json: &Json,
    pointer: &str,
) -> Result<Record, DecodeError> {
    let descriptor = schema
        .descriptor(type_name)
        .ok_or_else(|| DecodeError::UnknownType {
            pointer: pointer.to_string(),
            type_name: type_name.to_string(),
        })?;
    let object = json.as_object().ok_or_else(|| DecodeError::Mismatch {
        pointer: pointer.to_string(),
        expected: format!("object for {type_name}"),
        found: json_kind(json).to_string(),
    })?;

    let mut record = Record::new(type_name.clone());
    for (member, node) in object {
        let at = child_pointer(pointer, member);
        let field = descriptor
            .field(member)
            .ok_or_else(|| DecodeError::UnknownField {
                pointer: at.clone(),
                type_name: type_name.to_string(),
                field: member.clone(),
            })?;
        if node.is_null() {
            continue;
        }
        let value = decode_field(schema, field, node, &at)?;
        record = record.with(member.clone(), value);
    }
    Ok(record)
}

fn decode_field(
    schema: &dyn SchemaSource,
    field: &FieldDescriptor,
    json: &Json,
    pointer: &str,
) -> Result<FieldValue, DecodeError> {
    match field.cardinality() {
        Cardinality::Singular => Ok(FieldValue::Singular(decode_value(
            schema,
            field.kind(),
            json,
            pointer,
        )?)),
        Cardinality::Repeated => {
            let items = json.as_array().ok_or_else(|| DecodeError::Mismatch {
                pointer: pointer.to_string(),
                expected: format!("array of {}", field.kind()),
                found: json_kind(json).to_string(),
            })?;
            let values = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    decode_value(schema, field.kind(), item, &child_pointer(pointer, &i.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::Repeated(values))
        }
        Cardinality::Map { key } => {
            let entries = json.as_object().ok_or_else(|| DecodeError::Mismatch {
                pointer: pointer.to_string(),
                expected: format!("object of {}", field.kind()),
                found: json_kind(json).to_string(),
            })?;
            let mut map = BTreeMap::new();
            for (raw, node) in entries {
                let at = child_pointer(pointer, raw);
                let parsed = parse_key(raw, key).ok_or_else(|| DecodeError::BadMapKey {
                    pointer: at.clone(),
                    key: raw.clone(),
                    expected: key_kind_name(key).to_string(),
                })?;
                map.insert(parsed, decode_value(schema, field.kind(), node, &at)?);
            }
            Ok(FieldValue::Map(map))
        }
    }
}

fn decode_value(
    schema: &dyn SchemaSource,
    kind: &ValueKind,
    json: &Json,
    pointer: &str,
) -> Result<Value, DecodeError> {
    let decoded = match kind {
        ValueKind::Bool => json.as_bool().map(Value::Bool),
        ValueKind::Int => json.as_i64().map(Value::Int),
        ValueKind::Uint => json.as_u64().map(Value::Uint),
        ValueKind::Float => json.as_f64().map(Value::Float),
        ValueKind::String => json.as_str().map(Value::from),
        ValueKind::Bytes => json.as_str().map(|s| Value::Bytes(s.as_bytes().to_vec())),
        ValueKind::Enum => json
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Enum),
        ValueKind::Message(type_name) => {
            return decode_at(schema, type_name, json, pointer).map(Value::Message);
        }
    };
    decoded.ok_or_else(|| DecodeError::Mismatch {
        pointer: pointer.to_string(),
        expected: kind.to_string(),
        found: json_kind(json).to_string(),
    })
}

fn parse_key(raw: &str, kind: MapKeyKind) -> Option<MapKey> {
    match kind {
        MapKeyKind::Bool => raw.parse().ok().map(MapKey::Bool),
        MapKeyKind::Int => raw.parse().ok().map(MapKey::Int),
        MapKeyKind::Uint => raw.parse().ok().map(MapKey::Uint),
        MapKeyKind::String => Some(MapKey::String(raw.to_string())),
    }
}

fn key_kind_name(kind: MapKeyKind) -> &'static str {
    match kind {
        MapKeyKind::Bool => "bool",
        MapKeyKind::Int => "int",
        MapKeyKind::Uint => "uint",
        MapKeyKind::String => "string",
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// RFC 6901 pointer for `token` under `parent`.
fn child_pointer(parent: &str, token: &str) -> String {
    format!("{parent}/{}", token.replace('~', "~0").replace('/', "~1"))
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use msgcheck_core::TypeSet;
    use serde_json::json;

    const SCHEMA: &str = r#"
types:
  - name: acme.Order
    fields:
      - { name: id, kind: string }
      - { name: qty, kind: uint }
      - { name: express, kind: bool }
      - { name: status, kind: enum }
      - { name: weight, kind: float }
      - { name: blob, kind: bytes }
      - { name: tags, kind: string, cardinality: repeated }
      - name: lines
        kind: { message: acme.Line }
        cardinality: repeated
      - name: stock
        kind: int
        cardinality: map
        key: int
  - name: acme.Line
    fields:
      - { name: sku, kind: string }
      - { name: price, kind: int }
"#;

    fn types() -> TypeSet {
        TypeSet::from_yaml_str(SCHEMA).unwrap()
    }

    fn order() -> TypeName {
        TypeName::new("acme.Order").unwrap()
    }

    #[test]
    fn test_decodes_every_shape() {
        let doc = json!({
            "id": "o-1",
            "qty": 3,
            "express": true,
            "status": 2,
            "weight": 1.5,
            "blob": "ab",
            "tags": ["x", "y"],
            "lines": [{ "sku": "S1", "price": 10 }],
            "stock": { "7": 1, "-2": 0 }
        });
        let record = decode_record(&types(), &order(), &doc).unwrap();

        assert_eq!(record.get("id"), Some(&FieldValue::Singular(Value::from("o-1"))));
        assert_eq!(record.get("qty"), Some(&FieldValue::Singular(Value::Uint(3))));
        assert_eq!(record.get("status"), Some(&FieldValue::Singular(Value::Enum(2))));
        assert_eq!(record.get("blob"), Some(&FieldValue::Singular(Value::Bytes(b"ab".to_vec()))));
        assert_eq!(
            record.get("tags"),
            Some(&FieldValue::Repeated(vec![Value::from("x"), Value::from("y")]))
        );
        match record.get("lines") {
            Some(FieldValue::Repeated(items)) => {
                let line = items[0].as_record().unwrap();
                assert_eq!(line.type_name().as_str(), "acme.Line");
                assert_eq!(line.get("price"), Some(&FieldValue::Singular(Value::Int(10))));
            }
            other => panic!("Expected repeated lines, got: {other:?}"),
        }
        match record.get("stock") {
            Some(FieldValue::Map(entries)) => {
                assert_eq!(entries.get(&MapKey::Int(7)), Some(&Value::Int(1)));
                assert_eq!(entries.get(&MapKey::Int(-2)), Some(&Value::Int(0)));
            }
            other => panic!("Expected map stock, got: {other:?}"),
        }
    }

    #[test]
    fn test_null_leaves_field_unset() {
        let record = decode_record(&types(), &order(), &json!({ "id": null })).unwrap();
        assert!(!record.has("id"));
    }

    // ── Errors name the pointer ──────────────────────────────────────

    #[test]
    fn test_unknown_field() {
        let err = decode_record(&types(), &order(), &json!({ "nope": 1 })).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownField {
                pointer: "/nope".into(),
                type_name: "acme.Order".into(),
                field: "nope".into(),
            }
        );
    }

    #[test]
    fn test_nested_mismatch_pointer() {
        let doc = json!({ "lines": [{ "sku": "S1" }, { "price": "ten" }] });
        match decode_record(&types(), &order(), &doc).unwrap_err() {
            DecodeError::Mismatch { pointer, expected, found } => {
                assert_eq!(pointer, "/lines/1/price");
                assert_eq!(expected, "int");
                assert_eq!(found, "string");
            }
            other => panic!("Expected Mismatch, got: {other:?}"),
        }
    }

    #[test]
    fn test_negative_into_uint() {
        let err = decode_record(&types(), &order(), &json!({ "qty": -1 })).unwrap_err();
        assert!(matches!(err, DecodeError::Mismatch { ref pointer, .. } if pointer == "/qty"));
    }

    #[test]
    fn test_repeated_needs_array() {
        let err = decode_record(&types(), &order(), &json!({ "tags": "x" })).unwrap_err();
        assert!(err.to_string().contains("expected array of string, found string"));
    }

    #[test]
    fn test_bad_map_key() {
        let err = decode_record(&types(), &order(), &json!({ "stock": { "seven": 1 } })).unwrap_err();
        assert_eq!(
            err,
            DecodeError::BadMapKey {
                pointer: "/stock/seven".into(),
                key: "seven".into(),
                expected: "int".into(),
            }
        );
    }

    #[test]
    fn test_root_must_be_object() {
        let err = decode_record(&types(), &order(), &json!([1])).unwrap_err();
        assert_eq!(err.to_string(), "at '': expected object for acme.Order, found array");
    }

    #[test]
    fn test_unknown_root_type() {
        let missing = TypeName::new("acme.Missing").unwrap();
        let err = decode_record(&types(), &missing, &json!({})).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownType { .. }));
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(child_pointer("", "a/b~c"), "/a~1b~0c");
    }
}
