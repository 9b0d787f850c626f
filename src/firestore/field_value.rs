//! Firestore field value conversion
//!
//! The REST API wraps every field value in a type tag
//! (`{"integerValue": "42"}`, `{"mapValue": {"fields": {...}}}`). Documents
//! returned to callers carry plain JSON instead; [`parse_document`] performs
//! that conversion. [`to_wire_value`] goes the other way for callers that
//! build `fields` from plain JSON.

use serde_json::{Map, Number, Value};

use super::types::{Document, Fields};
use crate::error::{FirebaseError, FirebaseResult};

const VALUE_TYPES: [&str; 11] = [
    "arrayValue",
    "bytesValue",
    "booleanValue",
    "doubleValue",
    "geoPointValue",
    "integerValue",
    "mapValue",
    "nullValue",
    "referenceValue",
    "stringValue",
    "timestampValue",
];

fn value_type(map: &Map<String, Value>) -> Option<&'static str> {
    VALUE_TYPES.iter().copied().find(|key| map.contains_key(*key))
}

fn parse_number(raw: Value) -> Value {
    match raw {
        Value::Number(_) => raw,
        Value::String(text) => {
            if let Ok(int) = text.parse::<i64>() {
                return Value::Number(int.into());
            }
            match text.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(number) => Value::Number(number),
                // NaN and infinities have no JSON number form
                None => Value::String(text),
            }
        }
        other => other,
    }
}

/// Convert one typed wire value (or any JSON containing them) to plain JSON
pub fn parse_value(value: Value) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        other => return other,
    };

    let Some(kind) = value_type(&map) else {
        return Value::Object(parse_fields(map));
    };
    let inner = map.remove(kind).unwrap_or(Value::Null);

    match kind {
        "integerValue" | "doubleValue" => parse_number(inner),
        "arrayValue" => {
            let values = match inner {
                Value::Object(mut array) => match array.remove("values") {
                    Some(Value::Array(values)) => values,
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            Value::Array(values.into_iter().map(parse_value).collect())
        }
        "mapValue" => {
            let fields = match inner {
                Value::Object(mut map) => match map.remove("fields") {
                    Some(Value::Object(fields)) => fields,
                    _ => Map::new(),
                },
                _ => Map::new(),
            };
            Value::Object(parse_fields(fields))
        }
        "geoPointValue" => {
            let mut point = Map::new();
            point.insert("latitude".to_string(), Value::from(0));
            point.insert("longitude".to_string(), Value::from(0));
            if let Value::Object(given) = inner {
                point.extend(given);
            }
            Value::Object(point)
        }
        _ => inner,
    }
}

/// Convert every value of a field map
pub fn parse_fields(fields: Fields) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (key, parse_value(value)))
        .collect()
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}

/// Convert a wire document into a [`Document`] with plain field values
pub fn parse_document(wire: Value) -> FirebaseResult<Document> {
    let mut map = match wire {
        Value::Object(map) => map,
        other => {
            return Err(FirebaseError::internal(format!(
                "expected a document object, got {other}"
            )));
        }
    };

    let fields = match map.remove("fields") {
        Some(Value::Object(fields)) => parse_fields(fields),
        _ => Fields::new(),
    };

    Ok(Document {
        name: take_string(&mut map, "name").unwrap_or_default(),
        fields,
        create_time: take_string(&mut map, "createTime"),
        update_time: take_string(&mut map, "updateTime"),
        read_time: take_string(&mut map, "readTime"),
    })
}

fn tagged(kind: &str, inner: Value) -> Value {
    let mut map = Map::new();
    map.insert(kind.to_string(), inner);
    Value::Object(map)
}

/// Convert plain JSON into a typed wire value
pub fn to_wire_value(value: &Value) -> Value {
    match value {
        Value::Null => tagged("nullValue", Value::String("NULL_VALUE".to_string())),
        Value::Bool(flag) => tagged("booleanValue", Value::Bool(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(int) => tagged("integerValue", Value::String(int.to_string())),
            None => tagged("doubleValue", Value::Number(number.clone())),
        },
        Value::String(text) => tagged("stringValue", Value::String(text.clone())),
        Value::Array(values) => {
            let mut array = Map::new();
            array.insert(
                "values".to_string(),
                Value::Array(values.iter().map(to_wire_value).collect()),
            );
            tagged("arrayValue", Value::Object(array))
        }
        Value::Object(map) => {
            let mut fields = Map::new();
            fields.insert("fields".to_string(), Value::Object(to_wire_fields(map)));
            tagged("mapValue", Value::Object(fields))
        }
    }
}

/// Convert a plain JSON object into typed wire fields
pub fn to_wire_fields(plain: &Map<String, Value>) -> Fields {
    plain
        .iter()
        .map(|(key, value)| (key.clone(), to_wire_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_value(json!({"stringValue": "hi"})), json!("hi"));
        assert_eq!(parse_value(json!({"integerValue": "42"})), json!(42));
        assert_eq!(parse_value(json!({"doubleValue": 1.5})), json!(1.5));
        assert_eq!(parse_value(json!({"booleanValue": true})), json!(true));
        assert_eq!(parse_value(json!({"nullValue": null})), Value::Null);
        assert_eq!(
            parse_value(json!({"timestampValue": "2024-01-01T00:00:00Z"})),
            json!("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_parse_nested() {
        let wire = json!({
            "mapValue": {"fields": {
                "tags": {"arrayValue": {"values": [{"stringValue": "a"}, {"integerValue": "2"}]}},
                "empty": {"arrayValue": {}}
            }}
        });
        assert_eq!(parse_value(wire), json!({"tags": ["a", 2], "empty": []}));
    }

    #[test]
    fn test_parse_geo_point_defaults() {
        assert_eq!(
            parse_value(json!({"geoPointValue": {"latitude": 12.5}})),
            json!({"latitude": 12.5, "longitude": 0})
        );
    }

    #[test]
    fn test_parse_non_finite_double_kept_as_text() {
        assert_eq!(parse_value(json!({"doubleValue": "NaN"})), json!("NaN"));
    }

    #[test]
    fn test_parse_document() {
        let doc = parse_document(json!({
            "name": "projects/p/databases/(default)/documents/users/alice",
            "fields": {"age": {"integerValue": "30"}},
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-02T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.id(), "alice");
        assert_eq!(doc.get("age"), Some(&json!(30)));
        assert_eq!(doc.create_time.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(doc.read_time.is_none());
    }

    #[test]
    fn test_parse_document_rejects_non_object() {
        assert!(parse_document(json!([1, 2])).is_err());
    }

    #[test]
    fn test_to_wire_value() {
        assert_eq!(to_wire_value(&json!(7)), json!({"integerValue": "7"}));
        assert_eq!(
            to_wire_value(&json!({"name": "x", "ok": false})),
            json!({"mapValue": {"fields": {
                "name": {"stringValue": "x"},
                "ok": {"booleanValue": false}
            }}})
        );
    }
}
