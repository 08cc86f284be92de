//! Bidirectional mapping between [`Schema`] and the wire JSON-Schema dialect.
//!
//! `encode` is total: the schema tree cannot represent anything outside the
//! supported construct set. `decode` is its inverse for that subset and
//! rejects everything else with [`Error::SchemaCompile`], identifying the
//! unsupported keyword and its path. `decode(encode(x))` is structurally
//! equal to `x` for every supported construct.

use super::{NumberConstraints, Property, Schema, SchemaKind, StringConstraints, StringFormat};
use crate::{Error, Result};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Keywords `decode` understands. Anything else is an unsupported construct.
const SUPPORTED_KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "required",
    "additionalProperties",
    "items",
    "prefixItems",
    "anyOf",
    "allOf",
    "enum",
    "const",
    "description",
    "default",
    "format",
    "minLength",
    "maxLength",
    "pattern",
    "minimum",
    "maximum",
    "minItems",
    "maxItems",
];

/// Encode a schema into its wire form.
pub fn encode(schema: &Schema) -> Value {
    let mut map = Map::new();

    match &schema.kind {
        SchemaKind::Null => {
            map.insert("type".into(), json!("null"));
        }
        SchemaKind::Boolean => {
            map.insert("type".into(), json!("boolean"));
        }
        SchemaKind::Integer(bounds) => {
            map.insert("type".into(), json!("integer"));
            encode_bounds(bounds, &mut map);
        }
        SchemaKind::Number(bounds) => {
            map.insert("type".into(), json!("number"));
            encode_bounds(bounds, &mut map);
        }
        SchemaKind::String(constraints) => {
            map.insert("type".into(), json!("string"));
            if let Some(format) = constraints.format {
                map.insert("format".into(), json!(format.as_str()));
            }
            if let Some(min) = constraints.min_length {
                map.insert("minLength".into(), json!(min));
            }
            if let Some(max) = constraints.max_length {
                map.insert("maxLength".into(), json!(max));
            }
            if let Some(ref pattern) = constraints.pattern {
                map.insert("pattern".into(), json!(pattern));
            }
        }
        SchemaKind::Array {
            items,
            min_items,
            max_items,
        } => {
            map.insert("type".into(), json!("array"));
            map.insert("items".into(), encode(items));
            if let Some(min) = min_items {
                map.insert("minItems".into(), json!(min));
            }
            if let Some(max) = max_items {
                map.insert("maxItems".into(), json!(max));
            }
        }
        SchemaKind::Tuple(items) => {
            map.insert("type".into(), json!("array"));
            map.insert(
                "prefixItems".into(),
                Value::Array(items.iter().map(encode).collect()),
            );
            // Pin the arity and forbid a trailing tail.
            map.insert("items".into(), json!(false));
            map.insert("minItems".into(), json!(items.len()));
            map.insert("maxItems".into(), json!(items.len()));
        }
        SchemaKind::Object(props) => {
            map.insert("type".into(), json!("object"));
            let mut properties = Map::new();
            let mut required = Vec::new();
            for (name, prop) in props {
                properties.insert(name.clone(), encode(&prop.schema));
                if prop.required {
                    required.push(json!(name));
                }
            }
            map.insert("properties".into(), Value::Object(properties));
            if !required.is_empty() {
                map.insert("required".into(), Value::Array(required));
            }
            map.insert("additionalProperties".into(), json!(false));
        }
        SchemaKind::OpenObject(additional) => {
            map.insert("type".into(), json!("object"));
            map.insert("additionalProperties".into(), encode(additional));
        }
        SchemaKind::Union(branches) => {
            map.insert(
                "anyOf".into(),
                Value::Array(branches.iter().map(encode).collect()),
            );
        }
        SchemaKind::Intersection(branches) => {
            map.insert(
                "allOf".into(),
                Value::Array(branches.iter().map(encode).collect()),
            );
        }
        SchemaKind::Enum(values) => {
            map.insert("type".into(), json!("string"));
            map.insert(
                "enum".into(),
                Value::Array(values.iter().map(|v| json!(v)).collect()),
            );
        }
        SchemaKind::Const(value) => {
            map.insert("const".into(), value.clone());
        }
    }

    if let Some(ref description) = schema.description {
        map.insert("description".into(), json!(description));
    }
    if let Some(ref default) = schema.default {
        map.insert("default".into(), default.clone());
    }

    Value::Object(map)
}

fn encode_bounds(bounds: &NumberConstraints, map: &mut Map<String, Value>) {
    if let Some(min) = bounds.minimum {
        map.insert("minimum".into(), json!(min));
    }
    if let Some(max) = bounds.maximum {
        map.insert("maximum".into(), json!(max));
    }
}

/// Decode a wire schema back into a [`Schema`].
pub fn decode(wire: &Value) -> Result<Schema> {
    decode_at(wire, "")
}

fn unsupported(keyword: &str, path: &str) -> Error {
    Error::SchemaCompile {
        keyword: keyword.into(),
        path: path.into(),
    }
}

fn child_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn decode_at(wire: &Value, path: &str) -> Result<Schema> {
    let map = wire
        .as_object()
        .ok_or_else(|| unsupported("schema", path))?;

    for key in map.keys() {
        if !SUPPORTED_KEYWORDS.contains(&key.as_str()) {
            return Err(unsupported(key, path));
        }
    }

    let kind = decode_kind(map, path)?;

    let description = map
        .get("description")
        .and_then(|d| d.as_str())
        .map(String::from);
    let default = map.get("default").cloned();

    Ok(Schema {
        kind,
        description,
        default,
    })
}

fn decode_kind(map: &Map<String, Value>, path: &str) -> Result<SchemaKind> {
    if let Some(value) = map.get("const") {
        if value.is_array() || value.is_object() {
            return Err(unsupported("const", path));
        }
        return Ok(SchemaKind::Const(value.clone()));
    }

    if let Some(values) = map.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| unsupported("enum", path))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(String::from)
                    .ok_or_else(|| unsupported("enum", path))
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(SchemaKind::Enum(values));
    }

    if let Some(branches) = map.get("anyOf") {
        return Ok(SchemaKind::Union(decode_branches(branches, path, "anyOf")?));
    }

    if let Some(branches) = map.get("allOf") {
        return Ok(SchemaKind::Intersection(decode_branches(
            branches, path, "allOf",
        )?));
    }

    let type_name = map
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| unsupported("type", path))?;

    match type_name {
        "null" => Ok(SchemaKind::Null),
        "boolean" => Ok(SchemaKind::Boolean),
        "integer" => Ok(SchemaKind::Integer(decode_bounds(map))),
        "number" => Ok(SchemaKind::Number(decode_bounds(map))),
        "string" => Ok(SchemaKind::String(decode_string_constraints(map, path)?)),
        "array" => decode_array(map, path),
        "object" => decode_object(map, path),
        other => Err(unsupported(other, path)),
    }
}

fn decode_branches(branches: &Value, path: &str, keyword: &str) -> Result<Vec<Schema>> {
    branches
        .as_array()
        .ok_or_else(|| unsupported(keyword, path))?
        .iter()
        .enumerate()
        .map(|(i, b)| decode_at(b, &format!("{}[{}]", child_path(path, keyword), i)))
        .collect()
}

fn decode_bounds(map: &Map<String, Value>) -> NumberConstraints {
    NumberConstraints {
        minimum: map.get("minimum").and_then(|v| v.as_f64()),
        maximum: map.get("maximum").and_then(|v| v.as_f64()),
    }
}

fn decode_string_constraints(map: &Map<String, Value>, path: &str) -> Result<StringConstraints> {
    let format = match map.get("format").and_then(|f| f.as_str()) {
        Some(name) => Some(StringFormat::parse(name).ok_or_else(|| unsupported("format", path))?),
        None => None,
    };
    Ok(StringConstraints {
        format,
        min_length: map.get("minLength").and_then(|v| v.as_u64()),
        max_length: map.get("maxLength").and_then(|v| v.as_u64()),
        pattern: map.get("pattern").and_then(|p| p.as_str()).map(String::from),
    })
}

fn decode_array(map: &Map<String, Value>, path: &str) -> Result<SchemaKind> {
    if let Some(prefix) = map.get("prefixItems") {
        // Tuple form; a schema-valued `items` tail is outside the dialect.
        if let Some(items) = map.get("items") {
            if items != &json!(false) {
                return Err(unsupported("items", path));
            }
        }
        let items = prefix
            .as_array()
            .ok_or_else(|| unsupported("prefixItems", path))?
            .iter()
            .enumerate()
            .map(|(i, s)| decode_at(s, &format!("{}[{}]", child_path(path, "prefixItems"), i)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(SchemaKind::Tuple(items));
    }

    let items = map.get("items").ok_or_else(|| unsupported("items", path))?;
    Ok(SchemaKind::Array {
        items: Box::new(decode_at(items, &child_path(path, "items"))?),
        min_items: map.get("minItems").and_then(|v| v.as_u64()),
        max_items: map.get("maxItems").and_then(|v| v.as_u64()),
    })
}

fn decode_object(map: &Map<String, Value>, path: &str) -> Result<SchemaKind> {
    let additional = map.get("additionalProperties");
    let schema_additional = additional.filter(|v| !v.is_boolean());

    if let Some(props) = map.get("properties") {
        // Closed object. Mixing enumerated properties with a schema-valued
        // additionalProperties is outside the dialect.
        if schema_additional.is_some() || additional == Some(&json!(true)) {
            return Err(unsupported("additionalProperties", path));
        }
        let props = props
            .as_object()
            .ok_or_else(|| unsupported("properties", path))?;
        let required: Vec<&str> = map
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let mut out = BTreeMap::new();
        for (name, prop_wire) in props {
            let schema = decode_at(prop_wire, &child_path(path, name))?;
            out.insert(
                name.clone(),
                Property {
                    schema,
                    required: required.contains(&name.as_str()),
                },
            );
        }
        return Ok(SchemaKind::Object(out));
    }

    if let Some(wire) = schema_additional {
        let schema = decode_at(wire, &child_path(path, "additionalProperties"))?;
        return Ok(SchemaKind::OpenObject(Box::new(schema)));
    }

    // An unconstrained open object is outside the dialect; open objects
    // always carry a value schema.
    if additional == Some(&json!(true)) {
        return Err(unsupported("additionalProperties", path));
    }

    // Bare object: closed with no declared properties.
    Ok(SchemaKind::Object(BTreeMap::new()))
}
