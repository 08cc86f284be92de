//! Structured-data schema description and its wire codec.
//!
//! [`Schema`] is a tree over a restricted construct set: null, boolean,
//! integer, number, string (with a fixed set of named formats), array, tuple,
//! closed object XOR open object, anyOf union, allOf intersection, string
//! enum, and scalar const, plus per-node `description` and `default`
//! annotations. Constructs outside this set cannot be represented: `$ref`,
//! `oneOf`, conditional keywords, and non-scalar consts are rejected when a
//! schema is built or decoded, never during generation.
//!
//! The [`codec`] submodule maps schemas to and from the wire JSON-Schema
//! dialect; [`validate`] checks generated text against a schema.

pub mod codec;
pub mod validate;

pub use codec::{decode, encode};
pub use validate::validate;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A node in the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub description: Option<String>,
    pub default: Option<Value>,
}

/// The construct a schema node represents. Exactly one per node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Null,
    Boolean,
    Integer(NumberConstraints),
    Number(NumberConstraints),
    String(StringConstraints),
    Array {
        items: Box<Schema>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    /// Fixed positional items; arity is exact.
    Tuple(Vec<Schema>),
    /// Closed object: only the enumerated properties are allowed.
    Object(BTreeMap<String, Property>),
    /// Open object: any property name, all values against one schema.
    OpenObject(Box<Schema>),
    /// anyOf — at least one branch must match.
    Union(Vec<Schema>),
    /// allOf — every branch must match.
    Intersection(Vec<Schema>),
    /// Fixed set of allowed strings.
    Enum(Vec<String>),
    /// A single allowed scalar value. Never an array or object.
    Const(Value),
}

/// One property of a closed object.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub schema: Schema,
    pub required: bool,
}

impl Property {
    pub fn required(schema: Schema) -> Self {
        Self {
            schema,
            required: true,
        }
    }

    pub fn optional(schema: Schema) -> Self {
        Self {
            schema,
            required: false,
        }
    }
}

/// Bounds for integer and number nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberConstraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

/// Constraints for string nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringConstraints {
    pub format: Option<StringFormat>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
}

/// Named string formats the validator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    Email,
    Ipv4,
    Ipv6,
    Uri,
    DateTime,
    Date,
    Time,
    Uuid,
}

impl StringFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Uri => "uri",
            StringFormat::DateTime => "date-time",
            StringFormat::Date => "date",
            StringFormat::Time => "time",
            StringFormat::Uuid => "uuid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "email" => StringFormat::Email,
            "ipv4" => StringFormat::Ipv4,
            "ipv6" => StringFormat::Ipv6,
            "uri" => StringFormat::Uri,
            "date-time" => StringFormat::DateTime,
            "date" => StringFormat::Date,
            "time" => StringFormat::Time,
            "uuid" => StringFormat::Uuid,
            _ => return None,
        })
    }
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
            default: None,
        }
    }

    pub fn null() -> Self {
        Self::of(SchemaKind::Null)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer(NumberConstraints::default()))
    }

    pub fn number() -> Self {
        Self::of(SchemaKind::Number(NumberConstraints::default()))
    }

    pub fn string() -> Self {
        Self::of(SchemaKind::String(StringConstraints::default()))
    }

    pub fn string_with(constraints: StringConstraints) -> Self {
        Self::of(SchemaKind::String(constraints))
    }

    pub fn string_format(format: StringFormat) -> Self {
        Self::of(SchemaKind::String(StringConstraints {
            format: Some(format),
            ..Default::default()
        }))
    }

    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    pub fn tuple(items: Vec<Schema>) -> Self {
        Self::of(SchemaKind::Tuple(items))
    }

    /// Closed object with every listed property required.
    pub fn object<K: Into<String>>(props: impl IntoIterator<Item = (K, Schema)>) -> Self {
        let map = props
            .into_iter()
            .map(|(k, v)| (k.into(), Property::required(v)))
            .collect();
        Self::of(SchemaKind::Object(map))
    }

    /// Closed object with explicit per-property required flags.
    pub fn object_of(props: BTreeMap<String, Property>) -> Self {
        Self::of(SchemaKind::Object(props))
    }

    /// Open object: arbitrary property names, all values against `additional`.
    pub fn open_object(additional: Schema) -> Self {
        Self::of(SchemaKind::OpenObject(Box::new(additional)))
    }

    pub fn union(branches: Vec<Schema>) -> Self {
        Self::of(SchemaKind::Union(branches))
    }

    pub fn intersection(branches: Vec<Schema>) -> Self {
        Self::of(SchemaKind::Intersection(branches))
    }

    pub fn string_enum<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::of(SchemaKind::Enum(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// A single allowed value. Fails for arrays and objects: only scalar
    /// consts belong to the supported construct set.
    pub fn const_value(value: Value) -> crate::Result<Self> {
        if value.is_array() || value.is_object() {
            return Err(crate::Error::SchemaCompile {
                keyword: "const".into(),
                path: String::new(),
            });
        }
        Ok(Self::of(SchemaKind::Const(value)))
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// The wire encoding of this schema.
    pub fn to_wire(&self) -> Value {
        codec::encode(self)
    }
}

// Schemas travel inside tool descriptors and persisted request echoes in
// their wire encoding, keeping transcript files plain JSON Schema.
impl Serialize for Schema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        codec::encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Value::deserialize(deserializer)?;
        codec::decode(&wire).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_const_rejects_non_scalar_at_build_time() {
        let err = Schema::const_value(json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::SchemaCompile { ref keyword, .. } if keyword == "const"
        ));
        assert!(Schema::const_value(json!("ok")).is_ok());
        assert!(Schema::const_value(json!(3)).is_ok());
        assert!(Schema::const_value(Value::Null).is_ok());
    }

    #[test]
    fn test_object_builder_marks_all_required() {
        let schema = Schema::object([("say", Schema::string())]);
        match &schema.kind {
            SchemaKind::Object(props) => {
                assert!(props["say"].required);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_uses_wire_encoding() {
        let schema = Schema::object([("say", Schema::string())]);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["say"]["type"], "string");
        let back: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_string_format_parse_round_trip() {
        for f in [
            StringFormat::Email,
            StringFormat::Ipv4,
            StringFormat::Ipv6,
            StringFormat::Uri,
            StringFormat::DateTime,
            StringFormat::Date,
            StringFormat::Time,
            StringFormat::Uuid,
        ] {
            assert_eq!(StringFormat::parse(f.as_str()), Some(f));
        }
        assert_eq!(StringFormat::parse("hostname"), None);
    }
}
