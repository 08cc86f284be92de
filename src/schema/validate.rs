//! Validation of generated text against a schema.
//!
//! `validate` parses the text as JSON and then walks the schema tree,
//! collecting every constraint violation with its path. A failure carries the
//! raw text, the best-effort parsed value, and the structured issue list.

use super::{NumberConstraints, Property, Schema, SchemaKind, StringConstraints, StringFormat};
use crate::{Error, Issue, IssueKind, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse `text` as a wire value and check it against `schema`.
///
/// Returns the parsed value on success, [`Error::ResultValidate`] otherwise.
pub fn validate(schema: &Schema, text: &str) -> Result<Value> {
    let parsed: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            return Err(Error::ResultValidate {
                raw_text: text.to_string(),
                parsed: None,
                issues: vec![Issue::new(
                    "",
                    IssueKind::Parse,
                    format!("not valid JSON: {}", e),
                )],
            })
        }
    };

    let mut issues = Vec::new();
    check(schema, &parsed, "", &mut issues);

    if issues.is_empty() {
        Ok(parsed)
    } else {
        Err(Error::ResultValidate {
            raw_text: text.to_string(),
            parsed: Some(parsed),
            issues,
        })
    }
}

/// Check an already-parsed value against a schema.
pub fn check_value(schema: &Schema, value: &Value) -> Vec<Issue> {
    let mut issues = Vec::new();
    check(schema, value, "", &mut issues);
    issues
}

fn check(schema: &Schema, value: &Value, path: &str, issues: &mut Vec<Issue>) {
    match &schema.kind {
        SchemaKind::Null => {
            if !value.is_null() {
                issues.push(type_issue(path, "null", value));
            }
        }
        SchemaKind::Boolean => {
            if !value.is_boolean() {
                issues.push(type_issue(path, "boolean", value));
            }
        }
        SchemaKind::Integer(bounds) => {
            if value.as_i64().is_none() && value.as_u64().is_none() {
                issues.push(type_issue(path, "integer", value));
            } else if let Some(n) = value.as_f64() {
                check_bounds(n, bounds, path, issues);
            }
        }
        SchemaKind::Number(bounds) => match value.as_f64() {
            Some(n) => check_bounds(n, bounds, path, issues),
            None => issues.push(type_issue(path, "number", value)),
        },
        SchemaKind::String(constraints) => match value.as_str() {
            Some(s) => check_string(s, constraints, path, issues),
            None => issues.push(type_issue(path, "string", value)),
        },
        SchemaKind::Array {
            items,
            min_items,
            max_items,
        } => match value.as_array() {
            Some(arr) => {
                if let Some(min) = min_items {
                    if (arr.len() as u64) < *min {
                        issues.push(Issue::new(
                            path,
                            IssueKind::Length,
                            format!("array too short (minimum {} items)", min),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if (arr.len() as u64) > *max {
                        issues.push(Issue::new(
                            path,
                            IssueKind::Length,
                            format!("array too long (maximum {} items)", max),
                        ));
                    }
                }
                for (i, item) in arr.iter().enumerate() {
                    check(items, item, &index_path(path, i), issues);
                }
            }
            None => issues.push(type_issue(path, "array", value)),
        },
        SchemaKind::Tuple(elements) => match value.as_array() {
            Some(arr) => {
                if arr.len() != elements.len() {
                    issues.push(Issue::new(
                        path,
                        IssueKind::Arity,
                        format!("expected {} elements, got {}", elements.len(), arr.len()),
                    ));
                }
                for (i, (element_schema, item)) in elements.iter().zip(arr.iter()).enumerate() {
                    check(element_schema, item, &index_path(path, i), issues);
                }
            }
            None => issues.push(type_issue(path, "array", value)),
        },
        SchemaKind::Object(props) => match value.as_object() {
            Some(obj) => check_closed_object(props, obj, path, issues),
            None => issues.push(type_issue(path, "object", value)),
        },
        SchemaKind::OpenObject(additional) => match value.as_object() {
            Some(obj) => {
                for (key, item) in obj {
                    check(additional, item, &member_path(path, key), issues);
                }
            }
            None => issues.push(type_issue(path, "object", value)),
        },
        SchemaKind::Union(branches) => {
            let matched = branches
                .iter()
                .any(|branch| check_value(branch, value).is_empty());
            if !matched {
                issues.push(Issue::new(
                    path,
                    IssueKind::Type,
                    format!("value matches none of the {} allowed variants", branches.len()),
                ));
            }
        }
        SchemaKind::Intersection(branches) => {
            for branch in branches {
                check(branch, value, path, issues);
            }
        }
        SchemaKind::Enum(allowed) => {
            let matched = value
                .as_str()
                .map(|s| allowed.iter().any(|a| a == s))
                .unwrap_or(false);
            if !matched {
                issues.push(Issue::new(
                    path,
                    IssueKind::Enum,
                    format!(
                        "value not in allowed set: {}",
                        allowed
                            .iter()
                            .map(|a| format!("\"{}\"", a))
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                ));
            }
        }
        SchemaKind::Const(expected) => {
            if value != expected {
                issues.push(Issue::new(
                    path,
                    IssueKind::Const,
                    format!("expected constant {}", expected),
                ));
            }
        }
    }
}

fn check_closed_object(
    props: &BTreeMap<String, Property>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    issues: &mut Vec<Issue>,
) {
    for (name, prop) in props {
        match obj.get(name) {
            Some(item) => check(&prop.schema, item, &member_path(path, name), issues),
            None if prop.required => issues.push(Issue::new(
                member_path(path, name),
                IssueKind::Required,
                "missing required property",
            )),
            None => {}
        }
    }
    for key in obj.keys() {
        if !props.contains_key(key) {
            issues.push(Issue::new(
                member_path(path, key),
                IssueKind::UnknownProperty,
                "property not allowed",
            ));
        }
    }
}

fn check_bounds(n: f64, bounds: &NumberConstraints, path: &str, issues: &mut Vec<Issue>) {
    if let Some(min) = bounds.minimum {
        if n < min {
            issues.push(Issue::new(
                path,
                IssueKind::Range,
                format!("value below minimum ({})", min),
            ));
        }
    }
    if let Some(max) = bounds.maximum {
        if n > max {
            issues.push(Issue::new(
                path,
                IssueKind::Range,
                format!("value above maximum ({})", max),
            ));
        }
    }
}

fn check_string(s: &str, constraints: &StringConstraints, path: &str, issues: &mut Vec<Issue>) {
    if let Some(min) = constraints.min_length {
        if (s.chars().count() as u64) < min {
            issues.push(Issue::new(
                path,
                IssueKind::Length,
                format!("string too short (minimum {} characters)", min),
            ));
        }
    }
    if let Some(max) = constraints.max_length {
        if (s.chars().count() as u64) > max {
            issues.push(Issue::new(
                path,
                IssueKind::Length,
                format!("string too long (maximum {} characters)", max),
            ));
        }
    }
    if let Some(ref pattern) = constraints.pattern {
        // An unparseable pattern is a schema-author mistake; skip rather
        // than blame the generated output.
        if let Ok(re) = regex::Regex::new(pattern) {
            if !re.is_match(s) {
                issues.push(Issue::new(
                    path,
                    IssueKind::Format,
                    "string does not match required pattern",
                ));
            }
        }
    }
    if let Some(format) = constraints.format {
        if !matches_format(s, format) {
            issues.push(Issue::new(
                path,
                IssueKind::Format,
                format!("string is not a valid {}", format.as_str()),
            ));
        }
    }
}

fn matches_format(s: &str, format: StringFormat) -> bool {
    match format {
        StringFormat::Email => regex_match(s, r"^[^\s@]+@[^\s@]+\.[^\s@]+$"),
        StringFormat::Ipv4 => s.parse::<std::net::Ipv4Addr>().is_ok(),
        StringFormat::Ipv6 => s.parse::<std::net::Ipv6Addr>().is_ok(),
        StringFormat::Uri => regex_match(s, r"^[a-zA-Z][a-zA-Z0-9+.-]*:\S+$"),
        StringFormat::DateTime => regex_match(
            s,
            r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$",
        ),
        StringFormat::Date => regex_match(s, r"^\d{4}-\d{2}-\d{2}$"),
        StringFormat::Time => regex_match(s, r"^\d{2}:\d{2}:\d{2}(\.\d+)?$"),
        StringFormat::Uuid => regex_match(
            s,
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        ),
    }
}

fn regex_match(s: &str, pattern: &str) -> bool {
    regex::Regex::new(pattern)
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

fn type_issue(path: &str, expected: &str, value: &Value) -> Issue {
    let actual = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Issue::new(
        path,
        IssueKind::Type,
        format!("expected {}, got {}", expected, actual),
    )
}

fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

fn member_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}
