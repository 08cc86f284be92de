//! Tool descriptors handed across the adapter boundary.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// A tool the backend may (or, when forced, must) invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Schema,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// One entry of the caller-supplied named tool map.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub description: String,
    pub parameters: Schema,
}

impl ToolSpec {
    pub fn new(description: impl Into<String>, parameters: Schema) -> Self {
        Self {
            description: description.into(),
            parameters,
        }
    }
}
