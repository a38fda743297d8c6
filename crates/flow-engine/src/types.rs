//! Core types for flow graphs
//!
//! Identifiers, port data types and the value store shared by every node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node within a graph
pub type NodeId = String;

/// Name of a port, unique within one side (inputs or outputs) of a node
pub type PortId = String;

/// Current values held on one side of a node, keyed by port name
pub type PortValues = HashMap<PortId, serde_json::Value>;

/// Primitive type tag of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDataType {
    /// Accepts any type
    Any,
    /// Whole number
    Integer,
    /// Any numeric value
    Number,
    /// Text string
    String,
    /// Boolean value
    Boolean,
    /// Arbitrary JSON value
    Json,
}

impl PortDataType {
    /// Check if an output of this type can feed an input of `other`
    pub fn is_compatible_with(&self, other: &PortDataType) -> bool {
        if matches!(self, PortDataType::Any) || matches!(other, PortDataType::Any) {
            return true;
        }

        // Integers widen to numbers, never the other way round
        if matches!(self, PortDataType::Integer) && matches!(other, PortDataType::Number) {
            return true;
        }

        if matches!(other, PortDataType::Json) {
            return true;
        }

        self == other
    }

    /// Check whether a concrete value fits this type
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            PortDataType::Any | PortDataType::Json => true,
            PortDataType::Integer => value.is_i64() || value.is_u64(),
            PortDataType::Number => value.is_number(),
            PortDataType::String => value.is_string(),
            PortDataType::Boolean => value.is_boolean(),
        }
    }

    /// The tag as written in definitions and listings
    pub fn as_str(&self) -> &'static str {
        match self {
            PortDataType::Any => "any",
            PortDataType::Integer => "integer",
            PortDataType::Number => "number",
            PortDataType::String => "string",
            PortDataType::Boolean => "boolean",
            PortDataType::Json => "json",
        }
    }
}

impl std::fmt::Display for PortDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_port_data_type_compatibility() {
        assert!(PortDataType::Any.is_compatible_with(&PortDataType::String));
        assert!(PortDataType::String.is_compatible_with(&PortDataType::Any));
        assert!(PortDataType::Integer.is_compatible_with(&PortDataType::Number));
        assert!(!PortDataType::Number.is_compatible_with(&PortDataType::Integer));
        assert!(PortDataType::Boolean.is_compatible_with(&PortDataType::Json));
        assert!(!PortDataType::Integer.is_compatible_with(&PortDataType::String));
    }

    #[test]
    fn test_accepts_values() {
        assert!(PortDataType::Integer.accepts(&json!(42)));
        assert!(!PortDataType::Integer.accepts(&json!(4.2)));
        assert!(PortDataType::Number.accepts(&json!(4.2)));
        assert!(PortDataType::String.accepts(&json!("x")));
        assert!(!PortDataType::Boolean.accepts(&json!(1)));
        assert!(PortDataType::Any.accepts(&serde_json::Value::Null));
    }

    #[test]
    fn test_serialized_tag() {
        assert_eq!(serde_json::to_string(&PortDataType::Integer).unwrap(), "\"integer\"");
        assert_eq!(PortDataType::Integer.to_string(), "integer");
    }
}
