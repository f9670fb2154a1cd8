use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Declared field types for check mode, keyed by reference path.
pub type TypeMap = HashMap<String, ValueType>;

/// Abstract type tag propagated by check mode.
///
/// The set is open: besides the well-known tags any other name (`phone`,
/// `idarray`, ...) can be declared for a field and only matches itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    Number,
    String,
    Boolean,
    Date,
    Array,
    Object,
    Null,
    Undefined,
    /// Satisfies every parameter constraint
    Any,
    Named(String),
}

impl ValueType {
    pub fn name(&self) -> &str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Null => "null",
            ValueType::Undefined => "undefined",
            ValueType::Any => "any",
            ValueType::Named(name) => name,
        }
    }

    /// Tag of a runtime value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined => ValueType::Undefined,
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Date(_) => ValueType::Date,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ValueType::Any)
    }

    /// Whether an argument of this type satisfies a parameter accepting
    /// `accepted`.
    pub fn satisfies(&self, accepted: &[ValueType]) -> bool {
        self.is_any() || accepted.contains(self)
    }
}

impl From<&str> for ValueType {
    fn from(name: &str) -> Self {
        match name {
            "number" => ValueType::Number,
            "string" => ValueType::String,
            "boolean" => ValueType::Boolean,
            "date" => ValueType::Date,
            "array" => ValueType::Array,
            "object" => ValueType::Object,
            "null" => ValueType::Null,
            "undefined" => ValueType::Undefined,
            "any" => ValueType::Any,
            other => ValueType::Named(other.to_string()),
        }
    }
}

impl From<String> for ValueType {
    fn from(name: String) -> Self {
        ValueType::from(name.as_str())
    }
}

impl From<ValueType> for String {
    fn from(ty: ValueType) -> Self {
        ty.name().to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        for name in ["number", "date", "any", "idarray"] {
            assert_eq!(ValueType::from(name).name(), name);
        }
        assert_eq!(ValueType::from("phone"), ValueType::Named("phone".into()));
    }

    #[test]
    fn any_satisfies_everything() {
        assert!(ValueType::Any.satisfies(&[ValueType::Number]));
        assert!(ValueType::Any.satisfies(&[]));
        assert!(!ValueType::Date.satisfies(&[ValueType::Number, ValueType::String]));
    }
}
