//! Generic property values for kind-specific entity fields

use serde::{Deserialize, Serialize};

/// A single typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Str(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Int(_) => None,
            Value::Str(s) => Some(s),
        }
    }
}

/// An ordered bag of named property values.
///
/// Order matters: the map file format writes kind-specific fields in their
/// declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Set a value, replacing any previous value while keeping its position
    pub fn set(&mut self, name: &str, value: Value) {
        match self.0.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.0.push((name.to_string(), value)),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, Value::Int(value));
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, Value::Str(value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_order() {
        let mut fields = Fields::new();
        fields.set_int("transition", 1);
        fields.set_text("destination_map", "");
        fields.set_int("transition", 2);

        let names: Vec<&str> = fields.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["transition", "destination_map"]);
        assert_eq!(fields.int("transition"), Some(2));
    }

    #[test]
    fn test_typed_access() {
        let mut fields = Fields::new();
        fields.set_text("message", "_none");
        assert_eq!(fields.text("message"), Some("_none"));
        assert_eq!(fields.int("message"), None);
        assert_eq!(fields.get("missing"), None);
    }
}
