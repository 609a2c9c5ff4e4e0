use serde::{Deserialize, Serialize};

/// Value of a form field, as far as the emptiness check is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Optional(Option<String>),
    List(Vec<String>),
}

impl FieldValue {
    /// Blank text, `None` and empty lists count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Optional(None) => true,
            FieldValue::Optional(Some(text)) => text.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        FieldValue::Optional(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// A named form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Names of the fields currently failing validation.
///
/// Keeps first-failure order so the form can scroll to the first offender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldCheckSet {
    names: Vec<String>,
}

impl FieldCheckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Add a failing field. Returns false if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Clear a field's check, typically when the operator edits it.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Fragment link to the first failing field, e.g. `#title`.
    pub fn anchor(&self) -> Option<String> {
        self.names.first().map(|name| format!("#{}", name))
    }
}

/// Collect the names of every missing field, in input order.
pub fn check_fields(fields: &[Field]) -> FieldCheckSet {
    let mut failing = FieldCheckSet::new();
    for field in fields {
        if field.value.is_missing() {
            failing.insert(field.name.as_str());
        }
    }
    failing
}
