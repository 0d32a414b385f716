//! Equality filters over top-level string fields.

use crate::storage::Document;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field is present and equal to the value.
    Eq { field: String, value: String },
    /// Field is absent or differs from the value.
    Ne { field: String, value: String },
}

/// A conjunction of conditions. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Ne {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| match c {
            Condition::Eq { field, value } => field_str(doc, field) == Some(value.as_str()),
            Condition::Ne { field, value } => field_str(doc, field) != Some(value.as_str()),
        })
    }
}

fn field_str<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(JsonValue::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: JsonValue) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&Document::new()));
    }

    #[test]
    fn eq_and_ne_combine() {
        let d = doc(json!({ "username": "alice", "auth0Id": "u1" }));
        assert!(Filter::new().eq("username", "alice").matches(&d));
        assert!(!Filter::new().eq("username", "bob").matches(&d));
        assert!(!Filter::new()
            .eq("username", "alice")
            .ne("auth0Id", "u1")
            .matches(&d));
        assert!(Filter::new()
            .eq("username", "alice")
            .ne("auth0Id", "u2")
            .matches(&d));
    }

    #[test]
    fn ne_matches_absent_field() {
        let d = doc(json!({ "username": "alice" }));
        assert!(Filter::new().ne("auth0Id", "u1").matches(&d));
        assert!(!Filter::new().eq("auth0Id", "u1").matches(&d));
    }
}
