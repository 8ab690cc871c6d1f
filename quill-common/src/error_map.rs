//! Field-name-keyed error accumulation
//!
//! Both the structural validator (content-type definitions) and the entry
//! validator report every problem at once rather than stopping at the first.
//! `ErrorMap` is the shared accumulator: field name → messages, ordered by
//! field name so output is stable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered map of field name to validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap {
    errors: BTreeMap<String, Vec<String>>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Fold another map into this one, appending messages per field.
    pub fn merge(&mut self, other: ErrorMap) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    /// True when no field has any message.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Messages recorded for a field, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Consume the map, yielding the underlying field → messages pairs.
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }
}

impl fmt::Display for ErrorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for ErrorMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, message) in iter {
            map.push(field, message);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_accumulates_per_field() {
        let mut map = ErrorMap::new();
        map.push("title", "too short");
        map.push("title", "bad format");
        map.push("color", "not a hex color");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("title").unwrap().len(), 2);
        assert_eq!(map.get("color").unwrap(), ["not a hex color"]);
    }

    #[test]
    fn merge_appends_messages() {
        let mut a = ErrorMap::new();
        a.push("title", "too short");
        let mut b = ErrorMap::new();
        b.push("title", "bad format");
        b.push("body", "required");

        a.merge(b);
        assert_eq!(a.get("title").unwrap().len(), 2);
        assert!(a.get("body").is_some());
    }

    #[test]
    fn display_is_stable_and_readable() {
        let mut map = ErrorMap::new();
        map.push("b", "second");
        map.push("a", "first");
        assert_eq!(map.to_string(), "a: first; b: second");
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut map = ErrorMap::new();
        map.push("title", "required");
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"title": ["required"]}));
    }
}
