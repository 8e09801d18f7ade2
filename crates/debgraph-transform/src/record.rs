//! Flat source records.
//!
//! Directory dumps store every attribute as a list (`{"uid": ["jdoe"]}`),
//! archive listings mostly as scalars (`{"package": "bash"}`). [`RawRecord`]
//! hides the difference behind "get-if-present" accessors so transformers
//! never test membership by hand.

use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `attribute`, replacing any previous value.
    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(attribute.into(), value.into());
    }

    /// Builder form of [`RawRecord::insert`].
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(attribute, value);
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.0.contains_key(attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All values of `attribute` in order. A scalar counts as a single value,
    /// an absent attribute (or `null`) as none.
    pub fn values(&self, attribute: &str) -> Vec<&Value> {
        match self.0.get(attribute) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
        }
    }

    pub fn first(&self, attribute: &str) -> Option<&Value> {
        self.values(attribute).into_iter().next()
    }

    /// First value rendered as text (numbers and booleans are stringified).
    pub fn first_str(&self, attribute: &str) -> Option<String> {
        self.first(attribute).and_then(scalar_text)
    }

    /// Every value rendered as text, skipping nested objects/arrays.
    pub fn strings(&self, attribute: &str) -> Vec<String> {
        self.values(attribute)
            .into_iter()
            .filter_map(scalar_text)
            .collect()
    }

    /// Mandatory variant of [`RawRecord::first`].
    pub fn require_first(
        &self,
        entity: &'static str,
        index: usize,
        attribute: &str,
    ) -> Result<&Value, TransformError> {
        self.first(attribute)
            .ok_or_else(|| TransformError::MissingField {
                entity,
                index,
                attribute: attribute.to_string(),
            })
    }

    /// Mandatory variant of [`RawRecord::first_str`].
    pub fn require_first_str(
        &self,
        entity: &'static str,
        index: usize,
        attribute: &str,
    ) -> Result<String, TransformError> {
        self.first_str(attribute)
            .ok_or_else(|| TransformError::MissingField {
                entity,
                index,
                attribute: attribute.to_string(),
            })
    }
}

impl From<BTreeMap<String, Value>> for RawRecord {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
