use crate::value::FieldValue;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Current answers of one funnel session, keyed by field name.
///
/// Keys appear as fields render; nothing is declared up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: AHashMap<String, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `field`. Returns `true` when the stored value changed.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> bool {
        let value = value.into();
        let field = field.into();
        if self.values.get(&field) == Some(&value) {
            return false;
        }
        self.values.insert(field, value);
        true
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.values.remove(field)
    }

    /// Overlays `other` on top of this state; `other` wins on conflicts.
    pub fn merge(&mut self, other: &FormState) {
        for (field, value) in &other.values {
            self.values.insert(field.clone(), value.clone());
        }
    }

    /// Returns a copy of this state with `other` overlaid.
    pub fn merged(&self, other: &FormState) -> FormState {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Text value of a field, trimmed, or `None` when absent, null or blank.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field)? {
            FieldValue::Null => None,
            value => {
                let text = value.to_string();
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    /// The answer map persisted with a lead.
    pub fn to_answers(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(field, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (field.clone(), json)
            })
            .collect()
    }

    /// Builds a state from a JSON object. Non-object input yields an empty state.
    pub fn from_json_value(value: &serde_json::Value) -> Self {
        let values = value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(field, value)| (field.clone(), FieldValue::from(value)))
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }
}

impl<K, V> FromIterator<(K, V)> for FormState
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = FormState::new();
        for (field, value) in iter {
            state.set(field, value);
        }
        state
    }
}
