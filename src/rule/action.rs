use crate::value::FieldValue;
use serde::{Deserialize, Serialize};

/// What a rule does once its condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Show,
    Hide,
    /// Jump to the page with id `target` on the next forward navigation.
    Navigate { target: String },
    /// Write `value` into the form field `target`.
    SetValue {
        target: String,
        #[serde(default)]
        value: FieldValue,
    },
}

impl Action {
    /// Show and hide rules gate element visibility.
    pub fn is_visibility(&self) -> bool {
        matches!(self, Action::Show | Action::Hide)
    }
}

