pub mod action;
pub mod condition;

pub use action::*;
pub use condition::*;

use serde::{Deserialize, Serialize};

/// A condition/action pair attached to a funnel.
///
/// `element_id` names the element whose visibility a show/hide rule controls,
/// or the triggering context of a navigate/setValue rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default, deserialize_with = "condition::deserialize_condition")]
    pub condition: Option<Condition>,
    pub action: Action,
    #[serde(default)]
    pub funnel_id: String,
}

impl Rule {
    pub fn new(id: impl Into<String>, condition: Option<Condition>, action: Action) -> Self {
        Self {
            id: id.into(),
            element_id: None,
            condition,
            action,
            funnel_id: String::new(),
        }
    }

    pub fn for_element(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    pub fn in_funnel(mut self, funnel_id: impl Into<String>) -> Self {
        self.funnel_id = funnel_id.into();
        self
    }

    pub fn applies_to(&self, element_id: &str) -> bool {
        self.element_id.as_deref() == Some(element_id)
    }
}
