use crate::value::FieldValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The comparison applied between a form field and a rule's target value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    /// An operator name this engine does not know. Kept verbatim so the
    /// definition round-trips and the unknown-operator policy can decide.
    Unrecognized(String),
}

impl Operator {
    pub fn name(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Contains => "contains",
            Operator::GreaterThan => "greaterThan",
            Operator::LessThan => "lessThan",
            Operator::Unrecognized(name) => name,
        }
    }

    /// Symbol used when rendering evaluation traces.
    pub fn symbol(&self) -> &str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Contains => "contains",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Operator::Unrecognized(_))
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "greaterThan" => Operator::GreaterThan,
            "lessThan" => Operator::LessThan,
            _ => Operator::Unrecognized(value),
        }
    }
}

impl From<&str> for Operator {
    fn from(value: &str) -> Self {
        Operator::from(value.to_string())
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        match value {
            Operator::Unrecognized(name) => name,
            known => known.name().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// `{ field, operator, value }` tested against the current form state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: FieldValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Loose shape of a stored condition. Either key may be missing or blank.
#[derive(Deserialize)]
struct RawCondition {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// Decodes an optional condition. A condition without a usable `field` or
/// `operator` decodes to `None` and is treated as always satisfied.
pub(crate) fn deserialize_condition<'de, D>(deserializer: D) -> Result<Option<Condition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawCondition>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        let field = raw.field.filter(|f| !f.trim().is_empty())?;
        let operator = raw.operator.filter(|o| !o.trim().is_empty())?;
        Some(Condition {
            field,
            operator: Operator::from(operator),
            value: raw.value.as_ref().map(FieldValue::from).unwrap_or_default(),
        })
    }))
}
