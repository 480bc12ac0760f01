mod formatter;

pub use formatter::TraceFormatter;

use crate::value::FieldValue;

/// A record of how a single rule condition was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTrace {
    /// The rule had no usable condition and was treated as satisfied.
    Vacuous,
    Comparison {
        field: String,
        op_symbol: String,
        actual: Option<FieldValue>,
        expected: FieldValue,
        outcome: bool,
    },
    /// The operator name was not recognized; `outcome` comes from the
    /// unknown-operator policy.
    Unrecognized {
        field: String,
        operator: String,
        outcome: bool,
    },
}

impl ConditionTrace {
    pub fn outcome(&self) -> bool {
        match self {
            ConditionTrace::Vacuous => true,
            ConditionTrace::Comparison { outcome, .. }
            | ConditionTrace::Unrecognized { outcome, .. } => *outcome,
        }
    }
}

/// A condition trace tagged with the rule it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTrace {
    pub rule_id: String,
    pub trace: ConditionTrace,
}
