use super::{ConditionTrace, RuleTrace};
use crate::value::FieldValue;
use itertools::Itertools;

/// Formats condition traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format a condition trace into a one-line explanation,
    /// e.g. `$plan (was pro) == pro`.
    pub fn format_trace(trace: &ConditionTrace) -> String {
        match trace {
            ConditionTrace::Vacuous => "no condition".to_string(),
            ConditionTrace::Comparison {
                field,
                op_symbol,
                actual,
                expected,
                ..
            } => format!(
                "${} (was {}) {} {}",
                field,
                Self::format_actual(actual.as_ref()),
                op_symbol,
                Self::format_value(expected)
            ),
            ConditionTrace::Unrecognized {
                field,
                operator,
                outcome,
            } => format!(
                "${} {} (unrecognized operator, {})",
                field,
                operator,
                if *outcome { "permitted" } else { "denied" }
            ),
        }
    }

    /// Joins the traces of the rules that decided an outcome.
    pub fn format_rules(traces: &[RuleTrace]) -> String {
        if traces.is_empty() {
            return "no rules".to_string();
        }
        traces
            .iter()
            .map(|t| format!("[{}] {}", t.rule_id, Self::format_trace(&t.trace)))
            .join(" OR ")
    }

    fn format_actual(value: Option<&FieldValue>) -> String {
        value.map_or_else(|| "missing".to_string(), Self::format_value)
    }

    /// Format a value for display. Text is quoted only when it is empty.
    fn format_value(value: &FieldValue) -> String {
        match value {
            FieldValue::Text(s) if s.is_empty() => "\"\"".to_string(),
            other => other.to_string(),
        }
    }
}
