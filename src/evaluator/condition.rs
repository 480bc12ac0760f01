use crate::config::UnknownOperatorPolicy;
use crate::rule::{Condition, Operator};
use crate::state::FormState;
use crate::trace::ConditionTrace;
use crate::value::{FieldValue, coerce_number, coerce_string};

/// Evaluates a rule condition against the form state.
///
/// A missing condition is satisfied. Unknown operators are satisfied as well;
/// use [`evaluate_with`] to choose a different policy.
pub fn evaluate(condition: Option<&Condition>, state: &FormState) -> bool {
    evaluate_with(condition, state, UnknownOperatorPolicy::Permit)
}

pub fn evaluate_with(
    condition: Option<&Condition>,
    state: &FormState,
    policy: UnknownOperatorPolicy,
) -> bool {
    match condition {
        None => true,
        Some(condition) => compare(
            &condition.operator,
            state.get(&condition.field),
            &condition.value,
            policy,
        ),
    }
}

/// Like [`evaluate_with`], but records the observed value for diagnostics.
pub fn explain(
    condition: Option<&Condition>,
    state: &FormState,
    policy: UnknownOperatorPolicy,
) -> ConditionTrace {
    let Some(condition) = condition else {
        return ConditionTrace::Vacuous;
    };
    let actual = state.get(&condition.field);
    let outcome = compare(&condition.operator, actual, &condition.value, policy);

    match &condition.operator {
        Operator::Unrecognized(name) => ConditionTrace::Unrecognized {
            field: condition.field.clone(),
            operator: name.clone(),
            outcome,
        },
        operator => ConditionTrace::Comparison {
            field: condition.field.clone(),
            op_symbol: operator.symbol().to_string(),
            actual: actual.cloned(),
            expected: condition.value.clone(),
            outcome,
        },
    }
}

/// Applies `operator` to a possibly-missing field value and the rule's target.
///
/// `equals` is strict: no coercion, and a missing field equals nothing.
/// Ordering comparisons coerce both sides to numbers; `NaN` compares false.
pub fn compare(
    operator: &Operator,
    actual: Option<&FieldValue>,
    expected: &FieldValue,
    policy: UnknownOperatorPolicy,
) -> bool {
    match operator {
        Operator::Equals => strict_equals(actual, expected),
        Operator::NotEquals => !strict_equals(actual, expected),
        Operator::Contains => {
            coerce_string(actual).contains(expected.to_comparable_string().as_str())
        }
        Operator::GreaterThan => coerce_number(actual) > expected.to_number(),
        Operator::LessThan => coerce_number(actual) < expected.to_number(),
        Operator::Unrecognized(_) => policy == UnknownOperatorPolicy::Permit,
    }
}

fn strict_equals(actual: Option<&FieldValue>, expected: &FieldValue) -> bool {
    match (actual, expected) {
        (None, _) => false,
        // NaN is never equal to itself.
        (Some(FieldValue::Number(a)), FieldValue::Number(b)) => a == b,
        (Some(a), b) => a == b,
    }
}
