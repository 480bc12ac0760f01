use super::condition::evaluate_with;
use crate::config::UnknownOperatorPolicy;
use crate::rule::{Action, Rule};
use crate::state::FormState;

/// Applies every `setValue` rule whose condition holds, in list order.
///
/// Conditions are checked against the state as it was before this pass, so
/// one rule's write never triggers another rule in the same pass. Returns the
/// fields whose stored value changed.
pub fn apply_set_value_rules(
    rules: &[Rule],
    state: &mut FormState,
    policy: UnknownOperatorPolicy,
) -> Vec<String> {
    let snapshot = state.clone();
    let mut changed = Vec::new();
    for rule in rules {
        if let Action::SetValue { target, value } = &rule.action {
            if evaluate_with(rule.condition.as_ref(), &snapshot, policy)
                && state.set(target.clone(), value.clone())
                && !changed.contains(target)
            {
                changed.push(target.clone());
            }
        }
    }
    changed
}
