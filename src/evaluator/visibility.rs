use super::condition::{evaluate_with, explain};
use crate::config::EvaluationConfig;
use crate::config::VisibilityPolicy;
use crate::page::Page;
use crate::rule::{Action, Rule};
use crate::state::FormState;
use crate::trace::RuleTrace;

/// Whether an element is shown, and the rules that decided it.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityDecision {
    pub visible: bool,
    /// Traces of the rules whose conditions held. Empty when no rule matched.
    pub matched: Vec<RuleTrace>,
}

/// Decides whether the element `element_id` renders.
///
/// Only show and hide rules attached to the element take part. An element
/// without such rules is always visible.
pub fn is_visible(
    element_id: &str,
    rules: &[Rule],
    state: &FormState,
    config: &EvaluationConfig,
) -> bool {
    let mut gating = gating_rules(element_id, rules).peekable();
    if gating.peek().is_none() {
        return true;
    }
    let holds = |rule: &Rule| {
        evaluate_with(
            rule.condition.as_ref(),
            state,
            config.unknown_operator_policy,
        )
    };

    match config.visibility_policy {
        VisibilityPolicy::AnyMatch => gating.any(holds),
        VisibilityPolicy::ShowHide => {
            let mut has_show = false;
            let mut any_show_holds = false;
            for rule in gating {
                match rule.action {
                    Action::Hide if holds(rule) => return false,
                    Action::Show => {
                        has_show = true;
                        any_show_holds = any_show_holds || holds(rule);
                    }
                    _ => {}
                }
            }
            !has_show || any_show_holds
        }
    }
}

/// Same decision as [`is_visible`], with the traces of the matching rules.
pub fn explain_visibility(
    element_id: &str,
    rules: &[Rule],
    state: &FormState,
    config: &EvaluationConfig,
) -> VisibilityDecision {
    let visible = is_visible(element_id, rules, state, config);
    let matched = gating_rules(element_id, rules)
        .map(|rule| RuleTrace {
            rule_id: rule.id.clone(),
            trace: explain(rule.condition.as_ref(), state, config.unknown_operator_policy),
        })
        .filter(|t| t.trace.outcome())
        .collect();
    VisibilityDecision { visible, matched }
}

/// Ids of the elements on `page` that currently render, in page order.
pub fn visible_elements<'p>(
    page: &'p Page,
    rules: &[Rule],
    state: &FormState,
    config: &EvaluationConfig,
) -> Vec<&'p str> {
    page.content
        .elements
        .iter()
        .filter(|element| is_visible(&element.id, rules, state, config))
        .map(|element| element.id.as_str())
        .collect()
}

fn gating_rules<'r>(element_id: &'r str, rules: &'r [Rule]) -> impl Iterator<Item = &'r Rule> {
    rules
        .iter()
        .filter(move |rule| rule.action.is_visibility() && rule.applies_to(element_id))
}
