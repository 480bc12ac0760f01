use super::condition::{evaluate_with, explain};
use crate::config::UnknownOperatorPolicy;
use crate::page::{Page, index_of};
use crate::rule::{Action, Rule};
use crate::state::FormState;
use crate::trace::TraceFormatter;

/// The page chosen by a forward navigation and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDecision {
    pub index: usize,
    /// The navigate rule that redirected, if any.
    pub rule_id: Option<String>,
    pub reason: String,
}

/// Index of the page after `current`, clamped to the last page.
pub fn linear_next(current: usize, page_count: usize) -> usize {
    if page_count == 0 {
        return 0;
    }
    (current + 1).min(page_count - 1)
}

/// Picks the next page index.
///
/// The first navigate rule, in list order, whose condition holds and whose
/// target names a known page wins. A target that names no page falls back
/// to the linear successor.
pub fn resolve_next_page(
    current: usize,
    pages: &[Page],
    rules: &[Rule],
    state: &FormState,
    policy: UnknownOperatorPolicy,
) -> usize {
    let linear = linear_next(current, pages.len());
    match first_matching_navigate(rules, state, policy) {
        Some((_, target)) => index_of(pages, target).unwrap_or(linear),
        None => linear,
    }
}

/// Same decision as [`resolve_next_page`], with an explanation.
pub fn decide_next_page(
    current: usize,
    pages: &[Page],
    rules: &[Rule],
    state: &FormState,
    policy: UnknownOperatorPolicy,
) -> NavigationDecision {
    let linear = linear_next(current, pages.len());
    let Some((rule, target)) = first_matching_navigate(rules, state, policy) else {
        return NavigationDecision {
            index: linear,
            rule_id: None,
            reason: "linear order".to_string(),
        };
    };

    let because = TraceFormatter::format_trace(&explain(rule.condition.as_ref(), state, policy));
    match index_of(pages, target) {
        Some(index) => NavigationDecision {
            index,
            rule_id: Some(rule.id.clone()),
            reason: format!("rule {} -> page '{}' because {}", rule.id, target, because),
        },
        None => NavigationDecision {
            index: linear,
            rule_id: Some(rule.id.clone()),
            reason: format!(
                "rule {} targets unknown page '{}', kept linear order",
                rule.id, target
            ),
        },
    }
}

/// Backward navigation is always linear and floored at the first page.
pub fn resolve_previous_page(current: usize) -> usize {
    current.saturating_sub(1)
}

fn first_matching_navigate<'r>(
    rules: &'r [Rule],
    state: &FormState,
    policy: UnknownOperatorPolicy,
) -> Option<(&'r Rule, &'r str)> {
    rules.iter().find_map(|rule| match &rule.action {
        Action::Navigate { target } if evaluate_with(rule.condition.as_ref(), state, policy) => {
            Some((rule, target.as_str()))
        }
        _ => None,
    })
}
