//! Tests for page navigation decisions.
mod common;
use common::*;
use funnel_logic::evaluator::{resolve_next_page, resolve_previous_page};
use funnel_logic::prelude::*;

const PERMIT: UnknownOperatorPolicy = UnknownOperatorPolicy::Permit;

#[test]
fn test_linear_default_without_navigate_rules() {
    let pages = quiz_pages();
    let rules = vec![show_rule("r1", "f1", None)];
    let state = FormState::new();
    for current in 0..pages.len() {
        let expected = (current + 1).min(pages.len() - 1);
        assert_eq!(resolve_next_page(current, &pages, &rules, &state, PERMIT), expected);
    }
}

#[test]
fn test_navigate_rule_overrides_linear_order() {
    let pages = quiz_pages();
    let rules = vec![navigate_rule("r1", "pageB", cond("x", "equals", 1))];
    let state = state_of(&[("x", FieldValue::Number(1.0))]);
    assert_eq!(resolve_next_page(0, &pages, &rules, &state, PERMIT), 2);
    // Also redirects backwards in page order when asked to.
    assert_eq!(resolve_next_page(3, &pages, &rules, &state, PERMIT), 2);
}

#[test]
fn test_first_matching_rule_wins() {
    let pages = quiz_pages();
    let rules = vec![
        navigate_rule("r1", "pageA", cond("x", "equals", 2)),
        navigate_rule("r2", "result", cond("x", "equals", 1)),
        navigate_rule("r3", "pageB", cond("x", "equals", 1)),
    ];
    let state = state_of(&[("x", FieldValue::Number(1.0))]);
    assert_eq!(resolve_next_page(0, &pages, &rules, &state, PERMIT), 3);
}

#[test]
fn test_unknown_target_keeps_linear_order() {
    let pages = quiz_pages();
    let rules = vec![navigate_rule("r1", "nowhere", None)];
    let decision =
        funnel_logic::evaluator::decide_next_page(1, &pages, &rules, &FormState::new(), PERMIT);
    assert_eq!(decision.index, 2);
    assert_eq!(decision.rule_id.as_deref(), Some("r1"));
    assert!(decision.reason.contains("unknown page"));
}

#[test]
fn test_previous_is_linear_and_floored() {
    assert_eq!(resolve_previous_page(0), 0);
    assert_eq!(resolve_previous_page(3), 2);
}

#[test]
fn test_empty_funnel_stays_at_zero() {
    assert_eq!(resolve_next_page(0, &[], &[], &FormState::new(), PERMIT), 0);
}

#[test]
fn test_session_navigation_sequence() {
    let rules = vec![navigate_rule("r1", "result", cond("skip", "equals", true))];
    let (mut session, _store) = session_with(quiz_pages(), rules, fast_config());

    assert_eq!(session.navigate_to_next_page(), 1);
    assert_eq!(session.navigate_to_previous_page(), 0);
    assert_eq!(session.navigate_to_previous_page(), 0);

    session.update_form_value("skip", true);
    assert_eq!(session.navigate_to_next_page(), 3);
    assert!(session.is_last_page());
    assert_eq!(session.navigate_to_next_page(), 3);

    // Going back ignores navigate rules.
    assert_eq!(session.navigate_to_previous_page(), 2);
}

#[test]
fn test_set_value_rules_apply_before_navigation() {
    let rules = vec![
        Rule::new(
            "set",
            cond("seats", "greaterThan", 50),
            Action::SetValue {
                target: "tier".to_string(),
                value: FieldValue::text("enterprise"),
            },
        ),
        navigate_rule("nav", "result", cond("tier", "equals", "enterprise")),
    ];
    let (mut session, _store) = session_with(quiz_pages(), rules, fast_config());

    session.update_form_value("seats", 80);
    let preview = session.preview_next_page();
    assert_eq!(preview.index, 3);
    assert!(!session.state().contains("tier"));

    assert_eq!(session.navigate_to_next_page(), 3);
    assert_eq!(
        session.state().get("tier"),
        Some(&FieldValue::text("enterprise"))
    );
}
