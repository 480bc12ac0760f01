use crate::config::EvaluationConfig;
use crate::page::Page;
use crate::rule::{Condition, Rule};
use crate::state::FormState;
use crate::trace::ConditionTrace;

pub mod condition;
pub mod effects;
pub mod navigation;
pub mod visibility;

pub use condition::{compare, evaluate, evaluate_with, explain};
pub use effects::apply_set_value_rules;
pub use navigation::{
    NavigationDecision, decide_next_page, linear_next, resolve_next_page, resolve_previous_page,
};
pub use visibility::{VisibilityDecision, explain_visibility, is_visible, visible_elements};

/// Evaluates one funnel's rules against changing form state.
///
/// An `Evaluator` holds no form state of its own; every call takes the
/// current state snapshot, so results are recomputed from scratch each time.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    rules: Vec<Rule>,
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(rules: Vec<Rule>, config: EvaluationConfig) -> Self {
        Self { rules, config }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn condition(&self, condition: Option<&Condition>, state: &FormState) -> bool {
        evaluate_with(condition, state, self.config.unknown_operator_policy)
    }

    pub fn explain_condition(
        &self,
        condition: Option<&Condition>,
        state: &FormState,
    ) -> ConditionTrace {
        explain(condition, state, self.config.unknown_operator_policy)
    }

    pub fn is_visible(&self, element_id: &str, state: &FormState) -> bool {
        is_visible(element_id, &self.rules, state, &self.config)
    }

    pub fn explain_visibility(&self, element_id: &str, state: &FormState) -> VisibilityDecision {
        explain_visibility(element_id, &self.rules, state, &self.config)
    }

    pub fn visible_elements<'p>(&self, page: &'p Page, state: &FormState) -> Vec<&'p str> {
        visible_elements(page, &self.rules, state, &self.config)
    }

    pub fn next_page(&self, current: usize, pages: &[Page], state: &FormState) -> usize {
        resolve_next_page(
            current,
            pages,
            &self.rules,
            state,
            self.config.unknown_operator_policy,
        )
    }

    pub fn decide_next_page(
        &self,
        current: usize,
        pages: &[Page],
        state: &FormState,
    ) -> NavigationDecision {
        decide_next_page(
            current,
            pages,
            &self.rules,
            state,
            self.config.unknown_operator_policy,
        )
    }

    pub fn apply_set_values(&self, state: &mut FormState) -> Vec<String> {
        apply_set_value_rules(&self.rules, state, self.config.unknown_operator_policy)
    }
}
