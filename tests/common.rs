//! Common test utilities for building funnels, rules and sessions.
use async_trait::async_trait;
use funnel_logic::prelude::*;
use funnel_logic::store::ContactValidation;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;

/// Pages `p1 -> p2 -> thank_you`, the last one a thank-you page.
#[allow(dead_code)]
pub fn three_pages() -> Vec<Page> {
    vec![
        Page::new("p1", PageType::Landing, 0),
        Page::new("p2", PageType::Form, 1),
        Page::new("thank_you", PageType::ThankYou, 2),
    ]
}

/// Four linear pages without a thank-you page.
#[allow(dead_code)]
pub fn quiz_pages() -> Vec<Page> {
    vec![
        Page::new("intro", PageType::Landing, 0),
        Page::new("pageA", PageType::Quiz, 10),
        Page::new("pageB", PageType::Quiz, 20),
        Page::new("result", PageType::Result, 30),
    ]
}

#[allow(dead_code)]
pub fn cond(field: &str, operator: &str, value: impl Into<FieldValue>) -> Option<Condition> {
    Some(Condition::new(field, Operator::from(operator), value))
}

#[allow(dead_code)]
pub fn show_rule(id: &str, element: &str, condition: Option<Condition>) -> Rule {
    Rule::new(id, condition, Action::Show).for_element(element)
}

#[allow(dead_code)]
pub fn hide_rule(id: &str, element: &str, condition: Option<Condition>) -> Rule {
    Rule::new(id, condition, Action::Hide).for_element(element)
}

#[allow(dead_code)]
pub fn navigate_rule(id: &str, target: &str, condition: Option<Condition>) -> Rule {
    Rule::new(
        id,
        condition,
        Action::Navigate {
            target: target.to_string(),
        },
    )
}

#[allow(dead_code)]
pub fn state_of(pairs: &[(&str, FieldValue)]) -> FormState {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

/// Submit services backed by one in-memory store, with fast retries.
#[allow(dead_code)]
pub fn services_for(store: &Arc<InMemoryStore>) -> SubmitServices {
    SubmitServices::new(
        Arc::new(BasicContactValidator),
        store.clone(),
        store.clone(),
    )
}

/// Validates like [`BasicContactValidator`], but only after the given delay.
#[allow(dead_code)]
pub struct SlowValidator(pub Duration);

#[async_trait]
impl ContactValidator for SlowValidator {
    async fn validate_contact(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<ContactValidation, StoreError> {
        tokio::time::sleep(self.0).await;
        BasicContactValidator.validate_contact(email, phone).await
    }
}

#[allow(dead_code)]
pub fn fast_config() -> SessionConfig {
    SessionConfig::default().with_retry(RetryConfig {
        max_times: 2,
        min_delay_ms: 1,
        max_delay_ms: 5,
    })
}

#[allow(dead_code)]
pub fn session_with(
    pages: Vec<Page>,
    rules: Vec<Rule>,
    config: SessionConfig,
) -> (FunnelSession, Arc<InMemoryStore>) {
    let definition = FunnelDefinition::new("funnel-1", pages, rules);
    let store = Arc::new(InMemoryStore::with_definition(definition.clone()));
    let session = FunnelSession::new(definition, services_for(&store), config);
    (session, store)
}

/// A funnel definition in the JSON shape the builder stores.
#[allow(dead_code)]
pub const ONBOARDING_JSON: &str = r#"{
    "funnel_id": "onboarding",
    "pages": [
        { "id": "welcome", "name": "Welcome", "type": "landing", "order_index": 0,
          "content": "[{\"id\":\"title\",\"type\":\"heading\",\"text\":\"Hi\"},{\"id\":\"plan\",\"type\":\"choice\",\"field\":\"plan\",\"options\":[{\"label\":\"Pro\",\"value\":\"pro\"},{\"label\":\"Starter\",\"value\":\"starter\"}]},{\"id\":\"team_size\",\"type\":\"input\",\"field\":\"team_size\",\"input_type\":\"number\"}]" },
        { "id": "pro_details", "name": "Pro", "type": "quiz", "order_index": 5,
          "content": { "elements": [ { "id": "seats", "type": "input", "field": "seats" }, { "id": "oops", "type": "image" } ] } },
        { "id": "contact", "name": "Contact", "type": "form", "order_index": 10,
          "content": [ { "id": "email", "type": "input", "field": "email", "required": true },
                       { "id": "phone", "type": "input", "field": "phone" },
                       { "id": "submit", "type": "button", "label": "Send", "action": "submit" } ] },
        { "id": "thanks", "name": "Thanks", "type": "thank_you", "order_index": 99 }
    ],
    "rules": [
        { "id": "r-team", "element_id": "team_size",
          "condition": { "field": "plan", "operator": "equals", "value": "pro" },
          "action": { "type": "show" }, "funnel_id": "onboarding" },
        { "id": "r-skip", "element_id": "welcome",
          "condition": { "field": "plan", "operator": "equals", "value": "starter" },
          "action": { "type": "navigate", "target": "contact" }, "funnel_id": "onboarding" },
        { "id": "r-tier", "element_id": "welcome",
          "condition": { "field": "team_size", "operator": "greaterThan", "value": 50 },
          "action": { "type": "setValue", "target": "tier", "value": "enterprise" }, "funnel_id": "onboarding" },
        { "id": "r-phone", "element_id": "phone",
          "condition": { "field": "tier", "operator": "equals", "value": "enterprise" },
          "action": { "type": "hide" }, "funnel_id": "onboarding" }
    ]
}"#;
