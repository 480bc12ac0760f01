//! Tests for the submit pipeline of a funnel session.
mod common;
use common::*;
use funnel_logic::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_submit_moves_to_thank_you_page() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    session.update_form_value("email", "a@b.com");

    let lead = session.submit_form(None).await.expect("lead should be created");

    assert_eq!(session.current_page_index(), 2);
    assert_eq!(lead.email, "a@b.com");
    assert_eq!(lead.funnel_id, "funnel-1");
    assert_eq!(lead.scoring, ScoringStatus::Scored);
    assert!(session.is_submitted());
    assert_eq!(store.leads().await.len(), 1);
    assert!(store.is_scored(lead.id).await);
}

#[tokio::test]
async fn test_submit_without_thank_you_keeps_index() {
    let (mut session, _store) = session_with(quiz_pages(), vec![], fast_config());
    session.navigate_to_next_page();

    let lead = session
        .submit_form(Some(state_of(&[("email", FieldValue::text("ada@example.com"))])))
        .await;

    assert!(lead.is_some());
    assert_eq!(session.current_page_index(), 1);
}

#[tokio::test]
async fn test_submit_without_email_persists_nothing() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    session.update_form_value("name", "Ada");

    assert!(session.submit_form(None).await.is_none());
    assert_eq!(store.create_calls(), 0);
    assert_eq!(session.current_page_index(), 0);

    let notifications = session.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert!(notifications[0].message.contains("email"));
}

#[tokio::test]
async fn test_invalid_contact_is_rejected_before_persisting() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    session.update_form_value("email", "not-an-email");

    let result = session.try_submit_form(None).await;
    assert!(matches!(result, Err(SubmitError::InvalidContact(_))));
    assert_eq!(store.create_calls(), 0);
    assert!(!session.is_submitted());
}

#[tokio::test]
async fn test_final_data_overrides_state_and_is_sanitized() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    session.update_form_value("email", "old@example.com");
    session.update_form_value("plan", "pro");

    let final_data = state_of(&[
        ("email", FieldValue::text("  New@Example.com ")),
        ("phone", FieldValue::text("+1 (555) 010-9999")),
    ]);
    let lead = session.try_submit_form(Some(final_data)).await.unwrap();

    assert_eq!(lead.email, "new@example.com");
    assert_eq!(lead.phone.as_deref(), Some("+15550109999"));
    assert_eq!(lead.answers.get("plan"), Some(&serde_json::json!("pro")));
    assert_eq!(store.leads().await[0].id, lead.id);
}

#[tokio::test]
async fn test_persistence_failure_leaves_session_unchanged() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    store
        .fail_next_creates([StoreError::Rejected("quota exceeded".to_string())])
        .await;
    session.update_form_value("email", "a@b.com");

    let before = session.state().clone();
    let extra = state_of(&[("extra", FieldValue::Number(1.0))]);
    let result = session.try_submit_form(Some(extra)).await;

    assert!(matches!(result, Err(SubmitError::Persistence(_))));
    assert_eq!(store.create_calls(), 1, "rejections are not retried");
    assert_eq!(session.current_page_index(), 0);
    assert_eq!(session.state(), &before);
    assert!(!session.is_submitted());
}

#[tokio::test]
async fn test_transient_failures_are_retried_with_same_key() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    store
        .fail_next_creates([StoreError::Transport("connection reset".to_string())])
        .await;
    session.update_form_value("email", "a@b.com");

    let lead = session.submit_form(None).await;

    assert!(lead.is_some());
    assert_eq!(store.create_calls(), 2);
    assert_eq!(store.leads().await.len(), 1);
}

#[tokio::test]
async fn test_retries_give_up_after_configured_attempts() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    store
        .fail_next_creates((0..5).map(|_| StoreError::Transport("down".to_string())))
        .await;
    session.update_form_value("email", "a@b.com");

    assert!(session.submit_form(None).await.is_none());
    // One attempt plus two retries.
    assert_eq!(store.create_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_hung_persistence_times_out() {
    let definition = FunnelDefinition::new("funnel-1", three_pages(), vec![]);
    let store = Arc::new(
        InMemoryStore::with_definition(definition.clone())
            .with_create_delay(Duration::from_secs(60)),
    );
    let config = fast_config()
        .with_retry(RetryConfig::disabled())
        .with_timeouts(TimeoutConfig {
            persist_ms: 100,
            ..TimeoutConfig::default()
        });
    let mut session = FunnelSession::new(definition, services_for(&store), config);
    session.update_form_value("email", "a@b.com");

    let result = session.try_submit_form(None).await;

    assert_eq!(
        result,
        Err(SubmitError::Persistence(StoreError::Timeout(Duration::from_millis(100))))
    );
    assert_eq!(session.current_page_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hung_validation_times_out_before_persisting() {
    let definition = FunnelDefinition::new("funnel-1", three_pages(), vec![]);
    let store = Arc::new(InMemoryStore::with_definition(definition.clone()));
    let services = SubmitServices::new(
        Arc::new(SlowValidator(Duration::from_secs(60))),
        store.clone(),
        store.clone(),
    );
    let config = fast_config().with_timeouts(TimeoutConfig {
        validate_ms: 100,
        ..TimeoutConfig::default()
    });
    let mut session = FunnelSession::new(definition, services, config);
    session.update_form_value("email", "a@b.com");

    let result = session.try_submit_form(None).await;

    assert_eq!(
        result,
        Err(SubmitError::Validation(StoreError::Timeout(Duration::from_millis(100))))
    );
    assert_eq!(store.create_calls(), 0);
    assert_eq!(session.current_page_index(), 0);
    assert!(!session.is_submitted());
}

#[tokio::test(start_paused = true)]
async fn test_hung_scoring_times_out_but_keeps_lead() {
    let definition = FunnelDefinition::new("funnel-1", three_pages(), vec![]);
    let store = Arc::new(
        InMemoryStore::with_definition(definition.clone())
            .with_score_delay(Duration::from_secs(60)),
    );
    let config = fast_config().with_timeouts(TimeoutConfig {
        score_ms: 100,
        ..TimeoutConfig::default()
    });
    let mut session = FunnelSession::new(definition, services_for(&store), config);
    session.update_form_value("email", "a@b.com");

    let lead = session.submit_form(None).await.expect("lead survives a scoring timeout");

    assert!(matches!(lead.scoring, ScoringStatus::Failed { .. }));
    assert_eq!(store.leads().await.len(), 1);
    assert!(!store.is_scored(lead.id).await);
    assert_eq!(session.current_page_index(), 2);
    assert!(session.is_submitted());

    let levels: Vec<_> = session.notifications().iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NotificationLevel::Info, NotificationLevel::Warning]);
}

#[tokio::test]
async fn test_scoring_failure_keeps_lead() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    store
        .fail_next_scores([StoreError::Backend("scoring model offline".to_string())])
        .await;
    session.update_form_value("email", "a@b.com");

    let mut lead = session.submit_form(None).await.expect("lead survives scoring failure");
    assert!(matches!(lead.scoring, ScoringStatus::Failed { .. }));
    assert_eq!(session.current_page_index(), 2);
    assert_eq!(store.leads().await.len(), 1);

    assert!(session.retry_scoring(&mut lead).await);
    assert_eq!(lead.scoring, ScoringStatus::Scored);
    assert_eq!(
        session.submitted_lead().map(|l| l.scoring.clone()),
        Some(ScoringStatus::Scored)
    );
    assert_eq!(store.score_calls(), 2);
}

#[tokio::test]
async fn test_second_submit_is_refused() {
    let (mut session, store) = session_with(three_pages(), vec![], fast_config());
    session.update_form_value("email", "a@b.com");
    assert!(session.submit_form(None).await.is_some());

    let again = session.try_submit_form(None).await;
    assert_eq!(again, Err(SubmitError::AlreadySubmitted));
    assert_eq!(store.create_calls(), 1);
}

#[tokio::test]
async fn test_load_from_repository() {
    let definition = FunnelDefinition::new(
        "funnel-1",
        vec![
            Page::new("b", PageType::Form, 9),
            Page::new("a", PageType::Landing, 3),
        ],
        vec![navigate_rule("r1", "b", None)],
    );
    let store = Arc::new(InMemoryStore::with_definition(definition));

    let session = FunnelSession::load(
        store.as_ref(),
        "funnel-1",
        services_for(&store),
        SessionConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(session.pages()[0].id, "a");
    assert_eq!(session.evaluator().rules().len(), 1);

    let missing =
        FunnelSession::load(store.as_ref(), "nope", services_for(&store), SessionConfig::default())
            .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[test]
fn test_submit_can_be_driven_from_sync_code() {
    let (mut session, _store) = session_with(three_pages(), vec![], fast_config());
    session.update_form_value("email", "sync@example.com");
    let lead = tokio_test::block_on(session.submit_form(None));
    assert!(lead.is_some());
}
