use crate::config::{RetryConfig, TimeoutConfig};
use crate::error::{StoreError, SubmitError};
use crate::state::FormState;
use crate::store::{
    ContactValidator, Lead, LeadScorer, LeadStore, NewLead, SanitizedContact, ScoringStatus,
};
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// The collaborators a session calls when the respondent submits.
#[derive(Clone)]
pub struct SubmitServices {
    pub validator: Arc<dyn ContactValidator>,
    pub leads: Arc<dyn LeadStore>,
    pub scorer: Arc<dyn LeadScorer>,
}

impl SubmitServices {
    pub fn new(
        validator: Arc<dyn ContactValidator>,
        leads: Arc<dyn LeadStore>,
        scorer: Arc<dyn LeadScorer>,
    ) -> Self {
        Self {
            validator,
            leads,
            scorer,
        }
    }
}

/// Runs `fut` with a deadline, mapping expiry to [`StoreError::Timeout`].
pub(crate) async fn with_timeout<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| StoreError::Timeout(deadline))?
}

/// The validate -> persist -> score pipeline behind a session submit.
pub(crate) struct SubmitPipeline<'a> {
    pub services: &'a SubmitServices,
    pub timeouts: TimeoutConfig,
    pub retry: RetryConfig,
}

impl SubmitPipeline<'_> {
    /// Checks the email is present and the contact details are well formed.
    pub async fn validate(&self, data: &FormState) -> Result<SanitizedContact, SubmitError> {
        let email = data.text("email").ok_or(SubmitError::MissingEmail)?;
        let phone = data.text("phone");

        let validation = with_timeout(
            self.timeouts.validate(),
            self.services
                .validator
                .validate_contact(&email, phone.as_deref()),
        )
        .await
        .map_err(SubmitError::Validation)?;

        if !validation.is_valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "invalid email or phone".to_string());
            return Err(SubmitError::InvalidContact(reason));
        }
        Ok(validation.sanitized)
    }

    /// Creates the lead, retrying transient failures with the same idempotency key.
    pub async fn persist(
        &self,
        funnel_id: &str,
        contact: SanitizedContact,
        data: &FormState,
        idempotency_key: Uuid,
    ) -> Result<Lead, SubmitError> {
        let new_lead = NewLead {
            email: contact.email,
            phone: contact.phone,
            funnel_id: funnel_id.to_string(),
            answers: data.to_answers(),
            idempotency_key,
        };
        let deadline = self.timeouts.persist();
        let leads = &self.services.leads;

        let attempt = || {
            let lead = new_lead.clone();
            async move { with_timeout(deadline, leads.create_lead(lead)).await }
        };

        attempt
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(self.retry.min_delay_ms))
                    .with_max_delay(Duration::from_millis(self.retry.max_delay_ms))
                    .with_max_times(self.retry.max_times),
            )
            .when(StoreError::is_transient)
            .notify(|e, dur| {
                warn!(
                    funnel_id = %funnel_id,
                    "Lead creation failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
            .map_err(SubmitError::Persistence)
    }

    /// Scores a created lead and records the outcome on it. Never fails the submit.
    pub async fn score(&self, lead: &mut Lead) {
        let outcome = with_timeout(
            self.timeouts.score(),
            self.services.scorer.score_lead(lead.id),
        )
        .await;

        lead.scoring = match outcome {
            Ok(()) => {
                info!(lead_id = %lead.id, funnel_id = %lead.funnel_id, "Lead scored");
                ScoringStatus::Scored
            }
            Err(e) => {
                warn!(lead_id = %lead.id, error = %e, "Lead scoring failed; lead kept unscored");
                ScoringStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
    }
}
