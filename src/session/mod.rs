//! The funnel player: one respondent moving through one funnel.

mod notification;
mod submit;

pub use notification::{Notification, NotificationLevel};
pub use submit::SubmitServices;

use crate::config::SessionConfig;
use crate::definition::FunnelDefinition;
use crate::error::{StoreError, SubmitError};
use crate::evaluator::{Evaluator, NavigationDecision, resolve_previous_page};
use crate::page::{Page, sort_pages, thank_you_index};
use crate::rule::Rule;
use crate::state::FormState;
use crate::store::{FunnelRepository, Lead, ScoringStatus};
use crate::value::FieldValue;
use submit::{SubmitPipeline, with_timeout};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Page sequencer and form state for a single funnel session.
///
/// The session is the only owner of its state; every operation that changes
/// it takes `&mut self`, so a second submit cannot start while one is running.
pub struct FunnelSession {
    funnel_id: String,
    pages: Vec<Page>,
    evaluator: Evaluator,
    state: FormState,
    current: usize,
    config: SessionConfig,
    services: SubmitServices,
    idempotency_key: Uuid,
    submitted: Option<Lead>,
    notifications: Vec<Notification>,
}

impl FunnelSession {
    pub fn new(
        definition: FunnelDefinition,
        services: SubmitServices,
        config: SessionConfig,
    ) -> Self {
        let FunnelDefinition {
            funnel_id,
            pages,
            rules,
        } = definition;
        Self::from_parts(funnel_id, pages, rules, services, config)
    }

    /// Fetches the funnel's pages and rules from `repository` and starts a session.
    pub async fn load(
        repository: &dyn FunnelRepository,
        funnel_id: &str,
        services: SubmitServices,
        config: SessionConfig,
    ) -> Result<Self, StoreError> {
        let deadline = config.timeouts.persist();
        let pages = with_timeout(deadline, repository.fetch_pages(funnel_id)).await?;
        let rules = with_timeout(deadline, repository.fetch_rules(funnel_id)).await?;
        info!(
            funnel_id = %funnel_id,
            pages = pages.len(),
            rules = rules.len(),
            "Loaded funnel"
        );
        Ok(Self::from_parts(
            funnel_id.to_string(),
            pages,
            rules,
            services,
            config,
        ))
    }

    fn from_parts(
        funnel_id: String,
        pages: Vec<Page>,
        rules: Vec<Rule>,
        services: SubmitServices,
        config: SessionConfig,
    ) -> Self {
        Self {
            funnel_id,
            pages: sort_pages(pages),
            evaluator: Evaluator::new(rules, config.evaluation),
            state: FormState::new(),
            current: 0,
            config,
            services,
            idempotency_key: Uuid::new_v4(),
            submitted: None,
            notifications: Vec::new(),
        }
    }

    pub fn funnel_id(&self) -> &str {
        &self.funnel_id
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn current_page_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    pub fn is_last_page(&self) -> bool {
        self.current + 1 >= self.pages.len()
    }

    /// True once a submit has created a lead.
    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn submitted_lead(&self) -> Option<&Lead> {
        self.submitted.as_ref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Records a field value. Returns `true` when the stored value changed.
    pub fn update_form_value(&mut self, field: &str, value: impl Into<FieldValue>) -> bool {
        let changed = self.state.set(field, value);
        if changed {
            debug!(funnel_id = %self.funnel_id, field, "Form value updated");
        }
        changed
    }

    pub fn is_visible(&self, element_id: &str) -> bool {
        self.evaluator.is_visible(element_id, &self.state)
    }

    /// Ids of the elements on the current page that render right now.
    pub fn visible_elements(&self) -> Vec<&str> {
        self.current_page()
            .map(|page| self.evaluator.visible_elements(page, &self.state))
            .unwrap_or_default()
    }

    /// Where a forward navigation would go from the current page, without moving.
    pub fn preview_next_page(&self) -> NavigationDecision {
        let mut state = self.state.clone();
        self.evaluator.apply_set_values(&mut state);
        self.evaluator.decide_next_page(self.current, &self.pages, &state)
    }

    /// Moves forward. `setValue` rules are applied first, then the first
    /// matching navigate rule picks the target; otherwise the next page in
    /// order. Stays put on the last page unless a rule redirects.
    pub fn navigate_to_next_page(&mut self) -> usize {
        let written = self.evaluator.apply_set_values(&mut self.state);
        if !written.is_empty() {
            debug!(funnel_id = %self.funnel_id, fields = ?written, "Applied setValue rules");
        }

        let decision = self
            .evaluator
            .decide_next_page(self.current, &self.pages, &self.state);
        debug!(
            funnel_id = %self.funnel_id,
            from = self.current,
            to = decision.index,
            reason = %decision.reason,
            "Navigating forward"
        );
        self.current = decision.index;
        self.current
    }

    /// Moves back one page, never before the first.
    pub fn navigate_to_previous_page(&mut self) -> usize {
        self.current = resolve_previous_page(self.current);
        self.current
    }

    /// Submits the answers and returns the created lead, or `None` on failure.
    ///
    /// Failures are logged and pushed to [`notifications`](Self::notifications);
    /// the page index and form state are left as they were before the call.
    /// A lead whose scoring failed is still a success, with a warning attached.
    pub async fn submit_form(&mut self, final_data: Option<FormState>) -> Option<Lead> {
        match self.try_submit_form(final_data).await {
            Ok(lead) => {
                self.notifications
                    .push(Notification::info("Thanks! Your answers were submitted."));
                if let ScoringStatus::Failed { reason } = &lead.scoring {
                    self.notifications.push(Notification::warning(format!(
                        "Your answers were saved, but scoring is delayed: {}",
                        reason
                    )));
                }
                Some(lead)
            }
            Err(e) => {
                if e.is_validation() {
                    warn!(funnel_id = %self.funnel_id, error = %e, "Submit rejected");
                } else {
                    error!(funnel_id = %self.funnel_id, error = %e, "Submit failed");
                }
                self.notifications.push(Notification::error(e.to_string()));
                None
            }
        }
    }

    /// Validates, persists and scores the merged answers.
    ///
    /// `final_data` is overlaid on the session state. Nothing in the session
    /// changes unless the lead is created. Scoring failures are recorded on
    /// the returned lead and do not fail the call.
    pub async fn try_submit_form(
        &mut self,
        final_data: Option<FormState>,
    ) -> Result<Lead, SubmitError> {
        if self.submitted.is_some() {
            return Err(SubmitError::AlreadySubmitted);
        }

        let data = match &final_data {
            Some(extra) => self.state.merged(extra),
            None => self.state.clone(),
        };

        let pipeline = SubmitPipeline {
            services: &self.services,
            timeouts: self.config.timeouts,
            retry: self.config.retry,
        };
        let contact = pipeline.validate(&data).await?;
        let mut lead = pipeline
            .persist(&self.funnel_id, contact, &data, self.idempotency_key)
            .await?;
        pipeline.score(&mut lead).await;

        info!(funnel_id = %self.funnel_id, lead_id = %lead.id, "Lead created");
        self.state = data;
        self.submitted = Some(lead.clone());
        if let Some(index) = thank_you_index(&self.pages) {
            self.current = index;
        }
        Ok(lead)
    }

    /// Re-runs scoring for a lead whose scoring failed or never ran.
    /// Returns `true` when the lead ends up scored.
    pub async fn retry_scoring(&mut self, lead: &mut Lead) -> bool {
        if !lead.needs_scoring() {
            return true;
        }
        let pipeline = SubmitPipeline {
            services: &self.services,
            timeouts: self.config.timeouts,
            retry: self.config.retry,
        };
        pipeline.score(lead).await;

        if let Some(submitted) = self.submitted.as_mut().filter(|s| s.id == lead.id) {
            submitted.scoring = lead.scoring.clone();
        }
        !lead.needs_scoring()
    }
}
