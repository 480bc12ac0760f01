use super::{FunnelRepository, Lead, LeadScorer, LeadStore, NewLead, RuleRepository};
use crate::definition::FunnelDefinition;
use crate::error::StoreError;
use crate::page::Page;
use crate::rule::Rule;
use ahash::AHashMap;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    pages: AHashMap<String, Vec<Page>>,
    rules: AHashMap<String, Vec<Rule>>,
    leads: Vec<Lead>,
    idempotency: AHashMap<Uuid, Uuid>,
    scored: Vec<Uuid>,
    create_failures: VecDeque<StoreError>,
    score_failures: VecDeque<StoreError>,
}

/// A process-local store implementing every collaborator trait.
///
/// Queued failures let callers simulate flaky backends: each queued error is
/// returned by the next matching call, in order.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    create_delay: Option<Duration>,
    score_delay: Option<Duration>,
    create_calls: AtomicUsize,
    score_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with one funnel's pages and rules.
    pub fn with_definition(definition: FunnelDefinition) -> Self {
        let mut inner = Inner::default();
        inner
            .pages
            .insert(definition.funnel_id.clone(), definition.pages);
        inner.rules.insert(definition.funnel_id, definition.rules);
        Self {
            inner: RwLock::new(inner),
            ..Self::default()
        }
    }

    /// Delays every `create_lead` call, for exercising timeouts.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Delays every `score_lead` call.
    pub fn with_score_delay(mut self, delay: Duration) -> Self {
        self.score_delay = Some(delay);
        self
    }

    pub async fn fail_next_creates(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.inner.write().await.create_failures.extend(errors);
    }

    pub async fn fail_next_scores(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.inner.write().await.score_failures.extend(errors);
    }

    pub async fn leads(&self) -> Vec<Lead> {
        self.inner.read().await.leads.clone()
    }

    pub async fn rules(&self, funnel_id: &str) -> Vec<Rule> {
        self.inner
            .read()
            .await
            .rules
            .get(funnel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_scored(&self, lead_id: Uuid) -> bool {
        self.inner.read().await.scored.contains(&lead_id)
    }

    /// Number of `create_lead` calls received, including failed ones.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn score_calls(&self) -> usize {
        self.score_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FunnelRepository for InMemoryStore {
    async fn fetch_pages(&self, funnel_id: &str) -> Result<Vec<Page>, StoreError> {
        self.inner
            .read()
            .await
            .pages
            .get(funnel_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(funnel_id.to_string()))
    }

    async fn fetch_rules(&self, funnel_id: &str) -> Result<Vec<Rule>, StoreError> {
        Ok(self.rules(funnel_id).await)
    }
}

#[async_trait]
impl RuleRepository for InMemoryStore {
    async fn create_rule(&self, mut rule: Rule) -> Result<Rule, StoreError> {
        rule.id = Uuid::new_v4().to_string();
        let mut inner = self.inner.write().await;
        inner
            .rules
            .entry(rule.funnel_id.clone())
            .or_default()
            .push(rule.clone());
        Ok(rule)
    }

    async fn update_rule(&self, rule: &Rule) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .rules
            .values_mut()
            .flat_map(|rules| rules.iter_mut())
            .find(|r| r.id == rule.id)
            .ok_or_else(|| StoreError::NotFound(rule.id.clone()))?;
        *stored = rule.clone();
        Ok(())
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let mut removed = false;
        for rules in inner.rules.values_mut() {
            let before = rules.len();
            rules.retain(|r| r.id != rule_id);
            removed |= rules.len() != before;
        }
        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(rule_id.to_string()))
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.write().await;
        if let Some(error) = inner.create_failures.pop_front() {
            return Err(error);
        }

        if let Some(existing_id) = inner.idempotency.get(&lead.idempotency_key).copied() {
            if let Some(existing) = inner.leads.iter().find(|l| l.id == existing_id) {
                debug!(
                    lead_id = %existing_id,
                    "Returning existing lead for repeated idempotency key"
                );
                return Ok(existing.clone());
            }
        }

        let key = lead.idempotency_key;
        let created = Lead::from_new(Uuid::new_v4(), lead);
        inner.idempotency.insert(key, created.id);
        inner.leads.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl LeadScorer for InMemoryStore {
    async fn score_lead(&self, lead_id: Uuid) -> Result<(), StoreError> {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.score_delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.write().await;
        if let Some(error) = inner.score_failures.pop_front() {
            return Err(error);
        }
        if !inner.leads.iter().any(|l| l.id == lead_id) {
            return Err(StoreError::NotFound(lead_id.to_string()));
        }
        if !inner.scored.contains(&lead_id) {
            inner.scored.push(lead_id);
        }
        Ok(())
    }
}
