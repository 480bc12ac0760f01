//! Collaborator interfaces the funnel engine talks to, plus reference
//! implementations.
//!
//! The session never reaches for an ambient client: every backend it needs is
//! one of these traits, injected at construction time.

use crate::error::StoreError;
use crate::page::Page;
use crate::rule::Rule;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod contact;
mod memory;

pub use contact::BasicContactValidator;
pub use memory::InMemoryStore;

/// Read access to a funnel's pages and rules.
#[async_trait]
pub trait FunnelRepository: Send + Sync {
    async fn fetch_pages(&self, funnel_id: &str) -> Result<Vec<Page>, StoreError>;

    async fn fetch_rules(&self, funnel_id: &str) -> Result<Vec<Rule>, StoreError>;
}

/// Builder-side rule persistence.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Persists a new rule and returns it with its server-assigned id.
    async fn create_rule(&self, rule: Rule) -> Result<Rule, StoreError>;

    async fn update_rule(&self, rule: &Rule) -> Result<(), StoreError>;

    async fn delete_rule(&self, rule_id: &str) -> Result<(), StoreError>;
}

/// Syntactic checks and normalization of contact details.
#[async_trait]
pub trait ContactValidator: Send + Sync {
    async fn validate_contact(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<ContactValidation, StoreError>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persists a lead. Implementations should return the existing lead when
    /// `idempotency_key` was already used.
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, StoreError>;
}

#[async_trait]
pub trait LeadScorer: Send + Sync {
    async fn score_lead(&self, lead_id: Uuid) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedContact {
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactValidation {
    pub is_valid: bool,
    pub sanitized: SanitizedContact,
    /// Human-readable reason when `is_valid` is false.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A lead as sent to the store, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub email: String,
    pub phone: Option<String>,
    pub funnel_id: String,
    pub answers: serde_json::Map<String, serde_json::Value>,
    pub idempotency_key: Uuid,
}

/// Progress of the scoring step that follows lead creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoringStatus {
    Pending,
    Scored,
    Failed { reason: String },
}

/// A persisted funnel respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub funnel_id: String,
    pub email: String,
    pub phone: Option<String>,
    pub answers: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub scoring: ScoringStatus,
}

impl Lead {
    pub fn from_new(id: Uuid, lead: NewLead) -> Self {
        Self {
            id,
            funnel_id: lead.funnel_id,
            email: lead.email,
            phone: lead.phone,
            answers: lead.answers,
            created_at: Utc::now(),
            scoring: ScoringStatus::Pending,
        }
    }

    /// True when scoring has not succeeded and may be retried.
    pub fn needs_scoring(&self) -> bool {
        !matches!(self.scoring, ScoringStatus::Scored)
    }
}
