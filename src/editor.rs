//! Builder-side rule editing with batched "save all" semantics.
//!
//! Drafts carry local-only flags so unsaved work can be told apart from
//! rules already persisted. Nothing reaches the repository until
//! [`RuleEditor::save_all`].

use crate::error::{EditorError, StoreError};
use crate::rule::{Action, Rule};
use crate::store::RuleRepository;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// Created locally, never persisted.
    New,
    /// Persisted, with local edits not yet saved.
    Dirty,
    /// Matches what the repository holds.
    Clean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    /// Stable handle for the UI; for persisted rules it equals the rule id.
    pub local_id: String,
    pub rule: Rule,
    pub state: DraftState,
    pub deleted: bool,
}

/// Outcome of one [`RuleEditor::save_all`] round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    /// Local ids of drafts that failed, with the error. They stay pending.
    pub failed: Vec<(String, StoreError)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Checks a rule is well formed enough to save.
pub fn validate_rule(rule: &Rule) -> Result<(), EditorError> {
    let invalid = |message: &str| EditorError::InvalidRule {
        rule_id: rule.id.clone(),
        message: message.to_string(),
    };
    match &rule.action {
        Action::Navigate { target } if target.trim().is_empty() => {
            return Err(invalid("navigate rules need a target page"));
        }
        Action::SetValue { target, .. } if target.trim().is_empty() => {
            return Err(invalid("setValue rules need a target field"));
        }
        Action::Show | Action::Hide if rule.element_id.is_none() => {
            return Err(invalid("show/hide rules need an element"));
        }
        _ => {}
    }
    if let Some(condition) = &rule.condition {
        if condition.field.trim().is_empty() {
            return Err(invalid("condition field is empty"));
        }
    }
    Ok(())
}

/// Working copy of a funnel's rules in the builder.
#[derive(Debug, Clone)]
pub struct RuleEditor {
    funnel_id: String,
    drafts: Vec<RuleDraft>,
    next_local: usize,
}

impl RuleEditor {
    /// Starts editing from the rules currently stored for `funnel_id`.
    pub fn new(funnel_id: impl Into<String>, rules: Vec<Rule>) -> Self {
        let drafts = rules
            .into_iter()
            .map(|rule| RuleDraft {
                local_id: rule.id.clone(),
                rule,
                state: DraftState::Clean,
                deleted: false,
            })
            .collect();
        Self {
            funnel_id: funnel_id.into(),
            drafts,
            next_local: 0,
        }
    }

    pub fn funnel_id(&self) -> &str {
        &self.funnel_id
    }

    pub fn drafts(&self) -> &[RuleDraft] {
        &self.drafts
    }

    /// The rules as they would be after saving, excluding deletions.
    pub fn rules(&self) -> Vec<Rule> {
        self.drafts
            .iter()
            .filter(|d| !d.deleted)
            .map(|d| d.rule.clone())
            .collect()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.drafts
            .iter()
            .any(|d| d.deleted || d.state != DraftState::Clean)
    }

    /// Adds a new local rule and returns its local id.
    pub fn add_rule(&mut self, mut rule: Rule) -> Result<String, EditorError> {
        validate_rule(&rule)?;
        self.next_local += 1;
        let local_id = format!("local-{}", self.next_local);
        rule.id = local_id.clone();
        rule.funnel_id = self.funnel_id.clone();
        self.drafts.push(RuleDraft {
            local_id: local_id.clone(),
            rule,
            state: DraftState::New,
            deleted: false,
        });
        Ok(local_id)
    }

    /// Replaces a draft's rule. Ids and funnel are kept from the draft.
    pub fn update_rule(&mut self, local_id: &str, mut rule: Rule) -> Result<(), EditorError> {
        let draft = self.draft_mut(local_id)?;
        rule.id = draft.rule.id.clone();
        rule.funnel_id = draft.rule.funnel_id.clone();
        validate_rule(&rule)?;
        draft.rule = rule;
        if draft.state == DraftState::Clean {
            draft.state = DraftState::Dirty;
        }
        Ok(())
    }

    /// Marks a rule for deletion. A never-saved rule is simply dropped.
    pub fn remove_rule(&mut self, local_id: &str) -> Result<(), EditorError> {
        let index = self
            .drafts
            .iter()
            .position(|d| d.local_id == local_id)
            .ok_or_else(|| EditorError::DraftNotFound(local_id.to_string()))?;
        if self.drafts[index].state == DraftState::New {
            self.drafts.remove(index);
        } else {
            self.drafts[index].deleted = true;
        }
        Ok(())
    }

    /// Sends every pending change to `repository`.
    ///
    /// Each draft is saved independently; a failure leaves that draft pending
    /// and is listed in the report, while the rest still go through.
    pub async fn save_all(&mut self, repository: &dyn RuleRepository) -> SaveReport {
        let mut report = SaveReport::default();
        let mut kept = Vec::with_capacity(self.drafts.len());

        for mut draft in std::mem::take(&mut self.drafts) {
            if draft.deleted {
                match repository.delete_rule(&draft.rule.id).await {
                    Ok(()) | Err(StoreError::NotFound(_)) => report.deleted.push(draft.rule.id),
                    Err(e) => {
                        report.failed.push((draft.local_id.clone(), e));
                        kept.push(draft);
                    }
                }
                continue;
            }

            match draft.state {
                DraftState::New => match repository.create_rule(draft.rule.clone()).await {
                    Ok(saved) => {
                        report.created.push(saved.id.clone());
                        draft.local_id = saved.id.clone();
                        draft.rule = saved;
                        draft.state = DraftState::Clean;
                    }
                    Err(e) => report.failed.push((draft.local_id.clone(), e)),
                },
                DraftState::Dirty => match repository.update_rule(&draft.rule).await {
                    Ok(()) => {
                        report.updated.push(draft.rule.id.clone());
                        draft.state = DraftState::Clean;
                    }
                    Err(e) => report.failed.push((draft.local_id.clone(), e)),
                },
                DraftState::Clean => {}
            }
            kept.push(draft);
        }
        self.drafts = kept;

        if report.is_complete() {
            info!(
                funnel_id = %self.funnel_id,
                created = report.created.len(),
                updated = report.updated.len(),
                deleted = report.deleted.len(),
                "Saved rules"
            );
        } else {
            warn!(
                funnel_id = %self.funnel_id,
                failed = report.failed.len(),
                "Some rules could not be saved"
            );
        }
        report
    }

    fn draft_mut(&mut self, local_id: &str) -> Result<&mut RuleDraft, EditorError> {
        self.drafts
            .iter_mut()
            .find(|d| d.local_id == local_id)
            .ok_or_else(|| EditorError::DraftNotFound(local_id.to_string()))
    }
}
