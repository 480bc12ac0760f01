//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! funnel-logic crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use funnel_logic::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let definition = FunnelDefinition::from_file("path/to/funnel.json")?;
//! let evaluator = Evaluator::new(definition.rules.clone(), EvaluationConfig::default());
//!
//! let mut state = FormState::new();
//! state.set("plan", "pro");
//! let next = evaluator.decide_next_page(0, &definition.pages, &state);
//! println!("Next page: {} ({})", next.index, next.reason);
//! # Ok(())
//! # }
//! ```

// Sessions and evaluation
pub use crate::evaluator::{Evaluator, NavigationDecision, VisibilityDecision};
pub use crate::session::{FunnelSession, Notification, NotificationLevel, SubmitServices};

// Funnel model
pub use crate::definition::FunnelDefinition;
pub use crate::page::{ContentElement, ElementKind, Page, PageContent, PageType};
pub use crate::rule::{Action, Condition, Operator, Rule};
pub use crate::state::FormState;
pub use crate::value::FieldValue;

// Configuration
pub use crate::config::{
    EvaluationConfig, RetryConfig, SessionConfig, TimeoutConfig, UnknownOperatorPolicy,
    VisibilityPolicy,
};

// Collaborators
pub use crate::editor::{RuleEditor, SaveReport};
pub use crate::store::{
    BasicContactValidator, ContactValidator, FunnelRepository, InMemoryStore, Lead, LeadScorer,
    LeadStore, RuleRepository, ScoringStatus,
};

// Error types
pub use crate::error::{DefinitionError, EditorError, StoreError, SubmitError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
