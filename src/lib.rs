//! # funnel-logic - Funnel Rule Evaluation and Session Engine
//!
//! **funnel-logic** drives multi-page marketing funnels: it decides which
//! elements of a page render, which page comes next, and turns a finished
//! session into a persisted lead.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Funnel**: Parse a [`FunnelDefinition`](definition::FunnelDefinition) from JSON or a
//!     compiled artifact, or fetch pages and rules through a
//!     [`FunnelRepository`](store::FunnelRepository).
//! 2.  **Start a Session**: Create a [`FunnelSession`](session::FunnelSession) with the collaborators it
//!     needs for submission (contact validation, lead storage, lead scoring).
//! 3.  **Play**: Record answers with `update_form_value`, ask which elements are
//!     visible, and move with `navigate_to_next_page` / `navigate_to_previous_page`.
//! 4.  **Submit**: `submit_form` validates the contact details, creates the lead,
//!     scores it, and moves to the thank-you page if the funnel has one.
//!
//! Rule conditions are pure functions of the current form state; the
//! [`evaluator`] module exposes them directly for callers that only need
//! visibility or navigation decisions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use funnel_logic::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let definition = FunnelDefinition::from_file("funnels/onboarding.json")?;
//! let store = Arc::new(InMemoryStore::with_definition(definition.clone()));
//! let services = SubmitServices::new(Arc::new(BasicContactValidator), store.clone(), store);
//!
//! let mut session = FunnelSession::new(definition, services, SessionConfig::default());
//! session.update_form_value("plan", "pro");
//! println!("Visible: {:?}", session.visible_elements());
//!
//! session.navigate_to_next_page();
//! session.update_form_value("email", "ada@example.com");
//! if let Some(lead) = session.submit_form(None).await {
//!     println!("-> Lead {} created ({:?})", lead.id, lead.scoring);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod definition;
pub mod editor;
pub mod error;
pub mod evaluator;
pub mod page;
pub mod prelude;
pub mod rule;
pub mod session;
pub mod state;
pub mod store;
pub mod trace;
pub mod value;
