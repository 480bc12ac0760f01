use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading a funnel definition or artifact.
#[derive(Error, Debug, Clone)]
pub enum DefinitionError {
    #[error("Failed to parse funnel definition JSON: {0}")]
    JsonParseError(String),

    #[error("Page id '{0}' appears more than once")]
    DuplicatePage(String),

    #[error("Artifact was written with format version {found}, expected {expected}")]
    ArtifactVersion { expected: u32, found: u32 },

    #[error("Artifact I/O failed: {0}")]
    Io(String),

    #[error("Artifact encoding failed: {0}")]
    Encoding(String),
}

/// Errors reported by storage and network collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true if the error is transient and the call may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Timeout(_))
    }
}

/// Why a submit call did not produce a lead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("An email address is required")]
    MissingEmail,

    #[error("Please check your contact details: {0}")]
    InvalidContact(String),

    #[error("Contact validation failed: {0}")]
    Validation(StoreError),

    #[error("Could not save your answers: {0}")]
    Persistence(StoreError),

    #[error("This funnel has already been submitted")]
    AlreadySubmitted,
}

impl SubmitError {
    /// Validation failures are final for the call; the others are I/O failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, SubmitError::MissingEmail | SubmitError::InvalidContact(_))
    }
}

/// Errors raised by the builder-side rule editor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Rule draft '{0}' not found")]
    DraftNotFound(String),

    #[error("Rule '{rule_id}' is invalid: {message}")]
    InvalidRule { rule_id: String, message: String },
}

/// Errors raised while loading a session configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config JSON: {0}")]
    Parse(String),
}
