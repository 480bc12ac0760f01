use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// How show and hide rules on the same element combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityPolicy {
    /// A matching hide rule wins. Otherwise, if the element has show rules,
    /// at least one of them must match.
    #[default]
    ShowHide,
    /// Visible when any rule's condition holds, regardless of show or hide.
    AnyMatch,
}

/// What an operator name the engine does not recognize evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownOperatorPolicy {
    /// The condition is satisfied.
    #[default]
    Permit,
    /// The condition fails.
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub visibility_policy: VisibilityPolicy,
    pub unknown_operator_policy: UnknownOperatorPolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            visibility_policy: VisibilityPolicy::ShowHide,
            unknown_operator_policy: UnknownOperatorPolicy::Permit,
        }
    }
}

/// Per-call deadlines for submit-time collaborators, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub validate_ms: u64,
    pub persist_ms: u64,
    pub score_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            validate_ms: 5_000,
            persist_ms: 5_000,
            score_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn validate(&self) -> Duration {
        Duration::from_millis(self.validate_ms)
    }

    pub fn persist(&self) -> Duration {
        Duration::from_millis(self.persist_ms)
    }

    pub fn score(&self) -> Duration {
        Duration::from_millis(self.score_ms)
    }
}

/// Backoff for transient lead-persistence failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_times: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: 3,
            min_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_times: 0,
            ..Self::default()
        }
    }
}

/// Settings for one funnel-player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub evaluation: EvaluationConfig,
    pub timeouts: TimeoutConfig,
    pub retry: RetryConfig,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a session configuration from a JSON file. Missing keys take defaults.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn with_visibility_policy(mut self, policy: VisibilityPolicy) -> Self {
        self.evaluation.visibility_policy = policy;
        self
    }

    pub fn with_unknown_operator_policy(mut self, policy: UnknownOperatorPolicy) -> Self {
        self.evaluation.unknown_operator_policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }
}
