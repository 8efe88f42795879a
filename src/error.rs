//! Error types for the harness.
//!
//! Each layer gets its own enum: the gateway classifies remote failures, the
//! poller reports exhausted budgets, and scenario steps wrap both together
//! with assertion failures.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`Gateway`](crate::gateway::Gateway).
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The object already exists remotely
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: String, name: String },

    /// The object does not exist remotely
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    /// The API server could not be reached or answered with a server-side error
    #[error("remote API unavailable: {0}")]
    RemoteUnavailable(String),

    /// Any other Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Body could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Classify a kube error for a given object.
    pub fn from_kube(err: kube::Error, kind: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(e) if e.code == 404 => GatewayError::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(e) if e.code == 409 => GatewayError::AlreadyExists {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(e) if e.code >= 500 || e.code == 429 => {
                GatewayError::RemoteUnavailable(format!("{} ({})", e.message, e.code))
            }
            kube::Error::Service(e) => GatewayError::RemoteUnavailable(e.to_string()),
            other => GatewayError::Kube(other),
        }
    }

    /// Check if this error indicates a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    /// Check if this error indicates an already-exists condition
    pub fn is_already_exists(&self) -> bool {
        matches!(self, GatewayError::AlreadyExists { .. })
    }

    /// Check if retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::RemoteUnavailable(_))
    }
}

/// How much of a wait budget was spent before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBudget {
    /// Fixed-interval polling: `attempts` checks spaced `interval` apart
    Attempts { attempts: u32, interval: Duration },
    /// Blocking watch bounded by a wall-clock deadline
    Deadline(Duration),
}

impl fmt::Display for WaitBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitBudget::Attempts { attempts, interval } => {
                write!(f, "{} attempts at {:?} intervals", attempts, interval)
            }
            WaitBudget::Deadline(timeout) => write!(f, "a {:?} deadline", timeout),
        }
    }
}

/// Errors returned by the convergence poller.
#[derive(Error, Debug)]
pub enum WaitError {
    /// The budget ran out before the condition held
    #[error("Timed out waiting for {target} after {budget} ({elapsed:?} elapsed)")]
    Timeout {
        target: String,
        budget: WaitBudget,
        elapsed: Duration,
    },

    /// The watch stream closed before anything matched
    #[error("Watch for {target} ended unexpectedly")]
    StreamEnded { target: String },

    /// Pods matched the selector but none was running or finished
    #[error("No usable pod for {selector} (observed phases: {observed})")]
    NoUsablePod { selector: String, observed: String },

    /// The follow-up read after a successful wait failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Errors raised while building the harness configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key} must be a positive attempt count")]
    ZeroAttempts { key: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a scenario step.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Missing scenario output: {0}")]
    MissingOutput(String),

    #[error("Unexpected resource shape: {0}")]
    Shape(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required environment data missing: {0}")]
    MissingEnv(&'static str),

    #[error("Scenario is not running (phase {0})")]
    NotRunning(String),

    #[error("{0} was already created by this scenario")]
    AlreadyRecorded(String),

    #[error("Scenario body panicked: {0}")]
    Panicked(String),
}

/// Errors raised by diagnostic capture. Always logged, never propagated.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("{failed} of {total} diagnostic commands failed")]
    Partial { failed: usize, total: usize },
}

/// Result type alias for scenario steps
pub type Result<T, E = ScenarioError> = std::result::Result<T, E>;

/// Fail the current step unless `condition` holds.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Assertion(message()))
    }
}
