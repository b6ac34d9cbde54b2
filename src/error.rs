//! Error types shared by the gateway adapters and the client-side stores.
//!
//! `GatewayError` describes *how* a backend call failed; `MonitorError` describes
//! *which* user-facing operation failed, so a UI can decide whether to retry a view
//! (`Fetch`) or an action (`Mutation`, `Run`).

use thiserror::Error;

use crate::model::TermId;

/// Failure of a single gateway round trip.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection refused, DNS failure, timeout, ...
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is taken from the error body when present.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// 2xx response whose body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The addressed entity does not exist on the backend. Carries the backend's
    /// message, e.g. "Term not found".
    #[error("{0}")]
    NotFound(String),
}

impl GatewayError {
    /// Human-readable message without the transport prefix.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Transport(m)
            | GatewayError::Decode(m)
            | GatewayError::NotFound(m) => m,
            GatewayError::Status { message, .. } => message,
        }
    }
}

/// Failure of a `TermStore`, `RunCoordinator` or `ResultsBoard` operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// Caller input rejected before any network call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A read failed; local state is unchanged.
    #[error("could not load {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: GatewayError,
    },

    /// A write failed; local state is unchanged.
    #[error("could not {action}: {source}")]
    Mutation {
        action: &'static str,
        #[source]
        source: GatewayError,
    },

    /// The manual run failed; the coordinator is idle again.
    #[error("manual run for '{keyword}' failed: {source}")]
    Run {
        keyword: String,
        #[source]
        source: GatewayError,
    },

    /// A manual run was requested while another one is in flight.
    #[error("a manual run is already in progress (term {running})")]
    Busy { running: TermId },
}

impl MonitorError {
    /// Short sentence suitable for an alert/status line.
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::Validation(m) => m.clone(),
            MonitorError::Fetch { what, source } => {
                format!("Error loading {what}: {}", source.message())
            }
            MonitorError::Mutation { action, source } => {
                format!("Error trying to {action}: {}", source.message())
            }
            MonitorError::Run { keyword, source } => format!(
                "Error running manual job for {keyword}: {}. Please try again.",
                source.message()
            ),
            MonitorError::Busy { .. } => {
                "Another manual run is still in progress. Please wait for it to finish.".into()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
