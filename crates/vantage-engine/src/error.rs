//! error taxonomy for reconciliation calls.

use crate::transport::TransportError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use vantage_core::ValidationError;

/// failures of get/list/delete/plan and of apply steps.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// a diff needs recreation, or a lifecycle directive blocks the action.
    #[error("infeasible apply: {0}")]
    Infeasible(String),
    #[error("failed to marshal {kind}: {source}")]
    Marshal {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to unmarshal {kind}: {message}")]
    Unmarshal { kind: &'static str, message: String },
    #[error("operation {operation} failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
    #[error("no next page")]
    NoNextPage,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{}", .0.join("\n"))]
    Multiple(Vec<String>),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Transport(err) => err.is_not_found(),
            Error::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// http 409; the whole apply sequence is restarted on these.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Transport(err) => err.is_conflict(),
            Error::Operation { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

/// apply failure; residual diffs carry the resource's new state.
#[derive(Debug, Error)]
pub enum ApplyError<R: fmt::Debug> {
    #[error("diffs remain after apply: {}", .diffs.join("; "))]
    DiffAfterApply { diffs: Vec<String>, state: Box<R> },
    #[error(transparent)]
    Failed(#[from] Error),
}

impl<R: fmt::Debug> ApplyError<R> {
    pub fn is_conflict(&self) -> bool {
        match self {
            ApplyError::Failed(err) => err.is_conflict(),
            ApplyError::DiffAfterApply { .. } => false,
        }
    }

    /// new state observed after apply, when one was read.
    pub fn state(&self) -> Option<&R> {
        match self {
            ApplyError::DiffAfterApply { state, .. } => Some(state),
            ApplyError::Failed(_) => None,
        }
    }
}
