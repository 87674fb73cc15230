//! Call outcomes.

use serde::Serialize;

/// Result of one protected invocation (or of a whole retry sequence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T, E> {
    Success(T),
    Failure(E),
}

impl<T, E> CallOutcome<T, E> {
    /// The tag recorded by sliding windows.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            CallOutcome::Success(_) => OutcomeKind::Success,
            CallOutcome::Failure(_) => OutcomeKind::Failure,
        }
    }
}

/// Outcome tag without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failure => "failure",
        }
    }
}
