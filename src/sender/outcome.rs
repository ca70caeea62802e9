//! Delivery outcomes.
//!
//! Sender errors are captured here as data so the dispatch engine can
//! decide on the complete outcome set.

use std::time::Duration;

use crate::error::SenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Recoverable,
    Unrecoverable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Recoverable => "recoverable",
            FailureKind::Unrecoverable => "unrecoverable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success,
    Failure { kind: FailureKind, reason: String },
}

impl DeliveryOutcome {
    pub fn from_result(result: Result<(), SenderError>) -> Self {
        match result {
            Ok(()) => DeliveryOutcome::Success,
            Err(SenderError::Recoverable(reason)) => DeliveryOutcome::Failure {
                kind: FailureKind::Recoverable,
                reason,
            },
            Err(SenderError::Unrecoverable(reason)) => DeliveryOutcome::Failure {
                kind: FailureKind::Unrecoverable,
                reason,
            },
        }
    }

    /// A timeout is always recoverable.
    pub fn timed_out(timeout: Duration) -> Self {
        DeliveryOutcome::Failure {
            kind: FailureKind::Recoverable,
            reason: format!("timed out after {}ms", timeout.as_millis()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success)
    }

    pub fn is_recoverable_failure(&self) -> bool {
        matches!(
            self,
            DeliveryOutcome::Failure {
                kind: FailureKind::Recoverable,
                ..
            }
        )
    }

    pub fn is_unrecoverable_failure(&self) -> bool {
        matches!(
            self,
            DeliveryOutcome::Failure {
                kind: FailureKind::Unrecoverable,
                ..
            }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Success => "success",
            DeliveryOutcome::Failure { kind, .. } => kind.as_str(),
        }
    }
}

/// Outcome of one sender for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderOutcome {
    pub sender: String,
    pub outcome: DeliveryOutcome,
    pub elapsed: Duration,
}
