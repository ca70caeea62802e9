//! Retry policies.
//!
//! The dispatch engine treats a policy as an opaque predicate. Concrete
//! policies are selected by name from configuration or supplied directly
//! by the host.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::report::Report;
use crate::sender::outcome::SenderOutcome;

/// Should an undelivered report be kept for another attempt?
pub trait RetryPolicy: Send + Sync {
    fn name(&self) -> &str;

    /// Called only when at least one sender did not succeed.
    fn should_retry(&self, report: &Report, outcomes: &[SenderOutcome]) -> bool;
}

/// Retry while every failure is recoverable.
///
/// Any unrecoverable failure is a permanent rejection and the report is
/// abandoned, even if other senders succeeded or failed recoverably.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn name(&self) -> &str {
        "default"
    }

    fn should_retry(&self, _report: &Report, outcomes: &[SenderOutcome]) -> bool {
        let any_recoverable = outcomes.iter().any(|o| o.outcome.is_recoverable_failure());
        let any_unrecoverable = outcomes.iter().any(|o| o.outcome.is_unrecoverable_failure());
        any_recoverable && !any_unrecoverable
    }
}

/// Never retry: one delivery attempt per report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetryPolicy;

impl RetryPolicy for NeverRetryPolicy {
    fn name(&self) -> &str {
        "never"
    }

    fn should_retry(&self, _report: &Report, _outcomes: &[SenderOutcome]) -> bool {
        false
    }
}

/// Built-in policies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicyKind {
    #[default]
    Default,
    Never,
}

impl RetryPolicyKind {
    pub fn build(&self) -> Arc<dyn RetryPolicy> {
        match self {
            RetryPolicyKind::Default => Arc::new(DefaultRetryPolicy),
            RetryPolicyKind::Never => Arc::new(NeverRetryPolicy),
        }
    }
}
