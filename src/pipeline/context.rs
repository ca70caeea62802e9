//! Cycle context management.
//!
//! Provides cycle and report context for logging and summaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;
use crate::report::ReportId;

/// Which lifecycle trigger a cycle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Capture,
    Retention,
    Dispatch,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::Capture => "capture",
            CycleKind::Retention => "retention",
            CycleKind::Dispatch => "dispatch",
        }
    }
}

/// Context for one invocation of a lifecycle trigger.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: String,
    pub kind: CycleKind,
    pub started_at: DateTime<Utc>,
}

impl CycleContext {
    pub fn new(kind: CycleKind) -> Self {
        let cycle_id = format!("{}-{}", kind.as_str(), &Uuid::new_v4().to_string()[..8]);
        Self {
            cycle_id,
            kind,
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.cycle_id)
    }

    pub fn report_log_context(&self, report_id: &ReportId) -> LogContext {
        self.log_context().with_report(report_id)
    }
}

/// Cooperative cancellation for dispatch cycles, checked between reports.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_id_prefix() {
        let ctx = CycleContext::new(CycleKind::Dispatch);
        assert!(ctx.cycle_id.starts_with("dispatch-"));
        assert_eq!(ctx.cycle_id.len(), "dispatch-".len() + 8);
        assert_eq!(
            format!("{}", ctx.log_context()),
            format!("[cycle={}]", ctx.cycle_id)
        );
    }

    #[test]
    fn test_capture_context_narrows_to_report() {
        let ctx = CycleContext::new(CycleKind::Capture);
        let id = ReportId::new();
        assert!(ctx.cycle_id.starts_with("capture-"));
        assert_eq!(
            ctx.report_log_context(&id).to_string(),
            format!("[cycle={}] [report={}]", ctx.cycle_id, id)
        );
    }

    #[test]
    fn test_cancellation_flag_is_shared() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
        flag.reset();
        assert!(!clone.is_cancelled());
    }
}
