//! Log line prefix.
//!
//! Every event is written as `<context> EVENT_NAME key=value ...` where
//! the context names the lifecycle cycle, the report, or both.

use std::fmt;

use crate::report::ReportId;

/// Who an event belongs to: a capture, retention or dispatch cycle, a
/// single report, or a report inside a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    pub cycle_id: Option<String>,
    pub report_id: Option<ReportId>,
}

impl LogContext {
    pub fn new(cycle_id: &str) -> Self {
        Self {
            cycle_id: Some(cycle_id.to_string()),
            report_id: None,
        }
    }

    /// Store-level events that happen outside any cycle.
    pub fn for_report(report_id: &ReportId) -> Self {
        Self {
            cycle_id: None,
            report_id: Some(*report_id),
        }
    }

    pub fn with_report(&self, report_id: &ReportId) -> Self {
        Self {
            cycle_id: self.cycle_id.clone(),
            report_id: Some(*report_id),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.cycle_id, &self.report_id) {
            (Some(cycle), Some(report)) => write!(f, "[cycle={}] [report={}]", cycle, report),
            (Some(cycle), None) => write!(f, "[cycle={}]", cycle),
            (None, Some(report)) => write!(f, "[report={}]", report),
            (None, None) => f.write_str("[-]"),
        }
    }
}
