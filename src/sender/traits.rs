//! Sender contract.

use chrono::{DateTime, Utc};

use crate::attachment::ResolvedAttachment;
use crate::error::SenderError;
use crate::report::{Report, ReportFields, ReportId};

/// What a sender receives: the field map plus resolved attachments.
#[derive(Debug, Clone)]
pub struct ReportPayload {
    pub report_id: ReportId,
    pub created_at: DateTime<Utc>,
    pub fields: ReportFields,
    pub attachments: Vec<ResolvedAttachment>,
}

impl ReportPayload {
    pub fn new(report: &Report, attachments: Vec<ResolvedAttachment>) -> Self {
        Self {
            report_id: report.id(),
            created_at: report.created_at(),
            fields: report.fields().clone(),
            attachments,
        }
    }
}

/// A delivery destination.
///
/// `send` may block; the dispatch engine bounds it with a timeout and
/// treats an expired attempt as a recoverable failure. Attempts are not
/// interrupted, so an implementation that outlives its timeout keeps
/// running detached.
pub trait ReportSender: Send + Sync {
    fn name(&self) -> &str;

    fn send(&self, payload: &ReportPayload) -> Result<(), SenderError>;
}
