//! Approval gate.
//!
//! Silent reports and reports captured in automatic approval mode go
//! straight to Approved. Everything else waits in PendingApproval until
//! the UI collaborator approves or rejects it. The gate does not cap the
//! number of pending reports; the retention pass does.

use std::sync::Arc;

use crate::config::{ApprovalMode, CoreConfig};
use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::report::{CapturedReport, Report, ReportId, ReportStatus};
use crate::storage::ReportStore;

pub struct ApprovalGate {
    config: Arc<CoreConfig>,
    store: Arc<dyn ReportStore>,
}

impl ApprovalGate {
    pub fn new(config: Arc<CoreConfig>, store: Arc<dyn ReportStore>) -> Self {
        Self { config, store }
    }

    /// Initial status for a captured report.
    pub fn classify(&self, captured: &CapturedReport) -> ReportStatus {
        if captured.silent || self.config.approval_mode == ApprovalMode::Automatic {
            ReportStatus::Approved
        } else {
            ReportStatus::PendingApproval
        }
    }

    /// Classify and persist a captured report.
    pub fn admit(&self, captured: CapturedReport, ctx: &LogContext) -> Result<Report, StoreError> {
        let status = self.classify(&captured);
        let report = Report::new(captured, status);
        let ctx = ctx.with_report(&report.id());
        if let Err(e) = self.store.put(&report) {
            log::error!("{} REPORT_ADMIT_FAILED error={}", ctx, e);
            return Err(e);
        }

        log::info!(
            "{} REPORT_ADMITTED status={} silent={} app_version_code={} fields={}",
            ctx,
            status.as_str(),
            report.is_silent(),
            report.app_version_code(),
            report.fields().len()
        );
        Ok(report)
    }

    /// The report awaiting approval. When several coexist (before the next
    /// retention pass) the most recent one is offered.
    pub fn pending_approval(&self) -> Result<Option<Report>, StoreError> {
        Ok(self
            .store
            .list_by_status(ReportStatus::PendingApproval)?
            .pop())
    }

    pub fn approve(&self, id: &ReportId) -> Result<(), StoreError> {
        self.store.set_status(id, ReportStatus::Approved)?;
        log::info!("{} REPORT_APPROVED", LogContext::for_report(id));
        Ok(())
    }

    /// Rejecting a report deletes it.
    pub fn reject(&self, id: &ReportId) -> Result<(), StoreError> {
        self.store.delete(id)?;
        log::info!("{} REPORT_REJECTED", LogContext::for_report(id));
        Ok(())
    }
}
