//! Report store contract.

use crate::error::StoreError;
use crate::report::{Report, ReportId, ReportStatus};

/// Durable report persistence.
///
/// Implementations must be safe under concurrent use from the capture
/// path, the approval path and the dispatch worker. Every mutation is
/// atomic with respect to a process crash: a report is observed either
/// fully present or fully absent afterwards.
pub trait ReportStore: Send + Sync {
    /// Persist a new report. Durable before returning.
    ///
    /// Fails with `StoreError::AlreadyExists` if the id is taken.
    fn put(&self, report: &Report) -> Result<(), StoreError>;

    fn get(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;

    /// Reports with the given status, oldest first.
    fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError>;

    /// Fails with `StoreError::NotFound` if the report is absent.
    fn set_status(&self, id: &ReportId, status: ReportStatus) -> Result<(), StoreError>;

    /// Idempotent: deleting an absent id is a no-op.
    fn delete(&self, id: &ReportId) -> Result<(), StoreError>;

    /// Every report regardless of status, oldest first.
    fn list_all(&self) -> Result<Vec<Report>, StoreError> {
        let mut all = self.list_by_status(ReportStatus::PendingApproval)?;
        all.extend(self.list_by_status(ReportStatus::Approved)?);
        all.sort_by(Report::creation_order);
        Ok(all)
    }
}
