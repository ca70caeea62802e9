//! In-process report store.
//!
//! Not durable across process restarts. Useful for hosts that persist
//! elsewhere and for tests.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::report::{Report, ReportId, ReportStatus};
use crate::storage::store::ReportStore;

#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<ReportId, Report>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }
}

impl ReportStore for MemoryReportStore {
    fn put(&self, report: &Report) -> Result<(), StoreError> {
        let mut reports = self.reports.write();
        if reports.contains_key(&report.id()) {
            return Err(StoreError::AlreadyExists(report.id()));
        }
        reports.insert(report.id(), report.clone());
        Ok(())
    }

    fn get(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        Ok(self.reports.read().get(id).cloned())
    }

    fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        let mut matching: Vec<Report> = self
            .reports
            .read()
            .values()
            .filter(|r| r.status() == status)
            .cloned()
            .collect();
        matching.sort_by(Report::creation_order);
        Ok(matching)
    }

    fn set_status(&self, id: &ReportId, status: ReportStatus) -> Result<(), StoreError> {
        let mut reports = self.reports.write();
        let report = reports.remove(id).ok_or(StoreError::NotFound(*id))?;
        reports.insert(*id, report.with_status(status));
        Ok(())
    }

    fn delete(&self, id: &ReportId) -> Result<(), StoreError> {
        self.reports.write().remove(id);
        Ok(())
    }
}
