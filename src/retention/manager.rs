//! Retention manager.
//!
//! Runs once per application start, before dispatch. Each pass works on
//! a fresh snapshot of the store, selects victims by sort-and-truncate
//! and deletes them. Deletes are idempotent so a report selected by two
//! passes is harmless.

use std::sync::Arc;

use crate::config::{CoreConfig, MaxApprovedKept, RuntimeInfo};
use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::report::{Report, ReportId, ReportStatus};
use crate::storage::ReportStore;

/// Counts of reports removed by each pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionSummary {
    pub unapproved_deleted: usize,
    pub old_version_deleted: usize,
    pub approved_evicted: usize,
}

impl RetentionSummary {
    pub fn total(&self) -> usize {
        self.unapproved_deleted + self.old_version_deleted + self.approved_evicted
    }
}

/// All pending reports except the most recent. Input is oldest first.
pub fn select_stale_unapproved(pending: &[Report]) -> Vec<ReportId> {
    match pending.split_last() {
        Some((_, older)) => older.iter().map(|r| r.id()).collect(),
        None => Vec::new(),
    }
}

/// Reports captured under a different app version, any status.
pub fn select_other_versions(reports: &[Report], current_version_code: i64) -> Vec<ReportId> {
    reports
        .iter()
        .filter(|r| r.app_version_code() != current_version_code)
        .map(|r| r.id())
        .collect()
}

/// Approved reports beyond the newest `max`. Input is oldest first.
pub fn select_evicted_approved(approved: &[Report], max: MaxApprovedKept) -> Vec<ReportId> {
    match max {
        MaxApprovedKept::Unlimited => Vec::new(),
        MaxApprovedKept::Count(n) => {
            let excess = approved.len().saturating_sub(n);
            approved[..excess].iter().map(|r| r.id()).collect()
        }
    }
}

pub struct RetentionManager {
    config: Arc<CoreConfig>,
    store: Arc<dyn ReportStore>,
}

impl RetentionManager {
    pub fn new(config: Arc<CoreConfig>, store: Arc<dyn ReportStore>) -> Self {
        Self { config, store }
    }

    pub fn run(&self, runtime: &RuntimeInfo, ctx: &LogContext) -> Result<RetentionSummary, StoreError> {
        let policy = &self.config.retention;
        let mut summary = RetentionSummary::default();

        log::debug!(
            "{} RETENTION_START delete_unapproved={} delete_old_unsent={} max_approved={}",
            ctx,
            policy.delete_unapproved_on_start,
            policy.delete_old_unsent_on_start,
            policy.max_approved_kept
        );

        let pending = self.store.list_by_status(ReportStatus::PendingApproval)?;
        if policy.delete_unapproved_on_start {
            let victims = select_stale_unapproved(&pending);
            summary.unapproved_deleted = self.delete_all(&victims, "stale_unapproved", ctx)?;
        } else if pending.len() > 1 {
            // Nothing else bounds the pending set.
            log::warn!(
                "{} PENDING_APPROVAL_ACCUMULATING count={} delete_unapproved_on_start=false",
                ctx,
                pending.len()
            );
        }

        if policy.delete_old_unsent_on_start {
            let all = self.store.list_all()?;
            let victims = select_other_versions(&all, runtime.app_version_code);
            summary.old_version_deleted = self.delete_all(&victims, "old_app_version", ctx)?;
        }

        let approved = self.store.list_by_status(ReportStatus::Approved)?;
        let victims = select_evicted_approved(&approved, policy.max_approved_kept);
        summary.approved_evicted = self.delete_all(&victims, "approved_over_limit", ctx)?;

        log::info!(
            "{} RETENTION_COMPLETE unapproved_deleted={} old_version_deleted={} approved_evicted={} app_version_code={}",
            ctx,
            summary.unapproved_deleted,
            summary.old_version_deleted,
            summary.approved_evicted,
            runtime.app_version_code
        );
        Ok(summary)
    }

    fn delete_all(&self, ids: &[ReportId], reason: &str, ctx: &LogContext) -> Result<usize, StoreError> {
        for id in ids {
            self.store.delete(id)?;
            log::info!("{} RETENTION_DELETE reason={}", ctx.with_report(id), reason);
        }
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetentionPolicy;
    use crate::report::{CapturedReport, ReportFields};
    use crate::storage::MemoryReportStore;
    use chrono::{Duration, Utc};

    fn put(store: &MemoryReportStore, offset: i64, version: i64, status: ReportStatus) -> ReportId {
        let report = Report::new(
            CapturedReport::new(ReportFields::new(), version, false)
                .with_created_at(Utc::now() + Duration::seconds(offset)),
            status,
        );
        store.put(&report).unwrap();
        report.id()
    }

    fn manager(store: Arc<MemoryReportStore>, retention: RetentionPolicy) -> RetentionManager {
        let config = Arc::new(CoreConfig {
            retention,
            ..CoreConfig::default()
        });
        RetentionManager::new(config, store)
    }

    #[test]
    fn test_keeps_only_newest_pending() {
        let store = Arc::new(MemoryReportStore::new());
        let r1 = put(&store, 0, 6, ReportStatus::PendingApproval);
        let r2 = put(&store, 10, 6, ReportStatus::PendingApproval);
        let approved = put(&store, -5, 6, ReportStatus::Approved);

        let summary = manager(store.clone(), RetentionPolicy::default())
            .run(&RuntimeInfo::new(6), &LogContext::new("test"))
            .unwrap();

        assert_eq!(summary.unapproved_deleted, 1);
        assert_eq!(store.get(&r1).unwrap(), None);
        assert!(store.get(&r2).unwrap().is_some());
        assert!(store.get(&approved).unwrap().is_some());
    }

    #[test]
    fn test_pending_kept_when_disabled() {
        let store = Arc::new(MemoryReportStore::new());
        put(&store, 0, 6, ReportStatus::PendingApproval);
        put(&store, 1, 6, ReportStatus::PendingApproval);
        put(&store, 2, 6, ReportStatus::PendingApproval);

        let policy = RetentionPolicy {
            delete_unapproved_on_start: false,
            ..RetentionPolicy::default()
        };
        let summary = manager(store.clone(), policy)
            .run(&RuntimeInfo::new(6), &LogContext::new("test"))
            .unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_old_version_deleted_regardless_of_status() {
        let store = Arc::new(MemoryReportStore::new());
        let old_pending = put(&store, 0, 5, ReportStatus::PendingApproval);
        let old_approved = put(&store, 1, 5, ReportStatus::Approved);
        let current = put(&store, 2, 6, ReportStatus::Approved);

        let summary = manager(store.clone(), RetentionPolicy::default())
            .run(&RuntimeInfo::new(6), &LogContext::new("test"))
            .unwrap();

        assert_eq!(summary.old_version_deleted, 2);
        assert_eq!(store.get(&old_pending).unwrap(), None);
        assert_eq!(store.get(&old_approved).unwrap(), None);
        assert!(store.get(&current).unwrap().is_some());
    }

    #[test]
    fn test_old_version_kept_when_disabled() {
        let store = Arc::new(MemoryReportStore::new());
        let old = put(&store, 0, 5, ReportStatus::Approved);
        let policy = RetentionPolicy {
            delete_old_unsent_on_start: false,
            ..RetentionPolicy::default()
        };
        manager(store.clone(), policy)
            .run(&RuntimeInfo::new(6), &LogContext::new("test"))
            .unwrap();
        assert!(store.get(&old).unwrap().is_some());
    }

    #[test]
    fn test_approved_capped_fifo() {
        let store = Arc::new(MemoryReportStore::new());
        let ids: Vec<ReportId> = (0..5)
            .map(|i| put(&store, i, 6, ReportStatus::Approved))
            .collect();

        let policy = RetentionPolicy {
            max_approved_kept: MaxApprovedKept::Count(2),
            ..RetentionPolicy::default()
        };
        let summary = manager(store.clone(), policy)
            .run(&RuntimeInfo::new(6), &LogContext::new("test"))
            .unwrap();

        assert_eq!(summary.approved_evicted, 3);
        let remaining: Vec<ReportId> = store
            .list_by_status(ReportStatus::Approved)
            .unwrap()
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(remaining, ids[3..].to_vec());
    }

    #[test]
    fn test_cap_of_zero_evicts_all_approved() {
        let store = Arc::new(MemoryReportStore::new());
        put(&store, 0, 6, ReportStatus::Approved);
        let pending = put(&store, 1, 6, ReportStatus::PendingApproval);

        let policy = RetentionPolicy {
            max_approved_kept: MaxApprovedKept::Count(0),
            ..RetentionPolicy::default()
        };
        manager(store.clone(), policy)
            .run(&RuntimeInfo::new(6), &LogContext::new("test"))
            .unwrap();

        assert!(store.list_by_status(ReportStatus::Approved).unwrap().is_empty());
        assert!(store.get(&pending).unwrap().is_some());
    }

    #[test]
    fn test_select_helpers_on_empty_input() {
        assert!(select_stale_unapproved(&[]).is_empty());
        assert!(select_other_versions(&[], 1).is_empty());
        assert!(select_evicted_approved(&[], MaxApprovedKept::Count(0)).is_empty());
    }
}
