//! Crash-safe file-backed report store.
//!
//! One envelope file per report, named `<uuid>.json`. Writes go to a
//! dot-prefixed temp file that is fsynced and then renamed over the
//! final name, so a crash leaves either the old record, the new record,
//! or (for a new report) nothing. Leftover temp files are removed when
//! the store is opened.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::report::{Report, ReportId, ReportStatus};
use crate::storage::record::{decode_record, encode_record};
use crate::storage::store::ReportStore;

const TEMP_SUFFIX: &str = ".tmp";
const QUARANTINE_SUFFIX: &str = ".corrupt";

lazy_static! {
    /// Committed record file names.
    static ref RECORD_FILE_PATTERN: Regex = Regex::new(
        r"^([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\.json$"
    ).unwrap();
}

/// Report store backed by a directory of JSON envelopes.
#[derive(Debug)]
pub struct FileReportStore {
    dir: PathBuf,
    // Serializes every mutation across threads of this process.
    write_lock: Mutex<()>,
}

impl FileReportStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let store = Self {
            dir,
            write_lock: Mutex::new(()),
        };
        let removed = store.remove_temp_files()?;

        log::info!(
            "STORE_OPENED dir={} stale_temp_files_removed={}",
            store.dir.display(),
            removed
        );
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &ReportId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn temp_path(&self, id: &ReportId) -> PathBuf {
        self.dir.join(format!(".{}.json{}", id, TEMP_SUFFIX))
    }

    fn remove_temp_files(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') && name.ends_with(TEMP_SUFFIX) {
                let path = entry.path();
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(StoreError::io(path, e)),
                }
            }
        }
        Ok(removed)
    }

    fn write_atomic(&self, report: &Report) -> Result<(), StoreError> {
        let bytes = encode_record(report)?;
        let tmp = self.temp_path(&report.id());
        let path = self.record_path(&report.id());

        let result = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)?;
            sync_dir(&self.dir)
        })();

        result.map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io(&path, e)
        })
    }

    fn read_record(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let path = self.record_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let name = id.to_string();
        let report = decode_record(&name, &bytes)?;
        if report.id() != *id {
            return Err(StoreError::Corrupt {
                id: name,
                reason: format!("record holds report {}", report.id()),
            });
        }
        Ok(Some(report))
    }

    /// Move an unreadable record aside so it stops blocking listings.
    fn quarantine(&self, id: &ReportId, reason: &StoreError) {
        let _guard = self.write_lock.lock();
        let path = self.record_path(id);
        let target = self.dir.join(format!("{}.json{}", id, QUARANTINE_SUFFIX));
        match fs::rename(&path, &target) {
            Ok(()) => log::warn!(
                "{} RECORD_QUARANTINED path={} reason={}",
                LogContext::for_report(id),
                target.display(),
                reason
            ),
            Err(e) => log::error!(
                "{} RECORD_QUARANTINE_FAILED path={} error={}",
                LogContext::for_report(id),
                path.display(),
                e
            ),
        }
    }

    fn scan(&self) -> Result<Vec<Report>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(caps) = RECORD_FILE_PATTERN.captures(&name) {
                if let Some(id) = caps.get(1).and_then(|m| ReportId::parse(m.as_str())) {
                    ids.push(id);
                }
            }
        }

        let mut reports = Vec::with_capacity(ids.len());
        for id in ids {
            match self.read_record(&id) {
                Ok(Some(report)) => reports.push(report),
                // Deleted between read_dir and read
                Ok(None) => {}
                Err(e @ StoreError::Corrupt { .. }) => self.quarantine(&id, &e),
                Err(e) => return Err(e),
            }
        }

        reports.sort_by(Report::creation_order);
        Ok(reports)
    }
}

impl ReportStore for FileReportStore {
    fn put(&self, report: &Report) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        if self.record_path(&report.id()).exists() {
            return Err(StoreError::AlreadyExists(report.id()));
        }
        self.write_atomic(report)?;
        log::debug!(
            "{} STORE_PUT status={}",
            LogContext::for_report(&report.id()),
            report.status().as_str()
        );
        Ok(())
    }

    fn get(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        self.read_record(id)
    }

    fn list_by_status(&self, status: ReportStatus) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|r| r.status() == status)
            .collect())
    }

    fn set_status(&self, id: &ReportId, status: ReportStatus) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let report = self.read_record(id)?.ok_or(StoreError::NotFound(*id))?;
        if report.status() == status {
            return Ok(());
        }
        self.write_atomic(&report.with_status(status))?;
        log::debug!(
            "{} STORE_SET_STATUS status={}",
            LogContext::for_report(id),
            status.as_str()
        );
        Ok(())
    }

    fn delete(&self, id: &ReportId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                sync_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
                log::debug!("{} STORE_DELETE", LogContext::for_report(id));
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn list_all(&self) -> Result<Vec<Report>, StoreError> {
        self.scan()
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CapturedReport, FieldValue, ReportFields};
    use chrono::{Duration, Utc};

    fn report_at(offset_secs: i64, status: ReportStatus) -> Report {
        let mut fields = ReportFields::new();
        fields.push("STACK_TRACE", format!("trace {}", offset_secs));
        Report::new(
            CapturedReport::new(fields, 4, false)
                .with_created_at(Utc::now() + Duration::seconds(offset_secs)),
            status,
        )
    }

    #[test]
    fn test_put_get_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let report = report_at(0, ReportStatus::PendingApproval);
        {
            let store = FileReportStore::open(dir.path()).unwrap();
            store.put(&report).unwrap();
        }

        let reopened = FileReportStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(&report.id()).unwrap(), Some(report));
    }

    #[test]
    fn test_put_duplicate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        let report = report_at(0, ReportStatus::Approved);
        store.put(&report).unwrap();

        let err = store.put(&report).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == report.id()));
    }

    #[test]
    fn test_list_by_status_is_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        let newest = report_at(20, ReportStatus::Approved);
        let oldest = report_at(-20, ReportStatus::Approved);
        let middle = report_at(0, ReportStatus::Approved);
        let pending = report_at(5, ReportStatus::PendingApproval);
        for r in [&newest, &oldest, &pending, &middle] {
            store.put(r).unwrap();
        }

        let approved: Vec<ReportId> = store
            .list_by_status(ReportStatus::Approved)
            .unwrap()
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(approved, vec![oldest.id(), middle.id(), newest.id()]);
        assert_eq!(store.list_all().unwrap().len(), 4);
    }

    #[test]
    fn test_set_status_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        let report = report_at(0, ReportStatus::PendingApproval);
        store.put(&report).unwrap();

        store.set_status(&report.id(), ReportStatus::Approved).unwrap();
        let stored = store.get(&report.id()).unwrap().unwrap();
        assert_eq!(stored.status(), ReportStatus::Approved);
        assert_eq!(stored.fields(), report.fields());

        let missing = ReportId::new();
        let err = store.set_status(&missing, ReportStatus::Approved).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        let report = report_at(0, ReportStatus::Approved);
        store.put(&report).unwrap();

        store.delete(&report.id()).unwrap();
        store.delete(&report.id()).unwrap();
        assert_eq!(store.get(&report.id()).unwrap(), None);
    }

    #[test]
    fn test_open_removes_stale_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let id = ReportId::new();
        let stale = dir.path().join(format!(".{}.json.tmp", id));
        fs::write(&stale, b"{\"format\":1,\"checks").unwrap();

        let store = FileReportStore::open(dir.path()).unwrap();
        assert!(!stale.exists());
        assert_eq!(store.get(&id).unwrap(), None);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_record_is_quarantined_from_listings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        let good = report_at(0, ReportStatus::Approved);
        store.put(&good).unwrap();

        let bad_id = ReportId::new();
        let bad_path = dir.path().join(format!("{}.json", bad_id));
        fs::write(&bad_path, b"garbage").unwrap();

        let err = store.get(&bad_id).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        let listed = store.list_by_status(ReportStatus::Approved).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), good.id());
        assert!(!bad_path.exists());
        assert!(dir.path().join(format!("{}.json.corrupt", bad_id)).exists());
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.txt"), b"hello").unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_float_report_stays_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::open(dir.path()).unwrap();
        let mut fields = ReportFields::new();
        fields.push("BATTERY_TEMP", f64::NAN);
        fields.push("FREE_MEMORY_RATIO", f64::INFINITY);
        let report = Report::new(CapturedReport::new(fields, 4, true), ReportStatus::Approved);

        store.put(&report).unwrap();

        let stored = store.get(&report.id()).unwrap().unwrap();
        assert!(matches!(
            stored.fields().get("BATTERY_TEMP"),
            Some(FieldValue::Float(x)) if x.is_nan()
        ));
        assert_eq!(
            stored.fields().get("FREE_MEMORY_RATIO"),
            Some(&FieldValue::Float(f64::INFINITY))
        );
        assert_eq!(store.list_by_status(ReportStatus::Approved).unwrap().len(), 1);
        assert!(!dir
            .path()
            .join(format!("{}.json.corrupt", report.id()))
            .exists());
    }
}
