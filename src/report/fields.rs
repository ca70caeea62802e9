//! Well-known report field names.
//!
//! Hosts may configure arbitrary field names; these are the ones the
//! builder knows how to fill in or derive on its own.

use std::fmt;
use std::str::FromStr;

/// Catalogue of standard report fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    ReportId,
    AppVersionCode,
    AppVersionName,
    PackageName,
    OsVersion,
    DeviceModel,
    Build,
    StackTrace,
    StackTraceHash,
    UserAppStartDate,
    UserCrashDate,
    IsSilent,
    CustomData,
    Logcat,
    SharedPreferences,
}

impl ReportField {
    pub const ALL: &'static [ReportField] = &[
        ReportField::ReportId,
        ReportField::AppVersionCode,
        ReportField::AppVersionName,
        ReportField::PackageName,
        ReportField::OsVersion,
        ReportField::DeviceModel,
        ReportField::Build,
        ReportField::StackTrace,
        ReportField::StackTraceHash,
        ReportField::UserAppStartDate,
        ReportField::UserCrashDate,
        ReportField::IsSilent,
        ReportField::CustomData,
        ReportField::Logcat,
        ReportField::SharedPreferences,
    ];

    /// Content used when the host does not configure a field list.
    pub const DEFAULT_CONTENT: &'static [ReportField] = &[
        ReportField::ReportId,
        ReportField::AppVersionCode,
        ReportField::AppVersionName,
        ReportField::PackageName,
        ReportField::OsVersion,
        ReportField::DeviceModel,
        ReportField::StackTrace,
        ReportField::StackTraceHash,
        ReportField::UserAppStartDate,
        ReportField::UserCrashDate,
        ReportField::IsSilent,
        ReportField::CustomData,
        ReportField::Logcat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportField::ReportId => "REPORT_ID",
            ReportField::AppVersionCode => "APP_VERSION_CODE",
            ReportField::AppVersionName => "APP_VERSION_NAME",
            ReportField::PackageName => "PACKAGE_NAME",
            ReportField::OsVersion => "OS_VERSION",
            ReportField::DeviceModel => "DEVICE_MODEL",
            ReportField::Build => "BUILD",
            ReportField::StackTrace => "STACK_TRACE",
            ReportField::StackTraceHash => "STACK_TRACE_HASH",
            ReportField::UserAppStartDate => "USER_APP_START_DATE",
            ReportField::UserCrashDate => "USER_CRASH_DATE",
            ReportField::IsSilent => "IS_SILENT",
            ReportField::CustomData => "CUSTOM_DATA",
            ReportField::Logcat => "LOGCAT",
            ReportField::SharedPreferences => "SHARED_PREFERENCES",
        }
    }

    /// Default content as configured names.
    pub fn default_content_names() -> Vec<String> {
        Self::DEFAULT_CONTENT
            .iter()
            .map(|f| f.as_str().to_string())
            .collect()
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown report field: {}", s))
    }
}
