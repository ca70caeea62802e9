//! Static engine settings and runtime facts.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::report::fields::ReportField;
use crate::retry::RetryPolicyKind;

/// Default bound on a single sender attempt.
pub const DEFAULT_SENDER_TIMEOUT_MS: u64 = 30_000;

/// How many approved reports survive a retention pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MaxApprovedKept {
    #[default]
    Unlimited,
    Count(usize),
}

impl TryFrom<i64> for MaxApprovedKept {
    type Error = String;

    /// Negative values mean unlimited.
    fn try_from(n: i64) -> Result<Self, Self::Error> {
        if n < 0 {
            return Ok(MaxApprovedKept::Unlimited);
        }
        usize::try_from(n)
            .map(MaxApprovedKept::Count)
            .map_err(|e| format!("max_approved_kept out of range: {}", e))
    }
}

impl From<MaxApprovedKept> for i64 {
    fn from(value: MaxApprovedKept) -> Self {
        match value {
            MaxApprovedKept::Unlimited => -1,
            MaxApprovedKept::Count(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for MaxApprovedKept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxApprovedKept::Unlimited => f.write_str("unlimited"),
            MaxApprovedKept::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Startup pruning switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub delete_unapproved_on_start: bool,
    pub delete_old_unsent_on_start: bool,
    pub max_approved_kept: MaxApprovedKept,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            delete_unapproved_on_start: true,
            delete_old_unsent_on_start: true,
            max_approved_kept: MaxApprovedKept::Unlimited,
        }
    }
}

/// Whether non-silent reports wait for an external approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Non-silent reports wait in PendingApproval.
    #[default]
    Prompt,
    /// No approval UI: every report is approved at capture.
    Automatic,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub report_content: Vec<String>,
    pub retention: RetentionPolicy,
    pub approval_mode: ApprovalMode,
    pub retry_policy: RetryPolicyKind,
    pub send_reports_in_dev_mode: bool,
    pub sender_timeout_ms: u64,
    pub attachment_uris: Vec<String>,
    pub store_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            report_content: ReportField::default_content_names(),
            retention: RetentionPolicy::default(),
            approval_mode: ApprovalMode::default(),
            retry_policy: RetryPolicyKind::default(),
            send_reports_in_dev_mode: true,
            sender_timeout_ms: DEFAULT_SENDER_TIMEOUT_MS,
            attachment_uris: Vec::new(),
            store_dir: None,
        }
    }
}

impl CoreConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sender_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "sender_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.report_content.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "report_content contains an empty field name".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for name in &self.report_content {
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "report_content lists {} more than once",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn sender_timeout(&self) -> Duration {
        Duration::from_millis(self.sender_timeout_ms)
    }
}

/// Facts about the running application, supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub app_version_code: i64,
    pub debuggable: bool,
}

impl RuntimeInfo {
    pub fn new(app_version_code: i64) -> Self {
        Self {
            app_version_code,
            debuggable: false,
        }
    }

    pub fn debuggable(mut self, debuggable: bool) -> Self {
        self.debuggable = debuggable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert!(config.retention.delete_unapproved_on_start);
        assert!(config.retention.delete_old_unsent_on_start);
        assert_eq!(config.retention.max_approved_kept, MaxApprovedKept::Unlimited);
        assert_eq!(config.approval_mode, ApprovalMode::Prompt);
        assert_eq!(config.sender_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_json() {
        let config = CoreConfig::from_json_str(
            r#"{
                "retention": { "delete_unapproved_on_start": false, "max_approved_kept": 5 },
                "approval_mode": "automatic",
                "retry_policy": "never",
                "attachment_uris": ["file:///tmp/app.log"]
            }"#,
        )
        .unwrap();

        assert!(!config.retention.delete_unapproved_on_start);
        assert!(config.retention.delete_old_unsent_on_start);
        assert_eq!(config.retention.max_approved_kept, MaxApprovedKept::Count(5));
        assert_eq!(config.approval_mode, ApprovalMode::Automatic);
        assert_eq!(config.retry_policy, RetryPolicyKind::Never);
        assert_eq!(config.attachment_uris.len(), 1);
        assert_eq!(config.report_content, ReportField::default_content_names());
    }

    #[test]
    fn test_negative_max_approved_is_unlimited() {
        let config =
            CoreConfig::from_json_str(r#"{"retention": {"max_approved_kept": -1}}"#).unwrap();
        assert_eq!(config.retention.max_approved_kept, MaxApprovedKept::Unlimited);
        assert_eq!(i64::from(MaxApprovedKept::Unlimited), -1);
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let err = CoreConfig::from_json_str(r#"{"sender_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validation_rejects_duplicate_fields() {
        let err = CoreConfig::from_json_str(r#"{"report_content": ["STACK_TRACE", "STACK_TRACE"]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = CoreConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
