//! Report assembly.
//!
//! Collectors hand over loose named values; the builder emits them in the
//! configured content order, drops anything not configured and fills in
//! the fields it can derive itself.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::config::{CoreConfig, RuntimeInfo};
use crate::logging::structured::LogContext;
use crate::report::fields::ReportField;
use crate::report::model::{CapturedReport, FieldValue, ReportFields, ReportId};

/// Builds a `CapturedReport` from collector output.
#[derive(Debug)]
pub struct ReportBuilder<'a> {
    content: &'a [String],
    id: ReportId,
    created_at: DateTime<Utc>,
    app_version_code: i64,
    silent: bool,
    values: HashMap<String, FieldValue>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(config: &'a CoreConfig, runtime: &RuntimeInfo) -> Self {
        Self {
            content: &config.report_content,
            id: ReportId::new(),
            created_at: Utc::now(),
            app_version_code: runtime.app_version_code,
            silent: false,
            values: HashMap::new(),
        }
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn values<I, N, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<FieldValue>,
    {
        for (name, value) in values {
            self.values.insert(name.into(), value.into());
        }
        self
    }

    pub fn build(mut self) -> CapturedReport {
        let mut fields = ReportFields::new();
        let mut missing = Vec::new();
        // Hashed before collected values are moved into `fields`.
        let trace_hash = self
            .values
            .get(ReportField::StackTrace.as_str())
            .and_then(FieldValue::as_text)
            .map(stack_trace_hash);

        for name in self.content {
            let value = match self.values.remove(name) {
                Some(v) => Some(v),
                None => self.derive(name, trace_hash.as_deref()),
            };
            match value {
                Some(v) => fields.push(name.clone(), v),
                None => missing.push(name.as_str()),
            }
        }

        let ctx = LogContext::for_report(&self.id);
        if !missing.is_empty() {
            log::debug!("{} REPORT_FIELDS_MISSING fields={:?}", ctx, missing);
        }
        if !self.values.is_empty() {
            let mut dropped: Vec<&String> = self.values.keys().collect();
            dropped.sort();
            log::debug!(
                "{} REPORT_FIELDS_DROPPED fields={:?} reason=not_configured",
                ctx,
                dropped
            );
        }

        CapturedReport {
            id: self.id,
            created_at: self.created_at,
            app_version_code: self.app_version_code,
            silent: self.silent,
            fields,
        }
    }

    fn derive(&self, name: &str, trace_hash: Option<&str>) -> Option<FieldValue> {
        let field = name.parse::<ReportField>().ok()?;
        match field {
            ReportField::ReportId => Some(FieldValue::Text(self.id.to_string())),
            ReportField::AppVersionCode => Some(FieldValue::Integer(self.app_version_code)),
            ReportField::UserCrashDate => Some(FieldValue::Text(
                self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            ReportField::IsSilent => Some(FieldValue::Text(self.silent.to_string())),
            ReportField::StackTraceHash => trace_hash.map(|h| FieldValue::Text(h.to_string())),
            _ => None,
        }
    }
}

/// SHA-256 of a stack trace, hex encoded. Groups identical crashes.
pub fn stack_trace_hash(trace: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(trace.as_bytes());
    hex::encode(hasher.finalize())
}
