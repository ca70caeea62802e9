//! Core report types.
//!
//! These are the values persisted by the report store. A report's field
//! set is fixed once built; only its status moves, and only through the
//! store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Approval status of a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    PendingApproval,
    Approved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::PendingApproval => "pending_approval",
            ReportStatus::Approved => "approved",
        }
    }
}

/// A single collected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(#[serde(with = "float_value")] f64),
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Render for text-based senders. Binary values render as base64.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(x) => x.to_string(),
            FieldValue::Binary(bytes) => base64_bytes::encode(bytes),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(bytes: Vec<u8>) -> Self {
        FieldValue::Binary(bytes)
    }
}

/// One named value in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub value: FieldValue,
}

/// Ordered field map. Order is significant for downstream formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportFields(Vec<FieldEntry>);

impl ReportFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A name already present is replaced in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.value = value,
            None => self.0.push(FieldEntry { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<FieldValue>> FromIterator<(N, V)> for ReportFields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut fields = ReportFields::new();
        for (name, value) in iter {
            fields.push(name, value);
        }
        fields
    }
}

/// A fully assembled report as handed over by the collection side,
/// before the approval gate has assigned it a status.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedReport {
    pub id: ReportId,
    pub created_at: DateTime<Utc>,
    pub app_version_code: i64,
    pub silent: bool,
    pub fields: ReportFields,
}

impl CapturedReport {
    pub fn new(fields: ReportFields, app_version_code: i64, silent: bool) -> Self {
        Self {
            id: ReportId::new(),
            created_at: Utc::now(),
            app_version_code,
            silent,
            fields,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_id(mut self, id: ReportId) -> Self {
        self.id = id;
        self
    }
}

/// A stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    id: ReportId,
    status: ReportStatus,
    created_at: DateTime<Utc>,
    app_version_code: i64,
    silent: bool,
    fields: ReportFields,
}

impl Report {
    pub fn new(captured: CapturedReport, status: ReportStatus) -> Self {
        Self {
            id: captured.id,
            status,
            created_at: captured.created_at,
            app_version_code: captured.app_version_code,
            silent: captured.silent,
            fields: captured.fields,
        }
    }

    pub fn id(&self) -> ReportId {
        self.id
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn app_version_code(&self) -> i64 {
        self.app_version_code
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn fields(&self) -> &ReportFields {
        &self.fields
    }

    /// Status transitions are applied by stores only.
    pub(crate) fn with_status(mut self, status: ReportStatus) -> Self {
        self.status = status;
        self
    }

    /// Oldest first, ties broken by id so listings are deterministic.
    pub(crate) fn creation_order(a: &Report, b: &Report) -> std::cmp::Ordering {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(bytes: &[u8]) -> String {
        general_purpose::STANDARD.encode(bytes)
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

/// JSON has no NaN or infinity; those are written as the strings
/// `"NaN"`, `"inf"` and `"-inf"`.
mod float_value {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(x: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if x.is_nan() {
            serializer.serialize_str("NaN")
        } else if x.is_infinite() {
            serializer.serialize_str(if *x > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*x)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"NaN\", \"inf\", \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, x: f64) -> Result<f64, E> {
            Ok(x)
        }

        fn visit_i64<E: de::Error>(self, n: i64) -> Result<f64, E> {
            Ok(n as f64)
        }

        fn visit_u64<E: de::Error>(self, n: u64) -> Result<f64, E> {
            Ok(n as f64)
        }

        fn visit_str<E: de::Error>(self, s: &str) -> Result<f64, E> {
            match s {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}
