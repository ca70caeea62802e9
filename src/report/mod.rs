//! Report data model.
//!
//! A report is an ordered map of named diagnostic values plus the
//! lifecycle metadata the queue needs:
//! - `model` - `Report`, `ReportId`, `ReportStatus`, `FieldValue`
//! - `fields` - catalogue of well-known field names
//! - `builder` - assembles collector output in configured order

pub mod builder;
pub mod fields;
pub mod model;

pub use builder::*;
pub use fields::*;
pub use model::*;
