//! Attachment module.
//!
//! Attachments are referenced by URI and only read at send time; their
//! bytes are never persisted with the report.

pub mod resolver;

pub use resolver::*;
