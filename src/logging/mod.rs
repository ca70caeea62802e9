//! Structured logging with cycle/report context.
//!
//! Components log through the `log` facade, prefixing each event with a
//! `LogContext` so a report can be followed across capture, retention
//! and dispatch.

pub mod structured;

pub use structured::*;
