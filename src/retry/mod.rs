//! Retry policy module.
//!
//! Decides, from the complete set of per-sender outcomes, whether a report
//! that was not delivered everywhere stays queued for a later cycle.

pub mod policy;

pub use policy::*;
