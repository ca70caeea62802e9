//! Retention module.
//!
//! Startup pruning of the report store:
//! - keep only the newest pending-approval report
//! - drop reports captured under another app version
//! - cap the number of approved reports kept

pub mod manager;

pub use manager::*;
