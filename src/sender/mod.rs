//! Sender module.
//!
//! Pluggable delivery destinations:
//! - `outcome` - per-sender delivery results
//! - `traits` - the `ReportSender` contract and the payload it receives
//! - `registry` - factories evaluated once at startup
//! - `log_sender` - built-in sender that writes reports to the log

pub mod log_sender;
pub mod outcome;
pub mod registry;
pub mod traits;

pub use log_sender::*;
pub use outcome::*;
pub use registry::*;
pub use traits::*;
