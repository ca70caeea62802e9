//! Approval module.
//!
//! Classifies newly captured reports and exposes the pending-approval
//! report to the host's approval UI.

pub mod gate;

pub use gate::*;
