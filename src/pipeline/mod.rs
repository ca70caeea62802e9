//! Pipeline orchestration module.
//!
//! Report lifecycle that coordinates:
//! - Approval classification on capture
//! - Startup retention
//! - Dispatch to every configured sender
//! - Retry decisions

pub mod context;
pub mod dispatch;
pub mod lifecycle;

pub use context::*;
pub use dispatch::*;
pub use lifecycle::*;
