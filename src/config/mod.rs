//! Configuration module.
//!
//! Built once at startup, never mutated, shared by reference
//! (`Arc<CoreConfig>`) among every component that needs it.

pub mod settings;

pub use settings::*;
