//! Storage module.
//!
//! The report store exclusively owns report persistence. Every other
//! component reads and mutates reports through `ReportStore` only.
//! - `store` - the `ReportStore` contract
//! - `record` - on-disk record envelope (checksummed JSON)
//! - `file_store` - crash-safe one-file-per-report store
//! - `memory_store` - in-process store for embedding and tests

pub mod file_store;
pub mod memory_store;
pub mod record;
pub mod store;

pub use file_store::*;
pub use memory_store::*;
pub use record::*;
pub use store::*;
