//! Crashlane Core - crash report lifecycle engine
//!
//! Takes fully assembled crash/error reports from the moment they are
//! captured to the moment they are durably delivered or abandoned. The
//! implementation prioritizes:
//!
//! 1. **Durability** - Reports survive process crashes and restarts
//! 2. **Logging** - Every decision point logged with cycle/report context
//! 3. **Isolation** - One failing sender or attachment never blocks the rest
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `storage` - Crash-safe report persistence
//! - `approval` - Auto-approval vs. external approval of new reports
//! - `retention` - Startup pruning of stale and excess reports
//! - `retry` - Pluggable retry decisions
//! - `sender` - Pluggable delivery destinations
//! - `attachment` - Lazy attachment resolution
//! - `pipeline` - Dispatch engine and lifecycle entry points
//! - `report` - Report data model and builder
//! - `config` - Immutable engine configuration
//! - `logging` - Structured logging with cycle context
//!
//! ## Usage
//!
//! ```no_run
//! use crashlane_core::{CoreConfig, ReportPipeline, RuntimeInfo};
//!
//! # fn main() -> Result<(), crashlane_core::CoreError> {
//! crashlane_core::init_logging();
//!
//! let config = CoreConfig {
//!     store_dir: Some("/var/lib/myapp/reports".into()),
//!     ..CoreConfig::default()
//! };
//! let pipeline = ReportPipeline::builder(config, RuntimeInfo::new(42)).build()?;
//! pipeline.run_retention_pass()?;
//!
//! let report = pipeline
//!     .report_builder()
//!     .value("STACK_TRACE", "thread 'main' panicked at src/main.rs:3:5")
//!     .build();
//! pipeline.on_report_captured(report)?;
//!
//! if let Some(pending) = pipeline.pending_approval()? {
//!     pipeline.approve(&pending.id())?;
//! }
//! pipeline.run_dispatch_cycle()?;
//! # Ok(())
//! # }
//! ```

pub mod approval;
pub mod attachment;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod retention;
pub mod retry;
pub mod sender;
pub mod storage;

pub use approval::ApprovalGate;
pub use attachment::{AttachmentProvider, AttachmentRef, AttachmentResolver, ResolvedAttachment};
pub use config::{ApprovalMode, CoreConfig, MaxApprovedKept, RetentionPolicy, RuntimeInfo};
pub use error::{AttachmentError, ConfigError, CoreError, CoreResult, SenderError, StoreError};
pub use pipeline::{
    CycleStatus, DispatchEngine, DispatchSummary, ReportDisposition, ReportPipeline,
    ReportPipelineBuilder,
};
pub use report::{CapturedReport, FieldValue, Report, ReportBuilder, ReportField, ReportFields, ReportId, ReportStatus};
pub use retention::{RetentionManager, RetentionSummary};
pub use retry::{DefaultRetryPolicy, NeverRetryPolicy, RetryPolicy, RetryPolicyKind};
pub use sender::{
    DeliveryOutcome, FailureKind, LogSender, LogSenderFactory, ReportPayload, ReportSender,
    SenderFactory, SenderOutcome, SenderRegistry,
};
pub use storage::{FileReportStore, MemoryReportStore, ReportStore};

/// Install the default `env_logger` backend (Info level, millisecond
/// timestamps). Safe to call more than once; hosts with their own logger
/// can skip it.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
