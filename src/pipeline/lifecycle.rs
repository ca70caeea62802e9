//! Report lifecycle entry points.
//!
//! `ReportPipeline` wires the store, approval gate, retention manager and
//! dispatch engine together and exposes the triggers the host calls from
//! its own lifecycle: report captured, application start, connectivity
//! regained, user approval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::approval::ApprovalGate;
use crate::attachment::{AttachmentProvider, AttachmentResolver, NoAttachmentProvider};
use crate::config::{CoreConfig, RuntimeInfo};
use crate::error::{ConfigError, CoreError, CoreResult};
use crate::pipeline::context::{CancellationFlag, CycleContext, CycleKind};
use crate::pipeline::dispatch::{CycleStatus, DispatchEngine, DispatchSummary};
use crate::report::{CapturedReport, Report, ReportBuilder, ReportId};
use crate::retention::{RetentionManager, RetentionSummary};
use crate::retry::RetryPolicy;
use crate::sender::{LogSenderFactory, SenderFactory, SenderRegistry};
use crate::storage::{FileReportStore, ReportStore};

/// Assembles a `ReportPipeline`.
pub struct ReportPipelineBuilder {
    config: CoreConfig,
    runtime: RuntimeInfo,
    store: Option<Arc<dyn ReportStore>>,
    registry: SenderRegistry,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    attachment_provider: Arc<dyn AttachmentProvider>,
}

impl ReportPipelineBuilder {
    pub fn new(config: CoreConfig, runtime: RuntimeInfo) -> Self {
        Self {
            config,
            runtime,
            store: None,
            registry: SenderRegistry::new(),
            retry_policy: None,
            attachment_provider: Arc::new(NoAttachmentProvider),
        }
    }

    /// Use this store instead of opening a file store at `store_dir`.
    pub fn store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn sender_factory(mut self, factory: impl SenderFactory + 'static) -> Self {
        self.registry.register(factory);
        self
    }

    /// Override the policy named in configuration.
    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn attachment_provider(mut self, provider: Arc<dyn AttachmentProvider>) -> Self {
        self.attachment_provider = provider;
        self
    }

    pub fn build(self) -> CoreResult<ReportPipeline> {
        self.config.validate()?;

        let store: Arc<dyn ReportStore> = match self.store {
            Some(store) => store,
            None => {
                let dir = self.config.store_dir.clone().ok_or_else(|| {
                    ConfigError::Invalid("store_dir is required without an explicit store".into())
                })?;
                Arc::new(FileReportStore::open(dir)?)
            }
        };

        let mut registry = self.registry;
        if registry.is_empty() {
            registry.register(LogSenderFactory);
        }
        let senders = registry.build(&self.config);
        if senders.is_empty() {
            return Err(CoreError::NoSenders);
        }

        let retry_policy = self
            .retry_policy
            .unwrap_or_else(|| self.config.retry_policy.build());
        let resolver = AttachmentResolver::new(&self.config.attachment_uris, self.attachment_provider);
        let sender_timeout = self.config.sender_timeout();

        let config = Arc::new(self.config);
        Ok(ReportPipeline {
            gate: ApprovalGate::new(config.clone(), store.clone()),
            retention: RetentionManager::new(config.clone(), store.clone()),
            engine: DispatchEngine::new(store.clone(), senders, retry_policy, resolver, sender_timeout),
            config,
            runtime: self.runtime,
            store,
            dispatch_lock: Mutex::new(()),
            cancel: CancellationFlag::new(),
        })
    }
}

/// The report lifecycle engine.
pub struct ReportPipeline {
    config: Arc<CoreConfig>,
    runtime: RuntimeInfo,
    store: Arc<dyn ReportStore>,
    gate: ApprovalGate,
    retention: RetentionManager,
    engine: DispatchEngine,
    // One dispatch cycle at a time, oldest report first.
    dispatch_lock: Mutex<()>,
    cancel: CancellationFlag,
}

impl ReportPipeline {
    pub fn builder(config: CoreConfig, runtime: RuntimeInfo) -> ReportPipelineBuilder {
        ReportPipelineBuilder::new(config, runtime)
    }

    pub fn config(&self) -> &Arc<CoreConfig> {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeInfo {
        &self.runtime
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Builder bound to this pipeline's field list and app version.
    pub fn report_builder(&self) -> ReportBuilder<'_> {
        ReportBuilder::new(&self.config, &self.runtime)
    }

    /// Persist a freshly captured report, approved or pending.
    pub fn on_report_captured(&self, captured: CapturedReport) -> CoreResult<Report> {
        let ctx = CycleContext::new(CycleKind::Capture);
        Ok(self.gate.admit(captured, &ctx.log_context())?)
    }

    /// Startup pruning. Run before the first dispatch cycle.
    pub fn run_retention_pass(&self) -> CoreResult<RetentionSummary> {
        let ctx = CycleContext::new(CycleKind::Retention);
        Ok(self.retention.run(&self.runtime, &ctx.log_context())?)
    }

    /// Drain approved reports. Concurrent calls queue behind each other.
    pub fn run_dispatch_cycle(&self) -> CoreResult<DispatchSummary> {
        let ctx = CycleContext::new(CycleKind::Dispatch);

        if self.runtime.debuggable && !self.config.send_reports_in_dev_mode {
            log::info!(
                "{} DISPATCH_SKIPPED reason=dev_mode",
                ctx.log_context()
            );
            return Ok(DispatchSummary::new(&ctx.cycle_id, CycleStatus::SkippedDevMode));
        }

        let _guard = self.dispatch_lock.lock();
        self.cancel.reset();
        self.engine.run_cycle(&ctx, &self.cancel).map_err(|e| {
            log::error!("{} DISPATCH_ABORTED error={}", ctx.log_context(), e);
            CoreError::from(e)
        })
    }

    /// Run a dispatch cycle on a background worker thread.
    pub fn spawn_dispatch(self: &Arc<Self>) -> std::io::Result<JoinHandle<CoreResult<DispatchSummary>>> {
        let pipeline = Arc::clone(self);
        thread::Builder::new()
            .name("report-dispatch".to_string())
            .spawn(move || pipeline.run_dispatch_cycle())
    }

    /// Stop the running dispatch cycle before its next report. The report
    /// currently being sent finishes its attempts.
    pub fn cancel_dispatch(&self) {
        self.cancel.cancel();
    }

    /// Application start: retention pass, then a dispatch cycle.
    pub fn on_application_start(&self) -> CoreResult<(RetentionSummary, DispatchSummary)> {
        let retention = self.run_retention_pass()?;
        let dispatch = self.run_dispatch_cycle()?;
        Ok((retention, dispatch))
    }

    pub fn pending_approval(&self) -> CoreResult<Option<Report>> {
        Ok(self.gate.pending_approval()?)
    }

    pub fn approve(&self, id: &ReportId) -> CoreResult<()> {
        Ok(self.gate.approve(id)?)
    }

    pub fn reject(&self, id: &ReportId) -> CoreResult<()> {
        Ok(self.gate.reject(id)?)
    }
}
