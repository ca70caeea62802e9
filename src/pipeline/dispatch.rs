//! Dispatch engine.
//!
//! Drains approved reports oldest first, one report at a time:
//! 1. Resolve attachments (best effort)
//! 2. Attempt every sender in configured order, each bounded by a timeout
//! 3. All succeeded -> delete the report
//! 4. Otherwise ask the retry policy: keep it Approved, or delete it
//!
//! Sender failures are outcomes, not errors. Only store failures end a
//! cycle early; the report in hand keeps its last committed state.
//!
//! An attempt that overruns its timeout is not interrupted. Until it
//! returns, that sender is reported as a recoverable failure instead of
//! being handed another report, so each sender has at most one attempt
//! running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::attachment::AttachmentResolver;
use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::pipeline::context::{CancellationFlag, CycleContext};
use crate::report::{Report, ReportId, ReportStatus};
use crate::retry::RetryPolicy;
use crate::sender::{DeliveryOutcome, FailureKind, ReportPayload, ReportSender, SenderOutcome};
use crate::storage::ReportStore;

/// Terminal or non-terminal result for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDisposition {
    /// Every sender succeeded; report deleted.
    Delivered,
    /// Retry policy kept the report for a later cycle.
    RetainedForRetry,
    /// Retry policy declined; report deleted.
    Abandoned,
    /// Report vanished or lost its approval before processing.
    Skipped,
}

impl ReportDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportDisposition::Delivered => "delivered",
            ReportDisposition::RetainedForRetry => "retained_for_retry",
            ReportDisposition::Abandoned => "abandoned",
            ReportDisposition::Skipped => "skipped",
        }
    }
}

/// Result of processing a single report.
#[derive(Debug, Clone)]
pub struct ReportResult {
    pub report_id: ReportId,
    pub disposition: ReportDisposition,
    pub outcomes: Vec<SenderOutcome>,
    pub attachments_sent: usize,
    pub attachments_dropped: usize,
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Completed,
    Cancelled,
    /// Debuggable build with dev-mode sending disabled.
    SkippedDevMode,
    /// No sender enabled; reports left untouched.
    SkippedNoSenders,
}

/// Result of a dispatch cycle.
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    pub cycle_id: String,
    pub status: CycleStatus,
    pub reports: Vec<ReportResult>,
}

impl DispatchSummary {
    pub fn new(cycle_id: &str, status: CycleStatus) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            status,
            reports: Vec::new(),
        }
    }

    pub fn count(&self, disposition: ReportDisposition) -> usize {
        self.reports
            .iter()
            .filter(|r| r.disposition == disposition)
            .count()
    }

    pub fn delivered(&self) -> usize {
        self.count(ReportDisposition::Delivered)
    }

    pub fn retained(&self) -> usize {
        self.count(ReportDisposition::RetainedForRetry)
    }

    pub fn abandoned(&self) -> usize {
        self.count(ReportDisposition::Abandoned)
    }
}

/// A sender plus whether one of its attempts is still running.
struct SenderSlot {
    sender: Arc<dyn ReportSender>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the attempt ends, panics included.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct DispatchEngine {
    store: Arc<dyn ReportStore>,
    senders: Vec<SenderSlot>,
    retry_policy: Arc<dyn RetryPolicy>,
    resolver: AttachmentResolver,
    sender_timeout: Duration,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn ReportStore>,
        senders: Vec<Arc<dyn ReportSender>>,
        retry_policy: Arc<dyn RetryPolicy>,
        resolver: AttachmentResolver,
        sender_timeout: Duration,
    ) -> Self {
        let senders = senders
            .into_iter()
            .map(|sender| SenderSlot {
                sender,
                in_flight: Arc::new(AtomicBool::new(false)),
            })
            .collect();
        Self {
            store,
            senders,
            retry_policy,
            resolver,
            sender_timeout,
        }
    }

    pub fn sender_names(&self) -> Vec<&str> {
        self.senders.iter().map(|slot| slot.sender.name()).collect()
    }

    /// Process every report that is Approved when the cycle starts.
    pub fn run_cycle(
        &self,
        ctx: &CycleContext,
        cancel: &CancellationFlag,
    ) -> Result<DispatchSummary, StoreError> {
        let log_ctx = ctx.log_context();

        if self.senders.is_empty() {
            log::warn!("{} DISPATCH_SKIPPED reason=no_senders", log_ctx);
            return Ok(DispatchSummary::new(&ctx.cycle_id, CycleStatus::SkippedNoSenders));
        }

        let queue = self.store.list_by_status(ReportStatus::Approved)?;
        log::info!(
            "{} DISPATCH_START queued={} senders={:?} retry_policy={}",
            log_ctx,
            queue.len(),
            self.sender_names(),
            self.retry_policy.name()
        );

        let mut summary = DispatchSummary::new(&ctx.cycle_id, CycleStatus::Completed);
        for queued in queue {
            if cancel.is_cancelled() {
                log::info!(
                    "{} DISPATCH_CANCELLED processed={}",
                    log_ctx,
                    summary.reports.len()
                );
                summary.status = CycleStatus::Cancelled;
                break;
            }

            let report_ctx = ctx.report_log_context(&queued.id());
            let result = match self.store.get(&queued.id())? {
                Some(current) if current.status() == ReportStatus::Approved => {
                    self.process_report(&current, &report_ctx)?
                }
                _ => {
                    log::debug!("{} REPORT_SKIPPED reason=no_longer_approved", report_ctx);
                    ReportResult {
                        report_id: queued.id(),
                        disposition: ReportDisposition::Skipped,
                        outcomes: Vec::new(),
                        attachments_sent: 0,
                        attachments_dropped: 0,
                    }
                }
            };
            summary.reports.push(result);
        }

        log::info!(
            "{} DISPATCH_COMPLETE status={:?} delivered={} retained={} abandoned={} skipped={}",
            log_ctx,
            summary.status,
            summary.delivered(),
            summary.retained(),
            summary.abandoned(),
            summary.count(ReportDisposition::Skipped)
        );
        Ok(summary)
    }

    fn process_report(&self, report: &Report, ctx: &LogContext) -> Result<ReportResult, StoreError> {
        let resolution = self.resolver.resolve(report, ctx);
        let attachments_dropped = resolution.failures.len();
        let payload = Arc::new(ReportPayload::new(report, resolution.attachments));
        let attachments_sent = payload.attachments.len();

        let outcomes: Vec<SenderOutcome> = self
            .senders
            .iter()
            .map(|slot| self.attempt(slot, &payload, ctx))
            .collect();

        let disposition = if outcomes.iter().all(|o| o.outcome.is_success()) {
            ReportDisposition::Delivered
        } else if self.retry_policy.should_retry(report, &outcomes) {
            ReportDisposition::RetainedForRetry
        } else {
            ReportDisposition::Abandoned
        };

        if disposition != ReportDisposition::RetainedForRetry {
            if let Err(e) = self.store.delete(&report.id()) {
                log::error!(
                    "{} REPORT_DELETE_FAILED disposition={} error={}",
                    ctx,
                    disposition.as_str(),
                    e
                );
                return Err(e);
            }
        }

        log::info!(
            "{} REPORT_DISPOSITION disposition={} outcomes={:?} attachments={} attachments_dropped={}",
            ctx,
            disposition.as_str(),
            outcomes
                .iter()
                .map(|o| format!("{}:{}", o.sender, o.outcome.as_str()))
                .collect::<Vec<_>>(),
            attachments_sent,
            attachments_dropped
        );

        Ok(ReportResult {
            report_id: report.id(),
            disposition,
            outcomes,
            attachments_sent,
            attachments_dropped,
        })
    }

    /// Run one sender on a worker thread and wait at most the timeout.
    fn attempt(
        &self,
        slot: &SenderSlot,
        payload: &Arc<ReportPayload>,
        ctx: &LogContext,
    ) -> SenderOutcome {
        let sender = &slot.sender;
        let started = Instant::now();
        let outcome = if slot
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            DeliveryOutcome::Failure {
                kind: FailureKind::Recoverable,
                reason: "previous attempt still running".to_string(),
            }
        } else {
            self.run_bounded(slot, payload)
        };

        let elapsed = started.elapsed();
        match &outcome {
            DeliveryOutcome::Failure { kind, reason } => log::warn!(
                "{} SEND_FAILED sender={} kind={} reason={} elapsed_ms={}",
                ctx,
                sender.name(),
                kind.as_str(),
                reason,
                elapsed.as_millis()
            ),
            DeliveryOutcome::Success => log::debug!(
                "{} SEND_OK sender={} elapsed_ms={}",
                ctx,
                sender.name(),
                elapsed.as_millis()
            ),
        }

        SenderOutcome {
            sender: sender.name().to_string(),
            outcome,
            elapsed,
        }
    }

    /// Caller has set the slot's in-flight flag; the worker clears it.
    fn run_bounded(&self, slot: &SenderSlot, payload: &Arc<ReportPayload>) -> DeliveryOutcome {
        let (tx, rx) = mpsc::channel();
        let guard = InFlightGuard(Arc::clone(&slot.in_flight));
        let worker_sender = Arc::clone(&slot.sender);
        let worker_payload = Arc::clone(payload);

        let spawned = thread::Builder::new()
            .name(format!("report-send-{}", slot.sender.name()))
            .spawn(move || {
                // Locals drop in reverse: on panic the flag clears before
                // the channel disconnects.
                let tx = tx;
                let guard = guard;
                let result = worker_sender.send(&worker_payload);
                drop(guard);
                let _ = tx.send(result);
            });

        match spawned {
            Err(e) => DeliveryOutcome::Failure {
                kind: FailureKind::Recoverable,
                reason: format!("could not start send attempt: {}", e),
            },
            Ok(_) => match rx.recv_timeout(self.sender_timeout) {
                Ok(result) => DeliveryOutcome::from_result(result),
                Err(RecvTimeoutError::Timeout) => DeliveryOutcome::timed_out(self.sender_timeout),
                Err(RecvTimeoutError::Disconnected) => DeliveryOutcome::Failure {
                    kind: FailureKind::Recoverable,
                    reason: "sender panicked".to_string(),
                },
            },
        }
    }
}
