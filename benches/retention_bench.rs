//! Benchmarks for the startup retention pass.
//!
//! Measures a full three-pass retention run over an in-memory store
//! seeded with a mix of pending, approved and old-version reports.

use std::hint::black_box;
use std::sync::Arc;

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use crashlane_core::logging::LogContext;
use crashlane_core::{
    CapturedReport, CoreConfig, MaxApprovedKept, MemoryReportStore, Report, ReportFields,
    ReportStatus, ReportStore, RetentionManager, RetentionPolicy, RuntimeInfo,
};

fn seeded_store(count: usize) -> Arc<MemoryReportStore> {
    let store = Arc::new(MemoryReportStore::new());
    let base = Utc::now();
    for i in 0..count {
        let status = if i % 3 == 0 {
            ReportStatus::PendingApproval
        } else {
            ReportStatus::Approved
        };
        let version = if i % 5 == 0 { 1 } else { 2 };
        let mut fields = ReportFields::new();
        fields.push("STACK_TRACE", format!("panicked at src/worker.rs:{}:9", i));
        let report = Report::new(
            CapturedReport::new(fields, version, false)
                .with_created_at(base + Duration::milliseconds(i as i64)),
            status,
        );
        store.put(&report).unwrap();
    }
    store
}

fn bench_retention_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("retention");
    let config = Arc::new(CoreConfig {
        retention: RetentionPolicy {
            delete_unapproved_on_start: true,
            delete_old_unsent_on_start: true,
            max_approved_kept: MaxApprovedKept::Count(50),
        },
        ..CoreConfig::default()
    });
    let runtime = RuntimeInfo::new(2);
    let ctx = LogContext::new("bench");

    for size in [100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("full_pass", size), &size, |b, &size| {
            b.iter_batched(
                || seeded_store(size),
                |store| {
                    let manager = RetentionManager::new(config.clone(), store);
                    black_box(manager.run(&runtime, &ctx).unwrap());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Steady state: nothing left to delete, so only listing and selection run.
fn bench_retention_noop(c: &mut Criterion) {
    let mut group = c.benchmark_group("retention");
    let config = Arc::new(CoreConfig::default());
    let runtime = RuntimeInfo::new(2);
    let ctx = LogContext::new("bench");
    let store = seeded_store(1_000);
    let manager = RetentionManager::new(config, store);
    manager.run(&runtime, &ctx).unwrap();

    group.bench_function("noop_pass_1000", |b| {
        b.iter(|| black_box(manager.run(&runtime, &ctx).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_retention_pass, bench_retention_noop);
criterion_main!(benches);
