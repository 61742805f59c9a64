// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use branch_import::{AreaStore, Cancellation, ImportError, ImportOptions, ImportSource};
use branch_import_domain::geometry::square;
use branch_import_domain::{AreaType, CodeType, Generation, GenerationRange, ImportResult, NewArea};
use branch_import_persistence::{Persistence, PersistenceError, ProgressStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::queue::{ImportJob, ImportQueue, JobError, QueueConfig};
use crate::tests::ScratchDatabases;

fn config(retries: u32) -> QueueConfig {
    QueueConfig {
        capacity: 4,
        timeout: Duration::from_secs(5),
        retries,
    }
}

fn created(n: u32) -> ImportResult {
    ImportResult {
        created: n,
        ..ImportResult::default()
    }
}

/// A job that fails with `error` until it has been called `failures` times.
fn flaky_job(calls: &Arc<AtomicU32>, failures: u32, error: fn() -> JobError) -> ImportJob {
    let calls: Arc<AtomicU32> = Arc::clone(calls);
    ImportJob::new("flaky", move |_| {
        let call: u32 = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= failures {
            Err(error())
        } else {
            Ok(created(call))
        }
    })
}

fn query_failed() -> JobError {
    JobError::Persistence(PersistenceError::QueryFailed(String::from("database is locked")))
}

#[tokio::test]
async fn test_job_result_is_returned() {
    let queue: ImportQueue = ImportQueue::start(config(0));

    let result: ImportResult = queue
        .run(ImportJob::new("one", |_| Ok(created(7))))
        .await
        .unwrap();
    queue.shutdown().await;

    assert_eq!(result.created, 7);
}

#[tokio::test]
async fn test_failed_attempt_is_retried_from_scratch() {
    let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let queue: ImportQueue = ImportQueue::start(config(2));

    let result: ImportResult = queue
        .run(flaky_job(&calls, 1, query_failed))
        .await
        .unwrap();
    queue.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.created, 2);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let queue: ImportQueue = ImportQueue::start(config(2));

    let err: JobError = queue
        .run(flaky_job(&calls, u32::MAX, query_failed))
        .await
        .unwrap_err();
    queue.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.to_string(), "Query failed: database is locked");
}

#[tokio::test]
async fn test_generation_error_is_not_retried() {
    let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let queue: ImportQueue = ImportQueue::start(config(2));

    let err: JobError = queue
        .run(flaky_job(&calls, u32::MAX, || {
            JobError::Import(ImportError::Generation(String::from(
                "Invalid generation number specified",
            )))
        }))
        .await
        .unwrap_err();
    queue.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!err.is_retryable());
}

/// Blocks until the attempt is cancelled, then reports the cancellation.
fn wait_for_cancel(cancellation: &Cancellation) -> Result<ImportResult, JobError> {
    while !cancellation.is_cancelled() {
        std::thread::sleep(Duration::from_millis(5));
    }
    Err(ImportError::Cancelled.into())
}

#[tokio::test]
async fn test_timed_out_attempt_stops_before_retry() {
    let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let active: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let peak: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let queue: ImportQueue = ImportQueue::start(QueueConfig {
        capacity: 1,
        timeout: Duration::from_millis(50),
        retries: 1,
    });

    let job: ImportJob = {
        let calls: Arc<AtomicU32> = Arc::clone(&calls);
        let active: Arc<AtomicU32> = Arc::clone(&active);
        let peak: Arc<AtomicU32> = Arc::clone(&peak);
        ImportJob::new("slow", move |cancellation| {
            let now: u32 = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            let outcome = if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                wait_for_cancel(cancellation)
            } else {
                Ok(created(1))
            };
            std::thread::sleep(Duration::from_millis(20));
            active.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    };

    let result: ImportResult = queue.run(job).await.unwrap();
    queue.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(result.created, 1);
}

#[tokio::test]
async fn test_timeout_is_reported_when_retries_run_out() {
    let queue: ImportQueue = ImportQueue::start(QueueConfig {
        capacity: 1,
        timeout: Duration::from_millis(20),
        retries: 0,
    });

    let err: JobError = queue
        .run(ImportJob::new("stuck", wait_for_cancel))
        .await
        .unwrap_err();
    queue.shutdown().await;

    assert!(matches!(err, JobError::TimedOut(_)));
}

#[tokio::test]
async fn test_attempt_finishing_after_timeout_keeps_its_result() {
    let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let counter: Arc<AtomicU32> = Arc::clone(&calls);
    let queue: ImportQueue = ImportQueue::start(QueueConfig {
        capacity: 1,
        timeout: Duration::from_millis(20),
        retries: 1,
    });

    let result: ImportResult = queue
        .run(ImportJob::new("late", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            Ok(created(4))
        }))
        .await
        .unwrap();
    queue.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.created, 4);
}

#[tokio::test]
async fn test_panicked_attempt_is_retried() {
    let calls: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let counter: Arc<AtomicU32> = Arc::clone(&calls);
    let queue: ImportQueue = ImportQueue::start(config(1));

    let result: ImportResult = queue
        .run(ImportJob::new("panics", move |_| {
            assert!(
                counter.fetch_add(1, Ordering::SeqCst) > 0,
                "first attempt blows up"
            );
            Ok(created(1))
        }))
        .await
        .unwrap();
    queue.shutdown().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.created, 1);
}

#[tokio::test]
async fn test_jobs_run_one_at_a_time() {
    let active: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let peak: Arc<AtomicU32> = Arc::new(AtomicU32::new(0));
    let queue: ImportQueue = ImportQueue::start(config(0));

    let mut outcomes = Vec::new();
    for n in 0..4 {
        let active: Arc<AtomicU32> = Arc::clone(&active);
        let peak: Arc<AtomicU32> = Arc::clone(&peak);
        let job: ImportJob = ImportJob::new(format!("job-{n}"), move |_| {
            let now: u32 = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(created(n))
        });
        outcomes.push(queue.submit(job).await.unwrap());
    }

    let mut results: Vec<u32> = Vec::new();
    for outcome in outcomes {
        results.push(outcome.await.unwrap().unwrap().created);
    }
    queue.shutdown().await;

    assert_eq!(results, vec![0, 1, 2, 3]);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

fn seed_catalogue(scratch: &ScratchDatabases) {
    let mut persistence: Persistence = Persistence::new_with_file(&scratch.database).unwrap();
    let generation: Generation = persistence.new_generation("initial").unwrap();
    persistence.activate_generation(generation.id()).unwrap();

    let ward: i64 = persistence
        .create_area(&NewArea {
            name: String::from("Ward One"),
            area_type: AreaType::Other(String::from("UTW")),
            parent_id: None,
            generations: GenerationRange::single(generation.id()),
        })
        .unwrap();
    persistence.upsert_code(ward, CodeType::Gss, "W1").unwrap();
    persistence
        .insert_polygons(ward, &[square(0.0, 0.0, 1000.0)])
        .unwrap();
}

#[tokio::test]
async fn test_catalogue_job_imports_and_reports_progress() {
    let scratch: ScratchDatabases = ScratchDatabases::new("catalogue");
    seed_catalogue(&scratch);
    let text: &str = "area_type,area_id,area_name,area_gss,gss_code,parent_gss_code\n\
                      LR,1,North,LR_1,W1,\n";
    let csv_path = scratch.database.with_extension("csv");
    std::fs::write(&csv_path, text).unwrap();

    let queue: ImportQueue = ImportQueue::start(config(0));
    let result: ImportResult = queue
        .run(ImportJob::catalogue(
            scratch.database.clone(),
            scratch.progress.clone(),
            ImportSource::from(csv_path.clone()),
            ImportOptions {
                commit: true,
                task_id: Some(String::from("cli-1")),
                ..ImportOptions::default()
            },
        ))
        .await
        .unwrap();
    queue.shutdown().await;
    let _ = std::fs::remove_file(&csv_path);

    assert_eq!(result.created, 1);
    assert!(result.warnings.is_empty());

    let mut persistence: Persistence = Persistence::new_with_file(&scratch.database).unwrap();
    assert!(persistence.get_area_by_gss("LR_1").unwrap().is_some());

    let mut progress: ProgressStore = ProgressStore::new_with_file(&scratch.progress).unwrap();
    assert_eq!(
        progress.get("cli-1").unwrap().unwrap().message,
        "Import complete, changes committed"
    );
}

#[tokio::test]
async fn test_catalogue_job_without_task_id_skips_progress_database() {
    let scratch: ScratchDatabases = ScratchDatabases::new("no-progress");
    seed_catalogue(&scratch);

    let queue: ImportQueue = ImportQueue::start(config(0));
    let result: ImportResult = queue
        .run(ImportJob::catalogue(
            scratch.database.clone(),
            scratch.progress.clone(),
            ImportSource::from("area_type,area_id,area_name,area_gss,gss_code,parent_gss_code\n"),
            ImportOptions::default(),
        ))
        .await
        .unwrap();
    queue.shutdown().await;

    assert_eq!(result, ImportResult::default());
    assert!(!scratch.progress.exists());
}
