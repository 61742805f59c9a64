// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Single-worker queue for import jobs.
//!
//! Jobs go through a bounded channel to exactly one worker, so two imports
//! never write to the catalogue at the same time. Each attempt runs the
//! whole pipeline on the blocking pool under a timeout. A failed, timed-out
//! or panicked attempt is retried from scratch, up to a fixed count.
//!
//! When an attempt times out its cancellation is fired and the worker waits
//! for the blocking task to return before doing anything else, so attempts
//! never overlap. The import stops at its next checkpoint and rolls back. An
//! attempt that finishes anyway keeps its result.

use branch_import::{
    Cancellation, ImportError, ImportOptions, ImportSource, ProgressSink, import_branches,
};
use branch_import_domain::ImportResult;
use branch_import_persistence::{Persistence, PersistenceError, ProgressStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Queue settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// How many jobs may wait before `submit` blocks.
    pub capacity: usize,
    /// Upper bound on one attempt.
    pub timeout: Duration,
    /// Attempts made after the first one fails.
    pub retries: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            timeout: Duration::from_secs(3600),
            retries: 2,
        }
    }
}

/// Why a job produced no `ImportResult`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Import timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Import worker panicked: {0}")]
    Panicked(String),
    #[error("Import queue is closed")]
    QueueClosed,
}

impl JobError {
    /// Whether another attempt could succeed.
    ///
    /// A bad generation or an unreadable file fails the same way every time.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Import(ImportError::Generation(_) | ImportError::Input(_)) | Self::QueueClosed
        )
    }
}

type Work = dyn Fn(&Cancellation) -> Result<ImportResult, JobError> + Send + Sync;

/// One unit of work for the queue.
///
/// The work closure is called once per attempt and must start from scratch
/// each time. It should return soon after the attempt's cancellation fires.
#[derive(Clone)]
pub struct ImportJob {
    label: String,
    work: Arc<Work>,
}

impl std::fmt::Debug for ImportJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportJob")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ImportJob {
    pub fn new<F>(label: impl Into<String>, work: F) -> Self
    where
        F: Fn(&Cancellation) -> Result<ImportResult, JobError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            work: Arc::new(work),
        }
    }

    /// A job that imports `source` into the catalogue at `database`.
    ///
    /// Every attempt opens fresh connections. Progress goes to
    /// `progress_database` when the options carry a task id.
    #[must_use]
    pub fn catalogue(
        database: PathBuf,
        progress_database: PathBuf,
        source: ImportSource,
        options: ImportOptions,
    ) -> Self {
        let label: String = options
            .task_id
            .clone()
            .unwrap_or_else(|| String::from("import"));

        Self::new(label, move |cancellation| {
            let options: ImportOptions = ImportOptions {
                cancellation: cancellation.clone(),
                ..options.clone()
            };
            let mut persistence: Persistence = Persistence::new_with_file(&database)?;
            let mut progress: Option<ProgressStore> = match options.task_id {
                Some(_) => Some(ProgressStore::new_with_file(&progress_database)?),
                None => None,
            };

            let sink = progress
                .as_mut()
                .map(|store| store as &mut dyn ProgressSink);
            Ok(import_branches(&mut persistence, &source, &options, sink)?)
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

struct Envelope {
    job: ImportJob,
    reply: oneshot::Sender<Result<ImportResult, JobError>>,
}

/// Handle to a running queue.
pub struct ImportQueue {
    sender: mpsc::Sender<Envelope>,
    worker: JoinHandle<()>,
}

impl ImportQueue {
    /// Starts the worker on the current runtime.
    #[must_use]
    pub fn start(config: QueueConfig) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(config.capacity.max(1));

        let worker: JoinHandle<()> = tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                let outcome = run_with_retries(&envelope.job, &config).await;
                if envelope.reply.send(outcome).is_err() {
                    warn!(job = envelope.job.label(), "Job submitter went away");
                }
            }
            info!("Import queue drained");
        });

        Self { sender, worker }
    }

    /// Enqueues a job, waiting while the queue is full.
    ///
    /// The returned receiver yields the job's final outcome.
    ///
    /// # Errors
    ///
    /// Returns `JobError::QueueClosed` if the worker has stopped.
    pub async fn submit(
        &self,
        job: ImportJob,
    ) -> Result<oneshot::Receiver<Result<ImportResult, JobError>>, JobError> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(Envelope { job, reply })
            .await
            .map_err(|_| JobError::QueueClosed)?;
        Ok(outcome)
    }

    /// Enqueues a job and waits for its outcome.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt, or `JobError::QueueClosed`.
    pub async fn run(&self, job: ImportJob) -> Result<ImportResult, JobError> {
        self.submit(job)
            .await?
            .await
            .map_err(|_| JobError::QueueClosed)?
    }

    /// Stops accepting jobs and waits for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            error!(error = %e, "Import queue worker failed");
        }
    }
}

async fn run_with_retries(job: &ImportJob, config: &QueueConfig) -> Result<ImportResult, JobError> {
    let attempts: u32 = config.retries.saturating_add(1);
    let mut attempt: u32 = 1;

    loop {
        info!(job = job.label(), attempt, attempts, "Running import job");

        let outcome: Result<ImportResult, JobError> = run_attempt(job, config.timeout).await;
        match outcome {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(job = job.label(), attempt, error = %e, "Import attempt failed, retrying");
                attempt += 1;
            }
            Err(e) => {
                error!(job = job.label(), attempt, error = %e, "Import job failed");
                return Err(e);
            }
        }
    }
}

async fn run_attempt(job: &ImportJob, timeout: Duration) -> Result<ImportResult, JobError> {
    let work: Arc<Work> = Arc::clone(&job.work);
    let cancellation: Cancellation = Cancellation::new();
    let signal: Cancellation = cancellation.clone();
    let mut handle: JoinHandle<Result<ImportResult, JobError>> =
        tokio::task::spawn_blocking(move || work(&signal));

    let joined = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(joined) => joined,
        Err(_) => {
            warn!(job = job.label(), ?timeout, "Import attempt timed out, cancelling");
            cancellation.cancel();
            match handle.await {
                Ok(Err(JobError::Import(ImportError::Cancelled))) => {
                    return Err(JobError::TimedOut(timeout));
                }
                Ok(Ok(result)) => {
                    info!(job = job.label(), "Import attempt finished after its timeout");
                    return Ok(result);
                }
                joined => joined,
            }
        }
    };

    joined.unwrap_or_else(|join_error| Err(JobError::Panicked(join_error.to_string())))
}
