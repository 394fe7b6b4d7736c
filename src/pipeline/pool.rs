//! Bounded task pool for one pipeline phase
//!
//! Runs a fixed list of tasks on at most `workers` named threads. Every
//! task result is collected; the first failure cancels the siblings.
//! Queued tasks are then skipped and running tasks stop at their next
//! cancellation check.

use crate::cancel::CancelToken;
use crate::error::{PipelineError, Result, WorkerError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, warn};

type TaskFn<T> = Box<dyn FnOnce(&CancelToken) -> Result<T> + Send + 'static>;

/// A named unit of work
pub struct Task<T> {
    name: String,
    run: TaskFn<T>,
}

impl<T> Task<T> {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

/// Outcome of one task, sent back to the pool owner
struct TaskReport<T> {
    index: usize,
    name: String,
    result: Result<T>,
}

/// Runs the tasks of one phase and joins them
pub struct TaskPool {
    name: &'static str,
    workers: usize,
    cancel: CancelToken,
}

impl TaskPool {
    /// Create a pool of at most `workers` threads (at least one)
    pub fn new(name: &'static str, workers: usize, cancel: CancelToken) -> Self {
        Self {
            name,
            workers: workers.max(1),
            cancel,
        }
    }

    /// Run every task and return their results in task order
    ///
    /// Returns the first real error if any task failed. Errors that are
    /// only a consequence of cancellation are reported as
    /// [`PipelineError::Cancelled`] when nothing else failed.
    pub fn run<T: Send + 'static>(&self, tasks: Vec<Task<T>>) -> Result<Vec<T>> {
        let total = tasks.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = unbounded::<(usize, Task<T>)>();
        for job in tasks.into_iter().enumerate() {
            // job_rx is alive, an unbounded send cannot fail
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded::<TaskReport<T>>();
        let mut first_error: Option<PipelineError> = None;
        let mut handles = Vec::with_capacity(self.workers.min(total));

        for id in 0..self.workers.min(total) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = self.cancel.clone();

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", self.name, id))
                .spawn(move || worker_loop(job_rx, result_tx, cancel));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    self.cancel.cancel();
                    record_error(
                        &mut first_error,
                        WorkerError::SpawnFailed {
                            id,
                            reason: e.to_string(),
                        }
                        .into(),
                    );
                    break;
                }
            }
        }
        drop(result_tx);
        drop(job_rx);

        debug!(pool = self.name, tasks = total, threads = handles.len(), "Pool started");

        let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut received = 0usize;

        for report in result_rx.iter() {
            received += 1;
            match report.result {
                Ok(value) => results[report.index] = Some(value),
                Err(e) => {
                    if !e.is_cancelled() {
                        warn!(
                            pool = self.name,
                            task = %report.name,
                            error = %e,
                            "Task failed, cancelling siblings"
                        );
                    }
                    record_error(&mut first_error, e);
                }
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                record_error(
                    &mut first_error,
                    WorkerError::Panicked {
                        task: self.name.to_string(),
                        message: "pool thread panicked".into(),
                    }
                    .into(),
                );
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        if received < total {
            return Err(WorkerError::ResultChannelClosed {
                missing: total - received,
            }
            .into());
        }

        Ok(results.into_iter().flatten().collect())
    }
}

/// Keep the first error, preferring a real failure over a cancellation
fn record_error(slot: &mut Option<PipelineError>, error: PipelineError) {
    match slot.as_ref() {
        None => *slot = Some(error),
        Some(existing) if existing.is_cancelled() && !error.is_cancelled() => *slot = Some(error),
        Some(_) => {}
    }
}

fn worker_loop<T>(
    jobs: Receiver<(usize, Task<T>)>,
    results: Sender<TaskReport<T>>,
    cancel: CancelToken,
) {
    for (index, task) in jobs.iter() {
        let name = task.name.clone();
        let result = if cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            run_task(task, &cancel)
        };

        // cancel before reporting so this thread skips its next job too
        if result.is_err() {
            cancel.cancel();
        }

        if results.send(TaskReport { index, name, result }).is_err() {
            break;
        }
    }
}

fn run_task<T>(task: Task<T>, cancel: &CancelToken) -> Result<T> {
    let Task { name, run } = task;
    debug!(task = %name, "Task started");

    match panic::catch_unwind(AssertUnwindSafe(|| run(cancel))) {
        Ok(result) => result,
        Err(payload) => Err(WorkerError::Panicked {
            task: name,
            message: panic_message(payload.as_ref()),
        }
        .into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".into()
    }
}
