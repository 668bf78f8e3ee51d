//! Single-threaded FIFO job worker.

use crate::error::{CoreError, CoreResult};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A unit of work executed on the background worker.
pub trait UpdateJob: Send + 'static {
    /// Runs the job. Called exactly once, on the worker thread.
    fn run(self);
}

/// Configuration for an [`UpdateWorker`].
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// OS thread name, visible in debuggers and profilers.
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "lumen-worker".to_owned(),
        }
    }
}

/// Count of submitted jobs that have not finished yet.
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    fn new() -> Self {
        Self {
            count: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_drained(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }
}

/// Marks one job as finished even if it panics.
struct FinishGuard<'a>(&'a Pending);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// A dedicated worker thread draining a FIFO queue of jobs.
///
/// The worker is owned: it starts in [`UpdateWorker::start`] and stops in
/// [`UpdateWorker::shutdown`] (or on drop). Jobs already queued at
/// shutdown still run before the thread exits.
pub struct UpdateWorker<J: UpdateJob> {
    name: String,
    sender: Option<Sender<J>>,
    pending: Arc<Pending>,
    handle: Option<JoinHandle<()>>,
}

impl<J: UpdateJob> std::fmt::Debug for UpdateWorker<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateWorker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending", &self.pending())
            .finish()
    }
}

impl<J: UpdateJob> UpdateWorker<J> {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerSpawn`] if the thread cannot be created.
    pub fn start(config: WorkerConfig) -> CoreResult<Self> {
        let (sender, receiver) = unbounded::<J>();
        let pending = Arc::new(Pending::new());

        let worker_pending = Arc::clone(&pending);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || Self::worker_loop(&receiver, &worker_pending))
            .map_err(|e| CoreError::WorkerSpawn {
                name: config.thread_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(name = %config.thread_name, "update worker started");

        Ok(Self {
            name: config.thread_name,
            sender: Some(sender),
            pending,
            handle: Some(handle),
        })
    }

    /// Worker thread main loop. Blocks while the queue is empty.
    fn worker_loop(receiver: &Receiver<J>, pending: &Pending) {
        for job in receiver {
            let _finish = FinishGuard(pending);
            job.run();
        }
    }

    /// Queues a job behind every job submitted before it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::WorkerStopped`] after shutdown, or if the
    /// worker thread died.
    pub fn submit(&self, job: J) -> CoreResult<()> {
        let stopped = || CoreError::WorkerStopped {
            name: self.name.clone(),
        };
        let sender = self.sender.as_ref().ok_or_else(stopped)?;

        self.pending.increment();
        sender.send(job).map_err(|_| {
            self.pending.decrement();
            stopped()
        })
    }

    /// Blocks until every job submitted so far has finished.
    ///
    /// Must not be called from inside a job: the worker would wait on
    /// itself.
    pub fn flush(&self) {
        self.pending.wait_drained();
    }

    /// Number of jobs submitted but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.count.lock()
    }

    /// Thread name of the worker.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` until [`UpdateWorker::shutdown`] is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Stops accepting jobs, drains the queue and joins the thread.
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        // Closing the channel ends the worker loop after the backlog.
        if self.sender.take().is_none() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(name = %self.name, "update worker panicked");
            }
        }
        tracing::info!(name = %self.name, "update worker stopped");
    }
}

impl<J: UpdateJob> Drop for UpdateWorker<J> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Record {
        log: Arc<Mutex<Vec<usize>>>,
        value: usize,
    }

    impl UpdateJob for Record {
        fn run(self) {
            self.log.lock().push(self.value);
        }
    }

    struct Count(Arc<AtomicUsize>);

    impl UpdateJob for Count {
        fn run(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_jobs_run_in_submission_order() {
        let worker = UpdateWorker::start(WorkerConfig::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for value in 0..100 {
            worker
                .submit(Record {
                    log: Arc::clone(&log),
                    value,
                })
                .unwrap();
        }
        worker.flush();
        assert_eq!(*log.lock(), (0..100).collect::<Vec<_>>());
        assert_eq!(worker.pending(), 0);
    }

    #[test]
    fn test_shutdown_drains_backlog() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut worker = UpdateWorker::start(WorkerConfig::default()).unwrap();
        for _ in 0..50 {
            worker.submit(Count(Arc::clone(&counter))).unwrap();
        }
        worker.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert!(!worker.is_running());
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let mut worker = UpdateWorker::<Count>::start(WorkerConfig::default()).unwrap();
        worker.shutdown();
        let err = worker.submit(Count(Arc::new(AtomicUsize::new(0)))).unwrap_err();
        assert!(matches!(err, CoreError::WorkerStopped { .. }));
        assert_eq!(worker.pending(), 0);
    }

    #[test]
    fn test_flush_on_idle_worker_returns() {
        let worker = UpdateWorker::<Count>::start(WorkerConfig::default()).unwrap();
        worker.flush();
    }
}
