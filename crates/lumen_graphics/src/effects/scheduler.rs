//! # Particle Update Scheduler
//!
//! The single background worker that applies queued particle steps.
//!
//! ```text
//!  render thread                        worker thread
//!  ─────────────                        ─────────────
//!  effect.update(dt)   frames_behind++
//!  effect.draw(ctx) ──enqueue(effect)──> step(effect) ──> rebuild geometry
//!  effect.draw(ctx) ──enqueue(effect)──> step(effect) ──> ...
//! ```
//!
//! Steps of one effect run in the order they were queued. There is no
//! ordering between effects. The scheduler is owned by the application:
//! it starts in [`ParticleUpdateScheduler::start`] and stops in
//! [`ParticleUpdateScheduler::shutdown`] or when the last handle drops.
//! Effects only hold weak handles and step inline once it is gone.

use super::ParticleEffect;
use crate::config::ParticleSettings;
use crate::error::GraphicsResult;
use lumen_core::{UpdateJob, UpdateWorker, WorkerConfig};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// One queued simulation step.
pub(crate) struct StepJob {
    effect: Arc<ParticleEffect>,
    dt: f32,
}

impl UpdateJob for StepJob {
    fn run(self) {
        if self.effect.is_disposed() {
            tracing::warn!("skipping queued step of a disposed particle effect");
            return;
        }
        self.effect.step(self.dt);
    }
}

/// Owner of the particle worker thread.
pub struct ParticleUpdateScheduler {
    worker: RwLock<UpdateWorker<StepJob>>,
}

impl fmt::Debug for ParticleUpdateScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleUpdateScheduler")
            .field("worker", &*self.worker.read())
            .finish()
    }
}

impl ParticleUpdateScheduler {
    /// Spawns the worker thread named by `settings.worker_thread_name`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Scheduler`](crate::GraphicsError::Scheduler)
    /// if the thread cannot be spawned.
    pub fn start(settings: &ParticleSettings) -> GraphicsResult<Arc<Self>> {
        let worker = UpdateWorker::start(WorkerConfig {
            thread_name: settings.worker_thread_name.clone(),
        })?;
        Ok(Arc::new(Self {
            worker: RwLock::new(worker),
        }))
    }

    /// Queues one step of `effect`.
    pub(crate) fn enqueue(&self, effect: Arc<ParticleEffect>, dt: f32) -> GraphicsResult<()> {
        self.worker.read().submit(StepJob { effect, dt })?;
        Ok(())
    }

    /// Blocks until every queued step has been applied.
    ///
    /// Must not be called from a controller or emitter callback.
    pub fn flush(&self) {
        let worker = self.worker.read();
        let pending = worker.pending();
        worker.flush();
        tracing::debug!(pending, "particle steps flushed");
    }

    /// Steps queued but not yet applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.worker.read().pending()
    }

    /// Returns `true` until [`ParticleUpdateScheduler::shutdown`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.read().is_running()
    }

    /// Worker thread name.
    #[must_use]
    pub fn thread_name(&self) -> String {
        self.worker.read().name().to_owned()
    }

    /// Applies the backlog and joins the worker. Later steps run inline.
    pub fn shutdown(&self) {
        self.worker.write().shutdown();
    }
}
