//! Scene-level container that updates, draws and detaches effects.

use super::{
    EffectState, ParticleAppearance, ParticleEffect, ParticleEffectBuilder, ParticleEmitter,
    ParticleGeometry, ParticleUpdateScheduler,
};
use crate::config::ParticleSettings;
use crate::context::DrawingContext;
use crate::error::GraphicsResult;
use std::sync::Arc;

/// The effects of one scene.
///
/// Effects whose update reports [`EffectState::Removed`] are detached
/// during that update.
#[derive(Debug)]
pub struct ParticleEffectCollection {
    effects: Vec<Arc<ParticleEffect>>,
    scheduler: Option<Arc<ParticleUpdateScheduler>>,
    settings: ParticleSettings,
}

impl ParticleEffectCollection {
    /// Creates an empty collection, starting a scheduler when
    /// `settings.async_updates` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Scheduler`](crate::GraphicsError::Scheduler)
    /// if the worker thread cannot be spawned.
    pub fn new(settings: ParticleSettings) -> GraphicsResult<Self> {
        let scheduler = if settings.async_updates {
            Some(ParticleUpdateScheduler::start(&settings)?)
        } else {
            None
        };
        Ok(Self {
            effects: Vec::new(),
            scheduler,
            settings,
        })
    }

    /// A builder preconfigured with this collection's settings and scheduler.
    pub fn builder(&self, emitter: impl ParticleEmitter + 'static) -> ParticleEffectBuilder {
        let builder = ParticleEffect::builder(emitter).settings(&self.settings);
        match &self.scheduler {
            Some(scheduler) => builder.scheduler(scheduler),
            None => builder,
        }
    }

    /// Adds an effect.
    pub fn add(&mut self, effect: Arc<ParticleEffect>) {
        self.effects.push(effect);
    }

    /// Detaches `effect`. Returns `true` if it was present.
    pub fn remove(&mut self, effect: &Arc<ParticleEffect>) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| !Arc::ptr_eq(e, effect));
        self.effects.len() != before
    }

    /// Number of attached effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if no effect is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Attached effects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ParticleEffect>> + '_ {
        self.effects.iter()
    }

    /// The scheduler, when updates are asynchronous.
    #[must_use]
    pub fn scheduler(&self) -> Option<&Arc<ParticleUpdateScheduler>> {
        self.scheduler.as_ref()
    }

    /// Updates every effect and detaches the removed ones.
    ///
    /// Returns the number of effects detached.
    pub fn update(&mut self, elapsed: f32) -> usize {
        let before = self.effects.len();
        self.effects
            .retain(|effect| effect.update(elapsed) != EffectState::Removed);
        let removed = before - self.effects.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.effects.len(), "particle effects detached");
        }
        removed
    }

    /// Draws every effect in insertion order.
    pub fn draw(
        &self,
        context: &DrawingContext,
        mut render: impl FnMut(&ParticleEffect, &ParticleGeometry, &ParticleAppearance),
    ) {
        for effect in &self.effects {
            effect.draw(context, |geometry, appearance| {
                render(effect, geometry, appearance);
            });
        }
    }

    /// Waits for queued steps of every effect.
    pub fn flush(&self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.flush();
        }
    }

    /// Disposes and detaches every effect.
    pub fn clear(&mut self) {
        for effect in self.effects.drain(..) {
            effect.dispose();
        }
    }
}

impl Drop for ParticleEffectCollection {
    fn drop(&mut self) {
        self.clear();
        if let Some(scheduler) = &self.scheduler {
            scheduler.shutdown();
        }
    }
}
