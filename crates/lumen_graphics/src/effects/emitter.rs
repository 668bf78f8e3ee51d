//! The emitter contract and the context it emits through.

use super::{Particle, ParticleControllerCollection};
use lumen_core::{BoundingBox, RingBuffer};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Callback invoked for every emitted or retired particle.
pub type ParticleCallback = Box<dyn FnMut(&mut Particle) + Send>;

/// Source of new particles for one effect.
pub trait ParticleEmitter: Send + fmt::Debug {
    /// Emits the particles due in the next `dt` seconds.
    ///
    /// Returns `true` once the emitter will never emit again. The effect
    /// latches that answer and stops calling `update`.
    fn update(&mut self, emit: &mut EmitContext<'_>, dt: f32) -> bool;

    /// World-space bounds of everything this emitter can produce.
    fn bounding_box(&self) -> BoundingBox;

    /// Ring capacity expected to hold every live particle at once.
    fn estimated_capacity(&self) -> Option<usize> {
        None
    }
}

/// Emission and retirement notifications, with running totals.
#[derive(Default)]
pub(crate) struct ParticleEvents {
    pub(crate) on_emitted: Option<ParticleCallback>,
    pub(crate) on_retired: Option<ParticleCallback>,
    pub(crate) emitted: u64,
    pub(crate) retired: u64,
}

impl fmt::Debug for ParticleEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleEvents")
            .field("on_emitted", &self.on_emitted.is_some())
            .field("on_retired", &self.on_retired.is_some())
            .field("emitted", &self.emitted)
            .field("retired", &self.retired)
            .finish()
    }
}

impl ParticleEvents {
    pub(crate) fn emitted(&mut self, particle: &mut Particle) {
        self.emitted += 1;
        if let Some(callback) = &mut self.on_emitted {
            callback(particle);
        }
    }

    pub(crate) fn retired(&mut self, particle: &mut Particle) {
        self.retired += 1;
        if let Some(callback) = &mut self.on_retired {
            callback(particle);
        }
    }
}

/// Write access to an effect's particle storage, handed to emitters.
pub struct EmitContext<'a> {
    ring: &'a mut RingBuffer<Particle>,
    controllers: &'a mut ParticleControllerCollection,
    rng: &'a mut ChaCha8Rng,
    events: &'a mut ParticleEvents,
}

impl fmt::Debug for EmitContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitContext")
            .field("particles", &self.ring.len())
            .field("capacity", &self.ring.capacity())
            .finish_non_exhaustive()
    }
}

impl<'a> EmitContext<'a> {
    pub(crate) fn new(
        ring: &'a mut RingBuffer<Particle>,
        controllers: &'a mut ParticleControllerCollection,
        rng: &'a mut ChaCha8Rng,
        events: &'a mut ParticleEvents,
    ) -> Self {
        Self {
            ring,
            controllers,
            rng,
            events,
        }
    }

    /// Appends a particle at the tail of the ring.
    ///
    /// Age and elapsed time are zeroed, every controller resets its tag
    /// for the slot, and the emitted callback fires. A full ring doubles.
    pub fn emit(&mut self, mut particle: Particle) {
        particle.age = 0.0;
        particle.elapsed_time = 0.0;
        let (slot, growth) = self.ring.push_back(particle);
        if let Some(growth) = growth {
            self.controllers.replay(&growth);
        }
        let particle = &mut self.ring.slots_mut()[slot];
        self.controllers.reset(particle, slot, &mut *self.rng);
        self.events.emitted(particle);
    }

    /// Particles currently in the ring.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.ring.len()
    }
}
