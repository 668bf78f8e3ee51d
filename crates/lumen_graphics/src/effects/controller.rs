//! # Particle Controllers
//!
//! A controller shapes particles over their lifetime. It sees each
//! particle twice:
//!
//! ```text
//!   emit ──> reset(particle, tag)          once per emission
//!   step ──> update(particle, tag, dt)     once per live particle per step
//! ```
//!
//! Every controller owns a tag array kept parallel to the particle ring,
//! indexed by the same physical slot. Controllers that need no per-particle
//! state use `()` as their tag, which costs nothing. When the ring doubles
//! the tag array replays the same [`Growth`] so each tag keeps following
//! its particle.

use super::Particle;
use lumen_core::Growth;
use rand::RngCore;
use std::any::Any;
use std::fmt;

/// Per-particle behaviour with a typed per-slot tag.
pub trait ParticleController: Send + fmt::Debug + 'static {
    /// Auxiliary state stored for every slot.
    type Tag: Clone + Default + Send + fmt::Debug;

    /// Gates both [`reset`](Self::reset) and [`update`](Self::update).
    fn is_enabled(&self) -> bool;

    /// Called once when `particle` is emitted into its slot.
    fn reset(&mut self, _particle: &mut Particle, _tag: &mut Self::Tag, _rng: &mut dyn RngCore) {}

    /// Called once per step while `particle` is live.
    fn update(&mut self, particle: &mut Particle, tag: &mut Self::Tag, dt: f32);
}

/// Object-safe view of a controller together with its tag array.
trait SlotController: Send + fmt::Debug {
    fn reset(&mut self, particle: &mut Particle, slot: usize, rng: &mut dyn RngCore);
    fn update(&mut self, particle: &mut Particle, slot: usize, dt: f32);
    fn reserve(&mut self, capacity: usize);
    fn replay(&mut self, growth: &Growth);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug)]
struct Tagged<C: ParticleController> {
    controller: C,
    tags: Vec<C::Tag>,
}

/// Grows `tags` so that `slot` can be indexed.
fn ensure_slot<T: Clone + Default>(tags: &mut Vec<T>, slot: usize) {
    if slot >= tags.len() {
        tags.resize(slot + 1, T::default());
    }
}

impl<C: ParticleController> SlotController for Tagged<C> {
    fn reset(&mut self, particle: &mut Particle, slot: usize, rng: &mut dyn RngCore) {
        if self.controller.is_enabled() {
            ensure_slot(&mut self.tags, slot);
            self.controller.reset(particle, &mut self.tags[slot], rng);
        }
    }

    fn update(&mut self, particle: &mut Particle, slot: usize, dt: f32) {
        if self.controller.is_enabled() {
            ensure_slot(&mut self.tags, slot);
            self.controller.update(particle, &mut self.tags[slot], dt);
        }
    }

    fn reserve(&mut self, capacity: usize) {
        if self.tags.len() < capacity {
            self.tags.resize(capacity, C::Tag::default());
        }
    }

    fn replay(&mut self, growth: &Growth) {
        growth.apply(&mut self.tags);
    }

    fn as_any(&self) -> &dyn Any {
        &self.controller
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.controller
    }
}

/// Ordered list of controllers applied to one effect.
#[derive(Debug, Default)]
pub struct ParticleControllerCollection {
    controllers: Vec<Box<dyn SlotController>>,
    capacity: usize,
}

impl ParticleControllerCollection {
    /// Empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a controller. It runs after every controller added before it.
    pub fn push<C: ParticleController>(&mut self, controller: C) {
        let mut tagged = Tagged {
            controller,
            tags: Vec::new(),
        };
        tagged.reserve(self.capacity);
        self.controllers.push(Box::new(tagged));
    }

    /// Number of controllers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Returns `true` if there are no controllers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// First controller of type `C`.
    #[must_use]
    pub fn find<C: ParticleController>(&self) -> Option<&C> {
        self.controllers
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<C>())
    }

    /// First controller of type `C`, mutably.
    pub fn find_mut<C: ParticleController>(&mut self) -> Option<&mut C> {
        self.controllers
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<C>())
    }

    /// Removes every controller.
    pub fn clear(&mut self) {
        self.controllers.clear();
    }

    /// Sizes every tag array for a ring of `capacity` slots.
    pub(crate) fn reserve(&mut self, capacity: usize) {
        self.capacity = self.capacity.max(capacity);
        for controller in &mut self.controllers {
            controller.reserve(capacity);
        }
    }

    /// Replays a ring growth on every tag array.
    pub(crate) fn replay(&mut self, growth: &Growth) {
        self.capacity = self.capacity.max(growth.new_capacity);
        for controller in &mut self.controllers {
            controller.replay(growth);
        }
    }

    pub(crate) fn reset(&mut self, particle: &mut Particle, slot: usize, rng: &mut dyn RngCore) {
        for controller in &mut self.controllers {
            controller.reset(particle, slot, rng);
        }
    }

    pub(crate) fn update(&mut self, particle: &mut Particle, slot: usize, dt: f32) {
        for controller in &mut self.controllers {
            controller.update(particle, slot, dt);
        }
    }
}
