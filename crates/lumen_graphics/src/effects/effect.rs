//! # Particle Effect
//!
//! One emitter, its controllers and the ring of particles they drive.
//!
//! ## Frame Protocol
//!
//! ```text
//!  update(dt)  frames_behind += 1
//!              sync:  step now, frames_behind = 0
//!              async: while frames_behind > max { step now; frames_behind -= 1 }
//!
//!  draw(ctx)   render the last built geometry
//!              async: while frames_behind > 0 { queue step; frames_behind -= 1 }
//! ```
//!
//! A queued step runs on the scheduler's worker thread. Drawing never
//! waits for it, so the picture may trail the simulation by at most
//! `max_frames_behind` steps.
//!
//! ## Locks
//!
//! The simulation lock guards the ring, controllers and emitter. The
//! presentation lock guards the geometry. A step takes the presentation
//! lock while still holding the simulation lock. Draw takes only the
//! presentation lock, long enough to grab the last built geometry, and
//! renders after releasing it. The render callback may therefore call
//! back into the effect.

use super::emitter::{ParticleCallback, ParticleEvents};
use super::{
    CameraFrame, EmitContext, Particle, ParticleAppearance, ParticleBlend, ParticleController,
    ParticleControllerCollection, ParticleEmitter, ParticleGeometry, ParticleType,
    ParticleUpdateScheduler, SourceRect,
};
use crate::config::ParticleSettings;
use crate::context::DrawingContext;
use crate::texture::Texture;
use glam::Vec3;
use lumen_core::{BoundingBox, RingBuffer};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Seed of the controller random stream unless the builder sets one.
pub const DEFAULT_EFFECT_SEED: u64 = 0xEFFE_C7;

/// Lifecycle of a [`ParticleEffect`].
///
/// ```text
/// Uninitialized ──update──> Active ──emitter done──> PendingRemoval ──drained──> Removed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// The ring has not been allocated yet.
    Uninitialized,
    /// Emitting and simulating.
    Active,
    /// The emitter is done; live particles are still draining.
    PendingRemoval,
    /// Drained or disposed. The owner should drop the effect.
    Removed,
}

struct Simulation {
    emitter: Box<dyn ParticleEmitter>,
    ring: Option<RingBuffer<Particle>>,
    controllers: ParticleControllerCollection,
    rng: ChaCha8Rng,
    events: ParticleEvents,
    padding: Vec3,
}

impl Simulation {
    /// Allocates the ring on first use.
    fn initialize(&mut self, default_capacity: usize) -> &mut RingBuffer<Particle> {
        let Self {
            emitter,
            ring,
            controllers,
            ..
        } = self;
        ring.get_or_insert_with(|| {
            let capacity = emitter
                .estimated_capacity()
                .unwrap_or(default_capacity)
                .max(1);
            controllers.reserve(capacity);
            tracing::debug!(capacity, "particle ring allocated");
            RingBuffer::with_capacity(capacity)
        })
    }
}

struct Presentation {
    appearance: ParticleAppearance,
    camera: CameraFrame,
    geometry: Arc<ParticleGeometry>,
}

/// A simulated, drawable particle effect.
///
/// Effects are shared as `Arc<ParticleEffect>` so the background
/// scheduler can step them while the render thread draws.
pub struct ParticleEffect {
    simulation: Mutex<Simulation>,
    presentation: Mutex<Presentation>,
    scheduler: Option<Weak<ParticleUpdateScheduler>>,
    max_frames_behind: u32,
    max_step_seconds: f32,
    default_capacity: usize,
    frames_behind: AtomicU32,
    last_elapsed: AtomicU32,
    steps_applied: AtomicU64,
    pending_removal: AtomicBool,
    disposed: AtomicBool,
    enabled: AtomicBool,
    visible: AtomicBool,
}

impl fmt::Debug for ParticleEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleEffect")
            .field("asynchronous", &self.is_asynchronous())
            .field("frames_behind", &self.frames_behind())
            .field("steps_applied", &self.steps_applied())
            .field("pending_removal", &self.pending_removal.load(Ordering::Acquire))
            .field("disposed", &self.is_disposed())
            .field("enabled", &self.is_enabled())
            .field("visible", &self.is_visible())
            .finish_non_exhaustive()
    }
}

impl ParticleEffect {
    /// Starts building an effect around `emitter`.
    pub fn builder(emitter: impl ParticleEmitter + 'static) -> ParticleEffectBuilder {
        ParticleEffectBuilder::new(Box::new(emitter))
    }

    /// Advances the effect by `elapsed` seconds.
    ///
    /// Synchronous effects step immediately. Asynchronous effects only
    /// count the frame, stepping here when more than `max_frames_behind`
    /// frames are already outstanding. A disabled effect is frozen: the
    /// frame is neither counted nor stepped.
    pub fn update(&self, elapsed: f32) -> EffectState {
        if self.is_disposed() {
            return EffectState::Removed;
        }
        if self.pending_removal.load(Ordering::Acquire) && self.particle_count() == 0 {
            return EffectState::Removed;
        }
        if !self.is_enabled() {
            return self.state();
        }

        self.simulation.lock().initialize(self.default_capacity);
        self.frames_behind.fetch_add(1, Ordering::AcqRel);

        if self.scheduler().is_some() {
            self.last_elapsed.store(elapsed.to_bits(), Ordering::Release);
            while self.frames_behind.load(Ordering::Acquire) > self.max_frames_behind {
                self.step(elapsed);
                self.frames_behind.fetch_sub(1, Ordering::AcqRel);
            }
        } else {
            self.step(elapsed);
            self.frames_behind.store(0, Ordering::Release);
        }

        self.state()
    }

    /// Renders the last built geometry, then queues the outstanding steps.
    ///
    /// `render` runs with no lock held and receives a snapshot of the
    /// geometry and appearance. Returns `None` without rendering for a
    /// disposed or invisible effect; an invisible effect still queues its
    /// outstanding steps. When the scheduler has stopped, those steps run
    /// inline instead.
    pub fn draw<R>(
        self: &Arc<Self>,
        context: &DrawingContext,
        render: impl FnOnce(&ParticleGeometry, &ParticleAppearance) -> R,
    ) -> Option<R> {
        if self.is_disposed() {
            return None;
        }

        let result = if self.is_visible() {
            let (geometry, appearance) = {
                let mut presentation = self.presentation.lock();
                presentation.camera = CameraFrame {
                    view_inverse: context.view_inverse(),
                    eye: context.eye_position(),
                };
                (Arc::clone(&presentation.geometry), presentation.appearance)
            };
            Some(render(&geometry, &appearance))
        } else {
            None
        };

        if let Some(scheduler) = self.scheduler() {
            let dt = f32::from_bits(self.last_elapsed.load(Ordering::Acquire));
            let mut queued = 0u32;
            while self.take_frame_behind() {
                if let Err(err) = scheduler.enqueue(Arc::clone(self), dt) {
                    tracing::warn!(%err, "scheduler unavailable, stepping inline");
                    self.step(dt);
                } else {
                    queued += 1;
                }
            }
            if queued > 0 {
                tracing::debug!(queued, "particle steps queued");
            }
        }

        result
    }

    fn take_frame_behind(&self) -> bool {
        self.frames_behind
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Runs one simulation step. Called inline or from the worker.
    pub(crate) fn step(&self, elapsed: f32) {
        if self.is_disposed() {
            return;
        }
        let dt = elapsed.clamp(0.0, self.max_step_seconds);

        let mut simulation = self.simulation.lock();
        let sim = &mut *simulation;
        let Some(ring) = sim.ring.as_mut() else {
            return;
        };

        if !self.pending_removal.load(Ordering::Acquire) {
            let mut emit = EmitContext::new(ring, &mut sim.controllers, &mut sim.rng, &mut sim.events);
            if sim.emitter.update(&mut emit, dt) {
                self.pending_removal.store(true, Ordering::Release);
            }
        }

        let [head, tail] = ring.segments();
        let slots = ring.slots_mut();
        for slot in head.chain(tail) {
            let particle = &mut slots[slot];
            if !particle.is_live() {
                continue;
            }
            sim.controllers.update(particle, slot, dt);
            particle.update(dt);
            if !particle.is_live() {
                sim.events.retired(particle);
                particle.retire();
            }
        }
        ring.pop_front_while(|p| !p.is_live());

        self.steps_applied.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(dt, particles = ring.len(), "particle step");

        let mut presentation = self.presentation.lock();
        let Presentation {
            appearance,
            camera,
            geometry,
        } = &mut *presentation;
        Arc::make_mut(geometry).rebuild(ring.iter(), appearance, camera);
    }

    /// Emits a particle directly, bypassing the emitter.
    pub fn emit(&self, particle: Particle) {
        if self.is_disposed() {
            return;
        }
        let mut simulation = self.simulation.lock();
        let sim = &mut *simulation;
        sim.initialize(self.default_capacity);
        let Some(ring) = sim.ring.as_mut() else {
            return;
        };
        EmitContext::new(ring, &mut sim.controllers, &mut sim.rng, &mut sim.events).emit(particle);
    }

    /// Releases the particle storage and geometry.
    ///
    /// Safe while a step is queued: the worker skips disposed effects.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.simulation.lock().ring = None;
        self.presentation.lock().geometry = Arc::new(ParticleGeometry::new());
        tracing::debug!("particle effect disposed");
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EffectState {
        if self.is_disposed() {
            return EffectState::Removed;
        }
        let simulation = self.simulation.lock();
        let Some(ring) = &simulation.ring else {
            return EffectState::Uninitialized;
        };
        match (self.pending_removal.load(Ordering::Acquire), ring.is_empty()) {
            (false, _) => EffectState::Active,
            (true, false) => EffectState::PendingRemoval,
            (true, true) => EffectState::Removed,
        }
    }

    /// Slots between the head and tail of the ring, including retired
    /// slots the head has not reached yet.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.simulation.lock().ring.as_ref().map_or(0, RingBuffer::len)
    }

    /// Particles with `age <= 1`.
    #[must_use]
    pub fn live_particle_count(&self) -> usize {
        self.simulation
            .lock()
            .ring
            .as_ref()
            .map_or(0, |ring| ring.iter().filter(|p| p.is_live()).count())
    }

    /// Allocated ring slots. Zero before the first update.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.simulation.lock().ring.as_ref().map_or(0, RingBuffer::capacity)
    }

    /// Copies the particles in the ring, oldest first.
    #[must_use]
    pub fn particles(&self) -> Vec<Particle> {
        self.simulation
            .lock()
            .ring
            .as_ref()
            .map(|ring| ring.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total particles emitted.
    #[must_use]
    pub fn emitted_count(&self) -> u64 {
        self.simulation.lock().events.emitted
    }

    /// Total particles retired.
    #[must_use]
    pub fn retired_count(&self) -> u64 {
        self.simulation.lock().events.retired
    }

    /// Frames counted by `update` but not yet stepped or queued.
    #[must_use]
    pub fn frames_behind(&self) -> u32 {
        self.frames_behind.load(Ordering::Acquire)
    }

    /// Simulation steps applied so far, inline or on the worker.
    #[must_use]
    pub fn steps_applied(&self) -> u64 {
        self.steps_applied.load(Ordering::Acquire)
    }

    /// Returns `true` while the effect has a live scheduler.
    #[must_use]
    pub fn is_asynchronous(&self) -> bool {
        self.scheduler().is_some()
    }

    /// Returns `true` after [`ParticleEffect::dispose`].
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// World-space bounds reported by the emitter, grown by the padding.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let simulation = self.simulation.lock();
        simulation.emitter.bounding_box().pad(simulation.padding)
    }

    /// Extra space added to each side of [`ParticleEffect::bounding_box`].
    #[must_use]
    pub fn bounding_box_padding(&self) -> Vec3 {
        self.simulation.lock().padding
    }

    /// Changes the bounding box padding.
    pub fn set_bounding_box_padding(&self, padding: Vec3) {
        self.simulation.lock().padding = padding;
    }

    /// Returns `true` unless updates are paused.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Pauses or resumes updates.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Returns `true` unless drawing is suppressed.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Shows or hides the effect.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    /// Current appearance.
    #[must_use]
    pub fn appearance(&self) -> ParticleAppearance {
        self.presentation.lock().appearance
    }

    /// Changes the appearance. Takes effect on the next step.
    pub fn set_appearance(&self, appearance: ParticleAppearance) {
        self.presentation.lock().appearance = appearance;
    }

    /// Changes the texture. Takes effect on the next step.
    pub fn set_texture(&self, texture: Option<Texture>) {
        self.presentation.lock().appearance.texture = texture;
    }

    /// Runs `f` on the controllers under the simulation lock.
    pub fn with_controllers<R>(&self, f: impl FnOnce(&mut ParticleControllerCollection) -> R) -> R {
        f(&mut self.simulation.lock().controllers)
    }

    /// Runs `f` on the emitter under the simulation lock.
    pub fn with_emitter<R>(&self, f: impl FnOnce(&mut dyn ParticleEmitter) -> R) -> R {
        f(&mut *self.simulation.lock().emitter)
    }

    fn scheduler(&self) -> Option<Arc<ParticleUpdateScheduler>> {
        self.scheduler.as_ref().and_then(Weak::upgrade)
    }
}

/// Configures and creates a [`ParticleEffect`].
pub struct ParticleEffectBuilder {
    emitter: Box<dyn ParticleEmitter>,
    controllers: ParticleControllerCollection,
    appearance: ParticleAppearance,
    settings: ParticleSettings,
    scheduler: Option<Weak<ParticleUpdateScheduler>>,
    seed: u64,
    padding: Vec3,
    on_emitted: Option<ParticleCallback>,
    on_retired: Option<ParticleCallback>,
}

impl fmt::Debug for ParticleEffectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleEffectBuilder")
            .field("emitter", &self.emitter)
            .field("controllers", &self.controllers.len())
            .field("appearance", &self.appearance)
            .field("asynchronous", &self.scheduler.is_some())
            .finish_non_exhaustive()
    }
}

impl ParticleEffectBuilder {
    fn new(emitter: Box<dyn ParticleEmitter>) -> Self {
        let settings = ParticleSettings::default();
        Self {
            emitter,
            controllers: ParticleControllerCollection::new(),
            appearance: ParticleAppearance {
                stretch: settings.stretch,
                ..ParticleAppearance::default()
            },
            settings,
            scheduler: None,
            seed: DEFAULT_EFFECT_SEED,
            padding: Vec3::ZERO,
            on_emitted: None,
            on_retired: None,
        }
    }

    /// Frame lag, step length, default capacity and stretch.
    #[must_use]
    pub fn settings(mut self, settings: &ParticleSettings) -> Self {
        self.appearance.stretch = settings.stretch;
        self.settings = settings.clone();
        self
    }

    /// Steps the effect on `scheduler`'s worker.
    #[must_use]
    pub fn scheduler(mut self, scheduler: &Arc<ParticleUpdateScheduler>) -> Self {
        self.scheduler = Some(Arc::downgrade(scheduler));
        self
    }

    /// Appends a controller.
    #[must_use]
    pub fn controller<C: ParticleController>(mut self, controller: C) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Orientation mode.
    #[must_use]
    pub fn particle_type(mut self, particle_type: ParticleType) -> Self {
        self.appearance.particle_type = particle_type;
        self
    }

    /// Blend mode.
    #[must_use]
    pub fn blend(mut self, blend: ParticleBlend) -> Self {
        self.appearance.blend = blend;
        self
    }

    /// Particle texture. Nothing is drawn without one.
    #[must_use]
    pub fn texture(mut self, texture: Texture) -> Self {
        self.appearance.texture = Some(texture);
        self
    }

    /// Region of the texture to sample.
    #[must_use]
    pub fn source_rect(mut self, rect: SourceRect) -> Self {
        self.appearance.source_rect = Some(rect);
        self
    }

    /// Length multiplier for constrained billboards.
    #[must_use]
    pub fn stretch(mut self, stretch: f32) -> Self {
        self.appearance.stretch = stretch;
        self
    }

    /// Axis for [`ParticleType::ConstrainedBillboardUp`].
    #[must_use]
    pub fn up(mut self, up: Vec3) -> Self {
        self.appearance.up = up;
        self
    }

    /// Seed of the random stream controllers draw from.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Extra space added to each side of the bounding box.
    #[must_use]
    pub fn bounding_box_padding(mut self, padding: Vec3) -> Self {
        self.padding = padding;
        self
    }

    /// Called for every emitted particle.
    #[must_use]
    pub fn on_particle_emitted(mut self, f: impl FnMut(&mut Particle) + Send + 'static) -> Self {
        self.on_emitted = Some(Box::new(f));
        self
    }

    /// Called for every particle that outlives its duration.
    #[must_use]
    pub fn on_particle_retired(mut self, f: impl FnMut(&mut Particle) + Send + 'static) -> Self {
        self.on_retired = Some(Box::new(f));
        self
    }

    /// Creates the effect.
    #[must_use]
    pub fn build(self) -> Arc<ParticleEffect> {
        Arc::new(ParticleEffect {
            simulation: Mutex::new(Simulation {
                emitter: self.emitter,
                ring: None,
                controllers: self.controllers,
                rng: ChaCha8Rng::seed_from_u64(self.seed),
                events: ParticleEvents {
                    on_emitted: self.on_emitted,
                    on_retired: self.on_retired,
                    ..ParticleEvents::default()
                },
                padding: self.padding,
            }),
            presentation: Mutex::new(Presentation {
                appearance: self.appearance,
                camera: CameraFrame::default(),
                geometry: Arc::new(ParticleGeometry::new()),
            }),
            scheduler: self.scheduler,
            max_frames_behind: self.settings.max_frames_behind,
            max_step_seconds: self.settings.max_step_seconds,
            default_capacity: self.settings.default_capacity,
            frames_behind: AtomicU32::new(0),
            last_elapsed: AtomicU32::new(0f32.to_bits()),
            steps_applied: AtomicU64::new(0),
            pending_removal: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            enabled: AtomicBool::new(true),
            visible: AtomicBool::new(true),
        })
    }
}
