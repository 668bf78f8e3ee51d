//! # Asynchronous Update Tests
//!
//! The frame-lag protocol between `update`, `draw` and the background
//! step worker.
//!
//! Run with: cargo test -p lumen_graphics --test async_updates

use glam::Vec3;
use lumen_core::BoundingBox;
use lumen_graphics::effects::{EmitContext, Particle};
use lumen_graphics::{
    DrawingContext, EffectState, EmitterShape, ParticleEffect, ParticleEffectCollection,
    ParticleEmitter, ParticleSettings, ParticleUpdateScheduler, StandardEmitter,
};
use parking_lot::Mutex;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

const FRAME: f32 = 1.0 / 60.0;

/// Records the step length of every update it receives.
#[derive(Debug, Default)]
struct RecordingEmitter {
    steps: Arc<Mutex<Vec<f32>>>,
}

impl ParticleEmitter for RecordingEmitter {
    fn update(&mut self, _emit: &mut EmitContext<'_>, dt: f32) -> bool {
        self.steps.lock().push(dt);
        false
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_point(Vec3::ZERO)
    }
}

/// Takes a few milliseconds per step so worker steps overlap draws.
#[derive(Debug)]
struct SlowEmitter;

impl ParticleEmitter for SlowEmitter {
    fn update(&mut self, emit: &mut EmitContext<'_>, _dt: f32) -> bool {
        thread::sleep(Duration::from_millis(5));
        emit.emit(Particle::new(Vec3::ZERO, Vec3::Y, 1.0));
        false
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_point(Vec3::ZERO)
    }
}

fn scheduler() -> Arc<ParticleUpdateScheduler> {
    ParticleUpdateScheduler::start(&ParticleSettings::production()).unwrap()
}

fn endless() -> StandardEmitter {
    let mut emitter = StandardEmitter::new(EmitterShape::Point);
    emitter.emission = 30.0;
    emitter
}

// ============================================================================
// FRAME LAG
// ============================================================================

#[test]
fn verify_update_draw_cycles_are_all_applied() {
    let scheduler = scheduler();
    let effect = ParticleEffect::builder(endless())
        .settings(&ParticleSettings::production())
        .scheduler(&scheduler)
        .build();
    let context = DrawingContext::default();

    for _ in 0..20 {
        effect.update(FRAME);
        effect.draw(&context, |_, _| ());
    }
    scheduler.flush();

    assert_eq!(effect.steps_applied(), 20);
    assert_eq!(effect.frames_behind(), 0);
    assert!(effect.particle_count() > 0);
}

#[test]
fn verify_updates_without_draw_stay_within_lag() {
    let scheduler = scheduler();
    let effect = ParticleEffect::builder(endless())
        .settings(&ParticleSettings::production())
        .scheduler(&scheduler)
        .build();

    for _ in 0..10 {
        effect.update(FRAME);
        assert!(effect.frames_behind() <= 1);
    }
    scheduler.flush();

    assert_eq!(effect.steps_applied(), 9);
    assert_eq!(effect.frames_behind(), 1);
}

#[test]
fn verify_larger_lag_allowance() {
    let settings = ParticleSettings {
        max_frames_behind: 3,
        ..ParticleSettings::production()
    };
    let scheduler = ParticleUpdateScheduler::start(&settings).unwrap();
    let effect = ParticleEffect::builder(endless())
        .settings(&settings)
        .scheduler(&scheduler)
        .build();

    for _ in 0..10 {
        effect.update(FRAME);
    }
    assert_eq!(effect.steps_applied(), 7);
    assert_eq!(effect.frames_behind(), 3);

    effect.draw(&DrawingContext::default(), |_, _| ());
    scheduler.flush();
    assert_eq!(effect.steps_applied(), 10);
    assert_eq!(effect.frames_behind(), 0);
}

#[test]
fn verify_steps_of_one_effect_run_in_order() {
    let steps = Arc::new(Mutex::new(Vec::new()));
    let scheduler = scheduler();
    let effect = ParticleEffect::builder(RecordingEmitter {
        steps: Arc::clone(&steps),
    })
    .scheduler(&scheduler)
    .build();
    let context = DrawingContext::default();

    let expected: Vec<f32> = (1..=12_u8).map(|i| f32::from(i) * 0.001).collect();
    for &dt in &expected {
        effect.update(dt);
        effect.draw(&context, |_, _| ());
    }
    scheduler.flush();

    assert_eq!(*steps.lock(), expected);
}

#[test]
fn verify_render_callback_can_query_effects_while_worker_steps() {
    let (done, finished) = mpsc::channel();
    let render_thread = thread::spawn(move || {
        let settings = ParticleSettings {
            max_frames_behind: 3,
            ..ParticleSettings::production()
        };
        let mut collection = ParticleEffectCollection::new(settings).unwrap();
        let effect = collection.builder(SlowEmitter).build();
        collection.add(effect);
        let context = DrawingContext::default();

        let mut queried = 0;
        for _ in 0..10 {
            for _ in 0..4 {
                collection.update(FRAME);
            }
            collection.draw(&context, |effect, _, _| {
                let _ = effect.bounding_box();
                let _ = effect.particle_count();
                let _ = effect.state();
                queried += 1;
            });
        }
        collection.flush();
        done.send(queried).unwrap();
    });

    let queried = finished
        .recv_timeout(Duration::from_secs(20))
        .expect("render thread stalled while querying an effect");
    assert_eq!(queried, 10);
    render_thread.join().unwrap();
}

// ============================================================================
// TEARDOWN
// ============================================================================

#[test]
fn verify_disposed_effect_stops_stepping() {
    let scheduler = scheduler();
    let effect = ParticleEffect::builder(endless())
        .scheduler(&scheduler)
        .build();
    let context = DrawingContext::default();

    effect.update(FRAME);
    effect.draw(&context, |_, _| ());
    effect.dispose();
    scheduler.flush();

    assert!(effect.steps_applied() <= 1);
    assert_eq!(effect.particle_count(), 0);
    assert_eq!(effect.update(FRAME), EffectState::Removed);
    assert!(effect.draw(&context, |_, _| ()).is_none());
}

#[test]
fn verify_shutdown_falls_back_to_inline_steps() {
    let scheduler = scheduler();
    let effect = ParticleEffect::builder(endless())
        .scheduler(&scheduler)
        .build();
    scheduler.shutdown();

    effect.update(FRAME);
    effect.draw(&DrawingContext::default(), |_, _| ());

    assert_eq!(effect.steps_applied(), 1);
    assert_eq!(effect.frames_behind(), 0);
}

#[test]
fn verify_dropped_scheduler_means_synchronous_updates() {
    let scheduler = scheduler();
    let effect = ParticleEffect::builder(endless())
        .scheduler(&scheduler)
        .build();
    assert!(effect.is_asynchronous());
    drop(scheduler);

    assert!(!effect.is_asynchronous());
    effect.update(FRAME);
    assert_eq!(effect.steps_applied(), 1);
}

// ============================================================================
// COLLECTION
// ============================================================================

#[test]
fn verify_async_collection_detaches_finished_effects() {
    let mut collection = ParticleEffectCollection::new(ParticleSettings::production()).unwrap();
    let mut burst = StandardEmitter::new(EmitterShape::Point);
    burst.emit_count = 4;
    burst.duration = lumen_core::ValueRange::constant(0.1);
    let finite = collection.builder(burst).build();
    collection.add(finite);
    collection.add(collection.builder(endless()).build());
    let context = DrawingContext::default();

    let mut detached = 0;
    for _ in 0..60 {
        detached += collection.update(FRAME);
        collection.draw(&context, |_, _, _| ());
        collection.flush();
    }

    assert_eq!(detached, 1);
    assert_eq!(collection.len(), 1);
}
