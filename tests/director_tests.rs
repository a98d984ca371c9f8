// Frame loop behavior, driven with the software compositor and fixed audio.

use std::cell::RefCell;
use std::rc::Rc;

use formwave::audio::{AudioSignal, StaticSignal};
use formwave::director::{Director, DirectorState, Event, TickOutcome};
use formwave::effects::{Compositor, CpuCompositor, EffectChain};
use formwave::error::DirectorError;
use formwave::input::InputEvent;
use formwave::mesh::{AnimatedMesh, FormKind, SpeedMode};
use formwave::panel::{DebugPanel, PanelChange};
use formwave::params::{MeshParams, PassParams, RenderConfig};

fn config(width: u32, height: u32) -> RenderConfig {
    RenderConfig {
        window_width: width,
        window_height: height,
        ..RenderConfig::default()
    }
}

fn small_mesh() -> AnimatedMesh {
    AnimatedMesh::new(MeshParams {
        width_segments: 8,
        depth_segments: 8,
        ..MeshParams::default()
    })
    .unwrap()
}

fn director_with<A: AudioSignal>(
    width: u32,
    height: u32,
    audio: A,
) -> Director<CpuCompositor, A> {
    let chain = EffectChain::new(CpuCompositor::new(width, height), PassParams::default());
    let mut director = Director::new(
        &config(width, height),
        small_mesh(),
        chain,
        audio,
        DebugPanel::default(),
    );
    director.start().unwrap();
    director
}

fn director() -> Director<CpuCompositor, StaticSignal> {
    director_with(48, 32, StaticSignal::new(0.0, false))
}

/// Records every playback rate change
#[derive(Default)]
struct RateLog {
    rate: f32,
    changes: Vec<f32>,
}

impl AudioSignal for RateLog {
    fn intensity(&self) -> f32 {
        0.0
    }

    fn paused(&self) -> bool {
        false
    }

    fn playback_rate(&self) -> f32 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.rate = rate;
        self.changes.push(rate);
    }

    fn update(&mut self) {}
}

#[test]
fn elapsed_time_follows_normal_step() {
    let mut director = director();
    for _ in 0..10 {
        assert_eq!(director.tick().unwrap(), TickOutcome::Presented);
    }
    assert!((director.mesh().elapsed_time() - 10.0 * 2.0 * 0.002).abs() < 1e-12);
    assert_eq!(director.ticks(), 10);
    assert_eq!(director.audio().updates, 10);
}

#[test]
fn slow_motion_engages_and_releases() {
    let mut director = director();
    let events = director.sender();

    events.send(Event::Input(InputEvent::SlowmoEngage));
    director.tick().unwrap();
    assert_eq!(director.mesh().mode(), SpeedMode::Slow);
    assert_eq!(director.mesh().step(), 0.4);
    assert_eq!(director.mesh().field().speed_flag, 1);
    assert_eq!(director.audio().playback_rate, 0.5);
    assert!((director.mesh().clock().frame() - 0.4).abs() < 1e-12);

    events.send(Event::Input(InputEvent::SlowmoRelease));
    director.tick().unwrap();
    assert_eq!(director.mesh().mode(), SpeedMode::Normal);
    assert_eq!(director.mesh().step(), 2.0);
    assert_eq!(director.mesh().field().speed_flag, 0);
    assert_eq!(director.audio().playback_rate, 1.0);
    assert!((director.mesh().clock().frame() - 2.4).abs() < 1e-12);
}

#[test]
fn repeated_key_down_makes_one_transition() {
    let mut director = director_with(32, 24, RateLog::default());
    let events = director.sender();

    events.send(Event::Input(InputEvent::SlowmoEngage));
    events.send(Event::Input(InputEvent::SlowmoEngage));
    director.tick().unwrap();
    events.send(Event::Input(InputEvent::SlowmoEngage));
    director.tick().unwrap();

    assert_eq!(director.mesh().mode(), SpeedMode::Slow);
    assert_eq!(director.audio().changes, [0.5]);

    events.send(Event::Input(InputEvent::SlowmoRelease));
    events.send(Event::Input(InputEvent::SlowmoRelease));
    director.tick().unwrap();
    assert_eq!(director.audio().changes, [0.5, 1.0]);
}

#[test]
fn bloom_strength_lags_one_frame() {
    let mut director = director_with(32, 24, StaticSignal::new(0.5, false));
    // The first frame renders with the initial strength
    assert!((director.chain().zoom_blur_strength() - 0.3).abs() < 1e-6);

    director.tick().unwrap();
    assert!((director.chain().zoom_blur_strength() - 0.5).abs() < 1e-6);

    director.audio_mut().intensity = 1.0;
    director.tick().unwrap();
    assert!((director.chain().zoom_blur_strength() - 0.8).abs() < 1e-6);

    director.audio_mut().paused = true;
    director.tick().unwrap();
    assert!((director.chain().zoom_blur_strength() - 0.3).abs() < 1e-6);
}

#[test]
fn resize_updates_viewport_camera_and_targets_together() {
    let mut director = director_with(80, 60, StaticSignal::silent());
    let events = director.sender();
    events.send(Event::Resize {
        width: 192,
        height: 108,
    });

    // Applied at the top of the next tick, not on send
    assert_eq!(director.viewport().size(), (80, 60));

    director.tick().unwrap();
    assert_eq!(director.viewport().size(), (192, 108));
    assert_eq!(director.viewport().aspect(), 192.0 / 108.0);
    assert_eq!(director.camera().aspect(), 192.0 / 108.0);
    for size in director.chain().compositor().target_sizes() {
        assert_eq!(size, (192, 108));
    }
    let presented = director.chain().compositor().presented().unwrap();
    assert_eq!(presented.dimensions(), (192, 108));
}

#[test]
fn large_resize_matches_window_size() {
    let mut director = director_with(800, 600, StaticSignal::silent());
    director.sender().send(Event::Resize {
        width: 1920,
        height: 1080,
    });
    director.tick().unwrap();
    assert_eq!(director.camera().aspect(), 1920.0 / 1080.0);
    assert_eq!(
        director.chain().compositor().target_sizes(),
        [(1920, 1080)]
    );
}

#[test]
fn zero_sized_resize_is_ignored() {
    let mut director = director_with(80, 60, StaticSignal::silent());
    director.sender().send(Event::Resize {
        width: 0,
        height: 60,
    });
    director.tick().unwrap();
    assert_eq!(director.viewport().size(), (80, 60));
    assert!(director.camera().aspect().is_finite());
    assert_eq!(director.chain().compositor().target_sizes(), [(80, 60)]);
}

#[test]
fn start_twice_is_an_error() {
    let mut director = director();
    assert!(matches!(
        director.start(),
        Err(DirectorError::AlreadyStarted)
    ));
    assert_eq!(director.state(), DirectorState::Running);
}

#[test]
fn tick_requires_start() {
    let chain = EffectChain::new(CpuCompositor::new(16, 16), PassParams::default());
    let mut director = Director::new(
        &config(16, 16),
        small_mesh(),
        chain,
        StaticSignal::silent(),
        DebugPanel::default(),
    );
    assert_eq!(director.state(), DirectorState::Idle);
    assert!(matches!(director.tick(), Err(DirectorError::NotRunning)));
}

#[test]
fn stop_releases_resources() {
    let mut director = director();
    director.tick().unwrap();

    director.sender().stop();
    assert_eq!(director.tick().unwrap(), TickOutcome::Stopped);
    assert_eq!(director.state(), DirectorState::Stopped);
    assert!(director.chain().compositor().is_released());

    // No further frames run
    assert!(matches!(director.tick(), Err(DirectorError::NotRunning)));
    assert_eq!(director.ticks(), 1);
}

#[test]
fn events_queued_before_stop_still_apply() {
    let mut director = director_with(80, 60, StaticSignal::silent());
    let events = director.sender();
    events.send(Event::Panel(PanelChange::Form(FormKind::Cube)));
    events.stop();
    events.send(Event::Resize {
        width: 160,
        height: 120,
    });

    assert_eq!(director.tick().unwrap(), TickOutcome::Stopped);
    assert_eq!(director.mesh().form(), FormKind::Cube);
    // Nothing after the stop is handled
    assert_eq!(director.viewport().size(), (80, 60));
    assert!(director.chain().compositor().is_released());
    assert_eq!(director.ticks(), 0);
}

#[test]
fn queued_toggles_each_take_effect() {
    let mut director = director();
    let events = director.sender();
    events.send(Event::Panel(PanelChange::ToggleNoise));
    events.send(Event::Panel(PanelChange::ToggleNoise));
    for _ in 0..3 {
        events.send(Event::Panel(PanelChange::ToggleBloom));
    }
    events.send(Event::Panel(PanelChange::NextForm));
    events.send(Event::Panel(PanelChange::NextForm));
    director.tick().unwrap();

    assert!(director.panel().toggles().noise);
    assert!(director.panel().toggles().bloom);
    assert_eq!(director.panel().settings().form, FormKind::Cube);
    assert_eq!(director.mesh().form(), FormKind::Cube);
}

#[test]
fn noise_speed_sets_the_normal_step() {
    let mut director = director();
    let events = director.sender();
    events.send(Event::Panel(PanelChange::NoiseSpeed(2.5)));
    for _ in 0..4 {
        director.tick().unwrap();
    }
    assert_eq!(director.mesh().noise_speed(), 2.5);
    assert!((director.mesh().elapsed_time() - 4.0 * 2.5 * 0.002).abs() < 1e-12);

    // Slow motion keeps its own step
    events.send(Event::Input(InputEvent::SlowmoEngage));
    director.tick().unwrap();
    assert!((director.mesh().clock().frame() - (10.0 + 0.4)).abs() < 1e-12);
}

#[test]
fn panel_changes_reach_mesh_and_hooks() {
    let mut director = director();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    director
        .panel_mut()
        .on_change(move |change| log.borrow_mut().push(*change));

    let events = director.sender();
    events.send(Event::Panel(PanelChange::Form(FormKind::Icosahedron)));
    events.send(Event::Panel(PanelChange::UseBloom(true)));
    director.tick().unwrap();

    assert_eq!(director.mesh().form(), FormKind::Icosahedron);
    assert!(director.panel().toggles().bloom);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn auto_rotate_spins_every_axis() {
    let mut director = director();
    director
        .sender()
        .send(Event::Panel(PanelChange::AutoRotate(true)));
    for _ in 0..5 {
        director.tick().unwrap();
    }
    let rotation = director.scene().rotation;
    for angle in rotation.to_array() {
        assert!((angle - 0.01).abs() < 1e-6);
    }
}

#[test]
fn frame_hash_is_reproducible() {
    let render = || {
        let mut director = director();
        for _ in 0..3 {
            director.tick().unwrap();
        }
        director.chain().compositor().presented_hash()
    };
    let first = render();
    assert!(first.is_some());
    assert_eq!(first, render());
}
