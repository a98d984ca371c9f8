//! Frame loop orchestration.
//!
//! The director owns the scene, the effect chain, the audio signal, the
//! debug panel and the viewport. Everything that mutates them arrives as an
//! [`Event`] on a channel and is drained at the top of the next tick, so a
//! tick always sees a consistent state.

use glam::Vec3;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::audio::AudioSignal;
use crate::camera::Camera;
use crate::effects::{Compositor, EffectChain};
use crate::error::DirectorError;
use crate::input::{InputEvent, SlowmoLatch};
use crate::mesh::{AnimatedMesh, Color};
use crate::panel::{DebugPanel, PanelChange};
use crate::params::{BloomIntensityMapping, RenderConfig};
use crate::scene::Scene;
use crate::viewport::Viewport;

/// Everything the director reacts to between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Input(InputEvent),
    Resize { width: u32, height: u32 },
    Panel(PanelChange),
    Stop,
}

/// Cloneable handle for queueing events to a director
#[derive(Debug, Clone)]
pub struct EventSender(Sender<Event>);

impl EventSender {
    /// Queue `event`; returns false once the director is gone
    pub fn send(&self, event: Event) -> bool {
        self.0.send(event).is_ok()
    }

    pub fn stop(&self) -> bool {
        self.send(Event::Stop)
    }
}

/// Scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorState {
    Idle,
    Running,
    Stopped,
}

/// What a call to [`Director::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame reached the display target
    Presented,
    /// The display target was unavailable; the animation still advanced
    Skipped,
    /// A stop event was seen; resources are released
    Stopped,
}

pub struct Director<C: Compositor, A: AudioSignal> {
    scene: Scene,
    camera: Camera,
    camera_target: Vec3,
    chain: EffectChain<C>,
    audio: A,
    panel: DebugPanel,
    viewport: Viewport,
    latch: SlowmoLatch,
    bloom: BloomIntensityMapping,
    auto_rotate_step: f32,
    events: Receiver<Event>,
    sender: EventSender,
    state: DirectorState,
    ticks: u64,
}

impl<C: Compositor, A: AudioSignal> Director<C, A> {
    /// Assemble a director; the panel's form, color and noise speed are applied to `mesh`
    pub fn new(
        config: &RenderConfig,
        mut mesh: AnimatedMesh,
        chain: EffectChain<C>,
        audio: A,
        panel: DebugPanel,
    ) -> Self {
        let settings = *panel.settings();
        mesh.set_color(settings.form_color);
        mesh.set_form(settings.form);
        mesh.set_noise_speed(settings.noise_speed);

        let (tx, rx) = mpsc::channel();
        let viewport = Viewport::new(config.window_width, config.window_height);
        let mut camera = Camera::new(config);
        camera.set_aspect(viewport.aspect());

        Self {
            scene: Scene::new(mesh, Color::from_hex(config.background)),
            camera,
            camera_target: Vec3::from_array(config.camera_target),
            chain,
            audio,
            panel,
            viewport,
            latch: SlowmoLatch::new(),
            bloom: BloomIntensityMapping::default(),
            auto_rotate_step: config.auto_rotate_step,
            events: rx,
            sender: EventSender(tx),
            state: DirectorState::Idle,
            ticks: 0,
        }
    }

    /// Move from Idle to Running; only the first call succeeds
    pub fn start(&mut self) -> Result<(), DirectorError> {
        if self.state != DirectorState::Idle {
            return Err(DirectorError::AlreadyStarted);
        }
        self.state = DirectorState::Running;
        log::info!(
            "Director running ({}x{})",
            self.viewport.width(),
            self.viewport.height()
        );
        Ok(())
    }

    /// Run one frame.
    ///
    /// Queued events are applied first. Skipped frames (outdated or timed-out
    /// surface, failed capture) are logged and the animation still advances;
    /// any other render error is returned.
    pub fn tick(&mut self) -> Result<TickOutcome, DirectorError> {
        if self.state != DirectorState::Running {
            return Err(DirectorError::NotRunning);
        }

        while let Ok(event) = self.events.try_recv() {
            if self.handle(event) {
                self.shutdown();
                return Ok(TickOutcome::Stopped);
            }
        }

        self.camera.look_at(self.camera_target);

        self.chain.reset()?;
        self.chain.render_base(&self.scene, &self.camera)?;
        self.chain.apply_enabled_passes(&self.panel.toggles())?;
        let outcome = match self.chain.present() {
            Ok(()) => TickOutcome::Presented,
            Err(err) if !err.is_fatal() => {
                log::warn!("{}", err);
                TickOutcome::Skipped
            }
            Err(err) => return Err(err.into()),
        };

        // Takes effect on the next frame's bloom
        let strength = self.bloom.strength(self.audio.paused(), self.audio.intensity());
        self.chain.set_zoom_blur_strength(strength);

        if self.panel.settings().auto_rotate {
            self.scene.rotate_all(self.auto_rotate_step);
        }

        self.scene.mesh.advance();
        self.audio.update();
        self.ticks += 1;
        Ok(outcome)
    }

    /// Release resources and stop immediately, without waiting for a tick
    pub fn stop(&mut self) {
        if self.state != DirectorState::Stopped {
            self.shutdown();
        }
    }

    fn shutdown(&mut self) {
        self.chain.release();
        self.state = DirectorState::Stopped;
        log::info!("Director stopped after {} ticks", self.ticks);
    }

    /// Apply one queued event; returns true when it asks the director to stop
    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Input(input) => {
                if let Some(edge) = self.latch.filter(input) {
                    let mesh = &mut self.scene.mesh;
                    match edge {
                        InputEvent::SlowmoEngage => mesh.enter_slow_mode(&mut self.audio),
                        InputEvent::SlowmoRelease => mesh.enter_normal_mode(&mut self.audio),
                    };
                }
            }
            Event::Resize { width, height } => self.resize(width, height),
            Event::Panel(change) => match self.panel.apply(change) {
                PanelChange::FormColor(color) => self.scene.mesh.set_color(color),
                PanelChange::Form(form) => self.scene.mesh.set_form(form),
                PanelChange::NoiseSpeed(speed) => self.scene.mesh.set_noise_speed(speed),
                _ => {}
            },
            Event::Stop => return true,
        }
        false
    }

    /// Viewport, camera projection and compositor targets change together
    fn resize(&mut self, width: u32, height: u32) {
        if !self.viewport.resize(width, height) {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.camera.set_aspect(self.viewport.aspect());
        self.chain.resize(width, height);
        log::debug!("Resized to {}x{}", width, height);
    }

    /// Handle for queueing events from other parts of the program
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn state(&self) -> DirectorState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mesh(&self) -> &AnimatedMesh {
        &self.scene.mesh
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn chain(&self) -> &EffectChain<C> {
        &self.chain
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn panel(&self) -> &DebugPanel {
        &self.panel
    }

    /// Mutable panel access, for registering change hooks
    pub fn panel_mut(&mut self) -> &mut DebugPanel {
        &mut self.panel
    }
}

