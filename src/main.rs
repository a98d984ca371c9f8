//! Formwave - an audio-reactive displaced form
//!
//! Hold space for slow motion. N, V and B toggle the noise, vignette and
//! bloom passes; R toggles auto-rotate; F cycles the form; `[` and `]`
//! change the noise speed.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use formwave::audio::{AudioSignal, AudioSystem, StaticSignal};
use formwave::cli::Args;
use formwave::director::{Director, Event, EventSender, TickOutcome};
use formwave::effects::{CpuCompositor, EffectChain};
use formwave::input::{map_key_event, panel_shortcut};
use formwave::mesh::AnimatedMesh;
use formwave::panel::DebugPanel;
use formwave::params::{BeatConfig, FFTConfig, MeshParams, PassParams, RecordingConfig};
use formwave::rendering::{FrameRecorder, GpuCompositor, RenderSystem};

type WindowDirector = Director<GpuCompositor, Box<dyn AudioSignal>>;

/// Main application state
struct App {
    args: Args,
    recording: Option<RecordingConfig>,

    window: Option<Arc<Window>>,
    director: Option<WindowDirector>,
    events: Option<EventSender>,

    /// First fatal error, returned from `main` after the loop exits
    error: Option<anyhow::Error>,
}

impl App {
    fn new(args: Args, recording: Option<RecordingConfig>) -> Self {
        Self {
            args,
            recording,
            window: None,
            director: None,
            events: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let config = self.args.render_config();
        let window_attributes = Window::default_attributes()
            .with_title("Formwave")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window_width,
                config.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("failed to create window")?,
        );

        let system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.recording.is_some(),
        ))
        .context("failed to initialize rendering")?;
        let recorder = self.recording.clone().map(FrameRecorder::new);
        let compositor = GpuCompositor::new(system, recorder)?;
        let chain = EffectChain::new(compositor, PassParams::default());

        let audio = create_audio(&self.args, self.recording.as_ref());
        let mesh = AnimatedMesh::new(MeshParams::default())?;
        let mut panel = DebugPanel::new(self.args.panel_settings());
        panel.on_change(|change| log::info!("Panel: {:?}", change));

        let mut director = Director::new(&config, mesh, chain, audio, panel);
        director.start()?;

        // The surface may differ from the requested size (HiDPI, tiling WMs)
        let size = window.inner_size();
        let events = director.sender();
        events.send(Event::Resize {
            width: size.width,
            height: size.height,
        });

        log::info!("Formwave is running! Hold SPACE for slow motion, ESC to quit");

        self.window = Some(window);
        self.events = Some(events);
        self.director = Some(director);
        Ok(())
    }

    fn send(&self, event: Event) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(director) = self.director.as_mut() else {
            return;
        };

        match director.tick() {
            Ok(TickOutcome::Stopped) => event_loop.exit(),
            Ok(_) => {
                if director.chain().compositor().recording_finished() {
                    log::info!("Recording finished, exiting");
                    self.send(Event::Stop);
                }
            }
            Err(err) => {
                log::error!("Render error: {}", err);
                director.stop();
                self.error = Some(err.into());
                event_loop.exit();
            }
        }
    }
}

/// Live audio unless muted; a silent paused signal when no device is usable
fn create_audio(args: &Args, recording: Option<&RecordingConfig>) -> Box<dyn AudioSignal> {
    if args.mute {
        log::info!("Audio muted");
        return Box::new(StaticSignal::silent());
    }
    match AudioSystem::new(FFTConfig::default(), BeatConfig::default(), recording) {
        Ok(audio) => Box::new(audio),
        Err(err) => {
            log::warn!("Audio unavailable ({}), continuing silent", err);
            Box::new(StaticSignal::silent())
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(err) = self.init(event_loop) {
            log::error!("{:#}", err);
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.send(Event::Stop),
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(input) = map_key_event(&event) {
                    self.send(Event::Input(input));
                } else if let Some(change) = panel_shortcut(&event) {
                    self.send(Event::Panel(change));
                }
            }
            WindowEvent::Resized(size) => self.send(Event::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(director) = self.director.as_mut() {
            director.stop();
        }
    }
}

/// Render `frames` ticks with the software compositor and save the last one
fn run_headless(args: &Args, frames: u32) -> anyhow::Result<()> {
    let config = args.render_config();
    let compositor = CpuCompositor::new(config.window_width, config.window_height);
    let chain = EffectChain::new(compositor, PassParams::default());
    let mesh = AnimatedMesh::new(MeshParams::default())?;
    let panel = DebugPanel::new(args.panel_settings());

    let mut director = Director::new(&config, mesh, chain, StaticSignal::silent(), panel);
    director.start()?;
    log::info!(
        "Rendering {} frames headless at {}x{}",
        frames,
        config.window_width,
        config.window_height
    );
    for _ in 0..frames.max(1) {
        director.tick()?;
    }

    let compositor = director.chain().compositor();
    compositor
        .save_presented(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    if let Some(hash) = compositor.presented_hash() {
        log::info!("Wrote {} (frame hash {:016x})", args.out.display(), hash);
    }
    director.stop();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Some(frames) = args.headless {
        return run_headless(&args, frames);
    }

    let recording = args.create_recording_config()?;
    if let Some(config) = &recording {
        log::info!(
            "Recording {} frames to {}",
            config.total_frames(),
            config.output_dir
        );
    }

    let mut app = App::new(args, recording);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
