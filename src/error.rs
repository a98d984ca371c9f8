//! Error types for rendering, audio, and the frame loop.

use thiserror::Error;

/// Failures raised while creating or driving the render backends.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface does not support any texture format")]
    NoSurfaceFormat,

    #[error("shader program '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    /// The presentation surface went away mid-session; the loop cannot continue
    #[error("rendering surface lost")]
    SurfaceLost,

    #[error("GPU out of memory")]
    OutOfMemory,

    /// Frame could not be acquired this tick; the next tick may succeed
    #[error("frame skipped: {0}")]
    FrameSkipped(wgpu::SurfaceError),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("post-processing requested before the scene was rendered")]
    NoBaseFrame,

    #[error("compositor resources were released")]
    Released,
}

impl RenderError {
    /// Whether the tick loop must halt rather than wait for the next frame
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RenderError::FrameSkipped(_) | RenderError::Capture(_))
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::FrameSkipped(other),
        }
    }
}

/// Failures raised by the audio collaborator.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoDevice,

    #[error("failed to query audio config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("glicol engine rejected composition: {0}")]
    Engine(String),

    #[error("invalid FFT config: {0}")]
    FftConfig(String),

    #[error("failed to create WAV writer: {0}")]
    Wav(#[from] hound::Error),
}

/// Failures raised by the frame loop orchestrator.
#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("director already started")]
    AlreadyStarted,

    #[error("director is not running")]
    NotRunning,

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct ColorParseError(pub String);
