//! Parameter definitions with documented units and defaults.

mod audio;
mod effects;
mod mesh;
mod render;

pub use audio::{audio_constants, BeatConfig, FFTConfig};
pub use effects::{BloomIntensityMapping, BloomParams, NoiseParams, PassParams, VignetteParams};
pub use mesh::{
    clamp_noise_speed, MeshParams, NOISE_SPEED_MAX, NOISE_SPEED_MIN, NORMAL_PLAYBACK_RATE,
    NORMAL_STEP, SLOW_PLAYBACK_RATE, SLOW_STEP, TIME_SCALE,
};
pub use render::{hex_to_rgb, RecordingConfig, RenderConfig};
