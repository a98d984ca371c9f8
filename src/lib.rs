//! Formwave - an audio-reactive displaced form
//!
//! A noise-displaced mesh pulses with a synthesized drum track, rendered
//! through a noise, vignette and bloom post-processing chain.

pub mod audio;
pub mod camera;
pub mod cli;
pub mod director;
pub mod effects;
pub mod error;
pub mod input;
pub mod mesh;
pub mod panel;
pub mod params;
pub mod rendering;
pub mod scene;
pub mod viewport;
