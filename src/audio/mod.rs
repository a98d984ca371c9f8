//! Audio collaborator: synthesis, playback rate control, and drum analysis
//! feeding the per-frame `AudioSignal` reads.

mod beat;
mod fft;
mod signal;
mod synthesis;
mod system;

pub use beat::BeatDetector;
pub use signal::{AudioSignal, StaticSignal};
pub use system::AudioSystem;
