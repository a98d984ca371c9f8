//! The audio collaborator as seen by the frame loop.

/// Per-frame audio state consumed by the director.
///
/// `intensity` and `paused` are read once per tick before the next frame's
/// bloom strength is derived; `update` is called once per tick after
/// rendering to advance analysis for the following read.
pub trait AudioSignal {
    /// Normalized drum intensity in [0, 1]
    fn intensity(&self) -> f32;

    fn paused(&self) -> bool;

    fn playback_rate(&self) -> f32;

    fn set_playback_rate(&mut self, rate: f32);

    fn update(&mut self);
}

impl<T: AudioSignal + ?Sized> AudioSignal for Box<T> {
    fn intensity(&self) -> f32 {
        (**self).intensity()
    }

    fn paused(&self) -> bool {
        (**self).paused()
    }

    fn playback_rate(&self) -> f32 {
        (**self).playback_rate()
    }

    fn set_playback_rate(&mut self, rate: f32) {
        (**self).set_playback_rate(rate)
    }

    fn update(&mut self) {
        (**self).update()
    }
}

/// Fixed-value signal used when no audio device is available, in headless
/// renders, and in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSignal {
    pub intensity: f32,
    pub paused: bool,
    pub playback_rate: f32,
    /// Number of `update` calls observed
    pub updates: u64,
}

impl StaticSignal {
    pub fn new(intensity: f32, paused: bool) -> Self {
        Self {
            intensity: intensity.clamp(0.0, 1.0),
            paused,
            playback_rate: 1.0,
            updates: 0,
        }
    }

    /// A silent, paused signal
    pub fn silent() -> Self {
        Self::new(0.0, true)
    }
}

impl AudioSignal for StaticSignal {
    fn intensity(&self) -> f32 {
        self.intensity
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.playback_rate = rate;
    }

    fn update(&mut self) {
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_signal_clamps_intensity() {
        assert_eq!(StaticSignal::new(3.0, false).intensity(), 1.0);
        assert_eq!(StaticSignal::new(-1.0, false).intensity(), 0.0);
    }

    #[test]
    fn test_boxed_signal_forwards() {
        let mut boxed: Box<dyn AudioSignal> = Box::new(StaticSignal::new(0.5, false));
        boxed.set_playback_rate(0.5);
        boxed.update();
        assert_eq!(boxed.playback_rate(), 0.5);
        assert_eq!(boxed.intensity(), 0.5);
        assert!(!boxed.paused());
    }
}
