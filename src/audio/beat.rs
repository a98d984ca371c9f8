//! Drum onset detection over band energy readings.

use std::collections::VecDeque;

use crate::params::BeatConfig;

/// Turns a stream of drum-band energies into a decaying [0, 1] intensity.
///
/// An onset is an energy reading above `mean * sensitivity` of the recent
/// history. Onsets set the intensity to the energy ratio (capped at 1);
/// otherwise the intensity decays geometrically.
pub struct BeatDetector {
    config: BeatConfig,
    history: VecDeque<f32>,
    intensity: f32,
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        let capacity = config.history_len.max(1);
        Self {
            config,
            history: VecDeque::with_capacity(capacity),
            intensity: 0.0,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Let the intensity fall off for a tick with no new reading
    pub fn decay(&mut self) {
        self.intensity *= self.config.decay;
    }

    /// Feed one energy reading; returns true when it was an onset
    pub fn push(&mut self, energy: f32) -> bool {
        let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };
        let mean = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f32>() / self.history.len() as f32
        };

        let threshold = mean * self.config.sensitivity;
        let onset = energy > self.config.floor && energy > threshold;
        if onset {
            let ratio = if threshold > 0.0 { energy / threshold } else { 1.0 };
            self.intensity = self.intensity.max(ratio.min(1.0)).max(0.5);
        } else {
            self.decay();
        }
        self.intensity = self.intensity.clamp(0.0, 1.0);

        if self.history.len() >= self.config.history_len.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(energy);
        onset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_stays_at_zero() {
        let mut detector = BeatDetector::new(BeatConfig::default());
        for _ in 0..100 {
            assert!(!detector.push(0.0));
        }
        assert_eq!(detector.intensity(), 0.0);
    }

    #[test]
    fn test_spike_registers_and_decays() {
        let mut detector = BeatDetector::new(BeatConfig::default());
        for _ in 0..20 {
            detector.push(0.1);
        }
        assert!(detector.push(1.0));
        let peak = detector.intensity();
        assert!(peak >= 0.5 && peak <= 1.0);

        detector.push(0.1);
        assert!(detector.intensity() < peak);
    }

    #[test]
    fn test_intensity_stays_normalized() {
        let mut detector = BeatDetector::new(BeatConfig::default());
        for i in 0..200 {
            let energy = if i % 10 == 0 { 50.0 } else { f32::NAN };
            detector.push(energy);
            assert!((0.0..=1.0).contains(&detector.intensity()));
        }
    }
}
