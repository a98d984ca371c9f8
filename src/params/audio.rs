//! Audio analysis configuration and constants.

use std::ops::Range;

/// FFT analysis configuration
#[derive(Debug, Clone)]
pub struct FFTConfig {
    /// Audio sample rate (Hz); replaced by the output device's rate at startup
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// FFT update interval (milliseconds)
    pub update_interval_ms: u64,

    /// Kick drum frequency range (Hz)
    pub drum_range_hz: (f32, f32),
}

impl Default for FFTConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 1024,
            update_interval_ms: 20,
            drum_range_hz: (40.0, 300.0),
        }
    }
}

impl FFTConfig {
    /// Same analysis settings at another sample rate
    pub fn with_sample_rate(self, sample_rate_hz: usize) -> Self {
        Self {
            sample_rate_hz,
            ..self
        }
    }

    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Get FFT bin range for the drum band
    pub fn drum_bins(&self) -> Range<usize> {
        self.hz_to_bin(self.drum_range_hz.0)..self.hz_to_bin(self.drum_range_hz.1)
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if self.drum_bins().is_empty() {
            return Err("Drum band maps to no FFT bins".to_string());
        }
        Ok(())
    }
}

/// Onset detector tuning for the drum band
#[derive(Debug, Clone)]
pub struct BeatConfig {
    /// Number of past energy readings kept for the running mean
    pub history_len: usize,

    /// Energy must exceed mean * sensitivity to count as a beat
    pub sensitivity: f32,

    /// Multiplier applied to the intensity each tick without a beat
    pub decay: f32,

    /// Energy below this is treated as silence
    pub floor: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            history_len: 43,
            sensitivity: 1.4,
            decay: 0.92,
            floor: 1e-4,
        }
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drum_bins_follow_sample_rate() {
        let config = FFTConfig::default();
        assert_eq!(config.hz_to_bin(1000.0), 23);

        let config = config.with_sample_rate(48_000);
        assert_eq!(config.sample_rate_hz, 48_000);
        assert_eq!(config.fft_size, 1024);
        assert_eq!(config.hz_to_bin(1000.0), 21);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        let config = FFTConfig::default().with_sample_rate(0);
        assert!(config.validate().is_err());
    }
}
