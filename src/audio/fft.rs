//! FFT analysis thread and utilities.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::params::FFTConfig;

/// Latest drum band reading published by the analysis thread
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DrumEnergy {
    /// Mean magnitude over the drum bins
    pub energy: f32,
    /// Incremented for every new analysis window
    pub sequence: u64,
}

/// Spawn FFT analysis thread; it exits once `running` is cleared
pub fn spawn_fft_thread(
    config: FFTConfig,
    fft_buffer: Arc<Mutex<Vec<f32>>>,
    drum: Arc<Mutex<DrumEnergy>>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let mut fft_output = vec![Complex::new(0.0, 0.0); config.fft_size];
        let window: Vec<f32> = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();

        while running.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(config.update_interval_ms));

            let Ok(mut fft_buf) = fft_buffer.lock() else {
                break;
            };

            if fft_buf.len() < config.fft_size {
                continue;
            }

            // Analyze the most recent window
            let start = fft_buf.len() - config.fft_size;
            for (i, out) in fft_output.iter_mut().enumerate() {
                *out = Complex::new(fft_buf[start + i] * window[i], 0.0);
            }

            // 50% overlap with the next window
            let keep_from = fft_buf.len().saturating_sub(config.fft_size / 2);
            fft_buf.drain(0..keep_from);
            drop(fft_buf);

            fft.process(&mut fft_output);
            let energy = band_energy(&fft_output, config.drum_bins());

            if let Ok(mut shared) = drum.lock() {
                shared.energy = energy;
                shared.sequence = shared.sequence.wrapping_add(1);
            }
        }
        log::debug!("FFT analysis thread stopped");
    })
}

/// Mean magnitude over a bin range
pub fn band_energy(spectrum: &[Complex<f32>], bins: std::ops::Range<usize>) -> f32 {
    let end = bins.end.min(spectrum.len());
    let start = bins.start.min(end);
    if start == end {
        return 0.0;
    }
    spectrum[start..end].iter().map(|c| c.norm()).sum::<f32>() / (end - start) as f32
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
