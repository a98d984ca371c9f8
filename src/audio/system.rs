//! Audio system managing synthesis, playback, and drum analysis.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use super::beat::BeatDetector;
use super::fft::{spawn_fft_thread, DrumEnergy};
use super::signal::AudioSignal;
use super::synthesis::composition;
use crate::error::AudioError;
use crate::params::{audio_constants::BLOCK_SIZE, BeatConfig, FFTConfig, RecordingConfig};

type WavWriter = hound::WavWriter<std::io::BufWriter<std::fs::File>>;

/// Live audio collaborator: glicol synthesis out through cpal, with the drum
/// band analyzed on a background thread.
pub struct AudioSystem {
    engine: Arc<Mutex<Engine<BLOCK_SIZE>>>,

    /// Latest drum band reading (written by the FFT thread)
    drum: Arc<Mutex<DrumEnergy>>,

    /// Set by the stream error callback
    paused: Arc<AtomicBool>,

    /// Cleared on drop to stop the FFT thread
    running: Arc<AtomicBool>,

    beat: BeatDetector,
    last_sequence: u64,
    playback_rate: f32,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    fft_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Create and start audio system with specified configuration.
    ///
    /// The output device's sample rate overrides `fft_config.sample_rate_hz`;
    /// the engine and the WAV writer run at it too.
    pub fn new(
        fft_config: FFTConfig,
        beat_config: BeatConfig,
        recording_config: Option<&RecordingConfig>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0;

        log::info!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate
        );

        let fft_config = fft_config.with_sample_rate(sample_rate as usize);
        fft_config.validate().map_err(AudioError::FftConfig)?;

        // Create WAV writer if recording
        let wav_writer: Option<Arc<Mutex<WavWriter>>> = match recording_config {
            Some(config) => {
                let spec = hound::WavSpec {
                    channels: 2,
                    sample_rate,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(config.audio_path(), spec)?;
                Some(Arc::new(Mutex::new(writer)))
            }
            None => None,
        };

        let playback_rate = 1.0;
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(fft_config.sample_rate_hz);
        engine.update_with_code(&composition(playback_rate));
        engine
            .update()
            .map_err(|e| AudioError::Engine(format!("{:?}", e)))?;

        let engine = Arc::new(Mutex::new(engine));
        let engine_clone = Arc::clone(&engine);

        let fft_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let fft_buffer_clone = Arc::clone(&fft_buffer);

        let drum = Arc::new(Mutex::new(DrumEnergy::default()));
        let paused = Arc::new(AtomicBool::new(false));
        let paused_callback = Arc::clone(&paused);
        let paused_on_error = Arc::clone(&paused);
        let running = Arc::new(AtomicBool::new(true));

        let channels = config.channels() as usize;
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if paused_callback.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }
                let (Ok(mut engine), Ok(mut fft_buf)) =
                    (engine_clone.lock(), fft_buffer_clone.lock())
                else {
                    data.fill(0.0);
                    return;
                };

                let frames_needed = data.len() / channels.max(1);
                let mut frame_idx = 0;

                // Generate multiple blocks if needed to fill the entire buffer
                while frame_idx < frames_needed {
                    let (buffers, _) = engine.next_block(vec![]);
                    let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                    for i in 0..samples_to_copy {
                        // Hard clip to ±0.5
                        let left = buffers[0][i].clamp(-0.5, 0.5);
                        let right = buffers[1][i].clamp(-0.5, 0.5);

                        let out_idx = (frame_idx + i) * channels;
                        if channels >= 2 {
                            data[out_idx] = left;
                            data[out_idx + 1] = right;
                            for extra in 2..channels {
                                data[out_idx + extra] = 0.0;
                            }
                        } else {
                            data[out_idx] = 0.5 * (left + right);
                        }

                        fft_buf.push(0.5 * (left + right));

                        if let Some(ref writer) = wav_writer {
                            if let Ok(mut w) = writer.lock() {
                                let _ = w.write_sample(left);
                                let _ = w.write_sample(right);
                            }
                        }
                    }

                    frame_idx += samples_to_copy;
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
                paused_on_error.store(true, Ordering::Relaxed);
            },
            None,
        )?;

        stream.play()?;

        let fft_thread = spawn_fft_thread(
            fft_config,
            fft_buffer,
            Arc::clone(&drum),
            Arc::clone(&running),
        );

        Ok(Self {
            engine,
            drum,
            paused,
            running,
            beat: BeatDetector::new(beat_config),
            last_sequence: 0,
            playback_rate,
            _stream: stream,
            fft_thread: Some(fft_thread),
        })
    }
}

impl AudioSignal for AudioSystem {
    fn intensity(&self) -> f32 {
        self.beat.intensity()
    }

    fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    fn set_playback_rate(&mut self, rate: f32) {
        if rate == self.playback_rate {
            return;
        }
        let Ok(mut engine) = self.engine.lock() else {
            log::error!("Audio engine lock poisoned; playback rate unchanged");
            return;
        };
        engine.update_with_code(&composition(rate));
        match engine.update() {
            Ok(_) => {
                self.playback_rate = rate;
                log::debug!("Audio playback rate set to {rate}");
            }
            Err(e) => log::error!("Failed to change playback rate: {:?}", e),
        }
    }

    fn update(&mut self) {
        let reading = match self.drum.lock() {
            Ok(drum) => *drum,
            Err(_) => return,
        };
        if reading.sequence != self.last_sequence {
            self.last_sequence = reading.sequence;
            self.beat.push(reading.energy);
        } else {
            self.beat.decay();
        }
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.fft_thread.take() {
            let _ = handle.join();
        }
    }
}
