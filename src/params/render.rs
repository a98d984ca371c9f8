//! Rendering and recording configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane
    pub near_plane: f32,

    /// Far clipping plane
    pub far_plane: f32,

    /// Camera eye position
    pub camera_position: [f32; 3],

    /// Fixed look-at target, re-applied every frame
    pub camera_target: [f32; 3],

    /// Clear color as 0xRRGGBB
    pub background: u32,

    /// Rotation added to each scene axis per frame when auto-rotate is on (radians)
    pub auto_rotate_step: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 45.0,
            near_plane: 1.0,
            far_plane: 2000.0,
            camera_position: [0.0, 45.0, 50.0],
            camera_target: [0.0, 0.0, 0.0],
            background: 0x1a1a1a,
            auto_rotate_step: 0.002,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }

    /// Background color as linear RGB in 0..1
    pub fn background_rgb(&self) -> [f32; 3] {
        hex_to_rgb(self.background)
    }
}

/// Split 0xRRGGBB into normalized channels
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_decodes_to_dark_grey() {
        let rgb = RenderConfig::default().background_rgb();
        let expected = 0x1a as f32 / 255.0;
        for channel in rgb {
            assert!((channel - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_recording_frame_count_rounds_up() {
        let config = RecordingConfig::new(1.01);
        assert_eq!(config.total_frames(), 61);
        assert_eq!(config.frames_dir(), "recording/frames");
    }
}
