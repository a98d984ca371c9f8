//! Command-line argument parsing.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use crate::mesh::{Color, FormKind};
use crate::panel::PanelSettings;
use crate::params::{clamp_noise_speed, RecordingConfig, RenderConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "formwave")]
#[command(about = "Audio-reactive displaced form with post-processing", long_about = None)]
pub struct Args {
    /// Window width (pixels)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Window height (pixels)
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Disable the film grain pass
    #[arg(long)]
    pub no_noise: bool,

    /// Disable the vignette pass
    #[arg(long)]
    pub no_vignette: bool,

    /// Enable the bloom pass
    #[arg(long)]
    pub bloom: bool,

    /// Slowly rotate the whole scene
    #[arg(long)]
    pub auto_rotate: bool,

    /// Form color as #rrggbb
    #[arg(long, value_name = "HEX", default_value = "#ff5555")]
    pub color: Color,

    /// Form geometry: plane, sphere, cube, icosahedron
    #[arg(long, default_value = "plane")]
    pub form: FormKind,

    /// Frame clock step in normal playback (1.0 to 10.0)
    #[arg(long, value_name = "STEP", default_value_t = 2.0)]
    pub noise_speed: f64,

    /// Run without audio output (bloom uses the paused strength)
    #[arg(long)]
    pub mute: bool,

    /// Record frames and audio (duration in seconds)
    #[arg(long, value_name = "SECONDS", conflicts_with = "headless")]
    pub record: Option<f32>,

    /// Render this many frames with the software compositor, no window
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u32>,

    /// Output PNG for headless mode
    #[arg(long, value_name = "PATH", default_value = "frame.png")]
    pub out: PathBuf,
}

impl Args {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            window_width: self.width.max(1),
            window_height: self.height.max(1),
            ..RenderConfig::default()
        }
    }

    /// Initial debug panel settings
    pub fn panel_settings(&self) -> PanelSettings {
        PanelSettings {
            use_noise: !self.no_noise,
            use_vignette: !self.no_vignette,
            use_bloom: self.bloom,
            auto_rotate: self.auto_rotate,
            form_color: self.color,
            form: self.form,
            noise_speed: clamp_noise_speed(self.noise_speed),
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> anyhow::Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(duration);

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())
            .with_context(|| format!("failed to create {}", config.frames_dir()))?;
        std::fs::create_dir_all(&config.output_dir)
            .with_context(|| format!("failed to create {}", config.output_dir))?;

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_panel_defaults() {
        let args = Args::parse_from(["formwave"]);
        assert_eq!(args.panel_settings(), PanelSettings::default());
        assert_eq!(args.render_config().window_width, 1280);
        assert!(args.record.is_none());
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "formwave",
            "--no-noise",
            "--bloom",
            "--form",
            "sphere",
            "--color",
            "#00ff00",
            "--headless",
            "3",
            "--noise-speed",
            "25",
        ]);
        let settings = args.panel_settings();
        assert!(!settings.use_noise);
        assert!(settings.use_vignette);
        assert!(settings.use_bloom);
        assert_eq!(settings.form, FormKind::Sphere);
        assert_eq!(settings.form_color, Color::from_hex(0x00ff00));
        assert_eq!(args.headless, Some(3));
        assert_eq!(settings.noise_speed, 10.0);
    }

    #[test]
    fn test_rejects_bad_color() {
        assert!(Args::try_parse_from(["formwave", "--color", "red"]).is_err());
    }
}
