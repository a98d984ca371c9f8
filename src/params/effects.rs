//! Post-processing pass parameters and audio-to-bloom mapping.

/// Film-grain style noise pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    /// Grain strength added to each channel (0..1)
    pub amount: f32,

    /// Grain animation speed (pattern offset per frame)
    pub speed: f32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            amount: 0.05,
            speed: 0.05,
        }
    }
}

/// Radial darkening toward the frame edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VignetteParams {
    /// Darkening strength at the corners (0 = none)
    pub amount: f32,
}

impl Default for VignetteParams {
    fn default() -> Self {
        Self { amount: 1.0 }
    }
}

/// Multi-pass bloom with an optional radial zoom blur
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    /// Blend weight of the blurred glow over the source
    pub strength: f32,

    /// Blur radius as a fraction of the shorter frame side
    pub blur_amount: f32,

    /// Whether the glow is smeared toward the frame center
    pub apply_zoom_blur: bool,

    /// Zoom blur length; driven by the audio signal every frame
    pub zoom_blur_strength: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            strength: 0.5,
            blur_amount: 0.1,
            apply_zoom_blur: true,
            zoom_blur_strength: 0.3,
        }
    }
}

/// All pass parameters consumed by the effect chain
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassParams {
    pub noise: NoiseParams,
    pub vignette: VignetteParams,
    pub bloom: BloomParams,
}

/// Mapping from audio state to the bloom zoom-blur strength
#[derive(Debug, Clone, Copy)]
pub struct BloomIntensityMapping {
    /// Value used while the audio is paused
    pub paused_strength: f32,

    /// Value at zero intensity
    pub base_strength: f32,

    /// Added per unit of intensity.
    /// Formula: strength = base_strength + intensity * intensity_scale
    pub intensity_scale: f32,
}

impl Default for BloomIntensityMapping {
    fn default() -> Self {
        Self {
            paused_strength: 0.3,
            base_strength: 0.2,
            intensity_scale: 0.6,
        }
    }
}

impl BloomIntensityMapping {
    pub fn strength(&self, paused: bool, intensity: f32) -> f32 {
        if paused {
            self.paused_strength
        } else {
            self.base_strength + intensity * self.intensity_scale
        }
    }
}
