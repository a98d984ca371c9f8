//! Post-processing: the effect chain and the backends that execute it.
//!
//! A frame goes through `reset` → `render_base` → `apply_enabled_passes`
//! → `present`. Passes run in the fixed order noise → vignette → bloom,
//! each reading the previous pass's output.

mod chain;
mod cpu;
mod raster;

pub use chain::EffectChain;
pub use cpu::{
    apply_bloom, apply_noise, apply_vignette, bloom_radius, frame_hash, CpuCompositor,
};

use crate::camera::Camera;
use crate::error::RenderError;
use crate::params::PassParams;
use crate::scene::Scene;

/// A full-screen post-processing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Noise,
    Vignette,
    Bloom,
}

impl PassKind {
    /// Composition order
    pub const ORDER: [PassKind; 3] = [PassKind::Noise, PassKind::Vignette, PassKind::Bloom];

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Noise => "noise",
            PassKind::Vignette => "vignette",
            PassKind::Bloom => "bloom",
        }
    }
}

/// Which passes run this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectToggleSet {
    pub noise: bool,
    pub vignette: bool,
    pub bloom: bool,
}

impl Default for EffectToggleSet {
    fn default() -> Self {
        Self {
            noise: true,
            vignette: true,
            bloom: false,
        }
    }
}

impl EffectToggleSet {
    pub const NONE: EffectToggleSet = EffectToggleSet {
        noise: false,
        vignette: false,
        bloom: false,
    };

    pub fn is_enabled(&self, pass: PassKind) -> bool {
        match pass {
            PassKind::Noise => self.noise,
            PassKind::Vignette => self.vignette,
            PassKind::Bloom => self.bloom,
        }
    }

    /// Enabled passes in composition order
    pub fn enabled(&self) -> impl Iterator<Item = PassKind> + '_ {
        PassKind::ORDER
            .into_iter()
            .filter(move |pass| self.is_enabled(*pass))
    }
}

/// Backend executing the effect chain primitives.
///
/// Implementations keep a working buffer: `render_base` fills it with the
/// scene, each `apply` transforms it in place (or via a ping-pong target),
/// and `present` hands it to the display target.
pub trait Compositor {
    /// Current render target size
    fn size(&self) -> (u32, u32);

    /// Sizes of every render target the backend owns
    fn target_sizes(&self) -> Vec<(u32, u32)>;

    /// Drop per-frame state before a new frame begins
    fn reset(&mut self) -> Result<(), RenderError>;

    fn render_base(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError>;

    /// Run one pass over the working buffer; `frame` animates time-based passes
    fn apply(&mut self, pass: PassKind, params: &PassParams, frame: u64)
        -> Result<(), RenderError>;

    fn present(&mut self) -> Result<(), RenderError>;

    /// Resize every render target (zero sizes are never passed)
    fn resize(&mut self, width: u32, height: u32);

    /// Release backend resources; no further frames are drawn
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toggles() {
        let toggles = EffectToggleSet::default();
        let enabled: Vec<_> = toggles.enabled().collect();
        assert_eq!(enabled, [PassKind::Noise, PassKind::Vignette]);
    }

    #[test]
    fn test_enabled_keeps_fixed_order() {
        let toggles = EffectToggleSet {
            noise: true,
            vignette: false,
            bloom: true,
        };
        let enabled: Vec<_> = toggles.enabled().collect();
        assert_eq!(enabled, [PassKind::Noise, PassKind::Bloom]);
        assert_eq!(EffectToggleSet::NONE.enabled().count(), 0);
    }
}
