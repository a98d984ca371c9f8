//! Ordered, conditionally enabled post-processing over a compositor.

use super::{Compositor, EffectToggleSet, PassKind};
use crate::camera::Camera;
use crate::error::RenderError;
use crate::params::PassParams;
use crate::scene::Scene;

/// Where the chain is within the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Reset,
    Base,
    Presented,
}

/// Post-processing chain.
///
/// Pass parameters are fixed at construction except the bloom zoom-blur
/// strength, which the director rewrites every tick.
pub struct EffectChain<C: Compositor> {
    compositor: C,
    params: PassParams,
    stage: Stage,
    /// Frames started so far; seeds time-based passes
    frame: u64,
    /// Passes applied since the last `reset`, in order
    applied: Vec<PassKind>,
    /// Enabled pass set seen on the previous frame (for change logging)
    last_toggles: Option<EffectToggleSet>,
}

impl<C: Compositor> EffectChain<C> {
    pub fn new(compositor: C, params: PassParams) -> Self {
        Self {
            compositor,
            params,
            stage: Stage::Presented,
            frame: 0,
            applied: Vec::with_capacity(PassKind::ORDER.len()),
            last_toggles: None,
        }
    }

    pub fn reset(&mut self) -> Result<(), RenderError> {
        self.compositor.reset()?;
        self.applied.clear();
        self.frame += 1;
        self.stage = Stage::Reset;
        Ok(())
    }

    /// Render the scene into the working buffer
    pub fn render_base(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        self.compositor.render_base(scene, camera)?;
        self.stage = Stage::Base;
        Ok(())
    }

    /// Apply each enabled pass in order; with none enabled the base image is left as is
    pub fn apply_enabled_passes(&mut self, toggles: &EffectToggleSet) -> Result<(), RenderError> {
        if self.stage != Stage::Base {
            return Err(RenderError::NoBaseFrame);
        }
        if self.last_toggles != Some(*toggles) {
            let names: Vec<_> = toggles.enabled().map(PassKind::label).collect();
            log::info!("Pass chain: [{}]", names.join(" -> "));
            self.last_toggles = Some(*toggles);
        }

        for pass in toggles.enabled() {
            self.compositor.apply(pass, &self.params, self.frame)?;
            self.applied.push(pass);
        }
        Ok(())
    }

    pub fn present(&mut self) -> Result<(), RenderError> {
        if self.stage != Stage::Base {
            return Err(RenderError::NoBaseFrame);
        }
        self.compositor.present()?;
        self.stage = Stage::Presented;
        Ok(())
    }

    pub fn set_zoom_blur_strength(&mut self, strength: f32) {
        self.params.bloom.zoom_blur_strength = strength;
    }

    pub fn zoom_blur_strength(&self) -> f32 {
        self.params.bloom.zoom_blur_strength
    }

    pub fn params(&self) -> &PassParams {
        &self.params
    }

    pub fn applied_passes(&self) -> &[PassKind] {
        &self.applied
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.compositor.resize(width, height);
    }

    pub fn release(&mut self) {
        self.compositor.release();
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut C {
        &mut self.compositor
    }
}
