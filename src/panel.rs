//! Debug panel: runtime-tweakable settings with change hooks.

use std::fmt;

use crate::effects::EffectToggleSet;
use crate::mesh::{Color, FormKind};
use crate::params::{clamp_noise_speed, NORMAL_STEP};

/// Settings exposed by the debug panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSettings {
    pub use_noise: bool,
    pub use_vignette: bool,
    pub use_bloom: bool,
    /// Spin the whole scene by a small angle every tick
    pub auto_rotate: bool,
    pub form_color: Color,
    pub form: FormKind,
    /// Frame clock step in normal playback, 1.0 to 10.0
    pub noise_speed: f64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        let toggles = EffectToggleSet::default();
        Self {
            use_noise: toggles.noise,
            use_vignette: toggles.vignette,
            use_bloom: toggles.bloom,
            auto_rotate: false,
            form_color: Color::from_hex(0xff5555),
            form: FormKind::Plane,
            noise_speed: NORMAL_STEP,
        }
    }
}

/// A single edit made through the panel.
///
/// The toggle, cycle and adjust variants are relative to the settings at the
/// time they are applied, so several queued before one tick all take effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelChange {
    UseNoise(bool),
    UseVignette(bool),
    UseBloom(bool),
    AutoRotate(bool),
    FormColor(Color),
    Form(FormKind),
    NoiseSpeed(f64),
    ToggleNoise,
    ToggleVignette,
    ToggleBloom,
    ToggleAutoRotate,
    NextForm,
    AdjustNoiseSpeed(f64),
}

type Hook = Box<dyn FnMut(&PanelChange)>;

/// Holds the panel settings and notifies registered hooks of every applied change
#[derive(Default)]
pub struct DebugPanel {
    settings: PanelSettings,
    hooks: Vec<Hook>,
}

impl DebugPanel {
    pub fn new(settings: PanelSettings) -> Self {
        Self {
            settings,
            hooks: Vec::new(),
        }
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    /// Effect toggles as read by the chain each tick
    pub fn toggles(&self) -> EffectToggleSet {
        EffectToggleSet {
            noise: self.settings.use_noise,
            vignette: self.settings.use_vignette,
            bloom: self.settings.use_bloom,
        }
    }

    /// Register a hook fired after each applied change
    pub fn on_change(&mut self, hook: impl FnMut(&PanelChange) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Apply `change` to the settings, then fire the hooks.
    ///
    /// Relative changes are resolved against the current settings first; the
    /// hooks and the caller see the resulting absolute change.
    pub fn apply(&mut self, change: PanelChange) -> PanelChange {
        let change = self.resolve(change);
        let s = &mut self.settings;
        match change {
            PanelChange::UseNoise(on) => s.use_noise = on,
            PanelChange::UseVignette(on) => s.use_vignette = on,
            PanelChange::UseBloom(on) => s.use_bloom = on,
            PanelChange::AutoRotate(on) => s.auto_rotate = on,
            PanelChange::FormColor(color) => s.form_color = color,
            PanelChange::Form(form) => s.form = form,
            PanelChange::NoiseSpeed(speed) => s.noise_speed = speed,
            // resolve() never returns a relative change
            _ => {}
        }
        log::debug!("Panel: {:?}", change);

        for hook in &mut self.hooks {
            hook(&change);
        }
        change
    }

    fn resolve(&self, change: PanelChange) -> PanelChange {
        let s = &self.settings;
        match change {
            PanelChange::ToggleNoise => PanelChange::UseNoise(!s.use_noise),
            PanelChange::ToggleVignette => PanelChange::UseVignette(!s.use_vignette),
            PanelChange::ToggleBloom => PanelChange::UseBloom(!s.use_bloom),
            PanelChange::ToggleAutoRotate => PanelChange::AutoRotate(!s.auto_rotate),
            PanelChange::NextForm => PanelChange::Form(s.form.next()),
            PanelChange::AdjustNoiseSpeed(delta) => {
                PanelChange::NoiseSpeed(clamp_noise_speed(s.noise_speed + delta))
            }
            PanelChange::NoiseSpeed(speed) => PanelChange::NoiseSpeed(clamp_noise_speed(speed)),
            absolute => absolute,
        }
    }
}

impl fmt::Debug for DebugPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugPanel")
            .field("settings", &self.settings)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_defaults() {
        let panel = DebugPanel::default();
        assert_eq!(panel.toggles(), EffectToggleSet::default());
        assert!(!panel.settings().auto_rotate);
        assert_eq!(panel.settings().form, FormKind::Plane);
        assert_eq!(panel.settings().form_color, Color::parse("#ff5555").unwrap());
        assert_eq!(panel.settings().noise_speed, 2.0);
    }

    #[test]
    fn test_toggles_flip_the_current_value() {
        let mut panel = DebugPanel::default();
        assert_eq!(panel.apply(PanelChange::ToggleNoise), PanelChange::UseNoise(false));
        assert_eq!(panel.apply(PanelChange::ToggleNoise), PanelChange::UseNoise(true));
        assert!(panel.settings().use_noise);

        panel.apply(PanelChange::ToggleBloom);
        panel.apply(PanelChange::ToggleVignette);
        panel.apply(PanelChange::ToggleAutoRotate);
        assert!(panel.settings().use_bloom);
        assert!(!panel.settings().use_vignette);
        assert!(panel.settings().auto_rotate);
    }

    #[test]
    fn test_next_form_advances_from_current() {
        let mut panel = DebugPanel::default();
        panel.apply(PanelChange::NextForm);
        panel.apply(PanelChange::NextForm);
        assert_eq!(panel.settings().form, FormKind::Cube);
    }

    #[test]
    fn test_noise_speed_is_clamped() {
        let mut panel = DebugPanel::default();
        assert_eq!(
            panel.apply(PanelChange::AdjustNoiseSpeed(2.5)),
            PanelChange::NoiseSpeed(4.5)
        );
        panel.apply(PanelChange::NoiseSpeed(40.0));
        assert_eq!(panel.settings().noise_speed, 10.0);
        panel.apply(PanelChange::AdjustNoiseSpeed(-20.0));
        assert_eq!(panel.settings().noise_speed, 1.0);
    }

    #[test]
    fn test_apply_updates_toggles() {
        let mut panel = DebugPanel::default();
        panel.apply(PanelChange::UseNoise(false));
        panel.apply(PanelChange::UseBloom(true));
        assert_eq!(
            panel.toggles(),
            EffectToggleSet {
                noise: false,
                vignette: true,
                bloom: true,
            }
        );
    }

    #[test]
    fn test_hooks_see_applied_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut panel = DebugPanel::default();
        let log = Rc::clone(&seen);
        panel.on_change(move |change| log.borrow_mut().push(*change));

        panel.apply(PanelChange::AutoRotate(true));
        panel.apply(PanelChange::Form(FormKind::Cube));
        panel.apply(PanelChange::ToggleBloom);

        assert_eq!(
            *seen.borrow(),
            [
                PanelChange::AutoRotate(true),
                PanelChange::Form(FormKind::Cube),
                PanelChange::UseBloom(true),
            ]
        );
        assert!(panel.settings().auto_rotate);
    }
}
