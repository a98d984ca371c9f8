//! The displaced form: geometry, shader uniforms, frame clock and speed mode.

use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use super::geometry::Geometry;
use super::shader_field::{Color, ShaderField};
use crate::audio::AudioSignal;
use crate::error::ColorParseError;
use crate::params::{
    clamp_noise_speed, MeshParams, NORMAL_PLAYBACK_RATE, NORMAL_STEP, SLOW_PLAYBACK_RATE,
    SLOW_STEP, TIME_SCALE,
};
use crate::scene::{Material, MeshPart};

/// Playback speed of the form animation.
///
/// Step, shader flag and playback rate are derived from the mode, never
/// stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedMode {
    #[default]
    Normal,
    Slow,
}

impl SpeedMode {
    /// Default frame clock increment per tick
    pub fn step(self) -> f64 {
        match self {
            SpeedMode::Normal => NORMAL_STEP,
            SpeedMode::Slow => SLOW_STEP,
        }
    }

    pub fn shader_flag(self) -> u32 {
        match self {
            SpeedMode::Normal => 0,
            SpeedMode::Slow => 1,
        }
    }

    pub fn playback_rate(self) -> f32 {
        match self {
            SpeedMode::Normal => NORMAL_PLAYBACK_RATE,
            SpeedMode::Slow => SLOW_PLAYBACK_RATE,
        }
    }
}

/// Accumulated frame counter driving shader time.
///
/// Kept in double precision; a single-precision counter stops moving once
/// the frame count outgrows the step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    frame: f64,
}

impl FrameClock {
    /// Clock already at `frame`
    pub fn at(frame: f64) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Shader time in seconds for the current frame count
    pub fn elapsed_time(&self) -> f64 {
        self.frame * TIME_SCALE
    }

    fn advance(&mut self, step: f64) -> f64 {
        self.frame += step;
        self.elapsed_time()
    }
}

/// Geometry selectable for the displaced form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormKind {
    #[default]
    Plane,
    Sphere,
    Cube,
    Icosahedron,
}

impl FormKind {
    pub const ALL: [FormKind; 4] = [
        FormKind::Plane,
        FormKind::Sphere,
        FormKind::Cube,
        FormKind::Icosahedron,
    ];

    /// The following form in `ALL`, wrapping around
    pub fn next(self) -> FormKind {
        let index = FormKind::ALL.iter().position(|f| *f == self).unwrap_or(0);
        FormKind::ALL[(index + 1) % FormKind::ALL.len()]
    }

    fn build(self, params: &MeshParams) -> Geometry {
        match self {
            FormKind::Plane => Geometry::plane(
                params.width,
                params.depth,
                params.width_segments,
                params.depth_segments,
            ),
            FormKind::Sphere => Geometry::sphere(params.radius, 32, 32),
            FormKind::Cube => Geometry::cube(params.cube_size),
            FormKind::Icosahedron => Geometry::icosahedron(params.radius),
        }
    }

    /// Local-to-scene transform of the form.
    ///
    /// The plane is laid flat and pushed back; the closed forms sit at the origin.
    fn transform(self, params: &MeshParams) -> Mat4 {
        match self {
            FormKind::Plane => lay_flat(Vec3::new(0.0, 0.0, params.offset_z)),
            _ => Mat4::IDENTITY,
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormKind::Plane => "plane",
            FormKind::Sphere => "sphere",
            FormKind::Cube => "cube",
            FormKind::Icosahedron => "icosahedron",
        };
        f.write_str(name)
    }
}

impl FromStr for FormKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown form '{s}' (plane, sphere, cube, icosahedron)"))
    }
}

/// Rotate an XY plane onto XZ (facing +Y) and move it to `position`
fn lay_flat(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_rotation_x(-FRAC_PI_2)
}

/// The audio-reactive form plus the flat floor beneath it
pub struct AnimatedMesh {
    params: MeshParams,
    form: FormKind,
    body: Geometry,
    /// Bumped whenever `body` is replaced
    body_revision: u64,
    floor: Geometry,
    field: ShaderField,
    clock: FrameClock,
    mode: SpeedMode,
    /// Step used in normal mode
    noise_speed: f64,
}

impl AnimatedMesh {
    pub fn new(params: MeshParams) -> Result<Self, ColorParseError> {
        let color = Color::parse(&params.color)?;
        Ok(Self::with_color(params, color))
    }

    pub fn with_color(params: MeshParams, color: Color) -> Self {
        let form = FormKind::default();
        let body = form.build(&params);
        let floor = Geometry::plane(params.width, params.depth, 1, 1);
        let field = ShaderField::new(color, params.amplitude);
        Self {
            params,
            form,
            body,
            body_revision: 0,
            floor,
            field,
            clock: FrameClock::default(),
            mode: SpeedMode::Normal,
            noise_speed: NORMAL_STEP,
        }
    }

    /// Advance the clock by the current step and push the new time to the shader
    pub fn advance(&mut self) {
        self.field.time = self.clock.advance(self.step()) as f32;
    }

    pub fn elapsed_time(&self) -> f64 {
        self.clock.elapsed_time()
    }

    pub fn clock(&self) -> FrameClock {
        self.clock
    }

    /// Move the clock to `clock` and push its time to the shader
    pub fn set_clock(&mut self, clock: FrameClock) {
        self.clock = clock;
        self.field.time = clock.elapsed_time() as f32;
    }

    pub fn mode(&self) -> SpeedMode {
        self.mode
    }

    /// Step applied on the next `advance`.
    ///
    /// Noise speed replaces the normal step only; slow motion keeps its fixed step.
    pub fn step(&self) -> f64 {
        match self.mode {
            SpeedMode::Normal => self.noise_speed,
            SpeedMode::Slow => self.mode.step(),
        }
    }

    pub fn noise_speed(&self) -> f64 {
        self.noise_speed
    }

    /// Set the normal-mode step, clamped to the noise speed range
    pub fn set_noise_speed(&mut self, speed: f64) {
        let speed = clamp_noise_speed(speed);
        if speed != self.noise_speed {
            log::debug!("Noise speed -> {}", speed);
        }
        self.noise_speed = speed;
    }

    pub fn field(&self) -> &ShaderField {
        &self.field
    }

    /// Switch to slow motion; returns whether the mode changed.
    ///
    /// Re-entering re-asserts the flag and playback rate without touching the clock.
    pub fn enter_slow_mode(&mut self, audio: &mut impl AudioSignal) -> bool {
        self.set_mode(SpeedMode::Slow, audio)
    }

    /// Return to normal playback; returns whether the mode changed
    pub fn enter_normal_mode(&mut self, audio: &mut impl AudioSignal) -> bool {
        self.set_mode(SpeedMode::Normal, audio)
    }

    fn set_mode(&mut self, mode: SpeedMode, audio: &mut impl AudioSignal) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        self.field.speed_flag = mode.shader_flag();
        audio.set_playback_rate(mode.playback_rate());
        if changed {
            log::debug!("Speed mode -> {:?} (step {})", mode, self.step());
        }
        changed
    }

    pub fn color(&self) -> Color {
        self.field.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.field.color = color;
    }

    pub fn form(&self) -> FormKind {
        self.form
    }

    /// Swap the displaced geometry; material and clock carry over
    pub fn set_form(&mut self, form: FormKind) {
        if form == self.form {
            return;
        }
        self.form = form;
        self.body = form.build(&self.params);
        self.body_revision += 1;
        log::info!(
            "Form -> {} ({} triangles)",
            form,
            self.body.triangle_count()
        );
    }

    pub fn body(&self) -> &Geometry {
        &self.body
    }

    /// Displaced form followed by the unlit floor
    pub fn parts(&self) -> [MeshPart<'_>; 2] {
        [
            MeshPart {
                label: "form",
                geometry: &self.body,
                transform: self.form.transform(&self.params),
                material: Material::Field(self.field),
                revision: self.body_revision,
            },
            MeshPart {
                label: "floor",
                geometry: &self.floor,
                transform: lay_flat(Vec3::new(0.0, self.params.floor_y, self.params.offset_z)),
                material: Material::Basic(Color::WHITE),
                revision: 0,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StaticSignal;

    fn small_mesh() -> AnimatedMesh {
        let params = MeshParams {
            width_segments: 4,
            depth_segments: 4,
            ..MeshParams::default()
        };
        AnimatedMesh::new(params).unwrap()
    }

    #[test]
    fn test_elapsed_time_in_normal_mode() {
        let mut mesh = small_mesh();
        assert_eq!(mesh.elapsed_time(), 0.0);
        for n in 1..=250u32 {
            mesh.advance();
            let expected = (n as f64 * 2.0) * 0.002;
            assert!((mesh.elapsed_time() - expected).abs() < 1e-9);
            assert_eq!(mesh.field().time, mesh.elapsed_time() as f32);
        }
    }

    #[test]
    fn test_slow_mode_step_and_flag() {
        let mut mesh = small_mesh();
        let mut audio = StaticSignal::new(0.0, false);

        assert!(mesh.enter_slow_mode(&mut audio));
        assert_eq!(mesh.step(), 0.4);
        assert_eq!(mesh.field().speed_flag, 1);
        assert_eq!(audio.playback_rate, 0.5);

        mesh.advance();
        assert!((mesh.clock().frame() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_slow_mode_keeps_moving_after_long_runs() {
        let mut mesh = small_mesh();
        let mut audio = StaticSignal::new(0.0, false);
        // 2^23: the point where an f32 counter can no longer add 0.4
        mesh.set_clock(FrameClock::at(8_388_608.0));
        mesh.enter_slow_mode(&mut audio);

        let mut last = mesh.clock();
        for _ in 0..100 {
            mesh.advance();
            assert!(mesh.clock().frame() > last.frame());
            assert!(mesh.elapsed_time() > last.elapsed_time());
            last = mesh.clock();
        }
        assert!((mesh.clock().frame() - (8_388_608.0 + 100.0 * 0.4)).abs() < 1e-6);
    }

    #[test]
    fn test_normal_mode_keeps_moving_past_f32_range() {
        let mut mesh = small_mesh();
        // 2^25: an f32 counter stops adding 2.0 here
        mesh.set_clock(FrameClock::at(33_554_432.0));
        mesh.advance();
        assert_eq!(mesh.clock().frame(), 33_554_434.0);
        assert_eq!(mesh.field().time, (33_554_434.0 * 0.002) as f32);
    }

    #[test]
    fn test_noise_speed_replaces_normal_step_only() {
        let mut mesh = small_mesh();
        let mut audio = StaticSignal::new(0.0, false);
        assert_eq!(mesh.noise_speed(), 2.0);

        mesh.set_noise_speed(3.0);
        assert_eq!(mesh.step(), 3.0);
        mesh.advance();
        assert_eq!(mesh.clock().frame(), 3.0);

        mesh.enter_slow_mode(&mut audio);
        assert_eq!(mesh.step(), 0.4);
        mesh.enter_normal_mode(&mut audio);
        assert_eq!(mesh.step(), 3.0);

        mesh.set_noise_speed(50.0);
        assert_eq!(mesh.noise_speed(), 10.0);
        mesh.set_noise_speed(0.0);
        assert_eq!(mesh.noise_speed(), 1.0);
        mesh.set_noise_speed(f64::NAN);
        assert_eq!(mesh.noise_speed(), 2.0);
    }

    #[test]
    fn test_slow_mode_is_idempotent() {
        let mut once = small_mesh();
        let mut twice = small_mesh();
        let mut audio_once = StaticSignal::new(0.0, false);
        let mut audio_twice = StaticSignal::new(0.0, false);

        once.enter_slow_mode(&mut audio_once);
        assert!(twice.enter_slow_mode(&mut audio_twice));
        assert!(!twice.enter_slow_mode(&mut audio_twice));

        assert_eq!(once.mode(), twice.mode());
        assert_eq!(once.step(), twice.step());
        assert_eq!(once.field(), twice.field());
        assert_eq!(audio_once.playback_rate, audio_twice.playback_rate);
    }

    #[test]
    fn test_normal_mode_restores_state() {
        let mut mesh = small_mesh();
        let mut audio = StaticSignal::new(0.0, false);
        mesh.enter_slow_mode(&mut audio);
        for _ in 0..37 {
            mesh.advance();
        }
        assert!(mesh.enter_normal_mode(&mut audio));
        assert_eq!(mesh.step(), 2.0);
        assert_eq!(mesh.field().speed_flag, 0);
        assert_eq!(audio.playback_rate, 1.0);
    }

    #[test]
    fn test_set_color_is_immediate() {
        let mut mesh = small_mesh();
        let color = Color::parse("#00ff00").unwrap();
        mesh.set_color(color);
        match mesh.parts()[0].material {
            Material::Field(field) => assert_eq!(field.color, color),
            Material::Basic(_) => panic!("form should use the field material"),
        }
    }

    #[test]
    fn test_set_form_keeps_clock_and_material() {
        let mut mesh = small_mesh();
        mesh.advance();
        let field = *mesh.field();

        mesh.set_form(FormKind::Cube);
        assert_eq!(mesh.form(), FormKind::Cube);
        assert_eq!(mesh.body().triangle_count(), 12);
        assert_eq!(*mesh.field(), field);
        assert_eq!(mesh.parts()[0].revision, 1);

        // Same form again is a no-op
        mesh.set_form(FormKind::Cube);
        assert_eq!(mesh.parts()[0].revision, 1);
    }

    #[test]
    fn test_plane_is_laid_flat() {
        let mesh = small_mesh();
        let [form, floor] = mesh.parts();

        let normal = form.transform.transform_vector3(Vec3::Z);
        assert!((normal - Vec3::Y).length() < 1e-5);

        let origin = floor.transform.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, -12.0, -50.0)).length() < 1e-5);
    }

    #[test]
    fn test_next_form_cycles() {
        let mut form = FormKind::Plane;
        for _ in 0..FormKind::ALL.len() {
            form = form.next();
        }
        assert_eq!(form, FormKind::Plane);
        assert_eq!(FormKind::Plane.next(), FormKind::Sphere);
        assert_eq!(FormKind::Icosahedron.next(), FormKind::Plane);
    }

    #[test]
    fn test_form_kind_parse() {
        assert_eq!("Sphere".parse::<FormKind>(), Ok(FormKind::Sphere));
        assert_eq!("icosahedron".parse::<FormKind>(), Ok(FormKind::Icosahedron));
        assert!("torus".parse::<FormKind>().is_err());
    }
}
