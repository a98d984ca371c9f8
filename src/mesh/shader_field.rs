//! Uniform state of the displacement shader and its CPU mirror.
//!
//! `field.wgsl` and the functions here implement the same displacement and
//! shading so the software compositor renders the frames the GPU does.
//! Both are pure functions of (time, speed flag, amplitude, vertex).

use glam::{Vec2, Vec3};

use crate::error::ColorParseError;

/// RGB color in 0..1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Vec3);

impl Color {
    pub const WHITE: Color = Color(Vec3::ONE);

    pub fn from_hex(hex: u32) -> Self {
        Color(Vec3::from_array(crate::params::hex_to_rgb(hex)))
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn parse(text: &str) -> Result<Self, ColorParseError> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(ColorParseError(text.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::from_hex)
            .map_err(|_| ColorParseError(text.to_string()))
    }

    pub fn to_array(self) -> [f32; 3] {
        self.0.to_array()
    }
}

impl std::str::FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s)
    }
}

/// Uniforms consumed by the field program.
///
/// Vertex stage: `time`, `speed_flag`, `amplitude`. Fragment stage: `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderField {
    pub color: Color,
    pub time: f32,
    pub amplitude: f32,
    /// 0 in normal playback, 1 in slow motion
    pub speed_flag: u32,
}

impl ShaderField {
    pub fn new(color: Color, amplitude: f32) -> Self {
        Self {
            color,
            time: 0.0,
            amplitude,
            speed_flag: 0,
        }
    }

    /// Offset along `normal` for a vertex at `position` (local space)
    pub fn displacement(&self, position: Vec3, normal: Vec3) -> Vec3 {
        normal * (self.amplitude * field_height(position, self.time, self.speed_flag))
    }

    pub fn displace(&self, position: Vec3, normal: Vec3) -> Vec3 {
        position + self.displacement(position, normal)
    }

    /// Surface normal after displacement, by finite differences along two tangents
    pub fn displaced_normal(&self, position: Vec3, normal: Vec3) -> Vec3 {
        let reference = if normal.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
        let tangent = normal.cross(reference).normalize_or_zero();
        let bitangent = normal.cross(tangent);

        let center = self.displace(position, normal);
        let along_t = self.displace(position + tangent * NORMAL_EPSILON, normal);
        let along_b = self.displace(position + bitangent * NORMAL_EPSILON, normal);
        let n = (along_t - center).cross(along_b - center).normalize_or_zero();
        if n == Vec3::ZERO {
            normal
        } else {
            n
        }
    }
}

const NORMAL_EPSILON: f32 = 0.5;

/// Noise lattice frequency per speed mode (slow motion uses broader swells)
const FREQUENCY: [f32; 2] = [0.035, 0.02];
const NOISE_HEIGHT: f32 = 10.0;
const RIPPLE_HEIGHT: f32 = 2.0;
const RIPPLE_FREQUENCY: f32 = 0.05;
const RIPPLE_SPEED: f32 = 6.0;

/// Unscaled displacement height at a local-space position
pub fn field_height(position: Vec3, time: f32, speed_flag: u32) -> f32 {
    let frequency = FREQUENCY[(speed_flag.min(1)) as usize];
    let noise = value_noise(position * frequency + Vec3::new(0.0, 0.0, time));
    let radius = Vec2::new(position.x, position.y).length();
    let ripple = (radius * RIPPLE_FREQUENCY - time * RIPPLE_SPEED).sin();
    noise * NOISE_HEIGHT + ripple * RIPPLE_HEIGHT
}

/// Integer hash (lowbias32)
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

fn lattice(x: i32, y: i32, z: i32) -> f32 {
    let h = hash_u32(x as u32 ^ hash_u32(y as u32 ^ hash_u32(z as u32)));
    (h >> 8) as f32 / 16_777_215.0 * 2.0 - 1.0
}

fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Trilinear value noise in [-1, 1]
pub fn value_noise(p: Vec3) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let (x, y, z) = (cell.x as i32, cell.y as i32, cell.z as i32);
    let (u, v, w) = (fade(f.x), fade(f.y), fade(f.z));

    let x00 = lerp(lattice(x, y, z), lattice(x + 1, y, z), u);
    let x10 = lerp(lattice(x, y + 1, z), lattice(x + 1, y + 1, z), u);
    let x01 = lerp(lattice(x, y, z + 1), lattice(x + 1, y, z + 1), u);
    let x11 = lerp(lattice(x, y + 1, z + 1), lattice(x + 1, y + 1, z + 1), u);

    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Lighting inputs shared by the field and basic materials
#[derive(Debug, Clone, Copy)]
pub struct ShadeLights {
    /// Direction toward the directional light (normalized)
    pub directional_dir: Vec3,
    pub directional_intensity: f32,
    pub point_position: Vec3,
    pub point_intensity: f32,
    pub point_distance: f32,
}

/// Ambient light term shared by the CPU and GPU shading
pub const AMBIENT: f32 = 0.25;

/// Lit color for a world-space point (mirrors `fs_main` in field.wgsl)
pub fn shade(color: Color, world_pos: Vec3, world_normal: Vec3, lights: &ShadeLights) -> Vec3 {
    let n = world_normal.normalize_or_zero();
    let diffuse = n.dot(lights.directional_dir).abs() * lights.directional_intensity;

    let to_point = lights.point_position - world_pos;
    let dist = to_point.length();
    let falloff = if lights.point_distance > 0.0 {
        (1.0 - dist / lights.point_distance).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let point_dir = if dist > 0.0 { to_point / dist } else { Vec3::ZERO };
    let point = n.dot(point_dir).abs() * lights.point_intensity * falloff * falloff;

    (color.0 * (AMBIENT + diffuse + point)).clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        let c = Color::parse("#ff5555").unwrap();
        assert_eq!(c.0.x, 1.0);
        assert!((c.0.y - 0x55 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(Color::parse("ff5555"), Ok(c));
        assert!(Color::parse("#ff55").is_err());
        assert!(Color::parse("#gg5555").is_err());
    }

    #[test]
    fn test_value_noise_is_bounded_and_deterministic() {
        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * -0.11, i as f32 * 0.05);
            let n = value_noise(p);
            assert!((-1.0..=1.0).contains(&n));
            assert_eq!(n, value_noise(p));
        }
    }

    #[test]
    fn test_value_noise_matches_lattice_at_integer_points() {
        assert_eq!(value_noise(Vec3::new(3.0, -2.0, 7.0)), lattice(3, -2, 7));
    }

    #[test]
    fn test_displacement_follows_normal() {
        let field = ShaderField::new(Color::WHITE, 1.0);
        let offset = field.displacement(Vec3::new(10.0, 20.0, 0.0), Vec3::Z);
        assert_eq!(offset.x, 0.0);
        assert_eq!(offset.y, 0.0);

        let flat = ShaderField::new(Color::WHITE, 0.0);
        assert_eq!(flat.displacement(Vec3::new(10.0, 20.0, 0.0), Vec3::Z), Vec3::ZERO);
    }

    #[test]
    fn test_flat_field_keeps_normal() {
        let flat = ShaderField::new(Color::WHITE, 0.0);
        let n = flat.displaced_normal(Vec3::new(5.0, 5.0, 0.0), Vec3::Z);
        assert!((n - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_speed_flag_changes_field() {
        let p = Vec3::new(40.0, -25.0, 0.0);
        assert_ne!(field_height(p, 1.3, 0), field_height(p, 1.3, 1));
    }
}
