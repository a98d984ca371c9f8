//! Animated mesh geometry and clock parameters.

/// Frame clock step per tick in normal playback
pub const NORMAL_STEP: f64 = 2.0;

/// Frame clock step per tick while slow motion is held
pub const SLOW_STEP: f64 = 0.4;

/// Seconds of shader time per frame-clock unit
pub const TIME_SCALE: f64 = 0.002;

/// Allowed range of the panel's noise speed, which replaces the normal step
pub const NOISE_SPEED_MIN: f64 = 1.0;
pub const NOISE_SPEED_MAX: f64 = 10.0;

/// Clamp a noise speed into range; NaN falls back to the normal step
pub fn clamp_noise_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return NORMAL_STEP;
    }
    speed.clamp(NOISE_SPEED_MIN, NOISE_SPEED_MAX)
}

/// Audio playback rate hint for each speed mode
pub const NORMAL_PLAYBACK_RATE: f32 = 1.0;
pub const SLOW_PLAYBACK_RATE: f32 = 0.5;

/// Displaced mesh layout parameters
#[derive(Debug, Clone)]
pub struct MeshParams {
    /// Plane extent along X (world units)
    pub width: f32,

    /// Plane extent along the plane's local Y, which becomes world -Z once laid flat
    pub depth: f32,

    /// Segment count along width
    pub width_segments: usize,

    /// Segment count along depth
    pub depth_segments: usize,

    /// Distance the mesh sits from the scene origin along Z
    pub offset_z: f32,

    /// Height of the flat floor plane under the displaced mesh
    pub floor_y: f32,

    /// Vertex displacement scale fed to the shader
    pub amplitude: f32,

    /// Initial form color as #rrggbb
    pub color: String,

    /// Radius used by the sphere and icosahedron forms
    pub radius: f32,

    /// Edge length used by the cube form
    pub cube_size: f32,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            width: 300.0,
            depth: 200.0,
            width_segments: 300,
            depth_segments: 200,
            offset_z: -50.0,
            floor_y: -12.0,
            amplitude: 1.0,
            color: "#ff5555".to_string(),
            radius: 150.0,
            cube_size: 220.0,
        }
    }
}
