//! Animated mesh: procedural geometry, displacement uniforms, and the
//! speed-mode state machine.

mod animated;
mod geometry;
mod shader_field;

pub use animated::{AnimatedMesh, FormKind, FrameClock, SpeedMode};
pub use geometry::{Geometry, Vertex};
pub use shader_field::{
    field_height, hash_u32, shade, value_noise, Color, ShadeLights, ShaderField, AMBIENT,
};
