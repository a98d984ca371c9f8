//! Scene contents: lights, global rotation, and the animated form.

use glam::{EulerRot, Mat4, Vec3};

use crate::mesh::{AnimatedMesh, Color, Geometry, ShadeLights, ShaderField};

/// How a renderable is shaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Displaced and lit by the field program
    Field(ShaderField),
    /// Flat, unlit color
    Basic(Color),
}

/// Anything the compositors can draw: a transform plus draw data.
pub trait Renderable {
    /// Local-to-scene transform (scene rotation not included)
    fn transform(&self) -> Mat4;

    fn geometry(&self) -> &Geometry;

    fn material(&self) -> Material;

    /// Changes whenever `geometry` is replaced, so GPU buffers can be refreshed
    fn revision(&self) -> u64;
}

/// A borrowed piece of the animated mesh ready for drawing
#[derive(Debug, Clone, Copy)]
pub struct MeshPart<'a> {
    pub label: &'static str,
    pub geometry: &'a Geometry,
    pub transform: Mat4,
    pub material: Material,
    pub revision: u64,
}

impl Renderable for MeshPart<'_> {
    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn geometry(&self) -> &Geometry {
        self.geometry
    }

    fn material(&self) -> Material {
        self.material
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    /// Light position; it shines toward the origin
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    /// Range beyond which the light contributes nothing (0 = unlimited)
    pub distance: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub directional: DirectionalLight,
    pub point: PointLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            directional: DirectionalLight {
                color: Color::WHITE,
                intensity: 0.5,
                position: Vec3::new(300.0, 300.0, 300.0),
            },
            point: PointLight {
                color: Color::WHITE,
                intensity: 2.0,
                distance: 2000.0,
                position: Vec3::ZERO,
            },
        }
    }
}

impl Lights {
    pub fn shade_inputs(&self) -> ShadeLights {
        ShadeLights {
            directional_dir: self.directional.position.normalize_or_zero(),
            directional_intensity: self.directional.intensity,
            point_position: self.point.position,
            point_intensity: self.point.intensity,
            point_distance: self.point.distance,
        }
    }
}

/// Everything drawn in the base pass
pub struct Scene {
    pub mesh: AnimatedMesh,
    pub lights: Lights,
    /// Euler angles (radians) applied to the whole scene
    pub rotation: Vec3,
    pub background: Color,
}

impl Scene {
    pub fn new(mesh: AnimatedMesh, background: Color) -> Self {
        Self {
            mesh,
            lights: Lights::default(),
            rotation: Vec3::ZERO,
            background,
        }
    }

    /// Rotate every axis by `angle`; unbounded accumulation is fine since rotation is periodic
    pub fn rotate_all(&mut self, angle: f32) {
        self.rotation += Vec3::splat(angle);
    }

    /// Scene-level transform applied on top of each renderable's own
    pub fn root_transform(&self) -> Mat4 {
        Mat4::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    pub fn renderables(&self) -> impl Iterator<Item = MeshPart<'_>> {
        self.mesh.parts().into_iter()
    }
}
