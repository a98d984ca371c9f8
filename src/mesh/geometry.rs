//! Procedural geometry for the displaced form and its floor.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::PI;

/// Vertex data (position + normal + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Flat grid in the XY plane facing +Z, centered on the origin
    pub fn plane(width: f32, height: f32, width_segments: usize, height_segments: usize) -> Self {
        let cols = width_segments.max(1);
        let rows = height_segments.max(1);
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        let mut vertices = Vec::with_capacity((cols + 1) * (rows + 1));
        let mut indices = Vec::with_capacity(cols * rows * 6);

        // Rows run top (+Y) to bottom, matching UV v going 1 -> 0
        for iy in 0..=rows {
            for ix in 0..=cols {
                let u = ix as f32 / cols as f32;
                let v = iy as f32 / rows as f32;
                let x = u * width - half_w;
                let y = half_h - v * height;
                vertices.push(Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z, [u, 1.0 - v]));
            }
        }

        // Counter-clockwise winding seen from +Z
        for iy in 0..rows {
            for ix in 0..cols {
                let a = (iy * (cols + 1) + ix) as u32;
                let b = ((iy + 1) * (cols + 1) + ix) as u32;
                let c = b + 1;
                let d = a + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    /// UV sphere
    pub fn sphere(radius: f32, width_segments: usize, height_segments: usize) -> Self {
        let cols = width_segments.max(3);
        let rows = height_segments.max(2);

        let mut vertices = Vec::with_capacity((cols + 1) * (rows + 1));
        let mut indices = Vec::with_capacity(cols * rows * 6);

        for iy in 0..=rows {
            let v = iy as f32 / rows as f32;
            let theta = v * PI;
            for ix in 0..=cols {
                let u = ix as f32 / cols as f32;
                let phi = u * 2.0 * PI;
                let normal = Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                );
                vertices.push(Vertex::new(normal * radius, normal, [u, 1.0 - v]));
            }
        }

        for iy in 0..rows {
            for ix in 0..cols {
                let a = (iy * (cols + 1) + ix + 1) as u32;
                let b = (iy * (cols + 1) + ix) as u32;
                let c = ((iy + 1) * (cols + 1) + ix) as u32;
                let d = ((iy + 1) * (cols + 1) + ix + 1) as u32;
                // Skip the degenerate triangles at the poles
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != rows - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    /// Axis-aligned cube, one quad per face
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, u axis, v axis) for each face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let base = vertices.len() as u32;
            let center = normal * h;
            for (su, sv, uv) in [
                (-1.0, -1.0, [0.0, 0.0]),
                (1.0, -1.0, [1.0, 0.0]),
                (1.0, 1.0, [1.0, 1.0]),
                (-1.0, 1.0, [0.0, 1.0]),
            ] {
                let position = center + u_axis * (su * h) + v_axis * (sv * h);
                vertices.push(Vertex::new(position, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }

    /// Regular icosahedron with flat faces (no shared vertices)
    pub fn icosahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let corners = [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ]
        .map(|c| c.normalize() * radius);

        const FACES: [[usize; 3]; 20] = [
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        let mut vertices = Vec::with_capacity(60);
        for face in FACES {
            let [a, b, c] = face.map(|i| corners[i]);
            let normal = (b - a).cross(c - a).normalize();
            vertices.push(Vertex::new(a, normal, [0.0, 0.0]));
            vertices.push(Vertex::new(b, normal, [1.0, 0.0]));
            vertices.push(Vertex::new(c, normal, [0.5, 1.0]));
        }
        let indices = (0..vertices.len() as u32).collect();

        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
