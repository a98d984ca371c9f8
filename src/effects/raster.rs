//! Software triangle rasterizer for the CPU compositor.

use glam::{Vec2, Vec3, Vec4};
use image::{Rgba, Rgba32FImage};

/// Vertex after shading: clip-space position plus lit color
#[derive(Debug, Clone, Copy)]
pub(super) struct ShadedVertex {
    pub clip: Vec4,
    pub color: Vec3,
}

/// Color target plus depth buffer (depth in [0, 1], 1 = far)
pub(super) struct RasterTarget<'a> {
    pub color: &'a mut Rgba32FImage,
    pub depth: &'a mut [f32],
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl RasterTarget<'_> {
    /// Fill a triangle with depth testing and barycentric color interpolation.
    ///
    /// Triangles touching the camera plane are dropped rather than clipped.
    /// Both windings are drawn.
    pub fn draw_triangle(&mut self, tri: [ShadedVertex; 3]) {
        if tri.iter().any(|v| v.clip.w <= f32::EPSILON) {
            return;
        }
        let (width, height) = self.color.dimensions();
        let ndc = tri.map(|v| v.clip.truncate() / v.clip.w);
        if ndc.iter().all(|p| p.z > 1.0) || ndc.iter().all(|p| p.z < 0.0) {
            return;
        }

        let screen = ndc.map(|p| {
            Vec2::new(
                (p.x * 0.5 + 0.5) * width as f32,
                (0.5 - p.y * 0.5) * height as f32,
            )
        });
        let area = edge(screen[0], screen[1], screen[2]);
        if !area.is_finite() || area.abs() < 1e-8 {
            return;
        }

        let min = screen[0].min(screen[1]).min(screen[2]).floor().max(Vec2::ZERO);
        let max = screen[0]
            .max(screen[1])
            .max(screen[2])
            .ceil()
            .min(Vec2::new(width as f32 - 1.0, height as f32 - 1.0));
        if min.x > max.x || min.y > max.y {
            return;
        }

        for y in min.y as u32..=max.y as u32 {
            for x in min.x as u32..=max.x as u32 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(screen[1], screen[2], p) / area;
                let w1 = edge(screen[2], screen[0], p) / area;
                let w2 = edge(screen[0], screen[1], p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * ndc[0].z + w1 * ndc[1].z + w2 * ndc[2].z;
                let idx = (y * width + x) as usize;
                if !(0.0..=1.0).contains(&z) || z >= self.depth[idx] {
                    continue;
                }
                self.depth[idx] = z;

                let c = tri[0].color * w0 + tri[1].color * w1 + tri[2].color * w2;
                self.color.put_pixel(x, y, Rgba([c.x, c.y, c.z, 1.0]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32, color: Vec3) -> ShadedVertex {
        ShadedVertex {
            clip: Vec4::new(x, y, z, 1.0),
            color,
        }
    }

    #[test]
    fn test_covering_triangle_fills_center() {
        let mut color = Rgba32FImage::new(8, 8);
        let mut depth = vec![1.0; 64];
        let mut target = RasterTarget {
            color: &mut color,
            depth: &mut depth,
        };
        target.draw_triangle([
            vertex(-1.0, -1.0, 0.5, Vec3::X),
            vertex(3.0, -1.0, 0.5, Vec3::X),
            vertex(-1.0, 3.0, 0.5, Vec3::X),
        ]);
        let [r, g, b, a] = color.get_pixel(4, 4).0;
        assert!((r - 1.0).abs() < 1e-5 && g == 0.0 && b == 0.0 && a == 1.0);
        assert!((depth[4 * 8 + 4] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_nearer_triangle_wins() {
        let mut color = Rgba32FImage::new(4, 4);
        let mut depth = vec![1.0; 16];
        let mut target = RasterTarget {
            color: &mut color,
            depth: &mut depth,
        };
        let big = |z, c| {
            [
                vertex(-1.0, -1.0, z, c),
                vertex(3.0, -1.0, z, c),
                vertex(-1.0, 3.0, z, c),
            ]
        };
        target.draw_triangle(big(0.2, Vec3::Y));
        target.draw_triangle(big(0.6, Vec3::X));
        let [r, g, _, _] = color.get_pixel(1, 1).0;
        assert_eq!(r, 0.0);
        assert!((g - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_behind_camera_is_dropped() {
        let mut color = Rgba32FImage::new(4, 4);
        let mut depth = vec![1.0; 16];
        let mut target = RasterTarget {
            color: &mut color,
            depth: &mut depth,
        };
        let mut tri = [
            vertex(-1.0, -1.0, 0.5, Vec3::ONE),
            vertex(3.0, -1.0, 0.5, Vec3::ONE),
            vertex(-1.0, 3.0, 0.5, Vec3::ONE),
        ];
        tri[1].clip.w = -1.0;
        target.draw_triangle(tri);
        assert!(depth.iter().all(|&d| d == 1.0));
    }
}
