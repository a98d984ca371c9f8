//! Software compositor: rasterizes the scene and runs the passes on the CPU.
//!
//! Deterministic for fixed inputs, which makes it the backend for headless
//! renders and frame-hash regression tests.

use glam::{Mat3, Mat4, Vec2, Vec3};
use image::{Rgba, Rgba32FImage};
use std::path::Path;

use super::raster::{RasterTarget, ShadedVertex};
use super::{Compositor, PassKind};
use crate::camera::Camera;
use crate::error::RenderError;
use crate::mesh::{hash_u32, shade, Vertex};
use crate::params::{BloomParams, NoiseParams, PassParams, VignetteParams};
use crate::scene::{Material, Renderable, Scene};

/// CPU implementation of the compositor primitives
pub struct CpuCompositor {
    width: u32,
    height: u32,
    working: Rgba32FImage,
    depth: Vec<f32>,
    /// Last image handed to the display target
    presented: Option<Rgba32FImage>,
    released: bool,
}

impl CpuCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            working: Rgba32FImage::new(width, height),
            depth: vec![1.0; width as usize * height as usize],
            presented: None,
            released: false,
        }
    }

    /// Current working buffer
    pub fn working(&self) -> &Rgba32FImage {
        &self.working
    }

    pub fn presented(&self) -> Option<&Rgba32FImage> {
        self.presented.as_ref()
    }

    /// Hash of the last presented frame
    pub fn presented_hash(&self) -> Option<u64> {
        self.presented.as_ref().map(frame_hash)
    }

    /// Write the last presented frame as an 8-bit PNG
    pub fn save_presented(&self, path: &Path) -> Result<(), RenderError> {
        let frame = self
            .presented
            .as_ref()
            .ok_or_else(|| RenderError::Capture("no frame presented yet".to_string()))?;
        to_rgba8(frame)
            .save(path)
            .map_err(|e| RenderError::Capture(format!("{}: {}", path.display(), e)))
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.released {
            Err(RenderError::Released)
        } else {
            Ok(())
        }
    }

    fn draw(&mut self, part: &impl Renderable, root: Mat4, view_proj: Mat4, scene: &Scene) {
        let model = root * part.transform();
        let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
        let lights = scene.lights.shade_inputs();
        let material = part.material();

        let shaded: Vec<ShadedVertex> = part
            .geometry()
            .vertices
            .iter()
            .map(|v: &Vertex| {
                let position = Vec3::from_array(v.position);
                let normal = Vec3::from_array(v.normal);
                let (local, color) = match material {
                    Material::Field(field) => {
                        let displaced = field.displace(position, normal);
                        let n = normal_matrix * field.displaced_normal(position, normal);
                        let world = model.transform_point3(displaced);
                        (displaced, shade(field.color, world, n, &lights))
                    }
                    Material::Basic(color) => (position, color.0),
                };
                ShadedVertex {
                    clip: view_proj * model.transform_point3(local).extend(1.0),
                    color,
                }
            })
            .collect();

        let mut target = RasterTarget {
            color: &mut self.working,
            depth: &mut self.depth,
        };
        for tri in part.geometry().indices.chunks_exact(3) {
            target.draw_triangle([
                shaded[tri[0] as usize],
                shaded[tri[1] as usize],
                shaded[tri[2] as usize],
            ]);
        }
    }
}

impl Compositor for CpuCompositor {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn target_sizes(&self) -> Vec<(u32, u32)> {
        // Depth always matches the color target
        vec![self.working.dimensions()]
    }

    fn reset(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        self.depth.fill(1.0);
        Ok(())
    }

    fn render_base(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        self.ensure_live()?;
        let bg = scene.background.0;
        let clear = Rgba([bg.x, bg.y, bg.z, 1.0]);
        self.working.pixels_mut().for_each(|p| *p = clear);
        self.depth.fill(1.0);

        let root = scene.root_transform();
        let view_proj = camera.view_proj();
        for part in scene.renderables() {
            self.draw(&part, root, view_proj, scene);
        }
        Ok(())
    }

    fn apply(
        &mut self,
        pass: PassKind,
        params: &PassParams,
        frame: u64,
    ) -> Result<(), RenderError> {
        self.ensure_live()?;
        match pass {
            PassKind::Noise => apply_noise(&mut self.working, &params.noise, frame),
            PassKind::Vignette => apply_vignette(&mut self.working, &params.vignette),
            PassKind::Bloom => apply_bloom(&mut self.working, &params.bloom),
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        match &mut self.presented {
            Some(frame) => frame.clone_from(&self.working),
            None => self.presented = Some(self.working.clone()),
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.released {
            return;
        }
        let (width, height) = (width.max(1), height.max(1));
        self.width = width;
        self.height = height;
        self.working = Rgba32FImage::new(width, height);
        self.depth = vec![1.0; width as usize * height as usize];
        log::debug!("CPU targets resized to {}x{}", width, height);
    }

    fn release(&mut self) {
        self.released = true;
        self.working = Rgba32FImage::new(1, 1);
        self.depth = vec![1.0];
    }
}

/// Per-pixel grain in [0, 1)
fn grain(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(x ^ hash_u32(y ^ hash_u32(seed)));
    (h >> 8) as f32 / 16_777_216.0
}

/// Add animated film grain; `frame * speed` picks the pattern
pub fn apply_noise(image: &mut Rgba32FImage, params: &NoiseParams, frame: u64) {
    let seed = (frame as f32 * params.speed).to_bits();
    for (x, y, p) in image.enumerate_pixels_mut() {
        let offset = (grain(x, y, seed) - 0.5) * params.amount;
        for c in &mut p.0[..3] {
            *c = (*c + offset).clamp(0.0, 1.0);
        }
    }
}

const VIGNETTE_FALLOFF: f32 = 0.1;

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Vignette factor at a normalized screen position
fn vignette_factor(uv: Vec2, amount: f32) -> f32 {
    let dist = uv.distance(Vec2::splat(0.5));
    smoothstep(0.8, VIGNETTE_FALLOFF * 0.799, dist * (amount + VIGNETTE_FALLOFF))
}

/// Darken toward the frame edges
pub fn apply_vignette(image: &mut Rgba32FImage, params: &VignetteParams) {
    let (w, h) = image.dimensions();
    for (x, y, p) in image.enumerate_pixels_mut() {
        let uv = Vec2::new((x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32);
        let factor = vignette_factor(uv, params.amount);
        for c in &mut p.0[..3] {
            *c *= factor;
        }
    }
}

/// Blur radius in pixels per unit of `blur_amount` and shorter frame side
const BLOOM_RADIUS_SCALE: f32 = 0.25;
const ZOOM_SAMPLES: u32 = 16;

/// Blur radius used by the bloom pass for a frame size
pub fn bloom_radius(width: u32, height: u32, blur_amount: f32) -> u32 {
    let radius = blur_amount.max(0.0) * width.min(height) as f32 * BLOOM_RADIUS_SCALE;
    (radius.round() as u32).max(1)
}

/// Separable box blur with clamped edges
fn box_blur(src: &Rgba32FImage, radius: u32) -> Vec<Vec3> {
    let (w, h) = src.dimensions();
    let (w, h) = (w as usize, h as usize);
    let r = radius as usize;
    let mut pixels: Vec<Vec3> = src
        .pixels()
        .map(|p| Vec3::new(p.0[0], p.0[1], p.0[2]))
        .collect();

    let blur_line = |get: &dyn Fn(usize) -> usize, len: usize, data: &mut Vec<Vec3>| {
        let mut prefix = Vec::with_capacity(len + 1);
        prefix.push(Vec3::ZERO);
        for i in 0..len {
            let last = prefix[i];
            prefix.push(last + data[get(i)]);
        }
        for i in 0..len {
            let lo = i.saturating_sub(r);
            let hi = (i + r).min(len - 1);
            data[get(i)] = (prefix[hi + 1] - prefix[lo]) / (hi - lo + 1) as f32;
        }
    };

    for y in 0..h {
        blur_line(&|x| y * w + x, w, &mut pixels);
    }
    for x in 0..w {
        blur_line(&|y| y * w + x, h, &mut pixels);
    }
    pixels
}

/// Average samples along the ray from each pixel toward the frame center
fn zoom_blur(src: &[Vec3], width: u32, height: u32, strength: f32) -> Vec<Vec3> {
    let (w, h) = (width as usize, height as usize);
    let center = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
    let mut out = Vec::with_capacity(src.len());
    for y in 0..h {
        for x in 0..w {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let mut acc = Vec3::ZERO;
            for i in 0..ZOOM_SAMPLES {
                let t = strength * i as f32 / ZOOM_SAMPLES as f32;
                let q = p + (center - p) * t;
                let sx = (q.x as usize).min(w - 1);
                let sy = (q.y as usize).min(h - 1);
                acc += src[sy * w + sx];
            }
            out.push(acc / ZOOM_SAMPLES as f32);
        }
    }
    out
}

/// Blurred glow (optionally zoom-blurred) screen-blended over the image
pub fn apply_bloom(image: &mut Rgba32FImage, params: &BloomParams) {
    let (w, h) = image.dimensions();
    let mut glow = box_blur(image, bloom_radius(w, h, params.blur_amount));
    if params.apply_zoom_blur {
        glow = zoom_blur(&glow, w, h, params.zoom_blur_strength);
    }
    for (p, g) in image.pixels_mut().zip(glow) {
        let g = g * params.strength;
        for (c, gc) in p.0[..3].iter_mut().zip(g.to_array()) {
            *c = (1.0 - (1.0 - *c) * (1.0 - gc)).clamp(0.0, 1.0);
        }
    }
}

fn to_rgba8(image: &Rgba32FImage) -> image::RgbaImage {
    image::RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y).0;
        Rgba(p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
    })
}

/// FNV-1a over the 8-bit quantized frame
pub fn frame_hash(image: &Rgba32FImage) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    to_rgba8(image)
        .as_raw()
        .iter()
        .fold(OFFSET, |hash, &byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: u32, h: u32, v: f32) -> Rgba32FImage {
        Rgba32FImage::from_pixel(w, h, Rgba([v, v, v, 1.0]))
    }

    #[test]
    fn test_noise_is_deterministic_and_bounded() {
        let params = NoiseParams::default();
        let mut a = flat(16, 16, 0.5);
        let mut b = flat(16, 16, 0.5);
        apply_noise(&mut a, &params, 7);
        apply_noise(&mut b, &params, 7);
        assert_eq!(a, b);
        for p in a.pixels() {
            assert!((p.0[0] - 0.5).abs() <= params.amount / 2.0 + 1e-6);
        }

        let mut c = flat(16, 16, 0.5);
        apply_noise(&mut c, &params, 8);
        assert_ne!(a, c);
    }

    #[test]
    fn test_vignette_darkens_corners_only() {
        let mut image = flat(64, 64, 1.0);
        apply_vignette(&mut image, &VignetteParams::default());
        assert!(image.get_pixel(32, 32).0[0] > 0.99);
        assert!(image.get_pixel(0, 0).0[0] < 0.1);
    }

    #[test]
    fn test_bloom_brightens_around_highlight() {
        let mut image = flat(32, 32, 0.0);
        image.put_pixel(16, 16, Rgba([1.0, 1.0, 1.0, 1.0]));
        apply_bloom(&mut image, &BloomParams::default());
        assert!(image.get_pixel(17, 16).0[0] > 0.0);
        assert!(image.get_pixel(16, 16).0[0] >= 1.0 - 1e-6);
    }

    #[test]
    fn test_box_blur_preserves_flat_image() {
        let image = flat(9, 5, 0.25);
        for p in box_blur(&image, 3) {
            assert!((p.x - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resize_resizes_every_target() {
        let mut compositor = CpuCompositor::new(800, 600);
        compositor.resize(1920, 1080);
        assert_eq!(compositor.size(), (1920, 1080));
        assert_eq!(compositor.target_sizes(), [(1920, 1080)]);
        assert_eq!(compositor.depth.len(), 1920 * 1080);
    }

    #[test]
    fn test_released_compositor_refuses_work() {
        let mut compositor = CpuCompositor::new(4, 4);
        compositor.release();
        assert!(matches!(compositor.reset(), Err(RenderError::Released)));
    }

    #[test]
    fn test_resize_after_release_keeps_buffers_freed() {
        let mut compositor = CpuCompositor::new(64, 48);
        compositor.release();
        compositor.resize(1920, 1080);
        assert_eq!(compositor.target_sizes(), [(1, 1)]);
        assert_eq!(compositor.depth.len(), 1);
        assert!(compositor.is_released());
    }

    #[test]
    fn test_frame_hash_tracks_content() {
        let a = flat(4, 4, 0.2);
        let b = flat(4, 4, 0.8);
        assert_eq!(frame_hash(&a), frame_hash(&a.clone()));
        assert_ne!(frame_hash(&a), frame_hash(&b));
    }
}
