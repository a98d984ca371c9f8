//! Offscreen render targets for the GPU compositor.

/// Format of the working (ping-pong) and glow textures
pub const WORKING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub(crate) fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Scene color ping-pong pair, bloom glow pair, and the scene depth buffer.
///
/// The working image lives in `color[current]`; a pass reads it and writes
/// `color[1 - current]`, then the index flips.
pub(crate) struct RenderTargets {
    pub(crate) color: [(wgpu::Texture, wgpu::TextureView); 2],
    pub(crate) glow: [(wgpu::Texture, wgpu::TextureView); 2],
    pub(crate) depth: (wgpu::Texture, wgpu::TextureView),
    pub(crate) current: usize,
}

impl RenderTargets {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let color = |label: &str| create_texture(device, label, width, height, WORKING_FORMAT, sampled);
        Self {
            color: [color("working_a"), color("working_b")],
            glow: [color("glow_a"), color("glow_b")],
            depth: create_texture(
                device,
                "scene_depth",
                width,
                height,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
            current: 0,
        }
    }

    pub(crate) fn recreate(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Self::new(device, width, height);
    }

    pub(crate) fn working_view(&self) -> &wgpu::TextureView {
        &self.color[self.current].1
    }

    /// (source, destination) views for the next pass
    pub(crate) fn ping_pong(&self) -> (&wgpu::TextureView, &wgpu::TextureView) {
        (&self.color[self.current].1, &self.color[1 - self.current].1)
    }

    pub(crate) fn flip(&mut self) {
        self.current = 1 - self.current;
    }

    pub(crate) fn sizes(&self) -> Vec<(u32, u32)> {
        self.color
            .iter()
            .chain(self.glow.iter())
            .chain(std::iter::once(&self.depth))
            .map(|(texture, _)| (texture.width(), texture.height()))
            .collect()
    }

    pub(crate) fn destroy(&self) {
        for (texture, _) in self.color.iter().chain(self.glow.iter()) {
            texture.destroy();
        }
        self.depth.0.destroy();
    }
}
