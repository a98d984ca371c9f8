//! GPU compositor: the effect chain primitives on wgpu.

use super::capture::FrameRecorder;
use super::mesh_pass::MeshPass;
use super::post::PostPass;
use super::targets::RenderTargets;
use super::RenderSystem;
use crate::camera::Camera;
use crate::effects::{Compositor, PassKind};
use crate::error::RenderError;
use crate::params::PassParams;
use crate::scene::Scene;

/// Renders into offscreen targets and blits the result to the window surface.
///
/// One command encoder spans a frame: `reset` opens it, `present` submits it.
pub struct GpuCompositor {
    system: RenderSystem,
    targets: RenderTargets,
    mesh: MeshPass,
    post: PostPass,
    encoder: Option<wgpu::CommandEncoder>,
    recorder: Option<FrameRecorder>,
    released: bool,
}

impl GpuCompositor {
    pub fn new(system: RenderSystem, recorder: Option<FrameRecorder>) -> Result<Self, RenderError> {
        let (width, height) = system.size();
        let targets = RenderTargets::new(&system.device, width, height);
        let mesh = MeshPass::new(&system.device)?;
        let post = PostPass::new(&system.device, system.format())?;
        log::info!("GPU compositor ready ({}x{})", width, height);

        Ok(Self {
            system,
            targets,
            mesh,
            post,
            encoder: None,
            recorder,
            released: false,
        })
    }

    /// True once a recording session has captured all of its frames
    pub fn recording_finished(&self) -> bool {
        self.recorder.as_ref().is_some_and(FrameRecorder::finished)
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.released {
            Err(RenderError::Released)
        } else {
            Ok(())
        }
    }
}

impl Compositor for GpuCompositor {
    fn size(&self) -> (u32, u32) {
        self.system.size()
    }

    fn target_sizes(&self) -> Vec<(u32, u32)> {
        self.targets.sizes()
    }

    fn reset(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        // An unsubmitted encoder from a failed frame is dropped here
        self.encoder = Some(self.system.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            },
        ));
        self.targets.current = 0;
        Ok(())
    }

    fn render_base(&mut self, scene: &Scene, camera: &Camera) -> Result<(), RenderError> {
        self.ensure_live()?;
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoBaseFrame)?;
        self.mesh
            .record(&self.system, encoder, &self.targets, scene, camera);
        Ok(())
    }

    fn apply(
        &mut self,
        pass: PassKind,
        params: &PassParams,
        frame: u64,
    ) -> Result<(), RenderError> {
        self.ensure_live()?;
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoBaseFrame)?;
        self.post.apply(
            &self.system,
            encoder,
            &mut self.targets,
            pass,
            params,
            frame,
        );
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        let mut encoder = self.encoder.take().ok_or(RenderError::NoBaseFrame)?;

        let output = match self.system.surface.get_current_texture() {
            Ok(output) => output,
            Err(err) => {
                if matches!(err, wgpu::SurfaceError::Outdated) {
                    self.system.reconfigure();
                }
                return Err(RenderError::from(err));
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.post
            .blit(&self.system, &mut encoder, &self.targets, &view);
        self.system.queue.submit(std::iter::once(encoder.finish()));

        let captured = match self.recorder.as_mut() {
            Some(recorder) => {
                recorder.capture(&self.system.device, &self.system.queue, &output.texture)
            }
            None => Ok(()),
        };
        output.present();
        captured
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.released {
            return;
        }
        self.system.resize(width, height);
        let (width, height) = self.system.size();
        self.targets.recreate(&self.system.device, width, height);
        log::debug!("GPU targets resized to {}x{}", width, height);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.encoder = None;
        self.targets.destroy();
        self.mesh.release();
        self.post.release();
        self.released = true;
        log::info!("GPU resources released");
    }
}
