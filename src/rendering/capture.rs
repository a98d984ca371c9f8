//! Recording mode: read back presented frames and save them as PNGs.

use crate::error::RenderError;
use crate::params::RecordingConfig;

/// Saves each presented surface texture until the configured duration is reached
pub struct FrameRecorder {
    config: RecordingConfig,
    frame: usize,
}

impl FrameRecorder {
    pub fn new(config: RecordingConfig) -> Self {
        Self { config, frame: 0 }
    }

    pub fn frames_captured(&self) -> usize {
        self.frame
    }

    pub fn finished(&self) -> bool {
        self.frame >= self.config.total_frames()
    }

    /// Copy `texture` to a buffer, strip row padding, and write the PNG
    pub fn capture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
    ) -> Result<(), RenderError> {
        if self.finished() {
            return Ok(());
        }

        let (width, height) = (texture.width(), texture.height());
        let bytes_per_pixel = 4;
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Capture Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Capture Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        slice.map_async(wgpu::MapMode::Read, |_| {});
        device.poll(wgpu::Maintain::Wait);

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded_bytes_per_row as usize).take(height as usize) {
                pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
            }
        }
        buffer.unmap();

        if is_bgra(texture.format()) {
            swap_red_blue(&mut pixels);
        }

        let path = format!("{}/frame_{:05}.png", self.config.frames_dir(), self.frame);
        image::save_buffer(&path, &pixels, width, height, image::ColorType::Rgba8)
            .map_err(|e| RenderError::Capture(format!("{path}: {e}")))?;

        self.frame += 1;
        if self.finished() {
            log::info!(
                "Recording complete: {} frames in {}",
                self.frame,
                self.config.frames_dir()
            );
        }
        Ok(())
    }
}

fn is_bgra(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    )
}

fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_red_blue() {
        let mut pixels = vec![1, 2, 3, 4, 5, 6, 7, 8];
        swap_red_blue(&mut pixels);
        assert_eq!(pixels, [3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn test_recorder_finishes_after_total_frames() {
        let recorder = FrameRecorder::new(RecordingConfig::new(0.0));
        assert!(recorder.finished());
        assert_eq!(recorder.frames_captured(), 0);
    }
}
