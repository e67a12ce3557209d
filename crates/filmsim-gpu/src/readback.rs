//! Copy render targets back to CPU memory.

use crate::context::GpuContext;
use crate::texture::GpuTexture;
use filmsim_core::{FilmSimError, Raster, Result, BYTES_PER_PIXEL};

/// Row pitch of a readback buffer for `width` RGBA8 pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL as u32;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Size of the readback buffer needed for a `width`×`height` target.
pub fn readback_size(width: u32, height: u32) -> u64 {
    padded_bytes_per_row(width) as u64 * height as u64
}

/// Read an RGBA8 texture into a tightly packed raster.
///
/// Submits its own copy and blocks until the buffer is mapped.
pub fn read_texture(ctx: &GpuContext, texture: &GpuTexture) -> Result<Raster> {
    let (width, height) = (texture.width, texture.height);
    let padded = padded_bytes_per_row(width);

    let buffer = ctx.scoped(|| {
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: readback_size(width, height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(Some(encoder.finish()));
        buffer
    })?;

    let slice = buffer.slice(..);
    let (tx, rx) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|_| FilmSimError::Gpu("readback callback dropped".into()))?
        .map_err(|e| FilmSimError::Gpu(format!("readback map failed: {}", e)))?;

    let mut raster = Raster::try_new(width, height)?;
    {
        let mapped = slice.get_mapped_range();
        let row_bytes = raster.stride();
        let padded = padded as usize;
        for (row, dst) in raster.as_bytes_mut().chunks_exact_mut(row_bytes).enumerate() {
            let src = row * padded;
            dst.copy_from_slice(&mapped[src..src + row_bytes]);
        }
    }
    buffer.unmap();
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_padding() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(4000), 16128);
        assert_eq!(readback_size(1, 3), 768);
    }
}
