//! GPU texture management.

use filmsim_color::{GrainTexture, LutGrid};
use filmsim_core::{FilmSimError, Raster, Result, BYTES_PER_PIXEL};
use half::f16;

/// Format of images and render targets. Values are stored unconverted so
/// the GPU sees the same numbers as the CPU path.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Format of 3D LUTs: filterable on every backend, unlike `Rgba32Float`.
pub const LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format of grain textures.
pub const GRAIN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// A GPU texture with its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub format: wgpu::TextureFormat,
}

impl GpuTexture {
    /// Create a new GPU texture with the given extent.
    pub fn new(
        device: &wgpu::Device,
        size: wgpu::Extent3d,
        dimension: wgpu::TextureDimension,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        label: Option<&str>,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width: size.width,
            height: size.height,
            depth: size.depth_or_array_layers,
            format,
        }
    }

    fn extent_2d(width: u32, height: u32) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    /// Create a sampled texture for an input image.
    pub fn image(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::new(
            device,
            Self::extent_2d(width.max(1), height.max(1)),
            wgpu::TextureDimension::D2,
            IMAGE_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            Some("Image Texture"),
        )
    }

    /// Create a render target texture.
    pub fn render_target(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::new(
            device,
            Self::extent_2d(width.max(1), height.max(1)),
            wgpu::TextureDimension::D2,
            IMAGE_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC,
            Some("Render Target"),
        )
    }

    /// Create a 3D LUT texture with `size` points per axis.
    pub fn lut(device: &wgpu::Device, size: u32) -> Self {
        Self::new(
            device,
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: size,
            },
            wgpu::TextureDimension::D3,
            LUT_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            Some("LUT Texture"),
        )
    }

    /// Create a single-channel grain texture.
    pub fn grain(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self::new(
            device,
            Self::extent_2d(width, height),
            wgpu::TextureDimension::D2,
            GRAIN_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            Some("Grain Texture"),
        )
    }

    /// Create and fill an image texture.
    pub fn from_raster(device: &wgpu::Device, queue: &wgpu::Queue, raster: &Raster) -> Result<Self> {
        let tex = Self::image(device, raster.width(), raster.height());
        tex.upload_raster(queue, raster)?;
        Ok(tex)
    }

    /// Create and fill a LUT texture.
    pub fn from_lut(device: &wgpu::Device, queue: &wgpu::Queue, lut: &LutGrid) -> Self {
        let tex = Self::lut(device, lut.size() as u32);
        tex.upload_lut(queue, lut);
        tex
    }

    /// Create and fill a grain texture.
    pub fn from_grain(device: &wgpu::Device, queue: &wgpu::Queue, grain: &GrainTexture) -> Self {
        let tex = Self::grain(device, grain.width(), grain.height());
        tex.write(queue, grain.as_bytes(), grain.width());
        tex
    }

    /// Upload a raster to this texture.
    pub fn upload_raster(&self, queue: &wgpu::Queue, raster: &Raster) -> Result<()> {
        if raster.width() != self.width || raster.height() != self.height {
            return Err(FilmSimError::Gpu(format!(
                "Raster size {}x{} doesn't match texture size {}x{}",
                raster.width(),
                raster.height(),
                self.width,
                self.height
            )));
        }
        if raster.is_empty() {
            return Ok(());
        }
        self.write(queue, raster.as_bytes(), raster.stride() as u32);
        Ok(())
    }

    /// Upload a LUT grid. Red maps to width, green to height, blue to depth.
    pub fn upload_lut(&self, queue: &wgpu::Queue, lut: &LutGrid) {
        let texels: Vec<f16> = lut
            .samples()
            .chunks_exact(3)
            .flat_map(|rgb| {
                [
                    f16::from_f32(rgb[0]),
                    f16::from_f32(rgb[1]),
                    f16::from_f32(rgb[2]),
                    f16::ONE,
                ]
            })
            .collect();
        let row_bytes = self.width * 4 * std::mem::size_of::<f16>() as u32;
        self.write(queue, bytemuck::cast_slice(&texels), row_bytes);
    }

    fn write(&self, queue: &wgpu::Queue, data: &[u8], bytes_per_row: u32) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: self.depth,
            },
        );
    }

    /// Memory usage estimate in bytes.
    pub fn memory_size(&self) -> usize {
        let bytes_per_texel = match self.format {
            wgpu::TextureFormat::R8Unorm => 1,
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => BYTES_PER_PIXEL,
            wgpu::TextureFormat::Rgba16Float => 8,
            wgpu::TextureFormat::Rgba32Float => 16,
            _ => 4,
        };
        self.width as usize * self.height as usize * self.depth as usize * bytes_per_texel
    }
}
