//! Full-resolution offscreen export.
//!
//! Renders the film pass into a target sized exactly to the source and
//! reads it back. Per-export textures live only inside [`ExportPipeline::render`].

use crate::context::GpuContext;
use crate::pass::FilmPass;
use crate::readback::{read_texture, readback_size};
use crate::texture::GpuTexture;
use crate::uniforms::FilmUniforms;
use filmsim_color::{GrainSettings, GrainTexture, Look, LutGrid};
use filmsim_core::{memory_budget, FilmSimError, Raster, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Offscreen renderer for exports.
pub struct ExportPipeline {
    ctx: Arc<GpuContext>,
    resources: Option<ExportResources>,
    memory_budget: usize,
}

struct ExportResources {
    pass: FilmPass,
    /// Bound when the look has no LUT; its contribution is zeroed.
    identity_lut: GpuTexture,
    /// Bound when the look has no grain.
    neutral_grain: GpuTexture,
}

impl ExportPipeline {
    /// Build the pipeline with the default GPU memory budget.
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        Self::with_budget(ctx, memory_budget::GPU_EXPORT_BUDGET)
    }

    /// Build the pipeline, refusing exports estimated above `memory_budget` bytes.
    pub fn with_budget(ctx: Arc<GpuContext>, memory_budget: usize) -> Result<Self> {
        let pass = FilmPass::new(&ctx, wgpu::FilterMode::Nearest)?;
        let identity = LutGrid::identity(2)?;
        let neutral = GrainTexture::from_luma(1, 1, vec![128])?;
        let (identity_lut, neutral_grain) = ctx.scoped(|| {
            (
                GpuTexture::from_lut(&ctx.device, &ctx.queue, &identity),
                GpuTexture::from_grain(&ctx.device, &ctx.queue, &neutral),
            )
        })?;
        info!(budget = memory_budget, "export pipeline ready");
        Ok(Self {
            ctx,
            resources: Some(ExportResources {
                pass,
                identity_lut,
                neutral_grain,
            }),
            memory_budget,
        })
    }

    /// Whether `release` has been called.
    pub fn is_released(&self) -> bool {
        self.resources.is_none()
    }

    /// Reject sources the device or budget cannot hold.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(FilmSimError::InvalidParameter(format!(
                "cannot export an empty {}x{} image",
                width, height
            )));
        }
        let max = self.ctx.max_texture_dimension();
        if width > max || height > max {
            return Err(FilmSimError::Gpu(format!(
                "{}x{} exceeds the GPU texture limit of {}",
                width, height, max
            )));
        }
        if readback_size(width, height) > self.ctx.max_buffer_size() {
            return Err(FilmSimError::Gpu(format!(
                "{}x{} readback exceeds the GPU buffer limit",
                width, height
            )));
        }
        let needed = memory_budget::gpu_export_bytes(width, height);
        if needed > self.memory_budget {
            return Err(FilmSimError::OutOfMemory(format!(
                "{}x{} export needs {} bytes of GPU memory, budget is {}",
                width, height, needed, self.memory_budget
            )));
        }
        Ok(())
    }

    /// Render `source` through `look` at full resolution.
    ///
    /// Zoom, pan and aspect correction never apply to exports.
    pub fn render(&mut self, source: &Raster, look: &Look<'_>) -> Result<Raster> {
        let res = self
            .resources
            .as_ref()
            .ok_or_else(|| FilmSimError::Gpu("export pipeline was released".into()))?;

        if look.is_noop() {
            debug!("export look is a no-op, copying source");
            return Ok(source.clone());
        }

        let (width, height) = (source.width(), source.height());
        self.check_dimensions(width, height)?;
        info!(width, height, "GPU export");

        let ctx = &self.ctx;
        let disabled = GrainSettings::default();
        let target = ctx.scoped(|| -> Result<GpuTexture> {
            let image = GpuTexture::from_raster(&ctx.device, &ctx.queue, source)?;
            let lut_texture = look
                .lut
                .map(|lut| GpuTexture::from_lut(&ctx.device, &ctx.queue, lut));
            let grain = look.grain.filter(|(_, settings)| settings.is_active());
            let grain_texture =
                grain.map(|(texture, _)| GpuTexture::from_grain(&ctx.device, &ctx.queue, texture));
            let (grain_settings, grain_bound) = match (grain, &grain_texture) {
                (Some((_, settings)), Some(tex)) => (settings, tex),
                _ => (&disabled, &res.neutral_grain),
            };
            let lut_bound = lut_texture.as_ref().unwrap_or(&res.identity_lut);

            let uniforms = FilmUniforms::new(
                look.lut.map(|l| l.size() as u32),
                look.intensity,
                grain_settings,
                (grain_bound.width, grain_bound.height),
            );
            res.pass.write_uniforms(&ctx.queue, &uniforms);

            let target = GpuTexture::render_target(&ctx.device, width, height);
            let bind_group = res.pass.bind(&ctx.device, &image, lut_bound, grain_bound);
            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Export Encoder"),
                });
            res.pass.encode(&mut encoder, &target.view, &bind_group);
            ctx.queue.submit(Some(encoder.finish()));
            Ok(target)
        })??;

        read_texture(ctx, &target)
    }

    /// Drop every GPU resource. Rendering afterwards is an error.
    pub fn release(&mut self) {
        if self.resources.take().is_some() {
            debug!("export pipeline released");
        }
    }
}
