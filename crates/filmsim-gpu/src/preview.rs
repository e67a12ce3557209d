//! Interactive preview pipeline.
//!
//! Owns the preview render state and the GPU objects that display it. All
//! setters only record state; uploads happen on the next [`PreviewPipeline::draw`].

use crate::context::GpuContext;
use crate::handles::{TextureArena, TextureHandle};
use crate::pass::FilmPass;
use crate::pending::{DrawOutcome, PendingSlot, UploadStats};
use crate::readback::read_texture;
use crate::texture::GpuTexture;
use crate::uniforms::FilmUniforms;
use filmsim_color::{GrainSettings, GrainStyle, GrainTexture, LutGrid};
use filmsim_core::{aspect_scale, FilmSimError, Raster, Result, SharedRaster, ViewTransform};
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle of the preview pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    RenderingFrame,
    Released,
}

struct PreviewResources {
    pass: FilmPass,
    arena: TextureArena,
    image: TextureHandle,
    lut: TextureHandle,
    grain: TextureHandle,
    target: GpuTexture,
}

/// GPU preview of the current image, LUT and grain.
pub struct PreviewPipeline {
    ctx: Arc<GpuContext>,
    state: PipelineState,
    resources: Option<PreviewResources>,
    viewport: (u32, u32),

    pending_image: PendingSlot<SharedRaster>,
    pending_lut: PendingSlot<Option<Arc<LutGrid>>>,
    pending_grain: PendingSlot<Arc<GrainTexture>>,

    intensity: f32,
    grain: GrainSettings,
    view: ViewTransform,

    image_size: Option<(u32, u32)>,
    lut_size: Option<u32>,
    grain_size: (u32, u32),
    stats: UploadStats,
}

impl PreviewPipeline {
    pub fn new(ctx: Arc<GpuContext>, viewport: (u32, u32)) -> Self {
        Self {
            ctx,
            state: PipelineState::Uninitialized,
            resources: None,
            viewport: (viewport.0.max(1), viewport.1.max(1)),
            pending_image: PendingSlot::new(),
            pending_lut: PendingSlot::new(),
            pending_grain: PendingSlot::new(),
            intensity: 1.0,
            grain: GrainSettings::default(),
            view: ViewTransform::IDENTITY,
            image_size: None,
            lut_size: None,
            grain_size: (1, 1),
            stats: UploadStats::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> UploadStats {
        self.stats
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Create the pass and the three texture slots. Safe to call repeatedly;
    /// on failure nothing is kept and the next call starts over.
    pub fn init(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Ready | PipelineState::RenderingFrame => return Ok(()),
            PipelineState::Released => {
                return Err(FilmSimError::Gpu("preview pipeline was released".into()))
            }
            PipelineState::Uninitialized => {}
        }

        let pass = FilmPass::new(&self.ctx, wgpu::FilterMode::Linear)?;
        let identity = LutGrid::identity(2)?;
        let requested_grain = self.pending_grain.peek().cloned();
        let default_grain = match &requested_grain {
            Some(texture) => Arc::clone(texture),
            None => Arc::new(GrainTexture::generate(GrainStyle::default())),
        };
        let (w, h) = self.viewport;
        let ctx = &self.ctx;
        let (arena, image, lut, grain, target) = ctx.scoped(|| {
            let mut arena = TextureArena::new();
            let image = arena.insert(GpuTexture::image(&ctx.device, 1, 1));
            let lut = arena.insert(GpuTexture::from_lut(&ctx.device, &ctx.queue, &identity));
            let grain = arena.insert(GpuTexture::from_grain(
                &ctx.device,
                &ctx.queue,
                &default_grain,
            ));
            let target = GpuTexture::render_target(&ctx.device, w, h);
            (arena, image, lut, grain, target)
        })?;

        if requested_grain.is_some() {
            self.pending_grain.take();
        }
        self.grain_size = (default_grain.width(), default_grain.height());
        self.stats.grain_uploads += 1;
        self.resources = Some(PreviewResources {
            pass,
            arena,
            image,
            lut,
            grain,
            target,
        });
        self.state = PipelineState::Ready;
        info!(width = w, height = h, "preview pipeline initialized");
        Ok(())
    }

    pub fn set_image(&mut self, image: SharedRaster) {
        self.pending_image.put(image);
    }

    /// Select a LUT, or `None` to show the image ungraded.
    pub fn set_lut(&mut self, lut: Option<Arc<LutGrid>>) {
        self.pending_lut.put(lut);
    }

    pub fn set_grain_texture(&mut self, texture: Arc<GrainTexture>) {
        self.pending_grain.put(texture);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    pub fn set_grain(&mut self, grain: GrainSettings) {
        self.grain = grain;
    }

    pub fn set_view_transform(&mut self, view: ViewTransform) {
        self.view = view;
    }

    /// Resize the viewport, recreating the render target.
    ///
    /// On failure the previous target and viewport stay in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let size = (width.max(1), height.max(1));
        if size == self.viewport {
            return Ok(());
        }
        if let Some(res) = self.resources.as_mut() {
            let ctx = &self.ctx;
            res.target = ctx.scoped(|| GpuTexture::render_target(&ctx.device, size.0, size.1))?;
            debug!(width = size.0, height = size.1, "preview target resized");
        }
        self.viewport = size;
        Ok(())
    }

    /// Dimensions of the grain texture currently bound.
    pub fn grain_texture_size(&self) -> (u32, u32) {
        self.grain_size
    }

    /// Consume pending uploads and render one frame.
    pub fn draw(&mut self) -> Result<DrawOutcome> {
        match self.state {
            PipelineState::Ready => {}
            PipelineState::Uninitialized => self.init()?,
            PipelineState::RenderingFrame => {
                return Err(FilmSimError::Gpu("draw re-entered".into()))
            }
            PipelineState::Released => {
                return Err(FilmSimError::Gpu("preview pipeline was released".into()))
            }
        }
        if self.image_size.is_none() && !self.pending_image.is_pending() {
            return Ok(DrawOutcome::Skipped);
        }

        self.state = PipelineState::RenderingFrame;
        let result = self.render_frame();
        self.state = PipelineState::Ready;
        result.map(|_| DrawOutcome::Drawn)
    }

    fn render_frame(&mut self) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);
        let res = self
            .resources
            .as_mut()
            .ok_or_else(|| FilmSimError::Gpu("preview resources missing".into()))?;

        ctx.scoped(|| -> Result<()> {
            if let Some(image) = self.pending_image.take() {
                let size = (image.width(), image.height());
                if image.is_empty() {
                    return Err(FilmSimError::InvalidParameter("empty preview image".into()));
                }
                match res.arena.get(res.image) {
                    Some(current) if (current.width, current.height) == size => {
                        current.upload_raster(&ctx.queue, &image)?;
                    }
                    _ => {
                        let texture = GpuTexture::from_raster(&ctx.device, &ctx.queue, &image)?;
                        res.arena.replace(res.image, texture);
                    }
                }
                self.image_size = Some(size);
                self.stats.image_uploads += 1;
                debug!(width = size.0, height = size.1, "uploaded preview image");
            }

            if let Some(lut) = self.pending_lut.take() {
                let texture = match lut.as_deref() {
                    Some(grid) => GpuTexture::from_lut(&ctx.device, &ctx.queue, grid),
                    None => GpuTexture::from_lut(&ctx.device, &ctx.queue, &LutGrid::identity(2)?),
                };
                res.arena.replace(res.lut, texture);
                self.lut_size = lut.map(|l| l.size() as u32);
                self.stats.lut_uploads += 1;
                debug!(size = ?self.lut_size, "uploaded preview LUT");
            }

            if let Some(grain) = self.pending_grain.take() {
                res.arena
                    .replace(res.grain, GpuTexture::from_grain(&ctx.device, &ctx.queue, &grain));
                self.grain_size = (grain.width(), grain.height());
                self.stats.grain_uploads += 1;
                debug!("uploaded preview grain");
            }

            let image_size = self.image_size.unwrap_or((1, 1));
            let aspect = aspect_scale(image_size, self.viewport);
            let uniforms = FilmUniforms::new(self.lut_size, self.intensity, &self.grain, self.grain_size)
                .with_view(aspect, &self.view);
            res.pass.write_uniforms(&ctx.queue, &uniforms);

            let (Some(image), Some(lut), Some(grain)) = (
                res.arena.get(res.image),
                res.arena.get(res.lut),
                res.arena.get(res.grain),
            ) else {
                return Err(FilmSimError::Gpu("preview texture slot empty".into()));
            };
            let bind_group = res.pass.bind(&ctx.device, image, lut, grain);
            let mut encoder = ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Preview Encoder"),
                });
            res.pass.encode(&mut encoder, &res.target.view, &bind_group);
            ctx.queue.submit(Some(encoder.finish()));
            Ok(())
        })??;

        self.stats.frames += 1;
        Ok(())
    }

    /// Read the last rendered frame.
    pub fn read_frame(&self) -> Result<Raster> {
        let res = self
            .resources
            .as_ref()
            .ok_or_else(|| FilmSimError::Gpu("preview pipeline is not initialized".into()))?;
        read_texture(&self.ctx, &res.target)
    }

    /// Drop every GPU resource. The pipeline cannot be used afterwards.
    pub fn release(&mut self) {
        if let Some(mut res) = self.resources.take() {
            res.arena.clear();
        }
        self.state = PipelineState::Released;
        debug!("preview pipeline released");
    }
}
