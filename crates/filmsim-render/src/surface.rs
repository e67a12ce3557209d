//! Preview and export backends driven by the render thread.
//!
//! The GPU pipelines implement these traits; [`CpuPreview`] stands in for the
//! GPU preview when no adapter is available.

use filmsim_color::{processor, GrainSettings, GrainTexture, Look, LutGrid};
use filmsim_core::{FilmSimError, Raster, Result, SharedRaster, ViewTransform};
use filmsim_gpu::{DrawOutcome, ExportPipeline, PendingSlot, PreviewPipeline, UploadStats};
use std::sync::Arc;
use tracing::debug;

/// Something that displays the current render state.
pub trait PreviewSurface: Send {
    fn name(&self) -> &'static str;
    fn init(&mut self) -> Result<()>;
    fn set_image(&mut self, image: SharedRaster);
    fn set_lut(&mut self, lut: Option<Arc<LutGrid>>);
    fn set_grain_texture(&mut self, texture: Arc<GrainTexture>);
    fn set_intensity(&mut self, intensity: f32);
    fn set_grain(&mut self, grain: GrainSettings);
    fn set_view_transform(&mut self, view: ViewTransform);
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    fn draw(&mut self) -> Result<DrawOutcome>;
    fn read_frame(&self) -> Result<Raster>;
    fn stats(&self) -> UploadStats;
    fn release(&mut self);
}

/// Something that renders full-resolution exports.
pub trait ExportBackend: Send {
    fn name(&self) -> &'static str;
    fn export(&mut self, source: &Raster, look: &Look<'_>) -> Result<Raster>;
    fn release(&mut self);
}

impl PreviewSurface for PreviewPipeline {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn init(&mut self) -> Result<()> {
        PreviewPipeline::init(self)
    }

    fn set_image(&mut self, image: SharedRaster) {
        PreviewPipeline::set_image(self, image)
    }

    fn set_lut(&mut self, lut: Option<Arc<LutGrid>>) {
        PreviewPipeline::set_lut(self, lut)
    }

    fn set_grain_texture(&mut self, texture: Arc<GrainTexture>) {
        PreviewPipeline::set_grain_texture(self, texture)
    }

    fn set_intensity(&mut self, intensity: f32) {
        PreviewPipeline::set_intensity(self, intensity)
    }

    fn set_grain(&mut self, grain: GrainSettings) {
        PreviewPipeline::set_grain(self, grain)
    }

    fn set_view_transform(&mut self, view: ViewTransform) {
        PreviewPipeline::set_view_transform(self, view)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        PreviewPipeline::resize(self, width, height)
    }

    fn draw(&mut self) -> Result<DrawOutcome> {
        PreviewPipeline::draw(self)
    }

    fn read_frame(&self) -> Result<Raster> {
        PreviewPipeline::read_frame(self)
    }

    fn stats(&self) -> UploadStats {
        PreviewPipeline::stats(self)
    }

    fn release(&mut self) {
        PreviewPipeline::release(self)
    }
}

impl ExportBackend for ExportPipeline {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn export(&mut self, source: &Raster, look: &Look<'_>) -> Result<Raster> {
        self.render(source, look)
    }

    fn release(&mut self) {
        ExportPipeline::release(self)
    }
}

/// Software preview: renders a bounded-resolution frame that fits the
/// viewport. Pan and zoom are not applied.
pub struct CpuPreview {
    viewport: (u32, u32),
    pending_image: PendingSlot<SharedRaster>,
    pending_lut: PendingSlot<Option<Arc<LutGrid>>>,
    pending_grain: PendingSlot<Arc<GrainTexture>>,
    image: Option<SharedRaster>,
    lut: Option<Arc<LutGrid>>,
    grain_texture: Option<Arc<GrainTexture>>,
    intensity: f32,
    grain: GrainSettings,
    frame: Option<Raster>,
    stats: UploadStats,
}

impl CpuPreview {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            viewport: (viewport.0.max(1), viewport.1.max(1)),
            pending_image: PendingSlot::new(),
            pending_lut: PendingSlot::new(),
            pending_grain: PendingSlot::new(),
            image: None,
            lut: None,
            grain_texture: None,
            intensity: 1.0,
            grain: GrainSettings::default(),
            frame: None,
            stats: UploadStats::default(),
        }
    }

    /// Longest edge of `image` once scaled to fit the viewport (never upscaled).
    fn fit_dimension(&self, image: &Raster) -> u32 {
        let (vw, vh) = self.viewport;
        let (iw, ih) = (image.width().max(1), image.height().max(1));
        let scale = (vw as f64 / iw as f64).min(vh as f64 / ih as f64).min(1.0);
        ((iw.max(ih) as f64 * scale).round() as u32).max(1)
    }
}

impl PreviewSurface for CpuPreview {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_image(&mut self, image: SharedRaster) {
        self.pending_image.put(image);
    }

    fn set_lut(&mut self, lut: Option<Arc<LutGrid>>) {
        self.pending_lut.put(lut);
    }

    fn set_grain_texture(&mut self, texture: Arc<GrainTexture>) {
        self.pending_grain.put(texture);
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    fn set_grain(&mut self, grain: GrainSettings) {
        self.grain = grain;
    }

    fn set_view_transform(&mut self, _view: ViewTransform) {}

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.viewport = (width.max(1), height.max(1));
        Ok(())
    }

    fn draw(&mut self) -> Result<DrawOutcome> {
        if let Some(image) = self.pending_image.take() {
            self.image = Some(image);
            self.stats.image_uploads += 1;
        }
        if let Some(lut) = self.pending_lut.take() {
            self.lut = lut;
            self.stats.lut_uploads += 1;
        }
        if let Some(texture) = self.pending_grain.take() {
            self.grain_texture = Some(texture);
            self.stats.grain_uploads += 1;
        }

        let Some(image) = self.image.as_ref() else {
            return Ok(DrawOutcome::Skipped);
        };
        let mut look = Look::new(self.lut.as_deref(), self.intensity);
        if let Some(texture) = self.grain_texture.as_deref() {
            look = look.with_grain(texture, &self.grain);
        }
        let frame = processor::render_bounded(image, &look, self.fit_dimension(image))?;
        debug!(width = frame.width(), height = frame.height(), "cpu preview frame");
        self.frame = Some(frame);
        self.stats.frames += 1;
        Ok(DrawOutcome::Drawn)
    }

    fn read_frame(&self) -> Result<Raster> {
        self.frame
            .clone()
            .ok_or_else(|| FilmSimError::InvalidParameter("no frame has been drawn".into()))
    }

    fn stats(&self) -> UploadStats {
        self.stats
    }

    fn release(&mut self) {
        self.image = None;
        self.frame = None;
    }
}
