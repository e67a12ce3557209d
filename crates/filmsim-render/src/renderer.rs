//! The render control surface.

use crate::config::RenderConfig;
use crate::grain_cache::GrainCache;
use crate::render_thread::{ExportFactory, RenderCommand, RenderHandle, RenderThread};
use crate::surface::{CpuPreview, ExportBackend, PreviewSurface};
use filmsim_color::{apply_look, render_bounded, GrainSettings, GrainStyle, GrainTexture, Look, LutGrid};
use filmsim_core::{FilmSimError, Raster, Result, SharedRaster, ViewTransform};
use filmsim_gpu::{ExportPipeline, GpuContext, PreviewPipeline, UploadStats};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A full-resolution render of `source` through a LUT and grain.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub source: SharedRaster,
    pub lut: Option<Arc<LutGrid>>,
    pub intensity: f32,
    pub grain: GrainSettings,
}

impl ExportRequest {
    /// An ungraded request with grain disabled.
    pub fn new(source: SharedRaster) -> Self {
        Self {
            source,
            lut: None,
            intensity: 1.0,
            grain: GrainSettings::default(),
        }
    }

    pub fn with_lut(mut self, lut: Arc<LutGrid>, intensity: f32) -> Self {
        self.lut = Some(lut);
        self.intensity = intensity;
        self
    }

    pub fn with_grain(mut self, grain: GrainSettings) -> Self {
        self.grain = grain;
        self
    }

    /// The look this request applies, using `texture` for grain.
    pub fn look<'a>(&'a self, texture: &'a GrainTexture) -> Look<'a> {
        Look::new(self.lut.as_deref(), self.intensity).with_grain(texture, &self.grain)
    }
}

/// Front end to the render thread.
///
/// Setters only enqueue; the thread coalesces them into the next frame.
/// Exports go to the GPU when available and fall back to the CPU processor
/// on any GPU failure.
pub struct Renderer {
    config: RenderConfig,
    grain: Arc<GrainCache>,
    handle: RenderHandle,
    gpu_export: bool,
    _thread: RenderThread,
}

impl Renderer {
    /// Build a renderer, using the GPU when enabled and an adapter exists.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let grain = Arc::new(match &config.grain_texture {
            Some(path) => GrainCache::with_texture(GrainTexture::load(path)?),
            None => GrainCache::new(),
        });

        let (preview, export) = if config.gpu_enabled {
            match GpuContext::new_blocking() {
                Ok(ctx) => {
                    let ctx = Arc::new(ctx);
                    let preview: Box<dyn PreviewSurface> =
                        Box::new(PreviewPipeline::new(Arc::clone(&ctx), config.viewport()));
                    let budget = config.gpu_memory_budget;
                    let export: ExportFactory = Box::new(move || -> Result<Box<dyn ExportBackend>> {
                        let pipeline = ExportPipeline::with_budget(ctx, budget)?;
                        Ok(Box::new(pipeline))
                    });
                    (preview, Some(export))
                }
                Err(e) => {
                    warn!(error = %e, "no GPU available, rendering on the CPU");
                    Self::cpu_backends(&config)
                }
            }
        } else {
            info!("GPU disabled by configuration");
            Self::cpu_backends(&config)
        };

        Self::start(config, preview, export, grain)
    }

    fn cpu_backends(config: &RenderConfig) -> (Box<dyn PreviewSurface>, Option<ExportFactory>) {
        (Box::new(CpuPreview::new(config.viewport())), None)
    }

    /// Build a renderer around explicit backends.
    pub fn with_backends(
        config: RenderConfig,
        preview: Box<dyn PreviewSurface>,
        export: Option<Box<dyn ExportBackend>>,
        grain: Arc<GrainCache>,
    ) -> Result<Self> {
        let export = export.map(|backend| -> ExportFactory {
            Box::new(move || -> Result<Box<dyn ExportBackend>> { Ok(backend) })
        });
        Self::start(config, preview, export, grain)
    }

    fn start(
        config: RenderConfig,
        preview: Box<dyn PreviewSurface>,
        export: Option<ExportFactory>,
        grain: Arc<GrainCache>,
    ) -> Result<Self> {
        let thread = RenderThread::spawn(preview, export, Arc::clone(&grain), &config)?;
        Ok(Self {
            handle: thread.handle(),
            gpu_export: thread.has_export(),
            config,
            grain,
            _thread: thread,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// A handle for sending commands from other threads.
    pub fn handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    pub fn has_gpu_export(&self) -> bool {
        self.gpu_export
    }

    pub fn set_image(&self, image: SharedRaster) -> Result<()> {
        self.handle.send(RenderCommand::SetImage(image))
    }

    /// Select a LUT, or `None` for the ungraded image.
    pub fn set_lut(&self, lut: Option<Arc<LutGrid>>) -> Result<()> {
        self.handle.send(RenderCommand::SetLut(lut))
    }

    pub fn set_intensity(&self, intensity: f32) -> Result<()> {
        self.handle.send(RenderCommand::SetIntensity(intensity))
    }

    pub fn set_grain_enabled(&self, enabled: bool) -> Result<()> {
        self.handle.send(RenderCommand::SetGrainEnabled(enabled))
    }

    pub fn set_grain_intensity(&self, intensity: f32) -> Result<()> {
        self.handle.send(RenderCommand::SetGrainIntensity(intensity))
    }

    pub fn set_grain_scale(&self, scale: f32) -> Result<()> {
        self.handle.send(RenderCommand::SetGrainScale(scale))
    }

    pub fn set_grain_style(&self, style: GrainStyle) -> Result<()> {
        self.handle.send(RenderCommand::SetGrainStyle(style))
    }

    pub fn set_view_transform(&self, view: ViewTransform) -> Result<()> {
        self.handle.send(RenderCommand::SetViewTransform(view))
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.handle.send(RenderCommand::Resize(width, height))
    }

    pub fn request_frame(&self) -> Result<()> {
        self.handle.send(RenderCommand::RequestFrame)
    }

    /// The current preview frame.
    pub fn read_frame(&self) -> Result<Raster> {
        self.handle.read_frame()
    }

    pub fn stats(&self) -> Result<UploadStats> {
        self.handle.stats()
    }

    /// Render `request` at full resolution.
    ///
    /// A look that changes nothing returns a copy of the source. Otherwise the
    /// GPU export runs first; if it fails, the CPU processor renders instead
    /// and only a CPU failure is returned.
    pub fn export(&self, request: ExportRequest) -> Result<Raster> {
        let texture = self.grain.get(request.grain.style);
        let look = request.look(&texture);
        if look.is_noop() {
            debug!("export look is a no-op, copying source");
            return Ok(Raster::clone(&request.source));
        }

        if self.gpu_export {
            match self.handle.export(request.clone()) {
                Ok(raster) => return Ok(raster),
                Err(e) => warn!(error = %e, "GPU export failed, falling back to CPU"),
            }
        }
        info!(
            width = request.source.width(),
            height = request.source.height(),
            "CPU export"
        );
        export_cpu(&request.source, &look, self.config.cpu_memory_budget)
    }

    /// Bounded-resolution render for catalog thumbnails, on the calling thread.
    pub fn render_thumbnail(&self, request: &ExportRequest) -> Result<Raster> {
        let texture = self.grain.get(request.grain.style);
        render_bounded(&request.source, &request.look(&texture), self.config.thumbnail_max_dim)
    }
}

/// Full-resolution CPU render, refusing sources larger than `memory_budget` bytes.
pub fn export_cpu(source: &Raster, look: &Look<'_>, memory_budget: usize) -> Result<Raster> {
    let needed = source.memory_size();
    if needed > memory_budget {
        return Err(FilmSimError::OutOfMemory(format!(
            "{}x{} export needs {} bytes, CPU budget is {}",
            source.width(),
            source.height(),
            needed,
            memory_budget
        )));
    }
    let mut out = Raster::try_new(source.width(), source.height())?;
    out.as_bytes_mut().copy_from_slice(source.as_bytes());
    apply_look(&mut out, look);
    Ok(out)
}
