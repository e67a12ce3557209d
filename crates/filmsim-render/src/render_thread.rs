//! The render thread: sole owner of the preview and export backends.
//!
//! Both backends are brought up on the thread itself, so GPU objects are
//! only ever created and used there.
//!
//! Commands arrive over a FIFO and run one at a time. Every queued command is
//! applied before a frame is drawn, so state changes made back to back
//! produce a single draw that sees all of them.

use crate::config::RenderConfig;
use crate::grain_cache::GrainCache;
use crate::renderer::ExportRequest;
use crate::surface::{CpuPreview, ExportBackend, PreviewSurface};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use filmsim_color::{GrainSettings, GrainStyle, GrainTexture, LutGrid};
use filmsim_core::{FilmSimError, Raster, Result, SharedRaster, ViewTransform};
use filmsim_gpu::{DrawOutcome, UploadStats};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Work for the render thread.
pub enum RenderCommand {
    SetImage(SharedRaster),
    SetLut(Option<Arc<LutGrid>>),
    SetIntensity(f32),
    SetGrainEnabled(bool),
    SetGrainIntensity(f32),
    SetGrainScale(f32),
    SetGrainStyle(GrainStyle),
    SetViewTransform(ViewTransform),
    Resize(u32, u32),
    /// Draw even if nothing changed.
    RequestFrame,
    ReadFrame(Sender<Result<Raster>>),
    Stats(Sender<UploadStats>),
    Export {
        request: ExportRequest,
        reply: Sender<Result<Raster>>,
    },
    Shutdown,
}

impl RenderCommand {
    fn marks_dirty(&self) -> bool {
        !matches!(
            self,
            Self::ReadFrame(_) | Self::Stats(_) | Self::Export { .. } | Self::Shutdown
        )
    }
}

/// Cloneable sender side of the render queue.
#[derive(Clone)]
pub struct RenderHandle {
    tx: Sender<RenderCommand>,
}

impl RenderHandle {
    /// Enqueue a command without waiting for it.
    pub fn send(&self, command: RenderCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| FilmSimError::RenderThread("render thread has stopped".into()))
    }

    fn request<T>(&self, command: impl FnOnce(Sender<T>) -> RenderCommand) -> Result<T> {
        let (reply, rx) = bounded(1);
        self.send(command(reply))?;
        rx.recv()
            .map_err(|_| FilmSimError::RenderThread("render thread dropped the reply".into()))
    }

    /// Read the current preview frame, drawing first if it is stale.
    pub fn read_frame(&self) -> Result<Raster> {
        self.request(RenderCommand::ReadFrame)?
    }

    pub fn stats(&self) -> Result<UploadStats> {
        self.request(RenderCommand::Stats)
    }

    /// Run an export on the render thread and wait for it.
    pub fn export(&self, request: ExportRequest) -> Result<Raster> {
        self.request(|reply| RenderCommand::Export { request, reply })?
    }
}

/// Builds the export backend. Runs once, on the render thread.
pub type ExportFactory = Box<dyn FnOnce() -> Result<Box<dyn ExportBackend>> + Send>;

/// A running render thread. Dropping it shuts the thread down and joins it.
pub struct RenderThread {
    handle: RenderHandle,
    join: Option<JoinHandle<()>>,
    has_export: bool,
}

impl RenderThread {
    /// Start the thread and wait until its backends are up.
    ///
    /// The preview is initialized on the new thread; if that fails, a
    /// [`CpuPreview`] takes its place. `export` also runs there, and a failure
    /// leaves the thread without an export backend.
    pub fn spawn(
        preview: Box<dyn PreviewSurface>,
        export: Option<ExportFactory>,
        grain: Arc<GrainCache>,
        config: &RenderConfig,
    ) -> Result<Self> {
        let (tx, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let mut render_loop = RenderLoop::new(preview, grain, config);
        let join = thread::Builder::new()
            .name("filmsim-render".into())
            .spawn(move || {
                let has_export = render_loop.init(export);
                let _ = ready_tx.send(has_export);
                render_loop.run(&rx);
            })
            .map_err(|e| FilmSimError::RenderThread(format!("cannot spawn: {}", e)))?;

        let has_export = ready_rx
            .recv()
            .map_err(|_| FilmSimError::RenderThread("render thread exited during startup".into()))?;
        Ok(Self {
            handle: RenderHandle { tx },
            join: Some(join),
            has_export,
        })
    }

    pub fn handle(&self) -> RenderHandle {
        self.handle.clone()
    }

    /// Whether the thread holds a working export backend.
    pub fn has_export(&self) -> bool {
        self.has_export
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        let _ = self.handle.send(RenderCommand::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("render thread panicked");
            }
        }
    }
}

/// State owned by the render thread.
pub(crate) struct RenderLoop {
    preview: Box<dyn PreviewSurface>,
    export: Option<Box<dyn ExportBackend>>,
    grain_cache: Arc<GrainCache>,
    intensity: f32,
    grain: GrainSettings,
    grain_texture: Arc<GrainTexture>,
    viewport: (u32, u32),
    dirty: bool,
}

impl RenderLoop {
    pub(crate) fn new(
        mut preview: Box<dyn PreviewSurface>,
        grain_cache: Arc<GrainCache>,
        config: &RenderConfig,
    ) -> Self {
        let grain_texture = grain_cache.get(config.grain.style);
        preview.set_intensity(config.intensity);
        preview.set_grain(config.grain);
        preview.set_grain_texture(Arc::clone(&grain_texture));
        Self {
            preview,
            export: None,
            grain_cache,
            intensity: config.intensity,
            grain: config.grain,
            grain_texture,
            viewport: config.viewport(),
            dirty: false,
        }
    }

    /// Bring up the backends. Returns whether an export backend is available.
    fn init(&mut self, export: Option<ExportFactory>) -> bool {
        match self.preview.init() {
            Ok(()) => info!(backend = self.preview.name(), "render thread started"),
            Err(e) => {
                warn!(error = %e, "preview initialization failed, using the CPU preview");
                self.preview.release();
                let mut cpu = CpuPreview::new(self.viewport);
                cpu.set_intensity(self.intensity);
                cpu.set_grain(self.grain);
                cpu.set_grain_texture(Arc::clone(&self.grain_texture));
                self.preview = Box::new(cpu);
            }
        }
        if let Some(factory) = export {
            match factory() {
                Ok(backend) => {
                    info!(backend = backend.name(), "export backend ready");
                    self.export = Some(backend);
                }
                Err(e) => warn!(error = %e, "export backend unavailable, exports run on the CPU"),
            }
        }
        self.export.is_some()
    }

    /// Process commands until `Shutdown` or until every sender is gone.
    pub(crate) fn run(&mut self, rx: &Receiver<RenderCommand>) {
        while let Ok(first) = rx.recv() {
            let mut next = Some(first);
            while let Some(command) = next {
                if !self.handle(command) {
                    self.shutdown();
                    return;
                }
                next = rx.try_recv().ok();
            }
            if self.dirty {
                self.draw();
            }
        }
        self.shutdown();
    }

    /// Apply one command. Returns `false` on shutdown.
    fn handle(&mut self, command: RenderCommand) -> bool {
        if command.marks_dirty() {
            self.dirty = true;
        }
        match command {
            RenderCommand::SetImage(image) => self.preview.set_image(image),
            RenderCommand::SetLut(lut) => self.preview.set_lut(lut),
            RenderCommand::SetIntensity(intensity) => {
                self.intensity = intensity;
                self.preview.set_intensity(intensity);
            }
            RenderCommand::SetGrainEnabled(enabled) => {
                self.grain.enabled = enabled;
                self.preview.set_grain(self.grain);
            }
            RenderCommand::SetGrainIntensity(intensity) => {
                self.grain.intensity = intensity;
                self.preview.set_grain(self.grain);
            }
            RenderCommand::SetGrainScale(scale) => {
                self.grain.scale = scale;
                self.preview.set_grain(self.grain);
            }
            RenderCommand::SetGrainStyle(style) => {
                self.grain.style = style;
                self.preview.set_grain(self.grain);
                let texture = self.grain_cache.get(style);
                if !Arc::ptr_eq(&texture, &self.grain_texture) {
                    self.grain_texture = Arc::clone(&texture);
                    self.preview.set_grain_texture(texture);
                }
            }
            RenderCommand::SetViewTransform(view) => self.preview.set_view_transform(view),
            RenderCommand::Resize(width, height) => match self.preview.resize(width, height) {
                Ok(()) => self.viewport = (width, height),
                Err(e) => error!(error = %e, width, height, "preview resize failed, keeping previous size"),
            },
            RenderCommand::RequestFrame => {}
            RenderCommand::ReadFrame(reply) => {
                if self.dirty {
                    self.draw();
                }
                let _ = reply.send(self.preview.read_frame());
            }
            RenderCommand::Stats(reply) => {
                let _ = reply.send(self.preview.stats());
            }
            RenderCommand::Export { request, reply } => {
                let _ = reply.send(self.export(&request));
            }
            RenderCommand::Shutdown => return false,
        }
        true
    }

    fn draw(&mut self) {
        self.dirty = false;
        match self.preview.draw() {
            Ok(DrawOutcome::Drawn) => debug!("preview frame drawn"),
            Ok(DrawOutcome::Skipped) => debug!("preview draw skipped, no image"),
            Err(e) => error!(error = %e, "preview draw failed, keeping previous frame"),
        }
    }

    fn export(&mut self, request: &ExportRequest) -> Result<Raster> {
        let backend = self
            .export
            .as_mut()
            .ok_or_else(|| FilmSimError::Gpu("no GPU export backend".into()))?;
        let texture = self.grain_cache.get(request.grain.style);
        let look = request.look(&texture);
        backend.export(&request.source, &look)
    }

    fn shutdown(&mut self) {
        self.preview.release();
        if let Some(export) = self.export.as_mut() {
            export.release();
        }
        info!("render thread stopped");
    }

    #[cfg(test)]
    pub(crate) fn stats(&self) -> UploadStats {
        self.preview.stats()
    }
}
