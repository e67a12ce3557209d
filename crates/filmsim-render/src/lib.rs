//! FilmSim Render - render thread, control surface and CPU fallback
//!
//! [`Renderer`] is the entry point: it owns a [`RenderThread`] that holds
//! the preview and export backends, and falls back to the CPU processor
//! whenever the GPU path is unavailable or fails.

pub mod catalog;
pub mod config;
pub mod grain_cache;
pub mod render_thread;
pub mod renderer;
pub mod surface;

pub use catalog::{load_catalog, CatalogEntry, CatalogItem};
pub use config::RenderConfig;
pub use grain_cache::GrainCache;
pub use render_thread::{ExportFactory, RenderCommand, RenderHandle, RenderThread};
pub use renderer::{export_cpu, ExportRequest, Renderer};
pub use surface::{CpuPreview, ExportBackend, PreviewSurface};
