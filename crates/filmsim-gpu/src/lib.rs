//! FilmSim GPU - wgpu preview and export pipelines
//!
//! Both pipelines run the same film pass (3D LUT, intensity blend, grain)
//! and never expose raw wgpu handles outside this crate's types.

pub mod context;
pub mod export;
pub mod handles;
pub mod pass;
pub mod pending;
pub mod preview;
pub mod readback;
pub mod texture;
pub mod uniforms;

pub use context::GpuContext;
pub use export::ExportPipeline;
pub use handles::{TextureArena, TextureHandle};
pub use pending::{DrawOutcome, PendingSlot, UploadStats};
pub use preview::{PipelineState, PreviewPipeline};
pub use texture::GpuTexture;
pub use uniforms::FilmUniforms;
