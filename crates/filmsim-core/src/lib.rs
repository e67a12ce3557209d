//! FilmSim Core - Foundation types for the film simulation pipeline
//!
//! This crate provides the fundamental types shared by every stage:
//! - Error taxonomy (`FilmSimError`)
//! - RGBA8 rasters exchanged between CPU and GPU paths
//! - Viewport geometry (pan/zoom, aspect correction)

pub mod error;
pub mod geometry;
pub mod raster;

pub use error::{FilmSimError, Result};
pub use geometry::{aspect_scale, ViewTransform};
pub use raster::{Raster, SharedRaster, BYTES_PER_PIXEL};

/// Memory budget constants
pub mod memory_budget {
    /// Default ceiling for a single CPU export raster (RGBA8).
    pub const CPU_EXPORT_BUDGET: usize = 1024 * 1024 * 1024; // 1 GB

    /// Default GPU texture memory available to one export.
    pub const GPU_EXPORT_BUDGET: usize = 768 * 1024 * 1024; // 768 MB

    /// Longest edge of bounded-resolution (thumbnail) renders.
    pub const THUMBNAIL_MAX_DIM: u32 = 512;

    /// Estimated bytes the GPU export needs for a source of the given size:
    /// input texture, render target, and readback buffer.
    pub fn gpu_export_bytes(width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        pixels * 4 * 3
    }
}
