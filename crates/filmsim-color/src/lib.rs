//! FilmSim Color - LUT formats, trilinear sampling, grain and the CPU processor

pub mod error;
pub mod formats;
pub mod grain;
pub mod lut;
pub mod processor;

pub use error::LutError;
pub use formats::{load_lut, write_cube, LutSource};
pub use grain::{GrainSettings, GrainStyle, GrainTexture};
pub use lut::{blend, LutGrid};
pub use processor::{apply_look, apply_lut, render_bounded, Look};
