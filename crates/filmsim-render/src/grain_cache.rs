//! Shared grain textures, generated once per style.

use filmsim_color::{GrainStyle, GrainTexture};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Grain textures keyed by style, shared by the render thread and the CPU
/// fallback. A custom texture, when set, is used for every style.
#[derive(Default)]
pub struct GrainCache {
    custom: Option<Arc<GrainTexture>>,
    generated: Mutex<HashMap<GrainStyle, Arc<GrainTexture>>>,
}

impl GrainCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `texture` regardless of style.
    pub fn with_texture(texture: GrainTexture) -> Self {
        Self {
            custom: Some(Arc::new(texture)),
            generated: Mutex::new(HashMap::new()),
        }
    }

    /// Texture for `style`, generating it on first use.
    pub fn get(&self, style: GrainStyle) -> Arc<GrainTexture> {
        if let Some(custom) = &self.custom {
            return Arc::clone(custom);
        }
        let mut generated = self.generated.lock();
        Arc::clone(
            generated
                .entry(style)
                .or_insert_with(|| Arc::new(GrainTexture::generate(style))),
        )
    }
}
