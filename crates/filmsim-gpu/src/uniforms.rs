//! Uniform block shared by preview and export (`FilmUniforms` in film.wgsl).

use filmsim_color::GrainSettings;
use filmsim_core::ViewTransform;
use glam::Vec2;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FilmUniforms {
    pub intensity: f32,
    pub grain_intensity: f32,
    pub grain_scale: f32,
    pub lut_size: f32,
    pub aspect_scale: [f32; 2],
    pub pan: [f32; 2],
    pub grain_size: [f32; 2],
    pub zoom: f32,
    pub _padding: f32,
}

impl FilmUniforms {
    /// Uniforms for a look. `lut_size` is `None` when no LUT is bound, which
    /// forces the LUT contribution to zero.
    pub fn new(
        lut_size: Option<u32>,
        intensity: f32,
        grain: &GrainSettings,
        grain_size: (u32, u32),
    ) -> Self {
        let intensity = match lut_size {
            Some(_) if intensity.is_finite() => intensity.clamp(0.0, 1.0),
            _ => 0.0,
        };
        Self {
            intensity,
            grain_intensity: grain.effective_intensity(),
            grain_scale: grain.effective_scale(),
            lut_size: lut_size.unwrap_or(2) as f32,
            aspect_scale: [1.0, 1.0],
            pan: [0.0, 0.0],
            grain_size: [grain_size.0 as f32, grain_size.1 as f32],
            zoom: 1.0,
            _padding: 0.0,
        }
    }

    /// Apply viewport placement: aspect correction then user pan/zoom.
    pub fn with_view(mut self, aspect: Vec2, view: &ViewTransform) -> Self {
        self.aspect_scale = aspect.to_array();
        self.zoom = view.zoom;
        self.pan = view.pan.to_array();
        self
    }
}
