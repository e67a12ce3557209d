//! Viewport geometry: pan/zoom and aspect-ratio correction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest zoom factor accepted by the preview.
pub const MIN_ZOOM: f32 = 0.05;
/// Largest zoom factor accepted by the preview.
pub const MAX_ZOOM: f32 = 64.0;

/// User pan/zoom applied to the preview quad.
///
/// `pan` is expressed in normalized device coordinates (the viewport spans
/// -1..1 on both axes), applied after zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan: Vec2,
}

impl ViewTransform {
    /// The neutral transform: no zoom, no pan.
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan: Vec2::ZERO,
    };

    /// Create a transform, clamping zoom into the supported range.
    pub fn new(zoom: f32, pan: Vec2) -> Self {
        let zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            1.0
        };
        let pan = if pan.is_finite() { pan } else { Vec2::ZERO };
        Self { zoom, pan }
    }

    /// Whether this is the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Scale applied to a full-screen quad so an image of `image` size is shown
/// undistorted inside a viewport of `viewport` size.
///
/// The axis on which the viewport is relatively wider is shrunk, which
/// letterboxes (or pillarboxes) the image. Degenerate sizes yield `(1, 1)`.
pub fn aspect_scale(image: (u32, u32), viewport: (u32, u32)) -> Vec2 {
    let (iw, ih) = image;
    let (vw, vh) = viewport;
    if iw == 0 || ih == 0 || vw == 0 || vh == 0 {
        return Vec2::ONE;
    }

    let image_aspect = iw as f32 / ih as f32;
    let view_aspect = vw as f32 / vh as f32;

    if view_aspect > image_aspect {
        // Viewport is wider: pillarbox.
        Vec2::new(image_aspect / view_aspect, 1.0)
    } else {
        // Viewport is taller: letterbox.
        Vec2::new(1.0, view_aspect / image_aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_aspect_is_unit() {
        let s = aspect_scale((1920, 1080), (960, 540));
        assert!((s.x - 1.0).abs() < 1e-6);
        assert!((s.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wide_viewport_pillarboxes() {
        // Square image in a 2:1 viewport occupies half the width.
        let s = aspect_scale((1000, 1000), (2000, 1000));
        assert!((s.x - 0.5).abs() < 1e-6);
        assert!((s.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tall_viewport_letterboxes() {
        // 4:3 image in a square viewport.
        let s = aspect_scale((4000, 3000), (500, 500));
        assert!((s.x - 1.0).abs() < 1e-6);
        assert!((s.y - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert_eq!(aspect_scale((0, 10), (10, 10)), Vec2::ONE);
        assert_eq!(aspect_scale((10, 10), (10, 0)), Vec2::ONE);
    }

    #[test]
    fn test_view_transform_clamps() {
        let t = ViewTransform::new(1000.0, Vec2::new(0.25, -0.5));
        assert_eq!(t.zoom, MAX_ZOOM);
        let t = ViewTransform::new(f32::NAN, Vec2::new(f32::INFINITY, 0.0));
        assert!(t.is_identity());
    }
}
