//! Conversions between screen pixels, normalized device coordinates and world
//! space. Mirrors the transform in the point shader:
//!
//! ```text
//! ndc = (world + camera.position) * (scale * BASE_SCALE), ndc.x /= aspect
//! ```

use crate::camera::CameraSnapshot;
use crate::config::BASE_SCALE;
use glam::DVec2;

/// Size of the render surface in the same pixel units as pointer positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns the viewport with degenerate extents replaced by 1 px.
    #[inline]
    fn sanitized(self) -> Self {
        let fix = |v: f64| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        Self {
            width: fix(self.width),
            height: fix(self.height),
        }
    }

    #[inline]
    pub fn size(self) -> DVec2 {
        let v = self.sanitized();
        DVec2::new(v.width, v.height)
    }

    #[inline]
    pub fn aspect(self) -> f64 {
        let v = self.sanitized();
        v.width / v.height
    }
}

/// Pixel position (origin top-left, y down) to NDC (y up, [-1, 1]).
#[inline]
pub fn screen_to_ndc(px: DVec2, viewport: Viewport) -> DVec2 {
    let size = viewport.size();
    DVec2::new(px.x / size.x * 2.0 - 1.0, -(px.y / size.y * 2.0 - 1.0))
}

#[inline]
pub fn ndc_to_screen(ndc: DVec2, viewport: Viewport) -> DVec2 {
    let size = viewport.size();
    DVec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y)
}

/// Inverts the render transform for a pointer position.
pub fn screen_to_world(px: DVec2, viewport: Viewport, camera: &CameraSnapshot) -> DVec2 {
    let ndc = screen_to_ndc(px, viewport);
    let zoom = camera.scale * BASE_SCALE;
    DVec2::new(
        ndc.x * viewport.aspect() / zoom - camera.position.x,
        ndc.y / zoom - camera.position.y,
    )
}

/// Projects a world point to pixels; used to anchor overlays next to points.
pub fn world_to_screen(world: DVec2, viewport: Viewport, camera: &CameraSnapshot) -> DVec2 {
    let zoom = camera.scale * BASE_SCALE;
    let ndc = DVec2::new(
        (world.x + camera.position.x) * zoom / viewport.aspect(),
        (world.y + camera.position.y) * zoom,
    );
    ndc_to_screen(ndc, viewport)
}

/// World-space delta for a drag of `delta_px` pixels.
///
/// Pan speed is one world unit per viewport extent at scale 1.0, with the
/// y axis flipped because pixel rows grow downward.
pub fn drag_delta_to_world(delta_px: DVec2, viewport: Viewport, scale: f64) -> DVec2 {
    let size = viewport.size();
    DVec2::new(delta_px.x / (size.x * scale), -delta_px.y / (size.y * scale))
}
