//! GPU-side data layouts for the point renderer.

use songscape::camera::CameraSnapshot;
use songscape::config::{BASE_POINT_SIZE, HOVER_GROWTH, HOVER_MATCH_EPSILON, HOVER_SENTINEL};

/// Per-frame uniform block.
/// Must match the layout of `Uniforms` in the point shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniforms {
    /// Camera position added to every point before scaling.
    pub offset: [f32; 2],
    /// Surface size in physical pixels.
    pub viewport: [f32; 2],
    /// World position of the hovered point, or the sentinel.
    pub hover_pos: [f32; 2],
    pub scale: f32,
    /// Surface width / height.
    pub aspect: f32,
    /// Dot diameter in physical pixels before hover growth.
    pub point_size: f32,
    pub hover_growth: f32,
    pub hover_epsilon: f32,
    pub _pad: f32,
}

const _: [(); 48] = [(); std::mem::size_of::<PointUniforms>()];

impl PointUniforms {
    pub fn new(
        camera: CameraSnapshot,
        surface: [u32; 2],
        pixels_per_point: f32,
        hover: Option<glam::DVec2>,
    ) -> Self {
        let [w, h] = surface;
        let scale = camera.scale as f32;
        Self {
            offset: camera.position.as_vec2().to_array(),
            viewport: [w.max(1) as f32, h.max(1) as f32],
            hover_pos: hover.map_or(HOVER_SENTINEL, |p| p.as_vec2().to_array()),
            scale,
            aspect: w.max(1) as f32 / h.max(1) as f32,
            point_size: (BASE_POINT_SIZE * scale).max(1.0) * pixels_per_point,
            hover_growth: HOVER_GROWTH,
            hover_epsilon: HOVER_MATCH_EPSILON,
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use songscape::config::MIN_ZOOM;

    fn snapshot(scale: f64) -> CameraSnapshot {
        CameraSnapshot {
            position: DVec2::new(0.5, -0.25),
            scale,
        }
    }

    #[test]
    fn dot_size_has_one_pixel_floor() {
        let u = PointUniforms::new(snapshot(MIN_ZOOM), [800, 600], 1.0, None);
        assert_eq!(u.point_size, 1.0);
        let u = PointUniforms::new(snapshot(2.0), [800, 600], 2.0, None);
        assert_eq!(u.point_size, 12.0);
    }

    #[test]
    fn no_hover_uses_sentinel() {
        let u = PointUniforms::new(snapshot(1.0), [800, 600], 1.0, None);
        assert_eq!(u.hover_pos, HOVER_SENTINEL);
        let u = PointUniforms::new(snapshot(1.0), [800, 600], 1.0, Some(DVec2::new(1.0, 2.0)));
        assert_eq!(u.hover_pos, [1.0, 2.0]);
        assert_eq!(u.offset, [0.5, -0.25]);
    }

    #[test]
    fn degenerate_surface_keeps_finite_aspect() {
        let u = PointUniforms::new(snapshot(1.0), [0, 0], 1.0, None);
        assert!(u.aspect.is_finite());
    }
}
