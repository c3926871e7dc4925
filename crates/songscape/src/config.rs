//! Engine constants and the tunable per-session configuration.

use std::time::Duration;

/// World-to-NDC multiplier applied after the camera scale.
///
/// Must stay numerically identical to `BASE_SCALE` in the point shader,
/// otherwise hit-testing and rendering disagree about where points are.
pub const BASE_SCALE: f64 = 10.0;

/// Per-reference-frame smoothing factor for zoom.
pub const SCALE_LERP: f64 = 0.05;
/// Per-reference-frame smoothing factor for the focus animation.
pub const POSITION_LERP: f64 = 0.1;
/// Duration of the frame the lerp factors above are defined for.
pub const REFERENCE_FRAME: Duration = Duration::from_micros(16_667);

/// Wheel sensitivity: `target.scale *= exp(-delta_y * ZOOM_SPEED)`.
pub const ZOOM_SPEED: f64 = 0.005;
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 50.0;
pub const INITIAL_SCALE: f64 = 0.5;

/// Zoom applied when a song is clicked.
pub const FOCUS_SCALE: f64 = 4.0;

/// Hover radius in world units at scale 1.0.
pub const BASE_THRESHOLD: f64 = 0.005;

/// Below this zoom nothing is hoverable and no proximity queries are issued.
pub const ZOOM_THRESHOLD: f64 = 1.85;
pub const QUERY_DEBOUNCE: Duration = Duration::from_millis(150);
pub const QUERY_K: u32 = 800;

/// Max pointer travel (logical px) between press and release for a click.
pub const CLICK_SLOP_PX: f64 = 4.0;

/// Dot size in pixels at scale 1.0 before the `max(1, ..)` floor.
pub const BASE_POINT_SIZE: f32 = 3.0;
/// Size multiplier for the hovered dot.
pub const HOVER_GROWTH: f32 = 6.0;
/// Distance under which a point is treated as the hovered one in the shader.
pub const HOVER_MATCH_EPSILON: f32 = 0.0001;
/// Hover uniform used when nothing is hovered; far outside any tier's world.
pub const HOVER_SENTINEL: [f32; 2] = [-999.0, -999.0];

/// Tunables for one navigation session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub world_limit: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub initial_scale: f64,
    pub zoom_speed: f64,
    pub focus_scale: f64,
    pub base_threshold: f64,
    pub zoom_threshold: f64,
    pub query_debounce: Duration,
    pub query_k: u32,
    pub click_slop_px: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world_limit: crate::points::DEFAULT_WORLD_LIMIT,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            initial_scale: INITIAL_SCALE,
            zoom_speed: ZOOM_SPEED,
            focus_scale: FOCUS_SCALE,
            base_threshold: BASE_THRESHOLD,
            zoom_threshold: ZOOM_THRESHOLD,
            query_debounce: QUERY_DEBOUNCE,
            query_k: QUERY_K,
            click_slop_px: CLICK_SLOP_PX,
        }
    }
}

impl SessionConfig {
    /// Default configuration with the world bounds of `tier`.
    pub fn for_tier(tier: crate::points::DensityTier) -> Self {
        Self {
            world_limit: tier.world_limit(),
            ..Self::default()
        }
    }
}
