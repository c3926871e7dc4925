use crate::config::{SessionConfig, POSITION_LERP, REFERENCE_FRAME, SCALE_LERP};
use glam::DVec2;
use std::time::Duration;

/// Where the camera is easing towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub position: DVec2,
    pub scale: f64,
}

/// The immutable view of a camera needed for coordinate mapping and uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    /// Offset added to every point position before scaling.
    pub position: DVec2,
    pub scale: f64,
}

/// Bounds every camera state is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraLimits {
    pub world_limit: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl CameraLimits {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            world_limit: config.world_limit.abs(),
            min_zoom: config.min_zoom.min(config.max_zoom),
            max_zoom: config.max_zoom.max(config.min_zoom),
        }
    }

    #[inline]
    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_zoom, self.max_zoom)
    }

    #[inline]
    fn clamp_position(&self, p: DVec2) -> DVec2 {
        p.clamp(DVec2::splat(-self.world_limit), DVec2::splat(self.world_limit))
    }
}

/// Pan/zoom camera for the 2-D song map.
///
/// The current state (`position`, `scale`) chases `target` on every [`tick`].
/// Dragging writes `position` directly and keeps `target` glued to it so that
/// releasing the drag does not snap back.
///
/// [`tick`]: Camera::tick
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: DVec2,
    pub scale: f64,
    pub target: CameraTarget,
    pub dragging: bool,
    /// Last pointer position seen during a drag, in logical pixels.
    pub last_pointer: DVec2,
    zoom_speed: f64,
    limits: CameraLimits,
}

impl Camera {
    /// Creates a camera centred on the world origin at the configured scale.
    pub fn new(config: &SessionConfig) -> Self {
        let limits = CameraLimits::from_config(config);
        let scale = limits.clamp_scale(config.initial_scale);
        Self {
            position: DVec2::ZERO,
            scale,
            target: CameraTarget {
                position: DVec2::ZERO,
                scale,
            },
            dragging: false,
            last_pointer: DVec2::ZERO,
            zoom_speed: config.zoom_speed,
            limits,
        }
    }

    pub fn limits(&self) -> CameraLimits {
        self.limits
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.position,
            scale: self.scale,
        }
    }

    /// Advances the current state towards the target by `dt`.
    ///
    /// The lerp factors are defined for one 60 Hz frame; other frame times
    /// get the equivalent exponential step so the easing speed does not
    /// depend on the display refresh rate.
    pub fn tick(&mut self, dt: Duration) {
        let frames = dt.as_secs_f64() / REFERENCE_FRAME.as_secs_f64();
        let frames = if frames.is_finite() && frames > 0.0 { frames } else { 1.0 };

        let scale_alpha = smoothing(SCALE_LERP, frames);
        self.scale += (self.target.scale - self.scale) * scale_alpha;

        if self.dragging {
            self.target.position = self.position;
        } else {
            let pos_alpha = smoothing(POSITION_LERP, frames);
            self.position += (self.target.position - self.position) * pos_alpha;
        }

        // Unconditional post-conditions: a burst of events between frames
        // must never leave the camera outside its bounds.
        self.scale = self.limits.clamp_scale(self.scale);
        self.target.scale = self.limits.clamp_scale(self.target.scale);
        self.position = self.limits.clamp_position(self.position);
        if self.dragging {
            self.target.position = self.position;
        }
    }

    /// Multiplies the target scale by `exp(-wheel_delta * zoom_speed)`.
    ///
    /// `wheel_delta` follows DOM `deltaY` conventions: positive zooms out.
    pub fn apply_zoom(&mut self, wheel_delta: f64) {
        if !wheel_delta.is_finite() {
            return;
        }
        let factor = (-wheel_delta * self.zoom_speed).exp();
        self.target.scale = self.limits.clamp_scale(self.target.scale * factor);
    }

    /// Starts easing so that world point `(x, y)` ends up in the centre.
    ///
    /// The shader adds the camera offset to each point, hence the negation.
    pub fn focus_on(&mut self, world: DVec2, focus_scale: f64) {
        self.target = CameraTarget {
            position: -world,
            scale: self.limits.clamp_scale(focus_scale),
        };
    }

    /// Moves the camera immediately, bypassing the target easing.
    pub fn pan_by(&mut self, delta_world: DVec2) {
        if !delta_world.is_finite() {
            return;
        }
        self.position = self.limits.clamp_position(self.position + delta_world);
        if self.dragging {
            self.target.position = self.position;
        }
    }

    /// Enters drag mode at `pointer` and cancels any running focus animation.
    pub fn begin_drag(&mut self, pointer: DVec2) {
        self.dragging = true;
        self.last_pointer = pointer;
        self.target.position = self.position;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }
}

/// Exponential step equivalent to applying `lerp` once per reference frame.
#[inline]
fn smoothing(lerp: f64, frames: f64) -> f64 {
    1.0 - (1.0 - lerp).powf(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn camera() -> Camera {
        Camera::new(&SessionConfig::default())
    }

    #[test]
    fn wheel_notch_scales_target_by_exp() {
        let mut cam = camera();
        cam.target.scale = 1.0;
        cam.apply_zoom(100.0);
        assert!((cam.target.scale - (-0.5f64).exp()).abs() < 1e-12);
        assert!((cam.target.scale - 0.6065).abs() < 1e-4);
    }

    #[test]
    fn focus_negates_world_position() {
        let mut cam = camera();
        cam.focus_on(DVec2::new(1.0, 1.0), 4.0);
        assert_eq!(cam.target.position, DVec2::new(-1.0, -1.0));
        assert_eq!(cam.target.scale, 4.0);
    }

    #[test]
    fn one_reference_frame_applies_literal_lerp() {
        let mut cam = camera();
        cam.scale = 1.0;
        cam.target.scale = 2.0;
        cam.target.position = DVec2::new(1.0, 0.0);
        cam.tick(REFERENCE_FRAME);
        assert!((cam.scale - 1.05).abs() < 1e-9);
        assert!((cam.position.x - 0.1).abs() < 1e-9);
    }

    #[test]
    fn two_half_frames_match_one_frame() {
        let mut a = camera();
        let mut b = camera();
        for cam in [&mut a, &mut b] {
            cam.target.scale = 3.0;
            cam.target.position = DVec2::new(-2.0, 1.0);
        }
        a.tick(REFERENCE_FRAME);
        b.tick(REFERENCE_FRAME / 2);
        b.tick(REFERENCE_FRAME / 2);
        assert!((a.scale - b.scale).abs() < 1e-6);
        assert!(a.position.distance(b.position) < 1e-6);
    }

    #[test]
    fn dragging_keeps_target_on_position() {
        let mut cam = camera();
        cam.target.position = DVec2::new(2.0, 2.0);
        cam.begin_drag(DVec2::new(10.0, 10.0));
        assert_eq!(cam.target.position, cam.position);
        cam.pan_by(DVec2::new(0.5, -0.25));
        cam.tick(REFERENCE_FRAME);
        assert_eq!(cam.position, DVec2::new(0.5, -0.25));
        assert_eq!(cam.target.position, cam.position);
        cam.end_drag();
        cam.tick(REFERENCE_FRAME);
        assert_eq!(cam.position, DVec2::new(0.5, -0.25));
    }

    #[test]
    fn focus_target_outside_world_is_clamped_each_tick() {
        let mut cam = camera();
        cam.focus_on(DVec2::new(50.0, -50.0), 4.0);
        for _ in 0..500 {
            cam.tick(REFERENCE_FRAME);
        }
        let limit = cam.limits().world_limit;
        assert!((cam.position.x + limit).abs() < 1e-9);
        assert!((cam.position.y - limit).abs() < 1e-9);
    }

    #[test]
    fn non_finite_wheel_delta_is_ignored() {
        let mut cam = camera();
        let before = cam.target.scale;
        cam.apply_zoom(f64::NAN);
        cam.apply_zoom(f64::INFINITY);
        assert_eq!(cam.target.scale, before);
    }

    proptest! {
        #[test]
        fn zoom_sequences_stay_in_bounds(deltas in prop::collection::vec(-5_000.0f64..5_000.0, 0..64)) {
            let mut cam = camera();
            for d in deltas {
                cam.apply_zoom(d);
                cam.tick(REFERENCE_FRAME);
                let l = cam.limits();
                prop_assert!(cam.target.scale >= l.min_zoom && cam.target.scale <= l.max_zoom);
                prop_assert!(cam.scale >= l.min_zoom && cam.scale <= l.max_zoom);
            }
        }

        #[test]
        fn drag_sequences_stay_in_world(
            deltas in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 0..64)
        ) {
            let mut cam = camera();
            cam.begin_drag(DVec2::ZERO);
            for (dx, dy) in deltas {
                cam.pan_by(DVec2::new(dx, dy));
                let l = cam.limits().world_limit;
                prop_assert!(cam.position.x.abs() <= l && cam.position.y.abs() <= l);
                cam.tick(REFERENCE_FRAME);
                prop_assert!(cam.position.x.abs() <= l && cam.position.y.abs() <= l);
            }
        }
    }
}
