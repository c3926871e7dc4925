use crate::candidate::Candidate;

/// HUD readout of the pointer position and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportReadout {
    /// Pointer world x, rounded to three decimals.
    pub world_x: f64,
    /// Pointer world y, rounded to three decimals.
    pub world_y: f64,
    pub zoom: f64,
}

impl ViewportReadout {
    pub fn new(world_x: f64, world_y: f64, zoom: f64) -> Self {
        Self {
            world_x: round3(world_x),
            world_y: round3(world_y),
            zoom,
        }
    }
}

/// Notifications for the surrounding UI, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    SelectionChanged(Option<Candidate>),
    HoverChanged(Option<Candidate>),
    ViewportChanged(ViewportReadout),
}

#[inline]
fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
