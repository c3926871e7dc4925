//! Pointer/wheel interaction state machine.
//!
//! ```text
//!            press                 move (pan camera)
//!   Idle ──────────────▶ Dragging ◀──────────┐
//!    ▲                      │  └─────────────┘
//!    └──────────────────────┘ release (click if travel < slop)
//! ```

use crate::camera::Camera;
use crate::coords::{drag_delta_to_world, screen_to_world, Viewport};
use crate::hover::HoverState;
use glam::DVec2;

/// Platform-neutral pointer input, positions in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Moved { position: DVec2 },
    Pressed { position: DVec2 },
    Released { position: DVec2 },
    /// DOM `deltaY` convention: positive scrolls down (zooms out).
    Wheel { delta_y: f64 },
    /// The pointer left the render surface.
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InteractionState {
    Idle,
    Dragging {
        /// Where the press happened.
        origin: DVec2,
        /// Largest distance from `origin` seen during this drag.
        travel: f64,
    },
}

/// Side effect of an input event the caller still has to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    None,
    /// The pointer moved while idle; resolve the hover at `world`.
    Hover { pointer: DVec2, world: DVec2 },
    /// The camera was panned by a drag.
    Panned,
    /// The wheel changed the zoom target.
    Zoomed,
    /// A click landed on a hovered candidate; the camera is already focusing it.
    Selected(HoverState),
    /// A click landed on empty space.
    ClickedEmpty,
    /// The pointer left the surface.
    Left,
}

/// Borrowed state an input event may act on.
pub struct InputContext<'a> {
    pub camera: &'a mut Camera,
    pub viewport: Viewport,
    /// The hover computed by the last resolution pass.
    pub hover: Option<&'a HoverState>,
    pub focus_scale: f64,
}

#[derive(Debug)]
pub struct InputController {
    state: InteractionState,
    click_slop_px: f64,
}

impl InputController {
    pub fn new(click_slop_px: f64) -> Self {
        Self {
            state: InteractionState::Idle,
            click_slop_px,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    pub fn handle(&mut self, input: PointerInput, cx: InputContext<'_>) -> InputOutcome {
        match (self.state, input) {
            (InteractionState::Idle, PointerInput::Moved { position }) => {
                let world = screen_to_world(position, cx.viewport, &cx.camera.snapshot());
                InputOutcome::Hover {
                    pointer: position,
                    world,
                }
            }

            (InteractionState::Idle, PointerInput::Pressed { position }) => {
                cx.camera.begin_drag(position);
                self.state = InteractionState::Dragging {
                    origin: position,
                    travel: 0.0,
                };
                InputOutcome::None
            }

            (InteractionState::Dragging { origin, travel }, PointerInput::Moved { position }) => {
                let delta_px = position - cx.camera.last_pointer;
                let delta = drag_delta_to_world(delta_px, cx.viewport, cx.camera.scale);
                cx.camera.pan_by(delta);
                cx.camera.last_pointer = position;
                self.state = InteractionState::Dragging {
                    origin,
                    travel: travel.max(origin.distance(position)),
                };
                InputOutcome::Panned
            }

            (InteractionState::Dragging { origin, travel }, PointerInput::Released { position }) => {
                cx.camera.end_drag();
                self.state = InteractionState::Idle;
                let travel = travel.max(origin.distance(position));
                if travel >= self.click_slop_px {
                    return InputOutcome::None;
                }
                match cx.hover {
                    Some(hover) => {
                        cx.camera.focus_on(hover.world, cx.focus_scale);
                        InputOutcome::Selected(hover.clone())
                    }
                    None => InputOutcome::ClickedEmpty,
                }
            }

            // A release without a matching press (pressed outside the surface).
            (InteractionState::Idle, PointerInput::Released { .. }) => InputOutcome::None,

            (InteractionState::Dragging { .. }, PointerInput::Pressed { position }) => {
                // Second button while dragging: restart the gesture from here.
                cx.camera.begin_drag(position);
                self.state = InteractionState::Dragging {
                    origin: position,
                    travel: 0.0,
                };
                InputOutcome::None
            }

            (_, PointerInput::Wheel { delta_y }) => {
                cx.camera.apply_zoom(delta_y);
                InputOutcome::Zoomed
            }

            // Dragging continues off-surface until the button is released.
            (InteractionState::Dragging { .. }, PointerInput::Left) => InputOutcome::None,
            (InteractionState::Idle, PointerInput::Left) => InputOutcome::Left,
        }
    }
}
