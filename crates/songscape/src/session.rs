//! One navigation session: the single owner of camera, interaction, hover and
//! query state. The frame loop and the input handlers take it by `&mut`, so
//! no locking is involved.

use crate::camera::Camera;
use crate::candidate::{Candidate, CandidateSet};
use crate::config::SessionConfig;
use crate::coords::{screen_to_world, world_to_screen, Viewport};
use crate::events::{ViewEvent, ViewportReadout};
use crate::hover::{HoverChange, HoverResolver, HoverState};
use crate::input::{InputContext, InputController, InputOutcome, PointerInput};
use crate::proximity::{Accepted, ProximityOrchestrator, QueryRequest, QueryResponse};
use glam::DVec2;
use std::time::{Duration, Instant};

/// Zoom change that is worth republishing to the HUD.
const ZOOM_PUBLISH_EPSILON: f64 = 0.01;

pub struct MapSession {
    config: SessionConfig,
    camera: Camera,
    input: InputController,
    hover: HoverResolver,
    proximity: ProximityOrchestrator,
    viewport: Viewport,

    /// Last pointer position over the surface, logical px.
    pointer_px: Option<DVec2>,
    pointer_world: DVec2,
    selected: Option<Candidate>,
    published: Option<ViewportReadout>,
    events: Vec<ViewEvent>,
    torn_down: bool,
}

impl MapSession {
    pub fn new(config: SessionConfig, viewport: Viewport) -> Self {
        Self {
            camera: Camera::new(&config),
            input: InputController::new(config.click_slop_px),
            hover: HoverResolver::new(config.base_threshold),
            proximity: ProximityOrchestrator::new(
                config.zoom_threshold,
                config.query_debounce,
                config.query_k,
            ),
            config,
            viewport,
            pointer_px: None,
            pointer_world: DVec2::ZERO,
            selected: None,
            published: None,
            events: Vec::new(),
            torn_down: false,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    pub fn pointer_px(&self) -> Option<DVec2> {
        self.pointer_px
    }

    pub fn candidates(&self) -> &CandidateSet {
        self.proximity.candidates()
    }

    pub fn hover(&self) -> Option<&HoverState> {
        self.hover.current()
    }

    pub fn hovered_candidate(&self) -> Option<&Candidate> {
        let h = self.hover.current()?;
        self.proximity
            .candidates()
            .get(h.index)
            .filter(|c| c.id == h.id)
    }

    /// World position to highlight in the shader, if anything is hovered.
    pub fn hover_position(&self) -> Option<DVec2> {
        self.hover.current().map(|h| h.world)
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.events.push(ViewEvent::SelectionChanged(None));
        }
    }

    pub fn readout(&self) -> ViewportReadout {
        ViewportReadout::new(self.pointer_world.x, self.pointer_world.y, self.camera.scale)
    }

    /// Routes one pointer event through the interaction state machine.
    pub fn handle_input(&mut self, input: PointerInput) {
        if self.torn_down {
            return;
        }
        if let PointerInput::Moved { position } = input {
            self.pointer_px = Some(position);
        }

        let outcome = self.input.handle(
            input,
            InputContext {
                camera: &mut self.camera,
                viewport: self.viewport,
                hover: self.hover.current(),
                focus_scale: self.config.focus_scale,
            },
        );

        match outcome {
            InputOutcome::Hover { world, .. } => {
                self.pointer_world = world;
                self.resolve_hover();
                self.publish_readout();
            }
            InputOutcome::Selected(hover) => {
                let candidate = self
                    .proximity
                    .candidates()
                    .get(hover.index)
                    .filter(|c| c.id == hover.id)
                    .cloned();
                if let Some(candidate) = candidate {
                    log::info!("Selected song {} ({})", candidate.id, candidate.data.name);
                    self.selected = Some(candidate.clone());
                    self.events.push(ViewEvent::SelectionChanged(Some(candidate)));
                }
            }
            InputOutcome::Left => {
                self.pointer_px = None;
                self.drop_hover();
            }
            InputOutcome::None
            | InputOutcome::Panned
            | InputOutcome::Zoomed
            | InputOutcome::ClickedEmpty => {}
        }
    }

    /// Advances one animation frame.
    ///
    /// Returns a proximity request when the debounce window has elapsed; the
    /// caller sends it to the query service and later passes the response to
    /// [`accept_query`](Self::accept_query).
    pub fn frame(&mut self, now: Instant, dt: Duration) -> Option<QueryRequest> {
        if self.torn_down {
            return None;
        }
        self.camera.tick(dt);

        // The camera may still be easing under a stationary pointer.
        if let (Some(px), false) = (self.pointer_px, self.input.is_dragging()) {
            self.pointer_world = screen_to_world(px, self.viewport, &self.camera.snapshot());
        }

        if self
            .proximity
            .observe(self.camera.scale, self.pointer_world, now)
        {
            log::debug!("Zoom {:.2} below gate, candidates cleared", self.camera.scale);
            // Nothing is hoverable below the gate, dragging or not.
            self.drop_hover();
        }
        self.resolve_hover();
        self.publish_readout();

        self.proximity.poll(now)
    }

    /// Merges a proximity response; stale responses are ignored.
    pub fn accept_query(&mut self, response: QueryResponse) -> Accepted {
        let accepted = self.proximity.accept(response);
        if accepted == Accepted::Replaced {
            if self.input.is_dragging() {
                // No re-resolution mid-drag, but the old index must not outlive its set.
                if self.hovered_candidate().is_none() {
                    self.drop_hover();
                }
            } else {
                self.resolve_hover();
            }
        }
        accepted
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, ViewEvent> {
        self.events.drain(..)
    }

    /// Stops all activity: pending debounce, in-flight responses, input.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.proximity.cancel();
        self.camera.end_drag();
        self.torn_down = true;
        log::debug!("Map session torn down");
    }

    fn resolve_hover(&mut self) {
        if self.input.is_dragging() {
            return;
        }
        let change = if self.pointer_px.is_some() {
            let snapshot = self.camera.snapshot();
            let viewport = self.viewport;
            self.hover.resolve(
                self.pointer_world,
                snapshot.scale,
                self.proximity.candidates(),
                |w| world_to_screen(w, viewport, &snapshot),
            )
        } else {
            self.hover.clear()
        };

        if let HoverChange::Changed(state) = change {
            let candidate = state.and_then(|h| self.proximity.candidates().get(h.index).cloned());
            self.events.push(ViewEvent::HoverChanged(candidate));
        }
    }

    fn drop_hover(&mut self) {
        if let HoverChange::Changed(_) = self.hover.clear() {
            self.events.push(ViewEvent::HoverChanged(None));
        }
    }

    fn publish_readout(&mut self) {
        let readout = self.readout();
        let changed = match self.published {
            None => true,
            Some(prev) => {
                prev.world_x != readout.world_x
                    || prev.world_y != readout.world_y
                    || (prev.zoom - readout.zoom).abs() > ZOOM_PUBLISH_EPSILON
            }
        };
        if changed {
            self.published = Some(readout);
            self.events.push(ViewEvent::ViewportChanged(readout));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::SongAttributes;
    use crate::config::REFERENCE_FRAME;

    fn song(id: u64, x: f64, y: f64) -> Candidate {
        Candidate {
            id: id.into(),
            x,
            y,
            data: SongAttributes {
                name: format!("song {id}"),
                cover_url: Some(format!("https://covers/{id}.jpg")),
                ..SongAttributes::default()
            },
        }
    }

    /// Session zoomed past the gate, pointer at the screen centre.
    fn zoomed_session(t0: Instant) -> MapSession {
        let mut s = MapSession::new(SessionConfig::default(), Viewport::new(800.0, 600.0));
        s.camera.scale = 2.0;
        s.camera.target.scale = 2.0;
        s.handle_input(PointerInput::Moved {
            position: DVec2::new(400.0, 300.0),
        });
        s.frame(t0, REFERENCE_FRAME);
        s.drain_events().for_each(drop);
        s
    }

    /// Drives frames until a request is due and answers it.
    fn answer(s: &mut MapSession, t: Instant, songs: Vec<Candidate>) -> Accepted {
        let req = s
            .frame(t + Duration::from_millis(200), REFERENCE_FRAME)
            .expect("query due");
        s.accept_query(QueryResponse {
            seq: req.seq,
            result: Ok(songs),
        })
    }

    #[test]
    fn query_response_makes_point_hoverable() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        assert_eq!(answer(&mut s, t0, vec![song(1, 0.0, 0.0), song(2, 1.0, 1.0)]), Accepted::Replaced);
        assert_eq!(s.hovered_candidate().map(|c| c.id.clone()), Some(1u64.into()));
        let events: Vec<_> = s.drain_events().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, ViewEvent::HoverChanged(Some(c)) if c.id == 1u64.into())));
    }

    #[test]
    fn click_selects_and_focuses() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        answer(&mut s, t0, vec![song(1, 0.0, 0.0)]);
        s.drain_events().for_each(drop);

        let p = DVec2::new(400.0, 300.0);
        s.handle_input(PointerInput::Pressed { position: p });
        s.handle_input(PointerInput::Released { position: p });
        assert_eq!(s.selected().map(|c| c.id.clone()), Some(1u64.into()));
        assert_eq!(s.camera().target.scale, 4.0);
        let events: Vec<_> = s.drain_events().collect();
        assert!(matches!(events.as_slice(), [ViewEvent::SelectionChanged(Some(_))]));

        s.clear_selection();
        assert!(matches!(
            s.drain_events().next(),
            Some(ViewEvent::SelectionChanged(None))
        ));
    }

    #[test]
    fn zooming_out_clears_hover() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        answer(&mut s, t0, vec![song(1, 0.0, 0.0)]);
        assert!(s.hover().is_some());
        s.drain_events().for_each(drop);

        s.camera.scale = 1.0;
        s.camera.target.scale = 1.0;
        s.frame(t0 + Duration::from_millis(400), REFERENCE_FRAME);
        assert!(s.candidates().is_empty());
        assert!(s.hover().is_none());
        assert!(s
            .drain_events()
            .any(|e| matches!(e, ViewEvent::HoverChanged(None))));
    }

    #[test]
    fn leaving_surface_hides_hover() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        answer(&mut s, t0, vec![song(1, 0.0, 0.0)]);
        s.handle_input(PointerInput::Left);
        assert!(s.hover().is_none());
        assert!(s.pointer_px().is_none());
    }

    #[test]
    fn readout_is_rounded_and_published_on_change() {
        let mut s = MapSession::new(SessionConfig::default(), Viewport::new(800.0, 600.0));
        s.handle_input(PointerInput::Moved {
            position: DVec2::new(401.0, 300.0),
        });
        let events: Vec<_> = s.drain_events().collect();
        let readout = events
            .iter()
            .find_map(|e| match e {
                ViewEvent::ViewportChanged(r) => Some(*r),
                _ => None,
            })
            .expect("readout published");
        assert_eq!(readout.world_x, (readout.world_x * 1000.0).round() / 1000.0);
        assert_eq!(readout.zoom, s.camera().scale);

        // Same pixel again: nothing new to publish.
        s.handle_input(PointerInput::Moved {
            position: DVec2::new(401.0, 300.0),
        });
        assert_eq!(s.drain_events().count(), 0);
    }

    #[test]
    fn zoom_gate_drops_hover_mid_drag() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        answer(&mut s, t0, vec![song(1, 0.0, 0.0)]);
        assert!(s.hover().is_some());
        s.handle_input(PointerInput::Pressed {
            position: DVec2::new(400.0, 300.0),
        });
        assert!(s.is_dragging());
        s.drain_events().for_each(drop);

        s.camera.scale = 0.5;
        s.camera.target.scale = 0.5;
        s.frame(t0 + Duration::from_millis(400), REFERENCE_FRAME);
        assert!(s.candidates().is_empty());
        assert!(s.hover().is_none());
        assert!(s.hover_position().is_none());
        assert!(s
            .drain_events()
            .any(|e| matches!(e, ViewEvent::HoverChanged(None))));
    }

    #[test]
    fn replaced_set_mid_drag_drops_stale_hover() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        answer(&mut s, t0, vec![song(1, 0.0, 0.0)]);
        s.handle_input(PointerInput::Pressed {
            position: DVec2::new(400.0, 300.0),
        });
        s.drain_events().for_each(drop);

        // A query for another cell completes while the drag is still going.
        let t1 = t0 + Duration::from_millis(400);
        s.proximity.observe(2.0, DVec2::new(1.0, 1.0), t1);
        let req = s.proximity.poll(t1 + Duration::from_millis(200)).expect("query due");
        let accepted = s.accept_query(QueryResponse {
            seq: req.seq,
            result: Ok(vec![song(2, 0.0, 0.0)]),
        });
        assert_eq!(accepted, Accepted::Replaced);
        assert!(s.hover().is_none());
        assert!(s.hovered_candidate().is_none());
        assert!(s
            .drain_events()
            .any(|e| matches!(e, ViewEvent::HoverChanged(None))));
    }

    #[test]
    fn teardown_stops_queries() {
        let t0 = Instant::now();
        let mut s = zoomed_session(t0);
        s.teardown();
        assert!(s.frame(t0 + Duration::from_secs(1), REFERENCE_FRAME).is_none());
    }
}
