//! Debounced, zoom-gated proximity querying.
//!
//! The orchestrator never performs I/O. The frame loop feeds it the zoom and
//! pointer position, polls it for due requests, hands those to a transport,
//! and later passes the responses back through [`ProximityOrchestrator::accept`].

use crate::candidate::{empty_set, Candidate, CandidateSet};
use glam::DVec2;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One "find candidates near (x, y)" request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRequest {
    /// Monotonically increasing; used to discard stale responses.
    pub seq: u64,
    pub x: f64,
    pub y: f64,
    pub k: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Completion of a [`QueryRequest`].
#[derive(Debug)]
pub struct QueryResponse {
    pub seq: u64,
    pub result: Result<Vec<Candidate>, QueryError>,
}

/// What happened to a response passed to [`ProximityOrchestrator::accept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// The candidate set was replaced.
    Replaced,
    /// A newer request was issued, the query was cancelled, or the zoom gate closed.
    Stale,
    /// The request failed; the previous set is kept.
    Failed,
}

/// Coarse quantization of the query inputs. Pointer jitter within one cell
/// (0.1 world units, 0.2 zoom) does not trigger a new query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryCell {
    pub zoom_step: i64,
    pub grid_x: i64,
    pub grid_y: i64,
}

impl QueryCell {
    pub fn quantize(zoom: f64, world: DVec2) -> Self {
        Self {
            zoom_step: (zoom * 5.0).round() as i64,
            grid_x: (world.x * 10.0).round() as i64,
            grid_y: (world.y * 10.0).round() as i64,
        }
    }
}

#[derive(Debug)]
pub struct ProximityOrchestrator {
    zoom_threshold: f64,
    debounce: Duration,
    k: u32,

    current_zoom: f64,
    pointer: DVec2,
    last_cell: Option<QueryCell>,
    deadline: Option<Instant>,
    next_seq: u64,
    awaiting: Option<u64>,
    candidates: CandidateSet,
}

impl ProximityOrchestrator {
    pub fn new(zoom_threshold: f64, debounce: Duration, k: u32) -> Self {
        Self {
            zoom_threshold,
            debounce,
            k,
            current_zoom: 0.0,
            pointer: DVec2::ZERO,
            last_cell: None,
            deadline: None,
            next_seq: 1,
            awaiting: None,
            candidates: empty_set(),
        }
    }

    /// The latest successfully received candidate set.
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn is_gated(&self) -> bool {
        !(self.current_zoom >= self.zoom_threshold)
    }

    /// Whether a debounce timer is running.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Feeds the current zoom and pointer world position.
    ///
    /// Returns `true` if the candidate set was cleared by the zoom gate.
    pub fn observe(&mut self, zoom: f64, pointer: DVec2, now: Instant) -> bool {
        self.current_zoom = zoom;
        if pointer.is_finite() {
            self.pointer = pointer;
        }

        if self.is_gated() {
            self.deadline = None;
            self.last_cell = None;
            self.awaiting = None;
            if !self.candidates.is_empty() {
                self.candidates = empty_set();
                return true;
            }
            return false;
        }

        let cell = QueryCell::quantize(zoom, self.pointer);
        if self.last_cell != Some(cell) {
            self.last_cell = Some(cell);
            self.deadline = Some(now + self.debounce);
        }
        false
    }

    /// Returns the request to issue if the debounce window has elapsed.
    ///
    /// The request uses the most recent pointer position, not the one that
    /// started the timer.
    pub fn poll(&mut self, now: Instant) -> Option<QueryRequest> {
        match self.deadline {
            Some(due) if due <= now && !self.is_gated() => {
                self.deadline = None;
                let seq = self.next_seq;
                self.next_seq += 1;
                self.awaiting = Some(seq);
                Some(QueryRequest {
                    seq,
                    x: self.pointer.x,
                    y: self.pointer.y,
                    k: self.k,
                })
            }
            _ => None,
        }
    }

    /// Applies a response if it belongs to the most recently issued request.
    pub fn accept(&mut self, response: QueryResponse) -> Accepted {
        if self.awaiting != Some(response.seq) || self.is_gated() {
            log::debug!(
                "Dropping stale proximity response seq={} (awaiting {:?})",
                response.seq,
                self.awaiting
            );
            return Accepted::Stale;
        }
        self.awaiting = None;

        match response.result {
            Ok(candidates) => {
                log::debug!(
                    "Proximity response seq={} with {} candidates",
                    response.seq,
                    candidates.len()
                );
                self.candidates = Arc::from(candidates);
                Accepted::Replaced
            }
            Err(err) => {
                log::warn!("Proximity query seq={} failed: {}", response.seq, err);
                Accepted::Failed
            }
        }
    }

    /// Cancels the debounce timer and invalidates in-flight requests.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.awaiting = None;
    }
}
