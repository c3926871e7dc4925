use crate::candidate::{Candidate, CandidateId};
use glam::DVec2;

/// The currently hovered candidate.
///
/// Holds the id as a lookup key into the live candidate set rather than the
/// candidate itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverState {
    pub id: CandidateId,
    /// Index into the candidate set the hover was resolved against.
    pub index: usize,
    pub world: DVec2,
    /// Pixel position of the hovered point, for anchoring overlays.
    pub screen: DVec2,
}

/// Result of one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverChange {
    Unchanged,
    /// The hovered identity changed; `None` means nothing is hovered anymore.
    Changed(Option<HoverState>),
}

/// Hit radius that stays visually constant as the zoom changes.
#[inline]
pub fn hover_threshold(base_threshold: f64, scale: f64) -> f64 {
    base_threshold / scale
}

/// Finds the nearest candidate strictly closer than `threshold`.
///
/// Ties keep the earlier candidate in iteration order.
pub fn nearest_within(
    pointer: DVec2,
    threshold: f64,
    candidates: &[Candidate],
) -> Option<(usize, f64)> {
    if !pointer.is_finite() || !(threshold > 0.0) {
        return None;
    }
    let limit_sq = threshold * threshold;
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, pointer.distance_squared(c.world())))
        .filter(|&(_, d2)| d2 < limit_sq)
        .fold(None, |best: Option<(usize, f64)>, (i, d2)| match best {
            Some((_, best_d2)) if best_d2 <= d2 => best,
            _ => Some((i, d2)),
        })
        .map(|(i, d2)| (i, d2.sqrt()))
}

/// Tracks which candidate is under the pointer and reports identity changes.
#[derive(Debug, Default)]
pub struct HoverResolver {
    current: Option<HoverState>,
    base_threshold: f64,
}

impl HoverResolver {
    pub fn new(base_threshold: f64) -> Self {
        Self {
            current: None,
            base_threshold,
        }
    }

    pub fn current(&self) -> Option<&HoverState> {
        self.current.as_ref()
    }

    /// Resolves the hover for `pointer` (world units) at zoom `scale`.
    ///
    /// `to_screen` projects the hit to pixels. The stored state is always
    /// refreshed; only identity changes are reported.
    pub fn resolve(
        &mut self,
        pointer: DVec2,
        scale: f64,
        candidates: &[Candidate],
        to_screen: impl Fn(DVec2) -> DVec2,
    ) -> HoverChange {
        let threshold = hover_threshold(self.base_threshold, scale);
        let next = nearest_within(pointer, threshold, candidates).map(|(index, _)| {
            let c = &candidates[index];
            HoverState {
                id: c.id.clone(),
                index,
                world: c.world(),
                screen: to_screen(c.world()),
            }
        });
        self.replace(next)
    }

    /// Drops the hover, e.g. when the pointer leaves the surface.
    pub fn clear(&mut self) -> HoverChange {
        self.replace(None)
    }

    fn replace(&mut self, next: Option<HoverState>) -> HoverChange {
        let same = match (&self.current, &next) {
            (Some(a), Some(b)) => a.id == b.id,
            (None, None) => true,
            _ => false,
        };
        self.current = next;
        if same {
            HoverChange::Unchanged
        } else {
            HoverChange::Changed(self.current.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::SongAttributes;
    use proptest::prelude::*;

    fn cand(id: u64, x: f64, y: f64) -> Candidate {
        Candidate {
            id: id.into(),
            x,
            y,
            data: SongAttributes::default(),
        }
    }

    fn resolve(r: &mut HoverResolver, p: DVec2, scale: f64, set: &[Candidate]) -> HoverChange {
        r.resolve(p, scale, set, |w| w)
    }

    #[test]
    fn threshold_shrinks_with_zoom() {
        assert!((hover_threshold(0.005, 2.0) - 0.0025).abs() < 1e-15);
        assert!((hover_threshold(0.005, 0.2) - 0.025).abs() < 1e-15);
    }

    #[test]
    fn resolves_close_candidate_at_high_zoom() {
        let set = vec![cand(1, 0.1, 0.1)];
        let mut r = HoverResolver::new(0.005);
        let change = resolve(&mut r, DVec2::new(0.1004, 0.1003), 2.0, &set);
        match change {
            HoverChange::Changed(Some(h)) => assert_eq!(h.id, CandidateId::from(1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resolves_close_candidate_at_low_zoom() {
        let set = vec![cand(1, 0.1, 0.1)];
        let mut r = HoverResolver::new(0.005);
        resolve(&mut r, DVec2::new(0.1004, 0.1003), 0.2, &set);
        assert_eq!(r.current().map(|h| h.id.clone()), Some(CandidateId::from(1)));
    }

    #[test]
    fn prefers_nearest_over_last_match() {
        let set = vec![cand(1, 0.0, 0.0), cand(2, 0.001, 0.0), cand(3, 0.003, 0.0)];
        let hit = nearest_within(DVec2::new(0.0012, 0.0), 0.005, &set);
        assert_eq!(hit.map(|(i, _)| i), Some(1));
    }

    #[test]
    fn tie_keeps_first() {
        let set = vec![cand(1, -0.001, 0.0), cand(2, 0.001, 0.0)];
        assert_eq!(nearest_within(DVec2::ZERO, 0.005, &set).map(|(i, _)| i), Some(0));
    }

    #[test]
    fn distance_equal_to_threshold_is_excluded() {
        let set = vec![cand(1, 0.5, 0.0)];
        assert!(nearest_within(DVec2::ZERO, 0.5, &set).is_none());
        assert!(nearest_within(DVec2::ZERO, 0.5000001, &set).is_some());
    }

    #[test]
    fn reports_only_identity_changes() {
        let set = vec![cand(1, 0.0, 0.0)];
        let mut r = HoverResolver::new(0.005);
        assert!(matches!(resolve(&mut r, DVec2::ZERO, 1.0, &set), HoverChange::Changed(Some(_))));
        assert_eq!(resolve(&mut r, DVec2::new(0.001, 0.0), 1.0, &set), HoverChange::Unchanged);
        assert_eq!(resolve(&mut r, DVec2::new(1.0, 1.0), 1.0, &set), HoverChange::Changed(None));
        assert_eq!(resolve(&mut r, DVec2::new(2.0, 1.0), 1.0, &set), HoverChange::Unchanged);
    }

    #[test]
    fn empty_set_hovers_nothing() {
        let mut r = HoverResolver::new(0.005);
        assert_eq!(resolve(&mut r, DVec2::ZERO, 1.0, &[]), HoverChange::Unchanged);
        assert!(r.current().is_none());
    }

    proptest! {
        #[test]
        fn nearest_matches_exhaustive_scan(
            points in prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0), 0..48),
            px in -1.0f64..1.0,
            py in -1.0f64..1.0,
            threshold in 0.001f64..1.0,
        ) {
            let set: Vec<_> = points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| cand(i as u64, x, y))
                .collect();
            let pointer = DVec2::new(px, py);

            let mut expected: Option<(usize, f64)> = None;
            for (i, c) in set.iter().enumerate() {
                let d2 = pointer.distance_squared(c.world());
                if d2 < threshold * threshold && expected.map_or(true, |(_, best)| d2 < best) {
                    expected = Some((i, d2));
                }
            }

            let hit = nearest_within(pointer, threshold, &set);
            prop_assert_eq!(hit.map(|(i, _)| i), expected.map(|(i, _)| i));
            if let Some((_, d)) = hit {
                prop_assert!(d <= threshold);
            }
        }
    }
}
