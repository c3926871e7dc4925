//! Content-addressed cache of decoded hover images.
//!
//! Generic over the stored handle so the bookkeeping (at-most-once loading,
//! stale-decode rejection, retry backoff) is testable without a GPU.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// First retry delay after a failed load; doubles per attempt.
pub const RETRY_BASE: Duration = Duration::from_millis(500);
/// Loads per reference before it is given up for the session.
pub const MAX_ATTEMPTS: u32 = 3;

/// Answer to [`TextureCache::request`].
#[derive(Debug, PartialEq)]
pub enum CacheLookup<'a, H> {
    /// Decoded and ready to bind.
    Hit(&'a H),
    /// The caller must start loading this reference now.
    Miss,
    /// A load is in flight, or a failed load is waiting out its backoff.
    Pending,
    /// Every attempt failed; keep the current texture.
    Failed,
}

#[derive(Debug)]
enum Slot<H> {
    Ready(H),
    Loading { attempt: u32 },
    Backoff { attempt: u32, retry_at: Instant },
    GaveUp,
}

/// Cache keyed by image reference. Entries are inserted at most once and
/// never evicted; the cache lives exactly as long as the viewer session.
#[derive(Debug)]
pub struct TextureCache<H> {
    slots: HashMap<String, Slot<H>>,
    active: Option<String>,
}

impl<H> Default for TextureCache<H> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            active: None,
        }
    }
}

impl<H> TextureCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference currently bound to the GPU texture.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn set_active(&mut self, reference: &str) {
        self.active = Some(reference.to_owned());
    }

    pub fn get(&self, reference: &str) -> Option<&H> {
        match self.slots.get(reference) {
            Some(Slot::Ready(h)) => Some(h),
            _ => None,
        }
    }

    /// Looks `reference` up, reserving a load slot on a miss.
    pub fn request(&mut self, reference: &str, now: Instant) -> CacheLookup<'_, H> {
        let next_attempt = match self.slots.get(reference) {
            Some(Slot::Ready(_)) => None,
            None => Some(1),
            Some(Slot::Backoff { attempt, retry_at }) if *retry_at <= now => Some(attempt + 1),
            Some(Slot::Loading { .. }) | Some(Slot::Backoff { .. }) => return CacheLookup::Pending,
            Some(Slot::GaveUp) => return CacheLookup::Failed,
        };
        let Some(attempt) = next_attempt else {
            return self.get(reference).map_or(CacheLookup::Pending, CacheLookup::Hit);
        };
        self.slots
            .insert(reference.to_owned(), Slot::Loading { attempt });
        CacheLookup::Miss
    }

    /// Stores a finished load.
    ///
    /// Returns `true` if the image should be bound now, i.e. `reference` is
    /// still what `current` wants. A late decode for a point that is no longer
    /// hovered is cached but not applied.
    pub fn complete(&mut self, reference: &str, handle: H, current: Option<&str>) -> bool {
        if matches!(self.slots.get(reference), Some(Slot::Ready(_))) {
            log::debug!("Ignoring duplicate load for {}", reference);
        } else {
            self.slots.insert(reference.to_owned(), Slot::Ready(handle));
        }
        current == Some(reference)
    }

    /// Records a failed load and schedules the retry.
    pub fn fail(&mut self, reference: &str, now: Instant) {
        let attempt = match self.slots.get(reference) {
            Some(Slot::Loading { attempt }) => *attempt,
            Some(Slot::Ready(_)) => return,
            _ => 1,
        };
        let slot = if attempt >= MAX_ATTEMPTS {
            log::warn!("Giving up on {} after {} attempts", reference, attempt);
            Slot::GaveUp
        } else {
            Slot::Backoff {
                attempt,
                retry_at: now + RETRY_BASE * 2u32.pow(attempt - 1),
            }
        };
        self.slots.insert(reference.to_owned(), slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_pending_then_hit() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        let now = Instant::now();
        assert_eq!(cache.request("a", now), CacheLookup::Miss);
        assert_eq!(cache.request("a", now), CacheLookup::Pending);
        assert!(cache.complete("a", 7, Some("a")));
        assert_eq!(cache.request("a", now), CacheLookup::Hit(&7));
        assert_eq!(cache.get("a"), Some(&7));
    }

    #[test]
    fn late_decode_is_cached_but_not_bound() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        let now = Instant::now();
        cache.request("a", now);
        cache.request("b", now);
        assert!(!cache.complete("a", 1, Some("b")));
        assert!(!cache.complete("b", 2, None));
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("b"), Some(&2));
    }

    #[test]
    fn entries_load_at_most_once() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        cache.complete("a", 1, None);
        cache.complete("a", 2, None);
        assert_eq!(cache.get("a"), Some(&1));
    }

    #[test]
    fn failures_back_off_then_give_up() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        let t0 = Instant::now();
        assert_eq!(cache.request("a", t0), CacheLookup::Miss);
        cache.fail("a", t0);
        assert_eq!(cache.request("a", t0 + Duration::from_millis(100)), CacheLookup::Pending);

        let t1 = t0 + RETRY_BASE;
        assert_eq!(cache.request("a", t1), CacheLookup::Miss);
        cache.fail("a", t1);
        assert_eq!(cache.request("a", t1 + RETRY_BASE), CacheLookup::Pending);

        let t2 = t1 + RETRY_BASE * 2;
        assert_eq!(cache.request("a", t2), CacheLookup::Miss);
        cache.fail("a", t2);
        assert_eq!(cache.request("a", t2 + Duration::from_secs(60)), CacheLookup::Failed);
    }

    #[test]
    fn active_reference_is_tracked() {
        let mut cache: TextureCache<u32> = TextureCache::new();
        assert_eq!(cache.active(), None);
        cache.set_active("x");
        assert_eq!(cache.active(), Some("x"));
    }
}
