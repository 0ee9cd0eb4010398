//! Shared snapshot of upcoming trips.
//!
//! The transport context replaces the whole snapshot on every schedule
//! message; the tick context reads filtered copies to render. Both sides go
//! through one lock, and readers copy out what they need so the lock is never
//! held while drawing.
//!
//! # Invariants
//!
//! - A reader sees either the complete previous snapshot or the complete new
//!   one, never a mix
//! - Trip order is feed order

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::trip::Trip;

/// Cloneable handle to the shared trip snapshot.
#[derive(Debug, Clone, Default)]
pub struct TripCache {
    trips: Arc<Mutex<Vec<Trip>>>,
}

impl TripCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot. The previous one is dropped after the lock is
    /// released.
    pub fn replace(&self, trips: Vec<Trip>) {
        let previous = {
            let mut guard = self.lock();
            std::mem::replace(&mut *guard, trips)
        };
        drop(previous);
    }

    /// Copy of up to `limit` trips for `stop_id`, in feed order.
    pub fn read_matching(&self, stop_id: &str, limit: usize) -> Vec<Trip> {
        self.lock().iter().filter(|trip| trip.stop_id == stop_id).take(limit).cloned().collect()
    }

    /// Copy of the whole snapshot.
    pub fn snapshot(&self) -> Vec<Trip> {
        self.lock().clone()
    }

    /// Whether any trip departed strictly before `cutoff` (unix seconds).
    pub fn has_departed_before(&self, cutoff: i64) -> bool {
        self.lock().iter().any(|trip| trip.departure_time < cutoff)
    }

    /// Number of trips in the snapshot.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Poison is ignored: replace is a single move, so the Vec is never torn.
    fn lock(&self) -> MutexGuard<'_, Vec<Trip>> {
        self.trips.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::color::Rgb;

    fn trip(stop_id: &str, headsign: &str, departure_time: i64) -> Trip {
        Trip {
            stop_id: stop_id.into(),
            route_id: "1_44".into(),
            route_name: "44".into(),
            route_color: Rgb::new(0x02_8E_51),
            headsign: headsign.into(),
            arrival_time: departure_time,
            departure_time,
            is_realtime: false,
        }
    }

    #[test]
    fn read_filters_by_stop_in_feed_order() {
        let cache = TripCache::new();
        cache.replace(vec![
            trip("a", "first", 10),
            trip("b", "other", 20),
            trip("a", "second", 30),
            trip("a", "third", 40),
        ]);

        let rows = cache.read_matching("a", 2);
        let headsigns: Vec<_> = rows.iter().map(|t| t.headsign.as_str()).collect();
        assert_eq!(headsigns, ["first", "second"]);
        assert!(cache.read_matching("missing", 3).is_empty());
    }

    #[test]
    fn replace_drops_previous_snapshot() {
        let cache = TripCache::new();
        cache.replace(vec![trip("a", "old", 10)]);
        cache.replace(vec![trip("b", "new", 20), trip("b", "newer", 30)]);

        assert_eq!(cache.len(), 2);
        assert!(cache.read_matching("a", 10).is_empty());
    }

    #[test]
    fn departed_before_is_strict() {
        let cache = TripCache::new();
        assert!(!cache.has_departed_before(i64::MAX));

        cache.replace(vec![trip("a", "x", 100)]);
        assert!(!cache.has_departed_before(100));
        assert!(cache.has_departed_before(101));
    }

    #[test]
    fn readers_never_observe_torn_snapshot() {
        let cache = TripCache::new();
        let writer = {
            let cache = cache.clone();
            thread::spawn(move || {
                for generation in 0..200_i64 {
                    let snapshot = (0..5).map(|i| trip("a", &generation.to_string(), i)).collect();
                    cache.replace(snapshot);
                }
            })
        };

        for _ in 0..200 {
            let rows = cache.read_matching("a", 10);
            if let Some(first) = rows.first() {
                assert_eq!(rows.len(), 5);
                assert!(rows.iter().all(|t| t.headsign == first.headsign));
            }
        }
        writer.join().unwrap();
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let cache = TripCache::new();
        cache.replace(vec![trip("a", "kept", 10)]);

        let poisoner = cache.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.trips.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(cache.read_matching("a", 1)[0].headsign, "kept");
    }
}
