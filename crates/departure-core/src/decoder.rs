//! Schedule decoder.
//!
//! Turns one raw feed message into either a liveness signal or a complete
//! replacement of the trip cache. Runs on the transport context; the only
//! state it shares with the tick context is the cache itself.
//!
//! # Route styling
//!
//! Route name and color are resolved per trip with this precedence:
//!
//! 1. A configured style override for the trip's route id
//! 2. The feed's own route name and hex color
//! 3. The configured default color (feed color absent, empty, or invalid)

use std::sync::{Arc, PoisonError, RwLock};

use departure_proto::{FeedMessage, TripRecord};
use tracing::{debug, warn};

use crate::{
    cache::TripCache, color::Rgb, error::DecodeError, rules::DecoderRules, trip::Trip,
};

/// Result of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Liveness signal; the cache is untouched
    Heartbeat,
    /// The cache now holds exactly the trips of this message
    ScheduleReplaced {
        /// Number of trips stored
        trips: usize,
    },
}

/// Decodes feed messages into the trip cache.
///
/// Cloning yields another handle to the same rules, so a reload through
/// any clone is seen by all of them on their next message.
#[derive(Debug, Clone, Default)]
pub struct ScheduleDecoder {
    rules: Arc<RwLock<Arc<DecoderRules>>>,
}

impl ScheduleDecoder {
    /// Create a decoder with the given rules.
    pub fn new(rules: DecoderRules) -> Self {
        Self { rules: Arc::new(RwLock::new(Arc::new(rules))) }
    }

    /// Replace the rules as a whole. Messages already being decoded finish
    /// with the rules they started with.
    pub fn set_rules(&self, rules: DecoderRules) {
        let mut guard = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(rules);
    }

    /// Current rules.
    pub fn rules(&self) -> Arc<DecoderRules> {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Handle one raw text message.
    ///
    /// On a schedule message the cache is replaced with the styled trips, in
    /// feed order. On any error the cache is left as it was.
    ///
    /// # Errors
    ///
    /// - `DecodeError::Oversized` if the payload exceeds the configured bound
    /// - `DecodeError::Malformed` if the payload does not parse
    /// - `DecodeError::UnknownEvent` for events other than heartbeat and
    ///   schedule
    pub fn handle(&self, raw: &str, cache: &TripCache) -> Result<DecodeOutcome, DecodeError> {
        let rules = self.rules();
        match FeedMessage::decode(raw, rules.max_payload_bytes)? {
            FeedMessage::Heartbeat => {
                debug!("received heartbeat");
                Ok(DecodeOutcome::Heartbeat)
            },
            FeedMessage::Schedule(data) => {
                let trips: Vec<Trip> =
                    data.trips.into_iter().map(|record| style_trip(&rules, record)).collect();
                let count = trips.len();
                cache.replace(trips);
                debug!(trips = count, "schedule replaced");
                Ok(DecodeOutcome::ScheduleReplaced { trips: count })
            },
        }
    }
}

fn style_trip(rules: &DecoderRules, record: TripRecord) -> Trip {
    let headsign = rules.abbreviations.apply(&record.headsign);
    let (route_name, route_color) = match rules.route_styles.get(&record.route_id) {
        Some(style) => (style.name.clone(), style.color),
        None => (record.route_name, feed_color(rules, record.route_color.as_deref())),
    };

    Trip {
        stop_id: record.stop_id,
        route_id: record.route_id,
        route_name,
        route_color,
        headsign,
        arrival_time: record.arrival_time,
        departure_time: record.departure_time,
        is_realtime: record.is_realtime,
    }
}

fn feed_color(rules: &DecoderRules, hex: Option<&str>) -> Rgb {
    match hex {
        Some(hex) if !hex.is_empty() => Rgb::from_hex(hex).unwrap_or_else(|error| {
            warn!(%error, "invalid feed route color, using default");
            rules.default_route_color
        }),
        _ => rules.default_route_color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AbbreviationTable, RouteStyle, RouteStyleTable};

    fn schedule(trips: &[(&str, &str, &str, &str, Option<&str>)]) -> String {
        let trips: Vec<_> = trips
            .iter()
            .map(|(stop, route_id, route_name, headsign, color)| {
                serde_json::json!({
                    "headsign": headsign,
                    "stopId": stop,
                    "routeId": route_id,
                    "routeName": route_name,
                    "routeColor": color,
                    "arrivalTime": 1_700_000_000,
                    "departureTime": 1_700_000_060,
                    "isRealtime": true,
                })
            })
            .collect();
        serde_json::json!({ "event": "schedule", "data": { "trips": trips } }).to_string()
    }

    fn rules() -> DecoderRules {
        let mut route_styles = RouteStyleTable::new();
        route_styles.insert("1_100", RouteStyle { name: "E Line".into(), color: Rgb::new(0xAA_00_00) });
        DecoderRules {
            abbreviations: AbbreviationTable::from_text("Transit Center;TC"),
            route_styles,
            ..DecoderRules::default()
        }
    }

    #[test]
    fn heartbeat_leaves_cache_untouched() {
        let decoder = ScheduleDecoder::new(rules());
        let cache = TripCache::new();
        cache.replace(vec![]);

        let outcome = decoder.handle(r#"{"event":"heartbeat"}"#, &cache);
        assert_eq!(outcome, Ok(DecodeOutcome::Heartbeat));
        assert!(cache.is_empty());
    }

    #[test]
    fn schedule_replaces_cache_with_styled_trips() {
        let decoder = ScheduleDecoder::new(rules());
        let cache = TripCache::new();
        let raw = schedule(&[
            ("s1", "1_100", "RapidRide E", "Downtown Transit Center", Some("FDB71A")),
            ("s1", "1_40", "40", "Ballard", Some("1A2B3C")),
            ("s2", "1_44", "44", "Wallingford", None),
        ]);

        assert_eq!(decoder.handle(&raw, &cache), Ok(DecodeOutcome::ScheduleReplaced { trips: 3 }));

        let trips = cache.snapshot();
        let route_ids: Vec<_> = trips.iter().map(|t| t.route_id.as_str()).collect();
        assert_eq!(route_ids, ["1_100", "1_40", "1_44"]);
        assert_eq!(trips[0].route_name, "E Line");
        assert_eq!(trips[0].route_color, Rgb::new(0xAA_00_00));
        assert_eq!(trips[0].headsign, "Downtown TC");
        assert_eq!(trips[1].route_name, "40");
        assert_eq!(trips[1].route_color, Rgb::new(0x1A_2B_3C));
        assert_eq!(trips[2].route_color, DecoderRules::default().default_route_color);
        assert!(trips.iter().all(|t| t.is_realtime));
    }

    #[test]
    fn invalid_or_empty_feed_color_uses_default() {
        let decoder = ScheduleDecoder::new(DecoderRules::default());
        let cache = TripCache::new();
        let raw = schedule(&[("s", "r", "R", "A", Some("zzz")), ("s", "r", "R", "B", Some(""))]);

        decoder.handle(&raw, &cache).unwrap();
        assert!(cache.snapshot().iter().all(|t| t.route_color == Rgb::new(0x02_8E_51)));
    }

    #[test]
    fn oversized_payload_keeps_previous_snapshot() {
        let decoder = ScheduleDecoder::new(DecoderRules { max_payload_bytes: 300, ..rules() });
        let cache = TripCache::new();
        decoder.handle(&schedule(&[("s", "r", "R", "Old", None)]), &cache).unwrap();

        let big = schedule(&[("s", "r", "R", "New", None); 5]);
        let err = decoder.handle(&big, &cache).unwrap_err();

        assert!(err.is_resource_exhaustion());
        assert_eq!(cache.snapshot()[0].headsign, "Old");
    }

    #[test]
    fn malformed_payload_keeps_previous_snapshot() {
        let decoder = ScheduleDecoder::new(rules());
        let cache = TripCache::new();
        decoder.handle(&schedule(&[("s", "r", "R", "Old", None)]), &cache).unwrap();

        let err = decoder.handle(r#"{"event":"schedule","data":{"trips":"nope"}}"#, &cache);
        assert!(matches!(err, Err(DecodeError::Malformed(_))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reloaded_rules_apply_to_next_message() {
        let decoder = ScheduleDecoder::new(DecoderRules::default());
        let cache = TripCache::new();
        let raw = schedule(&[("s", "r", "R", "North Station", None)]);

        decoder.handle(&raw, &cache).unwrap();
        assert_eq!(cache.snapshot()[0].headsign, "North Station");

        let reloader = decoder.clone();
        reloader.set_rules(DecoderRules {
            abbreviations: AbbreviationTable::from_text("Station;Stn"),
            ..DecoderRules::default()
        });
        decoder.handle(&raw, &cache).unwrap();
        assert_eq!(cache.snapshot()[0].headsign, "North Stn");
    }
}
