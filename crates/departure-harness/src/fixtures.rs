//! Feed messages and board configurations for tests.

use departure_core::{BoardConfig, DecoderRules, DisplaySettings, FeedSettings, StopRegistry};
use departure_proto::TripRecord;
use serde_json::json;

/// Feed URL used by [`board_config`].
pub const FEED_URL: &str = "ws://feed.test/board";

/// Board with a feed URL and the given `(id, name)` stops.
pub fn board_config<'a>(stops: impl IntoIterator<Item = (&'a str, &'a str)>) -> BoardConfig {
    BoardConfig {
        feed: FeedSettings {
            url: Some(FEED_URL.to_owned()),
            feed_code: Some("metro".to_owned()),
            route_stop_pairs: "1_44,1_100".to_owned(),
            ..FeedSettings::default()
        },
        display: DisplaySettings::default(),
        rules: DecoderRules::default(),
        stops: stops.into_iter().collect::<StopRegistry>(),
    }
}

/// Trip at `stop_id` on route `route_name`, departing at `departure_time`.
pub fn trip(stop_id: &str, route_name: &str, headsign: &str, departure_time: i64) -> TripRecord {
    TripRecord {
        headsign: headsign.to_owned(),
        stop_id: stop_id.to_owned(),
        route_id: format!("1_{route_name}"),
        route_name: route_name.to_owned(),
        route_color: None,
        arrival_time: departure_time,
        departure_time,
        is_realtime: false,
    }
}

/// `heartbeat` event.
pub fn heartbeat() -> String {
    json!({ "event": "heartbeat" }).to_string()
}

/// `schedule` event carrying `trips` in order.
pub fn schedule(trips: &[TripRecord]) -> String {
    json!({ "event": "schedule", "data": { "trips": trips } }).to_string()
}
