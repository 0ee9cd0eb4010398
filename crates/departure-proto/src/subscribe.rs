//! Outbound subscription request.
//!
//! Sent once per successful connection. The feed answers with a `schedule`
//! event immediately and then whenever the snapshot changes.

use serde::Serialize;

use crate::errors::{ProtocolError, Result};

/// Event name of the subscription request.
pub const SUBSCRIBE_EVENT: &str = "schedule:subscribe";

/// Subscription parameters taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// Feed selector; omitted from the wire when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_code: Option<String>,
    /// Route/stop filter string (`route,stop;route,stop`)
    pub route_stop_pairs: String,
    /// Maximum number of trips the feed should return
    pub limit: u32,
    /// Order by departure instead of arrival time
    pub sort_by_departure: bool,
    /// Feed-side list mode
    pub list_mode: String,
}

#[derive(Serialize)]
struct Envelope<'a> {
    event: &'static str,
    data: &'a SubscribeRequest,
}

impl SubscribeRequest {
    /// Serialize into the `{"event": ..., "data": ...}` envelope.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(&Envelope { event: SUBSCRIBE_EVENT, data: self })
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(feed_code: Option<&str>) -> SubscribeRequest {
        SubscribeRequest {
            feed_code: feed_code.map(str::to_owned),
            route_stop_pairs: "1_44,1_100;1_40,1_100".into(),
            limit: 10,
            sort_by_departure: true,
            list_mode: "sequential".into(),
        }
    }

    #[test]
    fn encodes_with_feed_code() {
        let json = request(Some("st")).encode().unwrap();
        insta::assert_snapshot!(json, @r#"{"event":"schedule:subscribe","data":{"feedCode":"st","routeStopPairs":"1_44,1_100;1_40,1_100","limit":10,"sortByDeparture":true,"listMode":"sequential"}}"#);
    }

    #[test]
    fn omits_unset_feed_code() {
        let json = request(None).encode().unwrap();
        insta::assert_snapshot!(json, @r#"{"event":"schedule:subscribe","data":{"routeStopPairs":"1_44,1_100;1_40,1_100","limit":10,"sortByDeparture":true,"listMode":"sequential"}}"#);
    }
}
