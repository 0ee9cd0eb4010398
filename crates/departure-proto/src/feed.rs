//! Inbound feed messages.
//!
//! Every message is a JSON object with an `event` discriminant. Only
//! `heartbeat` and `schedule` are understood; any other event is an error so
//! that protocol drift shows up on the board instead of silently freezing it.
//!
//! Decoding is bounded: the raw text is rejected before parsing when it is
//! larger than the configured maximum.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Default upper bound for a single inbound payload (48 KiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 48 * 1024;

const HEARTBEAT_EVENT: &str = "heartbeat";
const SCHEDULE_EVENT: &str = "schedule";

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Liveness signal; carries no schedule content
    Heartbeat,
    /// Full snapshot of upcoming trips
    Schedule(ScheduleData),
}

/// Body of a `schedule` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleData {
    /// Trips in feed order
    pub trips: Vec<TripRecord>,
}

/// One trip as sent by the feed, before abbreviation and route styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    /// Destination text
    pub headsign: String,
    /// Stop this visit belongs to
    pub stop_id: String,
    /// Route key, used for style lookup
    pub route_id: String,
    /// Route label as published by the feed
    pub route_name: String,
    /// Route color as bare hex (`"1A2B3C"`), if the feed has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_color: Option<String>,
    /// Arrival time, unix seconds
    pub arrival_time: i64,
    /// Departure time, unix seconds
    pub departure_time: i64,
    /// Whether the times come from live vehicle tracking
    #[serde(default)]
    pub is_realtime: bool,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl FeedMessage {
    /// Decode a raw text message, rejecting payloads above `max_bytes`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if `raw` exceeds `max_bytes`
    /// - `ProtocolError::Malformed` if `raw` is not a JSON object of the
    ///   expected shape
    /// - `ProtocolError::MissingEvent` if there is no `event` field
    /// - `ProtocolError::UnknownEvent` for any event other than `heartbeat`
    ///   and `schedule`
    pub fn decode(raw: &str, max_bytes: usize) -> Result<Self> {
        if raw.len() > max_bytes {
            return Err(ProtocolError::PayloadTooLarge { size: raw.len(), max: max_bytes });
        }

        let envelope: Envelope = serde_json::from_str(raw)?;
        let Some(event) = envelope.event else {
            return Err(ProtocolError::MissingEvent);
        };

        match event.as_str() {
            HEARTBEAT_EVENT => Ok(Self::Heartbeat),
            SCHEDULE_EVENT => {
                let data = envelope
                    .data
                    .ok_or_else(|| ProtocolError::Malformed("schedule event without data".into()))?;
                let schedule: ScheduleData = serde_json::from_value(data)?;
                Ok(Self::Schedule(schedule))
            },
            _ => Err(ProtocolError::UnknownEvent(event)),
        }
    }

    /// Event name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Heartbeat => HEARTBEAT_EVENT,
            Self::Schedule(_) => SCHEDULE_EVENT,
        }
    }
}
