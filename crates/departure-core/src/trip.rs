//! Styled trip as stored in the cache.

use crate::color::Rgb;

/// One upcoming vehicle visit at a stop, after abbreviation and route
/// styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    /// Stop this visit belongs to
    pub stop_id: String,
    /// Feed route key; style overrides are matched on it
    pub route_id: String,
    /// Display label of the route
    pub route_name: String,
    /// Display color of the route
    pub route_color: Rgb,
    /// Destination text with abbreviations applied
    pub headsign: String,
    /// Arrival time, unix seconds
    pub arrival_time: i64,
    /// Departure time, unix seconds
    pub departure_time: i64,
    /// Whether the times come from live vehicle tracking
    pub is_realtime: bool,
}

impl Trip {
    /// Time shown for this trip: departure when sorting by departure,
    /// arrival otherwise.
    pub fn display_time(&self, by_departure: bool) -> i64 {
        if by_departure { self.departure_time } else { self.arrival_time }
    }
}
