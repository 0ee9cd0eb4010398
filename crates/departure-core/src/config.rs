//! Validated board configuration.
//!
//! This is the in-memory form the board runs on. Loading it from a file is
//! the binary's concern; by the time a [`BoardConfig`] exists every rule has
//! been parsed and the stop registry built.

use departure_proto::SubscribeRequest;
use serde::Deserialize;
use tracing::info;

use crate::rules::DecoderRules;

/// Default number of trips requested from the feed.
pub const DEFAULT_FEED_LIMIT: u32 = 10;

/// Default number of rows shown per stop.
pub const DEFAULT_DISPLAY_LIMIT: usize = 3;

/// Default feed-side list mode.
pub const DEFAULT_LIST_MODE: &str = "sequential";

/// How minutes are suffixed in time-until text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitDisplay {
    /// `5min`
    #[default]
    Long,
    /// `5m`
    Short,
    /// `5`
    None,
}

/// Feed endpoint and subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Feed endpoint; the board shows a placeholder while unset
    pub url: Option<String>,
    /// Feed selector sent with the subscription
    pub feed_code: Option<String>,
    /// Route/stop filter string (`route,stop;route,stop`)
    pub route_stop_pairs: String,
    /// Maximum number of trips requested
    pub limit: u32,
    /// Feed-side list mode
    pub list_mode: String,
    /// Order and display by departure instead of arrival time
    pub sort_by_departure: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: None,
            feed_code: None,
            route_stop_pairs: String::new(),
            limit: DEFAULT_FEED_LIMIT,
            list_mode: DEFAULT_LIST_MODE.to_owned(),
            sort_by_departure: true,
        }
    }
}

impl FeedSettings {
    /// Subscription request sent after every successful connect.
    pub fn subscribe_request(&self) -> SubscribeRequest {
        SubscribeRequest {
            feed_code: self.feed_code.clone().filter(|code| !code.is_empty()),
            route_stop_pairs: self.route_stop_pairs.clone(),
            limit: self.limit,
            sort_by_departure: self.sort_by_departure,
            list_mode: self.list_mode.clone(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Rows shown per stop
    pub limit: usize,
    /// Minute suffix style
    pub units: UnitDisplay,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { limit: DEFAULT_DISPLAY_LIMIT, units: UnitDisplay::default() }
    }
}

/// A configured stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    /// Stop id as used by the feed
    pub id: String,
    /// Name shown on the stop-name page
    pub name: String,
}

/// Ordered stops the board rotates through.
///
/// A stop id added twice keeps its first position and takes the later name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopRegistry {
    stops: Vec<Stop>,
}

impl StopRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stop, or rename it if the id is already registered.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let (id, name) = (id.into(), name.into());
        match self.stops.iter_mut().find(|stop| stop.id == id) {
            Some(stop) => stop.name = name,
            None => self.stops.push(Stop { id, name }),
        }
    }

    /// Stop at `index` in rotation order.
    pub fn get(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Whether no stops are configured.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Stops in rotation order.
    pub fn iter(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, S)> for StopRegistry {
    fn from_iter<T: IntoIterator<Item = (S, S)>>(iter: T) -> Self {
        let mut registry = Self::new();
        for (id, name) in iter {
            registry.insert(id, name);
        }
        registry
    }
}

/// Complete board configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardConfig {
    /// Feed endpoint and subscription
    pub feed: FeedSettings,
    /// Presentation
    pub display: DisplaySettings,
    /// Decoder rules
    pub rules: DecoderRules,
    /// Stops in rotation order
    pub stops: StopRegistry,
}

impl BoardConfig {
    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            url = self.feed.url.as_deref().unwrap_or("<unset>"),
            feed_code = self.feed.feed_code.as_deref().unwrap_or("<unset>"),
            route_stop_pairs = %self.feed.route_stop_pairs,
            limit = self.feed.limit,
            list_mode = %self.feed.list_mode,
            sort_by_departure = self.feed.sort_by_departure,
            display_limit = self.display.limit,
            units = ?self.display.units,
            default_route_color = %self.rules.default_route_color,
            max_payload_bytes = self.rules.max_payload_bytes,
            "board configuration"
        );
        for (from, to) in self.rules.abbreviations.iter() {
            info!(%from, %to, "abbreviation");
        }
        for stop in self.stops.iter() {
            info!(id = %stop.id, name = %stop.name, "stop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_stop_keeps_position_takes_name() {
        let registry: StopRegistry =
            [("1_100", "Pine St"), ("1_200", "3rd Ave"), ("1_100", "Pine & 4th")].into_iter().collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0).map(|s| s.name.as_str()), Some("Pine & 4th"));
        assert_eq!(registry.get(1).map(|s| s.id.as_str()), Some("1_200"));
        assert_eq!(registry.get(2), None);
    }

    #[test]
    fn subscribe_request_from_settings() {
        let feed = FeedSettings {
            url: Some("wss://example.invalid/feed".into()),
            feed_code: Some(String::new()),
            route_stop_pairs: "1_44,1_100".into(),
            ..FeedSettings::default()
        };

        let request = feed.subscribe_request();
        assert_eq!(request.feed_code, None);
        assert_eq!(request.limit, 10);
        assert_eq!(request.list_mode, "sequential");
        assert!(request.sort_by_departure);
    }

    #[test]
    fn display_defaults() {
        let display = DisplaySettings::default();
        assert_eq!(display.limit, 3);
        assert_eq!(display.units, UnitDisplay::Long);
    }
}
