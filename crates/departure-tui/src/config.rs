//! YAML configuration file.
//!
//! The file mirrors [`BoardConfig`] with text rule tables and plain stop
//! entries. Every key is optional; a missing feed URL leaves the board on its
//! "No feed URL set" placeholder rather than failing to start.
//!
//! ```yaml
//! feed:
//!   url: wss://feed.example/board
//!   code: metro
//!   route_stop_pairs: "1_44,1_100;1_40,1_100"
//! display:
//!   limit: 3
//!   units: short
//!   abbreviations: |
//!     Transit Center;TC
//!   route_styles: |
//!     1_44;44X;FDB71A
//! stops:
//!   - id: "1_100"
//!     name: Pine St
//! ```

use std::{
    io,
    path::{Path, PathBuf},
};

use departure_core::{
    AbbreviationTable, BoardConfig, DecoderRules, DisplaySettings, FeedSettings, Rgb,
    RouteStyleTable, StopRegistry, UnitDisplay,
    config::{DEFAULT_DISPLAY_LIMIT, DEFAULT_FEED_LIMIT, DEFAULT_LIST_MODE},
    rules::DEFAULT_ROUTE_COLOR,
};
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The file is not valid YAML of the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value parsed but is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Feed endpoint and subscription
    #[serde(default)]
    pub feed: FeedConfig,
    /// Presentation and decoder rules
    #[serde(default)]
    pub display: DisplayConfig,
    /// Stops in rotation order
    #[serde(default)]
    pub stops: Vec<StopConfig>,
}

/// `feed` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Feed endpoint
    #[serde(default)]
    pub url: Option<String>,
    /// Feed selector sent with the subscription
    #[serde(default)]
    pub code: Option<String>,
    /// Route/stop filter (`route,stop;route,stop`)
    #[serde(default)]
    pub route_stop_pairs: String,
    /// Maximum trips requested
    #[serde(default = "FeedConfig::default_limit")]
    pub limit: u32,
    /// Feed-side list mode
    #[serde(default = "FeedConfig::default_list_mode")]
    pub list_mode: String,
    /// Order by departure instead of arrival
    #[serde(default = "FeedConfig::default_sort_by_departure")]
    pub sort_by_departure: bool,
    /// Largest inbound message accepted
    #[serde(default = "FeedConfig::default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            code: None,
            route_stop_pairs: String::new(),
            limit: Self::default_limit(),
            list_mode: Self::default_list_mode(),
            sort_by_departure: Self::default_sort_by_departure(),
            max_payload_bytes: Self::default_max_payload_bytes(),
        }
    }
}

impl FeedConfig {
    fn default_limit() -> u32 {
        DEFAULT_FEED_LIMIT
    }
    fn default_list_mode() -> String {
        DEFAULT_LIST_MODE.to_owned()
    }
    fn default_sort_by_departure() -> bool {
        true
    }
    fn default_max_payload_bytes() -> usize {
        DecoderRules::default().max_payload_bytes
    }
}

/// `display` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Rows per stop
    #[serde(default = "DisplayConfig::default_limit")]
    pub limit: usize,
    /// Minute suffix style
    #[serde(default)]
    pub units: UnitDisplay,
    /// Route color when neither a style nor the feed has one
    #[serde(default = "DisplayConfig::default_route_color")]
    pub default_route_color: Rgb,
    /// `from;to` lines
    #[serde(default)]
    pub abbreviations: String,
    /// `route_id;name;hex` lines
    #[serde(default)]
    pub route_styles: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            limit: Self::default_limit(),
            units: UnitDisplay::default(),
            default_route_color: Self::default_route_color(),
            abbreviations: String::new(),
            route_styles: String::new(),
        }
    }
}

impl DisplayConfig {
    fn default_limit() -> usize {
        DEFAULT_DISPLAY_LIMIT
    }
    fn default_route_color() -> Rgb {
        DEFAULT_ROUTE_COLOR
    }
}

/// One `stops` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StopConfig {
    /// Stop id as sent by the feed
    pub id: String,
    /// Display name
    pub name: String,
}

impl Config {
    /// Read and parse `path`.
    ///
    /// # Errors
    ///
    /// `ConfigError::Read` if the file cannot be read, `ConfigError::Parse`
    /// if it is not valid.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        Self::from_yaml(&content)
    }

    /// Parse YAML text.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` if `text` is not valid.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty file is an all-defaults config
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Decoder rules built from the `display` and `feed` sections.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` if the payload bound is zero.
    pub fn rules(&self) -> Result<DecoderRules, ConfigError> {
        if self.feed.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid("feed.max_payload_bytes must be positive".into()));
        }
        Ok(DecoderRules {
            abbreviations: AbbreviationTable::from_text(&self.display.abbreviations),
            route_styles: RouteStyleTable::from_text(&self.display.route_styles),
            default_route_color: self.display.default_route_color,
            max_payload_bytes: self.feed.max_payload_bytes,
        })
    }

    /// Validate and convert into the board's configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn board_config(&self) -> Result<BoardConfig, ConfigError> {
        if self.display.limit == 0 {
            return Err(ConfigError::Invalid("display.limit must be positive".into()));
        }
        if self.feed.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(ConfigError::Invalid("feed.url is empty".into()));
        }

        let stops: StopRegistry =
            self.stops.iter().map(|stop| (stop.id.as_str(), stop.name.as_str())).collect();

        Ok(BoardConfig {
            feed: FeedSettings {
                url: self.feed.url.clone(),
                feed_code: self.feed.code.clone(),
                route_stop_pairs: self.feed.route_stop_pairs.clone(),
                limit: self.feed.limit,
                list_mode: self.feed.list_mode.clone(),
                sort_by_departure: self.feed.sort_by_departure,
            },
            display: DisplaySettings { limit: self.display.limit, units: self.display.units },
            rules: self.rules()?,
            stops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::from_yaml("").unwrap().board_config().unwrap();

        assert_eq!(config.feed.url, None);
        assert_eq!(config.feed.limit, DEFAULT_FEED_LIMIT);
        assert_eq!(config.feed.list_mode, "sequential");
        assert!(config.feed.sort_by_departure);
        assert_eq!(config.display.limit, 3);
        assert_eq!(config.display.units, UnitDisplay::Long);
        assert_eq!(config.rules.default_route_color, DEFAULT_ROUTE_COLOR);
        assert_eq!(config.rules.max_payload_bytes, 49_152);
        assert!(config.stops.is_empty());
    }

    #[test]
    fn full_file_converts() {
        let yaml = r#"
feed:
  url: wss://feed.example/board
  code: metro
  route_stop_pairs: "1_44,1_100"
  limit: 6
  sort_by_departure: false
display:
  limit: 2
  units: none
  default_route_color: "123ABC"
  abbreviations: |
    Transit Center;TC
    Station;Stn
  route_styles: |
    1_44;44X;FDB71A
stops:
  - id: "1_100"
    name: Pine St
  - id: "1_200"
    name: Pike St
"#;
        let config = Config::from_yaml(yaml).unwrap().board_config().unwrap();

        assert_eq!(config.feed.url.as_deref(), Some("wss://feed.example/board"));
        assert_eq!(config.feed.feed_code.as_deref(), Some("metro"));
        assert_eq!(config.feed.limit, 6);
        assert!(!config.feed.sort_by_departure);
        assert_eq!(config.display.units, UnitDisplay::None);
        assert_eq!(config.rules.default_route_color, Rgb::new(0x12_3A_BC));
        assert_eq!(config.rules.abbreviations.len(), 2);
        assert_eq!(config.rules.route_styles.get("1_44").map(|s| s.name.as_str()), Some("44X"));
        assert_eq!(config.stops.len(), 2);
        assert_eq!(config.stops.get(1).map(|s| s.name.as_str()), Some("Pike St"));
    }

    #[test]
    fn bad_color_is_a_parse_error() {
        let err = Config::from_yaml("display:\n  default_route_color: nothex\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::from_yaml("feed:\n  uri: ws://typo\n").is_err());
    }

    #[test]
    fn zero_display_limit_is_invalid() {
        let config = Config::from_yaml("display:\n  limit: 0\n").unwrap();
        assert!(matches!(config.board_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load("/nonexistent/departure.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/departure.yaml"), "{err}");
    }
}
