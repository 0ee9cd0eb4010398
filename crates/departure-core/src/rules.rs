//! Decoder rules: headsign abbreviations and route style overrides.
//!
//! Both tables are built from configuration and swapped into the decoder as a
//! whole; the decoder never sees a partially applied reload.
//!
//! # Text format
//!
//! One rule per line, fields separated by `;`:
//!
//! ```text
//! Transit Center;TC          abbreviation: from;to
//! 1_100;44;FDB71A            route style: route_id;name;hex color
//! ```
//!
//! Blank lines are ignored. Lines with the wrong shape are skipped with a
//! warning so one typo does not drop the rest of the table.

use std::collections::{BTreeMap, HashMap};

use departure_proto::DEFAULT_MAX_PAYLOAD_BYTES;
use tracing::warn;

use crate::{color::Rgb, error::RuleError};

/// Fallback route color when neither a style override nor the feed has one.
pub const DEFAULT_ROUTE_COLOR: Rgb = Rgb::new(0x02_8E_51);

/// Headsign substitutions, applied in `from` key order.
///
/// # Invariants
///
/// - Entries are ordered by source text; re-adding a `from` key replaces its
///   target
/// - Applying the table never re-matches text that a substitution produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbbreviationTable {
    entries: BTreeMap<String, String>,
}

impl AbbreviationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `from;to` lines, skipping malformed ones.
    pub fn from_text(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_abbreviation(line) {
                Ok((from, to)) => table.insert(from, to),
                Err(error) => warn!(%error, "skipping abbreviation rule"),
            }
        }
        table
    }

    /// Add a substitution. An empty `from` is ignored.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (from.into(), to.into());
        if from.is_empty() {
            warn!(%to, "ignoring abbreviation with empty source text");
            return;
        }
        self.entries.insert(from, to);
    }

    /// Number of substitutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitutions in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    /// Apply every substitution to `headsign`.
    ///
    /// Each entry, in key order, replaces its first occurrence in the
    /// original text that does not overlap a span already claimed by an
    /// earlier entry. Replacement text is never searched again.
    pub fn apply(&self, headsign: &str) -> String {
        let mut spans: Vec<(usize, usize, &str)> = Vec::new();
        for (from, to) in &self.entries {
            let hit = headsign
                .match_indices(from.as_str())
                .map(|(start, found)| (start, start + found.len()))
                .find(|&(start, end)| spans.iter().all(|&(s, e, _)| end <= s || start >= e));
            if let Some((start, end)) = hit {
                spans.push((start, end, to.as_str()));
            }
        }

        if spans.is_empty() {
            return headsign.to_owned();
        }

        spans.sort_unstable_by_key(|&(start, _, _)| start);
        let mut out = String::with_capacity(headsign.len());
        let mut cursor = 0;
        for (start, end, to) in spans {
            out.push_str(&headsign[cursor..start]);
            out.push_str(to);
            cursor = end;
        }
        out.push_str(&headsign[cursor..]);
        out
    }
}

fn parse_abbreviation(line: &str) -> Result<(&str, &str), RuleError> {
    match line.split_once(';') {
        Some((from, to)) if !from.is_empty() && !to.contains(';') => Ok((from, to)),
        _ => Err(RuleError::MalformedLine { line: line.to_owned(), expected: "from;to" }),
    }
}

/// Display override for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStyle {
    /// Label shown instead of the feed's route name
    pub name: String,
    /// Color shown instead of the feed's route color
    pub color: Rgb,
}

/// Route overrides keyed by route id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteStyleTable {
    styles: HashMap<String, RouteStyle>,
}

impl RouteStyleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `route_id;name;color` lines, skipping malformed ones.
    pub fn from_text(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_route_style(line) {
                Ok((route_id, style)) => table.insert(route_id, style),
                Err(error) => warn!(%error, "skipping route style rule"),
            }
        }
        table
    }

    /// Add or replace the override for `route_id`.
    pub fn insert(&mut self, route_id: impl Into<String>, style: RouteStyle) {
        self.styles.insert(route_id.into(), style);
    }

    /// Override for `route_id`, if any.
    pub fn get(&self, route_id: &str) -> Option<&RouteStyle> {
        self.styles.get(route_id)
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn parse_route_style(line: &str) -> Result<(&str, RouteStyle), RuleError> {
    let malformed = || RuleError::MalformedLine { line: line.to_owned(), expected: "route_id;name;color" };
    let mut fields = line.split(';');
    let (Some(route_id), Some(name), Some(color), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed());
    };
    if route_id.is_empty() {
        return Err(malformed());
    }
    let color = Rgb::from_hex(color)?;
    Ok((route_id, RouteStyle { name: name.to_owned(), color }))
}

/// Everything the decoder needs to turn feed records into display trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderRules {
    /// Headsign substitutions
    pub abbreviations: AbbreviationTable,
    /// Route overrides
    pub route_styles: RouteStyleTable,
    /// Color used when neither an override nor the feed supplies one
    pub default_route_color: Rgb,
    /// Upper bound for a single inbound payload
    pub max_payload_bytes: usize,
}

impl Default for DecoderRules {
    fn default() -> Self {
        Self {
            abbreviations: AbbreviationTable::default(),
            route_styles: RouteStyleTable::default(),
            default_route_color: DEFAULT_ROUTE_COLOR,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}
