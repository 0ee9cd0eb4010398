//! Fuzz target for rule tables
//!
//! # Strategy
//!
//! - Arbitrary `from;to` and `route_id;name;hex` text, including empty
//!   fields, extra separators, and multi-byte characters
//! - Arbitrary headsigns run through the parsed abbreviation table
//!
//! # Invariants
//!
//! - Parsing never panics; bad lines are skipped
//! - Applying abbreviations never panics on char boundaries
//! - A table with no entries leaves headsigns unchanged

#![no_main]

use arbitrary::Arbitrary;
use departure_core::{AbbreviationTable, RouteStyleTable};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    abbreviations: String,
    route_styles: String,
    headsigns: Vec<String>,
}

fuzz_target!(|input: Input| {
    let table = AbbreviationTable::from_text(&input.abbreviations);
    let _ = RouteStyleTable::from_text(&input.route_styles);

    for headsign in &input.headsigns {
        let applied = table.apply(headsign);
        if table.is_empty() {
            assert_eq!(&applied, headsign);
        }
    }
});
