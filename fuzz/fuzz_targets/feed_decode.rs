//! Fuzz target for feed message decoding
//!
//! Feeds arbitrary text through the schedule decoder into a cache to find:
//! - Parser panics on malformed JSON
//! - Size bound bypasses
//! - Style or abbreviation rules panicking on odd headsigns and colors
//!
//! The fuzzer should NEVER panic. Invalid input returns an error and leaves
//! the cache untouched.

#![no_main]

use departure_core::{DecoderRules, ScheduleDecoder, TripCache};
use departure_proto::FeedMessage;
use libfuzzer_sys::fuzz_target;

const MAX_BYTES: usize = 4096;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = FeedMessage::decode(text, MAX_BYTES);

    let rules = DecoderRules { max_payload_bytes: MAX_BYTES, ..DecoderRules::default() };
    let decoder = ScheduleDecoder::new(rules);
    let cache = TripCache::new();
    let before = cache.snapshot();

    if decoder.handle(text, &cache).is_err() {
        assert_eq!(cache.snapshot(), before, "failed decode touched the cache");
    }
    if text.len() > MAX_BYTES {
        assert!(decoder.handle(text, &cache).is_err(), "oversized payload accepted");
    }
});
