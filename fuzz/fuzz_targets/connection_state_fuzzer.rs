//! Fuzz target for the connection manager state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of connect, open, failure, close, heartbeat,
//!   reconnect, shutdown, and ticks with arbitrary clock advances
//! - Reports carry the current generation or an older one
//!
//! # Invariants
//!
//! - Every Open carries exactly the next generation
//! - At most one Open per call
//! - Restart is requested at most once
//! - Nothing opens after shutdown

#![no_main]

use std::time::{Duration, Instant};

use arbitrary::Arbitrary;
use departure_core::{ConnectionAction, ConnectionConfig, ConnectionManager, FeedSettings, TripCache};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Connect { link_up: bool },
    Opened { back: u8 },
    OpenFailed { back: u8 },
    Heartbeat { back: u8 },
    Closed { back: u8 },
    Reconnect,
    Shutdown,
    Tick { advance_ms: u16 },
}

fuzz_target!(|ops: Vec<Op>| {
    let settings = FeedSettings { url: Some("wss://feed.invalid/".into()), ..FeedSettings::default() };
    let mut manager = ConnectionManager::new(ConnectionConfig::from(&settings));
    let cache = TripCache::new();
    let wall_clock = Some(1_700_000_000);

    #[allow(clippy::disallowed_methods)]
    let mut now = Instant::now();
    let mut last_generation = 0;
    let mut restarts = 0;
    let mut shut_down = false;

    for op in ops {
        let current = manager.generation();
        let generation = |back: u8| current.saturating_sub(u64::from(back % 3));
        let actions = match op {
            Op::Connect { link_up } => manager.connect(now, link_up),
            Op::Opened { back } => {
                let generation = generation(back);
                manager.on_open(generation, now)
            },
            Op::OpenFailed { back } => {
                let generation = generation(back);
                manager.on_open_failed(generation, now, "refused")
            },
            Op::Heartbeat { back } => {
                let generation = generation(back);
                manager.on_heartbeat(generation, now);
                Vec::new()
            },
            Op::Closed { back } => {
                let generation = generation(back);
                manager.on_closed(generation, now);
                Vec::new()
            },
            Op::Reconnect => manager.reconnect(now, true),
            Op::Shutdown => {
                shut_down = true;
                manager.close(true)
            },
            Op::Tick { advance_ms } => {
                now += Duration::from_millis(u64::from(advance_ms));
                manager.tick(now, wall_clock, &cache, true)
            },
        };

        let opens: Vec<u64> = actions
            .iter()
            .filter_map(|a| match a {
                ConnectionAction::Open { generation, .. } => Some(*generation),
                _ => None,
            })
            .collect();
        assert!(opens.len() <= 1, "multiple opens in one step: {opens:?}");
        assert!(!(shut_down && !opens.is_empty()), "opened after shutdown");
        if let Some(&generation) = opens.first() {
            assert_eq!(generation, last_generation + 1);
            last_generation = generation;
        }

        restarts += actions.iter().filter(|a| matches!(a, ConnectionAction::Restart)).count();
        assert!(restarts <= 1, "restart requested twice");
    }
});
