//! Property-based tests for the App and pagination state machines.
//!
//! Tests verify that invariants hold under arbitrary event sequences and
//! clock advances.

use std::time::Duration;

use departure_app::{App, AppAction, AppEvent, Page, PageTick, PaginationEngine};
use departure_core::{DecodeError, Environment, StopRegistry, TripCache};
use departure_harness::{SimEnv, fixtures};
use proptest::prelude::*;

/// Events the runtime could feed the App, with generations near the current
/// one so both current and superseded reports show up.
#[derive(Debug, Clone)]
enum Step {
    Advance(u64),
    Tick,
    Reconnect,
    Opened(u64),
    OpenFailed(u64),
    Heartbeat(u64),
    Closed(u64),
    DecodeFailed(u64),
    Schedule(u64),
    LinkUp(bool),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0u64..20_000).prop_map(Step::Advance),
        4 => Just(Step::Tick),
        1 => Just(Step::Reconnect),
        2 => (0u64..3).prop_map(Step::Opened),
        2 => (0u64..3).prop_map(Step::OpenFailed),
        1 => (0u64..3).prop_map(Step::Heartbeat),
        1 => (0u64..3).prop_map(Step::Closed),
        1 => (0u64..3).prop_map(Step::DecodeFailed),
        1 => (0u64..3).prop_map(Step::Schedule),
        1 => any::<bool>().prop_map(Step::LinkUp),
    ]
}

/// Apply `step`; `back` picks a generation at or below the current one.
fn apply(app: &mut App<SimEnv>, env: &SimEnv, step: &Step) -> Vec<AppAction> {
    let generation = |back: u64| app.connection().generation().saturating_sub(back);
    match *step {
        Step::Advance(ms) => {
            env.advance(Duration::from_millis(ms));
            Vec::new()
        },
        Step::Tick => app.handle(AppEvent::Tick),
        Step::Reconnect => app.handle(AppEvent::Reconnect),
        Step::Opened(back) => {
            let generation = generation(back);
            app.handle(AppEvent::Opened { generation })
        },
        Step::OpenFailed(back) => {
            let generation = generation(back);
            app.handle(AppEvent::OpenFailed { generation, reason: "refused".into() })
        },
        Step::Heartbeat(back) => {
            let generation = generation(back);
            app.handle(AppEvent::Heartbeat { generation })
        },
        Step::Closed(back) => {
            let generation = generation(back);
            app.handle(AppEvent::Closed { generation })
        },
        Step::DecodeFailed(back) => {
            let generation = generation(back);
            let error = DecodeError::Malformed("truncated".into());
            app.handle(AppEvent::DecodeFailed { generation, error })
        },
        Step::Schedule(back) => {
            let generation = generation(back);
            app.handle(AppEvent::ScheduleUpdated { generation, trips: 0 })
        },
        Step::LinkUp(up) => {
            env.set_link_up(up);
            Vec::new()
        },
    }
}

fn stops(names: &[u8]) -> StopRegistry {
    names.iter().enumerate().map(|(i, name)| (format!("stop_{i}"), format!("Stop {name}"))).collect()
}

proptest! {
    /// Every Open carries a fresh generation, one at a time, and the
    /// generation never goes backwards.
    #[test]
    fn prop_opens_carry_fresh_generations(steps in prop::collection::vec(step_strategy(), 0..120)) {
        let env = SimEnv::new();
        let config = fixtures::board_config([("1_100", "Pine St")]);
        let mut app = App::new(env.clone(), &config, TripCache::new());
        let mut last_generation = 0;

        for action in app.start() {
            if let AppAction::Open { generation, .. } = action {
                last_generation = generation;
            }
        }

        for step in &steps {
            let actions = apply(&mut app, &env, step);
            let opens: Vec<u64> = actions
                .iter()
                .filter_map(|a| match a {
                    AppAction::Open { generation, .. } => Some(*generation),
                    _ => None,
                })
                .collect();

            prop_assert!(opens.len() <= 1, "{:?} opened {:?}", step, opens);
            if let Some(&generation) = opens.first() {
                prop_assert_eq!(generation, last_generation + 1);
                prop_assert_eq!(generation, app.connection().generation());
                last_generation = generation;
            }
            prop_assert!(app.connection().generation() >= last_generation);
        }
    }

    /// Nothing reopens the connection after shutdown.
    #[test]
    fn prop_shutdown_is_final(
        before in prop::collection::vec(step_strategy(), 0..40),
        after in prop::collection::vec(step_strategy(), 0..80),
    ) {
        let env = SimEnv::new();
        let config = fixtures::board_config([("1_100", "Pine St")]);
        let mut app = App::new(env.clone(), &config, TripCache::new());
        app.start();
        for step in &before {
            apply(&mut app, &env, step);
        }

        app.shutdown();
        for step in &after {
            let actions = apply(&mut app, &env, step);
            prop_assert!(
                !actions.iter().any(|a| matches!(a, AppAction::Open { .. } | AppAction::Restart)),
                "{:?} after shutdown produced {:?}", step, actions
            );
        }
    }

    /// Rendering never fails and always yields some view, whatever the state.
    #[test]
    fn prop_view_is_total(
        steps in prop::collection::vec(step_strategy(), 0..60),
        width in 0usize..80,
        wall_clock in prop::option::of(0i64..2_000_000_000_000),
    ) {
        let env = SimEnv::new();
        let config = fixtures::board_config([("1_100", "Pine St"), ("1_200", "Pike St")]);
        let mut app = App::new(env.clone(), &config, TripCache::new());
        app.start();
        env.set_wall_clock_millis(wall_clock);
        for step in &steps {
            apply(&mut app, &env, step);
            let _ = app.view(width);
        }
        prop_assert_eq!(env.wall_clock_millis().is_some(), wall_clock.is_some());
    }

    /// Pages never point past the stop list and only switch once their
    /// duration has elapsed.
    #[test]
    fn prop_pagination_respects_durations(
        names in prop::collection::vec(0u8..3, 1..6),
        gaps in prop::collection::vec(0u64..10_000, 1..80),
    ) {
        let env = SimEnv::new();
        let stops = stops(&names);
        let mut engine = PaginationEngine::new();
        let mut shown_since = env.now();
        let mut duration = Duration::ZERO;

        for gap in gaps {
            env.advance(Duration::from_millis(gap));
            let now = env.now();
            match engine.tick(now, &stops) {
                PageTick::Switched(page) => {
                    prop_assert!(now - shown_since >= duration);
                    prop_assert!(page.stop_index() < stops.len());
                    shown_since = now;
                    duration = page.duration();
                },
                PageTick::Hold(page) => {
                    prop_assert!(now - shown_since < duration);
                    prop_assert!(page.stop_index() < stops.len());
                },
                PageTick::NoStops => prop_assert!(false, "stops are never empty here"),
            }
        }
    }

    /// Consecutive stops with the same name skip the name page.
    #[test]
    fn prop_repeated_name_skips_name_page(count in 2usize..6) {
        let env = SimEnv::new();
        let stops: StopRegistry =
            (0..count).map(|i| (format!("stop_{i}"), "Same Name".to_owned())).collect();
        let mut engine = PaginationEngine::new();

        engine.tick(env.now(), &stops);
        prop_assert_eq!(engine.current_page(), Page::StopName { stop_index: 0 });

        for _ in 0..count * 2 {
            env.advance(engine.current_page_duration());
            if let PageTick::Switched(Page::StopName { stop_index }) = engine.tick(env.now(), &stops) {
                prop_assert!(false, "name page shown again for stop {}", stop_index);
            }
        }
    }
}
