//! Time-until text for schedule rows.

use departure_core::UnitDisplay;

/// Text for a trip at `target` (unix seconds) as seen at `now`.
///
/// Returns an empty string when there is no trusted time.
///
/// | time until     | long    | short  | none   |
/// |----------------|---------|--------|--------|
/// | under 30s      | `Now`   | `Now`  | `Now`  |
/// | 30s to 59s     | `0min`  | `0m`   | `0`    |
/// | 1 to 59 min    | `5min`  | `5m`   | `5`    |
/// | an hour or more| `1h2m`  | `1h2m` | `1:02` |
pub fn from_now(target: i64, now: Option<i64>, units: UnitDisplay) -> String {
    let Some(now) = now else {
        return String::new();
    };

    let diff = target.saturating_sub(now);
    if diff < 30 {
        return "Now".to_owned();
    }
    if diff < 60 {
        return minutes(0, units);
    }

    let total_minutes = diff / 60;
    if total_minutes < 60 {
        return minutes(total_minutes, units);
    }

    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
    match units {
        UnitDisplay::Long | UnitDisplay::Short => format!("{hours}h{minutes}m"),
        UnitDisplay::None => format!("{hours}:{minutes:02}"),
    }
}

fn minutes(count: i64, units: UnitDisplay) -> String {
    match units {
        UnitDisplay::Long => format!("{count}min"),
        UnitDisplay::Short => format!("{count}m"),
        UnitDisplay::None => count.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn at(diff: i64, units: UnitDisplay) -> String {
        from_now(NOW + diff, Some(NOW), units)
    }

    #[test]
    fn imminent_and_past_trips_are_now() {
        assert_eq!(at(10, UnitDisplay::Long), "Now");
        assert_eq!(at(29, UnitDisplay::None), "Now");
        assert_eq!(at(-300, UnitDisplay::Short), "Now");
    }

    #[test]
    fn under_a_minute_is_zero() {
        assert_eq!(at(45, UnitDisplay::Long), "0min");
        assert_eq!(at(30, UnitDisplay::Short), "0m");
        assert_eq!(at(59, UnitDisplay::None), "0");
    }

    #[test]
    fn minutes_round_down() {
        assert_eq!(at(125, UnitDisplay::Short), "2m");
        assert_eq!(at(60, UnitDisplay::Long), "1min");
        assert_eq!(at(3599, UnitDisplay::None), "59");
    }

    #[test]
    fn hours_and_minutes() {
        assert_eq!(at(3725, UnitDisplay::None), "1:02");
        assert_eq!(at(3725, UnitDisplay::Long), "1h2m");
        assert_eq!(at(7200, UnitDisplay::Short), "2h0m");
    }

    #[test]
    fn extreme_feed_times_saturate() {
        assert_eq!(from_now(i64::MIN, Some(NOW), UnitDisplay::Long), "Now");
        assert_eq!(from_now(NOW, Some(i64::MIN), UnitDisplay::Long), format_far_future());
        let far = from_now(i64::MAX, Some(NOW), UnitDisplay::None);
        assert!(far.ends_with(&format!(":{:02}", ((i64::MAX - NOW) / 60) % 60)), "{far}");
    }

    fn format_far_future() -> String {
        let minutes = i64::MAX / 60;
        format!("{}h{}m", minutes / 60, minutes % 60)
    }

    #[test]
    fn no_trusted_time_is_empty() {
        assert_eq!(from_now(NOW, None, UnitDisplay::Long), "");
    }
}
