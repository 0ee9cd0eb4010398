//! Realtime indicator animation.
//!
//! Three nested arcs that light up in a wave. The cycle is a 3s idle frame
//! followed by five 200ms animation frames, keyed to wall-clock time so every
//! row animates in step.

use departure_core::Rgb;

/// Time spent on the idle frame each cycle, in milliseconds.
pub const IDLE_FRAME_MS: i64 = 3000;

/// Duration of one animation frame, in milliseconds.
pub const ANIMATION_FRAME_MS: i64 = 200;

/// Number of animation frames after the idle frame.
pub const ANIMATION_FRAMES: i64 = 5;

/// Full cycle length, in milliseconds.
pub const CYCLE_MS: i64 = IDLE_FRAME_MS + ANIMATION_FRAMES * ANIMATION_FRAME_MS;

/// Color of a lit segment.
pub const LIT_COLOR: Rgb = Rgb::new(0x20_FF_00);

/// Color of an unlit segment.
pub const UNLIT_COLOR: Rgb = Rgb::new(0x00_A7_00);

/// Number of arc segments.
pub const SEGMENTS: u8 = 3;

/// Pixel layout of the icon; each cell holds the segment it belongs to, or 0
/// for background. Segment 1 is the innermost arc.
pub const PIXEL_MASK: [[u8; 6]; 6] = [
    [0, 0, 0, 3, 3, 3],
    [0, 0, 3, 0, 0, 0],
    [0, 3, 0, 0, 2, 2],
    [3, 0, 0, 2, 0, 0],
    [3, 0, 2, 0, 0, 1],
    [3, 0, 2, 0, 1, 1],
];

/// One frame of the realtime indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeIcon {
    frame: u8,
}

impl RealtimeIcon {
    /// Frame shown at `wall_clock_millis`.
    pub fn at(wall_clock_millis: i64) -> Self {
        let cycle_time = wall_clock_millis.rem_euclid(CYCLE_MS);
        let frame = if cycle_time < IDLE_FRAME_MS {
            0
        } else {
            1 + (cycle_time - IDLE_FRAME_MS) / ANIMATION_FRAME_MS
        };
        Self { frame: frame as u8 }
    }

    /// Frame number: 0 while idle, then 1 to 5.
    pub fn frame(self) -> u8 {
        self.frame
    }

    /// Whether `segment` (1 to 3) is lit. Segment n is lit in frames n to
    /// n + 2.
    pub fn is_lit(self, segment: u8) -> bool {
        (1..=SEGMENTS).contains(&segment) && (segment..=segment + 2).contains(&self.frame)
    }

    /// Color of `segment` in this frame.
    pub fn segment_color(self, segment: u8) -> Rgb {
        if self.is_lit(segment) { LIT_COLOR } else { UNLIT_COLOR }
    }

    /// Per-pixel colors for pixel displays; `None` is background.
    pub fn pixels(self) -> [[Option<Rgb>; 6]; 6] {
        PIXEL_MASK.map(|row| row.map(|segment| (segment != 0).then(|| self.segment_color(segment))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_for_three_seconds() {
        assert_eq!(RealtimeIcon::at(0).frame(), 0);
        assert_eq!(RealtimeIcon::at(2999).frame(), 0);
        assert!((1..=SEGMENTS).all(|s| !RealtimeIcon::at(0).is_lit(s)));
    }

    #[test]
    fn animation_frames_advance_every_200ms() {
        let frames: Vec<u8> = (0..5).map(|i| RealtimeIcon::at(3000 + i * 200).frame()).collect();
        assert_eq!(frames, [1, 2, 3, 4, 5]);
        assert_eq!(RealtimeIcon::at(CYCLE_MS).frame(), 0);
    }

    #[test]
    fn segments_light_in_a_wave() {
        let lit = |frame_start: i64| {
            let icon = RealtimeIcon::at(frame_start);
            (1..=SEGMENTS).map(|s| icon.is_lit(s)).collect::<Vec<_>>()
        };
        assert_eq!(lit(3000), [true, false, false]);
        assert_eq!(lit(3200), [true, true, false]);
        assert_eq!(lit(3400), [true, true, true]);
        assert_eq!(lit(3600), [false, true, true]);
        assert_eq!(lit(3800), [false, false, true]);
    }

    #[test]
    fn negative_time_wraps_into_cycle() {
        assert_eq!(RealtimeIcon::at(-200).frame(), 5);
    }

    #[test]
    fn pixels_follow_mask() {
        let pixels = RealtimeIcon::at(3000).pixels();
        assert_eq!(pixels[0][0], None);
        assert_eq!(pixels[5][5], Some(LIT_COLOR));
        assert_eq!(pixels[0][5], Some(UNLIT_COLOR));
    }
}
