//! Schedule row
//!
//! Places route, headsign, realtime icon, and time at the cells the render
//! pipeline computed.

use departure_app::{Row, icon::SEGMENTS};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use super::color;

/// Glyph for one realtime icon segment.
const SEGMENT_GLYPH: &str = "▮";

/// Build the line for one row.
pub fn row_line(row: &Row) -> Line<'static> {
    let mut line = Placer::default();
    line.place(0, &row.route, Style::default().fg(color(row.route_color)));
    line.place(row.headsign_x, &row.headsign, Style::default().fg(Color::White));
    if let Some(placed) = row.icon {
        // Segment 1 (innermost arc) takes the leftmost cell
        for segment in 1..=SEGMENTS {
            let style = Style::default().fg(color(placed.icon.segment_color(segment)));
            line.place(placed.x + usize::from(segment - 1), SEGMENT_GLYPH, style);
        }
    }
    line.place(row.time_x, &row.time, Style::default().fg(color(row.time_color)));
    Line::from(line.spans)
}

#[derive(Default)]
struct Placer {
    spans: Vec<Span<'static>>,
    cursor: usize,
}

impl Placer {
    /// Pad to `x` and append `text`. Text that would start left of the cursor
    /// is appended where the cursor is.
    fn place(&mut self, x: usize, text: &str, style: Style) {
        if x > self.cursor {
            self.spans.push(Span::raw(" ".repeat(x - self.cursor)));
            self.cursor = x;
        }
        self.spans.push(Span::styled(text.to_owned(), style));
        self.cursor += text.chars().count();
    }
}

#[cfg(test)]
mod tests {
    use departure_app::{
        RealtimeIcon,
        icon::{LIT_COLOR, UNLIT_COLOR},
        view::PlacedIcon,
    };
    use departure_core::Rgb;

    use super::*;

    fn realtime_row(wall_clock_millis: i64) -> Row {
        Row {
            route: "40".into(),
            route_color: Rgb::new(0xFD_B7_1A),
            headsign: "Ballard".into(),
            headsign_x: 3,
            time: "Now".into(),
            time_color: Rgb::new(0x20_FF_00),
            time_x: 17,
            icon: Some(PlacedIcon { x: 13, icon: RealtimeIcon::at(wall_clock_millis) }),
        }
    }

    fn segment_colors(line: &Line<'_>) -> Vec<Option<Color>> {
        line.spans.iter().filter(|span| span.content == SEGMENT_GLYPH).map(|span| span.style.fg).collect()
    }

    #[test]
    fn every_segment_gets_a_cell() {
        let line = row_line(&realtime_row(0));
        assert_eq!(segment_colors(&line), vec![Some(color(UNLIT_COLOR)); 3]);
    }

    #[test]
    fn outer_arc_lights_in_last_frame() {
        // 3800ms is frame 5: only segment 3 is lit
        let line = row_line(&realtime_row(3800));
        assert_eq!(
            segment_colors(&line),
            vec![Some(color(UNLIT_COLOR)), Some(color(UNLIT_COLOR)), Some(color(LIT_COLOR))]
        );
    }

    #[test]
    fn middle_frame_lights_all_segments() {
        // 3400ms is frame 3
        let line = row_line(&realtime_row(3400));
        assert_eq!(segment_colors(&line), vec![Some(color(LIT_COLOR)); 3]);
    }
}
