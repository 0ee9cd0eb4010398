//! Board rendering against ratatui's `TestBackend`.

use departure_app::{BoardView, Placeholder, RealtimeIcon, Row, view::PlacedIcon};
use departure_core::Rgb;
use departure_tui::ui;
use ratatui::{Terminal, backend::TestBackend, style::Color};

const WIDTH: u16 = 34;
const HEIGHT: u16 = 6;

fn draw(view: &BoardView) -> Terminal<TestBackend> {
    let mut terminal = Terminal::new(TestBackend::new(WIDTH, HEIGHT)).unwrap();
    terminal.draw(|frame| ui::render(frame, view, frame.area())).unwrap();
    terminal
}

fn lines(terminal: &Terminal<TestBackend>) -> Vec<String> {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|y| (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect())
        .collect()
}

fn row(route: &str, headsign: &str, time: &str, realtime: bool) -> Row {
    row_at(route, headsign, time, realtime, 0)
}

fn row_at(route: &str, headsign: &str, time: &str, realtime: bool, wall_clock_millis: i64) -> Row {
    let inner = usize::from(WIDTH - 2);
    let time_x = inner - time.len();
    let icon = realtime.then(|| PlacedIcon { x: time_x - 4, icon: RealtimeIcon::at(wall_clock_millis) });
    Row {
        route: route.to_owned(),
        route_color: Rgb::new(0xFD_B7_1A),
        headsign: headsign.to_owned(),
        headsign_x: route.len() + 1,
        time: time.to_owned(),
        time_color: Rgb::new(0x20_FF_00),
        time_x,
        icon,
    }
}

#[test]
fn placeholder_is_centered() {
    let terminal = draw(&BoardView::Placeholder(Placeholder::Loading));
    let lines = lines(&terminal);

    assert!(lines[0].contains("Departures"));
    let text_row = lines.iter().position(|l| l.contains("Loading...")).unwrap();
    assert!((2..=3).contains(&text_row), "{lines:#?}");
}

#[test]
fn error_placeholder_uses_error_background() {
    let terminal = draw(&BoardView::Placeholder(Placeholder::Error));
    let buffer = terminal.backend().buffer();
    let lines = lines(&terminal);
    let y = lines.iter().position(|l| l.contains("Error loading schedule")).unwrap();
    let x = lines[y].chars().position(|c| c == 'E').unwrap();

    let x = u16::try_from(x).unwrap();
    let y = u16::try_from(y).unwrap();
    assert_eq!(buffer[(x, y)].bg, Color::Rgb(0xFE, 0x4C, 0x5C));
}

#[test]
fn stop_name_shows_subtitle() {
    let terminal = draw(&BoardView::StopName {
        name: "Pine St".into(),
        subtitle: "Upcoming Departures",
    });
    let text = lines(&terminal).join("\n");

    assert!(text.contains("Pine St"));
    assert!(text.contains("Upcoming Departures"));
}

#[test]
fn schedule_rows_land_at_their_cells() {
    let view = BoardView::Schedule {
        rows: vec![row("44", "Downtown", "5min", false), row("40", "Ballard", "Now", true)],
    };
    let terminal = draw(&view);
    let lines = lines(&terminal);

    // Row cells are offset by the left border
    let first: String = lines[1].chars().skip(1).take(usize::from(WIDTH - 2)).collect();
    assert!(first.starts_with("44 Downtown"), "{first:?}");
    assert!(first.ends_with("5min"), "{first:?}");

    let second: String = lines[2].chars().skip(1).take(usize::from(WIDTH - 2)).collect();
    assert!(second.starts_with("40 Ballard"), "{second:?}");
    assert!(second.ends_with("▮▮▮ Now"), "{second:?}");
}

#[test]
fn route_label_keeps_route_color() {
    let terminal = draw(&BoardView::Schedule { rows: vec![row("44", "Downtown", "5min", false)] });
    let buffer = terminal.backend().buffer();

    assert_eq!(buffer[(1, 1)].fg, Color::Rgb(0xFD, 0xB7, 0x1A));
    assert_eq!(buffer[(1, 1)].symbol(), "4");
}

#[test]
fn realtime_icon_paints_outer_arc() {
    // Frame 5 lights only the outer arc, drawn in the rightmost icon cell
    let view = BoardView::Schedule { rows: vec![row_at("40", "Ballard", "Now", true, 3800)] };
    let terminal = draw(&view);
    let buffer = terminal.backend().buffer();

    let time_x = WIDTH - 1 - 3;
    let icon_x = time_x - 4;
    let colors: Vec<Color> = (icon_x..icon_x + 3).map(|x| buffer[(x, 1)].fg).collect();
    assert_eq!(
        colors,
        [Color::Rgb(0x00, 0xA7, 0x00), Color::Rgb(0x00, 0xA7, 0x00), Color::Rgb(0x20, 0xFF, 0x00)]
    );
    assert!((icon_x..icon_x + 3).all(|x| buffer[(x, 1)].symbol() == "▮"));
}
