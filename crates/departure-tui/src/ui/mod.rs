//! Board rendering
//!
//! Paints a [`BoardView`] into a ratatui frame. Pure: the view already holds
//! every position and color, so this module only maps cells and colors onto
//! widgets.

mod row;

use departure_app::{BoardView, Placeholder, view::STOP_NAME_COLOR};
use departure_core::Rgb;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

pub use row::row_line;

/// Board title.
const TITLE: &str = " Departures ";

/// Render the whole board into `area`.
pub fn render(frame: &mut Frame, view: &BoardView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(TITLE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match view {
        BoardView::Placeholder(placeholder) => render_placeholder(frame, *placeholder, inner),
        BoardView::StopName { name, subtitle } => render_stop_name(frame, name, subtitle, inner),
        BoardView::Schedule { rows } => {
            let lines: Vec<Line> = rows.iter().map(row_line).collect();
            frame.render_widget(Paragraph::new(lines), inner);
        },
    }
}

/// Width of the board area inside the border.
pub fn board_width(area: Rect) -> usize {
    usize::from(area.width.saturating_sub(2))
}

/// Terminal color for a board color.
pub fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.red(), rgb.green(), rgb.blue())
}

fn render_placeholder(frame: &mut Frame, placeholder: Placeholder, area: Rect) {
    let style = Style::default().fg(Color::White).bg(color(placeholder.color()));
    let paragraph = Paragraph::new(Line::styled(placeholder.text(), style)).alignment(Alignment::Center);
    frame.render_widget(paragraph, centered(area, 1));
}

fn render_stop_name(frame: &mut Frame, name: &str, subtitle: &str, area: Rect) {
    let lines = vec![
        Line::styled(name.to_owned(), Style::default().fg(color(STOP_NAME_COLOR)).add_modifier(Modifier::BOLD)),
        Line::styled(subtitle.to_owned(), Style::default().fg(Color::White)),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered(area, 2));
}

/// Vertically center `height` lines in `area`.
fn centered(area: Rect, height: u16) -> Rect {
    let [_, middle, _] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(height), Constraint::Fill(1)])
            .areas(area);
    middle
}
