//! Terminal front-end. All batch changes go through the
//! [`AppPresenter`](crate::presenter::AppPresenter) owned by [`App`], on the
//! event loop's task.

mod app;
mod events;
mod models;
mod rendering;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub use app::App;
pub use events::{handle_key, run_tui};
pub use models::Popup;

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
