use ratatui::style::Color;

use crate::presenter::StatusLevel;
use crate::rename_engine::{ProcessingStatus, RenameReport};

/// Modal overlays on the main screen. Only one is open at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Help,
    /// `after_load` is set when the prompt is part of loading a series, so
    /// escaping it abandons the batch.
    YearPrompt { after_load: bool },
    Conflicts(Vec<String>),
    ForceEditConfirm(usize),
    RenameReport(RenameReport),
}

pub fn status_color(status: ProcessingStatus) -> Color {
    match status {
        ProcessingStatus::Ready => Color::Green,
        ProcessingStatus::NeedsYear => Color::Yellow,
        ProcessingStatus::Invalid => Color::Red,
        ProcessingStatus::AlreadyNormalized => Color::Gray,
        ProcessingStatus::Duplicate => Color::Magenta,
        ProcessingStatus::NotVideo => Color::DarkGray,
    }
}

pub fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::Cyan,
        StatusLevel::Success => Color::Green,
        StatusLevel::Warning => Color::Yellow,
        StatusLevel::Error => Color::Red,
    }
}
