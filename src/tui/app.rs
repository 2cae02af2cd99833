use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::widgets::{ListState, ScrollbarState};
use tracing::{debug, error};

use crate::analyzer::MediaType;
use crate::media_files::collect_paths;
use crate::presenter::{AppPresenter, ApplyOutcome, EditOutcome, StatusLevel, StatusMessage};
use crate::rename_engine::{ItemId, MediaItem};

use super::models::Popup;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

pub struct App {
    pub presenter: AppPresenter,
    pub list_state: ListState,
    pub scroll_state: ScrollbarState,
    pub show_preview: bool,
    pub popup: Option<Popup>,
    pub setup_mode: MediaType,
    pub path_input: String,
    pub edit_buffer: Option<String>,
    pub year_input: String,
    pub status_message: Option<StatusMessage>,
    pub status_message_time: Option<Instant>,
    pub should_quit: bool,
}

impl App {
    pub fn new(presenter: AppPresenter) -> Self {
        Self {
            presenter,
            list_state: ListState::default(),
            scroll_state: ScrollbarState::default(),
            show_preview: true,
            popup: None,
            setup_mode: MediaType::Film,
            path_input: String::new(),
            edit_buffer: None,
            year_input: String::new(),
            status_message: None,
            status_message_time: None,
            should_quit: false,
        }
    }

    pub fn with_input(presenter: AppPresenter, mode: MediaType, path_input: String) -> Self {
        let mut app = Self::new(presenter);
        app.setup_mode = mode;
        app.path_input = path_input;
        app
    }

    pub fn is_setup(&self) -> bool {
        self.presenter.session().is_idle()
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some()
    }

    pub fn items(&self) -> &[MediaItem] {
        self.presenter.items()
    }

    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn selected_item(&self) -> Option<&MediaItem> {
        self.selected().and_then(|row| self.presenter.processor().item(row))
    }

    pub fn toggle_setup_mode(&mut self) {
        self.setup_mode = match self.setup_mode {
            MediaType::Film => MediaType::Series,
            MediaType::Series => MediaType::Film,
        };
    }

    /// Scans what was typed on the setup screen and loads it.
    pub async fn load_from_input(&mut self) -> Result<()> {
        let input = self.path_input.trim();
        if input.is_empty() {
            self.set_status_message(StatusMessage::error("Enter a file or folder path"));
            return Ok(());
        }
        let paths = collect_paths(vec![PathBuf::from(input)]).await?;
        self.load(paths);
        Ok(())
    }

    pub fn load(&mut self, paths: Vec<PathBuf>) {
        match self.presenter.load_files(self.setup_mode, &paths) {
            Ok(summary) => {
                self.select_row(Some(0));
                self.show_presenter_status();
                if summary.needs_year {
                    self.year_input.clear();
                    self.popup = Some(Popup::YearPrompt { after_load: true });
                }
            }
            Err(e) => {
                error!("Load failed: {:#}", e);
                self.set_status_message(StatusMessage::error(e.to_string()));
            }
        }
    }

    pub fn next(&mut self) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select_row(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select_row(Some(i));
    }

    pub fn toggle_help(&mut self) {
        self.popup = match self.popup {
            Some(Popup::Help) => None,
            _ => Some(Popup::Help),
        };
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    pub fn close_popup(&mut self) {
        self.popup = None;
    }

    pub fn begin_edit(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        match self.presenter.begin_edit(row) {
            Ok(Some(text)) => self.edit_buffer = Some(text),
            Ok(None) => {
                let hint = if self.presenter.can_force_edit(row) {
                    "Already normalized - press f to force edit"
                } else {
                    "This file cannot be edited"
                };
                self.set_status_message(StatusMessage::new(hint, StatusLevel::Warning));
            }
            Err(e) => self.set_status_message(StatusMessage::error(e.to_string())),
        }
    }

    pub fn edit_push(&mut self, c: char) {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            buffer.push(c);
        }
    }

    pub fn edit_backspace(&mut self) {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            buffer.pop();
        }
    }

    pub fn save_edit(&mut self) {
        let Some(text) = self.edit_buffer.take() else {
            return;
        };
        match self.presenter.save_edit(&text) {
            Ok(Some(EditOutcome::Saved { propagated, .. })) => {
                debug!("Edit saved, {} episodes propagated", propagated.len());
            }
            Ok(Some(EditOutcome::Discarded { row, reason })) => {
                debug!("Edit of row {} discarded: {:?}", row, reason);
            }
            Ok(None) => {}
            Err(e) => error!("Save failed: {:#}", e),
        }
        self.show_presenter_status();
    }

    pub fn discard_edit(&mut self) {
        self.edit_buffer = None;
        if self.presenter.discard_edit() {
            self.show_presenter_status();
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        if !self.presenter.can_remove_file(row) {
            self.set_status_message(StatusMessage::new(
                "Only invalid, non-video, year-less or duplicate files can be removed",
                StatusLevel::Warning,
            ));
            return;
        }
        let next_id = self
            .presenter
            .processor()
            .item(row + 1)
            .map(MediaItem::id);
        if self.presenter.remove_file(row) {
            self.restore_selection(next_id, row);
            self.show_presenter_status();
        }
    }

    pub fn request_force_edit(&mut self) {
        if let Some(row) = self.selected() {
            if self.presenter.can_force_edit(row) {
                self.popup = Some(Popup::ForceEditConfirm(row));
            }
        }
    }

    pub fn confirm_force_edit(&mut self, row: usize) {
        self.popup = None;
        match self.presenter.force_edit(row) {
            Ok(_) => self.show_presenter_status(),
            Err(e) => self.set_status_message(StatusMessage::error(e.to_string())),
        }
    }

    /// Films get their year by editing, so only series batches reopen the prompt.
    pub fn open_year_prompt(&mut self) {
        let processor = self.presenter.processor();
        if processor.mode() == Some(MediaType::Series) && processor.needs_year_input() {
            self.year_input.clear();
            self.popup = Some(Popup::YearPrompt { after_load: false });
        }
    }

    pub fn year_push(&mut self, c: char) {
        if c.is_ascii_digit() && self.year_input.len() < 4 {
            self.year_input.push(c);
        }
    }

    pub fn submit_year(&mut self) {
        match self.presenter.apply_series_year(&self.year_input) {
            Ok(_) => {
                self.popup = None;
                self.show_presenter_status();
            }
            Err(e) => self.set_status_message(StatusMessage::error(e.to_string())),
        }
    }

    /// Escaping the prompt right after a series load abandons the batch.
    pub fn cancel_year_prompt(&mut self) {
        self.popup = None;
        self.presenter.cancel_series_load();
        self.list_state.select(None);
        self.show_presenter_status();
    }

    pub fn apply(&mut self) {
        let selected_id = self.selected_item().map(MediaItem::id);
        match self.presenter.apply_renames() {
            ApplyOutcome::NotAllowed => self.set_status_message(StatusMessage::new(
                "Nothing ready to rename",
                StatusLevel::Warning,
            )),
            ApplyOutcome::Conflicts(names) => {
                self.show_presenter_status();
                self.popup = Some(Popup::Conflicts(names));
            }
            ApplyOutcome::Completed(report) => {
                let fallback = self.selected().unwrap_or(0);
                self.restore_selection(selected_id, fallback);
                self.show_presenter_status();
                self.popup = Some(Popup::RenameReport(report));
            }
        }
    }

    pub fn start_over(&mut self) {
        self.edit_buffer = None;
        self.popup = None;
        self.presenter.reset();
        self.list_state.select(None);
        self.show_presenter_status();
    }

    pub fn set_status_message(&mut self, message: StatusMessage) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message_if_expired(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// The transient message if one is showing, the presenter's otherwise.
    pub fn current_status(&self) -> &StatusMessage {
        self.status_message
            .as_ref()
            .unwrap_or_else(|| self.presenter.status())
    }

    fn show_presenter_status(&mut self) {
        self.set_status_message(self.presenter.status().clone());
    }

    fn select_row(&mut self, row: Option<usize>) {
        let len = self.items().len();
        let row = row.filter(|_| len > 0).map(|r| r.min(len - 1));
        self.list_state.select(row);
        self.scroll_state = self
            .scroll_state
            .content_length(len)
            .position(row.unwrap_or(0));
        self.presenter.select(row);
    }

    /// Keeps the cursor on the same item after rows shift, or as close to
    /// `fallback_row` as the batch allows.
    fn restore_selection(&mut self, id: Option<ItemId>, fallback_row: usize) {
        let row = id
            .and_then(|id| self.presenter.processor().row_of(id))
            .unwrap_or(fallback_row);
        self.select_row(Some(row));
    }
}
