//! Coordinates the batch and the session for a front-end: every user action
//! goes through here, gets checked against the session, and leaves behind a
//! status message.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::analyzer::{MediaType, split_extension};
use crate::media_files::{LocalFiles, MediaFiles};
use crate::patterns::NamingRules;
use crate::rename_engine::{BatchProcessor, MediaItem, ProcessingStatus, RenameReport};
use crate::session::SessionStateMachine;

const EDIT_TRIM: &[char] = &[' ', '.', '-', '_'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn for_status(status: ProcessingStatus) -> Self {
        match status {
            ProcessingStatus::Duplicate | ProcessingStatus::Invalid | ProcessingStatus::NotVideo => {
                StatusLevel::Error
            }
            ProcessingStatus::NeedsYear => StatusLevel::Warning,
            ProcessingStatus::Ready => StatusLevel::Success,
            ProcessingStatus::AlreadyNormalized => StatusLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Info)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, StatusLevel::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    EpisodeChanged {
        original: String,
        edited: Option<String>,
    },
    EmptyTitle,
    InvalidYear(String),
    MissingYear,
    Cancelled,
}

impl DiscardReason {
    pub fn message(&self, rules: &NamingRules) -> String {
        match self {
            DiscardReason::EpisodeChanged { .. } => {
                "Cannot change episode number (E##). Edit discarded.".to_string()
            }
            DiscardReason::EmptyTitle => "Series title cannot be empty. Edit discarded.".to_string(),
            DiscardReason::InvalidYear(year) => format!(
                "Invalid year '{}'. Must be between {}-{}. Edit discarded.",
                year,
                rules.min_year(),
                rules.max_year()
            ),
            DiscardReason::MissingYear => {
                "Series title must include a valid year (YYYY). Edit discarded.".to_string()
            }
            DiscardReason::Cancelled => "Edit discarded".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Saved { row: usize, propagated: Vec<usize> },
    Discarded { row: usize, reason: DiscardReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub mode: MediaType,
    pub file_count: usize,
    /// Series only: the caller should ask for a year before going on.
    pub needs_year: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    NotAllowed,
    Conflicts(Vec<String>),
    Completed(RenameReport),
}

pub struct AppPresenter<F: MediaFiles = LocalFiles> {
    processor: BatchProcessor<F>,
    session: SessionStateMachine,
    status: StatusMessage,
}

impl AppPresenter<LocalFiles> {
    pub fn new(rules: NamingRules) -> Self {
        Self::with_files(rules, LocalFiles)
    }
}

impl<F: MediaFiles> AppPresenter<F> {
    pub fn with_files(rules: NamingRules, files: F) -> Self {
        Self {
            processor: BatchProcessor::with_files(rules, files),
            session: SessionStateMachine::new(),
            status: StatusMessage::info("Ready to process files"),
        }
    }

    pub fn processor(&self) -> &BatchProcessor<F> {
        &self.processor
    }

    pub fn session(&self) -> &SessionStateMachine {
        &self.session
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn items(&self) -> &[MediaItem] {
        self.processor.items()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_editing()
    }

    pub fn is_mode_locked(&self) -> bool {
        self.session.is_mode_locked()
    }

    pub fn file_count(&self) -> usize {
        self.session.file_count()
    }

    pub fn load_files<P: AsRef<Path>>(&mut self, mode: MediaType, paths: &[P]) -> Result<LoadSummary> {
        if self.session.is_mode_locked() {
            bail!("A batch is already loaded; start over to load another");
        }
        if paths.is_empty() {
            bail!("No files to load");
        }

        self.processor.set_mode(mode);
        let file_count = self.processor.process_files(paths)?.len();
        self.session.start_session(mode, file_count)?;

        let needs_year = mode == MediaType::Series && self.processor.needs_year_input();
        self.status = if needs_year {
            StatusMessage::new("Enter the series year to continue", StatusLevel::Warning)
        } else {
            self.statistics_message()
        };

        info!("Loaded {} files in {} mode (needs year: {})", file_count, mode, needs_year);
        Ok(LoadSummary {
            mode,
            file_count,
            needs_year,
        })
    }

    pub fn select(&mut self, row: Option<usize>) {
        self.session.set_selection(row);
        self.status = match row.and_then(|r| self.status_for_item(r)) {
            Some(message) => message,
            None => self.statistics_message(),
        };
    }

    pub fn begin_edit(&mut self, row: usize) -> Result<Option<String>> {
        let item = self
            .processor
            .item(row)
            .with_context(|| format!("No item at row {}", row))?;
        if !item.status().is_editable() {
            debug!("Row {} is not editable ({})", row, item.status());
            return Ok(None);
        }

        let (original_base, original_ext) = split_extension(item.original_name());
        let value = match item.status() {
            ProcessingStatus::Invalid => original_base.to_string(),
            _ => split_extension(item.new_name()).0.to_string(),
        };
        let extension = original_ext.to_lowercase();

        self.session.start_editing(row, value.clone(), extension)?;
        Ok(Some(value))
    }

    /// Saves the edited text for the row being edited. An edit that would
    /// leave a series item worse off is rolled back and reported as
    /// [`EditOutcome::Discarded`]. Returns `None` when no edit is active.
    pub fn save_edit(&mut self, edited_text: &str) -> Result<Option<EditOutcome>> {
        if !self.session.is_editing() {
            return Ok(None);
        }

        match self.commit_edit(edited_text) {
            Ok(outcome) => {
                self.status = match &outcome {
                    EditOutcome::Saved { row, .. } => self
                        .status_for_item(*row)
                        .unwrap_or_else(|| self.statistics_message()),
                    EditOutcome::Discarded { reason, .. } => {
                        StatusMessage::error(reason.message(self.processor.analyzer().rules()))
                    }
                };
                Ok(Some(outcome))
            }
            Err(e) => {
                warn!("Error during save edit: {:#}", e);
                self.session.complete_editing(false);
                self.status = StatusMessage::error(format!("Error processing edit: {}", e));
                Err(e)
            }
        }
    }

    pub fn discard_edit(&mut self) -> bool {
        match self.session.complete_editing(false) {
            Some(snapshot) => {
                self.status = StatusMessage::info(DiscardReason::Cancelled.message(self.processor.analyzer().rules()));
                debug!("Discarded edit of row {}", snapshot.row);
                true
            }
            None => false,
        }
    }

    /// Only items that cannot be renamed as they stand may be removed.
    pub fn can_remove_file(&self, row: usize) -> bool {
        self.session.can_remove_file()
            && self.processor.item(row).is_some_and(|item| {
                matches!(
                    item.status(),
                    ProcessingStatus::Invalid
                        | ProcessingStatus::NotVideo
                        | ProcessingStatus::NeedsYear
                        | ProcessingStatus::Duplicate
                )
            })
    }

    pub fn remove_file(&mut self, row: usize) -> bool {
        if !self.can_remove_file(row) || !self.processor.remove_file(row) {
            return false;
        }

        let remaining = self.processor.len();
        self.session.update_file_count(remaining);
        if remaining == 0 {
            self.reset();
        } else {
            self.status = self.statistics_message();
        }
        true
    }

    pub fn can_force_edit(&self, row: usize) -> bool {
        !self.session.is_editing()
            && self
                .processor
                .item(row)
                .is_some_and(|item| item.status() == ProcessingStatus::AlreadyNormalized)
    }

    pub fn force_edit_confirmation(&self) -> &'static str {
        match self.processor.mode() {
            Some(MediaType::Series) => {
                "Force edit will change ALL already normalized episodes in this series to READY, \
                 allowing you to edit them. This may create duplicate filenames. Proceed?"
            }
            _ => {
                "Force edit will change this file from ALREADY NORMALIZED to READY, \
                 allowing you to edit it. This may create duplicate filenames. Proceed?"
            }
        }
    }

    pub fn force_edit(&mut self, row: usize) -> Result<Vec<usize>> {
        if !self.can_force_edit(row) {
            return Ok(Vec::new());
        }
        let modified = self.processor.force_edit_file(row)?;
        if !modified.is_empty() {
            let text = match self.processor.mode() {
                Some(MediaType::Series) => {
                    format!("{} file(s) changed to READY - you can now edit them", modified.len())
                }
                _ => "File status changed to READY - you can now edit it".to_string(),
            };
            self.status = StatusMessage::info(text);
        }
        Ok(modified)
    }

    pub fn apply_series_year(&mut self, year: &str) -> Result<usize> {
        let year = year.trim();
        let analyzer = self.processor.analyzer();
        if !analyzer.validate_year(year) {
            bail!(
                "Invalid year '{}'. Must be between {}-{}",
                year,
                analyzer.rules().min_year(),
                analyzer.rules().max_year()
            );
        }
        let updated = self.processor.apply_series_year(year);
        self.status = self.statistics_message();
        Ok(updated)
    }

    pub fn cancel_series_load(&mut self) {
        info!("Cancelling series load");
        self.processor.clear();
        self.session.reset();
        self.status = StatusMessage::info("Series load cancelled");
    }

    pub fn can_apply_renames(&self) -> bool {
        self.session.can_apply_changes() && self.processor.has_ready_files()
    }

    pub fn apply_renames(&mut self) -> ApplyOutcome {
        if !self.can_apply_renames() {
            return ApplyOutcome::NotAllowed;
        }

        let conflicts = self.processor.check_target_conflicts();
        if !conflicts.is_empty() {
            warn!("Apply blocked by {} existing targets", conflicts.len());
            self.status = StatusMessage::error(format!(
                "{} target file(s) already exist: {}",
                conflicts.len(),
                conflicts.join(", ")
            ));
            return ApplyOutcome::Conflicts(conflicts);
        }

        let report = self.processor.apply_renames();
        let remaining = self.processor.len();
        self.session.update_file_count(remaining);
        if remaining == 0 {
            self.reset();
        }

        self.status = if report.all_succeeded() {
            StatusMessage::new(
                format!("Renamed {} of {} files", report.succeeded, report.attempted),
                StatusLevel::Success,
            )
        } else {
            StatusMessage::new(
                format!(
                    "Renamed {} of {} files ({} errors)",
                    report.succeeded,
                    report.attempted,
                    report.errors.len()
                ),
                StatusLevel::Warning,
            )
        };
        ApplyOutcome::Completed(report)
    }

    pub fn reset(&mut self) {
        self.processor.clear();
        self.session.reset();
        self.status = StatusMessage::info("Ready to process files");
    }

    pub fn status_for_item(&self, row: usize) -> Option<StatusMessage> {
        let item = self.processor.item(row)?;
        let level = StatusLevel::for_status(item.status());
        let text = match item.status() {
            ProcessingStatus::Ready => format!("Ready to rename: {}", item.new_name()),
            ProcessingStatus::NeedsYear => {
                "Missing year - Add a 4-digit year (e.g., 2025) to normalize".to_string()
            }
            ProcessingStatus::Duplicate => {
                "Duplicate name - This filename conflicts with another file".to_string()
            }
            ProcessingStatus::Invalid => item.error_message().unwrap_or("Invalid format").to_string(),
            ProcessingStatus::AlreadyNormalized => {
                format!("Already normalized: {} - Will be skipped", item.original_name())
            }
            ProcessingStatus::NotVideo => format!("Not a video file: {}", item.original_name()),
        };
        Some(StatusMessage::new(text, level))
    }

    pub fn statistics_message(&self) -> StatusMessage {
        let stats = self.processor.get_statistics();
        let total: usize = stats.values().sum();

        if total == 0 {
            return StatusMessage::info("Ready to process files");
        }
        if stats.get(&ProcessingStatus::AlreadyNormalized) == Some(&total) {
            return StatusMessage::info("All files are already normalized. Nothing to do.");
        }

        let mut active: Vec<(ProcessingStatus, usize)> = stats.into_iter().filter(|(_, n)| *n > 0).collect();
        active.sort_by_key(|(status, _)| status.priority());

        let mut text = active
            .iter()
            .map(|(status, count)| format!("{}: {}", status.summary_label(), count))
            .collect::<Vec<_>>()
            .join(" | ");

        let most_critical = active[0].0;
        if let Some(hint) = most_critical.action_hint() {
            text.push_str(" • ");
            text.push_str(hint);
        }
        StatusMessage::new(text, StatusLevel::for_status(most_critical))
    }

    fn commit_edit(&mut self, edited_text: &str) -> Result<EditOutcome> {
        let snapshot = self
            .session
            .editing_snapshot()
            .cloned()
            .context("No edit in progress")?;
        let row = snapshot.row;
        let mode = self.processor.mode().context("Processing mode is not set")?;
        let cleaned = self.clean_placeholder_text(edited_text);

        if mode == MediaType::Series {
            // Only guard an episode number the item actually had.
            if let Some(original) = self.episode_number(&snapshot.original_value) {
                let edited = self.episode_number(&cleaned);
                if edited.as_deref() != Some(original.as_str()) {
                    warn!("Episode number changed from {} to {:?}, discarding", original, edited);
                    return Ok(self.discard_unsaved(row, DiscardReason::EpisodeChanged { original, edited }));
                }
            }

            // The analyzer drops years out of range, so check what was typed.
            let typed_year = self.processor.analyzer().rules().parenthesized_year(&cleaned);
            if let Some(year) = typed_year.filter(|y| !self.processor.analyzer().validate_year(y)) {
                let reason = DiscardReason::InvalidYear(year.to_string());
                warn!("Series edit has an invalid year ({}), discarding", year);
                return Ok(self.discard_unsaved(row, reason));
            }
        }

        let before = self
            .processor
            .item(row)
            .cloned()
            .with_context(|| format!("No item at row {}", row))?;
        let reconstructed = format!("{}{}", cleaned, snapshot.original_extension);
        let new_name = self
            .processor
            .reprocess_edited_file(row, &reconstructed)?
            .new_name()
            .to_string();

        if mode == MediaType::Series {
            if let Some(reason) = self.series_edit_violation(&new_name) {
                warn!("Series edit rejected ({:?}), restoring row {}", reason, row);
                self.processor.restore_item(row, before)?;
                return Ok(self.discard_unsaved(row, reason));
            }
        }

        self.processor.update_duplicate_status();
        let (base_name, _) = split_extension(&new_name);
        let propagated = self.processor.propagate_series_edit(row, base_name)?;
        if !propagated.is_empty() {
            info!("Series propagation updated {} episodes", propagated.len());
        }

        self.session.complete_editing(true);
        Ok(EditOutcome::Saved { row, propagated })
    }

    fn discard_unsaved(&mut self, row: usize, reason: DiscardReason) -> EditOutcome {
        self.session.complete_editing(false);
        EditOutcome::Discarded { row, reason }
    }

    fn series_edit_violation(&self, new_name: &str) -> Option<DiscardReason> {
        let rules = self.processor.analyzer().rules();

        if let Some(title) = rules.title_before_episode(new_name) {
            if rules.strip_parenthesized_years(title).is_empty() {
                return Some(DiscardReason::EmptyTitle);
            }
        }

        if rules.parenthesized_year(new_name).is_none() {
            return Some(DiscardReason::MissingYear);
        }
        None
    }

    fn clean_placeholder_text(&self, text: &str) -> String {
        let rules = self.processor.analyzer().rules();
        let placeholder = rules.placeholder();
        let cleaned = text
            .replace(&format!("({})", placeholder), "")
            .replace(placeholder, "");
        rules
            .collapse_whitespace(cleaned.trim())
            .trim_matches(EDIT_TRIM)
            .to_string()
    }

    fn episode_number(&self, text: &str) -> Option<String> {
        self.processor
            .analyzer()
            .rules()
            .first_episode_token(text)
            .map(|ep| format!("E{:02}", ep.episode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter() -> AppPresenter {
        AppPresenter::new(NamingRules::new().unwrap().with_max_year(2024))
    }

    #[test]
    fn test_clean_placeholder_text() {
        let presenter = presenter();
        assert_eq!(
            presenter.clean_placeholder_text("show (Set the correct year) - S01E01 - pilot"),
            "show - S01E01 - pilot"
        );
        assert_eq!(
            presenter.clean_placeholder_text("  Title Set the correct year -_ "),
            "Title"
        );
    }

    #[test]
    fn test_episode_number_in_both_forms() {
        let presenter = presenter();
        assert_eq!(
            presenter.episode_number("Breaking Bad (2008) - S01E03 - Pilot").as_deref(),
            Some("E03")
        );
        assert_eq!(presenter.episode_number("Breaking Bad - 1x03").as_deref(), Some("E03"));
        assert_eq!(presenter.episode_number("Movie Title (2020)"), None);
    }

    #[test]
    fn test_statistics_message_orders_by_urgency() {
        let mut presenter = presenter();
        presenter
            .load_files(MediaType::Film, &["/m/a.2001.mkv", "/m/b.2002.mkv", "/m/c.mkv"])
            .unwrap();
        let message = presenter.statistics_message();
        assert_eq!(message.text, "Needs Year: 1 | Ready: 2 • Edit to add a year");
        assert_eq!(message.level, StatusLevel::Warning);
    }

    #[test]
    fn test_empty_statistics() {
        let presenter = presenter();
        assert_eq!(presenter.statistics_message().text, "Ready to process files");
    }

    #[test]
    fn test_force_edit_confirmation_depends_on_mode() {
        let mut presenter = presenter();
        presenter.load_files(MediaType::Series, &["/tv/x.s01e01.mkv"]).unwrap();
        assert!(presenter.force_edit_confirmation().contains("ALL"));
    }
}
