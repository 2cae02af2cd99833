//! Coarse application state: which operations are legal right now, what is
//! selected, and how to roll back the row being edited.

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::MediaType;

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppState {
    Idle,
    FilesLoaded,
    Editing,
}

/// What the edited row looked like before editing started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditingSnapshot {
    pub row: usize,
    pub original_value: String,
    pub original_extension: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Row {0} is already being edited")]
    AlreadyEditing(usize),
    #[error("No files are loaded")]
    NoFilesLoaded,
    #[error("A session is already active; reset it first")]
    SessionActive,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub app_state: AppState,
    pub mode: Option<MediaType>,
    pub mode_locked: bool,
    pub selected_row: Option<usize>,
    pub file_count: usize,
    pub editing: Option<EditingSnapshot>,
    pub last_action: String,
    pub history: Vec<AppState>,
}

// The snapshot lives inside the editing phase, so it cannot outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    FilesLoaded,
    Editing(EditingSnapshot),
}

impl Phase {
    fn app_state(&self) -> AppState {
        match self {
            Phase::Idle => AppState::Idle,
            Phase::FilesLoaded => AppState::FilesLoaded,
            Phase::Editing(_) => AppState::Editing,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: Phase,
    mode: Option<MediaType>,
    mode_locked: bool,
    selected_row: Option<usize>,
    file_count: usize,
    last_action: String,
    history: VecDeque<AppState>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            mode: None,
            mode_locked: false,
            selected_row: None,
            file_count: 0,
            last_action: "Session created".to_string(),
            history: VecDeque::from([AppState::Idle]),
        }
    }

    /// `Idle -> FilesLoaded`. The mode stays locked until [`reset`](Self::reset).
    pub fn start_session(&mut self, mode: MediaType, file_count: usize) -> Result<(), SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::SessionActive);
        }
        self.mode = Some(mode);
        self.mode_locked = true;
        self.file_count = file_count;
        self.selected_row = None;
        self.transition(
            Phase::FilesLoaded,
            format!("Loaded {} files in {} mode", file_count, mode),
        );
        info!("Session started: {} mode, {} files", mode, file_count);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.mode = None;
        self.mode_locked = false;
        self.selected_row = None;
        self.file_count = 0;
        self.history.clear();
        self.transition(Phase::Idle, "Session reset".to_string());
        info!("Session reset");
    }

    /// An empty batch ends the session.
    pub fn update_file_count(&mut self, count: usize) {
        if count == 0 {
            self.reset();
            return;
        }
        self.file_count = count;
        if self.selected_row.is_some_and(|row| row >= count) {
            self.selected_row = Some(count - 1);
        }
        debug!("File count updated to {}", count);
    }

    pub fn start_editing(
        &mut self,
        row: usize,
        original_value: impl Into<String>,
        original_extension: impl Into<String>,
    ) -> Result<(), SessionError> {
        match &self.phase {
            Phase::Editing(snapshot) => return Err(SessionError::AlreadyEditing(snapshot.row)),
            Phase::Idle => return Err(SessionError::NoFilesLoaded),
            Phase::FilesLoaded => {}
        }

        let snapshot = EditingSnapshot {
            row,
            original_value: original_value.into(),
            original_extension: original_extension.into(),
        };
        self.selected_row = Some(row);
        self.transition(Phase::Editing(snapshot), format!("Editing row {}", row));
        Ok(())
    }

    /// Leaves the editing phase and hands back the snapshot. Does nothing
    /// when no edit is active.
    pub fn complete_editing(&mut self, saved: bool) -> Option<EditingSnapshot> {
        let Phase::Editing(snapshot) = &self.phase else {
            warn!("complete_editing called while not editing");
            return None;
        };
        let snapshot = snapshot.clone();
        let action = if saved {
            format!("Saved edit of row {}", snapshot.row)
        } else {
            format!("Discarded edit of row {}", snapshot.row)
        };
        self.transition(Phase::FilesLoaded, action);
        Some(snapshot)
    }

    pub fn editing_snapshot(&self) -> Option<&EditingSnapshot> {
        match &self.phase {
            Phase::Editing(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn set_selection(&mut self, row: Option<usize>) {
        self.selected_row = row;
    }

    pub fn clear_selection(&mut self) {
        self.selected_row = None;
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    pub fn has_selection(&self) -> bool {
        self.selected_row.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn has_files_loaded(&self) -> bool {
        !self.is_idle()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.phase, Phase::Editing(_))
    }

    pub fn editing_row(&self) -> Option<usize> {
        self.editing_snapshot().map(|s| s.row)
    }

    pub fn is_mode_locked(&self) -> bool {
        self.mode_locked
    }

    pub fn mode(&self) -> Option<MediaType> {
        self.mode
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn app_state(&self) -> AppState {
        self.phase.app_state()
    }

    pub fn last_action(&self) -> &str {
        &self.last_action
    }

    pub fn can_start_editing(&self) -> bool {
        self.phase == Phase::FilesLoaded && self.has_selection()
    }

    pub fn can_apply_changes(&self) -> bool {
        self.phase == Phase::FilesLoaded && self.file_count > 0
    }

    pub fn can_remove_file(&self) -> bool {
        self.phase == Phase::FilesLoaded && self.has_selection()
    }

    pub fn can_change_mode(&self) -> bool {
        !self.mode_locked
    }

    pub fn history(&self) -> impl Iterator<Item = AppState> + '_ {
        self.history.iter().copied()
    }

    pub fn export_state(&self) -> SessionSnapshot {
        SessionSnapshot {
            app_state: self.app_state(),
            mode: self.mode,
            mode_locked: self.mode_locked,
            selected_row: self.selected_row,
            file_count: self.file_count,
            editing: self.editing_snapshot().cloned(),
            last_action: self.last_action.clone(),
            history: self.history.iter().copied().collect(),
        }
    }

    pub fn export_state_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.export_state())
    }

    fn transition(&mut self, next: Phase, action: String) {
        let from = self.phase.app_state();
        self.phase = next;
        self.last_action = action;

        self.history.push_back(self.phase.app_state());
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }

        match self.export_state_json() {
            Ok(json) => debug!("{:?} -> {:?}: {}", from, self.app_state(), json),
            Err(e) => debug!("{:?} -> {:?} (snapshot unavailable: {})", from, self.app_state(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> SessionStateMachine {
        let mut session = SessionStateMachine::new();
        session.start_session(MediaType::Series, 3).unwrap();
        session
    }

    #[test]
    fn test_start_session_locks_mode() {
        let session = loaded();
        assert_eq!(session.app_state(), AppState::FilesLoaded);
        assert_eq!(session.mode(), Some(MediaType::Series));
        assert!(session.is_mode_locked());
        assert!(!session.can_change_mode());
    }

    #[test]
    fn test_second_session_is_refused() {
        let mut session = loaded();
        assert_eq!(
            session.start_session(MediaType::Film, 1),
            Err(SessionError::SessionActive)
        );
        assert_eq!(session.mode(), Some(MediaType::Series));
    }

    #[test]
    fn test_editing_round_trip() {
        let mut session = loaded();
        session.start_editing(1, "Show (2008) - S01E02", ".mkv").unwrap();
        assert!(session.is_editing());
        assert_eq!(session.editing_row(), Some(1));

        let snapshot = session.complete_editing(true).unwrap();
        assert_eq!(snapshot.original_extension, ".mkv");
        assert!(session.editing_snapshot().is_none());
        assert_eq!(session.app_state(), AppState::FilesLoaded);
    }

    #[test]
    fn test_reentrant_editing_is_an_error() {
        let mut session = loaded();
        session.start_editing(0, "a", ".mkv").unwrap();
        assert_eq!(
            session.start_editing(2, "b", ".mkv"),
            Err(SessionError::AlreadyEditing(0))
        );
        assert_eq!(session.editing_row(), Some(0));
    }

    #[test]
    fn test_editing_requires_files() {
        let mut session = SessionStateMachine::new();
        assert_eq!(
            session.start_editing(0, "a", ".mkv"),
            Err(SessionError::NoFilesLoaded)
        );
    }

    #[test]
    fn test_complete_editing_when_idle_is_a_noop() {
        let mut session = loaded();
        assert!(session.complete_editing(false).is_none());
        assert_eq!(session.app_state(), AppState::FilesLoaded);
    }

    #[test]
    fn test_zero_file_count_resets() {
        let mut session = loaded();
        session.start_editing(0, "a", ".mkv").unwrap();
        session.update_file_count(0);
        assert!(session.is_idle());
        assert!(session.editing_snapshot().is_none());
        assert!(session.can_change_mode());
    }

    #[test]
    fn test_selection_is_clamped_on_shrink() {
        let mut session = loaded();
        session.set_selection(Some(2));
        session.update_file_count(2);
        assert_eq!(session.selected_row(), Some(1));
    }

    #[test]
    fn test_predicates() {
        let mut session = loaded();
        assert!(!session.can_start_editing());
        assert!(session.can_apply_changes());

        session.set_selection(Some(0));
        assert!(session.can_start_editing());
        assert!(session.can_remove_file());

        session.start_editing(0, "a", ".mkv").unwrap();
        assert!(!session.can_apply_changes());
        assert!(!session.can_remove_file());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut session = loaded();
        for _ in 0..60 {
            session.start_editing(0, "a", ".mkv").unwrap();
            session.complete_editing(false);
        }
        assert_eq!(session.history().count(), HISTORY_LIMIT);
    }

    #[test]
    fn test_export_state_json() {
        let mut session = loaded();
        session.start_editing(1, "x", ".mp4").unwrap();
        let json = session.export_state_json().unwrap();
        assert!(json.contains("\"app_state\":\"Editing\""));
        assert!(json.contains("\"mode\":\"series\""));
        assert!(json.contains("\"original_extension\":\".mp4\""));
    }
}
