// Integration tests for session transitions and guards

use plex_rename::analyzer::MediaType;
use plex_rename::session::{AppState, SessionError, SessionStateMachine};

#[test]
fn test_full_lifecycle() {
    let mut session = SessionStateMachine::new();
    assert!(session.is_idle());
    assert!(session.can_change_mode());
    assert!(!session.can_apply_changes());

    session.start_session(MediaType::Film, 2).unwrap();
    assert!(session.has_files_loaded());
    session.set_selection(Some(0));
    session.clear_selection();
    assert!(!session.has_selection());
    session.set_selection(Some(1));
    session.start_editing(1, "Movie (2020)", ".mkv").unwrap();
    assert_eq!(session.app_state(), AppState::Editing);

    let snapshot = session.complete_editing(false).unwrap();
    assert_eq!(snapshot.row, 1);
    assert_eq!(snapshot.original_value, "Movie (2020)");

    let history: Vec<AppState> = session.history().collect();
    assert_eq!(
        history,
        vec![
            AppState::Idle,
            AppState::FilesLoaded,
            AppState::Editing,
            AppState::FilesLoaded,
        ]
    );

    session.reset();
    assert!(session.is_idle());
    assert_eq!(session.mode(), None);
    assert_eq!(session.selected_row(), None);
    assert_eq!(session.history().collect::<Vec<_>>(), vec![AppState::Idle]);
    assert_eq!(session.last_action(), "Session reset");
}

#[test]
fn test_snapshot_exists_only_while_editing() {
    let mut session = SessionStateMachine::new();
    session.start_session(MediaType::Series, 4).unwrap();
    assert!(session.editing_snapshot().is_none());

    session.start_editing(3, "Show (2008) - S01E04", ".mp4").unwrap();
    assert!(session.editing_snapshot().is_some());
    assert_eq!(
        session.start_editing(0, "other", ".mkv"),
        Err(SessionError::AlreadyEditing(3))
    );

    session.complete_editing(true);
    assert!(session.editing_snapshot().is_none());
    assert!(!session.is_editing());
}

#[test]
fn test_reset_from_editing() {
    let mut session = SessionStateMachine::new();
    session.start_session(MediaType::Series, 1).unwrap();
    session.start_editing(0, "x", ".mkv").unwrap();
    session.reset();
    assert!(session.editing_snapshot().is_none());
    assert!(session.start_session(MediaType::Film, 1).is_ok());
}

#[test]
fn test_export_state() {
    let mut session = SessionStateMachine::new();
    session.start_session(MediaType::Film, 5).unwrap();
    session.set_selection(Some(2));

    let snapshot = session.export_state();
    assert_eq!(snapshot.app_state, AppState::FilesLoaded);
    assert_eq!(snapshot.mode, Some(MediaType::Film));
    assert_eq!(snapshot.file_count, 5);
    assert_eq!(snapshot.selected_row, Some(2));
    assert!(snapshot.editing.is_none());

    let json: serde_json::Value = serde_json::from_str(&session.export_state_json().unwrap()).unwrap();
    assert_eq!(json["mode"], "film");
    assert_eq!(json["mode_locked"], true);
}
