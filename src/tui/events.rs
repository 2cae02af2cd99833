use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info};

use crate::presenter::StatusMessage;

use super::app::App;
use super::models::Popup;
use super::rendering::ui;

pub async fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("TUI exited with error: {:#}", err);
    }
    res
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    info!("TUI started");
    loop {
        app.clear_status_message_if_expired();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key).await;
                }
            }
        }

        if app.should_quit {
            info!("TUI quit");
            return Ok(());
        }
    }
}

/// Routes a key to whichever layer owns input right now: the inline editor,
/// an open popup, the setup screen, or the file list.
pub async fn handle_key(app: &mut App, key: KeyEvent) {
    if app.is_editing() {
        handle_editing_key(app, key.code);
    } else if let Some(popup) = app.popup.clone() {
        handle_popup_key(app, popup, key.code);
    } else if app.is_setup() {
        handle_setup_key(app, key.code).await;
    } else {
        handle_main_key(app, key.code);
    }
}

fn handle_editing_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => app.save_edit(),
        KeyCode::Esc => app.discard_edit(),
        KeyCode::Backspace => app.edit_backspace(),
        KeyCode::Char(c) => app.edit_push(c),
        _ => {}
    }
}

fn handle_popup_key(app: &mut App, popup: Popup, code: KeyCode) {
    match popup {
        Popup::Help => {
            if matches!(code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('q')) {
                app.close_popup();
            }
        }
        Popup::YearPrompt { after_load } => match code {
            KeyCode::Enter => app.submit_year(),
            KeyCode::Esc if after_load => app.cancel_year_prompt(),
            KeyCode::Esc => app.close_popup(),
            KeyCode::Backspace => {
                app.year_input.pop();
            }
            KeyCode::Char(c) => app.year_push(c),
            _ => {}
        },
        Popup::ForceEditConfirm(row) => match code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_force_edit(row),
            KeyCode::Char('n') | KeyCode::Esc => app.close_popup(),
            _ => {}
        },
        Popup::Conflicts(_) | Popup::RenameReport(_) => app.close_popup(),
    }
}

async fn handle_setup_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => app.toggle_setup_mode(),
        KeyCode::Enter => {
            if let Err(e) = app.load_from_input().await {
                error!("Scan failed: {:#}", e);
                app.set_status_message(StatusMessage::error(e.to_string()));
            }
        }
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Char(c) => app.path_input.push(c),
        _ => {}
    }
}

fn handle_main_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('h') | KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char('p') => app.toggle_preview(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Enter | KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('f') => app.request_force_edit(),
        KeyCode::Char('y') => app.open_year_prompt(),
        KeyCode::Char('a') => app.apply(),
        KeyCode::Char('r') => app.start_over(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::MediaType;
    use crate::patterns::NamingRules;
    use crate::presenter::AppPresenter;
    use crossterm::event::KeyModifiers;
    use std::path::PathBuf;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_app() -> App {
        let presenter = AppPresenter::new(NamingRules::new().unwrap().with_max_year(2024));
        let mut app = App::with_input(presenter, MediaType::Film, String::new());
        app.load(vec![PathBuf::from("/m/some_movie.mkv"), PathBuf::from("/m/b.2002.mkv")]);
        app
    }

    #[tokio::test]
    async fn test_typing_goes_to_editor_while_editing() {
        let mut app = loaded_app();
        handle_key(&mut app, press(KeyCode::Char('e'))).await;
        assert!(app.is_editing());

        // 'q' is text here, not quit
        handle_key(&mut app, press(KeyCode::Char('q'))).await;
        assert!(!app.should_quit);
        assert!(app.edit_buffer.as_deref().is_some_and(|b| b.ends_with('q')));

        handle_key(&mut app, press(KeyCode::Esc)).await;
        assert!(!app.is_editing());
    }

    #[tokio::test]
    async fn test_help_popup_swallows_keys() {
        let mut app = loaded_app();
        handle_key(&mut app, press(KeyCode::Char('h'))).await;
        assert_eq!(app.popup, Some(Popup::Help));
        handle_key(&mut app, press(KeyCode::Char('j'))).await;
        assert_eq!(app.selected(), Some(0));
        handle_key(&mut app, press(KeyCode::Esc)).await;
        assert_eq!(app.popup, None);
    }

    #[tokio::test]
    async fn test_setup_screen_collects_input() {
        let presenter = AppPresenter::new(NamingRules::new().unwrap());
        let mut app = App::new(presenter);
        handle_key(&mut app, press(KeyCode::Tab)).await;
        assert_eq!(app.setup_mode, MediaType::Series);
        handle_key(&mut app, press(KeyCode::Char('/'))).await;
        handle_key(&mut app, press(KeyCode::Char('t'))).await;
        assert_eq!(app.path_input, "/t");
        handle_key(&mut app, press(KeyCode::Esc)).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_year_key_does_nothing_for_films() {
        let mut app = loaded_app();
        handle_key(&mut app, press(KeyCode::Char('y'))).await;
        assert_eq!(app.popup, None);
        handle_key(&mut app, press(KeyCode::Esc)).await;
        assert_eq!(app.items().len(), 2);
        assert!(!app.is_setup());
    }

    #[tokio::test]
    async fn test_reopened_year_prompt_closes_without_dropping_batch() {
        let presenter = AppPresenter::new(NamingRules::new().unwrap().with_max_year(2024));
        let mut app = App::with_input(presenter, MediaType::Series, String::new());
        app.load(vec![PathBuf::from("/tv/bb.s01e01.mkv"), PathBuf::from("/tv/bb.s01e02.mkv")]);
        assert_eq!(app.popup, Some(Popup::YearPrompt { after_load: true }));
        app.close_popup();

        handle_key(&mut app, press(KeyCode::Char('y'))).await;
        assert_eq!(app.popup, Some(Popup::YearPrompt { after_load: false }));
        handle_key(&mut app, press(KeyCode::Esc)).await;
        assert_eq!(app.popup, None);
        assert_eq!(app.items().len(), 2);
        assert!(app.presenter.is_mode_locked());
    }

    #[tokio::test]
    async fn test_escaping_year_prompt_after_load_cancels_it() {
        let presenter = AppPresenter::new(NamingRules::new().unwrap().with_max_year(2024));
        let mut app = App::with_input(presenter, MediaType::Series, String::new());
        app.load(vec![PathBuf::from("/tv/bb.s01e01.mkv")]);
        handle_key(&mut app, press(KeyCode::Esc)).await;
        assert!(app.is_setup());
        assert!(app.items().is_empty());
    }
}
