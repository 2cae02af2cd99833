use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, Wrap,
    },
};

use crate::analyzer::MediaType;
use crate::rename_engine::{ProcessingStatus, RenameReport};

use super::app::App;
use super::centered_rect;
use super::models::{Popup, level_color, status_color};

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if app.is_setup() {
        render_setup_screen(f, size, app);
    } else {
        render_main_screen(f, size, app);
    }

    match &app.popup {
        Some(Popup::Help) => render_help_popup(f),
        Some(Popup::YearPrompt { after_load }) => render_year_popup(f, app, *after_load),
        Some(Popup::Conflicts(names)) => render_conflicts_popup(f, names),
        Some(Popup::ForceEditConfirm(_)) => render_force_edit_popup(f, app),
        Some(Popup::RenameReport(report)) => render_report_popup(f, report),
        None => {}
    }
}

pub fn render_setup_screen(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    let header = Paragraph::new("Plex Rename - Load Files")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, chunks[0]);

    let mode_line = Line::from(vec![
        mode_span("Films", app.setup_mode == MediaType::Film),
        Span::raw("   "),
        mode_span("Series", app.setup_mode == MediaType::Series),
    ]);
    let mode = Paragraph::new(mode_line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Mode (Tab to switch)")
            .border_style(Style::default().fg(Color::Green)),
    );
    f.render_widget(mode, chunks[1]);

    let path = Paragraph::new(format!("{}_", app.path_input))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("File or folder path")
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(path, chunks[2]);

    render_status_line(f, chunks[4], app, "Enter to load, Esc to quit");
}

fn mode_span(label: &str, active: bool) -> Span<'static> {
    if active {
        Span::styled(
            format!("[x] {}", label),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!("[ ] {}", label), Style::default().fg(Color::Gray))
    }
}

pub fn render_main_screen(f: &mut Frame, area: Rect, app: &App) {
    let chunks = if app.show_preview {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    let mut constraints = vec![Constraint::Length(3), Constraint::Min(8)];
    if app.is_editing() {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Length(3));

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(chunks[0]);

    render_header(f, left_chunks[0], app);
    render_file_list(f, left_chunks[1], app);
    if let Some(buffer) = &app.edit_buffer {
        render_edit_line(f, left_chunks[2], buffer);
    }
    render_status_line(
        f,
        left_chunks[left_chunks.len() - 1],
        app,
        controls_hint(app),
    );

    if app.show_preview && chunks.len() > 1 {
        render_preview_panel(f, chunks[1], app);
    }
}

fn controls_hint(app: &App) -> &'static str {
    if app.is_editing() {
        "Enter save, Esc discard"
    } else if app.presenter.processor().needs_year_input()
        && app.presenter.processor().mode() == Some(MediaType::Series)
    {
        "y set year, e edit, h help"
    } else if app.presenter.can_apply_renames() {
        "a apply, e edit, h help, q quit"
    } else {
        "e edit, h help, q quit"
    }
}

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mode = app
        .presenter
        .session()
        .mode()
        .map(|m| match m {
            MediaType::Film => "Films",
            MediaType::Series => "Series",
        })
        .unwrap_or("-");
    let title = format!("Plex Rename - {} ({} files)", mode, app.presenter.file_count());

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, area);
}

pub fn render_file_list(f: &mut Frame, area: Rect, app: &App) {
    let editing_row = app.presenter.session().editing_row();
    let items: Vec<ListItem> = app
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let color = status_color(item.status());
            let name_style = if editing_row == Some(i) {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{:<10}] ", item.status().label()), Style::default().fg(color)),
                Span::styled(item.original_name().to_string(), name_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title("Files")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut app.list_state.clone());

    if app.items().len() > area.height.saturating_sub(2) as usize {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut app.scroll_state.clone(),
        );
    }
}

fn render_edit_line(f: &mut Frame, area: Rect, buffer: &str) {
    let editor = Paragraph::new(format!("{}_", buffer))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Edit name (without extension)")
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(editor, area);
}

fn render_status_line(f: &mut Frame, area: Rect, app: &App, controls: &str) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let status = app.current_status();
    let message = Paragraph::new(status.text.as_str())
        .style(Style::default().fg(level_color(status.level)))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(message, chunks[0]);

    let controls = Paragraph::new(controls)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, chunks[1]);
}

pub fn render_preview_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(item) = app.selected_item() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let original = Paragraph::new(Text::from(vec![
        Line::from("Original:"),
        Line::from(Span::styled(
            item.original_name().to_string(),
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        Line::from(format!("Folder: {}", item.path().parent().map(|p| p.display().to_string()).unwrap_or_default())),
    ]))
    .block(
        Block::default()
            .title("Before")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: true });
    f.render_widget(original, chunks[0]);

    let mut new_lines = vec![
        Line::from("New:"),
        Line::from(Span::styled(
            item.new_name().to_string(),
            Style::default().fg(status_color(item.status())),
        )),
        Line::from(""),
        Line::from(format!("Status: {}", item.status())),
    ];
    if let Some(error) = item.error_message() {
        new_lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    if item.status() == ProcessingStatus::AlreadyNormalized {
        new_lines.push(Line::from(Span::styled(
            "Press f to force edit",
            Style::default().fg(Color::Gray),
        )));
    }

    let new = Paragraph::new(Text::from(new_lines))
        .block(
            Block::default()
                .title("After")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(new, chunks[1]);
}

pub fn render_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Plex Rename - Help",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Up/k    - Move up"),
        Line::from("  Down/j  - Move down"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  e/Enter - Edit the selected name"),
        Line::from("  Enter   - Save the edit (series edits apply to every episode)"),
        Line::from("  Esc     - Discard the edit"),
        Line::from("  d       - Remove an invalid, non-video, year-less or duplicate file"),
        Line::from("  f       - Force edit an already normalized file"),
        Line::from("  y       - Set the series year"),
        Line::from("  a       - Apply renames"),
        Line::from("  r       - Start over"),
        Line::from("  p       - Toggle preview panel"),
        Line::from("  h       - Toggle this help"),
        Line::from("  q       - Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press Esc or h to close",
            Style::default().fg(Color::Gray),
        )]),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_year_popup(f: &mut Frame, app: &App, after_load: bool) {
    let popup_area = centered_rect(50, 25, f.area());
    let needing = app
        .items()
        .iter()
        .filter(|i| i.status() == ProcessingStatus::NeedsYear)
        .count();

    let hint = if after_load {
        "Enter to apply, Esc to cancel the load"
    } else {
        "Enter to apply, Esc to close"
    };
    let text = vec![
        Line::from(format!("{} episode(s) have no year.", needing)),
        Line::from("Enter the year the series first aired:"),
        Line::from(""),
        Line::from(Span::styled(
            format!("{}_", app.year_input),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    ];
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Series Year")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_conflicts_popup(f: &mut Frame, names: &[String]) {
    let popup_area = centered_rect(60, 40, f.area());
    let mut text = vec![
        Line::from("These targets already exist and would be overwritten:"),
        Line::from(""),
    ];
    text.extend(
        names
            .iter()
            .map(|name| Line::from(Span::styled(format!("  {}", name), Style::default().fg(Color::Red)))),
    );
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Nothing was renamed. Press any key to close",
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Conflicts")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_force_edit_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(60, 30, f.area());
    let text = vec![
        Line::from(app.presenter.force_edit_confirmation()),
        Line::from(""),
        Line::from(Span::styled("y to confirm, n/Esc to cancel", Style::default().fg(Color::Gray))),
    ];
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Force Edit")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_report_popup(f: &mut Frame, report: &RenameReport) {
    let popup_area = centered_rect(60, 40, f.area());
    let mut text = vec![Line::from(format!(
        "Renamed {} of {} files",
        report.succeeded, report.attempted
    ))];
    if !report.errors.is_empty() {
        text.push(Line::from(""));
        text.extend(
            report
                .errors
                .iter()
                .map(|e| Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red)))),
        );
    }
    text.push(Line::from(""));
    text.push(Line::from(Span::styled("Press any key to close", Style::default().fg(Color::Gray))));

    let border = if report.all_succeeded() { Color::Green } else { Color::Yellow };
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Rename Complete")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}
