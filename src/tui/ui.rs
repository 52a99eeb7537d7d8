use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use chrono::Local;
use crate::models::{format_ddmm, format_hhmm};
use crate::session::LogLevel;
use crate::theme::Theme;
use crate::view;
use super::app::App;

pub fn ui(f: &mut Frame, app: &mut App) {
    let theme = app.session.theme;
    let base = Style::default().bg(theme.bg).fg(theme.dim);
    f.render_widget(Block::default().style(base), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Tasks + log
            Constraint::Length(1), // Status
            Constraint::Length(3), // Command input
        ].as_ref())
        .split(f.area());

    let body = if app.session.focus {
        vec![chunks[0]]
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
            .split(chunks[0])
            .to_vec()
    };

    render_tasks(f, app, &theme, body[0]);
    if let Some(area) = body.get(1) {
        render_log(f, app, &theme, *area);
    }
    render_status(f, app, &theme, chunks[1]);

    let input = Paragraph::new(format!("> {}", app.input_buffer))
        .style(Style::default().fg(theme.yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.pink))
                .title("Command (Enter: run | Ctrl-Z/Y: undo/redo | Ctrl-D: done | Ctrl-E: edit | Esc: quit)"),
        );
    f.render_widget(input, chunks[2]);

    if let Some(popup) = &app.popup {
        let area = centered_rect(50, 5, f.area());
        f.render_widget(Clear, area);
        let msg = Paragraph::new(popup.message.as_str())
            .style(Style::default().fg(theme.yellow).bg(theme.bg))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.orange))
                    .title(popup.title.as_str()),
            );
        f.render_widget(msg, area);
    }
}

fn render_tasks(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let title = app.session.view.title();
    let rows: Vec<Row> = app
        .session
        .rows()
        .into_iter()
        .map(|row| match row {
            view::Row::CategoryHeader(name) => Row::new(vec![
                Cell::from(""),
                Cell::from(format!("[ {} ]", name)),
            ])
            .style(Style::default().fg(theme.blue).add_modifier(Modifier::BOLD)),
            view::Row::Task { number, task } => {
                let style = if task.is_completed() {
                    Style::default().fg(theme.dim).add_modifier(Modifier::CROSSED_OUT)
                } else if task.is_overdue(app.session.today()) {
                    Style::default().fg(theme.error)
                } else {
                    Style::default().fg(theme.green)
                };
                let mark = if task.is_completed() { "[x+]" } else { "[+]" };
                let tag = task.tag.as_deref().map(|t| {
                    Span::styled(format!("[{}] ", t), Style::default().fg(theme.tag_color(t)))
                });
                let name = Line::from(
                    tag.into_iter()
                        .chain(std::iter::once(Span::raw(task.name.clone())))
                        .collect::<Vec<_>>(),
                );
                Row::new(vec![
                    Cell::from(format!("{} {}.", mark, number)),
                    Cell::from(name),
                    Cell::from(format!("[{}]", task.priority)),
                    Cell::from(task.due.map(format_ddmm).unwrap_or_else(|| "--.--".into())),
                    Cell::from(task.time.map(format_hhmm).unwrap_or_else(|| "--:--".into())),
                    Cell::from(task.recurrence.map(|r| r.to_string()).unwrap_or_default()),
                ])
                .style(style)
            }
        })
        .collect();

    let widths = [
        Constraint::Length(9),
        Constraint::Min(20),
        Constraint::Length(7),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["#", "Name", "Prio", "Due", "Time", "Repeat"])
            .style(Style::default().fg(theme.pink).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.green))
                .title(format!("neondo - {}", title)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_log(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .session
        .log()
        .iter()
        .flat_map(|l| {
            let color = match l.level {
                LogLevel::Cmd => theme.blue,
                LogLevel::Info => theme.dim,
                LogLevel::Success => theme.green,
                LogLevel::Error => theme.error,
            };
            l.message
                .lines()
                .map(move |s| Line::from(Span::styled(s.to_string(), Style::default().fg(color))))
                .collect::<Vec<_>>()
        })
        .collect();
    let skip = lines.len().saturating_sub(height);
    let log = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.blue))
                .title("Log"),
        );
    f.render_widget(log, area);
}

fn render_status(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let clock = Local::now().format("%H:%M:%S").to_string();
    let line = Line::from(vec![
        Span::styled(app.session.status_line(), Style::default().fg(theme.green)),
        Span::raw("  "),
        Span::styled(app.session.next_due_label(), Style::default().fg(theme.orange)),
        Span::raw("  "),
        Span::styled(app.session.pomodoro.label(), Style::default().fg(theme.pink)),
        Span::raw("  "),
        Span::styled(clock, Style::default().fg(theme.yellow)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
