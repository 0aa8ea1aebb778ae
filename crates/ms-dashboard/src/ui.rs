use crate::app::App;
use crate::interaction::Modal;
use crate::theme::{self, Theme, HEADER_STYLE, SELECTED_STYLE};
use chrono::{DateTime, Local};
use ms_core::{DetailView, ROW_COLUMNS};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

const COLUMN_WIDTHS: [Constraint; 13] = [
    Constraint::Length(3),
    Constraint::Min(12),
    Constraint::Length(7),
    Constraint::Length(6),
    Constraint::Length(7),
    Constraint::Length(7),
    Constraint::Length(6),
    Constraint::Length(6),
    Constraint::Length(6),
    Constraint::Length(5),
    Constraint::Length(5),
    Constraint::Length(7),
    Constraint::Min(10),
];

pub fn render(frame: &mut Frame, app: &mut App, now: DateTime<Local>) {
    let theme = theme::theme();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, app, theme, now, chunks[0]);
    render_table(frame, app, theme, chunks[1]);
    render_footer(frame, app, theme, chunks[2]);

    if let Some(view) = app.detail.as_deref().and_then(|name| app.dashboard.detail(name)) {
        render_detail(frame, &view, theme);
    }
    if app.help_open {
        render_help_overlay(frame, theme);
    }
    if let Some(modal) = app.modal.as_ref() {
        render_modal(frame, modal, theme);
    }
}

fn render_header(frame: &mut Frame, app: &App, theme: Theme, now: DateTime<Local>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(" Multiscreen ", HEADER_STYLE));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(12)])
        .split(inner);

    let error = match app.last_poll_error.as_deref() {
        Some(err) => Span::styled(format!("last error: {err}"), Style::default().fg(theme.critical)),
        None => Span::styled("last error: -", Style::default().fg(theme.muted)),
    };
    let status = vec![
        Line::from(vec![
            Span::styled(format!("api:{}", app.variant), Style::default().fg(theme.accent)),
            Span::raw("  "),
            Span::styled(
                format!("rows:{}", app.dashboard.rows().len()),
                Style::default().fg(theme.text),
            ),
            Span::raw("  "),
            Span::styled(
                format!(
                    "polls:{}/{}",
                    app.dashboard.polls_applied(),
                    app.polls_received
                ),
                Style::default().fg(theme.text),
            ),
            Span::raw("  "),
            Span::styled(app.base_url.clone(), Style::default().fg(theme.muted)),
        ]),
        Line::from(error),
    ];
    frame.render_widget(Paragraph::new(status), halves[0]);

    let clock = vec![
        Line::from(Span::styled(
            now.format("%H:%M:%S").to_string(),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            now.format("%Y-%m-%d").to_string(),
            Style::default().fg(theme.muted),
        )),
    ];
    frame.render_widget(Paragraph::new(clock).alignment(Alignment::Right), halves[1]);
}

fn render_table(frame: &mut Frame, app: &mut App, theme: Theme, area: Rect) {
    let rows: Vec<Row> = match app.dashboard.placeholder() {
        Some(placeholder) => vec![Row::new(vec![Cell::from(placeholder.to_string())])
            .style(Style::default().fg(theme.critical))],
        None => app
            .dashboard
            .rows()
            .iter()
            .map(|entry| {
                let cells = entry.view.cells.iter().enumerate().map(|(column, value)| {
                    let cell = Cell::from(value.clone());
                    if column == 10 && entry.view.cc_alert {
                        cell.style(theme.cc_alert_style())
                    } else {
                        cell
                    }
                });
                Row::new(cells).style(theme.row_style(entry.health))
            })
            .collect(),
    };

    let table = Table::new(rows, COLUMN_WIDTHS)
        .header(Row::new(ROW_COLUMNS.to_vec()).style(HEADER_STYLE))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title("Streams"),
        )
        .highlight_style(SELECTED_STYLE)
        .highlight_symbol(">> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_footer(frame: &mut Frame, app: &App, theme: Theme, area: Rect) {
    let mut spans = vec![Span::styled(
        "[i]Info [s]Start/Stop [r]Restart [e]Edit [d]Delete [a]Add [R]Refresh [?]Help [q]Quit",
        Style::default().fg(theme.muted),
    )];
    if let Some(note) = app.status_note.as_deref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(note.to_string(), Style::default().fg(theme.accent)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn overlay_block(title: &str, theme: Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.surface))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ))
}

fn render_detail(frame: &mut Frame, view: &DetailView, theme: Theme) {
    let area = centered_rect(60, 80, frame.size());
    let label_width = view
        .fields
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let lines: Vec<Line> = view
        .fields
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(
                    format!("{label:<label_width$}  "),
                    Style::default().fg(theme.muted),
                ),
                Span::styled(value.clone(), Style::default().fg(theme.text)),
            ])
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(overlay_block(&view.title, theme))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame, theme: Theme) {
    let area = centered_rect(60, 60, frame.size());
    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ))
    };
    let lines = vec![
        section("Navigation"),
        Line::from("  j/k, Up/Down  select stream"),
        Line::from("  i or Enter    stream details"),
        Line::from("  R             poll now"),
        Line::from(""),
        section("Stream actions"),
        Line::from("  s             start or stop selected stream"),
        Line::from("  r             restart selected stream"),
        Line::from("  e             edit URL and decoder"),
        Line::from("  d             delete selected stream"),
        Line::from("  a             add a stream"),
        Line::from(""),
        section("Dialogs"),
        Line::from("  Enter         accept"),
        Line::from("  y/n           answer a confirmation"),
        Line::from("  Esc           cancel or close"),
        Line::from(""),
        Line::from("  ? or F1       toggle this help"),
        Line::from("  q             quit"),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.text))
            .block(overlay_block("Help", theme)),
        area,
    );
}

fn render_modal(frame: &mut Frame, modal: &Modal, theme: Theme) {
    let area = centered_rect(50, 25, frame.size());
    let message = modal.message().to_string();
    let (title, lines) = match modal {
        Modal::Prompt { input, .. } => (
            "Input",
            vec![
                Line::from(message),
                Line::from(""),
                Line::from(vec![
                    Span::styled("> ", Style::default().fg(theme.accent)),
                    Span::styled(format!("{input}_"), Style::default().fg(theme.text)),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter accept  Esc cancel",
                    Style::default().fg(theme.muted),
                )),
            ],
        ),
        Modal::Confirm { .. } => (
            "Confirm",
            vec![
                Line::from(message),
                Line::from(""),
                Line::from(Span::styled(
                    "y/Enter yes  n/Esc no",
                    Style::default().fg(theme.muted),
                )),
            ],
        ),
        Modal::Notify { .. } => (
            "Notice",
            vec![
                Line::from(Span::styled(
                    message,
                    Style::default().fg(theme.warn).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter/Esc dismiss",
                    Style::default().fg(theme.muted),
                )),
            ],
        ),
    };
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(overlay_block(title, theme))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}
