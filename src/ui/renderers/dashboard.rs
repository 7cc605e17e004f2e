use std::time::{Duration, Instant};

use ratatui::{
    widgets::{Block, Borders, Paragraph, Wrap},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    Frame
};

use crate::app::App;
use crate::surface::{Control, CounterField, Surface};
use crate::types::ActionKind;
use crate::ui::renderers::severity_color;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Screen regions of every addressable element, shared by drawing and
/// mouse hit-testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardLayout {
    pub header: Rect,
    pub stats: Vec<Rect>,
    pub steps: Vec<Rect>,
    pub cards: Vec<Rect>,
    pub details: Rect,
    pub refresh: Rect,
    pub run: Rect,
    pub help: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(
                [
                    Constraint::Length(3), // Header
                    Constraint::Length(4), // Stats
                    Constraint::Length(4), // Pipeline steps
                    Constraint::Length(4), // Action cards
                    Constraint::Min(0),    // Step details
                    Constraint::Length(3), // Controls
                ]
                .as_ref(),
            )
            .split(area);

        let quarters = |row: Rect| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 4); 4])
                .split(row)
                .to_vec()
        };

        let controls = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(16), // Refresh
                Constraint::Length(22), // Run pipeline
                Constraint::Min(0),     // Key help
            ])
            .split(rows[5]);

        Self {
            header: rows[0],
            stats: quarters(rows[1]),
            steps: quarters(rows[2]),
            cards: quarters(rows[3]),
            details: rows[4],
            refresh: controls[0],
            run: controls[1],
            help: controls[2],
        }
    }
}

/// Render the dashboard view
pub fn render(f: &mut Frame, app: &App, now: Instant) {
    let layout = DashboardLayout::new(f.size());
    let surface = app.surface();
    let elapsed = now.saturating_duration_since(app.started_at);

    render_header(f, surface, elapsed, layout.header);
    render_stats(f, surface, &layout.stats);
    render_steps(f, surface, &layout.steps);
    render_cards(f, &layout.cards);
    render_details(f, surface, layout.details);
    render_control(f, &surface.refresh_control, "r", elapsed, layout.refresh);
    render_control(f, &surface.run_control, "p", elapsed, layout.run);
    render_help(f, layout.help);
}

/// Render the title with the overall status badge
fn render_header(f: &mut Frame, surface: &Surface, elapsed: Duration, area: Rect) {
    let block = Block::default().title("Pipeline Dashboard").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let badge_style = Style::default()
        .fg(Color::Black)
        .bg(severity_color(surface.badge.severity))
        .add_modifier(Modifier::BOLD);
    let mut spans = vec![
        Span::raw("Status: "),
        Span::styled(format!(" {} ", surface.badge.label), badge_style),
    ];
    if surface.loading {
        spans.push(Span::styled(
            format!("  {} Loading...", spinner_frame(elapsed)),
            Style::default().fg(Color::DarkGray),
        ));
    } else if let Some(updated) = surface.last_updated {
        spans.push(Span::styled(
            format!("  Updated {}", updated.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

/// Render the counters row
fn render_stats(f: &mut Frame, surface: &Surface, areas: &[Rect]) {
    for (field, area) in CounterField::ALL.iter().zip(areas) {
        let value = Paragraph::new(surface.counter(*field).text())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(field.title()));
        f.render_widget(value, *area);
    }

    if let Some(area) = areas.get(CounterField::ALL.len()) {
        let quality = surface
            .data_quality
            .map(|q| format!("{:.1}%", q))
            .unwrap_or_else(|| "--".to_string());
        let widget = Paragraph::new(quality)
            .style(Style::default().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Data Quality"));
        f.render_widget(widget, *area);
    }
}

/// Render one indicator per pipeline step
fn render_steps(f: &mut Frame, surface: &Surface, areas: &[Rect]) {
    for (i, (step, area)) in surface.steps.iter().zip(areas).enumerate() {
        let selected = i == surface.selected_step;
        let border_style = if selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let title = if selected {
            format!("> {}", step.name.info().title)
        } else {
            step.name.info().title.to_string()
        };
        let status = Paragraph::new(Span::styled(
            step.indicator.label.clone(),
            Style::default().fg(severity_color(step.indicator.severity)),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border_style));
        f.render_widget(status, *area);
    }
}

/// Render the quick action cards
fn render_cards(f: &mut Frame, areas: &[Rect]) {
    for (i, (action, area)) in ActionKind::ALL.iter().zip(areas).enumerate() {
        let card = Paragraph::new(action.title())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("[{}]", i + 1))
                    .style(Style::default().bg(Color::DarkGray)),
            );
        f.render_widget(card, *area);
    }
}

/// Render the reference details of the selected step
fn render_details(f: &mut Frame, surface: &Surface, area: Rect) {
    let text = match surface.selected_step_name() {
        Some(step) => {
            let info = step.info();
            Text::from(vec![
                Line::from(Span::styled(info.title, Style::default().add_modifier(Modifier::BOLD))),
                Line::from(info.description),
                Line::from(format!("Last run: {}", info.last_run)),
                Line::from(format!("Duration: {}", info.duration)),
            ])
        }
        None => Text::from("No step selected"),
    };
    let details = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Step Details (Enter to announce)"));
    f.render_widget(details, area);
}

fn render_control(f: &mut Frame, control: &Control, key: &str, elapsed: Duration, area: Rect) {
    let label = if control.busy {
        format!("{} {}", spinner_frame(elapsed), control.label)
    } else {
        control.label.clone()
    };
    let style = if control.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!("({})", key)));
    f.render_widget(button, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new("q: quit | r: refresh | p: run | 1-4: actions | ←/→: step | Enter: details")
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, area);
}

fn spinner_frame(elapsed: Duration) -> &'static str {
    SPINNER[(elapsed.as_millis() / 80) as usize % SPINNER.len()]
}
