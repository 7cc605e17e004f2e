use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::dispatcher::Command;
use crate::ui::renderers::dashboard::DashboardLayout;

/// Handle a key press; returns true when the app should quit
pub fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) -> bool {
    if let Some(command) = translate_key(app, key) {
        app.dispatch(command, now);
    }
    app.should_quit
}

fn translate_key(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    let surface = app.renderer.surface_mut();
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('r') => Some(Command::Refresh),
        KeyCode::Char('p') => Some(Command::RunPipeline),
        KeyCode::Char(c @ '1'..='4') => Some(Command::ActionCard(c as usize - '1' as usize)),
        KeyCode::Right | KeyCode::Tab => {
            surface.select_next_step();
            None
        }
        KeyCode::Left | KeyCode::BackTab => {
            surface.select_previous_step();
            None
        }
        KeyCode::Enter => surface
            .selected_step_name()
            .map(|step| Command::StepDetails(step.key().to_string())),
        _ => None,
    }
}

/// Handle a mouse click against the current dashboard layout
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, area: Rect, now: Instant) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let layout = DashboardLayout::new(area);
    if let Some(command) = hit_test(app, &layout, mouse.column, mouse.row) {
        app.dispatch(command, now);
    }
}

fn hit_test(app: &mut App, layout: &DashboardLayout, column: u16, row: u16) -> Option<Command> {
    let inside = |rect: &Rect| {
        column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
    };

    if inside(&layout.refresh) {
        return Some(Command::Refresh);
    }
    if inside(&layout.run) {
        return Some(Command::RunPipeline);
    }
    if let Some(index) = layout.cards.iter().position(inside) {
        return Some(Command::ActionCard(index));
    }
    if let Some(index) = layout.steps.iter().position(inside) {
        let surface = app.renderer.surface_mut();
        let step = surface.steps.get(index)?.name;
        surface.selected_step = index;
        return Some(Command::StepDetails(step.key().to_string()));
    }
    None
}
