pub mod terminal;
pub mod utils;
pub mod input;
pub mod renderers;

use std::io;
use std::time::Instant;

use crate::app::App;

// Re-export the main public functions
pub use terminal::{setup_terminal, restore_terminal, Tui};

/// Draws the dashboard with the notification stack on top
pub fn render_ui(app: &App, terminal: &mut Tui, now: Instant) -> Result<(), io::Error> {
    terminal.draw(|f| {
        renderers::dashboard::render(f, app, now);
        renderers::notifications::render(f, &app.notifier, now);
    })?;
    Ok(())
}
