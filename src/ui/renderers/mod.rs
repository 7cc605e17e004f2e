pub mod dashboard;
pub mod notifications;

use ratatui::style::Color;

use crate::types::Severity;

pub(crate) fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}
