use std::time::Instant;

use ratatui::{
    widgets::{Block, Borders, Clear, Paragraph},
    layout::Rect,
    style::{Color, Modifier, Style},
    Frame
};

use crate::notifier::{Notification, Notifier};
use crate::ui::utils::truncate;

const TOAST_HEIGHT: u16 = 3;
const MARGIN: u16 = 2;
const MAX_TOAST_WIDTH: u16 = 60;

/// Render the toast stack in the bottom-right corner, newest on top
pub fn render(f: &mut Frame, notifier: &Notifier, now: Instant) {
    let area = f.size();
    for (slot, notification) in notifier.stacked().rev().enumerate() {
        let Some(rect) = toast_area(area, notification, slot as u16, now) else {
            break;
        };
        render_toast(f, notification, rect);
    }
}

/// Where a toast sits for a given stack slot (0 = lowest), including its
/// slide offset. `None` once the stack runs off the top of the screen.
pub fn toast_area(area: Rect, notification: &Notification, slot: u16, now: Instant) -> Option<Rect> {
    let bottom = area.bottom().checked_sub(MARGIN)?;
    let y = bottom.checked_sub(TOAST_HEIGHT * (slot + 1))?;
    if y < area.top() {
        return None;
    }

    let wanted = notification.message.chars().count() as u16 + 4;
    let width = wanted.min(MAX_TOAST_WIDTH).min(area.width.saturating_sub(MARGIN * 2));
    let resting_x = area.right().saturating_sub(width + MARGIN);
    let shift = (notification.offset(now) * f64::from(width + MARGIN)) as u16;
    let x = resting_x.saturating_add(shift).min(area.right());
    let visible = width.min(area.right() - x);

    Some(Rect::new(x, y, visible, TOAST_HEIGHT))
}

fn render_toast(f: &mut Frame, notification: &Notification, rect: Rect) {
    if rect.width < 3 {
        return;
    }
    let text = truncate(&notification.message, rect.width.saturating_sub(4) as usize);
    let toast = Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(118, 75, 162))
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(notification.created_at.format("%H:%M:%S").to_string()),
        );
    f.render_widget(Clear, rect);
    f.render_widget(toast, rect);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn toasts_stack_upward_from_bottom_right() {
        let area = Rect::new(0, 0, 100, 30);
        let start = Instant::now();
        let mut notifier = Notifier::new();
        notifier.notify("first", start);
        notifier.notify("second", start);
        let settled = start + Duration::from_millis(1000);

        let oldest = notifier.stacked().last().unwrap();
        let newest = notifier.stacked().next().unwrap();
        let low = toast_area(area, oldest, 0, settled).unwrap();
        let high = toast_area(area, newest, 1, settled).unwrap();
        assert_eq!(low.y, 25);
        assert_eq!(high.y, 22);
        assert_eq!(low.right(), 98);
    }

    #[test]
    fn entering_toast_starts_off_screen() {
        let area = Rect::new(0, 0, 100, 30);
        let start = Instant::now();
        let mut notifier = Notifier::new();
        notifier.notify("sliding", start);
        let toast = notifier.stacked().next().unwrap();

        let entering = toast_area(area, toast, 0, start).unwrap();
        assert_eq!(entering.width, 0);
        let rested = toast_area(area, toast, 0, start + Duration::from_millis(300)).unwrap();
        assert_eq!(rested.width, 11);
    }

    #[test]
    fn overflowing_stack_is_cut() {
        let area = Rect::new(0, 0, 100, 8);
        let start = Instant::now();
        let mut notifier = Notifier::new();
        notifier.notify("x", start);
        let toast = notifier.stacked().next().unwrap();
        assert!(toast_area(area, toast, 0, start).is_some());
        assert!(toast_area(area, toast, 2, start).is_none());
    }
}
