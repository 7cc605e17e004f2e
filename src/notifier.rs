use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::info;

/// Slide-in time after a notification appears.
pub const ENTER_DURATION: Duration = Duration::from_millis(300);
/// Time from creation until the exit slide starts.
pub const VISIBLE_DURATION: Duration = Duration::from_millis(3000);
/// Slide-out time; the notification is removed once it completes.
pub const EXIT_DURATION: Duration = Duration::from_millis(300);

const SUCCESS_GLYPH: &str = "✓";
const ERROR_GLYPH: &str = "✗";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Visible,
    Exiting,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub created_at: DateTime<Local>,
    shown_at: Instant,
}

impl Notification {
    pub fn phase(&self, now: Instant) -> Phase {
        let age = now.saturating_duration_since(self.shown_at);
        if age < ENTER_DURATION {
            Phase::Entering
        } else if age < VISIBLE_DURATION {
            Phase::Visible
        } else {
            Phase::Exiting
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= VISIBLE_DURATION + EXIT_DURATION
    }

    /// How far the notification sits off-screen to the right, in `[0, 1]`.
    pub fn offset(&self, now: Instant) -> f64 {
        let age = now.saturating_duration_since(self.shown_at);
        match self.phase(now) {
            Phase::Entering => 1.0 - age.as_secs_f64() / ENTER_DURATION.as_secs_f64(),
            Phase::Visible => 0.0,
            Phase::Exiting => {
                ((age - VISIBLE_DURATION).as_secs_f64() / EXIT_DURATION.as_secs_f64()).min(1.0)
            }
        }
    }
}

/// Stack of self-dismissing messages, oldest first.
#[derive(Debug, Default)]
pub struct Notifier {
    queue: Vec<Notification>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        let message = message.into();
        info!(%message, "notification");
        self.next_id += 1;
        self.queue.push(Notification {
            id: self.next_id,
            message,
            created_at: Local::now(),
            shown_at: now,
        });
        self.next_id
    }

    pub fn notify_success(&mut self, message: &str, now: Instant) -> u64 {
        self.notify(format!("{} {}", SUCCESS_GLYPH, message), now)
    }

    pub fn notify_error(&mut self, message: &str, now: Instant) -> u64 {
        self.notify(format!("{} {}", ERROR_GLYPH, message), now)
    }

    /// Drops every notification whose exit slide has finished and returns
    /// their ids.
    pub fn tick(&mut self, now: Instant) -> Vec<u64> {
        let mut removed = Vec::new();
        self.queue.retain(|notification| {
            if notification.is_expired(now) {
                removed.push(notification.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Newest first, i.e. top of the stack first.
    pub fn stacked(&self) -> impl DoubleEndedIterator<Item = &Notification> {
        self.queue.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn notifications_expire_individually() {
        let start = Instant::now();
        let mut notifier = Notifier::new();
        let first = notifier.notify("one", start);
        let second = notifier.notify("two", start + ms(1000));
        let third = notifier.notify("three", start + ms(2000));
        assert_eq!(notifier.stacked().count(), 3);

        assert!(notifier.tick(start + ms(3299)).is_empty());
        assert_eq!(notifier.tick(start + ms(3300)), vec![first]);
        assert_eq!(notifier.stacked().count(), 2);

        assert!(notifier.tick(start + ms(4299)).is_empty());
        assert_eq!(notifier.tick(start + ms(4300)), vec![second]);
        assert_eq!(notifier.tick(start + ms(5300)), vec![third]);
        assert!(notifier.is_empty());
    }

    #[test]
    fn same_instant_notifications_stay_distinct() {
        let start = Instant::now();
        let mut notifier = Notifier::new();
        let ids: Vec<u64> = (0..5).map(|_| notifier.notify("same", start)).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(notifier.tick(start + ms(3300)).len(), 5);
    }

    #[test]
    fn lifecycle_phases() {
        let start = Instant::now();
        let mut notifier = Notifier::new();
        notifier.notify("hello", start);
        let notification = notifier.stacked().next().unwrap().clone();

        assert_eq!(notification.phase(start), Phase::Entering);
        assert_eq!(notification.offset(start), 1.0);
        assert_eq!(notification.phase(start + ms(300)), Phase::Visible);
        assert_eq!(notification.offset(start + ms(1000)), 0.0);
        assert_eq!(notification.phase(start + ms(3000)), Phase::Exiting);
        assert!(!notification.is_expired(start + ms(3299)));
        assert!(notification.is_expired(start + ms(3300)));
        assert_eq!(notification.offset(start + ms(3300)), 1.0);
    }

    #[test]
    fn glyph_wrappers() {
        let start = Instant::now();
        let mut notifier = Notifier::new();
        notifier.notify_success("Pipeline started successfully!", start);
        notifier.notify_error("Failed to start pipeline", start);
        let messages: Vec<&str> = notifier.stacked().map(|n| n.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["✗ Failed to start pipeline", "✓ Pipeline started successfully!"]
        );
    }
}
