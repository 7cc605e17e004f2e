use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::types::{Severity, StatusValue, StepName};
use crate::ui::utils::format_grouped;

/// Animation frame length for counters.
pub const FRAME: Duration = Duration::from_millis(16);

pub const REFRESH_LABEL: &str = "↻ Refresh";
pub const RUN_LABEL: &str = "▶ Run Pipeline";
pub const RUNNING_LABEL: &str = "Running...";

/// The three animated counters on the stats row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    TotalRuns,
    TotalMessages,
    TotalImages,
}

impl CounterField {
    pub const ALL: [CounterField; 3] = [
        CounterField::TotalRuns,
        CounterField::TotalMessages,
        CounterField::TotalImages,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CounterField::TotalRuns => "Total Runs",
            CounterField::TotalMessages => "Messages",
            CounterField::TotalImages => "Images",
        }
    }

    pub fn animation_duration(self) -> Duration {
        match self {
            CounterField::TotalRuns => Duration::from_millis(1500),
            CounterField::TotalMessages => Duration::from_millis(2000),
            CounterField::TotalImages => Duration::from_millis(1800),
        }
    }
}

/// Linear count from `from` to `to`, advanced in whole frames.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterAnimation {
    from: u64,
    to: u64,
    started: Instant,
    duration: Duration,
}

impl CounterAnimation {
    pub fn new(from: u64, to: u64, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    /// Value to show at `now`, and whether the animation has finished.
    ///
    /// Intermediate values never pass the target; the finishing frame shows
    /// the target exactly.
    pub fn value_at(&self, now: Instant) -> (u64, bool) {
        let frames = (now.saturating_duration_since(self.started).as_millis() / FRAME.as_millis()) as f64;
        let total_frames = self.duration.as_millis() as f64 / FRAME.as_millis() as f64;
        if self.from == self.to || frames >= total_frames {
            return (self.to, true);
        }

        let current = self.from as f64 + (self.to as f64 - self.from as f64) * frames / total_frames;
        let shown = if self.to > self.from {
            (current.floor() as u64).min(self.to)
        } else {
            (current.ceil() as u64).max(self.to)
        };
        (shown, false)
    }
}

/// A numeric display target and its in-flight animation, if any.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    shown: u64,
    animation: Option<CounterAnimation>,
}

impl Counter {
    pub fn shown(&self) -> u64 {
        self.shown
    }

    pub fn text(&self) -> String {
        format_grouped(self.shown)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Starts counting toward `target` from whatever is on screen at `now`.
    /// Any animation already running on this counter is replaced.
    pub fn animate_to(&mut self, target: u64, duration: Duration, now: Instant) {
        self.advance(now);
        if self.shown == target {
            self.animation = None;
            return;
        }
        self.animation = Some(CounterAnimation::new(self.shown, target, now, duration));
    }

    pub fn advance(&mut self, now: Instant) {
        if let Some(animation) = &self.animation {
            let (value, done) = animation.value_at(now);
            self.shown = value;
            if done {
                self.animation = None;
            }
        }
    }
}

/// A label painted with a severity, e.g. the status badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub label: String,
    pub severity: Severity,
}

impl Indicator {
    pub fn from_status(status: &StatusValue) -> Self {
        Self {
            label: status.label(),
            severity: status.severity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepIndicator {
    pub name: StepName,
    pub indicator: Indicator,
}

/// A clickable control on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub disabled: bool,
    pub busy: bool,
}

impl Control {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            disabled: false,
            busy: false,
        }
    }
}

/// Everything the dashboard draws, keyed by stable field.
#[derive(Debug, Clone)]
pub struct Surface {
    pub total_runs: Counter,
    pub total_messages: Counter,
    pub total_images: Counter,
    pub data_quality: Option<f64>,
    pub badge: Indicator,
    pub steps: Vec<StepIndicator>,
    pub refresh_control: Control,
    pub run_control: Control,
    pub selected_step: usize,
    pub loading: bool,
    pub last_updated: Option<DateTime<Local>>,
}

impl Surface {
    pub fn new() -> Self {
        let pending = Indicator::from_status(&StatusValue::Pending);
        Self {
            total_runs: Counter::default(),
            total_messages: Counter::default(),
            total_images: Counter::default(),
            data_quality: None,
            badge: pending.clone(),
            steps: StepName::ALL
                .iter()
                .map(|&name| StepIndicator {
                    name,
                    indicator: pending.clone(),
                })
                .collect(),
            refresh_control: Control::new(REFRESH_LABEL),
            run_control: Control::new(RUN_LABEL),
            selected_step: 0,
            loading: false,
            last_updated: None,
        }
    }

    pub fn counter(&self, field: CounterField) -> &Counter {
        match field {
            CounterField::TotalRuns => &self.total_runs,
            CounterField::TotalMessages => &self.total_messages,
            CounterField::TotalImages => &self.total_images,
        }
    }

    pub fn counter_mut(&mut self, field: CounterField) -> &mut Counter {
        match field {
            CounterField::TotalRuns => &mut self.total_runs,
            CounterField::TotalMessages => &mut self.total_messages,
            CounterField::TotalImages => &mut self.total_images,
        }
    }

    /// Marks a poll cycle as in flight; the refresh control spins meanwhile.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.refresh_control.busy = loading;
    }

    pub fn step_mut(&mut self, name: StepName) -> Option<&mut StepIndicator> {
        self.steps.iter_mut().find(|step| step.name == name)
    }

    pub fn selected_step_name(&self) -> Option<StepName> {
        self.steps.get(self.selected_step).map(|step| step.name)
    }

    pub fn select_next_step(&mut self) {
        if !self.steps.is_empty() {
            self.selected_step = (self.selected_step + 1) % self.steps.len();
        }
    }

    pub fn select_previous_step(&mut self) {
        if !self.steps.is_empty() {
            self.selected_step = (self.selected_step + self.steps.len() - 1) % self.steps.len();
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn animation_ends_exactly_on_target() {
        let start = Instant::now();
        for (target, duration) in [(156, 1500), (12847, 2000), (3456, 1800), (1, 1500), (7, 16)] {
            let animation = CounterAnimation::new(0, target, start, ms(duration));
            let (value, done) = animation.value_at(start + ms(duration));
            assert!(done);
            assert_eq!(value, target);
        }
    }

    #[test]
    fn intermediate_frames_never_pass_target() {
        let start = Instant::now();
        let animation = CounterAnimation::new(0, 12847, start, ms(2000));
        let mut last = 0;
        for frame in 0..200 {
            let (value, done) = animation.value_at(start + FRAME * frame);
            assert!(value <= 12847);
            assert!(value >= last);
            last = value;
            if done {
                assert_eq!(value, 12847);
                break;
            }
        }
        assert_eq!(last, 12847);
    }

    #[test]
    fn counting_down_stops_at_target() {
        let start = Instant::now();
        let animation = CounterAnimation::new(500, 100, start, ms(1500));
        let (mid, done) = animation.value_at(start + ms(752));
        assert!(!done);
        assert!(mid > 100 && mid < 500);
        assert_eq!(animation.value_at(start + ms(5000)), (100, true));
    }

    #[test]
    fn values_advance_in_whole_frames() {
        let start = Instant::now();
        let animation = CounterAnimation::new(0, 1000, start, ms(1600));
        // 15ms is still inside the first frame.
        assert_eq!(animation.value_at(start + ms(15)), (0, false));
        assert_eq!(animation.value_at(start + ms(16)), (10, false));
    }

    #[test]
    fn new_target_replaces_running_animation() {
        let start = Instant::now();
        let mut counter = Counter::default();
        counter.animate_to(1000, ms(1600), start);
        counter.advance(start + ms(800));
        let midway = counter.shown();
        assert!(midway > 0 && midway < 1000);

        counter.animate_to(200, ms(1600), start + ms(800));
        counter.advance(start + ms(5000));
        assert_eq!(counter.shown(), 200);
        assert!(!counter.is_animating());
    }

    #[test]
    fn step_selection_wraps() {
        let mut surface = Surface::new();
        assert_eq!(surface.selected_step_name(), Some(StepName::Scraper));
        surface.select_previous_step();
        assert_eq!(surface.selected_step_name(), Some(StepName::Enrich));
        surface.select_next_step();
        surface.select_next_step();
        assert_eq!(surface.selected_step_name(), Some(StepName::Loader));
    }
}
