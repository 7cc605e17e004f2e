use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::backend::Backend;
use crate::surface::{Control, RUNNING_LABEL};
use crate::types::{PipelineStatus, StatsSnapshot};

pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(30);

/// Results sent from backend tasks to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Stats { cycle: u64, snapshot: StatsSnapshot },
    Status { cycle: u64, status: PipelineStatus },
    /// Sent as soon as a fetch fails, before the cycle finishes.
    FetchFailed { cycle: u64 },
    CycleFinished { cycle: u64, failed: bool },
    RunSettled(RunOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Started,
    Failed(String),
    /// The run task ended without reporting, e.g. it was cancelled.
    Abandoned,
}

/// Fixed-cadence deadline: each firing schedules the next one a whole
/// period after the previous deadline, not after the moment it was noticed.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    /// `None` once the next deadline is past what `Instant` can represent.
    next_due: Option<Instant>,
}

impl Interval {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now.checked_add(period),
        }
    }

    /// Returns true at most once per call when a deadline has passed.
    /// Deadlines missed while the loop was stalled collapse into one firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(mut due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        while due <= now {
            let Some(next) = due.checked_add(self.period) else {
                self.next_due = None;
                return true;
            };
            due = next;
        }
        self.next_due = Some(due);
        true
    }
}

struct RunInFlight {
    task: JoinHandle<()>,
    saved_control: Control,
}

/// Reports a run's outcome when dropped, so the event loop always hears
/// back even if the task is aborted or panics.
struct SettleGuard {
    events: UnboundedSender<PollEvent>,
    outcome: Option<RunOutcome>,
}

impl SettleGuard {
    fn settle(mut self, outcome: RunOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or(RunOutcome::Abandoned);
        let _ = self.events.send(PollEvent::RunSettled(outcome));
    }
}

/// Fetches dashboard data on demand and on a timer.
pub struct Poller {
    backend: Arc<dyn Backend>,
    events: UnboundedSender<PollEvent>,
    cycle: u64,
    in_flight: Option<JoinHandle<()>>,
    run: Option<RunInFlight>,
    auto_refresh: Option<Interval>,
}

impl Poller {
    pub fn new(backend: Arc<dyn Backend>, events: UnboundedSender<PollEvent>) -> Self {
        Self {
            backend,
            events,
            cycle: 0,
            in_flight: None,
            run: None,
            auto_refresh: None,
        }
    }

    /// Results tagged with an older cycle id than the newest are stale.
    pub fn is_current(&self, cycle: u64) -> bool {
        cycle == self.cycle
    }

    /// Starts a poll cycle: stats first, then status, each sent as soon as
    /// it arrives. A cycle still in flight is cancelled.
    pub fn refresh_all(&mut self) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                debug!(cycle = self.cycle, "Cancelling superseded poll cycle");
            }
            previous.abort();
        }
        self.cycle += 1;
        let cycle = self.cycle;
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(poll_cycle(backend, events, cycle)));
        cycle
    }

    pub fn start_auto_refresh(&mut self, period: Duration, now: Instant) {
        self.auto_refresh = Some(Interval::new(period, now));
    }

    pub fn stop_auto_refresh(&mut self) {
        self.auto_refresh = None;
    }

    /// Fires `refresh_all` when the auto-refresh deadline has passed.
    pub fn poll_auto_refresh(&mut self, now: Instant) -> Option<u64> {
        let due = self
            .auto_refresh
            .as_mut()
            .is_some_and(|interval| interval.poll(now));
        due.then(|| self.refresh_all())
    }

    /// Asks the backend to start a run and switches `control` to its busy
    /// look until [`Poller::settle_run`] restores it. Ignored while the
    /// control is disabled.
    pub fn trigger_pipeline_run(&mut self, control: &mut Control) -> bool {
        if control.disabled || self.run.is_some() {
            debug!("Run control disabled; ignoring trigger");
            return false;
        }

        let saved_control = control.clone();
        control.disabled = true;
        control.busy = true;
        control.label = RUNNING_LABEL.to_string();

        let backend = Arc::clone(&self.backend);
        let guard = SettleGuard {
            events: self.events.clone(),
            outcome: None,
        };
        let task = tokio::spawn(async move {
            let outcome = match backend.run_pipeline().await {
                Ok(ack) => {
                    debug!(run_id = ?ack.run_id, "Pipeline run accepted");
                    RunOutcome::Started
                }
                Err(err) => {
                    error!(error = %err, "Error running pipeline");
                    RunOutcome::Failed(err.to_string())
                }
            };
            guard.settle(outcome);
        });
        self.run = Some(RunInFlight {
            task,
            saved_control,
        });
        true
    }

    /// Puts `control` back exactly as it was before the run was triggered.
    pub fn settle_run(&mut self, control: &mut Control) {
        if let Some(run) = self.run.take() {
            *control = run.saved_control;
        }
    }

    /// Cancels every task and timer this poller owns.
    pub fn shutdown(&mut self) {
        self.stop_auto_refresh();
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        if let Some(run) = &self.run {
            run.task.abort();
        }
    }
}

async fn poll_cycle(backend: Arc<dyn Backend>, events: UnboundedSender<PollEvent>, cycle: u64) {
    debug!(cycle, "Loading...");
    let mut failed = false;

    let snapshot = match backend.get_stats().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(cycle, timeout = err.is_timeout(), error = %err, "Error fetching stats; showing defaults");
            failed = true;
            let _ = events.send(PollEvent::FetchFailed { cycle });
            StatsSnapshot::default()
        }
    };
    let _ = events.send(PollEvent::Stats { cycle, snapshot });

    match backend.get_pipeline_status().await {
        Ok(status) => {
            let _ = events.send(PollEvent::Status { cycle, status });
        }
        Err(err) => {
            warn!(cycle, timeout = err.is_timeout(), error = %err, "Error fetching pipeline status; keeping last known");
            failed = true;
            let _ = events.send(PollEvent::FetchFailed { cycle });
        }
    }

    let _ = events.send(PollEvent::CycleFinished { cycle, failed });
}
