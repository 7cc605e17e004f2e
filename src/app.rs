use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::dispatcher::{self, Command, Dispatch};
use crate::notifier::Notifier;
use crate::poller::{PollEvent, Poller, RunOutcome};
use crate::renderer::Renderer;
use crate::surface::Surface;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load dashboard data";
pub const RUN_STARTED_MESSAGE: &str = "Pipeline started successfully!";
pub const RUN_FAILED_MESSAGE: &str = "Failed to start pipeline";

/// Dashboard state shared by the event loop, input handling and drawing.
pub struct App {
    pub renderer: Renderer,
    pub notifier: Notifier,
    pub poller: Poller,
    events: UnboundedReceiver<PollEvent>,
    refresh_period: Duration,
    /// A fetch failed in a cycle that has not reported it yet, possibly one
    /// that was superseded before it finished.
    unreported_failure: bool,
    pub started_at: Instant,
    pub should_quit: bool,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, refresh_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            renderer: Renderer::new(),
            notifier: Notifier::new(),
            poller: Poller::new(backend, tx),
            events: rx,
            refresh_period,
            unreported_failure: false,
            started_at: Instant::now(),
            should_quit: false,
        }
    }

    pub fn surface(&self) -> &Surface {
        self.renderer.surface()
    }

    /// Loads data once and starts the auto-refresh timer.
    pub fn start(&mut self, now: Instant) {
        info!(period_secs = self.refresh_period.as_secs(), "Starting dashboard");
        self.refresh();
        self.poller.start_auto_refresh(self.refresh_period, now);
    }

    fn refresh(&mut self) {
        self.poller.refresh_all();
        self.renderer.surface_mut().set_loading(true);
    }

    pub fn dispatch(&mut self, command: Command, now: Instant) {
        match dispatcher::resolve(&command) {
            Dispatch::Refresh => self.refresh(),
            Dispatch::RunPipeline => {
                let control = &mut self.renderer.surface_mut().run_control;
                if self.poller.trigger_pipeline_run(control) {
                    info!("Pipeline run requested");
                }
            }
            Dispatch::Notify(message) => {
                self.notifier.notify(message, now);
            }
            Dispatch::Quit => self.should_quit = true,
            Dispatch::Ignored => debug!(?command, "No target for command"),
        }
    }

    pub fn handle_event(&mut self, event: PollEvent, now: Instant) {
        match event {
            PollEvent::Stats { cycle, snapshot } => {
                if self.poller.is_current(cycle) {
                    self.renderer.render_stats(&snapshot, now);
                }
            }
            PollEvent::Status { cycle, status } => {
                if self.poller.is_current(cycle) {
                    self.renderer.render_pipeline_status(&status);
                }
            }
            PollEvent::FetchFailed { cycle } => {
                debug!(cycle, "Fetch failed");
                self.unreported_failure = true;
            }
            PollEvent::CycleFinished { cycle, failed } => {
                if !self.poller.is_current(cycle) {
                    return;
                }
                debug!(cycle, "Loading complete");
                let surface = self.renderer.surface_mut();
                surface.set_loading(false);
                surface.last_updated = Some(Local::now());
                if failed || self.unreported_failure {
                    self.unreported_failure = false;
                    self.notifier.notify_error(LOAD_FAILED_MESSAGE, now);
                }
            }
            PollEvent::RunSettled(outcome) => {
                self.poller
                    .settle_run(&mut self.renderer.surface_mut().run_control);
                match outcome {
                    RunOutcome::Started => {
                        self.notifier.notify_success(RUN_STARTED_MESSAGE, now);
                        self.refresh();
                    }
                    RunOutcome::Failed(reason) => {
                        debug!(%reason, "Pipeline run rejected");
                        self.notifier.notify_error(RUN_FAILED_MESSAGE, now);
                    }
                    RunOutcome::Abandoned => {
                        debug!("Pipeline run ended without an outcome");
                        self.notifier.notify_error(RUN_FAILED_MESSAGE, now);
                    }
                }
            }
        }
    }

    /// One pass of the event loop: apply backend results, fire the refresh
    /// timer, and advance animations and notification lifecycles.
    pub fn on_tick(&mut self, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event, now);
        }
        if let Some(cycle) = self.poller.poll_auto_refresh(now) {
            debug!(cycle, "Auto-refresh fired");
            self.renderer.surface_mut().set_loading(true);
        }
        if self.renderer.is_animating() {
            self.renderer.tick(now);
        }
        self.notifier.tick(now);
    }

    pub fn shutdown(&mut self) {
        self.poller.shutdown();
        self.notifier.clear();
    }
}
