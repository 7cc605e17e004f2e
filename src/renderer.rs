use std::time::Instant;

use tracing::debug;

use crate::surface::{CounterField, Indicator, Surface};
use crate::types::{PipelineStatus, StatsSnapshot, StepName};

/// Turns fetched data into surface state.
///
/// Owns the [`Surface`]; each counter carries at most one animation, so a
/// render that lands while a previous one is still counting simply retargets
/// it.
pub struct Renderer {
    surface: Surface,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            surface: Surface::new(),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn render_stats(&mut self, snapshot: &StatsSnapshot, now: Instant) {
        for field in CounterField::ALL {
            let target = match field {
                CounterField::TotalRuns => snapshot.total_runs,
                CounterField::TotalMessages => snapshot.total_messages,
                CounterField::TotalImages => snapshot.total_images,
            };
            self.surface
                .counter_mut(field)
                .animate_to(target, field.animation_duration(), now);
        }
        self.surface.data_quality = Some(snapshot.data_quality.clamp(0.0, 100.0));
    }

    pub fn render_pipeline_status(&mut self, status: &PipelineStatus) {
        self.surface.badge = Indicator::from_status(&status.overall);

        for (key, value) in &status.steps {
            let Some(step) = StepName::from_key(key).and_then(|name| self.surface.step_mut(name)) else {
                debug!(step = %key, "No indicator for step; skipping");
                continue;
            };
            step.indicator = Indicator::from_status(value);
        }
    }

    /// Advances every counter animation to `now`.
    pub fn tick(&mut self, now: Instant) {
        for field in CounterField::ALL {
            self.surface.counter_mut(field).advance(now);
        }
    }

    pub fn is_animating(&self) -> bool {
        CounterField::ALL
            .iter()
            .any(|&field| self.surface.counter(field).is_animating())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
