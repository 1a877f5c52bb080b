//! Step-phase timing on top of the `log` facade.

use log::{trace, warn};
use std::time::{Duration, Instant};

/// Phases of a world step, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepPhase {
    Integrate,
    Refresh,
    BvhBuild,
    BvhPairs,
    Solve,
}

impl StepPhase {
    pub const ALL: [StepPhase; 5] = [
        StepPhase::Integrate,
        StepPhase::Refresh,
        StepPhase::BvhBuild,
        StepPhase::BvhPairs,
        StepPhase::Solve,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StepPhase::Integrate => "integrate",
            StepPhase::Refresh => "colliders::refresh",
            StepPhase::BvhBuild => "bvh::build",
            StepPhase::BvhPairs => "bvh::pairs",
            StepPhase::Solve => "solver",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Times one phase of a numbered step. Hand it to [`StepTimings::record`]
/// when the phase is done.
#[derive(Debug)]
pub struct PhaseTimer {
    step: u64,
    phase: StepPhase,
    start: Instant,
}

impl PhaseTimer {
    pub fn start(step: u64, phase: StepPhase) -> Self {
        Self {
            step,
            phase,
            start: Instant::now(),
        }
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Logs the phase duration at trace level and returns it.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        trace!(
            "step {} {}: {} µs",
            self.step,
            self.phase.label(),
            elapsed.as_micros()
        );
        elapsed
    }
}

/// Wall-clock time spent in each phase of the last step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepTimings {
    durations: [Duration; 5],
}

impl StepTimings {
    /// Stops `timer` and adds its duration to its phase.
    pub fn record(&mut self, timer: PhaseTimer) {
        let slot = timer.phase().slot();
        self.durations[slot] += timer.finish();
    }

    pub fn get(&self, phase: StepPhase) -> Duration {
        self.durations[phase.slot()]
    }

    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Warns when step `step` took longer than `budget`.
pub fn warn_if_over_budget(step: u64, elapsed: Duration, budget: Duration) {
    if elapsed > budget {
        warn!(
            "step {step} exceeded budget: {:.2} ms > {:.2} ms",
            elapsed.as_secs_f64() * 1000.0,
            budget.as_secs_f64() * 1000.0
        );
    }
}
