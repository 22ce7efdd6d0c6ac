//! Fixed-step accumulator.
//!
//! Real or virtual elapsed time is accumulated and converted into whole ticks of a fixed `dt`.
//! Callers run exactly the returned number of ticks; the remainder carries over.

use locomotion::error::{Result, check_timestep};
use log::warn;

#[derive(Clone, Debug)]
pub struct FixedStepScheduler {
    dt: f32,
    max_catch_up: u32,
    accumulator: f32,
    ticks: u64,
}

impl FixedStepScheduler {
    /// `max_catch_up` bounds the ticks returned by a single [`Self::accumulate`]; time beyond
    /// it is dropped.
    pub fn new(dt: f32, max_catch_up: u32) -> Result<Self> {
        Ok(Self {
            dt: check_timestep(dt)?,
            max_catch_up: max_catch_up.max(1),
            accumulator: 0.0,
            ticks: 0,
        })
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Ticks handed out so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Add `elapsed` seconds and return how many ticks are due now.
    pub fn accumulate(&mut self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed;
        // Tolerate float drift so exact multiples of dt are not lost.
        let due = ((self.accumulator / self.dt) + 1.0e-4).floor() as u32;
        self.accumulator = (self.accumulator - due as f32 * self.dt).max(0.0);

        let run = due.min(self.max_catch_up);
        if run < due {
            warn!("scheduler fell behind, dropping {} ticks", due - run);
        }
        self.ticks += u64::from(run);
        run
    }

    /// Fraction of a tick left in the accumulator, for interpolation.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }
}
