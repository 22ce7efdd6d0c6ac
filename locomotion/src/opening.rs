//! Opening (attach / fade-in) sequence.
//!
//! Runs over several ticks after the subsystem is enabled: a blend weight ramps from 0 to 1 over
//! the configured duration, then the sequence reports completion once.

/// Result of advancing the opening by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OpeningStatus {
    Inactive,
    Running { weight: f32 },
    /// Reported on the tick the ramp reaches 1.
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpeningSequence {
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl OpeningSequence {
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            elapsed: 0.0,
            active: false,
        }
    }

    /// Restart the ramp from 0.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    /// Stop without finishing. The ramp goes back to 0.
    pub fn cancel(&mut self) {
        self.elapsed = 0.0;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ramp value in `[0, 1]`.
    pub fn weight(&self) -> f32 {
        if self.duration <= 0.0 {
            return if self.active { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn advance(&mut self, dt: f32) -> OpeningStatus {
        if !self.active {
            return OpeningStatus::Inactive;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.active = false;
            return OpeningStatus::Finished;
        }
        OpeningStatus::Running {
            weight: self.weight(),
        }
    }
}
