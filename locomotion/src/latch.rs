//! Edge-triggered blocked-movement latch.

use log::debug;

use crate::constants::{BLOCKED_RATIO, MOVE_EPS};

/// Transition reported by [`BlockedLatch::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatchEdge {
    Blocked,
    Unblocked,
}

/// Tracks whether requested movement is being blocked by the world.
///
/// The latch only changes state on a transition; repeated blocked ticks report nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockedLatch {
    blocked: bool,
}

impl BlockedLatch {
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Feed the requested and realized movement distances for one tick.
    ///
    /// Blocked means something was requested and less than [`BLOCKED_RATIO`] of it happened.
    pub fn update(&mut self, requested: f32, realized: f32) -> Option<LatchEdge> {
        let blocked = requested > MOVE_EPS && realized < requested * BLOCKED_RATIO;
        if blocked == self.blocked {
            return None;
        }
        self.blocked = blocked;
        debug!("movement {}", if blocked { "blocked" } else { "unblocked" });
        Some(if blocked {
            LatchEdge::Blocked
        } else {
            LatchEdge::Unblocked
        })
    }

    pub fn reset(&mut self) {
        self.blocked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_transition_once() {
        let mut latch = BlockedLatch::default();
        assert_eq!(latch.update(0.02, 0.02), None);
        assert_eq!(latch.update(0.02, 0.001), Some(LatchEdge::Blocked));
        // Staying blocked does not toggle.
        for _ in 0..5 {
            assert_eq!(latch.update(0.02, 0.0), None);
            assert!(latch.is_blocked());
        }
        assert_eq!(latch.update(0.02, 0.019), Some(LatchEdge::Unblocked));
        assert_eq!(latch.update(0.02, 0.019), None);
    }

    #[test]
    fn releasing_input_unblocks() {
        let mut latch = BlockedLatch::default();
        latch.update(0.02, 0.0);
        assert_eq!(latch.update(0.0, 0.0), Some(LatchEdge::Unblocked));
    }

    #[test]
    fn no_request_is_never_blocked() {
        let mut latch = BlockedLatch::default();
        assert_eq!(latch.update(0.0, 0.0), None);
        assert!(!latch.is_blocked());
    }
}
