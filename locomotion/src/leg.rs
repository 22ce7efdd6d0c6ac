//! Per-leg state and the static diagonal partition of a quadruped.

use crate::filter::DynamicsFilter;
use crate::types::{Quat, Vec3};

/// One of the four limbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LegId {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl LegId {
    pub const ALL: [LegId; 4] = [
        LegId::FrontLeft,
        LegId::FrontRight,
        LegId::RearLeft,
        LegId::RearRight,
    ];

    /// Stable index into per-leg arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            LegId::FrontLeft => 0,
            LegId::FrontRight => 1,
            LegId::RearLeft => 2,
            LegId::RearRight => 3,
        }
    }

    /// Diagonal pair this leg steps with.
    #[inline]
    pub const fn group(self) -> LegGroup {
        match self {
            LegId::FrontLeft | LegId::RearRight => LegGroup::A,
            LegId::FrontRight | LegId::RearLeft => LegGroup::B,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            LegId::FrontLeft => "front_left",
            LegId::FrontRight => "front_right",
            LegId::RearLeft => "rear_left",
            LegId::RearRight => "rear_right",
        }
    }
}

impl std::fmt::Display for LegId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagonal leg pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LegGroup {
    /// Front-left and rear-right.
    A,
    /// Front-right and rear-left.
    B,
}

impl LegGroup {
    #[inline]
    pub const fn legs(self) -> [LegId; 2] {
        match self {
            LegGroup::A => [LegId::FrontLeft, LegId::RearRight],
            LegGroup::B => [LegId::FrontRight, LegId::RearLeft],
        }
    }

    #[inline]
    pub const fn other(self) -> LegGroup {
        match self {
            LegGroup::A => LegGroup::B,
            LegGroup::B => LegGroup::A,
        }
    }
}

/// Mutable record for one limb.
///
/// `step_progress == 1.0` means planted. While planted the foot is held at `previous_foothold`;
/// while stepping it travels toward `next_foothold` through the leg's filter.
#[derive(Clone, Debug)]
pub struct LegState {
    pub id: LegId,
    /// Position written to the visual target each tick.
    pub current_world_position: Vec3,
    pub previous_foothold: Vec3,
    pub next_foothold: Vec3,
    step_progress: f32,
    /// Rest offset from the body origin, in body space.
    pub hip_relative_offset: Vec3,
    pub filter: DynamicsFilter,
}

impl LegState {
    /// A planted leg resting on `foothold`.
    pub fn planted(
        id: LegId,
        hip_relative_offset: Vec3,
        foothold: Vec3,
        mut filter: DynamicsFilter,
    ) -> Self {
        filter.reset(foothold);
        Self {
            id,
            current_world_position: foothold,
            previous_foothold: foothold,
            next_foothold: foothold,
            step_progress: 1.0,
            hip_relative_offset,
            filter,
        }
    }

    #[inline]
    pub fn step_progress(&self) -> f32 {
        self.step_progress
    }

    #[inline]
    pub fn is_planted(&self) -> bool {
        self.step_progress >= 1.0
    }

    #[inline]
    pub fn is_stepping(&self) -> bool {
        !self.is_planted()
    }

    /// Begin a step toward `target`. Only legal while planted.
    pub fn begin_step(&mut self, target: Vec3) {
        assert!(
            self.is_planted(),
            "{} redirected mid-step (progress {})",
            self.id,
            self.step_progress
        );
        self.previous_foothold = self.next_foothold;
        self.next_foothold = target;
        self.step_progress = 0.0;
    }

    /// Advance progress by `amount`, clamped to 1. Returns true on the tick the leg lands.
    pub(crate) fn advance_progress(&mut self, amount: f32) -> bool {
        if self.is_planted() {
            return false;
        }
        self.step_progress = (self.step_progress + amount).clamp(0.0, 1.0);
        self.is_planted()
    }

    /// Commit the step: the target becomes the resting foothold and the filter re-seeds there.
    pub(crate) fn land(&mut self) {
        self.step_progress = 1.0;
        self.previous_foothold = self.next_foothold;
        self.filter.reset(self.next_foothold);
    }

    /// Plant on `foothold` without an animated step.
    pub(crate) fn reseat(&mut self, foothold: Vec3) {
        self.step_progress = 1.0;
        self.previous_foothold = foothold;
        self.next_foothold = foothold;
        self.filter.reset(foothold);
    }

    /// Carry every tracked point rigidly with the body.
    pub(crate) fn carry(&mut self, pivot: &Vec3, rotation: &Quat, translation: &Vec3) {
        let map = |p: &Vec3| pivot + rotation * (p - pivot) + translation;
        self.current_world_position = map(&self.current_world_position);
        self.previous_foothold = map(&self.previous_foothold);
        self.next_foothold = map(&self.next_foothold);
        self.filter.carry(pivot, rotation, translation);
    }
}

/// The four legs, indexed by [`LegId::index`].
pub type Legs = [LegState; 4];

/// True when every leg of `group` is planted.
#[inline]
pub fn group_finished(legs: &Legs, group: LegGroup) -> bool {
    group.legs().iter().all(|id| legs[id.index()].is_planted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn leg(id: LegId) -> LegState {
        let filter = DynamicsFilter::new(4.0, 1.0, 0.0, Vec3::zeros()).unwrap();
        LegState::planted(id, Vec3::zeros(), Vec3::zeros(), filter)
    }

    #[test]
    fn groups_are_diagonal_pairs() {
        assert_eq!(LegGroup::A.legs(), [LegId::FrontLeft, LegId::RearRight]);
        assert_eq!(LegGroup::B.legs(), [LegId::FrontRight, LegId::RearLeft]);
        for id in LegId::ALL {
            assert!(id.group().legs().contains(&id));
            assert_eq!(LegId::ALL[id.index()], id);
        }
        assert_eq!(LegGroup::A.other(), LegGroup::B);
    }

    #[test]
    fn step_lifecycle_commits_foothold_on_landing() {
        let mut leg = leg(LegId::FrontLeft);
        leg.begin_step(Vec3::new(0.3, 0.0, 0.0));
        assert!(leg.is_stepping());
        assert!(!leg.advance_progress(0.6));
        assert!(leg.advance_progress(0.6));
        assert_relative_eq!(leg.step_progress(), 1.0);
        leg.land();
        assert_eq!(leg.previous_foothold, Vec3::new(0.3, 0.0, 0.0));
        assert_eq!(leg.filter.output(), Vec3::new(0.3, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "redirected mid-step")]
    fn redirect_mid_step_is_a_fault() {
        let mut leg = leg(LegId::RearLeft);
        leg.begin_step(Vec3::x());
        leg.begin_step(Vec3::z());
    }

    #[test]
    fn carry_moves_all_points() {
        let mut leg = leg(LegId::RearRight);
        leg.begin_step(Vec3::x());
        leg.carry(&Vec3::zeros(), &Quat::identity(), &Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(leg.previous_foothold, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(leg.next_foothold, Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(leg.current_world_position, Vec3::new(0.0, 0.5, 0.0));
    }
}
