//! Carries leg state along with body displacement the gait did not cause.
//!
//! The propagator remembers the body pose the legs were last reconciled with. Displacement since
//! then (moving platforms, falling, impulses) is applied rigidly to every leg point, so planted
//! feet ride along instead of being dragged. Displacement caused by locomotion itself is recorded
//! with [`BodyMovementPropagator::mark_applied`] and never reaches the legs.

use crate::constants::{MOVE_EPS, TURN_EPS};
use crate::leg::Legs;
use crate::types::{Pose, Quat, Vec3};

/// Displacement applied by one [`BodyMovementPropagator::propagate`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Residual {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Residual {
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }

    /// Below the movement and turning thresholds.
    pub fn is_negligible(&self) -> bool {
        self.translation.norm() <= MOVE_EPS && self.rotation.angle() <= TURN_EPS
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyMovementPropagator {
    reference: Pose,
}

impl BodyMovementPropagator {
    pub fn new(pose: Pose) -> Self {
        Self { reference: pose }
    }

    pub fn reference(&self) -> &Pose {
        &self.reference
    }

    /// Apply the unapplied remainder between the reference pose and `pose` to every leg.
    pub fn propagate(&mut self, pose: &Pose, legs: &mut Legs) -> Residual {
        if *pose == self.reference {
            return Residual::identity();
        }
        let residual = Residual {
            translation: pose.position - self.reference.position,
            rotation: pose.rotation * self.reference.rotation.inverse(),
        };
        let pivot = self.reference.position;
        for leg in legs.iter_mut() {
            leg.carry(&pivot, &residual.rotation, &residual.translation);
        }
        self.reference = *pose;
        residual
    }

    /// Record that the body reached `pose` through locomotion; legs must not follow.
    pub fn mark_applied(&mut self, pose: &Pose) {
        self.reference = *pose;
    }
}
