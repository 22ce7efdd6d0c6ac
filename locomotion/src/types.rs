/*!
Core math aliases and small value types shared by the locomotion modules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- the ground sampler (probe results)
- the body physics provider (pose, force modes)
- the movement propagator and the gait controller (leg-space points)
- the orchestrator (per-tick input, output and events)

Conventions
- Y-up, right-handed (Rapier convention).
- Units are meters and seconds; angles are radians unless the name says `_deg`.
*/

use nalgebra as na;

use crate::leg::LegId;

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World up for the simulation (+Y).
#[inline]
pub fn world_up() -> Vec3 {
    Vec3::y()
}

/// A rigid body pose (isometry) in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    #[inline]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }

    /// Transform a body-local point into world space.
    #[inline]
    pub fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Body up axis (`rotation * +Y`).
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }

    /// Body forward axis (`rotation * -Z`).
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    /// Convert to nalgebra `Isometry3` for use with Rapier queries.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.position), self.rotation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// A single downward-probe contact returned by a ground query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    /// World-space contact point.
    pub point: Vec3,
    /// World-space unit surface normal at the contact.
    pub normal: Vec3,
    /// Distance travelled along the probe before the hit (meters).
    pub distance: f32,
}

/// How a force passed to [`crate::body::BodyPhysics::add_force`] is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceMode {
    /// Continuous force, integrated over the provider's next step (N).
    Force,
    /// Instantaneous velocity change scaled by mass (N·s).
    Impulse,
    /// Continuous acceleration, mass-independent (m/s²).
    Acceleration,
}

/// Per-tick input supplied by the input/mode layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocomotionInput {
    /// Planar movement intent: `x` = strafe right, `y` = forward. Magnitude is clamped to 1.
    pub movement: Vec2,
    /// Look/aim intent: `x` = yaw rate (positive turns left), `y` = pitch (unused by walking).
    pub look: Vec2,
}

impl LocomotionInput {
    #[inline]
    pub fn new(movement: Vec2, look: Vec2) -> Self {
        Self { movement, look }
    }

    /// Movement-only input with no look component.
    #[inline]
    pub fn moving(x: f32, y: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::zeros())
    }

    #[inline]
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Notifications emitted by a locomotion tick, in the order they happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocomotionEvent {
    StepStarted(LegId),
    /// The leg touched down and its foothold was committed.
    StepCompleted(LegId),
    OpeningFinished,
    Blocked,
    Unblocked,
}
