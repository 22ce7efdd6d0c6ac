//! Physics provider contract and a kinematic implementation over the static ground world.

use std::rc::Rc;

use log::debug;
use nalgebra::Unit;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::{Capsule, QueryFilter};

use crate::constants::DIST_EPS;
use crate::ground::GroundQuery;
use crate::layers::GroundMask;
use crate::types::{ForceMode, Pose, Quat, Vec3, world_up};
use crate::world::StaticGroundWorld;

/// What the locomotion subsystem needs from the rigid body it drives.
///
/// `move_position` and `move_rotation` resolve immediately against the provider's collision
/// response; the realized displacement is read back through `position` / `rotation`.
pub trait BodyPhysics {
    fn is_grounded(&self) -> bool;
    /// Unit normal of the supporting surface. Only meaningful while grounded.
    fn ground_normal(&self) -> Vec3;
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn move_position(&mut self, delta: Vec3);
    fn move_rotation(&mut self, delta: Quat);
    fn add_force(&mut self, force: Vec3, mode: ForceMode);

    #[inline]
    fn pose(&self) -> Pose {
        Pose::new(self.position(), self.rotation())
    }
}

/// Capsule dimensions of a [`KinematicBody`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleSpec {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleSpec {
    /// Distance from the capsule center to its lowest point.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.half_height + self.radius
    }
}

/// Extra reach below the capsule bottom that still counts as grounded.
const GROUND_TOLERANCE: f32 = 0.05;

/// Character body moved by Rapier's `KinematicCharacterController`.
///
/// Forces accumulate until [`KinematicBody::integrate`] runs; the scheduler calls it once per
/// fixed step after the locomotion tick.
pub struct KinematicBody {
    world: Rc<StaticGroundWorld>,
    kcc: KinematicCharacterController,
    capsule: CapsuleSpec,
    mass: f32,
    pose: Pose,
    velocity: Vec3,
    acceleration: Vec3,
    grounded: bool,
    ground_normal: Vec3,
    dt: f32,
}

impl KinematicBody {
    pub fn new(world: Rc<StaticGroundWorld>, capsule: CapsuleSpec, pose: Pose, dt: f32) -> Self {
        let kcc = KinematicCharacterController {
            autostep: Some(CharacterAutostep {
                include_dynamic_bodies: false,
                max_height: CharacterLength::Relative(0.4),
                ..CharacterAutostep::default()
            }),
            offset: CharacterLength::Absolute(0.01),
            ..KinematicCharacterController::default()
        };
        let mut body = Self {
            world,
            kcc,
            capsule,
            mass: 1.0,
            pose,
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            grounded: false,
            ground_normal: world_up(),
            dt,
        };
        body.refresh_contact();
        body
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass.max(DIST_EPS);
        self
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn capsule(&self) -> CapsuleSpec {
        self.capsule
    }

    /// Sweep the capsule by `desired`, returning the translation actually applied.
    fn sweep(&mut self, desired: Vec3) -> Vec3 {
        if desired.norm_squared() <= DIST_EPS * DIST_EPS {
            return Vec3::zeros();
        }
        self.kcc.up = Unit::try_new(self.pose.up(), DIST_EPS).unwrap_or(Vec3::y_axis());
        let pipeline = self.world.query_pipeline(QueryFilter::only_fixed());
        let correction = self.kcc.move_shape(
            self.dt,
            &pipeline,
            &Capsule::new_y(self.capsule.half_height, self.capsule.radius),
            &self.pose.iso(),
            desired,
            |_| {},
        );
        self.pose.position += correction.translation;
        correction.translation
    }

    /// Re-derive grounded state and normal from a probe along the body's down axis.
    fn refresh_contact(&mut self) {
        let up = Unit::try_new(self.pose.up(), DIST_EPS).unwrap_or(Vec3::y_axis());
        let hit = self.world.cast(
            &self.pose.position,
            &-up,
            self.capsule.bottom() + GROUND_TOLERANCE,
            GroundMask::all(),
        );
        let was_grounded = self.grounded;
        self.grounded = hit.is_some();
        self.ground_normal = hit.map(|h| h.normal).unwrap_or(up.into_inner());
        if was_grounded != self.grounded {
            debug!("body grounded: {}", self.grounded);
        }
    }

    /// Integrate accumulated forces over `dt` and resolve the motion against the world.
    pub fn integrate(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.dt = dt;
        self.velocity += self.acceleration * dt;
        self.acceleration = Vec3::zeros();

        let desired = self.velocity * dt;
        let applied = self.sweep(desired);
        self.refresh_contact();

        // Velocity the world absorbed is gone.
        if applied.norm_squared() + DIST_EPS < desired.norm_squared() {
            self.velocity = applied / dt;
        }
        if self.grounded {
            let into_ground = self.velocity.dot(&self.ground_normal);
            if into_ground < 0.0 {
                self.velocity -= self.ground_normal * into_ground;
            }
        }
    }
}

impl BodyPhysics for KinematicBody {
    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn ground_normal(&self) -> Vec3 {
        self.ground_normal
    }

    fn position(&self) -> Vec3 {
        self.pose.position
    }

    fn rotation(&self) -> Quat {
        self.pose.rotation
    }

    fn move_position(&mut self, delta: Vec3) {
        self.sweep(delta);
        self.refresh_contact();
    }

    fn move_rotation(&mut self, delta: Quat) {
        self.pose.rotation = delta * self.pose.rotation;
        self.pose.rotation.renormalize_fast();
    }

    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.acceleration += force / self.mass,
            ForceMode::Acceleration => self.acceleration += force,
            ForceMode::Impulse => self.velocity += force / self.mass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::GroundLayer;
    use crate::world::{ColliderShapeDef, WorldStaticDef};
    use approx::assert_relative_eq;

    const CAPSULE: CapsuleSpec = CapsuleSpec {
        radius: 0.2,
        half_height: 0.1,
    };

    fn world(with_wall: bool) -> Rc<StaticGroundWorld> {
        let mut defs = vec![WorldStaticDef {
            id: 0,
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
            layers: GroundMask::of(&[GroundLayer::Walkable]),
        }];
        if with_wall {
            defs.push(WorldStaticDef {
                id: 1,
                translation: Vec3::new(1.0, 1.0, 0.0),
                rotation: Quat::identity(),
                shape: ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(0.1, 1.0, 2.0),
                },
                layers: GroundMask::of(&[GroundLayer::Climbable]),
            });
        }
        Rc::new(StaticGroundWorld::build(defs))
    }

    fn standing(world: Rc<StaticGroundWorld>) -> KinematicBody {
        let pose = Pose::new(Vec3::new(0.0, CAPSULE.bottom() + 0.01, 0.0), Quat::identity());
        KinematicBody::new(world, CAPSULE, pose, 1.0 / 60.0)
    }

    #[test]
    fn standing_body_is_grounded_on_the_floor() {
        let body = standing(world(false));
        assert!(body.is_grounded());
        assert_relative_eq!(body.ground_normal(), Vec3::y(), epsilon = 1.0e-4);
    }

    #[test]
    fn falling_body_lands() {
        let pose = Pose::new(Vec3::new(0.0, 1.5, 0.0), Quat::identity());
        let mut body = KinematicBody::new(world(false), CAPSULE, pose, 1.0 / 60.0);
        assert!(!body.is_grounded());
        for _ in 0..180 {
            if !body.is_grounded() {
                body.add_force(Vec3::new(0.0, -9.81, 0.0), ForceMode::Acceleration);
            }
            body.integrate(1.0 / 60.0);
        }
        assert!(body.is_grounded());
        assert!(body.position().y > CAPSULE.bottom() - 0.02);
        assert!(body.position().y < CAPSULE.bottom() + GROUND_TOLERANCE);
    }

    #[test]
    fn walls_block_requested_movement() {
        let mut body = standing(world(true));
        body.move_position(Vec3::new(2.0, 0.0, 0.0));
        // Wall face is at x = 0.9; the capsule keeps its radius from it.
        assert!(body.position().x < 0.9 - CAPSULE.radius + 0.02, "{:?}", body.position());
        assert!(body.position().x > 0.5);
    }

    #[test]
    fn rotation_composes_in_world_space() {
        let mut body = standing(world(false));
        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), 0.3);
        body.move_rotation(yaw);
        body.move_rotation(yaw);
        assert_relative_eq!(body.rotation().angle(), 0.6, epsilon = 1.0e-5);
    }

    #[test]
    fn impulses_change_velocity_immediately() {
        let mut body = standing(world(false)).with_mass(2.0);
        body.add_force(Vec3::new(4.0, 0.0, 0.0), ForceMode::Impulse);
        assert_relative_eq!(body.velocity(), Vec3::new(2.0, 0.0, 0.0));
    }
}
