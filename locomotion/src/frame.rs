//! Ground-aligned movement frame.
//!
//! Movement input is expressed in a frame whose `up` is the ground normal and whose `forward` is
//! the body's facing projected onto the ground plane. On walls the facing can be (almost)
//! parallel to the normal; then forward is remapped to world up projected onto the plane (climb
//! upward), and failing that to the body's up.

use crate::constants::DIST_EPS;
use crate::ground::sanitize_normal;
use crate::types::{Pose, Quat, Vec2, Vec3, world_up};

/// Below this projected length the facing is treated as parallel to the normal.
const DEGENERATE_PROJECTION: f32 = 1.0e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceFrame {
    pub up: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
}

impl SurfaceFrame {
    pub fn new(pose: &Pose, ground_normal: &Vec3) -> Self {
        let up = sanitize_normal(ground_normal, &pose.up());
        let forward = [pose.forward(), world_up(), pose.up(), -Vec3::z(), Vec3::x()]
            .iter()
            .find_map(|candidate| project_onto_plane(candidate, &up))
            .unwrap_or_else(|| any_perpendicular(&up));
        let right = forward.cross(&up);
        Self { up, forward, right }
    }

    /// Planar movement for this tick. `input.x` strafes right, `input.y` moves forward; the
    /// input magnitude is clamped to 1.
    pub fn movement(&self, input: &Vec2, speed: f32, dt: f32) -> Vec3 {
        let input = if input.norm_squared() > 1.0 {
            input.normalize()
        } else {
            *input
        };
        (self.right * input.x + self.forward * input.y) * speed * dt
    }

    /// Yaw about the frame's up for this tick. Positive `look_x` turns left.
    pub fn turn(&self, look_x: f32, turn_speed: f32, dt: f32) -> Quat {
        let angle = look_x.clamp(-1.0, 1.0) * turn_speed * dt;
        match nalgebra::Unit::try_new(self.up, DIST_EPS) {
            Some(axis) => Quat::from_axis_angle(&axis, angle),
            None => Quat::identity(),
        }
    }
}

fn project_onto_plane(v: &Vec3, normal: &Vec3) -> Option<Vec3> {
    let projected = v - normal * v.dot(normal);
    if projected.norm() < DEGENERATE_PROJECTION {
        return None;
    }
    Some(projected.normalize())
}

fn any_perpendicular(normal: &Vec3) -> Vec3 {
    let axis = if normal.x.abs() < 0.9 { Vec3::x() } else { Vec3::z() };
    normal.cross(&axis).normalize()
}
