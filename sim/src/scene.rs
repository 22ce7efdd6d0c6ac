//! Static scene description and conversion into the ground query world.

use locomotion::{
    CapsuleSpec, ColliderShapeDef, GroundLayer, GroundMask, Pose, Quat, StaticGroundWorld, Vec3,
    WorldStaticDef,
};
use serde::{Deserialize, Serialize};

/// Static collider shape as written in scene files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaticShape {
    Plane {
        #[serde(default)]
        offset: f32,
    },
    Cuboid {
        half_extents: [f32; 3],
    },
    Sphere {
        radius: f32,
    },
    Capsule {
        radius: f32,
        half_height: f32,
    },
    Cylinder {
        radius: f32,
        half_height: f32,
    },
    RoundCuboid {
        half_extents: [f32; 3],
        border_radius: f32,
    },
}

fn default_layers() -> u32 {
    GroundMask::of(&[GroundLayer::Walkable]).bits
}

/// One immutable collider of the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticRow {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Euler angles in degrees, applied roll (X), pitch (Y), yaw (Z).
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    pub shape: StaticShape,
    /// Ground layer bits.
    #[serde(default = "default_layers")]
    pub layers: u32,
}

impl StaticRow {
    fn new(id: u32, translation: [f32; 3], shape: StaticShape) -> Self {
        Self {
            id,
            translation,
            rotation_deg: [0.0; 3],
            shape,
            layers: default_layers(),
        }
    }
}

/// Convert a scene row to the world definition.
pub fn row_to_def(row: &StaticRow) -> WorldStaticDef {
    let [rx, ry, rz] = row.rotation_deg;
    let shape = match row.shape {
        StaticShape::Plane { offset } => ColliderShapeDef::Plane {
            offset_along_normal: offset,
        },
        StaticShape::Cuboid { half_extents } => ColliderShapeDef::Cuboid {
            half_extents: half_extents.into(),
        },
        StaticShape::Sphere { radius } => ColliderShapeDef::Sphere { radius },
        StaticShape::Capsule {
            radius,
            half_height,
        } => ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        },
        StaticShape::Cylinder {
            radius,
            half_height,
        } => ColliderShapeDef::CylinderY {
            radius,
            half_height,
        },
        StaticShape::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderShapeDef::RoundCuboid {
            half_extents: half_extents.into(),
            border_radius,
        },
    };

    WorldStaticDef {
        id: row.id,
        translation: row.translation.into(),
        rotation: Quat::from_euler_angles(rx.to_radians(), ry.to_radians(), rz.to_radians()),
        shape,
        layers: GroundMask::new(row.layers),
    }
}

fn default_statics() -> Vec<StaticRow> {
    // Infinite ground plane at y = 0.
    let mut rows = vec![StaticRow::new(0, [0.0; 3], StaticShape::Plane { offset: 0.0 })];

    // A simple oriented cuboid obstacle.
    rows.push(StaticRow {
        layers: GroundMask::of(&[GroundLayer::Climbable]).bits,
        ..StaticRow::new(
            1,
            [3.0, 1.0, 0.0],
            StaticShape::Cuboid {
                half_extents: [1.0; 3],
            },
        )
    });

    // A ramp tilted 10 degrees about X, rising toward -Z.
    rows.push(StaticRow {
        rotation_deg: [10.0, 0.0, 0.0],
        ..StaticRow::new(
            2,
            [-3.0, -0.8, -6.0],
            StaticShape::Cuboid {
                half_extents: [1.0, 1.0, 5.0],
            },
        )
    });

    // Low stairs along +X.
    let step_run = 0.5;
    let step_rise = 0.08;
    for i in 0..8 {
        let half_height = (i + 1) as f32 * step_rise * 0.5;
        rows.push(StaticRow::new(
            10 + i,
            [2.0 + i as f32 * step_run, half_height, 6.0],
            StaticShape::Cuboid {
                half_extents: [step_run * 0.5, half_height, 1.5],
            },
        ));
    }
    rows
}

fn default_spawn() -> [f32; 3] {
    [0.0, 0.32, 0.0]
}

fn default_capsule_radius() -> f32 {
    0.2
}

fn default_capsule_half_height() -> f32 {
    0.1
}

fn default_mass() -> f32 {
    1.0
}

/// Scene layout, spawn pose and body dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_statics")]
    pub statics: Vec<StaticRow>,
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 3],
    /// Yaw about +Y in degrees.
    #[serde(default)]
    pub spawn_yaw_deg: f32,
    #[serde(default = "default_capsule_radius")]
    pub capsule_radius: f32,
    #[serde(default = "default_capsule_half_height")]
    pub capsule_half_height: f32,
    #[serde(default = "default_mass")]
    pub mass: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            statics: default_statics(),
            spawn: default_spawn(),
            spawn_yaw_deg: 0.0,
            capsule_radius: default_capsule_radius(),
            capsule_half_height: default_capsule_half_height(),
            mass: default_mass(),
        }
    }
}

impl SceneConfig {
    /// Just the ground plane.
    pub fn flat() -> Self {
        Self {
            statics: vec![StaticRow::new(0, [0.0; 3], StaticShape::Plane { offset: 0.0 })],
            ..Self::default()
        }
    }

    pub fn build_world(&self) -> StaticGroundWorld {
        StaticGroundWorld::build(self.statics.iter().map(row_to_def).collect())
    }

    pub fn spawn_pose(&self) -> Pose {
        Pose::new(
            Vec3::from(self.spawn),
            Quat::from_axis_angle(&Vec3::y_axis(), self.spawn_yaw_deg.to_radians()),
        )
    }

    pub fn capsule(&self) -> CapsuleSpec {
        CapsuleSpec {
            radius: self.capsule_radius,
            half_height: self.capsule_half_height,
        }
    }
}
