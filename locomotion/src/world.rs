//! Rapier-backed query world over immutable ground geometry.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: supports ground ray casts and the Rapier `KinematicCharacterController`.
//! - Immutable world: statics do not move after construction.
//!
//! Each collider carries its [`GroundMask`] in `user_data`, so ground probes can reject
//! hazards and other non-walkable layers.

use nalgebra::{Isometry3, Translation3, Unit};
use rapier3d::prelude::{
    BroadPhaseBvh, Collider, ColliderBuilder, ColliderHandle, ColliderSet, HalfSpace,
    IntegrationParameters, NarrowPhase, Point, QueryFilter, QueryPipeline, Ray, RigidBodySet,
    SharedShape, UnitVector,
};

use crate::ground::{GroundQuery, sanitize_normal};
use crate::layers::GroundMask;
use crate::types::{GroundHit, Quat, Vec3};

/// Definition of one immutable ground collider.
///
/// Conventions
/// - Units are meters.
/// - For planes the normal is derived from the pose, `normal = rotation * +Y`, and
///   `dist = dot(normal, translation) + offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    pub shape: ColliderShapeDef,
    /// Ground layers this collider belongs to.
    pub layers: GroundMask,
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), offset along its pose-derived normal.
    Plane { offset_along_normal: f32 },
    /// Oriented cuboid with given half-extents.
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },
    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },
    /// Cuboid with rounded edges and corners.
    RoundCuboid {
        half_extents: Vec3,
        border_radius: f32,
    },
}

/// Build a Rapier collider from a `WorldStaticDef`, posed in world space.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let user_data = def.layers.to_user_data();
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // Plane `n · x = dist`; the half-space sits at `n * dist` with identity rotation.
            let n = def.rotation * Vec3::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);
            return ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
                .translation(unit_n.into_inner() * dist)
                .user_data(user_data)
                .build();
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        ),
    };

    let mut collider = builder.user_data(user_data).build();
    collider.set_position(Isometry3::from_parts(
        Translation3::from(def.translation),
        def.rotation,
    ));
    collider
}

/// In-memory Rapier structures for scene queries against static ground.
pub struct StaticGroundWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl StaticGroundWorld {
    /// Build from static definitions. Input is sorted by `id` before insertion.
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let modified_colliders: Vec<_> = defs
            .iter()
            .map(|def| colliders.insert(collider_from_def(def)))
            .collect();

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        log::info!("built static ground world with {} colliders", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
        }
    }

    /// Borrowed `QueryPipeline` view for scene queries and the KCC.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl GroundQuery for StaticGroundWorld {
    fn cast(
        &self,
        origin: &Vec3,
        direction: &Unit<Vec3>,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<GroundHit> {
        let accepts = |_: ColliderHandle, collider: &Collider| {
            GroundMask::from_user_data(collider.user_data).intersects(mask)
        };
        let pipeline = self.query_pipeline(QueryFilter::only_fixed().predicate(&accepts));
        let ray = Ray::new(Point::from(*origin), direction.into_inner());
        let (_, hit) = pipeline.cast_ray_and_get_normal(&ray, max_distance, true)?;

        Some(GroundHit {
            point: origin + direction.into_inner() * hit.time_of_impact,
            normal: sanitize_normal(&hit.normal, &-direction.into_inner()),
            distance: hit.time_of_impact,
        })
    }
}
