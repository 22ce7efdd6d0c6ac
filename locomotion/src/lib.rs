pub mod body;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod filter;
pub mod frame;
pub mod gait;
pub mod ground;
pub mod latch;
pub mod layers;
pub mod leg;
pub mod opening;
pub mod orchestrator;
pub mod propagate;
pub mod types;
pub mod world;

pub use body::{BodyPhysics, CapsuleSpec, KinematicBody};
pub use config::{LegConfig, LegsConfig, LocomotionConfig};
pub use constants::{DIST_EPS, GRAVITY_MPS2, LEG_COUNT, MOVE_EPS, TURN_EPS};
pub use curve::RemapCurve;
pub use error::{LocomotionError, Result};
pub use filter::DynamicsFilter;
pub use frame::SurfaceFrame;
pub use gait::{FootholdSource, GaitController, GaitInputs, GaitParams, GaitPhase};
pub use ground::{GroundQuery, GroundSampler, ProbeSettings};
pub use latch::{BlockedLatch, LatchEdge};
pub use layers::{GroundLayer, GroundMask};
pub use leg::{LegGroup, LegId, LegState, Legs, group_finished};
pub use opening::{OpeningSequence, OpeningStatus};
pub use orchestrator::{LocomotionOrchestrator, TickOutput};
pub use propagate::{BodyMovementPropagator, Residual};
pub use types::{
    ForceMode, GroundHit, LocomotionEvent, LocomotionInput, Pose, Quat, Vec2, Vec3, world_up,
};
pub use world::{ColliderShapeDef, StaticGroundWorld, WorldStaticDef, collider_from_def};
