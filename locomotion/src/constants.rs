//! Tuning defaults and tolerances for the locomotion subsystem.
//!
//! These are the values [`crate::config::LocomotionConfig`] falls back to when a field is
//! omitted. Distances are meters, time is seconds, angles are degrees where the name says so.

/// Movement delta (meters per tick) below which the body is considered stationary.
pub const MOVE_EPS: f32 = 1.0e-4;

/// Rotation delta (radians per tick) below which the body is considered not turning.
pub const TURN_EPS: f32 = 1.0e-4;

/// Practical small distance for comparisons (meters).
pub const DIST_EPS: f32 = 1.0e-6;

/// Default natural frequency of the per-leg dynamics filter (Hz).
pub const DEFAULT_FREQUENCY: f32 = 4.0;

/// Default damping ratio of the per-leg dynamics filter (1.0 = critically damped).
pub const DEFAULT_DAMPING: f32 = 1.0;

/// Default response gain of the per-leg dynamics filter (anticipation when > 0).
pub const DEFAULT_RESPONSE: f32 = 0.0;

/// Step progress gained per second while a leg is mid-step.
pub const DEFAULT_STEP_SPEED: f32 = 5.0;

/// Peak height of the swing arc above the straight foothold-to-foothold line.
pub const DEFAULT_STEP_HEIGHT: f32 = 0.12;

/// Resting height of a planted foot above its ground contact.
pub const DEFAULT_REST_FOOT_HEIGHT: f32 = 0.02;

/// A new contact closer than this to the current foothold does not start a step.
pub const DEFAULT_MIN_REDIRECT_DISTANCE: f32 = 0.15;

/// Fraction of the predicted body movement used to bias footholds forward.
///
/// Expressed in ticks of predicted movement: `hip + predicted_delta * ANTICIPATION`.
pub const DEFAULT_ANTICIPATION: f32 = 8.0;

/// Height above the hip from which ground probes start.
pub const DEFAULT_PROBE_HEIGHT: f32 = 0.5;

/// Maximum probe length below the probe origin.
pub const DEFAULT_PROBE_DISTANCE: f32 = 2.0;

/// Idle re-seat: contacts farther than this from the current foot are ignored.
pub const DEFAULT_IDLE_RESEAT_DISTANCE: f32 = 0.1;

/// Contacts whose normals lie within this angle of each other count as uniform ground.
pub const DEFAULT_UNIFORM_GROUND_TOLERANCE_DEG: f32 = 1.0;

/// Body translation speed at full movement input (m/s).
pub const DEFAULT_MOVE_SPEED: f32 = 1.5;

/// Body yaw rate at full look input (rad/s).
pub const DEFAULT_TURN_SPEED: f32 = 2.0;

/// Magnitude of the attach acceleration pressing the body into uniform ground (m/s²).
pub const DEFAULT_ATTACH_ACCELERATION: f32 = 4.0;

/// Gravity magnitude in meters per second squared (positive value).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Duration of the opening (attach / fade-in) sequence.
pub const DEFAULT_OPENING_DURATION: f32 = 0.5;

/// Realized/requested ratio below which a movement request counts as blocked.
pub const BLOCKED_RATIO: f32 = 0.25;

/// Largest gap between the swing filter and the target tolerated silently at touchdown.
pub const LANDING_GAP_WARN: f32 = 0.05;

/// Progress from which the swing output is blended onto the target foothold.
pub const TOUCHDOWN_BLEND_START: f32 = 0.75;

/// Number of legs of a quadruped.
pub const LEG_COUNT: usize = 4;
