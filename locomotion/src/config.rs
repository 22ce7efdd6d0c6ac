use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::curve::RemapCurve;
use crate::error::{LocomotionError, Result};
use crate::filter::DynamicsFilter;
use crate::gait::GaitParams;
use crate::ground::ProbeSettings;
use crate::layers::GroundMask;
use crate::leg::LegId;
use crate::types::Vec3;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_frequency() -> f32 {
    DEFAULT_FREQUENCY
}
const fn default_damping() -> f32 {
    DEFAULT_DAMPING
}
const fn default_response() -> f32 {
    DEFAULT_RESPONSE
}
const fn default_step_speed() -> f32 {
    DEFAULT_STEP_SPEED
}
const fn default_step_height() -> f32 {
    DEFAULT_STEP_HEIGHT
}
const fn default_rest_foot_height() -> f32 {
    DEFAULT_REST_FOOT_HEIGHT
}
const fn default_min_redirect_distance() -> f32 {
    DEFAULT_MIN_REDIRECT_DISTANCE
}
const fn default_anticipation() -> f32 {
    DEFAULT_ANTICIPATION
}
const fn default_probe_height() -> f32 {
    DEFAULT_PROBE_HEIGHT
}
const fn default_probe_distance() -> f32 {
    DEFAULT_PROBE_DISTANCE
}
const fn default_idle_reseat_distance() -> f32 {
    DEFAULT_IDLE_RESEAT_DISTANCE
}
const fn default_uniform_ground_tolerance_deg() -> f32 {
    DEFAULT_UNIFORM_GROUND_TOLERANCE_DEG
}
const fn default_move_speed() -> f32 {
    DEFAULT_MOVE_SPEED
}
const fn default_turn_speed() -> f32 {
    DEFAULT_TURN_SPEED
}
const fn default_attach_acceleration() -> f32 {
    DEFAULT_ATTACH_ACCELERATION
}
const fn default_gravity() -> f32 {
    GRAVITY_MPS2
}
const fn default_opening_duration() -> f32 {
    DEFAULT_OPENING_DURATION
}
fn default_ground_mask() -> u32 {
    GroundMask::walkable().bits
}
const fn default_front_left() -> LegConfig {
    LegConfig::at([-0.2, 0.0, -0.3])
}
const fn default_front_right() -> LegConfig {
    LegConfig::at([0.2, 0.0, -0.3])
}
const fn default_rear_left() -> LegConfig {
    LegConfig::at([-0.2, 0.0, 0.3])
}
const fn default_rear_right() -> LegConfig {
    LegConfig::at([0.2, 0.0, 0.3])
}

// ---------------------------------------------------------------------------
// LegConfig
// ---------------------------------------------------------------------------

/// Rest offset and swing dynamics of one leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    /// Hip offset from the body origin in body space [x, y, z] (meters).
    pub hip_offset: [f32; 3],

    /// Natural frequency of the swing filter (Hz).
    #[serde(default = "default_frequency")]
    pub frequency: f32,

    /// Damping ratio of the swing filter.
    #[serde(default = "default_damping")]
    pub damping: f32,

    /// Response gain of the swing filter.
    #[serde(default = "default_response")]
    pub response: f32,
}

impl LegConfig {
    pub const fn at(hip_offset: [f32; 3]) -> Self {
        Self {
            hip_offset,
            frequency: DEFAULT_FREQUENCY,
            damping: DEFAULT_DAMPING,
            response: DEFAULT_RESPONSE,
        }
    }

    pub fn hip_offset(&self) -> Vec3 {
        Vec3::from(self.hip_offset)
    }

    /// Swing filter resting at `x0`.
    pub fn filter(&self, x0: Vec3) -> Result<DynamicsFilter> {
        DynamicsFilter::new(self.frequency, self.damping, self.response, x0)
    }
}

/// The four legs by name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegsConfig {
    #[serde(default = "default_front_left")]
    pub front_left: LegConfig,
    #[serde(default = "default_front_right")]
    pub front_right: LegConfig,
    #[serde(default = "default_rear_left")]
    pub rear_left: LegConfig,
    #[serde(default = "default_rear_right")]
    pub rear_right: LegConfig,
}

impl LegsConfig {
    pub fn get(&self, id: LegId) -> &LegConfig {
        match id {
            LegId::FrontLeft => &self.front_left,
            LegId::FrontRight => &self.front_right,
            LegId::RearLeft => &self.rear_left,
            LegId::RearRight => &self.rear_right,
        }
    }
}

impl Default for LegsConfig {
    fn default() -> Self {
        Self {
            front_left: default_front_left(),
            front_right: default_front_right(),
            rear_left: default_rear_left(),
            rear_right: default_rear_right(),
        }
    }
}

// ---------------------------------------------------------------------------
// LocomotionConfig
// ---------------------------------------------------------------------------

/// Session configuration of the locomotion subsystem. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionConfig {
    #[serde(default)]
    pub legs: LegsConfig,

    /// Step progress gained per second (default: 5.0, a 0.2 s step).
    #[serde(default = "default_step_speed")]
    pub step_speed: f32,

    /// Peak swing height above the foothold line (meters).
    #[serde(default = "default_step_height")]
    pub step_height: f32,

    /// Height of a planted foot above its contact (meters).
    #[serde(default = "default_rest_foot_height")]
    pub rest_foot_height: f32,

    /// Remap applied to step progress before the swing arc, as `[t, value]` keys.
    #[serde(default)]
    pub step_curve: RemapCurve,

    #[serde(default = "default_min_redirect_distance")]
    pub min_redirect_distance: f32,

    /// Ticks of predicted movement used to place footholds ahead of the hips.
    #[serde(default = "default_anticipation")]
    pub anticipation: f32,

    #[serde(default = "default_probe_height")]
    pub probe_height: f32,

    #[serde(default = "default_probe_distance")]
    pub probe_distance: f32,

    #[serde(default = "default_idle_reseat_distance")]
    pub idle_reseat_distance: f32,

    #[serde(default = "default_uniform_ground_tolerance_deg")]
    pub uniform_ground_tolerance_deg: f32,

    /// Body speed at full movement input (m/s).
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,

    /// Yaw rate at full look input (rad/s).
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f32,

    /// Acceleration pressing the body into uniform ground (m/s^2).
    #[serde(default = "default_attach_acceleration")]
    pub attach_acceleration: f32,

    /// Gravity magnitude applied while airborne (m/s^2).
    #[serde(default = "default_gravity")]
    pub gravity: f32,

    /// Opening ramp duration (seconds).
    #[serde(default = "default_opening_duration")]
    pub opening_duration: f32,

    /// Bits of the ground layers feet may plant on.
    #[serde(default = "default_ground_mask")]
    pub ground_mask: u32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            legs: LegsConfig::default(),
            step_speed: default_step_speed(),
            step_height: default_step_height(),
            rest_foot_height: default_rest_foot_height(),
            step_curve: RemapCurve::default(),
            min_redirect_distance: default_min_redirect_distance(),
            anticipation: default_anticipation(),
            probe_height: default_probe_height(),
            probe_distance: default_probe_distance(),
            idle_reseat_distance: default_idle_reseat_distance(),
            uniform_ground_tolerance_deg: default_uniform_ground_tolerance_deg(),
            move_speed: default_move_speed(),
            turn_speed: default_turn_speed(),
            attach_acceleration: default_attach_acceleration(),
            gravity: default_gravity(),
            opening_duration: default_opening_duration(),
            ground_mask: default_ground_mask(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LocomotionError::config(field, format!("{value} (must be finite and > 0)")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LocomotionError::config(field, format!("{value} (must be finite and >= 0)")))
    }
}

impl LocomotionConfig {
    /// Validate configuration. Returns Err on the first invalid value.
    pub fn validate(&self) -> Result<()> {
        for id in LegId::ALL {
            let leg = self.legs.get(id);
            if !leg.hip_offset.iter().all(|c| c.is_finite()) {
                return Err(LocomotionError::config("hip_offset", format!("{id} must be finite")));
            }
            // Builds the filter to run its own coefficient checks.
            leg.filter(Vec3::zeros())?;
        }
        positive("step_speed", self.step_speed)?;
        non_negative("step_height", self.step_height)?;
        non_negative("rest_foot_height", self.rest_foot_height)?;
        self.step_curve.validate()?;
        non_negative("min_redirect_distance", self.min_redirect_distance)?;
        non_negative("anticipation", self.anticipation)?;
        non_negative("probe_height", self.probe_height)?;
        positive("probe_distance", self.probe_distance)?;
        non_negative("idle_reseat_distance", self.idle_reseat_distance)?;
        non_negative("uniform_ground_tolerance_deg", self.uniform_ground_tolerance_deg)?;
        non_negative("move_speed", self.move_speed)?;
        non_negative("turn_speed", self.turn_speed)?;
        non_negative("attach_acceleration", self.attach_acceleration)?;
        non_negative("gravity", self.gravity)?;
        non_negative("opening_duration", self.opening_duration)?;
        if self.ground_mask == 0 {
            return Err(LocomotionError::config(
                "ground_mask",
                "selects no ground layer",
            ));
        }
        Ok(())
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn ground_mask(&self) -> GroundMask {
        GroundMask::new(self.ground_mask)
    }

    pub fn gait_params(&self) -> GaitParams {
        GaitParams {
            step_speed: self.step_speed,
            step_height: self.step_height,
            rest_foot_height: self.rest_foot_height,
            min_redirect_distance: self.min_redirect_distance,
            idle_reseat_distance: self.idle_reseat_distance,
            curve: self.step_curve.clone(),
        }
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            mask: self.ground_mask(),
            height: self.probe_height,
            distance: self.probe_distance,
            anticipation: self.anticipation,
        }
    }
}
