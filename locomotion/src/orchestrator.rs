//! Fixed-step driver sequencing the locomotion components.
//!
//! Each [`LocomotionOrchestrator::tick`] runs, strictly in order:
//!
//! 1. propagate body displacement the gait did not cause into the legs;
//! 2. publish the predicted movement (input mapped through the surface frame);
//! 3. predictive ground pass;
//! 4. resolve the movement against the physics provider, update the blocked latch;
//! 5. authoritative ground pass with the realized movement;
//! 6. gait transition and leg positions;
//! 7. residual vertical correction (attach to uniform ground, gravity while airborne).

use log::{debug, info};

use crate::body::BodyPhysics;
use crate::config::LocomotionConfig;
use crate::constants::{MOVE_EPS, TURN_EPS};
use crate::error::{Result, check_timestep};
use crate::frame::SurfaceFrame;
use crate::gait::{FootholdSource, GaitController, GaitInputs, GaitPhase};
use crate::ground::{GroundQuery, GroundSampler};
use crate::latch::{BlockedLatch, LatchEdge};
use crate::leg::{LegId, LegState, Legs};
use crate::opening::{OpeningSequence, OpeningStatus};
use crate::propagate::BodyMovementPropagator;
use crate::types::{
    ForceMode, GroundHit, LocomotionEvent, LocomotionInput, Pose, Quat, Vec3, world_up,
};

/// Result of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutput {
    /// Final foot positions, indexed by [`LegId::index`].
    pub foot_positions: [Vec3; 4],
    pub stepping: [bool; 4],
    pub phase: GaitPhase,
    /// Visual blend weight: 0 while disabled, ramping during the opening, then 1.
    pub blend_weight: f32,
    pub grounded: bool,
    pub blocked: bool,
    /// Contacts found by the predictive pass, per leg.
    pub predicted_footholds: [Option<Vec3>; 4],
    pub events: Vec<LocomotionEvent>,
}

/// Footholds for the gait during one tick.
struct TickFootholds<'a, G> {
    sampler: &'a mut GroundSampler<G>,
    targets: [Option<GroundHit>; 4],
    up: Vec3,
    rest_foot_height: f32,
}

impl<G: GroundQuery> FootholdSource for TickFootholds<'_, G> {
    fn step_target(&mut self, leg: &LegState) -> Option<GroundHit> {
        self.targets[leg.id.index()]
    }

    fn under_foot(&mut self, leg: &LegState) -> Option<GroundHit> {
        let foot = leg.current_world_position - self.up * self.rest_foot_height;
        self.sampler.sample_down(&foot, &self.up)
    }
}

pub struct LocomotionOrchestrator<B, G> {
    config: LocomotionConfig,
    body: B,
    sampler: GroundSampler<G>,
    legs: Legs,
    gait: GaitController,
    propagator: BodyMovementPropagator,
    opening: OpeningSequence,
    latch: BlockedLatch,
    enabled: bool,
    blend_weight: f32,
}

impl<B: BodyPhysics, G: GroundQuery> LocomotionOrchestrator<B, G> {
    /// Validate `config`, plant every leg under its hip and start the opening sequence.
    pub fn init(config: LocomotionConfig, body: B, ground: G) -> Result<Self> {
        config.validate()?;
        let pose = body.pose();
        let mut sampler = GroundSampler::new(ground, config.probe_settings());
        let legs = plant_legs(&config, &pose, &mut sampler)?;
        sampler.end_tick();

        let mut orchestrator = Self {
            gait: GaitController::new(config.gait_params()),
            opening: OpeningSequence::new(config.opening_duration),
            propagator: BodyMovementPropagator::new(pose),
            latch: BlockedLatch::default(),
            enabled: false,
            blend_weight: 0.0,
            config,
            body,
            sampler,
            legs,
        };
        orchestrator.start_opening();
        info!("locomotion initialized at {:?}", pose.position);
        Ok(orchestrator)
    }

    /// Hand the collaborators back.
    pub fn shutdown(self) -> (B, G) {
        info!("locomotion shut down");
        (self.body, self.sampler.into_query())
    }

    /// Restart the subsystem: legs are re-planted at the current pose and a fresh opening
    /// sequence begins.
    pub fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Ok(());
        }
        self.replant()?;
        self.start_opening();
        info!("locomotion enabled");
        Ok(())
    }

    fn start_opening(&mut self) {
        self.enabled = true;
        self.blend_weight = 0.0;
        self.gait.reset();
        self.gait.begin_opening();
        self.opening.start();
    }

    /// Stop driving the body. The blend weight snaps to 0 and no gait state survives.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.blend_weight = 0.0;
        self.opening.cancel();
        self.gait.reset();
        self.latch.reset();
        info!("locomotion disabled");
    }

    /// Re-derive every leg from its hip offset at the current body pose.
    pub fn reset(&mut self) -> Result<()> {
        self.replant()?;
        if self.gait.phase() != GaitPhase::Opening {
            self.gait.reset();
        }
        Ok(())
    }

    fn replant(&mut self) -> Result<()> {
        let pose = self.body.pose();
        self.legs = plant_legs(&self.config, &pose, &mut self.sampler)?;
        self.sampler.end_tick();
        self.propagator = BodyMovementPropagator::new(pose);
        self.latch.reset();
        Ok(())
    }

    /// Advance one fixed step.
    pub fn tick(&mut self, dt: f32, input: &LocomotionInput) -> Result<TickOutput> {
        let dt = check_timestep(dt)?;
        let mut events = Vec::new();
        if !self.enabled {
            return Ok(self.output(events, [None; 4]));
        }

        // 1. Displacement since the last tick that the gait did not cause.
        let start = self.body.pose();
        let residual = self.propagator.propagate(&start, &mut self.legs);
        if !residual.is_negligible() {
            debug!(
                "carried legs by {:?} and {:.3} rad",
                residual.translation,
                residual.rotation.angle()
            );
        }

        // 2. Predicted movement.
        let grounded = self.body.is_grounded();
        let normal = if grounded {
            self.body.ground_normal()
        } else {
            start.up()
        };
        let frame = SurfaceFrame::new(&start, &normal);
        let (translation, rotation) = if self.gait.phase() == GaitPhase::Opening {
            (Vec3::zeros(), Quat::identity())
        } else {
            (
                frame.movement(&input.movement, self.config.move_speed, dt),
                frame.turn(input.look.x, self.config.turn_speed, dt),
            )
        };
        self.sampler.set_prediction(translation, rotation);

        // 3. Predictive pass.
        let predicted = self.sample_targets(&start);

        // 4. Resolve against the physics provider.
        self.body.move_position(translation);
        self.body.move_rotation(rotation);
        let end = self.body.pose();
        let realized_translation = end.position - start.position;
        let realized_rotation = end.rotation * start.rotation.inverse();
        match self
            .latch
            .update(translation.norm(), realized_translation.norm())
        {
            Some(LatchEdge::Blocked) => events.push(LocomotionEvent::Blocked),
            Some(LatchEdge::Unblocked) => events.push(LocomotionEvent::Unblocked),
            None => {}
        }
        self.propagator.mark_applied(&end);

        // 5. Authoritative pass.
        self.sampler
            .set_prediction(realized_translation, realized_rotation);
        let targets = self.sample_targets(&end);

        // 6. Gait.
        let grounded = self.body.is_grounded();
        let inputs = GaitInputs {
            is_moving: realized_translation.norm() > MOVE_EPS
                || realized_rotation.angle() > TURN_EPS,
            is_grounded: grounded,
            up: end.up(),
        };
        let mut footholds = TickFootholds {
            sampler: &mut self.sampler,
            targets,
            up: end.up(),
            rest_foot_height: self.config.rest_foot_height,
        };
        self.gait
            .update(dt, &inputs, &mut self.legs, &mut footholds, &mut events)?;

        self.blend_weight = match self.opening.advance(dt) {
            OpeningStatus::Running { weight } => weight,
            OpeningStatus::Finished => {
                self.gait.finish_opening();
                events.push(LocomotionEvent::OpeningFinished);
                info!("opening finished");
                1.0
            }
            OpeningStatus::Inactive => 1.0,
        };

        // 7. Vertical correction.
        if grounded {
            if self
                .sampler
                .is_uniform(self.config.uniform_ground_tolerance_deg)
            {
                let attach = -self.body.ground_normal() * self.config.attach_acceleration;
                self.body.add_force(attach, ForceMode::Acceleration);
            }
        } else {
            let gravity = -world_up() * self.config.gravity;
            self.body.add_force(gravity, ForceMode::Acceleration);
        }
        self.sampler.end_tick();

        Ok(self.output(events, predicted.map(|hit| hit.map(|h| h.point))))
    }

    /// Probe the ground below every leg's anticipated hip.
    fn sample_targets(&mut self, pose: &Pose) -> [Option<GroundHit>; 4] {
        let up = pose.up();
        LegId::ALL.map(|id| {
            let hip = pose.transform_point(&self.legs[id.index()].hip_relative_offset);
            let anticipated = self.sampler.anticipate(&hip, &pose.position);
            self.sampler.sample_down(&anticipated, &up)
        })
    }

    fn output(
        &self,
        events: Vec<LocomotionEvent>,
        predicted_footholds: [Option<Vec3>; 4],
    ) -> TickOutput {
        TickOutput {
            foot_positions: self.legs.each_ref().map(|leg| leg.current_world_position),
            stepping: self.legs.each_ref().map(LegState::is_stepping),
            phase: self.gait.phase(),
            blend_weight: self.blend_weight,
            grounded: self.body.is_grounded(),
            blocked: self.latch.is_blocked(),
            predicted_footholds,
            events,
        }
    }

    /// Whether `leg` is mid-step.
    pub fn is_leg_stepping(&self, leg: LegId) -> bool {
        self.legs[leg.index()].is_stepping()
    }

    pub fn phase(&self) -> GaitPhase {
        self.gait.phase()
    }

    pub fn legs(&self) -> &Legs {
        &self.legs
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn blend_weight(&self) -> f32 {
        self.blend_weight
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    /// The physics provider, e.g. to integrate forces between ticks.
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }
}

/// Plant each leg on the ground below its hip, or at the hip when there is no ground.
fn plant_legs<G: GroundQuery>(
    config: &LocomotionConfig,
    pose: &Pose,
    sampler: &mut GroundSampler<G>,
) -> Result<Legs> {
    let up = pose.up();
    let plant = |id: LegId, sampler: &mut GroundSampler<G>| -> Result<LegState> {
        let leg = config.legs.get(id);
        let hip = pose.transform_point(&leg.hip_offset());
        let foothold = sampler
            .sample_down(&hip, &up)
            .map(|hit| hit.point)
            .unwrap_or(hip);
        let mut state = LegState::planted(id, leg.hip_offset(), foothold, leg.filter(foothold)?);
        state.current_world_position = foothold + up * config.rest_foot_height;
        Ok(state)
    };
    Ok([
        plant(LegId::FrontLeft, sampler)?,
        plant(LegId::FrontRight, sampler)?,
        plant(LegId::RearLeft, sampler)?,
        plant(LegId::RearRight, sampler)?,
    ])
}
