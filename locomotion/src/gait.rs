//! Diagonal gait state machine.
//!
//! Every tick the controller evaluates one phase transition, possibly starting a step for a
//! diagonal pair, then advances every leg:
//!
//! 1. `!grounded && !was_grounded` → `Floating`.
//! 2. `(!moving && both groups planted) || Floating` → `Idle`; entering `Idle` re-seats planted
//!    legs, a leg still mid-step finishes its swing.
//! 3. `Idle | Floating | Opening` while moving → `GroupA`, step group A. If group B is still
//!    finishing a swing the gait resumes at `GroupB` instead.
//! 4. `GroupA` once A is planted → `GroupB`, step group B.
//! 5. `GroupB` once B is planted → `GroupA`, step group A.
//!
//! While `Opening` no transition is evaluated; the orchestrator ends it. While one pair steps the
//! other is held planted, so at least one diagonal pair is on the ground at every tick.

use std::f32::consts::PI;

use log::{debug, warn};

use crate::constants::{LANDING_GAP_WARN, TOUCHDOWN_BLEND_START};
use crate::curve::RemapCurve;
use crate::error::{Result, check_timestep};
use crate::leg::{LegGroup, LegState, Legs, group_finished};
use crate::types::{GroundHit, LocomotionEvent, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GaitPhase {
    #[default]
    Idle,
    GroupA,
    GroupB,
    Floating,
    Opening,
}

/// Stepping parameters, fixed for a session.
#[derive(Clone, Debug, PartialEq)]
pub struct GaitParams {
    /// Step progress gained per second.
    pub step_speed: f32,
    pub step_height: f32,
    pub rest_foot_height: f32,
    /// Contacts closer than this to the current foothold do not start a step.
    pub min_redirect_distance: f32,
    /// Idle re-seat only accepts contacts this close to the resting foot.
    pub idle_reseat_distance: f32,
    pub curve: RemapCurve,
}

/// Per-tick inputs of the state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaitInputs {
    pub is_moving: bool,
    pub is_grounded: bool,
    /// Direction feet are lifted along (the body's up).
    pub up: Vec3,
}

/// Where new footholds come from.
pub trait FootholdSource {
    /// Contact for a step starting now, probed from the leg's (anticipated) hip.
    fn step_target(&mut self, leg: &LegState) -> Option<GroundHit>;
    /// Contact directly below the leg's resting foot.
    fn under_foot(&mut self, leg: &LegState) -> Option<GroundHit>;
}

#[derive(Clone, Debug)]
pub struct GaitController {
    phase: GaitPhase,
    was_grounded: bool,
    params: GaitParams,
}

impl GaitController {
    pub fn new(params: GaitParams) -> Self {
        Self {
            phase: GaitPhase::Idle,
            was_grounded: true,
            params,
        }
    }

    #[inline]
    pub fn phase(&self) -> GaitPhase {
        self.phase
    }

    pub fn params(&self) -> &GaitParams {
        &self.params
    }

    /// Enter the opening sub-state. Transitions are suspended until [`Self::finish_opening`].
    pub fn begin_opening(&mut self) {
        self.set_phase(GaitPhase::Opening);
    }

    pub fn finish_opening(&mut self) {
        if self.phase == GaitPhase::Opening {
            self.set_phase(GaitPhase::Idle);
        }
    }

    /// Back to `Idle` with no memory of the previous tick.
    pub fn reset(&mut self) {
        self.phase = GaitPhase::Idle;
        self.was_grounded = true;
    }

    /// Run one tick: one transition, the blocking rule, then every leg's position.
    pub fn update(
        &mut self,
        dt: f32,
        inputs: &GaitInputs,
        legs: &mut Legs,
        source: &mut impl FootholdSource,
        events: &mut Vec<LocomotionEvent>,
    ) -> Result<()> {
        let dt = check_timestep(dt)?;

        if self.phase != GaitPhase::Opening {
            self.transition(inputs, legs, source, events);
        }
        self.was_grounded = inputs.is_grounded;

        self.hold_resting_group(legs, events);
        self.advance_legs(dt, &inputs.up, legs, events)?;

        debug_assert!(
            group_finished(legs, LegGroup::A) || group_finished(legs, LegGroup::B),
            "both diagonal pairs airborne in {:?}",
            self.phase
        );
        Ok(())
    }

    fn transition(
        &mut self,
        inputs: &GaitInputs,
        legs: &mut Legs,
        source: &mut impl FootholdSource,
        events: &mut Vec<LocomotionEvent>,
    ) {
        let a_finished = group_finished(legs, LegGroup::A);
        let b_finished = group_finished(legs, LegGroup::B);

        if !inputs.is_grounded && !self.was_grounded {
            self.set_phase(GaitPhase::Floating);
            return;
        }

        if (!inputs.is_moving && a_finished && b_finished) || self.phase == GaitPhase::Floating {
            if self.phase != GaitPhase::Idle {
                self.return_all_legs_to_idle(legs, source);
                self.set_phase(GaitPhase::Idle);
            }
            return;
        }

        match self.phase {
            GaitPhase::Idle | GaitPhase::Floating | GaitPhase::Opening if inputs.is_moving => {
                if !b_finished {
                    self.set_phase(GaitPhase::GroupB);
                    return;
                }
                self.set_phase(GaitPhase::GroupA);
                self.start_step(LegGroup::A, legs, source, events);
            }
            GaitPhase::GroupA if a_finished => {
                self.set_phase(GaitPhase::GroupB);
                self.start_step(LegGroup::B, legs, source, events);
            }
            GaitPhase::GroupB if b_finished => {
                self.set_phase(GaitPhase::GroupA);
                self.start_step(LegGroup::A, legs, source, events);
            }
            _ => {}
        }
    }

    fn set_phase(&mut self, phase: GaitPhase) {
        if self.phase != phase {
            debug!("gait {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Start a step for every planted leg of `group` whose new contact is far enough away.
    fn start_step(
        &self,
        group: LegGroup,
        legs: &mut Legs,
        source: &mut impl FootholdSource,
        events: &mut Vec<LocomotionEvent>,
    ) {
        for id in group.legs() {
            let leg = &mut legs[id.index()];
            if !leg.is_planted() {
                continue;
            }
            let Some(hit) = source.step_target(leg) else {
                continue;
            };
            if (hit.point - leg.next_foothold).norm() <= self.params.min_redirect_distance {
                continue;
            }
            leg.begin_step(hit.point);
            events.push(LocomotionEvent::StepStarted(id));
        }
    }

    /// Re-seat planted legs onto fresh ground directly below when it is within
    /// `idle_reseat_distance`. Stepping legs keep swinging toward their committed target.
    fn return_all_legs_to_idle(&self, legs: &mut Legs, source: &mut impl FootholdSource) {
        for leg in legs.iter_mut().filter(|leg| leg.is_planted()) {
            let Some(hit) = source.under_foot(leg) else {
                continue;
            };
            if (hit.point - leg.previous_foothold).norm() <= self.params.idle_reseat_distance {
                leg.reseat(hit.point);
            }
        }
    }

    /// Blocking rule: the pair that is not stepping stays planted.
    fn hold_resting_group(&self, legs: &mut Legs, events: &mut Vec<LocomotionEvent>) {
        let resting = match self.phase {
            GaitPhase::GroupA => LegGroup::B,
            GaitPhase::GroupB => LegGroup::A,
            _ => return,
        };
        for id in resting.legs() {
            let leg = &mut legs[id.index()];
            if leg.is_stepping() {
                warn!("{id} still stepping while {resting:?} must rest; landing it");
                leg.land();
                events.push(LocomotionEvent::StepCompleted(id));
            }
        }
    }

    fn advance_legs(
        &self,
        dt: f32,
        up: &Vec3,
        legs: &mut Legs,
        events: &mut Vec<LocomotionEvent>,
    ) -> Result<()> {
        let params = &self.params;
        for leg in legs.iter_mut() {
            if leg.is_planted() {
                leg.current_world_position = leg.previous_foothold + up * params.rest_foot_height;
                continue;
            }

            let landed = leg.advance_progress(dt * params.step_speed);
            let progress = leg.step_progress();
            let height = (params.curve.evaluate(progress) * PI).sin() * params.step_height;

            let filtered = leg.filter.advance(dt, leg.next_foothold, None)?;
            let planar = filtered.lerp(&leg.next_foothold, touchdown_blend(progress));
            leg.current_world_position = planar + up * (height.max(0.0) + params.rest_foot_height);

            if landed {
                let gap = (filtered - leg.next_foothold).norm();
                if gap > LANDING_GAP_WARN {
                    warn!("{} landed {gap:.3} m short of its filtered path", leg.id);
                }
                leg.land();
                events.push(LocomotionEvent::StepCompleted(leg.id));
            }
        }
        Ok(())
    }
}

/// Weight pulling the filtered swing onto the target near touchdown; exactly 1 at progress 1.
fn touchdown_blend(progress: f32) -> f32 {
    let s = ((progress - TOUCHDOWN_BLEND_START) / (1.0 - TOUCHDOWN_BLEND_START)).clamp(0.0, 1.0);
    s * s * (3.0 - 2.0 * s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DynamicsFilter;
    use crate::leg::LegId;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;
    const SPEED: f32 = 1.5;
    const LEAD_TICKS: f32 = 8.0;

    fn params() -> GaitParams {
        GaitParams {
            step_speed: 5.0,
            step_height: 0.12,
            rest_foot_height: 0.02,
            min_redirect_distance: 0.15,
            idle_reseat_distance: 0.1,
            curve: RemapCurve::default(),
        }
    }

    fn hip(id: LegId) -> Vec3 {
        match id {
            LegId::FrontLeft => Vec3::new(-0.2, 0.0, -0.3),
            LegId::FrontRight => Vec3::new(0.2, 0.0, -0.3),
            LegId::RearLeft => Vec3::new(-0.2, 0.0, 0.3),
            LegId::RearRight => Vec3::new(0.2, 0.0, 0.3),
        }
    }

    fn legs() -> Legs {
        LegId::ALL.map(|id| {
            let filter = DynamicsFilter::new(4.0, 1.0, 0.0, Vec3::zeros()).unwrap();
            LegState::planted(id, hip(id), hip(id), filter)
        })
    }

    /// Flat floor at y = 0 under a body translating in the XZ plane.
    struct Floor {
        body: Vec3,
        lead: Vec3,
        ground: bool,
    }

    impl Floor {
        fn new() -> Self {
            Self {
                body: Vec3::zeros(),
                lead: Vec3::zeros(),
                ground: true,
            }
        }

        fn hit(&self, mut point: Vec3) -> Option<GroundHit> {
            if !self.ground {
                return None;
            }
            point.y = 0.0;
            Some(GroundHit {
                point,
                normal: Vec3::y(),
                distance: 0.5,
            })
        }
    }

    impl FootholdSource for Floor {
        fn step_target(&mut self, leg: &LegState) -> Option<GroundHit> {
            self.hit(self.body + leg.hip_relative_offset + self.lead)
        }

        fn under_foot(&mut self, leg: &LegState) -> Option<GroundHit> {
            self.hit(leg.current_world_position)
        }
    }

    fn inputs(is_moving: bool, is_grounded: bool) -> GaitInputs {
        GaitInputs {
            is_moving,
            is_grounded,
            up: Vec3::y(),
        }
    }

    /// Advance the body one tick of walking along -Z at `speed`.
    fn walk(floor: &mut Floor, speed: f32) {
        let delta = Vec3::new(0.0, 0.0, -speed * DT);
        floor.body += delta;
        floor.lead = delta * LEAD_TICKS;
    }

    fn both_groups_checked(legs: &Legs) -> bool {
        group_finished(legs, LegGroup::A) || group_finished(legs, LegGroup::B)
    }

    #[test]
    fn movement_while_idle_starts_group_a_on_the_same_tick() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        walk(&mut floor, SPEED);

        gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
            .unwrap();

        assert_eq!(gait.phase(), GaitPhase::GroupA);
        for id in LegGroup::B.legs() {
            assert_relative_eq!(legs[id.index()].step_progress(), 1.0);
        }
        for id in LegGroup::A.legs() {
            assert!(legs[id.index()].is_stepping());
        }
        assert_eq!(
            events,
            vec![
                LocomotionEvent::StepStarted(LegId::FrontLeft),
                LocomotionEvent::StepStarted(LegId::RearRight),
            ]
        );
    }

    #[test]
    fn continuous_walk_keeps_a_diagonal_pair_planted() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        let mut started = 0;

        for tick in 0..1000 {
            walk(&mut floor, SPEED);
            events.clear();
            gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
                .unwrap();
            assert!(both_groups_checked(&legs), "tick {tick}: no planted pair");
            started += events
                .iter()
                .filter(|e| matches!(e, LocomotionEvent::StepStarted(_)))
                .count();
        }

        // The body covered 25 m; every leg had to keep up.
        assert!(started > 100, "only {started} steps");
        for leg in &legs {
            let behind = (leg.previous_foothold - (floor.body + leg.hip_relative_offset)).norm();
            assert!(behind < 1.0, "{} trails the body by {behind}", leg.id);
        }
    }

    #[test]
    fn footholds_are_never_redirected_mid_step() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        let mut moving = false;
        let mut grounded = true;

        for _ in 0..5000 {
            if rng.gen_bool(0.05) {
                moving = !moving;
            }
            if rng.gen_bool(0.02) {
                grounded = !grounded;
            }
            floor.ground = grounded;
            let speed = if moving { rng.gen_range(0.2..3.0) } else { 0.0 };
            walk(&mut floor, speed);

            let before: Vec<_> = legs
                .iter()
                .map(|l| (l.step_progress(), l.next_foothold))
                .collect();
            events.clear();
            gait.update(DT, &inputs(moving, grounded), &mut legs, &mut floor, &mut events)
                .unwrap();

            for (leg, (progress, next)) in legs.iter().zip(before) {
                if progress < 1.0 {
                    assert_eq!(leg.next_foothold, next, "{} redirected mid-step", leg.id);
                }
                assert!((0.0..=1.0).contains(&leg.step_progress()));
            }
            assert!(both_groups_checked(&legs));
        }
    }

    #[test]
    fn stopping_converges_to_idle_with_every_leg_planted() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();

        for _ in 0..100 {
            walk(&mut floor, SPEED);
            gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
                .unwrap();
        }
        walk(&mut floor, 0.0);
        for _ in 0..30 {
            gait.update(DT, &inputs(false, true), &mut legs, &mut floor, &mut events)
                .unwrap();
        }

        assert_eq!(gait.phase(), GaitPhase::Idle);
        for leg in &legs {
            assert_relative_eq!(leg.step_progress(), 1.0);
            assert_relative_eq!(
                leg.current_world_position,
                leg.previous_foothold + Vec3::y() * 0.02,
                epsilon = 1.0e-6
            );
        }
    }

    #[test]
    fn swing_lifts_the_foot_and_lands_on_the_target() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        walk(&mut floor, SPEED);

        let mut peak: f32 = 0.0;
        let mut target = None;
        for _ in 0..30 {
            gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
                .unwrap();
            let fl = &legs[LegId::FrontLeft.index()];
            target.get_or_insert(fl.next_foothold);
            peak = peak.max(fl.current_world_position.y);
            if events.contains(&LocomotionEvent::StepCompleted(LegId::FrontLeft)) {
                break;
            }
        }

        let fl = &legs[LegId::FrontLeft.index()];
        assert!(peak > 0.1, "peak {peak}");
        assert_eq!(Some(fl.previous_foothold), target);
        assert_relative_eq!(
            fl.current_world_position,
            fl.previous_foothold + Vec3::y() * 0.02,
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn nearby_contacts_do_not_start_steps() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        floor.lead = Vec3::new(0.0, 0.0, -0.05);

        gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::GroupA);
        assert!(events.is_empty());
        assert!(legs.iter().all(LegState::is_planted));
    }

    #[test]
    fn floating_requires_two_airborne_ticks_and_lands_idle() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();

        gait.update(DT, &inputs(false, false), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::Idle);
        gait.update(DT, &inputs(false, false), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::Floating);
        gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::Idle);
    }

    #[test]
    fn short_float_mid_step_finishes_the_swing_without_snapping() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        for _ in 0..2 {
            walk(&mut floor, SPEED);
            gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
                .unwrap();
        }
        let fl = LegId::FrontLeft.index();
        let target = legs[fl].next_foothold;

        walk(&mut floor, 0.0);
        let mut previous = legs.each_ref().map(|leg| leg.current_world_position);
        let mut max_jump: f32 = 0.0;
        let mut track = |legs: &Legs, previous: &mut [Vec3; 4]| {
            for (leg, last) in legs.iter().zip(previous.iter_mut()) {
                max_jump = max_jump.max((leg.current_world_position - *last).norm());
                *last = leg.current_world_position;
            }
        };

        for _ in 0..2 {
            gait.update(DT, &inputs(false, false), &mut legs, &mut floor, &mut events)
                .unwrap();
            track(&legs, &mut previous);
        }
        assert_eq!(gait.phase(), GaitPhase::Floating);

        gait.update(DT, &inputs(false, true), &mut legs, &mut floor, &mut events)
            .unwrap();
        track(&legs, &mut previous);
        assert_eq!(gait.phase(), GaitPhase::Idle);
        assert!(legs[fl].is_stepping());

        for _ in 0..20 {
            gait.update(DT, &inputs(false, true), &mut legs, &mut floor, &mut events)
                .unwrap();
            track(&legs, &mut previous);
            assert!(both_groups_checked(&legs));
        }
        assert!(max_jump < 0.1, "foot moved {max_jump} in one tick");
        assert!(legs.iter().all(LegState::is_planted));
        assert_eq!(legs[fl].previous_foothold, target);
    }

    #[test]
    fn moving_after_a_float_resumes_the_pair_still_swinging() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        walk(&mut floor, SPEED);
        // Run until group B is mid-step.
        for _ in 0..40 {
            gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
                .unwrap();
            walk(&mut floor, SPEED);
            if gait.phase() == GaitPhase::GroupB && !group_finished(&legs, LegGroup::B) {
                break;
            }
        }
        assert_eq!(gait.phase(), GaitPhase::GroupB);

        for _ in 0..2 {
            gait.update(DT, &inputs(false, false), &mut legs, &mut floor, &mut events)
                .unwrap();
        }
        gait.update(DT, &inputs(false, true), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::Idle);
        assert!(!group_finished(&legs, LegGroup::B));

        events.clear();
        gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::GroupB);
        assert!(group_finished(&legs, LegGroup::A));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, LocomotionEvent::StepStarted(_)))
        );
    }

    #[test]
    fn opening_suspends_transitions() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        walk(&mut floor, SPEED);

        gait.begin_opening();
        for _ in 0..10 {
            gait.update(DT, &inputs(true, false), &mut legs, &mut floor, &mut events)
                .unwrap();
        }
        assert_eq!(gait.phase(), GaitPhase::Opening);
        assert!(events.is_empty());

        gait.finish_opening();
        gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
            .unwrap();
        assert_eq!(gait.phase(), GaitPhase::GroupA);
    }

    #[test]
    fn idle_reseat_only_accepts_close_ground() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        // Walk briefly so the next idle entry re-samples.
        walk(&mut floor, SPEED);
        gait.update(DT, &inputs(true, true), &mut legs, &mut floor, &mut events)
            .unwrap();

        // Sink the rear-left foot slightly below the floor; re-seat snaps it back.
        legs[LegId::RearLeft.index()].previous_foothold.y = -0.05;
        // Raise the front-right far above; too far to re-seat.
        legs[LegId::FrontRight.index()].previous_foothold.y = 0.5;
        for _ in 0..30 {
            gait.update(DT, &inputs(false, true), &mut legs, &mut floor, &mut events)
                .unwrap();
        }
        assert_eq!(gait.phase(), GaitPhase::Idle);
        assert_relative_eq!(legs[LegId::RearLeft.index()].previous_foothold.y, 0.0);
        assert_relative_eq!(legs[LegId::FrontRight.index()].previous_foothold.y, 0.5);
    }

    #[test]
    fn rejects_invalid_timestep() {
        let mut gait = GaitController::new(params());
        let mut legs = legs();
        let mut floor = Floor::new();
        let mut events = Vec::new();
        assert!(
            gait.update(0.0, &inputs(true, true), &mut legs, &mut floor, &mut events)
                .is_err()
        );
        assert_eq!(gait.phase(), GaitPhase::Idle);
    }

    #[test]
    fn touchdown_blend_is_monotone_and_pinned() {
        assert_eq!(touchdown_blend(0.0), 0.0);
        assert_eq!(touchdown_blend(TOUCHDOWN_BLEND_START), 0.0);
        assert_eq!(touchdown_blend(1.0), 1.0);
        assert!(touchdown_blend(0.9) > touchdown_blend(0.8));
    }
}
