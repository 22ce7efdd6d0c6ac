//! Headless run: the orchestrator driving a kinematic body over the scene.

use std::rc::Rc;

use locomotion::{
    BodyPhysics, KinematicBody, LocomotionEvent, LocomotionOrchestrator, StaticGroundWorld,
    TickOutput, Vec3,
};
use log::{debug, info};

use crate::config::SimConfig;
use crate::error::Result;
use crate::scheduler::FixedStepScheduler;
use crate::script::InputScript;

pub type Orchestrator = LocomotionOrchestrator<KinematicBody, Rc<StaticGroundWorld>>;

/// Counters collected over a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    pub ticks: u64,
    pub steps_started: u64,
    pub steps_completed: u64,
    pub blocked: u64,
    pub airborne_ticks: u64,
    pub start: Vec3,
    pub end: Vec3,
}

impl RunStats {
    /// Straight-line distance between the start and end positions.
    pub fn displacement(&self) -> f32 {
        (self.end - self.start).norm()
    }
}

pub struct Simulation {
    orchestrator: Orchestrator,
    scheduler: FixedStepScheduler,
    script: InputScript,
    stats: RunStats,
}

impl Simulation {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let scheduler = FixedStepScheduler::new(config.dt, config.max_catch_up)?;
        let world = Rc::new(config.scene.build_world());
        let body = KinematicBody::new(
            Rc::clone(&world),
            config.scene.capsule(),
            config.scene.spawn_pose(),
            config.dt,
        )
        .with_mass(config.scene.mass);
        let orchestrator = LocomotionOrchestrator::init(config.locomotion.clone(), body, world)?;

        let start = orchestrator.body().position();
        Ok(Self {
            orchestrator,
            scheduler,
            script: InputScript::new(config.script.clone()),
            stats: RunStats {
                start,
                end: start,
                ..RunStats::default()
            },
        })
    }

    /// Replace the input timeline.
    pub fn with_script(mut self, script: InputScript) -> Self {
        self.script = script;
        self
    }

    /// Run one fixed step: locomotion first, then the body integrates the forces it was given.
    pub fn step(&mut self) -> Result<TickOutput> {
        let dt = self.scheduler.dt();
        let input = self.script.next(dt);
        let output = self.orchestrator.tick(dt, &input)?;
        self.orchestrator.body_mut().integrate(dt);
        self.record(&output);
        Ok(output)
    }

    /// Run `ticks` fixed steps back to back.
    pub fn run(&mut self, ticks: u64) -> Result<&RunStats> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(&self.stats)
    }

    /// Feed `elapsed` seconds of frame time and run the ticks that became due.
    pub fn advance(&mut self, elapsed: f32) -> Result<u32> {
        let due = self.scheduler.accumulate(elapsed);
        for _ in 0..due {
            self.step()?;
        }
        Ok(due)
    }

    fn record(&mut self, output: &TickOutput) {
        let stats = &mut self.stats;
        stats.ticks += 1;
        if !output.grounded {
            stats.airborne_ticks += 1;
        }
        for event in &output.events {
            match event {
                LocomotionEvent::StepStarted(_) => stats.steps_started += 1,
                LocomotionEvent::StepCompleted(_) => stats.steps_completed += 1,
                LocomotionEvent::Blocked => stats.blocked += 1,
                LocomotionEvent::OpeningFinished | LocomotionEvent::Unblocked => {}
            }
            debug!("tick {}: {:?}", stats.ticks, event);
        }
        stats.end = self.orchestrator.body().position();
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn script_finished(&self) -> bool {
        self.script.is_finished()
    }

    /// Tear down and return the collected counters.
    pub fn finish(self) -> RunStats {
        let (body, _) = self.orchestrator.shutdown();
        info!(
            "run finished after {} ticks at {:?}",
            self.stats.ticks,
            body.position()
        );
        self.stats
    }
}
