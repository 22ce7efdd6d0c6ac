pub mod config;
pub mod error;
pub mod scene;
pub mod scheduler;
pub mod script;
pub mod simulation;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use scene::{SceneConfig, StaticRow, StaticShape, row_to_def};
pub use scheduler::FixedStepScheduler;
pub use script::{InputScript, ScriptSegment};
pub use simulation::{Orchestrator, RunStats, Simulation};
