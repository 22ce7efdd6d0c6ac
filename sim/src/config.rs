use std::path::Path;

use locomotion::LocomotionConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scene::SceneConfig;
use crate::script::ScriptSegment;

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_max_catch_up() -> u32 {
    8
}

/// Everything a headless run needs: locomotion tunables, the scene and the input timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fixed step (seconds).
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// Most ticks run for one frame of elapsed time.
    #[serde(default = "default_max_catch_up")]
    pub max_catch_up: u32,

    #[serde(default)]
    pub locomotion: LocomotionConfig,

    #[serde(default)]
    pub scene: SceneConfig,

    #[serde(default)]
    pub script: Vec<ScriptSegment>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            max_catch_up: default_max_catch_up(),
            locomotion: LocomotionConfig::default(),
            scene: SceneConfig::default(),
            script: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.locomotion.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn empty_file_uses_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn nested_tables_parse() {
        let config = SimConfig::from_toml_str(
            r#"
            dt = 0.02

            [locomotion]
            move_speed = 0.8

            [scene]
            spawn = [1.0, 0.32, 0.0]

            [[script]]
            duration = 2.0
            movement = [0.0, 1.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.dt, 0.02);
        assert_eq!(config.locomotion.move_speed, 0.8);
        assert_eq!(config.scene.spawn, [1.0, 0.32, 0.0]);
        assert_eq!(config.script.len(), 1);
        assert_eq!(config.script[0].look, [0.0, 0.0]);
    }

    #[test]
    fn invalid_locomotion_values_are_rejected() {
        let err = SimConfig::from_toml_str("[locomotion]\nstep_speed = 0.0\n").unwrap_err();
        assert!(matches!(err, SimError::Locomotion(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SimConfig::from_file("/nonexistent/sim.toml").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
