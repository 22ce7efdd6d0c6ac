//! Scripted input: a timeline of held movement/look commands.

use locomotion::{LocomotionInput, Vec2};
use serde::{Deserialize, Serialize};

/// Input held for `duration` seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub duration: f32,
    #[serde(default)]
    pub movement: [f32; 2],
    #[serde(default)]
    pub look: [f32; 2],
}

impl ScriptSegment {
    pub fn input(&self) -> LocomotionInput {
        LocomotionInput::new(Vec2::from(self.movement), Vec2::from(self.look))
    }
}

/// Plays segments back to back; idle once the timeline is exhausted.
#[derive(Clone, Debug, Default)]
pub struct InputScript {
    segments: Vec<ScriptSegment>,
    cursor: usize,
    elapsed: f32,
}

impl InputScript {
    pub fn new(segments: Vec<ScriptSegment>) -> Self {
        Self {
            segments,
            cursor: 0,
            elapsed: 0.0,
        }
    }

    /// Walk forward for `seconds`, then stand.
    pub fn walk_forward(seconds: f32) -> Self {
        Self::new(vec![ScriptSegment {
            duration: seconds,
            movement: [0.0, 1.0],
            look: [0.0, 0.0],
        }])
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.segments.len()
    }

    /// Input for the tick starting now, then advance the timeline by `dt`.
    pub fn next(&mut self, dt: f32) -> LocomotionInput {
        while let Some(segment) = self.segments.get(self.cursor) {
            if self.elapsed < segment.duration {
                self.elapsed += dt;
                return segment.input();
            }
            self.elapsed -= segment.duration;
            self.cursor += 1;
        }
        LocomotionInput::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_segments_in_order_then_idles() {
        let mut script = InputScript::new(vec![
            ScriptSegment {
                duration: 1.0,
                movement: [0.0, 1.0],
                look: [0.0, 0.0],
            },
            ScriptSegment {
                duration: 0.5,
                movement: [0.0, 0.0],
                look: [1.0, 0.0],
            },
        ]);
        let inputs: Vec<_> = (0..20).map(|_| script.next(0.25)).collect();
        assert!(inputs[..4].iter().all(|i| i.movement == Vec2::new(0.0, 1.0)));
        assert!(inputs[4..6].iter().all(|i| i.look == Vec2::new(1.0, 0.0)));
        assert!(inputs[6..].iter().all(|i| *i == LocomotionInput::idle()));
        assert!(script.is_finished());
    }

    #[test]
    fn empty_script_is_idle() {
        let mut script = InputScript::default();
        assert_eq!(script.next(0.1), LocomotionInput::idle());
    }
}
