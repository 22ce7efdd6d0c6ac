//! Step progress remap curve.
//!
//! A monotone piecewise-linear function over `[0, 1]` applied to a leg's step progress before
//! the swing arc is evaluated. It shapes how fast the foot rises and falls within one step.

use serde::{Deserialize, Serialize};

use crate::error::{LocomotionError, Result};

/// Piecewise-linear remap keyed by `(t, value)` pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemapCurve {
    keys: Vec<[f32; 2]>,
}

impl RemapCurve {
    /// Build a curve from `(t, value)` keys. Keys must be finite with strictly increasing `t`
    /// spanning `[0, 1]`.
    pub fn new(keys: Vec<[f32; 2]>) -> Result<Self> {
        let curve = Self { keys };
        curve.validate()?;
        Ok(curve)
    }

    /// `value = t`.
    pub fn linear() -> Self {
        Self {
            keys: vec![[0.0, 0.0], [1.0, 1.0]],
        }
    }

    /// Smoothstep sampled at eight segments: slow lift-off, slow touchdown.
    pub fn ease_in_out() -> Self {
        let keys = (0..=8)
            .map(|i| {
                let t = i as f32 / 8.0;
                [t, t * t * (3.0 - 2.0 * t)]
            })
            .collect();
        Self { keys }
    }

    pub fn validate(&self) -> Result<()> {
        if self.keys.len() < 2 {
            return Err(LocomotionError::config(
                "step_curve",
                "needs at least two keys",
            ));
        }
        if self.keys.iter().flatten().any(|v| !v.is_finite()) {
            return Err(LocomotionError::config("step_curve", "keys must be finite"));
        }
        if self.keys.windows(2).any(|w| w[1][0] <= w[0][0]) {
            return Err(LocomotionError::config(
                "step_curve",
                "key times must be strictly increasing",
            ));
        }
        let first = self.keys[0][0];
        let last = self.keys[self.keys.len() - 1][0];
        if first != 0.0 || last != 1.0 {
            return Err(LocomotionError::config(
                "step_curve",
                format!("key times must span [0, 1], got [{first}, {last}]"),
            ));
        }
        Ok(())
    }

    /// Evaluate at `t`, clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        // First key whose time is >= t; keys are validated to start at 0.
        let upper = self
            .keys
            .iter()
            .position(|k| k[0] >= t)
            .unwrap_or(self.keys.len() - 1);
        if upper == 0 {
            return self.keys[0][1];
        }
        let [t0, v0] = self.keys[upper - 1];
        let [t1, v1] = self.keys[upper];
        let s = (t - t0) / (t1 - t0);
        v0 + (v1 - v0) * s
    }

    pub fn keys(&self) -> &[[f32; 2]] {
        &self.keys
    }
}

impl Default for RemapCurve {
    fn default() -> Self {
        Self::ease_in_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_curve_is_identity() {
        let curve = RemapCurve::linear();
        for t in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert_relative_eq!(curve.evaluate(t), t);
        }
    }

    #[test]
    fn ease_in_out_pins_endpoints_and_midpoint() {
        let curve = RemapCurve::ease_in_out();
        assert_relative_eq!(curve.evaluate(0.0), 0.0);
        assert_relative_eq!(curve.evaluate(0.5), 0.5);
        assert_relative_eq!(curve.evaluate(1.0), 1.0);
        // Slow start.
        assert!(curve.evaluate(0.1) < 0.1);
    }

    #[test]
    fn evaluation_clamps_out_of_range_progress() {
        let curve = RemapCurve::ease_in_out();
        assert_relative_eq!(curve.evaluate(-3.0), 0.0);
        assert_relative_eq!(curve.evaluate(7.0), 1.0);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(RemapCurve::new(vec![[0.0, 0.0]]).is_err());
        assert!(RemapCurve::new(vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).is_err());
        assert!(RemapCurve::new(vec![[0.1, 0.0], [1.0, 1.0]]).is_err());
        assert!(RemapCurve::new(vec![[0.0, f32::NAN], [1.0, 1.0]]).is_err());
        assert!(RemapCurve::new(vec![[0.0, 0.0], [0.3, 0.8], [1.0, 1.0]]).is_ok());
    }

    #[test]
    fn interpolates_between_custom_keys() {
        let curve = RemapCurve::new(vec![[0.0, 0.0], [0.5, 0.8], [1.0, 1.0]]).unwrap();
        assert_relative_eq!(curve.evaluate(0.25), 0.4);
        assert_relative_eq!(curve.evaluate(0.75), 0.9);
    }
}
