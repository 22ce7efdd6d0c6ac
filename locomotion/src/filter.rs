//! Second-order dynamics filter.
//!
//! Turns a piecewise-constant target (a new foothold) into a continuously differentiable
//! trajectory. The filter behaves like a damped spring between the target `x` and the output
//! `y`:
//!
//! ```text
//! y + k1·ẏ + k2·ÿ = x + k3·ẋ
//! k1 = z / (π f)      k2 = 1 / (2π f)²      k3 = r·z / (2π f)
//! ```
//!
//! - `f`: natural frequency (Hz), how fast the output responds.
//! - `z`: damping ratio; `0` never settles, `1` is critically damped, `> 1` is sluggish.
//! - `r`: response gain; `0` eases in, `> 1` overshoots, `< 0` anticipates backwards.
//!
//! Integration is semi-implicit Euler with `k2` clamped from below so the step stays stable for
//! the given `dt`.

use std::f32::consts::PI;

use crate::error::{LocomotionError, Result, check_timestep};
use crate::types::{Quat, Vec3};

/// Per-axis second-order smoothing filter over a 3D point.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicsFilter {
    k1: f32,
    k2: f32,
    k3: f32,
    x_prev: Vec3,
    y: Vec3,
    y_velocity: Vec3,
}

impl DynamicsFilter {
    /// Initialize with coefficients derived from `(frequency, damping, response)` and rest at `x0`.
    ///
    /// Fails fast on a non-positive frequency or negative damping instead of producing NaN.
    pub fn new(frequency: f32, damping: f32, response: f32, x0: Vec3) -> Result<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(LocomotionError::config(
                "frequency",
                format!("{frequency} (must be finite and > 0)"),
            ));
        }
        if !damping.is_finite() || damping < 0.0 {
            return Err(LocomotionError::config(
                "damping",
                format!("{damping} (must be finite and >= 0)"),
            ));
        }
        if !response.is_finite() {
            return Err(LocomotionError::config(
                "response",
                format!("{response} (must be finite)"),
            ));
        }
        if !x0.iter().all(|c| c.is_finite()) {
            return Err(LocomotionError::config(
                "initial_position",
                "must be finite",
            ));
        }

        let w = 2.0 * PI * frequency;
        Ok(Self {
            k1: damping / (PI * frequency),
            k2: 1.0 / (w * w),
            k3: response * damping / w,
            x_prev: x0,
            y: x0,
            y_velocity: Vec3::zeros(),
        })
    }

    /// Re-seed the state at `x0` with zero velocity, keeping the coefficients.
    pub fn reset(&mut self, x0: Vec3) {
        self.x_prev = x0;
        self.y = x0;
        self.y_velocity = Vec3::zeros();
    }

    /// Advance one step toward `x`.
    ///
    /// If `x_velocity` is `None` it is estimated from the previous input sample.
    pub fn advance(&mut self, dt: f32, x: Vec3, x_velocity: Option<Vec3>) -> Result<Vec3> {
        let dt = check_timestep(dt)?;

        let xd = match x_velocity {
            Some(xd) => xd,
            None => {
                let xd = (x - self.x_prev) / dt;
                self.x_prev = x;
                xd
            }
        };

        let k2_stable = self
            .k2
            .max(1.1 * (dt * dt / 4.0 + dt * self.k1 / 2.0));

        self.y += dt * self.y_velocity;
        self.y_velocity +=
            dt * (x + self.k3 * xd - self.y - self.k1 * self.y_velocity) / k2_stable;

        Ok(self.y)
    }

    /// Carry the whole state rigidly with the body: rotate about `pivot` by `rotation`, then
    /// translate by `translation`. Velocities rotate with it.
    pub fn carry(&mut self, pivot: &Vec3, rotation: &Quat, translation: &Vec3) {
        let map = |p: Vec3| pivot + rotation * (p - pivot) + translation;
        self.x_prev = map(self.x_prev);
        self.y = map(self.y);
        self.y_velocity = rotation * self.y_velocity;
    }

    /// Current output position.
    #[inline]
    pub fn output(&self) -> Vec3 {
        self.y
    }

    /// Current output velocity.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.y_velocity
    }

    /// Derived coefficients `(k1, k2, k3)`.
    #[inline]
    pub fn coefficients(&self) -> (f32, f32, f32) {
        (self.k1, self.k2, self.k3)
    }
}
