//! Ground probing.
//!
//! [`GroundQuery`] is the seam to whatever owns the collision geometry. [`GroundSampler`] wraps a
//! query with the probe conventions used by the gait (start above the point, cast along `-up`),
//! the per-tick contact list used for the uniform-ground check, and the predicted body movement
//! used to anticipate footholds.

use std::rc::Rc;

use log::trace;
use nalgebra::Unit;

use crate::constants::DIST_EPS;
use crate::layers::GroundMask;
use crate::types::{GroundHit, Quat, Vec3};

/// Ray query against ground geometry.
pub trait GroundQuery {
    /// Nearest contact along `direction` within `max_distance` on a collider whose layers
    /// intersect `mask`. `None` when nothing is hit.
    fn cast(
        &self,
        origin: &Vec3,
        direction: &Unit<Vec3>,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<GroundHit>;
}

impl<T: GroundQuery + ?Sized> GroundQuery for &T {
    fn cast(
        &self,
        origin: &Vec3,
        direction: &Unit<Vec3>,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<GroundHit> {
        (**self).cast(origin, direction, max_distance, mask)
    }
}

impl<T: GroundQuery + ?Sized> GroundQuery for Rc<T> {
    fn cast(
        &self,
        origin: &Vec3,
        direction: &Unit<Vec3>,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<GroundHit> {
        (**self).cast(origin, direction, max_distance, mask)
    }
}

/// Probe parameters shared by every sample a [`GroundSampler`] takes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeSettings {
    pub mask: GroundMask,
    /// Height above the sampled point the probe starts from.
    pub height: f32,
    /// Probe length below the sampled point.
    pub distance: f32,
    /// Ticks of predicted movement used to bias footholds forward.
    pub anticipation: f32,
}

/// Downward ground sampler with a per-tick contact list.
pub struct GroundSampler<G> {
    query: G,
    settings: ProbeSettings,
    contacts: Vec<GroundHit>,
    predicted_translation: Vec3,
    predicted_rotation: Quat,
}

impl<G: GroundQuery> GroundSampler<G> {
    pub fn new(query: G, settings: ProbeSettings) -> Self {
        Self {
            query,
            settings,
            contacts: Vec::with_capacity(8),
            predicted_translation: Vec3::zeros(),
            predicted_rotation: Quat::identity(),
        }
    }

    /// Cast one probe. Every contact is recorded for this tick.
    ///
    /// A zero or non-finite hit normal is replaced by `-direction`.
    pub fn sample(
        &mut self,
        origin: &Vec3,
        direction: &Unit<Vec3>,
        max_distance: f32,
        mask: GroundMask,
    ) -> Option<GroundHit> {
        let Some(mut hit) = self.query.cast(origin, direction, max_distance, mask) else {
            trace!("no ground contact from {origin:?} within {max_distance}");
            return None;
        };
        hit.normal = sanitize_normal(&hit.normal, &-direction.into_inner());
        self.contacts.push(hit);
        Some(hit)
    }

    /// Probe for the ground under `point`, where "under" is along `-up`.
    pub fn sample_down(&mut self, point: &Vec3, up: &Vec3) -> Option<GroundHit> {
        let up = Unit::try_new(*up, DIST_EPS).unwrap_or(Vec3::y_axis());
        let origin = point + up.into_inner() * self.settings.height;
        self.sample(
            &origin,
            &-up,
            self.settings.height + self.settings.distance,
            self.settings.mask,
        )
    }

    /// Publish the body movement expected this tick.
    pub fn set_prediction(&mut self, translation: Vec3, rotation: Quat) {
        self.predicted_translation = translation;
        self.predicted_rotation = rotation;
    }

    /// Where `hip` will be after `anticipation` ticks of the predicted movement, turning about
    /// `pivot`.
    pub fn anticipate(&self, hip: &Vec3, pivot: &Vec3) -> Vec3 {
        let ticks = self.settings.anticipation;
        let rotation = self.predicted_rotation.powf(ticks);
        pivot + rotation * (hip - pivot) + self.predicted_translation * ticks
    }

    pub fn contacts(&self) -> &[GroundHit] {
        &self.contacts
    }

    /// True when every contact recorded this tick has a normal within `tolerance_deg` of the
    /// others. An empty list is not uniform.
    pub fn is_uniform(&self, tolerance_deg: f32) -> bool {
        if self.contacts.is_empty() {
            return false;
        }
        let cos_tolerance = tolerance_deg.to_radians().cos();
        self.contacts.iter().enumerate().all(|(i, a)| {
            self.contacts[i + 1..]
                .iter()
                .all(|b| a.normal.dot(&b.normal) >= cos_tolerance)
        })
    }

    /// Clear the per-tick contact list.
    pub fn end_tick(&mut self) {
        self.contacts.clear();
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    pub fn into_query(self) -> G {
        self.query
    }
}

/// Unit normal, or `fallback` when `normal` is degenerate.
pub(crate) fn sanitize_normal(normal: &Vec3, fallback: &Vec3) -> Vec3 {
    if normal.iter().all(|c| c.is_finite()) {
        if let Some(n) = normal.try_normalize(DIST_EPS) {
            return n;
        }
    }
    fallback.try_normalize(DIST_EPS).unwrap_or(Vec3::y())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Infinite plane `normal · p = offset` on the walkable layer.
    #[derive(Clone, Debug)]
    pub struct FlatGround {
        pub normal: Vec3,
        pub offset: f32,
        pub layers: GroundMask,
    }

    impl FlatGround {
        pub fn at_height(height: f32) -> Self {
            Self {
                normal: Vec3::y(),
                offset: height,
                layers: GroundMask::of(&[crate::layers::GroundLayer::Walkable]),
            }
        }
    }

    impl GroundQuery for FlatGround {
        fn cast(
            &self,
            origin: &Vec3,
            direction: &Unit<Vec3>,
            max_distance: f32,
            mask: GroundMask,
        ) -> Option<GroundHit> {
            if !self.layers.intersects(mask) {
                return None;
            }
            let denom = self.normal.dot(&direction.into_inner());
            if denom.abs() < DIST_EPS {
                return None;
            }
            let t = (self.offset - self.normal.dot(origin)) / denom;
            if !(0.0..=max_distance).contains(&t) {
                return None;
            }
            Some(GroundHit {
                point: origin + direction.into_inner() * t,
                normal: self.normal,
                distance: t,
            })
        }
    }
}
