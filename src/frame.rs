//! Reference-frame models: where the sun is, and how each orbit is laid
//! out around it.
//!
//! Three motion variants are supported:
//!
//! - [`MotionVariant::Static`]           – sun pinned at the origin, orbits in the horizontal plane
//! - [`MotionVariant::LinearDrift`]      – sun translates along a fixed direction, orbits tilted about a fixed axis
//! - [`MotionVariant::TiltedOrbitDrift`] – sun follows a tilted circle while drifting forward; the orbital
//!   planes are re-aligned every tick to the sun's direction of travel
//!
//! The time parameter for reference motion is the clock's speed-weighted
//! drift tick count, so pausing freezes the sun together with the planets.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::body::OrbitalBody;

/// Displacements shorter than this do not define a direction of travel.
pub const DIRECTION_EPSILON: f64 = 1e-6;

/// Tilt axis used before the sun has moved, and whenever a dynamic axis
/// cannot be derived.
pub const FALLBACK_TILT_AXIS: DVec3 = DVec3::Z;

/// How the reference body moves. Selected once per session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum MotionVariant {
    Static,
    LinearDrift {
        /// Distance per tick along `forward_axis` at speed 1
        forward_speed: f64,
        /// Distance per tick along +y at speed 1
        vertical_speed: f64,
        forward_axis: DVec3,
        tilt_axis: DVec3,
        ecliptic_tilt_radians: f64,
    },
    TiltedOrbitDrift {
        forward_speed: f64,
        drift_orbital_radius: f64,
        /// Radians per tick at speed 1
        drift_angular_speed: f64,
        /// Axis tilting the sun's own circular path
        tilt_axis: DVec3,
        ecliptic_tilt_radians: f64,
    },
}

impl MotionVariant {
    pub fn name(&self) -> &'static str {
        match self {
            MotionVariant::Static => "static",
            MotionVariant::LinearDrift { .. } => "linear drift",
            MotionVariant::TiltedOrbitDrift { .. } => "tilted orbit drift",
        }
    }

    /// Whether the camera should track the sun.
    pub fn is_drifting(&self) -> bool {
        !matches!(self, MotionVariant::Static)
    }
}

/// The central body.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceBody {
    pub position: DVec3,
    pub previous_position: DVec3,
    pub motion: MotionVariant,
}

impl ReferenceBody {
    pub fn new(motion: MotionVariant) -> Self {
        Self { position: DVec3::ZERO, previous_position: DVec3::ZERO, motion }
    }

    pub fn displacement(&self) -> DVec3 {
        self.position - self.previous_position
    }
}

/// Rodrigues' rotation of `v` about `axis` by `angle` radians.
///
/// `axis` is normalized here; a near-zero axis is replaced by +y.
pub fn rotate(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let k = safe_unit(axis, DVec3::Y);
    let (s, c) = angle.sin_cos();
    v * c + k.cross(v) * s + k * k.dot(v) * (1.0 - c)
}

fn safe_unit(v: DVec3, fallback: DVec3) -> DVec3 {
    let len = v.length();
    if len < DIRECTION_EPSILON || !len.is_finite() {
        fallback
    } else {
        v / len
    }
}

/// Unit direction of travel, or `None` when the sun barely moved.
pub fn travel_direction(current: DVec3, previous: DVec3) -> Option<DVec3> {
    let d = current - previous;
    let len = d.length();
    if len < DIRECTION_EPSILON || !len.is_finite() {
        None
    } else {
        Some(d / len)
    }
}

/// Axis perpendicular to world-up and the direction of travel. Keeps
/// `previous` when the direction is undefined or parallel to up.
pub fn dynamic_tilt_axis(current: DVec3, previous_pos: DVec3, previous: DVec3) -> DVec3 {
    let Some(dir) = travel_direction(current, previous_pos) else {
        trace!("sun displacement below epsilon, keeping tilt axis");
        return previous;
    };
    let axis = DVec3::Y.cross(dir);
    if axis.length() < DIRECTION_EPSILON {
        trace!("sun travelling along world-up, keeping tilt axis");
        return previous;
    }
    axis.normalize()
}

/// Computes reference and body positions for one motion variant.
#[derive(Clone, Debug)]
pub struct ReferenceFrameModel {
    motion: MotionVariant,
    tilt_axis: DVec3,
}

impl ReferenceFrameModel {
    pub fn new(motion: MotionVariant) -> Self {
        let tilt_axis = match motion {
            MotionVariant::LinearDrift { tilt_axis, .. } => safe_unit(tilt_axis, FALLBACK_TILT_AXIS),
            _ => FALLBACK_TILT_AXIS,
        };
        Self { motion, tilt_axis }
    }

    pub fn motion(&self) -> &MotionVariant {
        &self.motion
    }

    /// Axis the orbital planes are currently tilted about.
    pub fn tilt_axis(&self) -> DVec3 {
        self.tilt_axis
    }

    /// Where the sun sits after `drift_ticks` speed-weighted ticks.
    pub fn reference_position(&self, drift_ticks: f64) -> DVec3 {
        match self.motion {
            MotionVariant::Static => DVec3::ZERO,
            MotionVariant::LinearDrift { forward_speed, vertical_speed, forward_axis, .. } => {
                let fwd = safe_unit(forward_axis, DVec3::X);
                (fwd * forward_speed + DVec3::Y * vertical_speed) * drift_ticks
            }
            MotionVariant::TiltedOrbitDrift {
                forward_speed,
                drift_orbital_radius,
                drift_angular_speed,
                tilt_axis,
                ecliptic_tilt_radians,
            } => {
                let a = drift_angular_speed * drift_ticks;
                let circle = DVec3::new(0.0, drift_orbital_radius * a.cos(), drift_orbital_radius * a.sin());
                DVec3::X * (forward_speed * drift_ticks) + rotate(circle, tilt_axis, ecliptic_tilt_radians)
            }
        }
    }

    /// Moves the sun to its position at `drift_ticks` and, for the tilted
    /// variant, re-derives the tilt axis from the displacement.
    pub fn advance_reference(&mut self, reference: &mut ReferenceBody, drift_ticks: f64) {
        reference.previous_position = reference.position;
        reference.position = self.reference_position(drift_ticks);
        if let MotionVariant::TiltedOrbitDrift { .. } = self.motion {
            self.tilt_axis = dynamic_tilt_axis(reference.position, reference.previous_position, self.tilt_axis);
        }
    }

    /// Offset of `body` from the sun. Pure given the body's phase and the
    /// current tilt axis.
    pub fn body_offset(&self, body: &OrbitalBody) -> DVec3 {
        let r = body.orbital_radius();
        let (s, c) = body.angle().sin_cos();
        match self.motion {
            MotionVariant::Static => DVec3::new(r * c, 0.0, r * s),
            MotionVariant::LinearDrift { ecliptic_tilt_radians, .. } => {
                rotate(DVec3::new(r * c, 0.0, r * s), self.tilt_axis, ecliptic_tilt_radians)
            }
            MotionVariant::TiltedOrbitDrift { ecliptic_tilt_radians, .. } => {
                rotate(DVec3::new(0.0, r * c, r * s), self.tilt_axis, ecliptic_tilt_radians)
            }
        }
    }

    pub fn body_position(&self, body: &OrbitalBody, reference: &ReferenceBody) -> DVec3 {
        reference.position + self.body_offset(body)
    }
}
