use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::fmt;

use crate::config::BodyDescriptor;

/// Ticks per simulated year at speed 1. A body with period `P` years
/// completes one orbit every `P * PERIOD_SCALE_FACTOR` ticks.
pub const PERIOD_SCALE_FACTOR: f64 = 100.0;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(String);

impl BodyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BodyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One body on a fixed-radius circular orbit around the reference body.
#[derive(Clone, Debug)]
pub struct OrbitalBody {
    id: BodyId,
    display_name: String,
    orbital_radius: f64,
    orbital_period: f64, // simulated years
    phase_offset: f64,
    current_phase: f64,
    visual_radius: f64,
    appearance: String,
    real_radius_km: f64,
    real_orbital_radius_million_km: f64,
    position: DVec3,
}

impl OrbitalBody {
    pub(crate) fn from_descriptor(d: &BodyDescriptor) -> Self {
        Self {
            id: BodyId::new(d.id.clone()),
            display_name: d.display_name.clone(),
            orbital_radius: d.orbital_radius,
            orbital_period: d.orbital_period,
            phase_offset: d.phase_offset,
            current_phase: 0.0,
            visual_radius: d.visual_radius,
            appearance: d.appearance.clone(),
            real_radius_km: d.real_radius_km,
            real_orbital_radius_million_km: d.real_orbital_radius_million_km,
            // parked on the +x axis until the first tick places it
            position: DVec3::new(d.orbital_radius, 0.0, 0.0),
        }
    }

    pub fn id(&self) -> &BodyId {
        &self.id
    }
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
    pub fn orbital_radius(&self) -> f64 {
        self.orbital_radius
    }
    pub fn orbital_period(&self) -> f64 {
        self.orbital_period
    }
    pub fn phase_offset(&self) -> f64 {
        self.phase_offset
    }
    pub fn current_phase(&self) -> f64 {
        self.current_phase
    }
    pub fn visual_radius(&self) -> f64 {
        self.visual_radius
    }
    pub fn appearance(&self) -> &str {
        &self.appearance
    }
    pub fn real_radius_km(&self) -> f64 {
        self.real_radius_km
    }
    pub fn real_orbital_radius_million_km(&self) -> f64 {
        self.real_orbital_radius_million_km
    }
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Angle actually used for placement: `current_phase + phase_offset`.
    pub fn angle(&self) -> f64 {
        self.current_phase + self.phase_offset
    }

    /// Phase gained per tick at speed 1.
    pub fn angular_velocity(&self, period_scale_factor: f64) -> f64 {
        TAU / (self.orbital_period * period_scale_factor)
    }

    /// Only [`SimulationClock::advance`](crate::clock::SimulationClock::advance) calls this.
    pub(crate) fn advance_phase(&mut self, delta_ticks: f64, speed: f64, period_scale_factor: f64) {
        let step = self.angular_velocity(period_scale_factor) * delta_ticks * speed;
        self.current_phase = (self.current_phase + step).rem_euclid(TAU);
    }

    pub(crate) fn set_position(&mut self, p: DVec3) {
        self.position = p;
    }
}

/// Bodies keyed by id, iterated in configuration order.
#[derive(Clone, Debug, Default)]
pub struct BodyRegistry {
    bodies: Vec<OrbitalBody>,
    index: HashMap<BodyId, usize>,
}

impl BodyRegistry {
    /// Descriptors are expected to be validated already; a repeated id keeps
    /// the first body.
    pub(crate) fn from_descriptors(descriptors: &[BodyDescriptor]) -> Self {
        let mut reg = Self::default();
        for d in descriptors {
            let body = OrbitalBody::from_descriptor(d);
            if reg.index.contains_key(body.id()) {
                continue;
            }
            reg.index.insert(body.id().clone(), reg.bodies.len());
            reg.bodies.push(body);
        }
        reg
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, id: &BodyId) -> Option<&OrbitalBody> {
        self.index.get(id).map(|&i| &self.bodies[i])
    }

    pub fn contains(&self, id: &BodyId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrbitalBody> {
        self.bodies.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut OrbitalBody> {
        self.bodies.iter_mut()
    }

    /// Body at configuration position `i`; used for number-key selection.
    pub fn nth(&self, i: usize) -> Option<&OrbitalBody> {
        self.bodies.get(i)
    }
}
