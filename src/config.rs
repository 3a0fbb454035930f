//! Session configuration.
//!
//! A [`SessionConfig`] is a plain in-memory value. It derives `serde` so a
//! frontend can keep presets as JSON files, but the core never reads files
//! itself.
//!
//! ```json
//! {
//!   "bodies": [
//!     { "id": "earth", "display_name": "Earth", "visual_radius": 1.0,
//!       "orbital_radius": 12.0, "orbital_period": 3.0 }
//!   ],
//!   "motion": { "variant": "static" },
//!   "trail_arm_delay_seconds": 2.0
//! }
//! ```
//!
//! Every field except `bodies` has a default.

use chrono::NaiveDate;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;

use crate::body::PERIOD_SCALE_FACTOR;
use crate::error::{ConfigError, ConfigResult};
use crate::frame::MotionVariant;
use crate::selection::SelectionPolicy;

/// Static description of one orbiting body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    pub id: String,
    pub display_name: String,
    pub visual_radius: f64,
    pub orbital_radius: f64,
    pub orbital_period: f64, // simulated years
    #[serde(default)]
    pub phase_offset: f64,
    #[serde(default)]
    pub real_radius_km: f64,
    #[serde(default)]
    pub real_orbital_radius_million_km: f64,
    /// Colour or texture reference, opaque to the core
    #[serde(default)]
    pub appearance: String,
}

/// Click-versus-drag thresholds for pointer input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Movement (pixels) from the press point that turns a click into a drag
    pub drag_threshold: f64,
    /// Camera rotation in radians per pixel dragged
    pub rotate_sensitivity: f64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self { drag_threshold: 3.0, rotate_sensitivity: 0.002 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub bodies: Vec<BodyDescriptor>,
    #[serde(default = "default_motion")]
    pub motion: MotionVariant,
    #[serde(default = "default_period_scale")]
    pub period_scale_factor: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,
    #[serde(default = "default_arm_delay")]
    pub trail_arm_delay_seconds: f64,
    /// Pausing also stops the elapsed time the trail gate waits on
    #[serde(default = "default_true")]
    pub freeze_trail_clock_on_pause: bool,
    #[serde(default)]
    pub selection: SelectionPolicy,
    #[serde(default)]
    pub pointer: PointerConfig,
    /// Calendar date at tick zero
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,
}

fn default_motion() -> MotionVariant {
    MotionVariant::Static
}
fn default_period_scale() -> f64 {
    PERIOD_SCALE_FACTOR
}
fn default_max_speed() -> f64 {
    10.0
}
fn default_initial_speed() -> f64 {
    1.0
}
fn default_arm_delay() -> f64 {
    2.0
}
fn default_true() -> bool {
    true
}
fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 20).unwrap_or(NaiveDate::MIN)
}

/// Built-in scenes, one per sun trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionPreset {
    /// Sun fixed at the origin
    Static,
    /// Sun rising straight up, orbits stay horizontal
    Upward,
    /// Sun moving along +x with orbits tilted 60.2°
    Linear,
    /// Sun on a huge tilted circle, orbital planes following its heading
    Spiral,
}

impl MotionPreset {
    pub fn motion(self) -> MotionVariant {
        match self {
            MotionPreset::Static => MotionVariant::Static,
            MotionPreset::Upward => MotionVariant::LinearDrift {
                forward_speed: 0.0,
                vertical_speed: 0.05,
                forward_axis: DVec3::X,
                tilt_axis: DVec3::Z,
                ecliptic_tilt_radians: 0.0,
            },
            MotionPreset::Linear => MotionVariant::LinearDrift {
                forward_speed: 0.5,
                vertical_speed: 0.0,
                forward_axis: DVec3::X,
                tilt_axis: DVec3::Z,
                ecliptic_tilt_radians: 60.2f64.to_radians(),
            },
            MotionPreset::Spiral => MotionVariant::TiltedOrbitDrift {
                forward_speed: 0.1,
                drift_orbital_radius: 5000.0,
                drift_angular_speed: 0.001,
                tilt_axis: DVec3::Z,
                ecliptic_tilt_radians: 60f64.to_radians(),
            },
        }
    }
}

struct Planet {
    name: &'static str,
    radius: f64,
    orbital_radius: f64,
    period: f64,
    real_radius_km: f64,
    real_orbital_radius_mio_km: f64,
    color: &'static str,
}

const PLANETS: [Planet; 8] = [
    Planet {
        name: "Mercury",
        color: "#808080",
        radius: 0.5, orbital_radius: 5.0, period: 0.88,
        real_radius_km: 2439.7, real_orbital_radius_mio_km: 57.91,
    },
    Planet {
        name: "Venus",
        color: "#ffa600",
        radius: 0.8, orbital_radius: 8.0, period: 2.25,
        real_radius_km: 6051.8, real_orbital_radius_mio_km: 108.2,
    },
    Planet {
        name: "Earth",
        color: "#3c64ff",
        radius: 1.0, orbital_radius: 12.0, period: 3.0,
        real_radius_km: 6371.0, real_orbital_radius_mio_km: 149.6,
    },
    Planet {
        name: "Mars",
        color: "#ff0000",
        radius: 0.6, orbital_radius: 16.0, period: 4.88,
        real_radius_km: 3389.5, real_orbital_radius_mio_km: 227.9,
    },
    Planet {
        name: "Jupiter",
        color: "#00ffff",
        radius: 1.8, orbital_radius: 25.0, period: 12.0,
        real_radius_km: 69911.0, real_orbital_radius_mio_km: 778.5,
    },
    Planet {
        name: "Saturn",
        color: "#ffff99",
        radius: 1.6, orbital_radius: 35.0, period: 29.5,
        real_radius_km: 58232.0, real_orbital_radius_mio_km: 1434.0,
    },
    Planet {
        name: "Uranus",
        color: "#00ff00",
        radius: 1.2, orbital_radius: 48.0, period: 84.0,
        real_radius_km: 25362.0, real_orbital_radius_mio_km: 2871.0,
    },
    Planet {
        name: "Neptune",
        color: "#3333ff",
        radius: 1.1, orbital_radius: 60.0, period: 165.0,
        real_radius_km: 24622.0, real_orbital_radius_mio_km: 4495.0,
    },
];

impl SessionConfig {
    /// Session with default settings around the given bodies.
    pub fn new(bodies: Vec<BodyDescriptor>, motion: MotionVariant) -> Self {
        Self {
            bodies,
            motion,
            period_scale_factor: default_period_scale(),
            max_speed: default_max_speed(),
            initial_speed: default_initial_speed(),
            trail_arm_delay_seconds: default_arm_delay(),
            freeze_trail_clock_on_pause: true,
            selection: SelectionPolicy::default(),
            pointer: PointerConfig::default(),
            epoch: default_epoch(),
        }
    }

    /// The eight planets, staggered by π/4 in starting phase.
    pub fn solar_system(preset: MotionPreset) -> Self {
        let bodies = PLANETS
            .iter()
            .enumerate()
            .map(|(i, p)| BodyDescriptor {
                id: p.name.to_lowercase(),
                display_name: p.name.to_string(),
                visual_radius: p.radius,
                orbital_radius: p.orbital_radius,
                orbital_period: p.period,
                phase_offset: i as f64 * PI / 4.0,
                real_radius_km: p.real_radius_km,
                real_orbital_radius_million_km: p.real_orbital_radius_mio_km,
                appearance: p.color.to_string(),
            })
            .collect();
        Self::new(bodies, preset.motion())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.bodies.is_empty() {
            return Err(ConfigError::NoBodies);
        }
        let mut seen = HashSet::new();
        for (i, b) in self.bodies.iter().enumerate() {
            if b.id.trim().is_empty() {
                return Err(ConfigError::EmptyId(i));
            }
            if !seen.insert(b.id.as_str()) {
                return Err(ConfigError::DuplicateId(b.id.clone()));
            }
            if !positive(b.orbital_period) {
                return Err(ConfigError::InvalidPeriod { id: b.id.clone(), value: b.orbital_period });
            }
            if !positive(b.orbital_radius) {
                return Err(ConfigError::InvalidOrbitalRadius { id: b.id.clone(), value: b.orbital_radius });
            }
            if !positive(b.visual_radius) {
                return Err(ConfigError::InvalidVisualRadius { id: b.id.clone(), value: b.visual_radius });
            }
            if !b.phase_offset.is_finite() {
                return Err(ConfigError::InvalidPhaseOffset { id: b.id.clone() });
            }
        }
        if !positive(self.period_scale_factor) {
            return Err(ConfigError::InvalidPeriodScale(self.period_scale_factor));
        }
        if !non_negative(self.max_speed) {
            return Err(ConfigError::InvalidMaxSpeed(self.max_speed));
        }
        if !non_negative(self.initial_speed) || self.initial_speed > self.max_speed {
            return Err(ConfigError::InitialSpeedOutOfRange { speed: self.initial_speed, max: self.max_speed });
        }
        if !non_negative(self.trail_arm_delay_seconds) {
            return Err(ConfigError::InvalidArmDelay(self.trail_arm_delay_seconds));
        }
        if !non_negative(self.pointer.drag_threshold) {
            return Err(ConfigError::InvalidPointer { name: "drag_threshold", value: self.pointer.drag_threshold });
        }
        if !self.pointer.rotate_sensitivity.is_finite() {
            return Err(ConfigError::InvalidPointer {
                name: "rotate_sensitivity",
                value: self.pointer.rotate_sensitivity,
            });
        }
        if !self.selection.label_margin.is_finite() {
            return Err(ConfigError::InvalidLabelMargin(self.selection.label_margin));
        }
        validate_motion(&self.motion)
    }
}

fn validate_motion(motion: &MotionVariant) -> ConfigResult<()> {
    let fields: Vec<(&'static str, f64)> = match *motion {
        MotionVariant::Static => Vec::new(),
        MotionVariant::LinearDrift { forward_speed, vertical_speed, forward_axis, tilt_axis, ecliptic_tilt_radians } => vec![
            ("forward_speed", forward_speed),
            ("vertical_speed", vertical_speed),
            ("forward_axis", forward_axis.length()),
            ("tilt_axis", tilt_axis.length()),
            ("ecliptic_tilt_radians", ecliptic_tilt_radians),
        ],
        MotionVariant::TiltedOrbitDrift {
            forward_speed,
            drift_orbital_radius,
            drift_angular_speed,
            tilt_axis,
            ecliptic_tilt_radians,
        } => vec![
            ("forward_speed", forward_speed),
            ("drift_orbital_radius", drift_orbital_radius),
            ("drift_angular_speed", drift_angular_speed),
            ("tilt_axis", tilt_axis.length()),
            ("ecliptic_tilt_radians", ecliptic_tilt_radians),
        ],
    };
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(ConfigError::InvalidMotion { name, value });
        }
    }
    Ok(())
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for preset in [MotionPreset::Static, MotionPreset::Upward, MotionPreset::Linear, MotionPreset::Spiral] {
            assert_eq!(SessionConfig::solar_system(preset).validate(), Ok(()));
        }
    }

    #[test]
    fn catalogue_matches_planet_table() {
        let cfg = SessionConfig::solar_system(MotionPreset::Static);
        let names: Vec<_> = cfg.bodies.iter().map(|b| b.display_name.as_str()).collect();
        assert_eq!(
            names,
            ["Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune"]
        );
        let earth = &cfg.bodies[2];
        assert_eq!(earth.id, "earth");
        assert_eq!((earth.orbital_radius, earth.orbital_period), (12.0, 3.0));
        assert_eq!(earth.appearance, "#3c64ff");
        assert!(cfg.bodies.windows(2).all(|w| w[0].orbital_radius < w[1].orbital_radius));
    }

    #[test]
    fn rejects_non_positive_period() {
        let mut cfg = SessionConfig::solar_system(MotionPreset::Static);
        cfg.bodies[2].orbital_period = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidPeriod { id: "earth".into(), value: 0.0 })
        );
    }

    #[test]
    fn rejects_negative_radius() {
        let mut cfg = SessionConfig::solar_system(MotionPreset::Static);
        cfg.bodies[0].orbital_radius = -5.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidOrbitalRadius { .. })));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut cfg = SessionConfig::solar_system(MotionPreset::Static);
        cfg.bodies[1].id = "mercury".into();
        assert_eq!(cfg.validate(), Err(ConfigError::DuplicateId("mercury".into())));
    }

    #[test]
    fn rejects_empty() {
        let cfg = SessionConfig::new(Vec::new(), MotionVariant::Static);
        assert_eq!(cfg.validate(), Err(ConfigError::NoBodies));
    }

    #[test]
    fn rejects_initial_speed_above_max() {
        let mut cfg = SessionConfig::solar_system(MotionPreset::Static);
        cfg.initial_speed = 20.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InitialSpeedOutOfRange { .. })));
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let json = r#"{
            "bodies": [
                { "id": "earth", "display_name": "Earth", "visual_radius": 1.0,
                  "orbital_radius": 12.0, "orbital_period": 3.0 }
            ],
            "motion": { "variant": "linear_drift", "forward_speed": 0.5, "vertical_speed": 0.0,
                        "forward_axis": [1.0, 0.0, 0.0], "tilt_axis": [0.0, 0.0, 1.0],
                        "ecliptic_tilt_radians": 1.0 }
        }"#;
        let cfg: SessionConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(cfg.period_scale_factor, 100.0);
        assert_eq!(cfg.trail_arm_delay_seconds, 2.0);
        assert!(cfg.freeze_trail_clock_on_pause);
        assert_eq!(cfg.pointer, PointerConfig::default());
        assert_eq!(cfg.epoch, NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
        assert!(matches!(cfg.motion, MotionVariant::LinearDrift { forward_speed, .. } if forward_speed == 0.5));
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn json_round_trip_of_preset() {
        let cfg = SessionConfig::solar_system(MotionPreset::Spiral);
        let text = serde_json::to_string_pretty(&cfg).expect("serialize");
        let back: SessionConfig = serde_json::from_str(&text).expect("parse");
        assert_eq!(back, cfg);
    }
}
