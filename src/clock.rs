use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::body::BodyRegistry;

const DAYS_PER_YEAR: f64 = 365.25;

/// Outcome of one [`SimulationClock::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickResult {
    pub tick: u64,
    /// Phases and drift time moved this tick
    pub advanced: bool,
    pub drift_ticks: f64,
    pub elapsed_sim_seconds: f64,
}

/// Tick counter, speed and pause state. The only writer of body phases.
#[derive(Clone, Debug)]
pub struct SimulationClock {
    tick_count: u64,
    speed_multiplier: f64,
    max_speed: f64,
    paused: bool,
    drift_ticks: f64,
    elapsed_sim_seconds: f64,
    period_scale_factor: f64,
    freeze_elapsed_on_pause: bool,
}

impl SimulationClock {
    pub fn new(initial_speed: f64, max_speed: f64, period_scale_factor: f64, freeze_elapsed_on_pause: bool) -> Self {
        let max_speed = max_speed.max(0.0);
        Self {
            tick_count: 0,
            speed_multiplier: initial_speed.clamp(0.0, max_speed),
            max_speed,
            paused: false,
            drift_ticks: 0.0,
            elapsed_sim_seconds: 0.0,
            period_scale_factor,
            freeze_elapsed_on_pause,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
    pub fn speed(&self) -> f64 {
        self.speed_multiplier
    }
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }
    pub fn is_paused(&self) -> bool {
        self.paused
    }
    pub fn drift_ticks(&self) -> f64 {
        self.drift_ticks
    }
    pub fn elapsed_sim_seconds(&self) -> f64 {
        self.elapsed_sim_seconds
    }

    /// True when the next tick would move the bodies.
    pub fn is_running(&self) -> bool {
        !self.paused && self.speed_multiplier > 0.0
    }

    /// Clamps to `[0, max_speed]`; NaN leaves the speed unchanged.
    pub fn set_speed(&mut self, value: f64) -> f64 {
        if value.is_nan() {
            debug!("ignoring NaN speed");
            return self.speed_multiplier;
        }
        let clamped = value.clamp(0.0, self.max_speed);
        if clamped != value {
            debug!(requested = value, clamped, "speed clamped");
        }
        self.speed_multiplier = clamped;
        clamped
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Advances one tick. Phases, drift time and (unless configured
    /// otherwise) elapsed time only move while running.
    pub fn advance(&mut self, real_delta_seconds: f64, bodies: &mut BodyRegistry) -> TickResult {
        self.tick_count += 1;
        let dt = if real_delta_seconds.is_finite() { real_delta_seconds.max(0.0) } else { 0.0 };

        let advanced = self.is_running();
        if advanced {
            let speed = self.speed_multiplier;
            for body in bodies.iter_mut() {
                body.advance_phase(1.0, speed, self.period_scale_factor);
            }
            self.drift_ticks += speed;
            self.elapsed_sim_seconds += dt;
        } else if !self.freeze_elapsed_on_pause {
            self.elapsed_sim_seconds += dt;
        }

        TickResult {
            tick: self.tick_count,
            advanced,
            drift_ticks: self.drift_ticks,
            elapsed_sim_seconds: self.elapsed_sim_seconds,
        }
    }

    /// Simulated years so far: one year is `period_scale_factor` ticks at speed 1.
    pub fn simulated_years(&self) -> f64 {
        self.drift_ticks / self.period_scale_factor
    }

    /// Calendar date reached from midnight of `epoch`.
    pub fn simulated_date(&self, epoch: NaiveDate) -> NaiveDateTime {
        let start = epoch.and_time(NaiveTime::MIN);
        let millis = self.simulated_years() * DAYS_PER_YEAR * 86_400_000.0;
        if !millis.is_finite() {
            return start;
        }
        // clamp before the cast; chrono panics past its representable range
        let millis = millis.clamp(0.0, 1.0e15) as i64;
        start
            .checked_add_signed(ChronoDuration::milliseconds(millis))
            .unwrap_or(NaiveDateTime::MAX)
    }
}
