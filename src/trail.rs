use tracing::info;

/// One-shot latch that switches trails on once enough simulated time has
/// passed, so the first frames do not leave stray segments.
#[derive(Clone, Debug)]
pub struct TrailGate {
    enabled: bool,
    arm_delay_seconds: f64,
}

impl TrailGate {
    pub fn new(arm_delay_seconds: f64) -> Self {
        Self { enabled: false, arm_delay_seconds }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&mut self, elapsed_sim_seconds: f64) -> bool {
        if !self.enabled && elapsed_sim_seconds >= self.arm_delay_seconds {
            info!(elapsed_sim_seconds, "trails enabled");
            self.enabled = true;
        }
        self.enabled
    }
}
