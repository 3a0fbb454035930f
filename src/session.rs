//! The simulation session: owns every piece of mutable state and runs one
//! tick at a time.
//!
//! Input arrives as [`Intent`]s. They are queued between frames and applied
//! in arrival order at the start of the next [`SimulationSession::tick`],
//! before any motion is computed, so the same intents and deltas always
//! reproduce the same positions.

use chrono::NaiveDateTime;
use glam::DVec3;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::body::{BodyId, BodyRegistry};
use crate::clock::SimulationClock;
use crate::config::SessionConfig;
use crate::error::ConfigResult;
use crate::frame::{ReferenceBody, ReferenceFrameModel};
use crate::pointer::{CameraRotation, PointerTracker, Release, ScreenPos};
use crate::selection::{PickOutcome, SelectionController, SelectionLabel};
use crate::trail::TrailGate;

/// Input translated into a message for the next tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    SpeedChanged(f64),
    PauseToggle,
    PointerDown(ScreenPos),
    PointerMove { pos: ScreenPos, buttons_held: bool },
    PointerUp(ScreenPos),
    /// Hit-test result from the renderer; `None` when nothing was hit
    Pick(Option<BodyId>),
    Reset,
}

/// Outbound calls to whatever draws the scene.
pub trait RenderSink {
    fn set_reference_position(&mut self, position: DVec3);
    fn set_body_position(&mut self, id: &BodyId, position: DVec3);
    fn set_trail_enabled(&mut self, id: &BodyId, enabled: bool);
    fn set_camera_target(&mut self, target: DVec3);
    fn rotate_camera(&mut self, axis: DVec3, angle: f64);
    fn set_selection_label(&mut self, label: Option<&SelectionLabel>);
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyFrame {
    pub id: BodyId,
    pub position: DVec3,
    pub trail_enabled: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInstructions {
    pub tick: u64,
    pub advanced: bool,
    pub reference_position: DVec3,
    pub bodies: Vec<BodyFrame>,
    /// Only set while the sun is drifting
    pub camera_target: Option<DVec3>,
    pub camera_rotations: Vec<CameraRotation>,
    pub label: Option<SelectionLabel>,
    pub paused: bool,
    pub speed: f64,
    pub simulated_date: NaiveDateTime,
}

impl FrameInstructions {
    pub fn dispatch<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        sink.set_reference_position(self.reference_position);
        for b in &self.bodies {
            sink.set_body_position(&b.id, b.position);
            sink.set_trail_enabled(&b.id, b.trail_enabled);
        }
        if let Some(target) = self.camera_target {
            sink.set_camera_target(target);
        }
        for r in &self.camera_rotations {
            sink.rotate_camera(r.axis, r.angle);
        }
        sink.set_selection_label(self.label.as_ref());
    }

    pub fn body(&self, id: &BodyId) -> Option<&BodyFrame> {
        self.bodies.iter().find(|b| &b.id == id)
    }
}

pub struct SimulationSession {
    config: SessionConfig,
    clock: SimulationClock,
    reference: ReferenceBody,
    frame: ReferenceFrameModel,
    bodies: BodyRegistry,
    selection: SelectionController,
    trails: TrailGate,
    pointer: PointerTracker,
    pending: VecDeque<Intent>,
    rotations: Vec<CameraRotation>,
}

impl SimulationSession {
    /// Validates `config` and builds a session positioned at tick zero.
    pub fn new(config: SessionConfig) -> ConfigResult<Self> {
        config.validate()?;
        info!(
            bodies = config.bodies.len(),
            motion = config.motion.name(),
            "starting session"
        );
        let mut session = Self {
            clock: Self::fresh_clock(&config),
            reference: ReferenceBody::new(config.motion),
            frame: ReferenceFrameModel::new(config.motion),
            bodies: BodyRegistry::from_descriptors(&config.bodies),
            selection: SelectionController::new(config.selection.clone()),
            trails: TrailGate::new(config.trail_arm_delay_seconds),
            pointer: PointerTracker::new(config.pointer.clone()),
            pending: VecDeque::new(),
            rotations: Vec::new(),
            config,
        };
        session.place_at_start();
        Ok(session)
    }

    fn fresh_clock(config: &SessionConfig) -> SimulationClock {
        SimulationClock::new(
            config.initial_speed,
            config.max_speed,
            config.period_scale_factor,
            config.freeze_trail_clock_on_pause,
        )
    }

    fn place_at_start(&mut self) {
        let start = self.frame.reference_position(0.0);
        self.reference.position = start;
        self.reference.previous_position = start;
        self.place_bodies();
    }

    fn place_bodies(&mut self) {
        let frame = &self.frame;
        let reference = &self.reference;
        for body in self.bodies.iter_mut() {
            let p = frame.body_position(body, reference);
            body.set_position(p);
        }
    }

    /// Recreates bodies, clock, selection, trail gate and pointer state from
    /// the config.
    pub fn reset(&mut self) {
        info!("session reset");
        self.clock = Self::fresh_clock(&self.config);
        self.reference = ReferenceBody::new(self.config.motion);
        self.frame = ReferenceFrameModel::new(self.config.motion);
        self.bodies = BodyRegistry::from_descriptors(&self.config.bodies);
        self.selection = SelectionController::new(self.config.selection.clone());
        self.trails = TrailGate::new(self.config.trail_arm_delay_seconds);
        self.pointer = PointerTracker::new(self.config.pointer.clone());
        self.rotations.clear();
        self.place_at_start();
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }
    pub fn bodies(&self) -> &BodyRegistry {
        &self.bodies
    }
    pub fn reference(&self) -> &ReferenceBody {
        &self.reference
    }
    pub fn frame_model(&self) -> &ReferenceFrameModel {
        &self.frame
    }
    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }
    pub fn trail_gate(&self) -> &TrailGate {
        &self.trails
    }
    pub fn pending_intents(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, intent: Intent) {
        self.pending.push_back(intent);
    }

    pub fn on_speed_changed(&mut self, value: f64) {
        self.push(Intent::SpeedChanged(value));
    }
    pub fn on_pause_toggle(&mut self) {
        self.push(Intent::PauseToggle);
    }
    pub fn on_pointer_down(&mut self, pos: ScreenPos) {
        self.push(Intent::PointerDown(pos));
    }
    pub fn on_pointer_move(&mut self, pos: ScreenPos, buttons_held: bool) {
        self.push(Intent::PointerMove { pos, buttons_held });
    }
    pub fn on_pointer_up(&mut self, pos: ScreenPos) {
        self.push(Intent::PointerUp(pos));
    }
    pub fn on_pick(&mut self, hit: Option<BodyId>) {
        self.push(Intent::Pick(hit));
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::SpeedChanged(v) => {
                let speed = self.clock.set_speed(v);
                if self.selection.policy().resume_on_speed_change && self.clock.is_paused() {
                    debug!(speed, "speed change resumes");
                    self.clock.set_paused(false);
                }
            }
            Intent::PauseToggle => {
                let paused = self.clock.toggle_pause();
                info!(paused, tick = self.clock.tick_count(), "pause toggled");
            }
            Intent::PointerDown(pos) => self.pointer.down(pos),
            Intent::PointerMove { pos, buttons_held } => {
                let r = self.pointer.moved(pos, buttons_held);
                self.rotations.extend(r);
            }
            Intent::PointerUp(pos) => {
                if self.pointer.up(pos) == Release::Drag {
                    debug!("drag released");
                }
            }
            Intent::Pick(hit) => {
                if self.pointer.accepts_pick() {
                    let outcome = self.selection.pick(hit.as_ref(), &self.bodies);
                    if self.selection.policy().pause_on_select {
                        match outcome {
                            PickOutcome::Selected => self.clock.set_paused(true),
                            PickOutcome::Deselected => self.clock.set_paused(false),
                            PickOutcome::Unchanged => {}
                        }
                    }
                } else {
                    debug!("pick ignored after drag");
                }
                self.pointer.pick_consumed();
            }
            Intent::Reset => self.reset(),
        }
    }

    /// Applies queued intents, then advances one tick.
    pub fn tick(&mut self, real_delta_seconds: f64) -> FrameInstructions {
        while let Some(intent) = self.pending.pop_front() {
            self.apply(intent);
        }

        let step = self.clock.advance(real_delta_seconds, &mut self.bodies);
        self.frame.advance_reference(&mut self.reference, step.drift_ticks);
        self.place_bodies();
        let trails_on = self.trails.update(step.elapsed_sim_seconds);

        let camera_target = self.config.motion.is_drifting().then_some(self.reference.position);
        FrameInstructions {
            tick: step.tick,
            advanced: step.advanced,
            reference_position: self.reference.position,
            bodies: self
                .bodies
                .iter()
                .map(|b| BodyFrame { id: b.id().clone(), position: b.position(), trail_enabled: trails_on })
                .collect(),
            camera_target,
            camera_rotations: std::mem::take(&mut self.rotations),
            label: self.selection.label(&self.bodies),
            paused: self.clock.is_paused(),
            speed: self.clock.speed(),
            simulated_date: self.clock.simulated_date(self.config.epoch),
        }
    }

    /// Advances one tick and pushes the result into `sink`.
    pub fn tick_into<S: RenderSink + ?Sized>(&mut self, real_delta_seconds: f64, sink: &mut S) -> FrameInstructions {
        let frame = self.tick(real_delta_seconds);
        frame.dispatch(sink);
        frame
    }
}
