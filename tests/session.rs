use glam::DVec3;
use spiral_orrery::{
    BodyDescriptor, BodyId, Intent, MotionPreset, MotionVariant, RenderSink, ScreenPos,
    SelectionLabel, SessionConfig, SimulationSession,
};
use std::f64::consts::PI;

const DT: f64 = 1.0 / 60.0;

/// A single body on the reference scenario orbit: radius 12, period 3.
pub fn earth_like(orbital_radius: f64, orbital_period: f64) -> BodyDescriptor {
    BodyDescriptor {
        id: "earth".into(),
        display_name: "Earth".into(),
        visual_radius: 1.0,
        orbital_radius,
        orbital_period,
        phase_offset: 0.0,
        real_radius_km: 6371.0,
        real_orbital_radius_million_km: 149.6,
        appearance: "#3c64ff".into(),
    }
}

pub fn single_body(motion: MotionVariant) -> SimulationSession {
    SimulationSession::new(SessionConfig::new(vec![earth_like(12.0, 3.0)], motion)).expect("valid config")
}

pub fn planets(preset: MotionPreset) -> SimulationSession {
    SimulationSession::new(SessionConfig::solar_system(preset)).expect("valid preset")
}

fn earth() -> BodyId {
    BodyId::from("earth")
}

#[derive(Default)]
struct RecordingSink {
    reference: Option<DVec3>,
    positions: Vec<(BodyId, DVec3)>,
    trails: Vec<(BodyId, bool)>,
    targets: Vec<DVec3>,
    rotations: Vec<(DVec3, f64)>,
    labels: Vec<Option<String>>,
}

impl RenderSink for RecordingSink {
    fn set_reference_position(&mut self, position: DVec3) {
        self.reference = Some(position);
    }
    fn set_body_position(&mut self, id: &BodyId, position: DVec3) {
        self.positions.push((id.clone(), position));
    }
    fn set_trail_enabled(&mut self, id: &BodyId, enabled: bool) {
        self.trails.push((id.clone(), enabled));
    }
    fn set_camera_target(&mut self, target: DVec3) {
        self.targets.push(target);
    }
    fn rotate_camera(&mut self, axis: DVec3, angle: f64) {
        self.rotations.push((axis, angle));
    }
    fn set_selection_label(&mut self, label: Option<&SelectionLabel>) {
        self.labels.push(label.map(|l| l.name.clone()));
    }
}

// ==================================================================================
// Kinematics
// ==================================================================================

#[test]
fn half_orbit_after_150_ticks() {
    let mut s = single_body(MotionVariant::Static);
    let mut last = None;
    for _ in 0..150 {
        last = Some(s.tick(DT));
    }
    let f = last.expect("ticked");
    assert_eq!(f.tick, 150);

    let body = s.bodies().get(&earth()).expect("earth");
    assert!((body.current_phase() - PI).abs() < 1e-9);
    let p = f.body(&earth()).expect("earth in frame").position;
    assert!((p - DVec3::new(-12.0, 0.0, 0.0)).length() < 1e-3, "got {p:?}");
}

#[test]
fn static_orbit_keeps_its_radius() {
    let mut s = planets(MotionPreset::Static);
    for _ in 0..500 {
        let f = s.tick(DT);
        for b in &f.bodies {
            let r = s.bodies().get(&b.id).expect("known body").orbital_radius();
            assert!((b.position.length() - r).abs() < 1e-9);
            assert!(b.position.y.abs() < 1e-12);
        }
    }
}

#[test]
fn pause_freezes_phase_then_resumes() {
    let mut s = single_body(MotionVariant::Static);
    for _ in 0..30 {
        s.tick(DT);
    }
    let frozen = s.bodies().get(&earth()).expect("earth").current_phase();

    s.on_pause_toggle();
    for _ in 0..120 {
        let f = s.tick(DT);
        assert!(!f.advanced);
    }
    assert_eq!(s.bodies().get(&earth()).expect("earth").current_phase(), frozen);
    assert_eq!(s.clock().tick_count(), 150);

    s.on_pause_toggle();
    s.tick(DT);
    let step = 2.0 * PI / (3.0 * 100.0);
    let now = s.bodies().get(&earth()).expect("earth").current_phase();
    assert!((now - (frozen + step)).abs() < 1e-12);
}

#[test]
fn stationary_tilted_sun_keeps_axis() {
    let motion = MotionVariant::TiltedOrbitDrift {
        forward_speed: 0.0,
        drift_orbital_radius: 0.0,
        drift_angular_speed: 0.0,
        tilt_axis: DVec3::Z,
        ecliptic_tilt_radians: 1.0,
    };
    let mut s = single_body(motion);
    let axis = s.frame_model().tilt_axis();
    for _ in 0..50 {
        let f = s.tick(DT);
        assert_eq!(s.frame_model().tilt_axis(), axis);
        let p = f.body(&earth()).expect("earth").position;
        assert!(p.is_finite());
        assert!((p.length() - 12.0).abs() < 1e-9);
    }
}

#[test]
fn drifting_sun_carries_orbits_along() {
    let mut s = planets(MotionPreset::Spiral);
    for _ in 0..300 {
        let f = s.tick(DT);
        assert!(f.reference_position.is_finite());
        assert_eq!(f.camera_target, Some(f.reference_position));
        for b in &f.bodies {
            let r = s.bodies().get(&b.id).expect("known").orbital_radius();
            assert!(((b.position - f.reference_position).length() - r).abs() < 1e-6);
        }
    }
    let axis = s.frame_model().tilt_axis();
    assert!((axis.length() - 1.0).abs() < 1e-9);
    assert!(axis.dot(DVec3::Y).abs() < 1e-9);
}

#[test]
fn same_inputs_same_positions() {
    let script = |s: &mut SimulationSession| {
        let mut out = Vec::new();
        for i in 0..200 {
            match i {
                20 => s.on_speed_changed(4.0),
                60 => s.on_pause_toggle(),
                90 => s.on_pause_toggle(),
                120 => s.on_speed_changed(0.5),
                _ => {}
            }
            let f = s.tick(DT);
            out.push((f.reference_position, f.bodies.iter().map(|b| b.position).collect::<Vec<_>>()));
        }
        out
    };
    let a = script(&mut planets(MotionPreset::Linear));
    let b = script(&mut planets(MotionPreset::Linear));
    assert_eq!(a, b);
}

// ==================================================================================
// Trails
// ==================================================================================

#[test]
fn trails_arm_once_and_stay_on() {
    let mut s = planets(MotionPreset::Static);
    let mut seen_on = false;
    for i in 0..400 {
        if i == 150 || i == 160 {
            s.on_pause_toggle();
        }
        let f = s.tick(DT);
        let on = f.bodies.iter().all(|b| b.trail_enabled);
        assert!(f.bodies.iter().all(|b| b.trail_enabled == on));
        if seen_on {
            assert!(on, "trail switched off at tick {}", f.tick);
        }
        seen_on |= on;
    }
    assert!(seen_on);
}

#[test]
fn trails_wait_while_paused() {
    let mut s = planets(MotionPreset::Static);
    s.on_pause_toggle();
    for _ in 0..600 {
        assert!(s.tick(DT).bodies.iter().all(|b| !b.trail_enabled));
    }
}

// ==================================================================================
// Selection
// ==================================================================================

#[test]
fn click_sequences() {
    let mut cfg = SessionConfig::solar_system(MotionPreset::Static);
    cfg.selection.toggle_on_reselect = true;
    let mut s = SimulationSession::new(cfg).expect("valid");
    let mars = BodyId::from("mars");

    s.on_pick(Some(earth()));
    assert_eq!(s.tick(DT).label.map(|l| l.id), Some(earth()));
    s.on_pick(None);
    assert!(s.tick(DT).label.is_none());

    s.on_pick(Some(earth()));
    s.on_pick(Some(earth()));
    assert!(s.tick(DT).label.is_none());

    s.on_pick(Some(earth()));
    s.on_pick(Some(mars.clone()));
    let label = s.tick(DT).label.expect("mars selected");
    assert_eq!(label.id, mars);
    assert_eq!(label.lines()[0], "Name: Mars");
}

#[test]
fn label_floats_above_selected_body() {
    let mut s = planets(MotionPreset::Linear);
    s.on_pick(Some(earth()));
    for _ in 0..40 {
        let f = s.tick(DT);
        let label = f.label.clone().expect("selected");
        let p = f.body(&earth()).expect("earth").position;
        assert!((label.anchor - (p + DVec3::new(0.0, 1.0 + 2.0, 0.0))).length() < 1e-9);
    }
}

#[test]
fn drag_rotates_camera_without_selecting() {
    let mut s = planets(MotionPreset::Static);
    s.push(Intent::PointerDown(ScreenPos::new(100.0, 100.0)));
    s.push(Intent::PointerMove { pos: ScreenPos::new(140.0, 100.0), buttons_held: true });
    s.push(Intent::PointerUp(ScreenPos::new(140.0, 100.0)));
    s.push(Intent::Pick(Some(earth())));

    let mut sink = RecordingSink::default();
    s.tick_into(DT, &mut sink);
    assert_eq!(sink.rotations.len(), 1);
    assert_eq!(sink.rotations[0].0, DVec3::Y);
    assert!((sink.rotations[0].1 - 40.0 * 0.002).abs() < 1e-12);
    assert_eq!(sink.labels, vec![None]);

    s.on_pick(Some(earth()));
    s.tick_into(DT, &mut sink);
    assert_eq!(sink.labels.last(), Some(&Some("Earth".to_string())));
}

// ==================================================================================
// Render sink
// ==================================================================================

#[test]
fn dispatch_reaches_every_body() {
    let mut s = planets(MotionPreset::Upward);
    let mut sink = RecordingSink::default();
    let f = s.tick_into(DT, &mut sink);

    assert_eq!(sink.reference, Some(f.reference_position));
    assert_eq!(sink.positions.len(), 8);
    assert_eq!(sink.trails.len(), 8);
    assert!(sink.trails.iter().all(|(_, on)| !on));
    assert_eq!(sink.targets, vec![f.reference_position]);
    for (id, p) in &sink.positions {
        assert_eq!(f.body(id).map(|b| b.position), Some(*p));
    }
}

#[test]
fn invalid_config_never_starts() {
    let cfg = SessionConfig::new(vec![earth_like(12.0, 0.0)], MotionVariant::Static);
    assert!(SimulationSession::new(cfg).is_err());
    let cfg = SessionConfig::new(Vec::new(), MotionVariant::Static);
    assert!(SimulationSession::new(cfg).is_err());
}
