use glam::DVec3;

use crate::config::PointerConfig;

/// Pointer position in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, o: ScreenPos) -> f64 {
        ((self.x - o.x).powi(2) + (self.y - o.y).powi(2)).sqrt()
    }
}

/// Incremental camera rotation about a world axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRotation {
    pub axis: DVec3,
    pub angle: f64,
}

/// How a released press was classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    Click,
    Drag,
    /// Up without a matching down
    Stray,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Pressed { origin: ScreenPos },
    Dragging { last: ScreenPos },
    Clicked,
    Dragged,
}

/// Tells clicks from drags and turns drags into camera rotations.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    config: PointerConfig,
    gesture: Gesture,
}

impl PointerTracker {
    pub fn new(config: PointerConfig) -> Self {
        Self { config, gesture: Gesture::Idle }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    pub fn down(&mut self, pos: ScreenPos) {
        self.gesture = Gesture::Pressed { origin: pos };
    }

    /// Hover moves (no button held) are ignored.
    pub fn moved(&mut self, pos: ScreenPos, buttons_held: bool) -> Vec<CameraRotation> {
        if !buttons_held {
            return Vec::new();
        }
        let last = match self.gesture {
            // the first drag step covers everything since the press
            Gesture::Pressed { origin } => {
                if pos.distance(origin) <= self.config.drag_threshold {
                    return Vec::new();
                }
                origin
            }
            Gesture::Dragging { last } => last,
            _ => return Vec::new(),
        };
        self.gesture = Gesture::Dragging { last: pos };
        self.rotations(pos.x - last.x, pos.y - last.y)
    }

    pub fn up(&mut self, pos: ScreenPos) -> Release {
        match self.gesture {
            Gesture::Pressed { origin } if pos.distance(origin) <= self.config.drag_threshold => {
                self.gesture = Gesture::Clicked;
                Release::Click
            }
            Gesture::Pressed { .. } | Gesture::Dragging { .. } => {
                self.gesture = Gesture::Dragged;
                Release::Drag
            }
            _ => {
                self.gesture = Gesture::Idle;
                Release::Stray
            }
        }
    }

    /// A pick is honoured after a click or with no gesture at all; never
    /// mid-press or after a drag.
    pub fn accepts_pick(&self) -> bool {
        matches!(self.gesture, Gesture::Idle | Gesture::Clicked)
    }

    /// Ends a released gesture once its pick has been handled.
    pub fn pick_consumed(&mut self) {
        if matches!(self.gesture, Gesture::Clicked | Gesture::Dragged) {
            self.gesture = Gesture::Idle;
        }
    }

    fn rotations(&self, dx: f64, dy: f64) -> Vec<CameraRotation> {
        let k = self.config.rotate_sensitivity;
        let mut out = Vec::with_capacity(2);
        if dx != 0.0 {
            out.push(CameraRotation { axis: DVec3::Y, angle: dx * k });
        }
        if dy != 0.0 {
            out.push(CameraRotation { axis: DVec3::X, angle: dy * k });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PointerTracker {
        PointerTracker::new(PointerConfig { drag_threshold: 3.0, rotate_sensitivity: 0.002 })
    }

    #[test]
    fn small_wobble_is_a_click() {
        let mut p = tracker();
        p.down(ScreenPos::new(100.0, 100.0));
        assert!(p.moved(ScreenPos::new(101.0, 101.0), true).is_empty());
        assert_eq!(p.up(ScreenPos::new(102.0, 100.0)), Release::Click);
        assert!(p.accepts_pick());
    }

    #[test]
    fn drag_rotates_camera() {
        let mut p = tracker();
        p.down(ScreenPos::new(0.0, 0.0));
        let r = p.moved(ScreenPos::new(10.0, -5.0), true);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].axis, DVec3::Y);
        assert!((r[0].angle - 0.02).abs() < 1e-12);
        assert_eq!(r[1].axis, DVec3::X);
        assert!((r[1].angle + 0.01).abs() < 1e-12);

        let r = p.moved(ScreenPos::new(12.0, -5.0), true);
        assert_eq!(r, vec![CameraRotation { axis: DVec3::Y, angle: 2.0 * 0.002 }]);
        assert!(p.is_dragging());
        assert!(!p.accepts_pick());
        assert_eq!(p.up(ScreenPos::new(12.0, -5.0)), Release::Drag);
        assert!(!p.accepts_pick());
        p.pick_consumed();
        assert!(p.accepts_pick());
    }

    #[test]
    fn drag_keeps_movement_below_threshold() {
        let mut p = tracker();
        p.down(ScreenPos::new(0.0, 0.0));
        assert!(p.moved(ScreenPos::new(2.0, 0.0), true).is_empty());
        let r = p.moved(ScreenPos::new(10.0, 0.0), true);
        assert_eq!(r.len(), 1);
        assert!((r[0].angle - 10.0 * 0.002).abs() < 1e-12);
    }

    #[test]
    fn hover_does_nothing() {
        let mut p = tracker();
        assert!(p.moved(ScreenPos::new(50.0, 50.0), false).is_empty());
        assert!(p.moved(ScreenPos::new(90.0, 10.0), true).is_empty());
        assert_eq!(p.up(ScreenPos::new(0.0, 0.0)), Release::Stray);
    }
}
