use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::{BodyId, BodyRegistry};

/// How clicks on bodies are interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Clicking the selected body again clears the selection
    pub toggle_on_reselect: bool,
    /// Selecting a body pauses the clock (inspect-on-click)
    pub pause_on_select: bool,
    /// Moving the speed slider resumes a paused clock
    pub resume_on_speed_change: bool,
    /// Gap between the top of the body and the label anchor
    pub label_margin: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            toggle_on_reselect: false,
            pause_on_select: false,
            resume_on_speed_change: false,
            label_margin: 2.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    pub selected: Option<BodyId>,
}

impl SelectionState {
    pub fn visible(&self) -> bool {
        self.selected.is_some()
    }
}

/// Info box shown next to the selected body.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionLabel {
    pub id: BodyId,
    pub name: String,
    pub real_radius_km: f64,
    pub orbital_period_years: f64,
    pub real_orbital_radius_million_km: f64,
    pub anchor: DVec3,
}

impl SelectionLabel {
    pub fn lines(&self) -> [String; 4] {
        [
            format!("Name: {}", self.name),
            format!("Radius: {} km", self.real_radius_km),
            format!("Orbital period: {} years", self.orbital_period_years),
            format!("Distance to sun: {} million km", self.real_orbital_radius_million_km),
        ]
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

/// What a pick changed, so the session can apply policy side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickOutcome {
    Selected,
    Deselected,
    Unchanged,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
    policy: SelectionPolicy,
}

impl SelectionController {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { state: SelectionState::default(), policy }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    pub fn on_pick(&mut self, hit: Option<&BodyId>, bodies: &BodyRegistry) -> SelectionState {
        self.pick(hit, bodies);
        self.state.clone()
    }

    pub(crate) fn pick(&mut self, hit: Option<&BodyId>, bodies: &BodyRegistry) -> PickOutcome {
        let known = hit.filter(|id| bodies.contains(id));
        if let (Some(id), None) = (hit, known) {
            debug!(%id, "pick reported unknown body");
        }
        match known {
            None => {
                let had = self.state.selected.take().is_some();
                if had {
                    PickOutcome::Deselected
                } else {
                    PickOutcome::Unchanged
                }
            }
            Some(id) if self.state.selected.as_ref() == Some(id) => {
                if self.policy.toggle_on_reselect {
                    self.state.selected = None;
                    debug!(%id, "deselected");
                    PickOutcome::Deselected
                } else {
                    PickOutcome::Unchanged
                }
            }
            Some(id) => {
                debug!(%id, "selected");
                self.state.selected = Some(id.clone());
                PickOutcome::Selected
            }
        }
    }

    /// Label for the current selection, anchored above the body.
    pub fn label(&self, bodies: &BodyRegistry) -> Option<SelectionLabel> {
        let body = bodies.get(self.state.selected.as_ref()?)?;
        Some(SelectionLabel {
            id: body.id().clone(),
            name: body.display_name().to_string(),
            real_radius_km: body.real_radius_km(),
            orbital_period_years: body.orbital_period(),
            real_orbital_radius_million_km: body.real_orbital_radius_million_km(),
            anchor: body.position() + DVec3::new(0.0, body.visual_radius() + self.policy.label_margin, 0.0),
        })
    }
}
