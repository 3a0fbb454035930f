use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use spiral_orrery::{Intent, ScreenPos, SimulationSession};
use std::time::Duration;

use crate::render::TerminalView;

// approximate pixel size of one terminal cell, so pointer thresholds stay in pixels
const CELL_W_PX: f64 = 8.0;
const CELL_H_PX: f64 = 16.0;

const SPEED_STEP_FINE: f64 = 0.25;
const SPEED_STEP_COARSE: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Command {
    Quit,
    Push(Intent),
    ZoomIn,
    ZoomOut,
    ResetView,
    ToggleLabels,
}

pub(crate) fn collect_events_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        out.push(event::read()?);
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

fn to_screen(column: u16, row: u16) -> ScreenPos {
    ScreenPos::new(column as f64 * CELL_W_PX, row as f64 * CELL_H_PX)
}

/// Translates one terminal event into commands. Clicks are hit-tested
/// against the last drawn frame.
pub(crate) fn map_event(ev: Event, session: &SimulationSession, view: &TerminalView) -> Vec<Command> {
    match ev {
        Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
            let speed = session.clock().speed();
            let cmd = match k.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
                KeyCode::Char(' ') => Command::Push(Intent::PauseToggle),
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    Command::Push(Intent::SpeedChanged(speed + SPEED_STEP_FINE))
                }
                KeyCode::Char('-') => Command::Push(Intent::SpeedChanged(speed - SPEED_STEP_FINE)),
                KeyCode::Char(']') => Command::Push(Intent::SpeedChanged(speed + SPEED_STEP_COARSE)),
                KeyCode::Char('[') => Command::Push(Intent::SpeedChanged(speed - SPEED_STEP_COARSE)),
                KeyCode::Char('r') | KeyCode::Char('R') => Command::Push(Intent::Reset),
                KeyCode::Char('w') | KeyCode::Char('W') => Command::ZoomIn,
                KeyCode::Char('s') | KeyCode::Char('S') => Command::ZoomOut,
                KeyCode::Char('c') | KeyCode::Char('C') => Command::ResetView,
                KeyCode::Char('l') | KeyCode::Char('L') => Command::ToggleLabels,
                KeyCode::Backspace => Command::Push(Intent::Pick(None)),
                KeyCode::Char(ch @ '1'..='9') => {
                    let i = ch as usize - '1' as usize;
                    match session.bodies().nth(i) {
                        Some(b) => Command::Push(Intent::Pick(Some(b.id().clone()))),
                        None => return Vec::new(),
                    }
                }
                _ => return Vec::new(),
            };
            vec![cmd]
        }
        Event::Mouse(m) => {
            let pos = to_screen(m.column, m.row);
            match m.kind {
                MouseEventKind::Down(MouseButton::Left) => vec![Command::Push(Intent::PointerDown(pos))],
                MouseEventKind::Drag(MouseButton::Left) => {
                    vec![Command::Push(Intent::PointerMove { pos, buttons_held: true })]
                }
                MouseEventKind::Moved => vec![Command::Push(Intent::PointerMove { pos, buttons_held: false })],
                MouseEventKind::Up(MouseButton::Left) => vec![
                    Command::Push(Intent::PointerUp(pos)),
                    Command::Push(Intent::Pick(view.pick(m.column, m.row))),
                ],
                MouseEventKind::ScrollUp => vec![Command::ZoomIn],
                MouseEventKind::ScrollDown => vec![Command::ZoomOut],
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}
