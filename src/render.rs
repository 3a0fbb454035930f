use crossterm::{
    cursor, queue,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
};
use glam::{DQuat, DVec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use spiral_orrery::{BodyId, FrameInstructions, RenderSink, SelectionLabel, SimulationSession};
use std::{
    collections::{HashMap, VecDeque},
    f32::consts::PI,
    io::{self, Stdout},
    time::Instant,
};

const HUD_W: u16 = 34;
const TRAIL_LEN: usize = 900;
// terminal cells are roughly twice as tall as wide
const CELL_ASPECT: f64 = 0.5;
// start looking down onto the horizontal plane
const DEFAULT_PITCH: f64 = -1.05;
const PICK_RADIUS_CELLS: f32 = 2.5;

// -------------------- Cell buffer + diff render --------------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}
impl Cell {
    fn blank(bg: Color) -> Self {
        Self { ch: ' ', fg: Color::Reset, bg }
    }
}

fn put_cell(buf: &mut [Cell], w: u16, h: u16, x: u16, y: u16, c: Cell) {
    if x >= w || y >= h {
        return;
    }
    buf[y as usize * w as usize + x as usize] = c;
}

fn box_draw(buf: &mut [Cell], w: u16, h: u16, x0: u16, y0: u16, bw: u16, bh: u16, fg: Color, bg: Color) {
    if bw < 2 || bh < 2 {
        return;
    }
    let x1 = x0.saturating_add(bw - 1);
    let y1 = y0.saturating_add(bh - 1);
    for x in x0 + 1..x1 {
        put_cell(buf, w, h, x, y0, Cell { ch: '─', fg, bg });
        put_cell(buf, w, h, x, y1, Cell { ch: '─', fg, bg });
    }
    for y in y0 + 1..y1 {
        put_cell(buf, w, h, x0, y, Cell { ch: '│', fg, bg });
        put_cell(buf, w, h, x1, y, Cell { ch: '│', fg, bg });
    }
    put_cell(buf, w, h, x0, y0, Cell { ch: '┌', fg, bg });
    put_cell(buf, w, h, x1, y0, Cell { ch: '┐', fg, bg });
    put_cell(buf, w, h, x0, y1, Cell { ch: '└', fg, bg });
    put_cell(buf, w, h, x1, y1, Cell { ch: '┘', fg, bg });
}

fn fill_rect(buf: &mut [Cell], w: u16, h: u16, x0: u16, y0: u16, bw: u16, bh: u16, bg: Color) {
    for y in y0..y0.saturating_add(bh) {
        for x in x0..x0.saturating_add(bw) {
            put_cell(buf, w, h, x, y, Cell::blank(bg));
        }
    }
}

fn write_str(buf: &mut [Cell], w: u16, h: u16, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    if y >= h {
        return;
    }
    for (i, ch) in s.chars().enumerate() {
        let xi = x as usize + i;
        if xi >= w as usize {
            break;
        }
        buf[y as usize * w as usize + xi] = Cell { ch, fg, bg };
    }
}

fn render_diff(out: &mut Stdout, w: u16, h: u16, prev: &mut [Cell], cur: &[Cell]) -> io::Result<()> {
    let mut cur_fg = Color::Reset;
    let mut cur_bg = Color::Reset;
    for y in 0..h as usize {
        for x in 0..w as usize {
            let i = y * (w as usize) + x;
            if prev[i] == cur[i] {
                continue;
            }
            prev[i] = cur[i];
            let c = cur[i];
            queue!(out, cursor::MoveTo(x as u16, y as u16))?;
            if c.bg != cur_bg {
                cur_bg = c.bg;
                queue!(out, SetBackgroundColor(cur_bg))?;
            }
            if c.fg != cur_fg {
                cur_fg = c.fg;
                queue!(out, SetForegroundColor(cur_fg))?;
            }
            queue!(out, Print(c.ch))?;
        }
    }
    Ok(())
}

// -------------------- Colours --------------------
#[derive(Clone, Copy, Debug, PartialEq)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}
impl Rgb {
    const GREY: Rgb = Rgb { r: 180, g: 180, b: 180 };

    fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
    fn scale(self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f32 * t) as u8,
            g: (self.g as f32 * t) as u8,
            b: (self.b as f32 * t) as u8,
        }
    }
}

/// `#rrggbb` appearance strings become colours; anything else (texture
/// paths) falls back to grey.
fn parse_appearance(s: &str) -> Rgb {
    let rgb = match s.strip_prefix('#') {
        Some(h) if h.len() == 6 && h.bytes().all(|b| b.is_ascii_hexdigit()) => u32::from_str_radix(h, 16).ok(),
        _ => None,
    };
    match rgb {
        Some(v) => Rgb { r: (v >> 16) as u8, g: (v >> 8) as u8, b: v as u8 },
        None => Rgb::GREY,
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// -------------------- Stars --------------------
#[derive(Clone, Copy)]
struct Star {
    x: u16,
    y: u16,
    phase: f32,
    depth: f32,
}

fn build_stars(w: u16, h: u16, count: usize, seed: u64) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut stars = Vec::with_capacity(count);
    if w == 0 || h == 0 {
        return stars;
    }
    for _ in 0..count {
        stars.push(Star {
            x: rng.gen_range(0..w),
            y: rng.gen_range(0..h),
            phase: rng.gen_range(0.0..(PI * 2.0)),
            depth: rng.gen_range(0.35..1.0),
        });
    }
    stars
}

// -------------------- Terminal view --------------------
/// Draws the scene into a character-cell buffer. Receives positions through
/// [`RenderSink`] and keeps the trail geometry and camera orientation.
pub(crate) struct TerminalView {
    w: u16,
    h: u16,
    prev: Vec<Cell>,
    cur: Vec<Cell>,
    seed: u64,
    stars: Vec<Star>,
    sun: DVec3,
    positions: HashMap<BodyId, DVec3>,
    trails: HashMap<BodyId, VecDeque<DVec3>>,
    target: DVec3,
    orientation: DQuat,
    zoom: f64,
    extent: f64,
    label: Option<SelectionLabel>,
    show_labels: bool,
    hits: Vec<(BodyId, f32, f32)>,
    started: Instant,
}

impl TerminalView {
    pub(crate) fn new(seed: u64, extent: f64) -> Self {
        Self {
            w: 0,
            h: 0,
            prev: Vec::new(),
            cur: Vec::new(),
            seed,
            stars: Vec::new(),
            sun: DVec3::ZERO,
            positions: HashMap::new(),
            trails: HashMap::new(),
            target: DVec3::ZERO,
            orientation: DQuat::from_rotation_x(DEFAULT_PITCH),
            zoom: 1.0,
            extent: extent.max(1.0),
            label: None,
            show_labels: true,
            hits: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Reallocates buffers on size change; true means the screen must be cleared.
    pub(crate) fn resize(&mut self, w: u16, h: u16) -> bool {
        let w = w.max(60);
        let h = h.max(20);
        if w == self.w && h == self.h {
            return false;
        }
        self.w = w;
        self.h = h;
        self.prev = vec![Cell::blank(Color::Black); w as usize * h as usize];
        self.cur = self.prev.clone();
        let main_w = w.saturating_sub(HUD_W);
        let count = ((main_w as usize * h as usize) / 60).clamp(60, 260);
        let seed = self.seed ^ ((w as u64) << 32) ^ (h as u64);
        self.stars = build_stars(main_w, h, count, seed);
        true
    }

    pub(crate) fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(0.1, 12.0);
    }

    pub(crate) fn reset_view(&mut self) {
        self.orientation = DQuat::from_rotation_x(DEFAULT_PITCH);
        self.zoom = 1.0;
    }

    pub(crate) fn toggle_labels(&mut self) {
        self.show_labels = !self.show_labels;
    }

    fn main_w(&self) -> u16 {
        self.w.saturating_sub(HUD_W)
    }

    fn scale(&self) -> f64 {
        let fit = (self.main_w() as f64 * 0.5).min(self.h as f64) / (self.extent * 1.1);
        fit * self.zoom
    }

    /// Screen cell coordinates and view depth (larger is nearer).
    fn project(&self, p: DVec3) -> (f32, f32, f64) {
        let v = self.orientation.inverse() * (p - self.target);
        let cx = self.main_w() as f64 * 0.5;
        let cy = self.h as f64 * 0.5;
        let s = self.scale();
        ((cx + v.x * s) as f32, (cy - v.y * s * CELL_ASPECT) as f32, v.z)
    }

    fn in_main(&self, x: f32, y: f32) -> bool {
        x >= 1.0 && y >= 1.0 && x < (self.main_w().saturating_sub(1)) as f32 && y < (self.h - 1) as f32
    }

    /// Nearest body drawn within a few cells of the click.
    pub(crate) fn pick(&self, column: u16, row: u16) -> Option<BodyId> {
        let (cx, cy) = (column as f32, row as f32);
        self.hits
            .iter()
            .map(|(id, x, y)| {
                // rows count double: a cell is about twice as tall as wide
                let d = ((x - cx).powi(2) + (2.0 * (y - cy)).powi(2)).sqrt();
                (id, d)
            })
            .filter(|(_, d)| *d <= PICK_RADIUS_CELLS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.clone())
    }

    pub(crate) fn draw(&mut self, frame: &FrameInstructions, session: &SimulationSession) {
        let (w, h) = (self.w, self.h);
        let bg = Color::Black;
        let dim = Color::Rgb { r: 120, g: 120, b: 120 };
        let mut buf = std::mem::take(&mut self.cur);
        for c in buf.iter_mut() {
            *c = Cell::blank(bg);
        }

        let t_real = self.started.elapsed().as_secs_f32();
        for s in &self.stars {
            let tw = (t_real * 0.65 + s.phase).sin() * 0.5 + 0.5;
            let b = lerp(0.2, 1.0, tw * s.depth);
            let c = (40.0 + b * 180.0).clamp(0.0, 255.0) as u8;
            let ch = if b > 0.82 { '✦' } else if b > 0.62 { '•' } else { '·' };
            put_cell(&mut buf, w, h, s.x, s.y, Cell { ch, fg: Color::Rgb { r: c, g: c, b: c.saturating_add(25) }, bg });
        }

        for body in session.bodies().iter() {
            let Some(trail) = self.trails.get(body.id()) else { continue };
            let rgb = parse_appearance(body.appearance());
            let n = trail.len().max(1) as f32;
            for (i, p) in trail.iter().enumerate() {
                let (x, y, _) = self.project(*p);
                if self.in_main(x, y) {
                    let fg = rgb.scale(lerp(0.15, 0.85, i as f32 / n)).to_color();
                    put_cell(&mut buf, w, h, x as u16, y as u16, Cell { ch: '·', fg, bg });
                }
            }
        }

        // far to near
        let mut sprites: Vec<(f64, f32, f32, char, Color, Option<(&BodyId, &str)>)> = Vec::new();
        let (sx, sy, sz) = self.project(self.sun);
        sprites.push((sz, sx, sy, '☼', Color::Rgb { r: 255, g: 220, b: 90 }, None));
        let selected = frame.label.as_ref().map(|l| &l.id);
        for body in session.bodies().iter() {
            let p = self.positions.get(body.id()).copied().unwrap_or(body.position());
            let (x, y, z) = self.project(p);
            let ch = if Some(body.id()) == selected {
                '◆'
            } else if body.visual_radius() >= 1.5 {
                '⬤'
            } else if body.visual_radius() >= 0.8 {
                '●'
            } else {
                '•'
            };
            let fg = parse_appearance(body.appearance()).to_color();
            sprites.push((z, x, y, ch, fg, Some((body.id(), body.display_name()))));
        }
        sprites.sort_by(|a, b| a.0.total_cmp(&b.0));

        self.hits.clear();
        for (_, x, y, ch, fg, named) in &sprites {
            if !self.in_main(*x, *y) {
                continue;
            }
            put_cell(&mut buf, w, h, *x as u16, *y as u16, Cell { ch: *ch, fg: *fg, bg });
            if let Some((id, name)) = named {
                self.hits.push(((*id).clone(), *x, *y));
                if self.show_labels {
                    write_str(&mut buf, w, h, *x as u16 + 2, *y as u16, name, dim, bg);
                }
            }
        }

        if let Some(label) = &self.label {
            self.draw_label(&mut buf, label);
        }
        self.draw_hud(&mut buf, frame, session);
        self.cur = buf;
    }

    fn draw_label(&self, buf: &mut [Cell], label: &SelectionLabel) {
        let (w, h) = (self.w, self.h);
        let fg = Color::Rgb { r: 235, g: 235, b: 235 };
        let panel = Color::Rgb { r: 50, g: 50, b: 50 };
        let lines = label.lines();
        let bw = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let bh = lines.len() as u16 + 2;
        let (ax, ay, _) = self.project(label.anchor);
        let max_x = self.main_w().saturating_sub(bw + 1);
        let max_y = h.saturating_sub(bh + 1);
        let x0 = (ax.max(1.0) as u16 + 2).min(max_x).max(1);
        let y0 = (ay.max(1.0) as u16).saturating_sub(bh).min(max_y).max(1);
        fill_rect(buf, w, h, x0, y0, bw, bh, panel);
        box_draw(buf, w, h, x0, y0, bw, bh, fg, panel);
        for (i, line) in lines.iter().enumerate() {
            write_str(buf, w, h, x0 + 2, y0 + 1 + i as u16, line, fg, panel);
        }
    }

    fn draw_hud(&self, buf: &mut [Cell], frame: &FrameInstructions, session: &SimulationSession) {
        let (w, h) = (self.w, self.h);
        let bg = Color::Black;
        let fg = Color::Rgb { r: 220, g: 220, b: 220 };
        let dim = Color::Rgb { r: 120, g: 120, b: 120 };
        let edge = Color::Rgb { r: 80, g: 95, b: 120 };
        let x0 = self.main_w();
        let top_h = 12u16.min(h / 2);
        box_draw(buf, w, h, x0, 0, HUD_W, top_h, edge, bg);
        box_draw(buf, w, h, x0, top_h, HUD_W, h.saturating_sub(top_h), edge, bg);

        let px = x0 + 2;
        let max_speed = session.clock().max_speed().max(f64::EPSILON);
        let filled = ((frame.speed / max_speed) * 20.0).round() as usize;
        let slider: String = (0..20).map(|i| if i < filled { '■' } else { '·' }).collect();
        let selected = frame.label.as_ref().map(|l| l.name.as_str()).unwrap_or("none");
        let trails = frame.bodies.first().map(|b| b.trail_enabled).unwrap_or(false);
        let top = [
            format!("Motion: {}", session.frame_model().motion().name()),
            format!("Date: {}", frame.simulated_date.format("%Y-%m-%d")),
            format!("Speed: {:.2}x", frame.speed),
            format!("[{}]", slider),
            format!("State: {}", if frame.paused { "paused" } else { "running" }),
            format!("Tick: {}", frame.tick),
            format!("Trails: {}", if trails { "on" } else { "waiting" }),
            format!("Selected: {}", selected),
        ];
        write_str(buf, w, h, px, 1, "Spiral Orrery", fg, bg);
        for (i, line) in top.iter().enumerate() {
            let y = 2 + i as u16;
            if y + 1 >= top_h {
                break;
            }
            write_str(buf, w, h, px, y, line, dim, bg);
        }

        let mut y = top_h + 1;
        for line in [
            "Controls",
            "Space pause | +/- speed | [/] x1",
            "Click select | drag rotate",
            "1-9 select | Bksp clear",
            "W/S zoom | C view | L labels",
            "R reset | Q quit",
        ] {
            if y + 1 >= h {
                break;
            }
            write_str(buf, w, h, px, y, line, if y == top_h + 1 { fg } else { dim }, bg);
            y += 1;
        }
    }

    /// Forces every cell to be rewritten after the terminal was cleared.
    pub(crate) fn invalidate(&mut self) {
        for c in self.prev.iter_mut() {
            *c = Cell::blank(Color::Black);
        }
    }

    pub(crate) fn flush(&mut self, out: &mut Stdout) -> io::Result<()> {
        render_diff(out, self.w, self.h, &mut self.prev, &self.cur)
    }
}

impl RenderSink for TerminalView {
    fn set_reference_position(&mut self, position: DVec3) {
        self.sun = position;
    }

    fn set_body_position(&mut self, id: &BodyId, position: DVec3) {
        self.positions.insert(id.clone(), position);
    }

    fn set_trail_enabled(&mut self, id: &BodyId, enabled: bool) {
        if !enabled {
            if let Some(t) = self.trails.get_mut(id) {
                t.clear();
            }
            return;
        }
        let Some(&p) = self.positions.get(id) else { return };
        let trail = self.trails.entry(id.clone()).or_default();
        if trail.back() != Some(&p) {
            trail.push_back(p);
            if trail.len() > TRAIL_LEN {
                trail.pop_front();
            }
        }
    }

    fn set_camera_target(&mut self, target: DVec3) {
        self.target = target;
    }

    fn rotate_camera(&mut self, axis: DVec3, angle: f64) {
        let Some(axis) = axis.try_normalize() else { return };
        self.orientation = (DQuat::from_axis_angle(axis, angle) * self.orientation).normalize();
    }

    fn set_selection_label(&mut self, label: Option<&SelectionLabel>) {
        self.label = label.cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appearance_parsing() {
        assert_eq!(parse_appearance("#ff8000"), Rgb { r: 255, g: 128, b: 0 });
        assert_eq!(parse_appearance("textures/earth.jpg"), Rgb::GREY);
        assert_eq!(parse_appearance("#zzzzzz"), Rgb::GREY);
        assert_eq!(parse_appearance("#aé123"), Rgb::GREY);
        assert_eq!(parse_appearance("#+12345"), Rgb::GREY);
    }

    #[test]
    fn trails_clear_when_disabled() {
        let mut view = TerminalView::new(1, 60.0);
        let id = BodyId::from("earth");
        view.set_body_position(&id, DVec3::X);
        view.set_trail_enabled(&id, true);
        view.set_body_position(&id, DVec3::Y);
        view.set_trail_enabled(&id, true);
        view.set_trail_enabled(&id, true);
        assert_eq!(view.trails[&id].len(), 2);
        view.set_trail_enabled(&id, false);
        assert!(view.trails[&id].is_empty());
    }
}
