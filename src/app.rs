use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::ResetColor,
    terminal::{
        self, BeginSynchronizedUpdate, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use spiral_orrery::{MotionPreset, SessionConfig, SimulationSession};
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;

use crate::input::{collect_events_nonblocking, map_event, Command};
use crate::render::TerminalView;

// longer gaps (suspend, debugger) would make the trail gate jump
const MAX_REAL_DT: f64 = 0.05;

/// Real time fed to one tick. Never below two frames, so a low FPS cap
/// still runs the trail clock at wall speed.
fn clamp_real_dt(elapsed: Duration, frame_dt: Duration) -> f64 {
    let cap = MAX_REAL_DT.max(2.0 * frame_dt.as_secs_f64());
    elapsed.as_secs_f64().min(cap)
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Variant {
    Static,
    Upward,
    Linear,
    Spiral,
}

impl From<Variant> for MotionPreset {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Static => MotionPreset::Static,
            Variant::Upward => MotionPreset::Upward,
            Variant::Linear => MotionPreset::Linear,
            Variant::Spiral => MotionPreset::Spiral,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "spiral-orrery")]
#[command(about = "Terminal solar system with a drifting sun and helical planet trails", long_about = None)]
pub(crate) struct Args {
    /// Built-in sun trajectory (ignored with --config)
    #[arg(long, value_enum, default_value_t = Variant::Spiral)]
    variant: Variant,

    /// JSON session file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the resolved session as JSON and exit
    #[arg(long, default_value_t = false)]
    dump_config: bool,

    /// Initial simulation speed
    #[arg(long)]
    speed: Option<f64>,

    #[arg(long, default_value_t = false)]
    pause_on_select: bool,

    /// Clicking the selected body again deselects it
    #[arg(long, default_value_t = false)]
    toggle_select: bool,

    /// FPS cap; one simulation tick per frame
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Write tracing output here (the terminal is busy drawing)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Star-field seed
    #[arg(long, default_value_t = 0x5EED_0A1B)]
    seed: u64,
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading session file {}", path.display()))?;
            serde_json::from_str::<SessionConfig>(&text)
                .with_context(|| format!("parsing session file {}", path.display()))?
        }
        None => SessionConfig::solar_system(args.variant.into()),
    };
    if let Some(speed) = args.speed {
        cfg.initial_speed = speed;
    }
    if args.pause_on_select {
        cfg.selection.pause_on_select = true;
        cfg.selection.resume_on_speed_change = true;
    }
    if args.toggle_select {
        cfg.selection.toggle_on_reselect = true;
    }
    Ok(cfg)
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let cfg = load_config(&args)?;
    if args.dump_config {
        let json = serde_json::to_string_pretty(&cfg).context("serializing session")?;
        println!("{json}");
        return Ok(());
    }
    let session = SimulationSession::new(cfg).context("invalid session configuration")?;

    let mut out = io::stdout();
    install_panic_hook();
    terminal::enable_raw_mode().context("enabling raw mode")?;
    execute!(
        out,
        EnterAlternateScreen,
        EnableMouseCapture,
        cursor::Hide,
        DisableLineWrap,
        terminal::Clear(ClearType::All)
    )?;

    let res = run_loop(&mut out, session, &args);
    finish(res, restore_terminal(&mut out))
}

/// Runs every restore step even when an earlier one fails; reports the first error.
fn restore_terminal(out: &mut io::Stdout) -> io::Result<()> {
    let steps = [
        execute!(out, EndSynchronizedUpdate),
        execute!(out, ResetColor),
        execute!(out, DisableMouseCapture),
        execute!(out, cursor::Show),
        execute!(out, EnableLineWrap),
        execute!(out, LeaveAlternateScreen),
        terminal::disable_raw_mode(),
    ];
    steps.into_iter().collect()
}

fn install_panic_hook() {
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal(&mut io::stdout());
        prev(info);
    }));
}

/// The loop's own error wins over a failed restore.
fn finish(res: anyhow::Result<()>, restored: io::Result<()>) -> anyhow::Result<()> {
    match (res, restored) {
        (Err(e), _) => Err(e),
        (Ok(()), r) => r.context("restoring terminal"),
    }
}

fn run_loop(out: &mut io::Stdout, mut session: SimulationSession, args: &Args) -> anyhow::Result<()> {
    let fps = args.fps.clamp(10, 240);
    let frame_dt = Duration::from_secs_f64(1.0 / fps as f64);
    let extent = session
        .bodies()
        .iter()
        .map(|b| b.orbital_radius() + b.visual_radius())
        .fold(0.0, f64::max);
    let mut view = TerminalView::new(args.seed, extent);
    let mut last_frame = Instant::now();

    info!(fps, "entering frame loop");
    'main: loop {
        let (w, h) = terminal::size()?;
        if view.resize(w, h) {
            execute!(out, terminal::Clear(ClearType::All))?;
            view.invalidate();
        }

        for ev in collect_events_nonblocking(frame_dt)? {
            for cmd in map_event(ev, &session, &view) {
                match cmd {
                    Command::Quit => break 'main,
                    Command::Push(intent) => session.push(intent),
                    Command::ZoomIn => view.zoom_by(1.15),
                    Command::ZoomOut => view.zoom_by(1.0 / 1.15),
                    Command::ResetView => view.reset_view(),
                    Command::ToggleLabels => view.toggle_labels(),
                }
            }
        }

        let now = Instant::now();
        let real_dt = clamp_real_dt(now - last_frame, frame_dt);
        last_frame = now;

        let frame = session.tick_into(real_dt, &mut view);
        view.draw(&frame, &session);

        queue!(out, BeginSynchronizedUpdate)?;
        view.flush(out)?;
        queue!(out, EndSynchronizedUpdate)?;
        out.flush()?;

        let elapsed = Instant::now() - now;
        if elapsed < frame_dt {
            std::thread::sleep(frame_dt - elapsed);
        }
    }
    info!(ticks = session.clock().tick_count(), "quit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_dt_cap_follows_frame_time() {
        let slow = Duration::from_millis(100);
        assert!((clamp_real_dt(slow, slow) - 0.1).abs() < 1e-9);
        assert!((clamp_real_dt(Duration::from_secs(3), slow) - 0.2).abs() < 1e-9);
        let fast = Duration::from_secs_f64(1.0 / 60.0);
        assert!((clamp_real_dt(Duration::from_secs(1), fast) - MAX_REAL_DT).abs() < 1e-9);
    }

    #[test]
    fn loop_error_survives_failed_restore() {
        let res = finish(
            Err(anyhow::anyhow!("draw failed")),
            Err(io::Error::new(io::ErrorKind::Other, "restore failed")),
        );
        assert_eq!(res.map_err(|e| e.to_string()), Err("draw failed".to_string()));

        let res = finish(Ok(()), Err(io::Error::new(io::ErrorKind::Other, "restore failed")));
        assert!(res.is_err());
        assert!(finish(Ok(()), Ok(())).is_ok());
    }
}
