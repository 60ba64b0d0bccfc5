use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ratatui::crossterm;
use ratatui::crossterm::event::{Event, KeyCode, KeyEventKind};
use ratatui::prelude::CrosstermBackend;
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use tracing::{info, warn};

use crate::host::dump;
use crate::host::screen::headless::next_frame;
use crate::machine::sim::System;
use crate::screen::Screen;
use crate::video::{FrameStats, Raster};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MonitorCommand {
    ToggleRun,
    Dump,
    Quit,
}

fn command(event: &Event) -> Option<MonitorCommand> {
    let Event::Key(key) = event else {
        return None;
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') => Some(MonitorCommand::ToggleRun),
        KeyCode::Char('d') => Some(MonitorCommand::Dump),
        KeyCode::Char('q') | KeyCode::Esc => Some(MonitorCommand::Quit),
        _ => None,
    }
}

/// Show the simulated picture until `q` is pressed. Space pauses, `d` dumps
/// the current frame. Returns the number of frames simulated.
pub fn run(
    system: System,
    frames: Option<usize>,
    dump_path: Option<&Path>,
) -> Result<usize, Box<dyn std::error::Error>> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen,)?;
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
    )?;

    let res = run_inner(system, frames, dump_path);

    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen,)?;
    res
}

fn run_inner(
    mut system: System,
    frames: Option<usize>,
    dump_path: Option<&Path>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let dump_path = dump_path
        .map(Path::to_owned)
        .unwrap_or_else(|| PathBuf::from("/tmp/avr-vga.ppm"));
    let mut terminal = ratatui::Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let mut running = true;
    let mut count = 0;
    let mut picture: Option<(Raster, FrameStats)> = None;

    loop {
        if running && frames.is_none_or(|max| count < max) {
            let frame = next_frame(&mut system)?;
            picture = Some((frame.visible(), frame.stats()));
            count += 1;
        }

        if crossterm::event::poll(Duration::from_millis(if running { 0 } else { 50 }))? {
            let start = Instant::now();
            let event = crossterm::event::read()?;
            if start.elapsed() > Duration::from_millis(100) {
                warn!("Event read took too long: {:?}", start.elapsed());
            }
            match command(&event) {
                Some(MonitorCommand::ToggleRun) => running = !running,
                Some(MonitorCommand::Dump) => {
                    if let Some((raster, _)) = &picture {
                        dump::dump_ppm(&dump_path, raster)?;
                    }
                }
                Some(MonitorCommand::Quit) => break,
                None => {}
            }
        }

        if let Some((raster, stats)) = &picture {
            terminal.draw(|f| {
                f.render_widget(Screen::new(raster), f.area());
                let status = Span::styled(
                    format!(
                        "frame {count} entry {}..={} viol {} lost {}{}",
                        stats.entry_min,
                        stats.entry_max,
                        stats.violations,
                        stats.lost,
                        if running { "" } else { " [paused]" }
                    ),
                    Style::default().fg(Color::LightBlue).bg(Color::Black),
                );
                f.render_widget(status.into_right_aligned_line(), f.area());
            })?;
        }
    }
    info!("Monitor closed after {count} frames");
    Ok(count)
}
