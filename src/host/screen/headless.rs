use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::host::dump;
use crate::machine::generic::timing::CPU_FREQ_HZ;
use crate::machine::sim::{SimError, System};
use crate::video::{Frame, FrameStats};

/// Simulate one vertical period and wrap it up as a [`Frame`].
pub fn next_frame(system: &mut System) -> Result<Frame, SimError> {
    let vsync_high = system.mcu().vsync().unwrap_or(true);
    let lines = system.run_frame()?;
    Ok(Frame::new(
        system.timing(),
        system.hsync_ticks(),
        lines,
        vsync_high,
    ))
}

fn log_stats(index: usize, stats: &FrameStats) {
    info!(
        "frame {index}: {} lines, {} with bands, entry ticks {}..={}, hsync {} ticks, vsync {} ticks, {} violations, {} lost",
        stats.lines,
        stats.band_lines,
        stats.entry_min,
        stats.entry_max,
        stats.hsync_ticks,
        stats.vsync_ticks,
        stats.violations,
        stats.lost
    );
}

/// Simulate `frames` frames, logging a summary of each. The last frame is
/// dumped to `dump` if given.
pub fn run(
    mut system: System,
    frames: usize,
    dump: Option<&Path>,
) -> Result<Vec<FrameStats>, SimError> {
    let start = Instant::now();
    let mut stats = Vec::with_capacity(frames);
    let mut last = None;
    for index in 0..frames {
        let frame = next_frame(&mut system)?;
        let frame_stats = frame.stats();
        log_stats(index, &frame_stats);
        stats.push(frame_stats);
        last = Some(frame);
    }

    if let (Some(path), Some(frame)) = (dump, &last) {
        dump::dump_ppm(path, &frame.visible())?;
    }

    let elapsed = start.elapsed();
    info!("Simulated {} lines in {:?}", system.lines(), elapsed);
    if elapsed.as_secs_f64() > 0.0 {
        let cycles = system.mcu().cycle as f64;
        info!(
            "  Speed: {:.2}x real time",
            cycles / CPU_FREQ_HZ as f64 / elapsed.as_secs_f64()
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::generic::timing::VGA_640X480;
    use crate::machine::sim::SimConfig;
    use crate::machine::sim::cpu::IsrModel;

    #[test]
    fn test_run_and_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last.ppm");
        let system = System::new(&VGA_640X480, SimConfig::default());
        let stats = run(system, 2, Some(&path)).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].band_lines, 480);
        assert_eq!(stats[0].vsync_ticks, stats[1].vsync_ticks);
        assert!(path.exists());
    }

    #[test]
    fn test_strict_run_stops_on_violation() {
        let config = SimConfig {
            isr: IsrModel::default().with_prologue(60),
            strict: true,
        };
        let system = System::new(&VGA_640X480, config);
        assert!(matches!(
            run(system, 1, None),
            Err(SimError::TimingViolation { .. })
        ));
    }
}
