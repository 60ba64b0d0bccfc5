//! Reconstruction of what a monitor would see from the simulator's line
//! records: one pixel per timer tick.

use bit_set::BitSet;
use bytemuck::{Pod, Zeroable};

use crate::machine::generic::pattern::Color;
use crate::machine::generic::phase::Phase;
use crate::machine::generic::timing::{BAND_COUNT, Timing};
use crate::machine::sim::LineRecord;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<Color> for Rgb {
    fn from(color: Color) -> Self {
        let level = |c: Color| if color.contains(c) { 0xff } else { 0 };
        Self {
            r: level(Color::RED),
            g: level(Color::GREEN),
            b: level(Color::BLUE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgb>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::default(); width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[Rgb] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Per-frame measurements, as logged by the headless runner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub lines: usize,
    pub band_lines: usize,
    pub entry_min: u16,
    pub entry_max: u16,
    pub hsync_ticks: u16,
    pub vsync_ticks: u64,
    pub violations: usize,
    pub lost: u64,
}

/// One vertical period of line records.
#[derive(Clone, Debug)]
pub struct Frame {
    timing: Timing,
    hsync_ticks: u16,
    lines: Vec<LineRecord>,
    /// Lines that emitted the complete band sequence.
    band_lines: BitSet,
    /// Lines on which VSYNC is low at the line start.
    vsync_lines: BitSet,
}

impl Frame {
    /// `vsync_high` is the VSYNC level before the first line.
    pub fn new(
        timing: &Timing,
        hsync_ticks: u16,
        lines: Vec<LineRecord>,
        vsync_high: bool,
    ) -> Self {
        let mut band_lines = BitSet::with_capacity(lines.len());
        let mut vsync_lines = BitSet::with_capacity(lines.len());
        let mut vsync = vsync_high;
        for (row, line) in lines.iter().enumerate() {
            if !vsync {
                vsync_lines.insert(row);
            }
            if let Some((_, level)) = line.vsync().last() {
                vsync = level;
            }
            // The bands plus the final blanking write.
            if line.phase == Phase::ActiveVideo && line.colors().count() == BAND_COUNT + 1 {
                band_lines.insert(row);
            }
        }
        Self {
            timing: *timing,
            hsync_ticks,
            lines,
            band_lines,
            vsync_lines,
        }
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn band_lines(&self) -> &BitSet {
        &self.band_lines
    }

    pub fn vsync_lines(&self) -> &BitSet {
        &self.vsync_lines
    }

    /// Ticks VSYNC spends low, from its edges within the frame.
    pub fn vsync_ticks(&self) -> u64 {
        let edges: Vec<(u64, bool)> = self
            .lines
            .iter()
            .flat_map(|line| {
                line.vsync()
                    .map(|(offset, level)| (line.origin + offset as u64, level))
            })
            .collect();
        let mut low_since = None;
        let mut total = 0;
        for (cycle, level) in edges {
            match (level, low_since) {
                (false, None) => low_since = Some(cycle),
                (true, Some(start)) => {
                    total += cycle - start;
                    low_since = None;
                }
                _ => {}
            }
        }
        total
    }

    pub fn stats(&self) -> FrameStats {
        let entries = self.lines.iter().map(|line| line.entry_tick);
        FrameStats {
            lines: self.lines.len(),
            band_lines: self.band_lines.len(),
            entry_min: entries.clone().min().unwrap_or_default(),
            entry_max: entries.max().unwrap_or_default(),
            hsync_ticks: self.hsync_ticks,
            vsync_ticks: self.vsync_ticks(),
            violations: self.lines.iter().map(|l| l.violations().count()).sum(),
            lost: self.lines.iter().map(|l| l.lost).sum(),
        }
    }

    /// Every tick of every line, sync and porches included. Pixels during
    /// the hardware sync pulse and while VSYNC is low stay black.
    pub fn raster(&self) -> Raster {
        let width = self.timing.htot() as usize;
        let mut raster = Raster::new(width, self.lines.len());
        let Some(first) = self.lines.first() else {
            return raster;
        };
        let start = first.origin;

        // Colour writes in absolute ticks from the frame start.
        let mut writes = self
            .lines
            .iter()
            .flat_map(|line| {
                line.colors()
                    .map(move |(offset, color)| (line.origin + offset as u64 - start, color))
            })
            .peekable();

        let mut color = Color::BLACK;
        for (y, line) in self.lines.iter().enumerate() {
            let base = line.origin - start;
            let blanked = self.vsync_lines.contains(y);
            for x in 0..width {
                let tick = base + x as u64;
                while let Some(&(at, next)) = writes.peek() {
                    if at > tick {
                        break;
                    }
                    color = next;
                    writes.next();
                }
                if !blanked && x >= self.hsync_ticks as usize {
                    raster.pixels[y * width + x] = color.into();
                }
            }
        }
        raster
    }

    /// The active area only: `h_active` ticks from the end of the back porch
    /// on each active video line.
    pub fn visible(&self) -> Raster {
        let full = self.raster();
        let x0 = self.timing.active_start() as usize;
        let x1 = self.timing.active_end() as usize;
        let rows: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.phase == Phase::ActiveVideo)
            .map(|(y, _)| y)
            .collect();
        let mut visible = Raster::new(x1 - x0, rows.len());
        for (out_y, y) in rows.into_iter().enumerate() {
            visible.pixels[out_y * visible.width..(out_y + 1) * visible.width]
                .copy_from_slice(&full.row(y)[x0..x1]);
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::generic::pattern::PALETTE;
    use crate::machine::generic::timing::VGA_640X480;
    use crate::machine::sim::{SimConfig, System};

    fn frame() -> Frame {
        let mut system = System::new(&VGA_640X480, SimConfig::default());
        let lines = system.run_frame().unwrap();
        Frame::new(&VGA_640X480, system.hsync_ticks(), lines, true)
    }

    #[test]
    fn test_rgb_from_color() {
        assert_eq!(Rgb::from(Color::BLACK), Rgb { r: 0, g: 0, b: 0 });
        assert_eq!(Rgb::from(Color::YELLOW), Rgb { r: 0xff, g: 0xff, b: 0 });
        assert_eq!(Rgb::from(Color::WHITE), Rgb { r: 0xff, g: 0xff, b: 0xff });
    }

    #[test]
    fn test_stats() {
        let stats = frame().stats();
        assert_eq!(stats.lines, 524);
        assert_eq!(stats.band_lines, 480);
        assert_eq!(stats.hsync_ticks, 61);
        assert_eq!(stats.vsync_ticks, 2 * 507);
        assert_eq!(stats.violations, 0);
        assert_eq!(stats.lost, 0);
        assert!(stats.entry_min < stats.entry_max);
    }

    #[test]
    fn test_vsync_lines() {
        let frame = frame();
        // Low from line 10 tick 91 to line 12 tick 91.
        assert_eq!(frame.vsync_lines().iter().collect::<Vec<_>>(), [11, 12]);
    }

    #[test]
    fn test_visible_area_shows_bands() {
        let visible = frame().visible();
        assert_eq!((visible.width, visible.height), (406, 480));
        for y in [0, 239, 479] {
            for (band, color) in PALETTE.iter().enumerate() {
                let x0 = band * 50;
                let x1 = if band == 7 { 406 } else { x0 + 50 };
                assert!(
                    visible.row(y)[x0..x1].iter().all(|p| *p == Rgb::from(*color)),
                    "row {y} band {band}"
                );
            }
        }
    }

    #[test]
    fn test_blanking_outside_active_area() {
        let frame = frame();
        let raster = frame.raster();
        assert_eq!((raster.width, raster.height), (507, 524));
        let first_active = frame
            .lines()
            .iter()
            .position(|l| l.phase == Phase::ActiveVideo)
            .unwrap();
        let row = raster.row(first_active);
        assert!(row[..91].iter().all(|p| *p == Rgb::default()));
        assert!(row[497..].iter().all(|p| *p == Rgb::default()));
        assert_eq!(row[91 + 50], Rgb::from(Color::RED));
        assert!(raster.row(0).iter().all(|p| *p == Rgb::default()));
    }

    #[test]
    fn test_bytes_are_packed_rgb() {
        let mut raster = Raster::new(2, 1);
        raster.pixels[1] = Color::CYAN.into();
        assert_eq!(raster.as_bytes(), [0, 0, 0, 0, 0xff, 0xff]);
    }
}
