use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::video::{Raster, Rgb};

/// A raster scaled down to the widget area, two pixel rows per terminal cell
/// using the upper half block.
pub struct Screen<'a> {
    raster: &'a Raster,
}

impl<'a> Screen<'a> {
    pub fn new(raster: &'a Raster) -> Self {
        Self { raster }
    }
}

fn color(pixel: Rgb) -> Color {
    Color::Rgb(pixel.r, pixel.g, pixel.b)
}

impl<'a> Widget for Screen<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let raster = self.raster;
        if raster.width == 0 || raster.height == 0 || area.is_empty() {
            return;
        }
        let rows = area.height as usize * 2;
        let cols = area.width as usize;

        // Nearest sample; the bands are wide enough to survive it.
        let sample = |col: usize, row: usize| {
            let x = col * raster.width / cols;
            let y = row * raster.height / rows;
            raster.get(x, y)
        };

        for cell_y in 0..area.height {
            for cell_x in 0..area.width {
                let top = sample(cell_x as usize, cell_y as usize * 2);
                let bottom = sample(cell_x as usize, cell_y as usize * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.left() + cell_x, area.top() + cell_y)) {
                    cell.set_symbol("▀");
                    cell.set_style(Style::default().fg(color(top)).bg(color(bottom)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::generic::pattern::Color as Bands;

    #[test]
    fn test_render_half_blocks() {
        let mut raster = Raster::new(2, 2);
        raster.pixels[0] = Bands::RED.into();
        raster.pixels[1] = Bands::GREEN.into();
        raster.pixels[2] = Bands::BLUE.into();
        raster.pixels[3] = Bands::WHITE.into();

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        Screen::new(&raster).render(area, &mut buf);

        let left = &buf[(0, 0)];
        assert_eq!(left.symbol(), "▀");
        assert_eq!(left.fg, Color::Rgb(0xff, 0, 0));
        assert_eq!(left.bg, Color::Rgb(0, 0, 0xff));
        let right = &buf[(1, 0)];
        assert_eq!(right.fg, Color::Rgb(0, 0xff, 0));
        assert_eq!(right.bg, Color::Rgb(0xff, 0xff, 0xff));
    }

    #[test]
    fn test_empty_raster_renders_nothing() {
        let raster = Raster::new(0, 0);
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        Screen::new(&raster).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
