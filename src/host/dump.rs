//! Binary PPM (`P6`) export of a simulated frame.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::video::Raster;

pub fn write_ppm(out: &mut impl Write, raster: &Raster) -> io::Result<()> {
    write!(out, "P6\n{} {}\n255\n", raster.width, raster.height)?;
    out.write_all(raster.as_bytes())
}

pub fn dump_ppm(path: &Path, raster: &Raster) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_ppm(&mut out, raster)?;
    out.flush()?;
    info!(
        "Wrote {}x{} frame to {}",
        raster.width,
        raster.height,
        path.display()
    );
    Ok(())
}
