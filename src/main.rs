use std::path::PathBuf;

use clap::Parser;
use tracing::{Level, info};

use avr_vga::host::logging;
use avr_vga::host::screen::headless;
use avr_vga::machine::generic::timing::VGA_640X480;
use avr_vga::machine::sim::cpu::IsrModel;
use avr_vga::machine::sim::{SimConfig, System};

/// AVR VGA signal simulator
/// Runs the ATmega328P video firmware against a cycle-level model of the part
#[derive(Parser)]
#[command(name = "avr-vga")]
#[command(about = "Cycle-level simulator for the ATmega328P VGA signal generator")]
struct Args {
    /// Number of frames to simulate (unbounded with --display)
    #[arg(long)]
    frames: Option<usize>,

    /// Write the visible area of the last frame as a PPM image
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,

    /// Display the simulated picture in the terminal
    #[cfg(feature = "tui")]
    #[arg(long)]
    display: bool,

    /// Stop at the first timing violation or lost frame clock event
    #[arg(long)]
    strict: bool,

    /// Cycles spent saving registers before the handler body
    #[arg(long, value_name = "CYCLES")]
    isr_prologue: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };

    #[cfg(feature = "tui")]
    let display = args.display;
    #[cfg(not(feature = "tui"))]
    let display = false;

    if display {
        logging::setup_logging_file(level)?;
    } else {
        logging::setup_logging_stdio(level);
    }

    let mut isr = IsrModel::default();
    if let Some(prologue) = args.isr_prologue {
        isr = isr.with_prologue(prologue);
    }
    let config = SimConfig {
        isr,
        strict: args.strict,
    };

    info!("AVR VGA simulator starting...");
    info!(
        "Timing: {}x{} ticks, {:.2} kHz line, {:.2} Hz field",
        VGA_640X480.htot(),
        VGA_640X480.vtot(),
        VGA_640X480.line_frequency_hz() / 1000.0,
        VGA_640X480.field_frequency_hz()
    );
    info!("Handler model: {:?}", config.isr);

    let system = System::new(&VGA_640X480, config);

    #[cfg(feature = "tui")]
    if display {
        avr_vga::host::screen::ratatui::run(system, args.frames, args.dump.as_deref())?;
        info!("Log written to {}", logging::log_file_path().display());
        return Ok(());
    }

    headless::run(system, args.frames.unwrap_or(1), args.dump.as_deref())?;
    Ok(())
}
