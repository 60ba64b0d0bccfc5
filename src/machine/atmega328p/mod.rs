pub mod config;
pub mod registers;

#[cfg(target_arch = "avr")]
mod delay;
#[cfg(target_arch = "avr")]
mod device;

#[cfg(target_arch = "avr")]
pub use device::{Atmega328p, initialize, on_frame_clock};
