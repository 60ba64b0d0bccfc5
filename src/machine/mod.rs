pub mod atmega328p;
pub mod generic;

#[cfg(not(target_arch = "avr"))]
pub mod sim;
