#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

pub mod machine;

#[cfg(not(target_arch = "avr"))]
pub mod host;
#[cfg(all(not(target_arch = "avr"), feature = "tui"))]
pub mod screen;
#[cfg(not(target_arch = "avr"))]
pub mod video;
