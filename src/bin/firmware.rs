//! ATmega328P firmware: configure the frame clock, then idle while the
//! `TIMER1_CAPT` interrupt draws every line.
//!
//! Build with `--features firmware` for an `avr-atmega328p` target.

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
use core::panic::PanicInfo;

#[cfg(target_arch = "avr")]
use avr_vga::machine::atmega328p;

#[cfg(target_arch = "avr")]
#[panic_handler]
fn panic(_panic: &PanicInfo<'_>) -> ! {
    loop {}
}

#[cfg(target_arch = "avr")]
#[unsafe(no_mangle)]
pub extern "C" fn main() -> ! {
    unsafe { atmega328p::initialize() };
    // A 2-cycle `rjmp .`, the only thing the frame clock ever preempts.
    loop {}
}

/// `TIMER1_CAPT`, vector 10 on the ATmega328P.
#[cfg(target_arch = "avr")]
#[unsafe(no_mangle)]
pub unsafe extern "avr-interrupt" fn __vector_10() {
    unsafe { atmega328p::on_frame_clock() };
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("the firmware binary only runs on avr targets; use `avr-vga` to simulate it");
}
