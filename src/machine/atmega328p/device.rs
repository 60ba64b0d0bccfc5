use core::arch::asm;
use core::ptr;

use volatile_register::RW;

use crate::machine::generic::delay::low_byte;
use crate::machine::generic::driver::SignalDriver;
use crate::machine::generic::hal::{RegisterBus, VideoHardware};
use crate::machine::generic::pattern::{Color, PALETTE};
use crate::machine::generic::timing::VGA_640X480;

use super::config;
use super::delay;
use super::registers::{PINB, PINC, VSYNC_PIN};

/// `PINx`, `DDRx`, `PORTx` sit next to each other for every port.
#[repr(C, packed)]
pub struct Port {
    pub pin: RW<u8>,
    pub ddr: RW<u8>,
    pub port: RW<u8>,
}

impl Port {
    unsafe fn at(addr: u16) -> &'static mut Port {
        unsafe { &mut *(addr as *mut Port) }
    }
}

/// Handle to the on-chip peripherals. Zero-sized; the registers live at fixed
/// addresses.
pub struct Atmega328p(());

impl Atmega328p {
    /// # Safety
    ///
    /// Only the frame clock handler, or `initialize` with interrupts masked,
    /// may hold one.
    pub unsafe fn new() -> Self {
        Self(())
    }
}

impl RegisterBus for Atmega328p {
    #[inline(always)]
    fn read(&mut self, addr: u16) -> u8 {
        unsafe { ptr::read_volatile(addr as *const u8) }
    }

    #[inline(always)]
    fn write(&mut self, addr: u16, value: u8) {
        unsafe { ptr::write_volatile(addr as *mut u8, value) }
    }
}

impl VideoHardware for Atmega328p {
    #[inline(always)]
    fn wait_until_tick(&mut self, tick: u16) {
        delay::wait_until_tick(low_byte(tick));
    }

    #[inline(always)]
    fn set_color(&mut self, color: Color) {
        unsafe { Port::at(PINC).port.write(color.bits()) };
    }

    #[inline(always)]
    fn toggle_vsync(&mut self) {
        // Writing a one to PINx inverts the matching PORTx bit.
        unsafe { Port::at(PINB).pin.write(VSYNC_PIN) };
    }
}

static mut DRIVER: SignalDriver = SignalDriver::new(&VGA_640X480, &PALETTE);

/// Configure outputs and the frame clock, reset the driver, then enable
/// interrupts. Video runs on its own from here.
///
/// # Safety
///
/// Call exactly once, with interrupts disabled.
pub unsafe fn initialize() {
    unsafe {
        let mut mcu = Atmega328p::new();
        let driver = config::initialize(&mut mcu, &VGA_640X480);
        *(&raw mut DRIVER) = driver;
        asm!("sei", options(nostack));
    }
}

/// Body of the `TIMER1_CAPT` handler.
///
/// # Safety
///
/// Call only from that handler.
#[inline(always)]
pub unsafe fn on_frame_clock() {
    unsafe {
        let driver = &mut *(&raw mut DRIVER);
        driver.on_frame_clock(&mut Atmega328p::new());
    }
}
