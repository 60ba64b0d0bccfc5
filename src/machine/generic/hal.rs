use super::pattern::Color;

/// Output side of the frame clock handler. Implemented by the real part and by
/// the simulator, so both run the same driver.
pub trait VideoHardware {
    /// Block until the frame clock counter reaches `tick`. The next operation
    /// issues on exactly that cycle, provided the counter is sampled between
    /// [`WAIT_OVERHEAD_CYCLES`](super::delay::WAIT_OVERHEAD_CYCLES) and
    /// [`MAX_WAIT_TICKS`](super::delay::MAX_WAIT_TICKS) ticks before it. The
    /// hardware only compares the low byte.
    fn wait_until_tick(&mut self, tick: u16);

    /// Drive all three colour lines at once.
    fn set_color(&mut self, color: Color);

    /// Invert the software-driven sync line.
    fn toggle_vsync(&mut self);
}

/// Memory-mapped 8-bit register access by data-space address.
pub trait RegisterBus {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// 16-bit timer registers latch through a shared temporary byte: the high
    /// byte must be written first.
    fn write_wide(&mut self, addr: u16, value: u16) {
        self.write(addr + 1, (value >> 8) as u8);
        self.write(addr, value as u8);
    }

    fn modify(&mut self, addr: u16, f: impl FnOnce(u8) -> u8) {
        let value = self.read(addr);
        self.write(addr, f(value));
    }
}
