//! Microsecond busy-wait delay.
//!
//! The trigger pulse is only 10 µs wide, far below what a millisecond
//! resolution timer can time, so the delay spins on the core instead.
//! Accuracy degrades if an interrupt preempts the spin.
use cortex_m::asm;
use embedded_hal::blocking::delay::DelayUs;
use embedded_time::rate::Hertz;

/// Number of microseconds per second.
const MICROSECONDS_PER_SECOND: u32 = 1_000_000;

/// Busy-wait delay calibrated to the core clock.
pub struct CycleDelay {
    /// Core clock cycles per microsecond.
    cycles_per_us: u32,
}

impl core::fmt::Debug for CycleDelay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CycleDelay")
            .field("cycles_per_us", &self.cycles_per_us)
            .finish()
    }
}

impl CycleDelay {
    /// Creates a delay for a core running at `sysclk`.
    ///
    /// Clocks below 1 MHz are rounded up to one cycle per microsecond.
    pub const fn new(sysclk: Hertz) -> Self {
        let cycles_per_us = sysclk.0 / MICROSECONDS_PER_SECOND;
        Self {
            cycles_per_us: if cycles_per_us == 0 { 1 } else { cycles_per_us },
        }
    }

    /// Number of core cycles spent waiting for `us` microseconds.
    pub const fn cycles(&self, us: u32) -> u32 {
        us.saturating_mul(self.cycles_per_us)
    }
}

impl DelayUs<u32> for CycleDelay {
    fn delay_us(&mut self, us: u32) {
        asm::delay(self.cycles(us));
    }
}

impl DelayUs<u16> for CycleDelay {
    fn delay_us(&mut self, us: u16) {
        self.delay_us(us as u32);
    }
}

impl DelayUs<u8> for CycleDelay {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(us as u32);
    }
}
