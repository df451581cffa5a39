//! Timer input capture abstraction.
//!
//! Models the parts of a hardware timer that the echo measurement relies on,
//! in the same spirit as `embedded_hal::Pwm` models PWM generators.

/// Identity of a timer peripheral.
///
/// Capture interrupts are delivered per timer, not per channel, so this is
/// the key used to route an interrupt to its owning device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(pub usize);

/// Capture polarity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Latch the counter on a low to high transition.
    Rising,
    /// Latch the counter on a high to low transition.
    Falling,
}

/// Number of ticks per wrap of a counter that counts `0..=auto_reload`.
pub fn ticks_per_wrap(auto_reload: u32) -> u32 {
    auto_reload.wrapping_add(1)
}

/// A timer whose channels can run in input capture mode.
///
/// All methods take `&self`: they are called from both normal and interrupt
/// context. Implementations touch only the registers of `channel`.
///
/// The counter must tick once per microsecond.
pub trait CaptureTimer {
    /// Enumeration of timer channels.
    type Channel: Copy;

    /// Identity of the timer peripheral.
    fn id(&self) -> TimerId;

    /// Sets the edge that latches the counter on `channel`.
    fn set_polarity(&self, channel: Self::Channel, polarity: Polarity);

    /// Enables capture on `channel` along with its capture interrupt.
    fn start_capture(&self, channel: Self::Channel);

    /// Disables the capture interrupt of `channel`.
    fn stop_capture(&self, channel: Self::Channel);

    /// Counter value latched by the last capture on `channel`.
    fn captured(&self, channel: Self::Channel) -> u32;

    /// Number of ticks per counter wrap (`ARR + 1` on STM32), not the
    /// auto-reload value itself.
    fn period(&self) -> u32;
}

impl<C: CaptureTimer + ?Sized> CaptureTimer for &C {
    type Channel = C::Channel;

    fn id(&self) -> TimerId {
        (**self).id()
    }

    fn set_polarity(&self, channel: Self::Channel, polarity: Polarity) {
        (**self).set_polarity(channel, polarity)
    }

    fn start_capture(&self, channel: Self::Channel) {
        (**self).start_capture(channel)
    }

    fn stop_capture(&self, channel: Self::Channel) {
        (**self).stop_capture(channel)
    }

    fn captured(&self, channel: Self::Channel) -> u32 {
        (**self).captured(channel)
    }

    fn period(&self) -> u32 {
        (**self).period()
    }
}
