//! Driver for the HC-SR04 ultrasonic sensor, timed by input capture.
//!
//! A measurement is split across two execution contexts:
//!
//! - [`Sr04`] lives in normal context. It owns the trigger pin and starts
//!   measurements.
//! - [`Echo`] is shared with the capture interrupt. It holds the measurement
//!   state in atomics and is advanced by [`Echo::on_capture`].
//!
//! No locks are taken. The interrupt publishes the distance before setting
//! the ready flag, and [`Sr04::trigger`] refuses to re-arm a measurement that
//! is still running, so there is only ever one writer.
use crate::board::capture::{CaptureTimer, Polarity, TimerId};
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use embedded_hal::{blocking::delay::DelayUs, digital::v2::OutputPin};
use embedded_time::duration::Microseconds;

/// Width of the trigger pulse.
pub const TRIGGER_WIDTH: Microseconds = Microseconds(10);

/// Time after the start of the measurement beyond which the echo should be
/// considered lost.
///
/// The HC-SR04 datasheet suggests a timeout of 60 milliseconds. The driver
/// does not enforce it; see [`Sr04::abort`].
pub const TIMEOUT: Microseconds = Microseconds(60_000);

/// Converts the width of the echo pulse (in timer ticks) to centimeters.
///
/// Speed of sound of 343 m/s, halved for the round trip. Only valid if the
/// capture timer ticks once per microsecond.
pub const CM_PER_TICK: f32 = 0.01715;

/// Distance reported when no measurement is available.
pub const NO_MEASUREMENT: f32 = -1.0;

/// Capture state of a device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum State {
    /// No measurement in progress.
    Idle = 0,
    /// Trigger pulse sent, waiting for the echo to go high.
    WaitingRisingEdge = 1,
    /// Echo is high, waiting for it to go low.
    WaitingFallingEdge = 2,
}

impl State {
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => State::WaitingRisingEdge,
            2 => State::WaitingFallingEdge,
            _ => State::Idle,
        }
    }
}

/// Errors that can be returned from the sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A measurement is already in progress.
    InProgress,
}

/// Computes the width of the echo pulse from the two captured counter
/// values.
///
/// If the falling edge was latched at a lower (or equal) count than the
/// rising edge, the counter is assumed to have wrapped exactly once at
/// `period`. Two or more wraps cannot be told apart from one and produce a
/// width that is too short, so the timer period must exceed the longest echo.
pub fn pulse_width(rising: u32, falling: u32, period: u32) -> Microseconds {
    if falling > rising {
        Microseconds(falling - rising)
    } else {
        Microseconds(period.wrapping_sub(rising).wrapping_add(falling))
    }
}

/// Converts an echo pulse width to centimeters.
pub fn distance_cm(width: Microseconds) -> f32 {
    width.0 as f32 * CM_PER_TICK
}

/// Measurement state shared between normal and interrupt context.
///
/// Place it somewhere that outlives the [`crate::Registry`] it is registered
/// with, typically a `static`.
pub struct Echo<T: CaptureTimer> {
    /// Capture timer.
    timer: T,
    /// Channel the echo pin is routed to.
    channel: T::Channel,
    /// `State`, as its discriminant.
    state: AtomicU8,
    /// Counter value latched on the rising edge.
    rising: AtomicU32,
    /// Counter value latched on the falling edge.
    falling: AtomicU32,
    /// Set once `distance` holds a complete measurement.
    ready: AtomicBool,
    /// Last distance, in centimeters, as `f32` bits.
    distance: AtomicU32,
}

impl<T: CaptureTimer> Echo<T> {
    /// Binds a device to a capture channel of `timer`.
    ///
    /// The timer must already be configured for input capture on `channel`
    /// with a 1 µs tick.
    pub const fn new(timer: T, channel: T::Channel) -> Self {
        Self {
            timer,
            channel,
            state: AtomicU8::new(State::Idle as u8),
            rising: AtomicU32::new(0),
            falling: AtomicU32::new(0),
            ready: AtomicBool::new(false),
            distance: AtomicU32::new(0),
        }
    }

    /// Releases the timer binding.
    pub fn free(self) -> T {
        self.timer
    }

    /// Identity of the timer this device captures on.
    pub fn timer_id(&self) -> TimerId {
        self.timer.id()
    }

    /// Capture channel of this device.
    pub fn channel(&self) -> T::Channel {
        self.channel
    }

    /// Current capture state.
    pub fn state(&self) -> State {
        State::from_bits(self.state.load(Ordering::Acquire))
    }

    /// Counter value latched on the last rising edge.
    pub fn rising_edge(&self) -> u32 {
        self.rising.load(Ordering::Relaxed)
    }

    /// Counter value latched on the last falling edge.
    pub fn falling_edge(&self) -> u32 {
        self.falling.load(Ordering::Relaxed)
    }

    /// Returns `true` if a completed measurement is available.
    pub fn is_measurement_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Last measured distance in centimeters, or [`NO_MEASUREMENT`].
    pub fn distance_cm(&self) -> f32 {
        self.distance().unwrap_or(NO_MEASUREMENT)
    }

    /// Last measured distance in centimeters, if one is available.
    pub fn distance(&self) -> Option<f32> {
        if self.is_measurement_ready() {
            Some(f32::from_bits(self.distance.load(Ordering::Relaxed)))
        } else {
            None
        }
    }

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Arms rising edge capture.
    ///
    /// Only called from normal context.
    fn arm(&self) -> Result<(), Error> {
        if self.state() != State::Idle {
            return Err(Error::InProgress);
        }

        self.ready.store(false, Ordering::Release);
        self.set_state(State::WaitingRisingEdge);

        self.timer.set_polarity(self.channel, Polarity::Rising);
        self.timer.start_capture(self.channel);
        Ok(())
    }

    /// Stops capturing and returns to `Idle` without publishing a result.
    fn disarm(&self) {
        self.timer.stop_capture(self.channel);
        self.timer.set_polarity(self.channel, Polarity::Rising);
        self.set_state(State::Idle);
    }

    /// Advances the state machine on a capture interrupt.
    ///
    /// Usually reached through [`crate::Registry::on_capture_interrupt`].
    /// Interrupts that arrive while idle are stale and ignored.
    pub fn on_capture(&self) {
        match self.state() {
            State::Idle => {
                trace!("sr04: capture while idle, ignored");
            }
            State::WaitingRisingEdge => {
                let rising = self.timer.captured(self.channel);
                self.rising.store(rising, Ordering::Relaxed);
                trace!("sr04: rising edge at {}", rising);

                self.timer.set_polarity(self.channel, Polarity::Falling);
                self.set_state(State::WaitingFallingEdge);
            }
            State::WaitingFallingEdge => {
                let falling = self.timer.captured(self.channel);
                self.falling.store(falling, Ordering::Relaxed);
                trace!("sr04: falling edge at {}", falling);

                self.timer.stop_capture(self.channel);

                let width = pulse_width(
                    self.rising.load(Ordering::Relaxed),
                    falling,
                    self.timer.period(),
                );
                let distance = distance_cm(width);
                self.distance.store(distance.to_bits(), Ordering::Relaxed);
                // Readers only look at `distance` after observing `ready`.
                self.ready.store(true, Ordering::Release);
                self.set_state(State::Idle);
                debug!("sr04: echo of {} us", width.0);

                self.timer.set_polarity(self.channel, Polarity::Rising);
            }
        }
    }
}

/// Driver structure.
///
/// `T`: Capture timer.
/// `TRIG`: Trigger pin.
/// `DELAY`: Microsecond-precise delay used to time the trigger pulse.
pub struct Sr04<'a, T: CaptureTimer, TRIG, DELAY> {
    /// Shared measurement state.
    echo: &'a Echo<T>,
    /// Trigger pin.
    trig: TRIG,
    /// Trigger pulse delay.
    delay: DELAY,
}

impl<'a, T, TRIG, DELAY> Sr04<'a, T, TRIG, DELAY>
where
    T: CaptureTimer,
    TRIG: OutputPin,
    DELAY: DelayUs<u32>,
{
    /// Create a new `Sr04` instance.
    ///
    /// Drives the trigger pin low. `echo` must be registered with the
    /// [`crate::Registry`] that dispatches its timer's capture interrupt
    /// before the first call to [`Self::trigger`].
    pub fn new(echo: &'a Echo<T>, mut trig: TRIG, delay: DELAY) -> Self {
        trig.set_low().ok();
        Self { echo, trig, delay }
    }

    /// Stops any measurement in progress and releases the trigger pin and
    /// the delay.
    pub fn free(mut self) -> (TRIG, DELAY) {
        self.trig.set_low().ok();
        self.echo.disarm();
        (self.trig, self.delay)
    }

    /// Starts a measurement.
    ///
    /// Does nothing if a measurement is already in progress. Use
    /// [`Self::is_measurement_ready`] to know when the sensor can be
    /// triggered again.
    pub fn trigger(&mut self) {
        self.try_trigger().ok();
    }

    /// Starts a measurement, reporting if one is already in progress.
    pub fn try_trigger(&mut self) -> Result<(), Error> {
        self.echo.arm()?;
        debug!("sr04: triggered");

        self.trig.set_high().ok();
        self.delay.delay_us(TRIGGER_WIDTH.0);
        self.trig.set_low().ok();
        Ok(())
    }

    /// Abandons the measurement in progress, if any.
    ///
    /// Meant for echoes that never complete, e.g. when nothing is within
    /// range or the sensor is disconnected. The caller decides when that is
    /// the case, [`TIMEOUT`] being a sensible bound.
    pub fn abort(&mut self) {
        if self.echo.state() != State::Idle {
            debug!("sr04: aborted in {:?}", self.echo.state());
            self.echo.disarm();
        }
    }

    /// Returns `true` if a completed measurement is available.
    pub fn is_measurement_ready(&self) -> bool {
        self.echo.is_measurement_ready()
    }

    /// Last measured distance in centimeters, or [`NO_MEASUREMENT`].
    pub fn distance_cm(&self) -> f32 {
        self.echo.distance_cm()
    }

    /// Last measured distance in centimeters, if one is available.
    pub fn distance(&self) -> Option<f32> {
        self.echo.distance()
    }

    /// Current capture state.
    pub fn state(&self) -> State {
        self.echo.state()
    }

    /// Shared measurement state of this sensor.
    pub fn echo(&self) -> &'a Echo<T> {
        self.echo
    }
}
