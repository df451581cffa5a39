//! Host-side stand-ins for the timer, trigger pin and delay.
use super::capture::{CaptureTimer, Polarity, TimerId};
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embedded_hal::{blocking::delay::DelayUs, digital::v2::OutputPin};
use std::{rc::Rc, vec::Vec};

/// Timer with a single latched capture value shared by all channels.
pub struct FakeTimer {
    id: usize,
    period: u32,
    pub polarity: Cell<Option<Polarity>>,
    pub listening: Cell<bool>,
    pub captured: Cell<u32>,
    pub last_channel: Cell<Option<u8>>,
}

impl FakeTimer {
    pub fn new(id: usize, period: u32) -> Self {
        Self {
            id,
            period,
            polarity: Cell::new(None),
            listening: Cell::new(false),
            captured: Cell::new(0),
            last_channel: Cell::new(None),
        }
    }

    /// Latches `value` as if an edge had just been captured.
    pub fn latch(&self, value: u32) {
        self.captured.set(value);
    }
}

impl CaptureTimer for FakeTimer {
    type Channel = u8;

    fn id(&self) -> TimerId {
        TimerId(self.id)
    }

    fn set_polarity(&self, channel: u8, polarity: Polarity) {
        self.last_channel.set(Some(channel));
        self.polarity.set(Some(polarity));
    }

    fn start_capture(&self, channel: u8) {
        self.last_channel.set(Some(channel));
        self.listening.set(true);
    }

    fn stop_capture(&self, channel: u8) {
        self.last_channel.set(Some(channel));
        self.listening.set(false);
    }

    fn captured(&self, _channel: u8) -> u32 {
        self.captured.get()
    }

    fn period(&self) -> u32 {
        self.period
    }
}

/// Trigger pin and delay activity, in call order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Op {
    High,
    Low,
    Wait(u32),
}

pub type Log = Rc<RefCell<Vec<Op>>>;

pub struct FakePin(pub Log);

impl OutputPin for FakePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Op::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(Op::High);
        Ok(())
    }
}

pub struct FakeDelay(pub Log);

impl DelayUs<u32> for FakeDelay {
    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().push(Op::Wait(us));
    }
}

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}
