/// Input capture on the STM32F103 general purpose timers, TIM2 to TIM5.
///
/// Only the capture related bits are touched. Clock, prescaler, reload
/// value and input mapping (`CCxS = 01`) must be set up beforehand, with
/// the prescaler chosen for a 1 MHz counter.
use crate::board::capture::{ticks_per_wrap, CaptureTimer, Polarity, TimerId};
use core::ops::Deref;
use stm32f1::stm32f103::tim2;

/// Timer channels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    C1,
    C2,
    C3,
    C4,
}

/// Capture binding owning one of TIM2, TIM3, TIM4 or TIM5.
///
/// Several sensors capturing on different channels of the same timer share
/// it through `&GeneralPurposeTimer<TIM>`.
pub struct GeneralPurposeTimer<TIM> {
    tim: TIM,
}

impl<TIM> core::fmt::Debug for GeneralPurposeTimer<TIM> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GeneralPurposeTimer").finish_non_exhaustive()
    }
}

impl<TIM: Deref<Target = tim2::RegisterBlock>> GeneralPurposeTimer<TIM> {
    /// Takes ownership of the timer peripheral.
    pub fn new(tim: TIM) -> Self {
        Self { tim }
    }

    /// Releases the timer peripheral.
    pub fn free(self) -> TIM {
        self.tim
    }
}

impl<TIM: Deref<Target = tim2::RegisterBlock>> CaptureTimer for GeneralPurposeTimer<TIM> {
    type Channel = Channel;

    fn id(&self) -> TimerId {
        let regs: &tim2::RegisterBlock = &self.tim;
        TimerId(regs as *const tim2::RegisterBlock as usize)
    }

    fn set_polarity(&self, channel: Channel, polarity: Polarity) {
        let falling = polarity == Polarity::Falling;
        self.tim.ccer.modify(|_, w| match channel {
            Channel::C1 => w.cc1p().bit(falling),
            Channel::C2 => w.cc2p().bit(falling),
            Channel::C3 => w.cc3p().bit(falling),
            Channel::C4 => w.cc4p().bit(falling),
        });
    }

    /// Reading the capture register first drops a stale `CCxIF`, so the
    /// first interrupt is a fresh edge.
    fn start_capture(&self, channel: Channel) {
        self.captured(channel);
        self.tim.ccer.modify(|_, w| match channel {
            Channel::C1 => w.cc1e().set_bit(),
            Channel::C2 => w.cc2e().set_bit(),
            Channel::C3 => w.cc3e().set_bit(),
            Channel::C4 => w.cc4e().set_bit(),
        });
        self.tim.dier.modify(|_, w| match channel {
            Channel::C1 => w.cc1ie().set_bit(),
            Channel::C2 => w.cc2ie().set_bit(),
            Channel::C3 => w.cc3ie().set_bit(),
            Channel::C4 => w.cc4ie().set_bit(),
        });
    }

    fn stop_capture(&self, channel: Channel) {
        self.tim.dier.modify(|_, w| match channel {
            Channel::C1 => w.cc1ie().clear_bit(),
            Channel::C2 => w.cc2ie().clear_bit(),
            Channel::C3 => w.cc3ie().clear_bit(),
            Channel::C4 => w.cc4ie().clear_bit(),
        });
        self.tim.ccer.modify(|_, w| match channel {
            Channel::C1 => w.cc1e().clear_bit(),
            Channel::C2 => w.cc2e().clear_bit(),
            Channel::C3 => w.cc3e().clear_bit(),
            Channel::C4 => w.cc4e().clear_bit(),
        });
    }

    /// Reading the capture register also clears `CCxIF`.
    fn captured(&self, channel: Channel) -> u32 {
        match channel {
            Channel::C1 => self.tim.ccr1.read().bits(),
            Channel::C2 => self.tim.ccr2.read().bits(),
            Channel::C3 => self.tim.ccr3.read().bits(),
            Channel::C4 => self.tim.ccr4.read().bits(),
        }
    }

    fn period(&self) -> u32 {
        ticks_per_wrap(self.tim.arr.read().bits())
    }
}
