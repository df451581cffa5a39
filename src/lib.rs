//! Interrupt-driven HC-SR04 driver built on timer input capture.
//!
//! The echo pulse is timed by a hardware timer channel in input capture mode.
//! A measurement runs as follows:
//!
//! 1. [`board::sr04::Sr04::trigger`] arms rising edge capture and emits the
//!    trigger pulse.
//! 2. The timer raises a capture interrupt on each echo edge. The interrupt
//!    handler calls [`registry::Registry::on_capture_interrupt`] with the
//!    identity of the timer that fired.
//! 3. After the falling edge the distance is published and can be read with
//!    [`board::sr04::Sr04::distance_cm`].
//!
//! The timer must tick at 1 MHz for the distance conversion to hold.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod board;
pub mod registry;

pub use board::capture::{CaptureTimer, Polarity, TimerId};
pub use board::delay::CycleDelay;
pub use board::sr04::{Echo, Error, Sr04, State, NO_MEASUREMENT};
pub use registry::Registry;
