//! Board-level peripherals used by the ultrasonic sensor.
pub mod capture;
pub mod delay;
pub mod sr04;
#[cfg(feature = "stm32f103")]
pub mod stm32;

#[cfg(test)]
pub(crate) mod mock;
