//! Hardware driver implementations
//!
//! Drives the PCA9685 16-channel PWM controller over any [`I2cBus`]:
//!
//! - [`Pca9685`]: digital, duty-cycle and pulse-width output, frequency,
//!   sleep/wake, software reset and address management
//! - [`ServoController`]: per-channel pulse limits and angle positioning
//! - [`EmbeddedHalBus`]: adapter for embedded-hal 1.0 I2C masters
//!
//! [`I2cBus`]: servoboard_hal::I2cBus

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod pwm;

pub use bus::{EmbeddedHalBus, I2cBusError};
pub use pwm::{Error, Pca9685, ServoController, ServoPolicy};
