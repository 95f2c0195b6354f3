//! Board-agnostic core logic for the servoboard PWM driver
//!
//! This crate contains everything about the PCA9685 that does not touch
//! the bus:
//!
//! - Register map and output bit patterns
//! - Channel identifiers and channel sets
//! - MODE1 bit-field
//! - Frequency, prescale, pulse and tick conversions
//! - Servo angle and pulse-limit math
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod address;
pub mod channel;
pub mod config;
pub mod mode;
pub mod registers;
pub mod servo;
pub mod timing;

pub use channel::{Channel, ChannelMask, CHANNEL_COUNT};
pub use mode::{ModeBit, ModeRegister};
pub use registers::{PwmLevel, PwmRegisters};
pub use servo::ServoLimits;
