//! Servoboard Hardware Abstraction Layer
//!
//! This crate defines the bus traits that the PWM driver is written
//! against. Chip-specific HALs (or the `embedded-hal` adapter in
//! `servoboard-drivers`) implement them, so the same driver code runs
//! on any controller with an I2C master.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  servoboard-drivers (Pca9685, servos)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  servoboard-hal (this crate - traits)   │
//! │  RegisterBus  ◄── blanket ──  I2cBus    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  I2C master (embedded-hal, chip HAL)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - Raw I2C bus operations
//! - [`i2c::RegisterBus`] - Single-byte register reads and writes

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;

// Re-export key traits at crate root for convenience
pub use i2c::{I2cBus, RegisterBus, GENERAL_CALL_ADDRESS};
