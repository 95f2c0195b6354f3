//! PWM controller drivers

pub mod pca9685;
pub mod servo;

#[cfg(test)]
pub(crate) mod mock;

pub use pca9685::{Error, Pca9685};
pub use servo::{ServoController, ServoPolicy};
