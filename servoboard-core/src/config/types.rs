//! Configuration type definitions
//!
//! These types describe how a board is wired and how its PCA9685 should
//! be brought up. They are plain data; the drivers apply them at
//! construction time. Nothing here is persisted to the chip.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::address::{self, ALL_CALL_ADDRESS};
use crate::channel::{Channel, CHANNEL_COUNT};
use crate::servo::{ServoLimits, SERVO_FREQUENCY_HZ};
use crate::timing::{prescale_for, DEFAULT_FREQUENCY_HZ};

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Address falls in a reserved I2C range
    InvalidAddress(u8),
    /// Frequency gives a prescale outside 0x03-0xFF
    FrequencyOutOfRange(u16),
    /// Servo minimum pulse is larger than its maximum
    InvalidServoRange(Channel),
}

/// PCA9685 device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// PWM output frequency in Hz
    pub frequency_hz: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: ALL_CALL_ADDRESS,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }
}

impl DeviceConfig {
    /// Default configuration at a specific address
    pub const fn at_address(address: u8) -> Self {
        Self {
            address,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // The all-call address is accepted even though it is never assigned
        if address::is_reserved(self.address) {
            return Err(ConfigError::InvalidAddress(self.address));
        }
        if prescale_for(self.frequency_hz as u32).is_none() {
            return Err(ConfigError::FrequencyOutOfRange(self.frequency_hz));
        }
        Ok(())
    }
}

/// Pulse limits for one servo channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoChannelConfig {
    pub channel: Channel,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limits: ServoLimits,
}

/// Board with servos attached to a PCA9685
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// Chip address and frame rate
    pub device: DeviceConfig,
    /// Channels with non-default limits; later entries win
    #[cfg_attr(feature = "serde", serde(default))]
    pub servos: Vec<ServoChannelConfig, CHANNEL_COUNT>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                address: ALL_CALL_ADDRESS,
                frequency_hz: SERVO_FREQUENCY_HZ,
            },
            servos: Vec::new(),
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.validate()?;
        for servo in &self.servos {
            if !servo.limits.is_valid() {
                return Err(ConfigError::InvalidServoRange(servo.channel));
            }
        }
        Ok(())
    }

    /// Limits that apply to `channel` (the last matching entry, or the default)
    pub fn limits_for(&self, channel: Channel) -> ServoLimits {
        self.servos
            .iter()
            .rev()
            .find(|s| s.channel == channel)
            .map(|s| s.limits)
            .unwrap_or_default()
    }
}
