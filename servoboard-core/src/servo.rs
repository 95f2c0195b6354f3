//! Servo pulse math
//!
//! Analog hobby servos expect one pulse per 20 ms frame (50 Hz) whose width
//! encodes the shaft position: 1000 us at 0 degrees, 2000 us at 180 degrees.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard analog servo frame rate
pub const SERVO_FREQUENCY_HZ: u16 = 50;

/// Pulse width at 0 degrees
pub const DEFAULT_MIN_US: u16 = 1000;

/// Pulse width at 180 degrees
pub const DEFAULT_MAX_US: u16 = 2000;

/// Full travel in degrees
pub const ANGLE_MAX_DEG: f32 = 180.0;

/// Allowed pulse range for one servo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoLimits {
    /// Shortest pulse in microseconds
    pub min_us: u16,
    /// Longest pulse in microseconds
    pub max_us: u16,
}

impl Default for ServoLimits {
    fn default() -> Self {
        Self {
            min_us: DEFAULT_MIN_US,
            max_us: DEFAULT_MAX_US,
        }
    }
}

impl ServoLimits {
    /// Limits with `min_us <= max_us`, `None` otherwise
    pub const fn new(min_us: u16, max_us: u16) -> Option<Self> {
        if min_us > max_us {
            return None;
        }
        Some(Self { min_us, max_us })
    }

    pub const fn is_valid(&self) -> bool {
        self.min_us <= self.max_us
    }

    /// Clamp a requested pulse into `[min_us, max_us]`
    pub fn clamp(&self, pulse_us: i32) -> i32 {
        pulse_us.max(self.min_us as i32).min(self.max_us as i32)
    }
}

/// Pulse width for a shaft angle
///
/// The angle is clamped to 0-180 degrees and mapped linearly onto the fixed
/// 1000-2000 us scale, rounded to the nearest microsecond. Per-servo limits
/// are not applied here. NaN has no position and gives `None`.
pub fn angle_to_pulse_us(angle_deg: f32) -> Option<u16> {
    if angle_deg.is_nan() {
        return None;
    }
    let angle = angle_deg.clamp(0.0, ANGLE_MAX_DEG);
    let span = (DEFAULT_MAX_US - DEFAULT_MIN_US) as f32;
    let pulse = angle / ANGLE_MAX_DEG * span + DEFAULT_MIN_US as f32;
    // pulse is positive, so truncating after +0.5 rounds half up
    Some((pulse + 0.5) as u16)
}
