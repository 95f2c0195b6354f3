//! PWM timing math
//!
//! Conversions between output frequency, prescale, pulse width and ticks
//! for the PCA9685's internal 25 MHz oscillator. Everything is integer
//! arithmetic with round-half-up, matching the datasheet formula
//! `prescale = round(osc / (4096 * f)) - 1`.

/// Internal oscillator frequency in Hz
pub const OSCILLATOR_HZ: u32 = 25_000_000;

/// Ticks per PWM period
pub const PWM_STEPS: u32 = 4096;

/// Largest 12-bit tick value
pub const MAX_TICK: u16 = 4095;

/// Smallest prescale the chip accepts (about 1526 Hz)
pub const PRESCALE_MIN: u8 = 0x03;

/// Largest prescale (about 24 Hz)
pub const PRESCALE_MAX: u8 = 0xFF;

/// Frequency matching the power-on prescale 0x1E
pub const DEFAULT_FREQUENCY_HZ: u16 = 200;

/// Largest analog value accepted by [`analog_to_ticks`]
pub const ANALOG_MAX: u16 = 1023;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Unchecked prescale for `frequency_hz`, before range validation
///
/// Returns `None` for 0 Hz. The result may be negative or above 0xFF.
pub fn raw_prescale(frequency_hz: u32) -> Option<i64> {
    if frequency_hz == 0 {
        return None;
    }
    let divisor = PWM_STEPS as u64 * frequency_hz as u64;
    let rounded = (OSCILLATOR_HZ as u64 + divisor / 2) / divisor;
    Some(rounded as i64 - 1)
}

/// Prescale for `frequency_hz`, if it lies in [`PRESCALE_MIN`, `PRESCALE_MAX`]
pub fn prescale_for(frequency_hz: u32) -> Option<u8> {
    let prescale = raw_prescale(frequency_hz)?;
    if prescale < PRESCALE_MIN as i64 || prescale > PRESCALE_MAX as i64 {
        return None;
    }
    Some(prescale as u8)
}

/// Output frequency produced by `prescale` (rounded to the nearest Hz)
pub fn frequency_for_prescale(prescale: u8) -> u32 {
    let divisor = PWM_STEPS * (prescale as u32 + 1);
    (OSCILLATOR_HZ + divisor / 2) / divisor
}

/// Length of one PWM period in microseconds
pub fn period_us(frequency_hz: u16) -> u32 {
    if frequency_hz == 0 {
        return 0;
    }
    (MICROS_PER_SECOND / frequency_hz as u64) as u32
}

/// Tick count for a pulse of `pulse_us` microseconds at `frequency_hz`
///
/// `ticks = round(pulse_us / (1e6 / (frequency_hz * 4096)))`. Negative
/// pulses, and pulses that do not fit in a 12-bit tick (longer than the
/// period), give `None`.
pub fn pulse_to_ticks(pulse_us: i32, frequency_hz: u16) -> Option<u16> {
    if pulse_us < 0 {
        return None;
    }
    let scaled = pulse_us as u64 * frequency_hz as u64 * PWM_STEPS as u64;
    let ticks = (scaled + MICROS_PER_SECOND / 2) / MICROS_PER_SECOND;
    if ticks > MAX_TICK as u64 {
        return None;
    }
    Some(ticks as u16)
}

/// Scale a 10-bit analog value (0-1023) onto the 12-bit tick range
pub fn analog_to_ticks(value: u16) -> Option<u16> {
    if value > ANALOG_MAX {
        return None;
    }
    let ticks = (value as u32 * MAX_TICK as u32 + ANALOG_MAX as u32 / 2) / ANALOG_MAX as u32;
    Some(ticks as u16)
}
