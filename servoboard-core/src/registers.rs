//! PCA9685 register map
//!
//! Addresses and bit patterns as laid out in the PCA9685 datasheet.
//! Each PWM channel occupies four consecutive registers starting at
//! `0x06 + 4 * n`; the broadcast `ALL_LED_*` block has the same layout.

use crate::channel::Channel;

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1 (bit-field, see [`crate::mode::ModeBit`])
    pub const MODE1: u8 = 0x00;
    /// I2C sub-address 1
    pub const SUBADR1: u8 = 0x01;
    /// I2C sub-address 2
    pub const SUBADR2: u8 = 0x02;
    /// I2C sub-address 3
    pub const SUBADR3: u8 = 0x03;
    /// All-call I2C address
    pub const ALLCALLADR: u8 = 0x05;
    /// Channel 0 ON low byte, first of the per-channel blocks
    pub const LED0_ON_L: u8 = 0x06;
    /// Broadcast ON low byte
    pub const ALL_LED_ON_L: u8 = 0xFA;
    /// Broadcast ON high byte
    pub const ALL_LED_ON_H: u8 = 0xFB;
    /// Broadcast OFF low byte
    pub const ALL_LED_OFF_L: u8 = 0xFC;
    /// Broadcast OFF high byte
    pub const ALL_LED_OFF_H: u8 = 0xFD;
    /// Prescaler for the PWM output frequency
    pub const PRE_SCALE: u8 = 0xFE;
}

/// Software reset command byte, sent to the general-call address
pub const SOFTWARE_RESET: u8 = 0x06;

/// Bit 4 of an ON_H/OFF_H byte: the output is fully on/off
pub const FULL_FLAG: u8 = 0x10;

/// Registers per channel block
const CHANNEL_STRIDE: u8 = 4;

/// The four registers that define one PWM output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmRegisters {
    pub on_l: u8,
    pub on_h: u8,
    pub off_l: u8,
    pub off_h: u8,
}

impl PwmRegisters {
    /// The broadcast block that drives every channel at once
    pub const ALL: Self = Self {
        on_l: reg::ALL_LED_ON_L,
        on_h: reg::ALL_LED_ON_H,
        off_l: reg::ALL_LED_OFF_L,
        off_h: reg::ALL_LED_OFF_H,
    };

    /// Register block of a single channel
    pub const fn channel(channel: Channel) -> Self {
        let base = reg::LED0_ON_L + CHANNEL_STRIDE * channel.index();
        Self {
            on_l: base,
            on_h: base + 1,
            off_l: base + 2,
            off_h: base + 3,
        }
    }
}

/// Register holding sub-address `slot` (1-3)
///
/// Returns `None` for slots outside 1-3.
pub const fn sub_address_register(slot: u8) -> Option<u8> {
    match slot {
        1 => Some(reg::SUBADR1),
        2 => Some(reg::SUBADR2),
        3 => Some(reg::SUBADR3),
        _ => None,
    }
}

/// Output level of a channel (or of all channels via the broadcast block)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmLevel {
    /// Full-on flag set, OFF cleared
    FullOn,
    /// ON cleared, full-off flag set
    FullOff,
    /// Both full flags set: the power-on idiom for switching everything off
    AllOff,
    /// ON at tick 0, OFF at the given tick (0-4095)
    Duty(u16),
}

impl PwmLevel {
    /// Register writes for this level, in the order they must be issued
    ///
    /// Full-on clears OFF before raising the full-on flag; full-off clears
    /// ON first. Duty values keep only their low 12 bits.
    pub const fn register_sequence(self, regs: PwmRegisters) -> [(u8, u8); 4] {
        match self {
            Self::FullOn => [
                (regs.off_l, 0x00),
                (regs.off_h, 0x00),
                (regs.on_l, 0x00),
                (regs.on_h, FULL_FLAG),
            ],
            Self::FullOff => [
                (regs.on_l, 0x00),
                (regs.on_h, 0x00),
                (regs.off_l, 0x00),
                (regs.off_h, FULL_FLAG),
            ],
            Self::AllOff => [
                (regs.on_l, 0x00),
                (regs.on_h, FULL_FLAG),
                (regs.off_l, 0x00),
                (regs.off_h, FULL_FLAG),
            ],
            Self::Duty(ticks) => {
                let (low, high) = split_ticks(ticks);
                [
                    (regs.on_l, 0x00),
                    (regs.on_h, 0x00),
                    (regs.off_l, low),
                    (regs.off_h, high),
                ]
            }
        }
    }
}

/// Split a 12-bit tick into its low byte and high nibble
pub const fn split_ticks(ticks: u16) -> (u8, u8) {
    ((ticks & 0xFF) as u8, ((ticks >> 8) & 0x0F) as u8)
}
