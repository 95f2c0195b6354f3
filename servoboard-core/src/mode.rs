//! MODE1 register bit-field

/// Bits of the MODE1 register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ModeBit {
    /// Respond to the all-call address
    AllCall = 0,
    /// Respond to sub-address 1
    SubCall1 = 1,
    /// Respond to sub-address 2
    SubCall2 = 2,
    /// Respond to sub-address 3
    SubCall3 = 3,
    /// Low-power mode, oscillator off
    Sleep = 4,
    /// Register auto-increment
    AutoIncrement = 5,
    /// Use the EXTCLK pin as clock
    ExternalClock = 6,
    /// Restart enabled
    Restart = 7,
}

impl ModeBit {
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }

    /// SubCall enable bit for sub-address `slot` (1-3)
    pub const fn sub_call(slot: u8) -> Option<Self> {
        match slot {
            1 => Some(Self::SubCall1),
            2 => Some(Self::SubCall2),
            3 => Some(Self::SubCall3),
            _ => None,
        }
    }
}

/// Value of the MODE1 register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeRegister(u8);

impl ModeRegister {
    /// MODE1 after power-up or software reset: asleep, all-call enabled
    pub const POWER_ON: Self = Self(0x11);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_set(self, bit: ModeBit) -> bool {
        self.0 & bit.mask() != 0
    }

    /// Copy with `bit` forced to `enabled`, every other bit untouched
    pub const fn with(self, bit: ModeBit, enabled: bool) -> Self {
        let cleared = self.0 & !bit.mask();
        if enabled {
            Self(cleared | bit.mask())
        } else {
            Self(cleared)
        }
    }

    pub const fn is_sleeping(self) -> bool {
        self.is_set(ModeBit::Sleep)
    }
}
