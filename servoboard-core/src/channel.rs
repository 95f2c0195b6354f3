//! PWM channel identifiers and per-channel flag sets

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of PWM outputs on the chip
pub const CHANNEL_COUNT: usize = 16;

/// One of the 16 PWM outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Channel {
    P0 = 0,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    P7,
    P8,
    P9,
    P10,
    P11,
    P12,
    P13,
    P14,
    P15,
}

impl Channel {
    /// Every channel, in register order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::P0,
        Channel::P1,
        Channel::P2,
        Channel::P3,
        Channel::P4,
        Channel::P5,
        Channel::P6,
        Channel::P7,
        Channel::P8,
        Channel::P9,
        Channel::P10,
        Channel::P11,
        Channel::P12,
        Channel::P13,
        Channel::P14,
        Channel::P15,
    ];

    /// Channel number (0-15)
    pub const fn index(self) -> u8 {
        self as u8
    }
}

/// Channel number outside 0-15
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidChannel(pub u8);

impl TryFrom<u8> for Channel {
    type Error = InvalidChannel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Channel::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidChannel(value))
    }
}

/// A set of channels, one bit per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(u16);

impl ChannelMask {
    /// No channels
    pub const EMPTY: Self = Self(0);

    /// Raw bitmask (bit n = channel n)
    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    pub fn insert(&mut self, channel: Channel) {
        self.0 |= 1 << channel.index();
    }

    pub fn remove(&mut self, channel: Channel) {
        self.0 &= !(1 << channel.index());
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Channels in the set, lowest first
    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |&ch| self.contains(ch))
    }
}
