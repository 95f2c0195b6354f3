//! PCA9685 16-channel PWM driver
//!
//! This driver provides:
//! - Digital on/off and raw 12-bit duty cycle per channel or for all channels
//! - Pulse-width output in microseconds that survives frequency changes
//! - Output frequency (prescale) configuration
//! - Sleep/wake, software reset and I2C address management
//!
//! # Mode brackets
//!
//! Some operations need a MODE1 bit in a particular state only while they
//! run: outputs are written with the oscillator awake, and the prescaler can
//! only be written while asleep. Such an operation reads MODE1, caches it,
//! flips the bit, does its work and then writes the cached byte back, so bits
//! set earlier (ALLCALL, SUBx, AI) are left exactly as they were.
//!
//! Only one cached value exists. Brackets do not nest, and the sequence is
//! not atomic: a `Pca9685` must not be shared between threads or tasks
//! without external locking (one lock per chip address).
//!
//! # Out-of-range input
//!
//! Invalid arguments (digital values other than 0/1, ticks above 4095,
//! unsupported frequencies, reserved addresses) are ignored: nothing is
//! written, no state changes and `Ok(())` is returned. Only bus failures are
//! reported, as [`Error::Communication`].
//!
//! # Usage
//!
//! ```ignore
//! let mut pwm = Pca9685::new(i2c, 0x40)?;
//! pwm.set_pwm_frequency(1000)?;
//! pwm.pwm_write(Channel::P0, 2048)?; // 50% duty
//! pwm.digital_write(Channel::P1, 1)?; // fully on
//! ```

use servoboard_core::address::{self, ALL_CALL_ADDRESS};
use servoboard_core::config::DeviceConfig;
use servoboard_core::registers::{reg, sub_address_register, SOFTWARE_RESET};
use servoboard_core::timing::{self, DEFAULT_FREQUENCY_HZ, MAX_TICK};
use servoboard_core::{Channel, ChannelMask, ModeBit, ModeRegister, PwmLevel, PwmRegisters};
use servoboard_core::CHANNEL_COUNT;
use servoboard_hal::{RegisterBus, GENERAL_CALL_ADDRESS};

/// PCA9685 driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The chip did not acknowledge a read or write
    Communication(E),
}

/// Number of sub-address slots (SUBADR1-3)
const SUB_ADDRESS_SLOTS: u8 = 3;

/// PCA9685 driver state
///
/// Owns the bus handle and mirrors the parts of the chip state that cannot
/// be read back cheaply: the output frequency and which channels are driven
/// by a pulse width rather than a raw tick count.
pub struct Pca9685<B> {
    bus: B,
    /// 7-bit address used for every register access
    address: u8,
    /// Address given at construction, answered again after a software reset
    home_address: u8,
    /// MODE1 as it was before the last bit toggle
    prev_mode: Option<ModeRegister>,
    /// A mode bracket is running (brackets do not nest)
    in_bracket: bool,
    /// Requested output frequency in Hz
    frequency_hz: u16,
    /// Channels whose duty cycle follows a pulse width
    pulse_mode: ChannelMask,
    /// Last requested pulse width per channel, in microseconds
    pulse_len: [u16; CHANNEL_COUNT],
    /// Last sub-address slot written (0 = none yet)
    sub_addr_slot: u8,
    /// Slots whose SUBx enable bit has been set (bit n = slot n)
    sub_addr_enabled: u8,
}

impl<B: RegisterBus> Pca9685<B> {
    /// Create a driver for the chip at `address` and wake it up
    pub fn new(bus: B, address: u8) -> Result<Self, Error<B::Error>> {
        let mut device = Self {
            bus,
            address,
            home_address: address,
            prev_mode: None,
            in_bracket: false,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            pulse_mode: ChannelMask::EMPTY,
            pulse_len: [0; CHANNEL_COUNT],
            sub_addr_slot: 0,
            sub_addr_enabled: 0,
        };
        device.wake()?;
        Ok(device)
    }

    /// Create a driver that talks to every PCA9685 on the bus at once
    pub fn all_call(bus: B) -> Result<Self, Error<B::Error>> {
        Self::new(bus, ALL_CALL_ADDRESS)
    }

    /// Create a driver and apply `config`
    ///
    /// An unsupported frequency leaves the chip at its power-on rate.
    pub fn with_config(bus: B, config: &DeviceConfig) -> Result<Self, Error<B::Error>> {
        let mut device = Self::new(bus, config.address)?;
        device.set_pwm_frequency(config.frequency_hz)?;
        Ok(device)
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Current 7-bit address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Requested output frequency in Hz
    pub fn frequency_hz(&self) -> u16 {
        self.frequency_hz
    }

    /// Channels currently driven by a pulse width
    pub fn pulse_mode(&self) -> ChannelMask {
        self.pulse_mode
    }

    /// Pulse width of `channel` in microseconds, if it is in pulse mode
    pub fn pulse_length(&self, channel: Channel) -> Option<u16> {
        if self.pulse_mode.contains(channel) {
            Some(self.pulse_len[channel.index() as usize])
        } else {
            None
        }
    }

    // ========================================================================
    // Register access
    // ========================================================================

    fn register_write(&mut self, register: u8, value: u8) -> Result<(), Error<B::Error>> {
        let address = self.address;
        self.bus
            .write_register(address, register, value)
            .map_err(|e| {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "pca9685 {=u8:#x}: no ACK writing register {=u8:#x}",
                    address,
                    register
                );
                Error::Communication(e)
            })
    }

    /// Read one register (diagnostics)
    pub fn read_register(&mut self, register: u8) -> Result<u8, Error<B::Error>> {
        let address = self.address;
        self.bus.read_register(address, register).map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "pca9685 {=u8:#x}: no ACK reading register {=u8:#x}",
                address,
                register
            );
            Error::Communication(e)
        })
    }

    /// Read MODE1
    pub fn mode(&mut self) -> Result<ModeRegister, Error<B::Error>> {
        self.read_register(reg::MODE1).map(ModeRegister::from_bits)
    }

    /// Read the prescaler
    pub fn prescale(&mut self) -> Result<u8, Error<B::Error>> {
        self.read_register(reg::PRE_SCALE)
    }

    /// Frequency the programmed prescaler actually produces
    ///
    /// Differs from [`Self::frequency_hz`] by the prescale rounding.
    pub fn output_frequency_hz(&mut self) -> Result<u32, Error<B::Error>> {
        self.prescale().map(timing::frequency_for_prescale)
    }

    /// Length of one PWM period in microseconds
    pub fn period_us(&self) -> u32 {
        timing::period_us(self.frequency_hz)
    }

    pub fn is_sleeping(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(self.mode()?.is_sleeping())
    }

    // ========================================================================
    // MODE1 handling
    // ========================================================================

    /// Read-modify-write one MODE1 bit, caching the previous value
    fn configure_mode(&mut self, bit: ModeBit, enabled: bool) -> Result<(), Error<B::Error>> {
        let current = self.mode()?;
        self.prev_mode = Some(current);
        self.register_write(reg::MODE1, current.with(bit, enabled).bits())
    }

    /// Write back the MODE1 value cached by the last `configure_mode`
    fn restore_mode(&mut self) -> Result<(), Error<B::Error>> {
        match self.prev_mode.take() {
            Some(prev) => self.register_write(reg::MODE1, prev.bits()),
            None => Ok(()),
        }
    }

    /// Run `op` with a MODE1 bit forced, then restore MODE1
    ///
    /// The restore write is attempted whenever the bit was changed, even if
    /// `op` failed. The first error wins.
    fn with_mode_bit<T>(
        &mut self,
        bit: ModeBit,
        enabled: bool,
        op: impl FnOnce(&mut Self) -> Result<T, Error<B::Error>>,
    ) -> Result<T, Error<B::Error>> {
        debug_assert!(!self.in_bracket, "mode brackets do not nest");

        self.configure_mode(bit, enabled)?;
        self.in_bracket = true;
        let result = op(self);
        self.in_bracket = false;
        let restored = self.restore_mode();

        let value = result?;
        restored?;
        Ok(value)
    }

    /// Write an output level with the oscillator awake
    fn write_level(&mut self, regs: PwmRegisters, level: PwmLevel) -> Result<(), Error<B::Error>> {
        self.with_mode_bit(ModeBit::Sleep, false, |dev| {
            for (register, value) in level.register_sequence(regs) {
                dev.register_write(register, value)?;
            }
            Ok(())
        })
    }

    fn write_ticks(&mut self, channel: Channel, ticks: u16) -> Result<(), Error<B::Error>> {
        self.write_level(PwmRegisters::channel(channel), PwmLevel::Duty(ticks))
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Switch a channel fully on (1) or fully off (0)
    pub fn digital_write(&mut self, channel: Channel, value: u8) -> Result<(), Error<B::Error>> {
        let level = match value {
            0 => PwmLevel::FullOff,
            1 => PwmLevel::FullOn,
            _ => {
                #[cfg(feature = "defmt")]
                defmt::debug!("digital_write {}: ignoring value {=u8}", channel, value);
                return Ok(());
            }
        };

        self.pulse_mode.remove(channel);
        self.write_level(PwmRegisters::channel(channel), level)
    }

    /// Switch every channel fully on (1) or fully off (0)
    ///
    /// Broadcast writes bypass per-channel tracking, so pulse mode is
    /// cleared on all channels.
    pub fn digital_write_all(&mut self, value: u8) -> Result<(), Error<B::Error>> {
        let level = match value {
            0 => PwmLevel::AllOff,
            1 => PwmLevel::FullOn,
            _ => {
                #[cfg(feature = "defmt")]
                defmt::debug!("digital_write_all: ignoring value {=u8}", value);
                return Ok(());
            }
        };

        self.pulse_mode.clear();
        self.write_level(PwmRegisters::ALL, level)
    }

    /// Set a channel's duty cycle in ticks (0-4095, ON at tick 0)
    pub fn pwm_write(&mut self, channel: Channel, value: u16) -> Result<(), Error<B::Error>> {
        if value > MAX_TICK {
            #[cfg(feature = "defmt")]
            defmt::debug!("pwm_write {}: ignoring tick {=u16}", channel, value);
            return Ok(());
        }

        self.pulse_mode.remove(channel);
        self.write_ticks(channel, value)
    }

    /// Set every channel's duty cycle in ticks (0-4095)
    ///
    /// 0 switches all outputs fully off rather than writing an OFF tick of 0.
    pub fn pwm_write_all(&mut self, value: u16) -> Result<(), Error<B::Error>> {
        if value > MAX_TICK {
            #[cfg(feature = "defmt")]
            defmt::debug!("pwm_write_all: ignoring tick {=u16}", value);
            return Ok(());
        }

        let level = if value == 0 {
            PwmLevel::AllOff
        } else {
            PwmLevel::Duty(value)
        };
        self.pulse_mode.clear();
        self.write_level(PwmRegisters::ALL, level)
    }

    /// Set a channel from a 10-bit analog value (0-1023)
    pub fn analog_write(&mut self, channel: Channel, value: u16) -> Result<(), Error<B::Error>> {
        match timing::analog_to_ticks(value) {
            Some(ticks) => self.pwm_write(channel, ticks),
            None => Ok(()),
        }
    }

    /// Set every channel from a 10-bit analog value (0-1023)
    pub fn analog_write_all(&mut self, value: u16) -> Result<(), Error<B::Error>> {
        match timing::analog_to_ticks(value) {
            Some(ticks) => self.pwm_write_all(ticks),
            None => Ok(()),
        }
    }

    /// Output a pulse of `pulse_us` microseconds every PWM period
    ///
    /// The channel is put in pulse mode: its tick value is recomputed
    /// whenever the frequency changes so the pulse width stays the same.
    /// Negative pulses and pulses longer than the period are ignored.
    pub fn pwm_pulse(&mut self, channel: Channel, pulse_us: i32) -> Result<(), Error<B::Error>> {
        let Some(ticks) = timing::pulse_to_ticks(pulse_us, self.frequency_hz) else {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "pwm_pulse {}: {=i32} us does not fit a {=u16} Hz period",
                channel,
                pulse_us,
                self.frequency_hz
            );
            return Ok(());
        };

        // pulse_to_ticks bounds the pulse by the period (< 42 ms)
        self.pulse_len[channel.index() as usize] = pulse_us as u16;
        self.pulse_mode.insert(channel);
        self.write_ticks(channel, ticks)
    }

    // ========================================================================
    // Chip control
    // ========================================================================

    /// Change the output frequency (about 24-1526 Hz)
    ///
    /// The prescaler is written with the oscillator stopped, then MODE1 is
    /// restored. Channels in pulse mode are rewritten for the new tick length;
    /// a pulse that no longer fits the new period takes its channel out of
    /// pulse mode and switches it fully off.
    pub fn set_pwm_frequency(&mut self, frequency_hz: u16) -> Result<(), Error<B::Error>> {
        let Some(prescale) = timing::prescale_for(frequency_hz as u32) else {
            #[cfg(feature = "defmt")]
            defmt::debug!("set_pwm_frequency: {=u16} Hz out of range", frequency_hz);
            return Ok(());
        };

        self.with_mode_bit(ModeBit::Sleep, true, |dev| {
            dev.register_write(reg::PRE_SCALE, prescale)
        })?;
        self.frequency_hz = frequency_hz;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "pca9685 {=u8:#x}: {=u16} Hz (prescale {=u8})",
            self.address,
            frequency_hz,
            prescale
        );

        for channel in self.pulse_mode.iter() {
            let pulse_us = self.pulse_len[channel.index() as usize];
            match timing::pulse_to_ticks(pulse_us as i32, frequency_hz) {
                Some(ticks) => self.write_ticks(channel, ticks)?,
                None => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "set_pwm_frequency: {} dropped, {=u16} us exceeds the period",
                        channel,
                        pulse_us
                    );
                    self.digital_write(channel, 0)?;
                }
            }
        }
        Ok(())
    }

    /// Enter low-power sleep; outputs stop
    pub fn sleep(&mut self) -> Result<(), Error<B::Error>> {
        self.configure_mode(ModeBit::Sleep, true)
    }

    /// Leave sleep
    pub fn wake(&mut self) -> Result<(), Error<B::Error>> {
        self.configure_mode(ModeBit::Sleep, false)
    }

    /// Send the general-call software reset
    ///
    /// Every PCA9685 on the bus returns to its power-on state (asleep,
    /// 200 Hz, outputs off, ALLCALLADR and SUBADRx back to their defaults).
    /// The driver forgets pulse tracking and sub-address slots to match and
    /// goes back to the address it was created with, since an address set
    /// by [`Self::change_address`] is lost. Call [`Self::wake`] to resume.
    pub fn software_reset(&mut self) -> Result<(), Error<B::Error>> {
        self.bus
            .write_raw(GENERAL_CALL_ADDRESS, &[SOFTWARE_RESET])
            .map_err(Error::Communication)?;

        self.address = self.home_address;
        self.prev_mode = None;
        self.frequency_hz = DEFAULT_FREQUENCY_HZ;
        self.pulse_mode.clear();
        self.pulse_len = [0; CHANNEL_COUNT];
        self.sub_addr_slot = 0;
        self.sub_addr_enabled = 0;
        Ok(())
    }

    /// Move the chip to a new address
    ///
    /// Enables all-call and programs ALLCALLADR with `new_address`; later
    /// accesses use the new address. Reserved addresses are ignored.
    pub fn change_address(&mut self, new_address: u8) -> Result<(), Error<B::Error>> {
        if address::is_reserved(new_address) {
            #[cfg(feature = "defmt")]
            defmt::debug!("change_address: {=u8:#x} is reserved", new_address);
            return Ok(());
        }

        self.configure_mode(ModeBit::AllCall, true)?;
        self.register_write(reg::ALLCALLADR, address::register_form(new_address))?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "pca9685 {=u8:#x}: now at {=u8:#x}",
            self.address,
            new_address
        );
        self.address = new_address;
        Ok(())
    }

    /// Make the chip also answer to `alt_address`
    ///
    /// Slots are used in turn (1, 2, 3, then 1 again); a slot's SUBx enable
    /// bit is set the first time it is used. Reserved addresses are ignored.
    pub fn add_alt_address(&mut self, alt_address: u8) -> Result<(), Error<B::Error>> {
        if address::is_reserved(alt_address) {
            return Ok(());
        }

        let slot = self.sub_addr_slot % SUB_ADDRESS_SLOTS + 1;
        self.sub_addr_slot = slot;
        let (Some(bit), Some(register)) = (ModeBit::sub_call(slot), sub_address_register(slot))
        else {
            return Ok(());
        };

        if self.sub_addr_enabled & (1 << slot) == 0 {
            self.configure_mode(bit, true)?;
            self.sub_addr_enabled |= 1 << slot;
        }
        self.register_write(register, address::register_form(alt_address))
    }
}
