//! Servo control on top of the PCA9685
//!
//! [`ServoController`] wraps a [`Pca9685`] running at 50 Hz and adds:
//! - Per-channel pulse limits (default 1000-2000 us)
//! - Angle positioning (0-180 degrees)
//!
//! Channels become servo channels the first time they are moved with
//! [`ServoController::move_servo`]. From then on every pulse request on that
//! channel is clamped into its limits; other channels on the same chip are
//! passed through untouched, so LEDs and servos can share a board.
//!
//! Every other [`Pca9685`] operation is available through `Deref`.

use core::ops::{Deref, DerefMut};

use servoboard_core::address::ALL_CALL_ADDRESS;
use servoboard_core::config::BoardConfig;
use servoboard_core::servo::{self, ServoLimits, SERVO_FREQUENCY_HZ};
use servoboard_core::{Channel, ChannelMask, CHANNEL_COUNT};
use servoboard_hal::RegisterBus;

use super::pca9685::{Error, Pca9685};

/// Pulse limits and servo flags for the 16 channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoPolicy {
    limits: [ServoLimits; CHANNEL_COUNT],
    servo_mode: ChannelMask,
}

impl Default for ServoPolicy {
    fn default() -> Self {
        Self {
            limits: [ServoLimits::default(); CHANNEL_COUNT],
            servo_mode: ChannelMask::EMPTY,
        }
    }
}

impl ServoPolicy {
    pub fn limits(&self, channel: Channel) -> ServoLimits {
        self.limits[channel.index() as usize]
    }

    pub fn set_limits(&mut self, channel: Channel, limits: ServoLimits) {
        self.limits[channel.index() as usize] = limits;
    }

    /// Channels under servo control
    pub fn servo_mode(&self) -> ChannelMask {
        self.servo_mode
    }

    pub fn is_servo(&self, channel: Channel) -> bool {
        self.servo_mode.contains(channel)
    }

    pub fn mark_servo(&mut self, channel: Channel) {
        self.servo_mode.insert(channel);
    }

    /// Pulse to actually output for a request on `channel`
    pub fn apply(&self, channel: Channel, pulse_us: i32) -> i32 {
        if self.is_servo(channel) {
            self.limits(channel).clamp(pulse_us)
        } else {
            pulse_us
        }
    }
}

/// PCA9685 driving hobby servos
pub struct ServoController<B> {
    device: Pca9685<B>,
    policy: ServoPolicy,
}

impl<B: RegisterBus> ServoController<B> {
    /// Create a controller for the chip at `address`, running at 50 Hz
    pub fn new(bus: B, address: u8) -> Result<Self, Error<B::Error>> {
        let mut device = Pca9685::new(bus, address)?;
        device.set_pwm_frequency(SERVO_FREQUENCY_HZ)?;
        Ok(Self {
            device,
            policy: ServoPolicy::default(),
        })
    }

    /// Create a controller that drives every PCA9685 on the bus at once
    pub fn all_call(bus: B) -> Result<Self, Error<B::Error>> {
        Self::new(bus, ALL_CALL_ADDRESS)
    }

    /// Create a controller from a board description
    ///
    /// Invalid entries are skipped the same way the matching calls ignore
    /// them; run [`BoardConfig::validate`] first to catch them.
    pub fn with_config(bus: B, config: &BoardConfig) -> Result<Self, Error<B::Error>> {
        let mut controller = Self::new(bus, config.device.address)?;
        if config.device.frequency_hz != SERVO_FREQUENCY_HZ {
            controller
                .device
                .set_pwm_frequency(config.device.frequency_hz)?;
        }
        for entry in &config.servos {
            controller.configure_servo(entry.channel, entry.limits.min_us, entry.limits.max_us);
        }
        Ok(controller)
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.device.release()
    }

    pub fn policy(&self) -> &ServoPolicy {
        &self.policy
    }

    /// Set the pulse limits of one channel
    ///
    /// Takes effect on the next pulse; the current output is not clamped
    /// retroactively. `min_us > max_us` is ignored.
    pub fn configure_servo(&mut self, channel: Channel, min_us: u16, max_us: u16) {
        match ServoLimits::new(min_us, max_us) {
            Some(limits) => self.policy.set_limits(channel, limits),
            None => {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "configure_servo {}: min {=u16} above max {=u16}",
                    channel,
                    min_us,
                    max_us
                );
            }
        }
    }

    /// Output a pulse, clamped to the channel's limits if it is a servo
    pub fn pwm_pulse(&mut self, channel: Channel, pulse_us: i32) -> Result<(), Error<B::Error>> {
        let pulse_us = self.policy.apply(channel, pulse_us);
        self.device.pwm_pulse(channel, pulse_us)
    }

    /// Move a servo to `angle_deg` (clamped to 0-180)
    ///
    /// The angle maps onto 1000-2000 us regardless of the channel's limits;
    /// the limits are then applied to the resulting pulse.
    pub fn move_servo(&mut self, channel: Channel, angle_deg: f32) -> Result<(), Error<B::Error>> {
        let Some(pulse_us) = servo::angle_to_pulse_us(angle_deg) else {
            return Ok(());
        };

        self.policy.mark_servo(channel);
        self.pwm_pulse(channel, pulse_us as i32)
    }
}

impl<B> Deref for ServoController<B> {
    type Target = Pca9685<B>;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl<B> DerefMut for ServoController<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pwm::mock::MockPca9685;
    use servoboard_core::config::ServoChannelConfig;
    use servoboard_core::registers::reg;
    use servoboard_core::{ModeBit, PwmRegisters};

    const ADDR: u8 = 0x40;

    fn controller() -> ServoController<MockPca9685> {
        ServoController::new(MockPca9685::new(ADDR), ADDR).unwrap()
    }

    fn ticks(ctl: &mut ServoController<MockPca9685>, channel: Channel) -> u16 {
        let regs = PwmRegisters::channel(channel);
        let low = ctl.read_register(regs.off_l).unwrap();
        let high = ctl.read_register(regs.off_h).unwrap();
        u16::from(low) | (u16::from(high) << 8)
    }

    #[test]
    fn test_new_runs_at_50hz() {
        let mut ctl = controller();

        assert_eq!(ctl.frequency_hz(), 50);
        assert_eq!(ctl.prescale().unwrap(), 121);
        assert!(!ctl.is_sleeping().unwrap());
        assert!(ctl.policy().servo_mode().is_empty());
        for ch in Channel::ALL {
            assert_eq!(ctl.policy().limits(ch), ServoLimits::new(1000, 2000).unwrap());
        }
    }

    #[test]
    fn test_all_call_controller() {
        let mut ctl = ServoController::all_call(MockPca9685::new(ADDR)).unwrap();

        assert_eq!(ctl.address(), ALL_CALL_ADDRESS);
        assert_eq!(ctl.prescale().unwrap(), 121);

        ctl.move_servo(Channel::P0, 90.0).unwrap();
        assert_eq!(ticks(&mut ctl, Channel::P0), 307);
    }

    #[test]
    fn test_move_servo_positions() {
        let mut ctl = controller();

        ctl.move_servo(Channel::P0, 0.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P0), Some(1000));

        ctl.move_servo(Channel::P0, 90.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P0), Some(1500));
        assert_eq!(ticks(&mut ctl, Channel::P0), 307);

        ctl.move_servo(Channel::P0, 180.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P0), Some(2000));

        assert!(ctl.policy().is_servo(Channel::P0));
    }

    #[test]
    fn test_move_servo_clamps_angle() {
        let mut ctl = controller();

        ctl.move_servo(Channel::P1, -30.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P1), Some(1000));

        ctl.move_servo(Channel::P1, 270.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P1), Some(2000));
    }

    #[test]
    fn test_move_servo_nan_is_ignored() {
        let mut ctl = controller();
        ctl.bus_mut().clear_log();

        ctl.move_servo(Channel::P1, f32::NAN).unwrap();

        assert!(!ctl.policy().is_servo(Channel::P1));
        assert!(ctl.bus().writes().is_empty());
    }

    #[test]
    fn test_servo_channel_clamped_to_limits() {
        let mut ctl = controller();
        ctl.configure_servo(Channel::P3, 300, 3000);
        ctl.move_servo(Channel::P3, 90.0).unwrap();

        ctl.pwm_pulse(Channel::P3, 9999).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P3), Some(3000));
        // 3000 us / 4.8828 us = 614.4
        assert_eq!(ticks(&mut ctl, Channel::P3), 614);

        ctl.pwm_pulse(Channel::P3, -9999).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P3), Some(300));
        assert_eq!(ticks(&mut ctl, Channel::P3), 61);
    }

    #[test]
    fn test_angle_scale_ignores_limits() {
        let mut ctl = controller();
        ctl.configure_servo(Channel::P4, 1200, 1800);

        ctl.move_servo(Channel::P4, 0.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P4), Some(1200));

        ctl.move_servo(Channel::P4, 90.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P4), Some(1500));
    }

    #[test]
    fn test_non_servo_channel_passes_through() {
        let mut ctl = controller();
        ctl.move_servo(Channel::P0, 45.0).unwrap();

        ctl.pwm_pulse(Channel::P1, 2500).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P1), Some(2500));
        assert!(!ctl.policy().is_servo(Channel::P1));
    }

    #[test]
    fn test_configure_servo_not_retroactive() {
        let mut ctl = controller();
        ctl.move_servo(Channel::P2, 180.0).unwrap();

        ctl.configure_servo(Channel::P2, 1000, 1500);
        assert_eq!(ctl.pulse_length(Channel::P2), Some(2000));
        assert_eq!(ticks(&mut ctl, Channel::P2), 410);

        ctl.move_servo(Channel::P2, 180.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P2), Some(1500));
    }

    #[test]
    fn test_configure_servo_rejects_inverted_range() {
        let mut ctl = controller();
        ctl.configure_servo(Channel::P5, 2000, 1000);
        assert_eq!(ctl.policy().limits(Channel::P5), ServoLimits::default());
    }

    #[test]
    fn test_frequency_change_keeps_servo_pulse() {
        let mut ctl = controller();
        ctl.move_servo(Channel::P8, 90.0).unwrap();
        ctl.bus_mut().poke(reg::MODE1, 0b0000_0101);

        ctl.set_pwm_frequency(60).unwrap();

        // 1500 us at 60 Hz: round(1500 * 60 * 4096 / 1e6) = 369
        assert_eq!(ticks(&mut ctl, Channel::P8), 369);
        assert_eq!(ctl.pulse_length(Channel::P8), Some(1500));
        let mode = ctl.mode().unwrap();
        assert!(mode.is_set(ModeBit::SubCall2));
        assert!(!mode.is_sleeping());
    }

    #[test]
    fn test_with_config() {
        let mut board = BoardConfig::default();
        board.device.address = ADDR;
        board
            .servos
            .push(ServoChannelConfig {
                channel: Channel::P6,
                limits: ServoLimits::new(500, 2500).unwrap(),
            })
            .unwrap();

        let mut ctl = ServoController::with_config(MockPca9685::new(ADDR), &board).unwrap();

        assert_eq!(ctl.frequency_hz(), 50);
        assert_eq!(ctl.policy().limits(Channel::P6), ServoLimits::new(500, 2500).unwrap());
        ctl.move_servo(Channel::P6, 0.0).unwrap();
        assert_eq!(ctl.pulse_length(Channel::P6), Some(1000));

        let bus = ctl.release();
        assert!(bus.answers(ADDR));
    }
}
