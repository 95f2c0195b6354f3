//! Simulated PCA9685 for driver tests
//!
//! Models the register file closely enough to catch ordering mistakes:
//! power-on defaults, broadcast ALL_LED registers, the prescaler being
//! write-protected while the oscillator runs, and address matching for
//! the hardware address, all-call, sub-addresses and the general-call
//! software reset.

use std::vec::Vec;

use servoboard_core::registers::{reg, PwmRegisters, FULL_FLAG, SOFTWARE_RESET};
use servoboard_core::{Channel, ModeBit, ModeRegister};
use servoboard_hal::{I2cBus, GENERAL_CALL_ADDRESS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Nobody acknowledged the address or data
    Nack,
}

pub struct MockPca9685 {
    regs: [u8; 256],
    hardware_address: u8,
    pointer: u8,
    /// (address, register, value) for every register write
    writes: Vec<(u8, u8, u8)>,
    resets: usize,
    /// NACK every write to this register
    pub fail_register: Option<u8>,
}

impl MockPca9685 {
    /// A chip strapped to `hardware_address`, in its power-on state
    pub fn new(hardware_address: u8) -> Self {
        let mut chip = Self {
            regs: [0; 256],
            hardware_address,
            pointer: 0,
            writes: Vec::new(),
            resets: 0,
            fail_register: None,
        };
        chip.power_on();
        chip
    }

    fn power_on(&mut self) {
        self.regs = [0; 256];
        self.regs[reg::MODE1 as usize] = ModeRegister::POWER_ON.bits();
        self.regs[reg::SUBADR1 as usize] = 0xE2;
        self.regs[reg::SUBADR2 as usize] = 0xE4;
        self.regs[reg::SUBADR3 as usize] = 0xE8;
        self.regs[reg::ALLCALLADR as usize] = 0xE0;
        self.regs[reg::PRE_SCALE as usize] = 0x1E;
        for ch in Channel::ALL {
            self.regs[PwmRegisters::channel(ch).off_h as usize] = FULL_FLAG;
        }
        self.pointer = 0;
    }

    fn mode(&self) -> ModeRegister {
        ModeRegister::from_bits(self.regs[reg::MODE1 as usize])
    }

    /// Whether the chip acknowledges `address`
    pub fn answers(&self, address: u8) -> bool {
        if address == self.hardware_address {
            return true;
        }
        let mode = self.mode();
        let matches = |bit: ModeBit, register: u8| {
            mode.is_set(bit) && self.regs[register as usize] >> 1 == address
        };
        matches(ModeBit::AllCall, reg::ALLCALLADR)
            || matches(ModeBit::SubCall1, reg::SUBADR1)
            || matches(ModeBit::SubCall2, reg::SUBADR2)
            || matches(ModeBit::SubCall3, reg::SUBADR3)
    }

    pub fn writes(&self) -> &[(u8, u8, u8)] {
        &self.writes
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
    }

    /// Number of general-call software resets received
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Set a register directly, bypassing the bus
    pub fn poke(&mut self, register: u8, value: u8) {
        self.regs[register as usize] = value;
    }

    fn store(&mut self, register: u8, value: u8) {
        match register {
            reg::PRE_SCALE => {
                // PRE_SCALE only accepts writes while SLEEP is set
                if self.mode().is_sleeping() {
                    self.regs[register as usize] = value;
                }
            }
            reg::ALL_LED_ON_L..=reg::ALL_LED_OFF_H => {
                // Broadcast registers fan out and read back as zero
                let offset = register - reg::ALL_LED_ON_L;
                for ch in Channel::ALL {
                    let base = PwmRegisters::channel(ch).on_l;
                    self.regs[(base + offset) as usize] = value;
                }
            }
            _ => self.regs[register as usize] = value,
        }
    }
}

impl I2cBus for MockPca9685 {
    type Error = MockError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), MockError> {
        if address == GENERAL_CALL_ADDRESS {
            if data == [SOFTWARE_RESET] {
                self.power_on();
                self.resets += 1;
                return Ok(());
            }
            return Err(MockError::Nack);
        }
        if !self.answers(address) {
            return Err(MockError::Nack);
        }

        match *data {
            [register] => {
                self.pointer = register;
                Ok(())
            }
            [register, value] => {
                if self.fail_register == Some(register) {
                    return Err(MockError::Nack);
                }
                self.store(register, value);
                self.writes.push((address, register, value));
                Ok(())
            }
            _ => Err(MockError::Nack),
        }
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), MockError> {
        if !self.answers(address) {
            return Err(MockError::Nack);
        }
        for byte in buf.iter_mut() {
            *byte = self.regs[self.pointer as usize];
        }
        Ok(())
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), MockError> {
        self.write(address, write_data)?;
        self.read(address, read_buf)
    }
}
