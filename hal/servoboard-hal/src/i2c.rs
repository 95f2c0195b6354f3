//! I2C bus abstractions
//!
//! Provides traits for I2C master operations that can be implemented
//! by chip-specific HALs, plus the register-addressed layer that
//! register-mapped peripherals are driven through.

/// General-call address (every device on the bus listens here)
pub const GENERAL_CALL_ADDRESS: u8 = 0x00;

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices. Every operation is blocking: it returns once the
/// transfer has completed or the peripheral failed to acknowledge.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Single-byte register access on a register-mapped peripheral
///
/// Stateless: the device address is passed with every call, so the same
/// bus can serve any number of peripherals.
pub trait RegisterBus {
    /// Error returned when the peripheral does not acknowledge
    type Error;

    /// Write `value` into register `register` of the device at `address`
    fn write_register(&mut self, address: u8, register: u8, value: u8)
        -> Result<(), Self::Error>;

    /// Read register `register` of the device at `address`
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error>;

    /// Send raw bytes without a register index (general-call commands)
    fn write_raw(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<B: I2cBus> RegisterBus for B {
    type Error = B::Error;

    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        self.write(address, &[register, value])
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.write_read(address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn write_raw(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.write(address, bytes)
    }
}
