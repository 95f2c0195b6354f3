//! embedded-hal I2C adapter
//!
//! Lets any `embedded_hal::i2c::I2c` implementation (from a chip HAL or a
//! Linux `/dev/i2c-*` wrapper) serve as the driver's bus.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use servoboard_hal::I2cBus;

/// Error from I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cBusError {
    /// Bus error
    Bus,
    /// Arbitration lost
    ArbitrationLost,
    /// NACK received
    Nack,
    /// Overrun
    Overrun,
    /// Other error
    Other,
}

impl From<ErrorKind> for I2cBusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Bus => I2cBusError::Bus,
            ErrorKind::ArbitrationLoss => I2cBusError::ArbitrationLost,
            ErrorKind::NoAcknowledge(_) => I2cBusError::Nack,
            ErrorKind::Overrun => I2cBusError::Overrun,
            _ => I2cBusError::Other,
        }
    }
}

/// [`I2cBus`] over an embedded-hal 1.0 I2C master
pub struct EmbeddedHalBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> EmbeddedHalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the peripheral back
    pub fn into_inner(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> I2cBus for EmbeddedHalBus<I2C> {
    type Error = I2cBusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.i2c
            .write(address, data)
            .map_err(|e| I2cBusError::from(e.kind()))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c
            .read(address, buf)
            .map_err(|e| I2cBusError::from(e.kind()))
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(address, write_data, read_buf)
            .map_err(|e| I2cBusError::from(e.kind()))
    }
}
