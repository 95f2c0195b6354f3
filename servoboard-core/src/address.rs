//! I2C addressing for the PCA9685
//!
//! Addresses are 7-bit. The address registers (ALLCALLADR, SUBADRx) hold
//! the address in bits 7:1, so they are written shifted left by one.

/// Power-on all-call address (0xE0 in 8-bit form); every PCA9685 on the
/// bus answers it until ALLCALL is disabled
pub const ALL_CALL_ADDRESS: u8 = 0x70;

/// Addresses `0000xxx` and `1111xxx` are reserved by the I2C specification
pub const fn is_reserved(address: u8) -> bool {
    address <= 0x07 || address >= 0x78
}

/// Value to store in an address register for `address`
pub const fn register_form(address: u8) -> u8 {
    address << 1
}
