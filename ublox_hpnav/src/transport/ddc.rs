use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::constants::{DDC_BYTES_AVAILABLE_REG, DDC_DATA_STREAM_REG, DEFAULT_I2C_ADDRESS};

use super::UbxTransport;

/// Receiver attached through its I2C compatible DDC port.
///
/// The receiver exposes the number of pending output bytes in registers
/// 0xFD (high byte) and 0xFE (low byte) and streams them from register 0xFF.
/// Writes go straight to the device address.
pub struct DdcTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> DdcTransport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Transport using the factory default address 0x42
    pub fn new_default(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_I2C_ADDRESS)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn bytes_available(&mut self) -> Result<usize, I2C::Error> {
        let mut len = [0u8; 2];
        self.i2c
            .write_read(self.address, &[DDC_BYTES_AVAILABLE_REG], &mut len)?;
        Ok(usize::from(u16::from_be_bytes(len)))
    }
}

impl<I2C: I2c> UbxTransport for DdcTransport<I2C> {
    type Error = I2C::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        // the HAL hands out an initialized bus
        Ok(())
    }

    fn probe(&mut self) -> Result<bool, Self::Error> {
        match self.i2c.write(self.address, &[]) {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, frame)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let available = self.bytes_available()?;
        let len = core::cmp::min(available, buf.len());
        if len == 0 {
            return Ok(0);
        }
        self.i2c
            .write_read(self.address, &[DDC_DATA_STREAM_REG], &mut buf[..len])?;
        Ok(len)
    }
}
