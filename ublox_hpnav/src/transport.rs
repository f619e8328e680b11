//! Byte level access to the receiver.
//!
//! The session only needs to push complete frames and pull whatever the
//! receiver has queued, so the transport deals in raw bytes and knows
//! nothing about UBX.

mod ddc;

pub use ddc::DdcTransport;

/// Receiver interface a transport is connected to. Output protocol
/// selection is configured per interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPort {
    I2c,
    Uart1,
}

/// A method of communicating with the receiver
pub trait UbxTransport {
    /// Interface associated error type
    type Error: core::fmt::Debug;

    /// Prepare the bus for use
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Check whether a receiver answers at the configured address.
    /// A missing device is `Ok(false)`, not an error.
    fn probe(&mut self) -> Result<bool, Self::Error>;

    /// Send one complete frame
    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Copy queued receiver output into `buf` without waiting for more.
    /// Returns the number of bytes read, zero if nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Interface of the receiver this transport talks to
    fn output_port(&self) -> OutputPort {
        OutputPort::I2c
    }
}

impl<T: UbxTransport + ?Sized> UbxTransport for &mut T {
    type Error = T::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        (**self).open()
    }

    fn probe(&mut self) -> Result<bool, Self::Error> {
        (**self).probe()
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        (**self).write(frame)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }

    fn output_port(&self) -> OutputPort {
        (**self).output_port()
    }
}
