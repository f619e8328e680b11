use std::time::{Duration, Instant};

use log::debug;
use serialport::SerialPort;
use ublox_hpnav::{
    constants::{UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2},
    NavStatus, OutputPort, UbxPacketRequest, UbxTransport,
};

/// How long the receiver gets to answer the presence check
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Receiver wired to a UART or USB port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// `port` should have a short timeout, reads must not stall the loop
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Reads the serial port, converting timeouts into "no data received"
    fn read_port(&mut self, output: &mut [u8]) -> std::io::Result<usize> {
        match self.port.read(output) {
            Ok(b) => Ok(b),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}

impl UbxTransport for SerialTransport {
    type Error = std::io::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        self.port.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }

    /// A serial line has no addressing: poll NAV-STATUS and look for any
    /// UBX sync sequence in the answer
    fn probe(&mut self) -> Result<bool, Self::Error> {
        self.port
            .write_all(&UbxPacketRequest::request_for::<NavStatus>().into_packet_bytes())?;
        let start = Instant::now();
        let mut prev = 0u8;
        let mut buf = [0u8; 64];
        while start.elapsed() < PROBE_TIMEOUT {
            let n = self.read_port(&mut buf)?;
            for byte in &buf[..n] {
                if prev == UBX_SYNC_CHAR_1 && *byte == UBX_SYNC_CHAR_2 {
                    return Ok(true);
                }
                prev = *byte;
            }
        }
        debug!("No UBX traffic within {:?}", PROBE_TIMEOUT);
        Ok(false)
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(frame)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.port.bytes_to_read()? == 0 {
            return Ok(0);
        }
        self.read_port(buf)
    }

    fn output_port(&self) -> OutputPort {
        OutputPort::Uart1
    }
}
