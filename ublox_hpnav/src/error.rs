use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemWriterError {
    NotEnoughMem,
}

impl fmt::Display for MemWriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemWriterError::NotEnoughMem => f.write_str("Not enough memory error"),
        }
    }
}

impl core::error::Error for MemWriterError {}

/// Error that possible during packets parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserError {
    InvalidChecksum {
        expect: u16,
        got: u16,
    },
    InvalidField {
        packet: &'static str,
        field: &'static str,
    },
    InvalidPacketLen {
        packet: &'static str,
        expect: usize,
        got: usize,
    },
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::InvalidChecksum { expect, got } => write!(
                f,
                "Not valid packet's checksum, expect {:x}, got {:x}",
                expect, got
            ),
            ParserError::InvalidField { packet, field } => {
                write!(f, "Invalid field {} of packet {}", field, packet)
            },
            ParserError::InvalidPacketLen {
                packet,
                expect,
                got,
            } => write!(
                f,
                "Invalid packet({}) length, expect {}, got {}",
                packet, expect, got
            ),
        }
    }
}

impl core::error::Error for ParserError {}

/// Reasons a session could not be brought up. Every variant is fatal for the
/// position subsystem: no [`Session`](crate::Session) exists afterwards.
#[derive(Debug)]
pub enum InitError<E> {
    /// The bus could not be opened
    Open(E),
    /// The bus failed while probing the receiver address
    Probe(E),
    /// Nothing acknowledged the receiver address
    NotFound,
}

impl<E: fmt::Debug> fmt::Display for InitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Open(e) => write!(f, "unable to open bus: {:?}", e),
            InitError::Probe(e) => write!(f, "bus error while probing receiver: {:?}", e),
            InitError::NotFound => f.write_str("GNSS receiver not detected on the bus"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for InitError<E> {}

/// Failures of configuration requests (output protocol, navigation rate).
/// None of them alter the rate the session considers active.
#[derive(Debug)]
pub enum ConfigError<E> {
    /// The requested rate is out of range or was rejected by the receiver
    RateUnsupported { hz: u16 },
    /// Reading back the configuration failed or returned an unrecognized report
    ReadFailed,
    /// The receiver answered the request with UBX-ACK-NAK
    Nak { class: u8, msg_id: u8 },
    /// No acknowledge arrived within the configured timeout
    AckTimeout { class: u8, msg_id: u8 },
    /// Request did not fit in the frame buffer
    Encode(MemWriterError),
    Bus(E),
}

impl<E: fmt::Debug> fmt::Display for ConfigError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RateUnsupported { hz } => {
                write!(f, "navigation rate of {} Hz is not supported", hz)
            },
            ConfigError::ReadFailed => f.write_str("failed to read navigation rate"),
            ConfigError::Nak { class, msg_id } => {
                write!(f, "request {:#04x}/{:#04x} rejected (NAK)", class, msg_id)
            },
            ConfigError::AckTimeout { class, msg_id } => write!(
                f,
                "timed out waiting for ACK of {:#04x}/{:#04x}",
                class, msg_id
            ),
            ConfigError::Encode(e) => write!(f, "unable to encode request: {}", e),
            ConfigError::Bus(e) => write!(f, "bus error: {:?}", e),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ConfigError<E> {}

impl<E> From<MemWriterError> for ConfigError<E> {
    fn from(e: MemWriterError) -> Self {
        ConfigError::Encode(e)
    }
}
