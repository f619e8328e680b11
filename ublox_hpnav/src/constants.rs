pub const UBX_SYNC_CHAR_1: u8 = 0xb5;
pub const UBX_SYNC_CHAR_2: u8 = 0x62;
pub(crate) const UBX_SYNC_SIZE: usize = 2;
pub(crate) const UBX_PAYLOAD_SIZE_LEN: usize = 2;
pub(crate) const UBX_CLASS_LEN: usize = 1;
pub(crate) const UBX_ID_LEN: usize = 1;
pub(crate) const UBX_HEADER_LEN: usize =
    UBX_SYNC_SIZE + UBX_PAYLOAD_SIZE_LEN + UBX_CLASS_LEN + UBX_ID_LEN;
pub(crate) const UBX_CHECKSUM_LEN: usize = 2;

/// Bytes wrapped around every payload: header plus checksum
pub const UBX_FRAME_OVERHEAD: usize = UBX_HEADER_LEN + UBX_CHECKSUM_LEN;

pub(crate) const UBX_CLASS_OFFSET: usize = 2; // After SYNC_CHAR_1, SYNC_CHAR_2
pub(crate) const UBX_MSG_ID_OFFSET: usize = 3; // After CLASS
pub(crate) const UBX_LENGTH_OFFSET: usize = 4; // After MSG_ID

/// Size of the parser's fixed buffer. Large enough for every message this
/// crate exchanges with the receiver, with room for interleaved traffic.
pub const PARSER_BUFFER_LEN: usize = 512;

/// Largest payload the parser accepts, anything longer is treated as noise
pub const MAX_PAYLOAD_LEN: usize = PARSER_BUFFER_LEN - UBX_FRAME_OVERHEAD;

/// Default 7-bit I2C (DDC) address of u-blox receivers
pub const DEFAULT_I2C_ADDRESS: u8 = 0x42;

/// DDC register holding the high byte of the number of bytes available
pub(crate) const DDC_BYTES_AVAILABLE_REG: u8 = 0xfd;
/// DDC register streaming the receiver output
pub(crate) const DDC_DATA_STREAM_REG: u8 = 0xff;

/// Upper bound for the navigation rate the session agrees to configure.
/// Beyond it the measurement period drops under [`MIN_MEAS_RATE_MS`].
pub const MAX_NAV_RATE_HZ: u16 = 40;
/// Shortest measurement period the receiver accepts (ms)
pub const MIN_MEAS_RATE_MS: u16 = 25;
