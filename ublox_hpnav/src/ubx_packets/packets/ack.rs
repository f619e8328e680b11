use crate::{
    error::ParserError,
    ubx_packets::{frame_fixed, UbxPacketMeta},
};

use super::check_fixed_len;

/// Message Acknowledged
pub struct AckAck;

impl UbxPacketMeta for AckAck {
    const CLASS: u8 = 0x05;
    const ID: u8 = 0x01;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(2);
    const MAX_PAYLOAD_LEN: u16 = 2;
}

/// Message Not-Acknowledge
pub struct AckNak;

impl UbxPacketMeta for AckNak {
    const CLASS: u8 = 0x05;
    const ID: u8 = 0x00;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(2);
    const MAX_PAYLOAD_LEN: u16 = 2;
}

/// It is just reference to internal parser's buffer
#[derive(Debug, Clone, Copy)]
pub struct AckAckRef<'a>(&'a [u8]);

impl<'a> AckAckRef<'a> {
    /// Class ID of the Acknowledged Message
    #[inline]
    pub fn class(&self) -> u8 {
        self.0[0]
    }

    /// Message ID of the Acknowledged Message
    #[inline]
    pub fn msg_id(&self) -> u8 {
        self.0[1]
    }

    pub fn is_ack_for<T: UbxPacketMeta>(&self) -> bool {
        self.class() == T::CLASS && self.msg_id() == T::ID
    }

    fn validate(payload: &[u8]) -> Result<(), ParserError> {
        check_fixed_len::<AckAck>("AckAck", payload)
    }

    pub(crate) fn from_payload(payload: &'a [u8]) -> Result<Self, ParserError> {
        Self::validate(payload)?;
        Ok(Self(payload))
    }
}

/// It is just reference to internal parser's buffer
#[derive(Debug, Clone, Copy)]
pub struct AckNakRef<'a>(&'a [u8]);

impl<'a> AckNakRef<'a> {
    /// Class ID of the Not-Acknowledged Message
    #[inline]
    pub fn class(&self) -> u8 {
        self.0[0]
    }

    /// Message ID of the Not-Acknowledged Message
    #[inline]
    pub fn msg_id(&self) -> u8 {
        self.0[1]
    }

    pub fn is_nak_for<T: UbxPacketMeta>(&self) -> bool {
        self.class() == T::CLASS && self.msg_id() == T::ID
    }

    fn validate(payload: &[u8]) -> Result<(), ParserError> {
        check_fixed_len::<AckNak>("AckNak", payload)
    }

    pub(crate) fn from_payload(payload: &'a [u8]) -> Result<Self, ParserError> {
        Self::validate(payload)?;
        Ok(Self(payload))
    }
}

/// Builder for the acknowledge a receiver sends back
#[derive(Debug, Clone, Copy)]
pub struct AckAckBuilder {
    pub class: u8,
    pub msg_id: u8,
}

impl AckAckBuilder {
    pub const PACKET_LEN: usize = 10;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        frame_fixed(AckAck::CLASS, AckAck::ID, [self.class, self.msg_id])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AckNakBuilder {
    pub class: u8,
    pub msg_id: u8,
}

impl AckNakBuilder {
    pub const PACKET_LEN: usize = 10;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        frame_fixed(AckNak::CLASS, AckNak::ID, [self.class, self.msg_id])
    }
}
