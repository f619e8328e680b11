mod ack;
mod cfg_val;
mod nav_hp_pos_llh;
mod nav_status;

pub use ack::*;
pub use cfg_val::*;
pub use nav_hp_pos_llh::*;
pub use nav_status::*;

use super::{UbxPacketMeta, UbxPacketRequest, UbxUnknownPacketRef};
use crate::error::ParserError;

/// Packet the parser recognized, borrowing its payload from the parser buffer
#[derive(Debug)]
pub enum PacketRef<'a> {
    AckAck(AckAckRef<'a>),
    AckNak(AckNakRef<'a>),
    NavHpPosLlh(NavHpPosLlhRef<'a>),
    NavStatus(NavStatusRef<'a>),
    CfgValSet(CfgValSetRef<'a>),
    CfgValGet(CfgValGetRef<'a>),
    /// Frame without payload: a poll request for the named message
    PollRequest(UbxPacketRequest),
    Unknown(UbxUnknownPacketRef<'a>),
}

impl PacketRef<'_> {
    pub fn class_and_msg_id(&self) -> (u8, u8) {
        match self {
            Self::AckAck(_) => (AckAck::CLASS, AckAck::ID),
            Self::AckNak(_) => (AckNak::CLASS, AckNak::ID),
            Self::NavHpPosLlh(_) => (NavHpPosLlh::CLASS, NavHpPosLlh::ID),
            Self::NavStatus(_) => (NavStatus::CLASS, NavStatus::ID),
            Self::CfgValSet(_) => (CfgValSet::CLASS, CfgValSet::ID),
            Self::CfgValGet(_) => (CfgValGet::CLASS, CfgValGet::ID),
            Self::PollRequest(req) => (req.class(), req.msg_id()),
            Self::Unknown(unknown) => (unknown.class, unknown.msg_id),
        }
    }
}

pub(crate) fn match_packet(
    class: u8,
    msg_id: u8,
    payload: &[u8],
) -> Result<PacketRef<'_>, ParserError> {
    if payload.is_empty() {
        return Ok(PacketRef::PollRequest(
            UbxPacketRequest::request_for_unknown(class, msg_id),
        ));
    }
    match (class, msg_id) {
        (AckAck::CLASS, AckAck::ID) => AckAckRef::from_payload(payload).map(PacketRef::AckAck),
        (AckNak::CLASS, AckNak::ID) => AckNakRef::from_payload(payload).map(PacketRef::AckNak),
        (NavHpPosLlh::CLASS, NavHpPosLlh::ID) => {
            NavHpPosLlhRef::from_payload(payload).map(PacketRef::NavHpPosLlh)
        },
        (NavStatus::CLASS, NavStatus::ID) => {
            NavStatusRef::from_payload(payload).map(PacketRef::NavStatus)
        },
        (CfgValSet::CLASS, CfgValSet::ID) => {
            CfgValSetRef::from_payload(payload).map(PacketRef::CfgValSet)
        },
        (CfgValGet::CLASS, CfgValGet::ID) => {
            CfgValGetRef::from_payload(payload).map(PacketRef::CfgValGet)
        },
        _ => Ok(PacketRef::Unknown(UbxUnknownPacketRef {
            payload,
            class,
            msg_id,
        })),
    }
}

pub(crate) fn check_fixed_len<T: UbxPacketMeta>(
    packet: &'static str,
    payload: &[u8],
) -> Result<(), ParserError> {
    let expect = usize::from(T::FIXED_PAYLOAD_LEN.unwrap_or(T::MAX_PAYLOAD_LEN));
    if payload.len() != expect {
        return Err(ParserError::InvalidPacketLen {
            packet,
            expect,
            got: payload.len(),
        });
    }
    Ok(())
}
