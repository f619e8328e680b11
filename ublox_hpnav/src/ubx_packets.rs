pub mod cfg_val;
mod packets;
mod types;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::{
    constants::{UBX_FRAME_OVERHEAD, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2},
    error::MemWriterError,
    parser::UbxChecksumCalc,
};

pub use packets::*;
pub use types::*;

/// Information about concrete UBX protocol's packet
pub trait UbxPacketMeta {
    const CLASS: u8;
    const ID: u8;
    const FIXED_PAYLOAD_LEN: Option<u16>;
    const MAX_PAYLOAD_LEN: u16;
}

/// Abstraction for buffer creation/reallocation
/// to storing packet
pub trait MemWriter {
    /// make sure that we have at least `len` bytes for writing
    fn reserve_allocate(&mut self, len: usize) -> Result<(), MemWriterError>;
    fn write(&mut self, buf: &[u8]) -> Result<(), MemWriterError>;
}

#[cfg(feature = "alloc")]
impl MemWriter for Vec<u8> {
    fn reserve_allocate(&mut self, len: usize) -> Result<(), MemWriterError> {
        self.reserve(len);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), MemWriterError> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

/// [`MemWriter`] over a caller provided slice, for targets without an allocator
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl MemWriter for SliceWriter<'_> {
    fn reserve_allocate(&mut self, len: usize) -> Result<(), MemWriterError> {
        if self.buf.len() - self.len < len {
            return Err(MemWriterError::NotEnoughMem);
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), MemWriterError> {
        let end = self.len + buf.len();
        if end > self.buf.len() {
            return Err(MemWriterError::NotEnoughMem);
        }
        self.buf[self.len..end].copy_from_slice(buf);
        self.len = end;
        Ok(())
    }
}

/// Writes one frame in pieces, checksumming on the fly so variable sized
/// payloads never need an intermediate buffer.
pub(crate) struct FrameEncoder<'w, W: MemWriter> {
    out: &'w mut W,
    calc: UbxChecksumCalc,
    remaining: usize,
}

impl<'w, W: MemWriter> FrameEncoder<'w, W> {
    pub(crate) fn begin(
        out: &'w mut W,
        class: u8,
        msg_id: u8,
        payload_len: u16,
    ) -> Result<Self, MemWriterError> {
        out.reserve_allocate(usize::from(payload_len) + UBX_FRAME_OVERHEAD)?;
        let len = payload_len.to_le_bytes();
        let header = [class, msg_id, len[0], len[1]];
        out.write(&[UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2])?;
        out.write(&header)?;
        let mut calc = UbxChecksumCalc::new();
        calc.update(&header);
        Ok(Self {
            out,
            calc,
            remaining: usize::from(payload_len),
        })
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<(), MemWriterError> {
        debug_assert!(bytes.len() <= self.remaining, "payload longer than announced");
        self.remaining = self.remaining.saturating_sub(bytes.len());
        self.calc.update(bytes);
        self.out.write(bytes)
    }

    pub(crate) fn finish(self) -> Result<(), MemWriterError> {
        debug_assert_eq!(self.remaining, 0, "payload shorter than announced");
        let (ck_a, ck_b) = self.calc.result();
        self.out.write(&[ck_a, ck_b])
    }
}

/// Frame a fixed size payload into a fixed size array
pub(crate) const fn frame_fixed<const P: usize, const N: usize>(
    class: u8,
    msg_id: u8,
    payload: [u8; P],
) -> [u8; N] {
    assert!(N == P + UBX_FRAME_OVERHEAD);
    let mut ret = [0u8; N];
    let len = (P as u16).to_le_bytes();
    ret[0] = UBX_SYNC_CHAR_1;
    ret[1] = UBX_SYNC_CHAR_2;
    ret[2] = class;
    ret[3] = msg_id;
    ret[4] = len[0];
    ret[5] = len[1];
    let mut calc = UbxChecksumCalc::new();
    let mut i = 2;
    while i < 6 {
        calc.update_byte(ret[i]);
        i += 1;
    }
    let mut i = 0;
    while i < P {
        ret[6 + i] = payload[i];
        calc.update_byte(payload[i]);
        i += 1;
    }
    let (ck_a, ck_b) = calc.result();
    ret[N - 2] = ck_a;
    ret[N - 1] = ck_b;
    ret
}

/// Request specific packet. The receiver answers a frame with an empty
/// payload by sending the current content of that message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UbxPacketRequest {
    req_class: u8,
    req_id: u8,
}

impl UbxPacketRequest {
    pub const PACKET_LEN: usize = UBX_FRAME_OVERHEAD;

    #[inline]
    pub fn request_for<T: UbxPacketMeta>() -> Self {
        Self {
            req_class: T::CLASS,
            req_id: T::ID,
        }
    }

    #[inline]
    pub fn request_for_unknown(req_class: u8, req_id: u8) -> Self {
        Self { req_class, req_id }
    }

    pub fn class(&self) -> u8 {
        self.req_class
    }

    pub fn msg_id(&self) -> u8 {
        self.req_id
    }

    #[inline]
    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        frame_fixed(self.req_class, self.req_id, [])
    }
}

/// Payload of a packet this crate has no decoder for
#[derive(Debug, Clone, Copy)]
pub struct UbxUnknownPacketRef<'a> {
    pub payload: &'a [u8],
    pub class: u8,
    pub msg_id: u8,
}

#[inline]
pub(crate) fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
pub(crate) fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[inline]
pub(crate) fn le_i32(bytes: &[u8], offset: usize) -> i32 {
    le_u32(bytes, offset) as i32
}
