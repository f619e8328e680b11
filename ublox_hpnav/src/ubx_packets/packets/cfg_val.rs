use bitflags::bitflags;

use crate::{
    error::{MemWriterError, ParserError},
    ubx_packets::{
        cfg_val::{CfgKey, CfgKeyIter, CfgVal, CfgValIter},
        le_u16, FrameEncoder, MemWriter, UbxPacketMeta,
    },
};

/// Both messages start with version, layer(s) and a two byte field
const CFG_VAL_HEADER_LEN: usize = 4;

/// A request or response may carry at most 64 items
pub const MAX_CFG_KEYS: usize = 64;

/// Sets values corresponding to provided key-value pairs
pub struct CfgValSet;

impl UbxPacketMeta for CfgValSet {
    const CLASS: u8 = 0x06;
    const ID: u8 = 0x8a;
    const FIXED_PAYLOAD_LEN: Option<u16> = None;
    const MAX_PAYLOAD_LEN: u16 = 772; // 4 + (4 + 8) * 64
}

/// Get configuration items. Version 0 is the poll request, version 1 the
/// receiver's response.
pub struct CfgValGet;

impl UbxPacketMeta for CfgValGet {
    const CLASS: u8 = 0x06;
    const ID: u8 = 0x8b;
    const FIXED_PAYLOAD_LEN: Option<u16> = None;
    const MAX_PAYLOAD_LEN: u16 = 772;
}

bitflags! {
    /// A mask describing where configuration is applied.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CfgLayerSet: u8 {
        const RAM = 0b001;
        const BBR = 0b010;
        const FLASH = 0b100;
    }
}

impl Default for CfgLayerSet {
    fn default() -> Self {
        Self::RAM | Self::BBR | Self::FLASH
    }
}

/// The configuration layer to read from. The configuration is stacked, so
/// an item may be empty for a particular layer and the receiver answers NAK.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CfgLayerGet {
    /// Read from RAM
    Ram = 0,
    /// Read from BBR (battery backed RAM)
    Bbr = 1,
    /// Read from Flash, if available
    Flash = 2,
    /// Read the current configuration from the active source
    Default = 7,
}

impl CfgLayerGet {
    pub const fn into_raw(self) -> u8 {
        self as u8
    }

    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Ram),
            1 => Some(Self::Bbr),
            2 => Some(Self::Flash),
            7 => Some(Self::Default),
            _ => None,
        }
    }
}

fn encoded_len(cfg_data: &[CfgVal]) -> Result<u16, MemWriterError> {
    let mut len = CFG_VAL_HEADER_LEN;
    for cfg_val in cfg_data {
        len += cfg_val.len().ok_or(MemWriterError::NotEnoughMem)?;
    }
    u16::try_from(len).map_err(|_| MemWriterError::NotEnoughMem)
}

fn push_values<W: MemWriter>(
    encoder: &mut FrameEncoder<'_, W>,
    cfg_data: &[CfgVal],
) -> Result<(), MemWriterError> {
    for cfg_val in cfg_data {
        let (buf, len) = cfg_val.encode().ok_or(MemWriterError::NotEnoughMem)?;
        encoder.push(&buf[..len])?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct CfgValSetBuilder<'a> {
    pub version: u8,
    pub layers: CfgLayerSet,
    pub cfg_data: &'a [CfgVal],
}

impl CfgValSetBuilder<'_> {
    pub fn extend_to<W: MemWriter>(&self, out: &mut W) -> Result<(), MemWriterError> {
        if self.cfg_data.len() > MAX_CFG_KEYS {
            return Err(MemWriterError::NotEnoughMem);
        }
        let payload_len = encoded_len(self.cfg_data)?;
        let mut encoder = FrameEncoder::begin(out, CfgValSet::CLASS, CfgValSet::ID, payload_len)?;
        encoder.push(&[self.version, self.layers.bits(), 0, 0])?;
        push_values(&mut encoder, self.cfg_data)?;
        encoder.finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CfgValGetRequestBuilder<'a> {
    pub version: u8,
    pub layer: CfgLayerGet,
    /// Number of items to skip before returning results
    pub position: u16,
    pub cfg_keys: &'a [CfgKey],
}

impl CfgValGetRequestBuilder<'_> {
    pub fn extend_to<W: MemWriter>(&self, out: &mut W) -> Result<(), MemWriterError> {
        if self.cfg_keys.len() > MAX_CFG_KEYS {
            return Err(MemWriterError::NotEnoughMem);
        }
        let payload_len = (CFG_VAL_HEADER_LEN + self.cfg_keys.len() * CfgKey::SIZE) as u16;
        let mut encoder = FrameEncoder::begin(out, CfgValGet::CLASS, CfgValGet::ID, payload_len)?;
        let position = self.position.to_le_bytes();
        encoder.push(&[self.version, self.layer.into_raw(), position[0], position[1]])?;
        for key in self.cfg_keys {
            encoder.push(&key.id().to_le_bytes())?;
        }
        encoder.finish()
    }
}

/// What a receiver sends back for a CFG-VALGET poll
#[derive(Debug, Clone, Copy)]
pub struct CfgValGetResponseBuilder<'a> {
    pub layer: CfgLayerGet,
    pub position: u16,
    pub cfg_data: &'a [CfgVal],
}

impl CfgValGetResponseBuilder<'_> {
    pub fn extend_to<W: MemWriter>(&self, out: &mut W) -> Result<(), MemWriterError> {
        let payload_len = encoded_len(self.cfg_data)?;
        let mut encoder = FrameEncoder::begin(out, CfgValGet::CLASS, CfgValGet::ID, payload_len)?;
        let position = self.position.to_le_bytes();
        encoder.push(&[1, self.layer.into_raw(), position[0], position[1]])?;
        push_values(&mut encoder, self.cfg_data)?;
        encoder.finish()
    }
}

fn check_header(packet: &'static str, payload: &[u8]) -> Result<(), ParserError> {
    if payload.len() < CFG_VAL_HEADER_LEN {
        return Err(ParserError::InvalidPacketLen {
            packet,
            expect: CFG_VAL_HEADER_LEN,
            got: payload.len(),
        });
    }
    Ok(())
}

/// It is just reference to internal parser's buffer
#[derive(Debug, Clone, Copy)]
pub struct CfgValSetRef<'a>(&'a [u8]);

impl<'a> CfgValSetRef<'a> {
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn layers(&self) -> CfgLayerSet {
        CfgLayerSet::from_bits_truncate(self.0[1])
    }

    pub fn values(&self) -> CfgValIter<'a> {
        CfgValIter::new(&self.0[CFG_VAL_HEADER_LEN..])
    }

    pub(crate) fn from_payload(payload: &'a [u8]) -> Result<Self, ParserError> {
        check_header("CfgValSet", payload)?;
        Ok(Self(payload))
    }
}

/// It is just reference to internal parser's buffer
#[derive(Debug, Clone, Copy)]
pub struct CfgValGetRef<'a>(&'a [u8]);

impl<'a> CfgValGetRef<'a> {
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    /// Raw layer byte, see [`CfgLayerGet`]
    #[inline]
    pub fn layer_raw(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn layer(&self) -> Option<CfgLayerGet> {
        CfgLayerGet::from_raw(self.0[1])
    }

    #[inline]
    pub fn position(&self) -> u16 {
        le_u16(self.0, 2)
    }

    pub fn is_response(&self) -> bool {
        self.version() == 1
    }

    /// Keys of a poll request
    pub fn keys(&self) -> CfgKeyIter<'a> {
        CfgKeyIter::new(&self.0[CFG_VAL_HEADER_LEN..])
    }

    /// Key/value pairs of a response
    pub fn values(&self) -> CfgValIter<'a> {
        CfgValIter::new(&self.0[CFG_VAL_HEADER_LEN..])
    }

    pub(crate) fn from_payload(payload: &'a [u8]) -> Result<Self, ParserError> {
        check_header("CfgValGet", payload)?;
        Ok(Self(payload))
    }
}
