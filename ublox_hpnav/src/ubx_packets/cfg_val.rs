//! Configuration items of the receiver's key/value configuration interface
//! (CFG-VALSET / CFG-VALGET) used by this crate.

/// 32-bit configuration key ID. Bits 28..30 encode the size of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfgKey(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageSize {
    OneBit,
    OneByte,
    TwoBytes,
    FourBytes,
    EightBytes,
}

impl StorageSize {
    pub const fn to_usize(self) -> usize {
        match self {
            Self::OneBit | Self::OneByte => 1,
            Self::TwoBytes => 2,
            Self::FourBytes => 4,
            Self::EightBytes => 8,
        }
    }
}

impl CfgKey {
    pub(crate) const SIZE: usize = 4;

    /// Nominal time between GNSS measurements (ms)
    pub const RATE_MEAS: CfgKey = CfgKey(0x3021_0001);
    /// Ratio of number of measurements to number of navigation solutions
    pub const RATE_NAV: CfgKey = CfgKey(0x3021_0002);
    /// Flag to indicate if UBX should be an output protocol on I2C
    pub const I2COUTPROT_UBX: CfgKey = CfgKey(0x1072_0001);
    /// Flag to indicate if NMEA should be an output protocol on I2C
    pub const I2COUTPROT_NMEA: CfgKey = CfgKey(0x1072_0002);
    /// Flag to indicate if UBX should be an output protocol on UART1
    pub const UART1OUTPROT_UBX: CfgKey = CfgKey(0x1074_0001);
    /// Flag to indicate if NMEA should be an output protocol on UART1
    pub const UART1OUTPROT_NMEA: CfgKey = CfgKey(0x1074_0002);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    /// `None` for the size codes the interface leaves reserved
    pub const fn value_size(self) -> Option<StorageSize> {
        match (self.0 >> 28) & 0b111 {
            1 => Some(StorageSize::OneBit),
            2 => Some(StorageSize::OneByte),
            3 => Some(StorageSize::TwoBytes),
            4 => Some(StorageSize::FourBytes),
            5 => Some(StorageSize::EightBytes),
            _ => None,
        }
    }

    pub const fn group_id(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn item_id(self) -> u8 {
        self.0 as u8
    }
}

/// Longest encoded key/value pair: key plus an 8 byte value
pub(crate) const MAX_CFG_VAL_LEN: usize = CfgKey::SIZE + 8;

/// One configuration item together with its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CfgVal {
    RateMeas(u16),
    RateNav(u16),
    I2cOutProtUbx(bool),
    I2cOutProtNmea(bool),
    Uart1OutProtUbx(bool),
    Uart1OutProtNmea(bool),
    /// Item this crate does not interpret, value zero extended
    Other { key: CfgKey, value: u64 },
}

impl CfgVal {
    pub const fn key(&self) -> CfgKey {
        match self {
            Self::RateMeas(_) => CfgKey::RATE_MEAS,
            Self::RateNav(_) => CfgKey::RATE_NAV,
            Self::I2cOutProtUbx(_) => CfgKey::I2COUTPROT_UBX,
            Self::I2cOutProtNmea(_) => CfgKey::I2COUTPROT_NMEA,
            Self::Uart1OutProtUbx(_) => CfgKey::UART1OUTPROT_UBX,
            Self::Uart1OutProtNmea(_) => CfgKey::UART1OUTPROT_NMEA,
            Self::Other { key, .. } => *key,
        }
    }

    /// Encoded length (key + value), `None` if the key carries a reserved size
    pub const fn len(&self) -> Option<usize> {
        match self.key().value_size() {
            Some(size) => Some(CfgKey::SIZE + size.to_usize()),
            None => None,
        }
    }

    fn raw_value(&self) -> u64 {
        match *self {
            Self::RateMeas(v) | Self::RateNav(v) => u64::from(v),
            Self::I2cOutProtUbx(v)
            | Self::I2cOutProtNmea(v)
            | Self::Uart1OutProtUbx(v)
            | Self::Uart1OutProtNmea(v) => u64::from(v),
            Self::Other { value, .. } => value,
        }
    }

    /// Key followed by the little endian value, returns the used length
    pub(crate) fn encode(&self) -> Option<([u8; MAX_CFG_VAL_LEN], usize)> {
        let len = self.len()?;
        let mut buf = [0u8; MAX_CFG_VAL_LEN];
        buf[..CfgKey::SIZE].copy_from_slice(&self.key().id().to_le_bytes());
        buf[CfgKey::SIZE..len]
            .copy_from_slice(&self.raw_value().to_le_bytes()[..len - CfgKey::SIZE]);
        Some((buf, len))
    }

    /// Decode the key/value pair at the start of `data`
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < CfgKey::SIZE {
            return None;
        }
        let key = CfgKey::new(u32::from_le_bytes([data[0], data[1], data[2], data[3]]));
        let size = key.value_size()?.to_usize();
        let value = data.get(CfgKey::SIZE..CfgKey::SIZE + size)?;
        let mut raw = [0u8; 8];
        raw[..size].copy_from_slice(value);
        let raw = u64::from_le_bytes(raw);

        Some(match key {
            CfgKey::RATE_MEAS => Self::RateMeas(raw as u16),
            CfgKey::RATE_NAV => Self::RateNav(raw as u16),
            CfgKey::I2COUTPROT_UBX => Self::I2cOutProtUbx(raw != 0),
            CfgKey::I2COUTPROT_NMEA => Self::I2cOutProtNmea(raw != 0),
            CfgKey::UART1OUTPROT_UBX => Self::Uart1OutProtUbx(raw != 0),
            CfgKey::UART1OUTPROT_NMEA => Self::Uart1OutProtNmea(raw != 0),
            key => Self::Other { key, value: raw },
        })
    }
}

/// Iterator over the key/value pairs of a CFG-VALSET or CFG-VALGET payload
#[derive(Debug, Clone)]
pub struct CfgValIter<'a> {
    data: &'a [u8],
}

impl<'a> CfgValIter<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl core::iter::Iterator for CfgValIter<'_> {
    type Item = CfgVal;

    fn next(&mut self) -> Option<Self::Item> {
        let cfg_val = CfgVal::parse(self.data)?;
        // parse() only succeeds when len() is known and fits in data
        let len = cfg_val.len()?;
        self.data = &self.data[len..];
        Some(cfg_val)
    }
}

/// Iterator over the bare keys of a CFG-VALGET poll request
#[derive(Debug, Clone)]
pub struct CfgKeyIter<'a> {
    data: &'a [u8],
}

impl<'a> CfgKeyIter<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl core::iter::Iterator for CfgKeyIter<'_> {
    type Item = CfgKey;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < CfgKey::SIZE {
            return None;
        }
        let (key, rest) = self.data.split_at(CfgKey::SIZE);
        self.data = rest;
        Some(CfgKey::new(u32::from_le_bytes([key[0], key[1], key[2], key[3]])))
    }
}
