use bitflags::bitflags;

use crate::{
    error::ParserError,
    position::{HpCoordinate, HpHeight},
    ubx_packets::{frame_fixed, le_i32, le_u32, UbxPacketMeta},
};

use super::check_fixed_len;

/// High Precision Geodetic Position Solution
pub struct NavHpPosLlh;

impl UbxPacketMeta for NavHpPosLlh {
    const CLASS: u8 = 0x01;
    const ID: u8 = 0x14;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(36);
    const MAX_PAYLOAD_LEN: u16 = 36;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NavHpPosLlhFlags: u8 {
        /// Invalid lon, lat, height, hMSL, lonHp, latHp, heightHp and hMSLHp
        const INVALID_LLH = 0x01;
    }
}

/// Range of the latitude/longitude high precision parts (1e-9 deg)
const COORD_HP_RANGE: core::ops::RangeInclusive<i8> = -99..=99;
/// Range of the height high precision parts (0.1 mm)
const HEIGHT_HP_RANGE: core::ops::RangeInclusive<i8> = -9..=9;

/// It is just reference to internal parser's buffer
#[derive(Debug, Clone, Copy)]
pub struct NavHpPosLlhRef<'a>(&'a [u8]);

impl<'a> NavHpPosLlhRef<'a> {
    /// Message version
    #[inline]
    pub fn version(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn flags(&self) -> NavHpPosLlhFlags {
        NavHpPosLlhFlags::from_bits_truncate(self.0[3])
    }

    /// GPS Millisecond Time of Week
    #[inline]
    pub fn itow(&self) -> u32 {
        le_u32(self.0, 4)
    }

    /// Longitude (deg * 1e-7)
    #[inline]
    pub fn lon(&self) -> i32 {
        le_i32(self.0, 8)
    }

    /// Latitude (deg * 1e-7)
    #[inline]
    pub fn lat(&self) -> i32 {
        le_i32(self.0, 12)
    }

    /// Height above ellipsoid (mm)
    #[inline]
    pub fn height(&self) -> i32 {
        le_i32(self.0, 16)
    }

    /// Height above mean sea level (mm)
    #[inline]
    pub fn height_msl(&self) -> i32 {
        le_i32(self.0, 20)
    }

    /// High precision component of longitude (deg * 1e-9)
    #[inline]
    pub fn lon_hp(&self) -> i8 {
        self.0[24] as i8
    }

    /// High precision component of latitude (deg * 1e-9)
    #[inline]
    pub fn lat_hp(&self) -> i8 {
        self.0[25] as i8
    }

    /// High precision component of height above ellipsoid (0.1 mm)
    #[inline]
    pub fn height_hp(&self) -> i8 {
        self.0[26] as i8
    }

    /// High precision component of height above mean sea level (0.1 mm)
    #[inline]
    pub fn height_msl_hp(&self) -> i8 {
        self.0[27] as i8
    }

    /// Horizontal accuracy estimate (0.1 mm)
    #[inline]
    pub fn horizontal_accuracy(&self) -> u32 {
        le_u32(self.0, 28)
    }

    /// Vertical accuracy estimate (0.1 mm)
    #[inline]
    pub fn vertical_accuracy(&self) -> u32 {
        le_u32(self.0, 32)
    }

    pub fn latitude(&self) -> HpCoordinate {
        HpCoordinate::new(self.lat(), self.lat_hp())
    }

    pub fn longitude(&self) -> HpCoordinate {
        HpCoordinate::new(self.lon(), self.lon_hp())
    }

    pub fn height_ellipsoid(&self) -> HpHeight {
        HpHeight::new(self.height(), self.height_hp())
    }

    pub fn height_above_msl(&self) -> HpHeight {
        HpHeight::new(self.height_msl(), self.height_msl_hp())
    }

    fn validate(payload: &[u8]) -> Result<(), ParserError> {
        check_fixed_len::<NavHpPosLlh>("NavHpPosLlh", payload)?;
        let checks: [(&'static str, i8, &core::ops::RangeInclusive<i8>); 4] = [
            ("lon_hp", payload[24] as i8, &COORD_HP_RANGE),
            ("lat_hp", payload[25] as i8, &COORD_HP_RANGE),
            ("height_hp", payload[26] as i8, &HEIGHT_HP_RANGE),
            ("height_msl_hp", payload[27] as i8, &HEIGHT_HP_RANGE),
        ];
        for (field, value, range) in checks {
            if !range.contains(&value) {
                return Err(ParserError::InvalidField {
                    packet: "NavHpPosLlh",
                    field,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn from_payload(payload: &'a [u8]) -> Result<Self, ParserError> {
        Self::validate(payload)?;
        Ok(Self(payload))
    }
}

/// Builds the frame a receiver answers a NAV-HPPOSLLH poll with
#[derive(Debug, Clone, Copy, Default)]
pub struct NavHpPosLlhBuilder {
    pub version: u8,
    pub flags: u8,
    pub itow: u32,
    pub lon: i32,
    pub lat: i32,
    pub height: i32,
    pub height_msl: i32,
    pub lon_hp: i8,
    pub lat_hp: i8,
    pub height_hp: i8,
    pub height_msl_hp: i8,
    pub horizontal_accuracy: u32,
    pub vertical_accuracy: u32,
}

impl NavHpPosLlhBuilder {
    pub const PACKET_LEN: usize = 44;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        let mut payload = [0u8; 36];
        payload[0] = self.version;
        payload[3] = self.flags;
        payload[4..8].copy_from_slice(&self.itow.to_le_bytes());
        payload[8..12].copy_from_slice(&self.lon.to_le_bytes());
        payload[12..16].copy_from_slice(&self.lat.to_le_bytes());
        payload[16..20].copy_from_slice(&self.height.to_le_bytes());
        payload[20..24].copy_from_slice(&self.height_msl.to_le_bytes());
        payload[24] = self.lon_hp as u8;
        payload[25] = self.lat_hp as u8;
        payload[26] = self.height_hp as u8;
        payload[27] = self.height_msl_hp as u8;
        payload[28..32].copy_from_slice(&self.horizontal_accuracy.to_le_bytes());
        payload[32..36].copy_from_slice(&self.vertical_accuracy.to_le_bytes());
        frame_fixed(NavHpPosLlh::CLASS, NavHpPosLlh::ID, payload)
    }
}
