use bitflags::bitflags;

use crate::{
    error::ParserError,
    ubx_packets::{frame_fixed, le_u32, GnssFixType, UbxPacketMeta},
};

use super::check_fixed_len;

/// Receiver Navigation Status
pub struct NavStatus;

impl UbxPacketMeta for NavStatus {
    const CLASS: u8 = 0x01;
    const ID: u8 = 0x03;
    const FIXED_PAYLOAD_LEN: Option<u16> = Some(16);
    const MAX_PAYLOAD_LEN: u16 = 16;
}

bitflags! {
    /// Navigation Status Flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NavStatusFlags: u8 {
        /// position and velocity valid and within DOP and ACC Masks
        const GPS_FIX_OK = 1;
        /// DGPS used
        const DIFF_SOLN = 2;
        /// Week Number valid
        const WKN_SET = 4;
        /// Time of Week valid
        const TOW_SET = 8;
    }
}

/// It is just reference to internal parser's buffer
#[derive(Debug, Clone, Copy)]
pub struct NavStatusRef<'a>(&'a [u8]);

impl<'a> NavStatusRef<'a> {
    /// GPS Millisecond Time of Week
    #[inline]
    pub fn itow(&self) -> u32 {
        le_u32(self.0, 0)
    }

    /// GPSfix Type, this value does not qualify a fix as
    /// valid and within the limits
    #[inline]
    pub fn fix_type(&self) -> GnssFixType {
        // validate() rejected reserved values
        GnssFixType::from_raw(self.0[4]).unwrap_or(GnssFixType::NoFix)
    }

    #[inline]
    pub fn flags(&self) -> NavStatusFlags {
        NavStatusFlags::from_bits_truncate(self.0[5])
    }

    #[inline]
    pub fn fix_ok(&self) -> bool {
        self.flags().contains(NavStatusFlags::GPS_FIX_OK)
    }

    /// Fix Status Information
    #[inline]
    pub fn fix_stat(&self) -> u8 {
        self.0[6]
    }

    /// Further information about navigation output
    #[inline]
    pub fn flags2(&self) -> u8 {
        self.0[7]
    }

    /// Time to first fix (millisecond time tag)
    #[inline]
    pub fn time_to_first_fix(&self) -> u32 {
        le_u32(self.0, 8)
    }

    /// Milliseconds since Startup / Reset
    #[inline]
    pub fn uptime_ms(&self) -> u32 {
        le_u32(self.0, 12)
    }

    fn validate(payload: &[u8]) -> Result<(), ParserError> {
        check_fixed_len::<NavStatus>("NavStatus", payload)?;
        if GnssFixType::from_raw(payload[4]).is_none() {
            return Err(ParserError::InvalidField {
                packet: "NavStatus",
                field: "fix_type",
            });
        }
        Ok(())
    }

    pub(crate) fn from_payload(payload: &'a [u8]) -> Result<Self, ParserError> {
        Self::validate(payload)?;
        Ok(Self(payload))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NavStatusBuilder {
    pub itow: u32,
    pub fix_type: GnssFixType,
    pub flags: NavStatusFlags,
    pub fix_stat: u8,
    pub flags2: u8,
    pub time_to_first_fix: u32,
    pub uptime_ms: u32,
}

impl Default for NavStatusBuilder {
    fn default() -> Self {
        Self {
            itow: 0,
            fix_type: GnssFixType::NoFix,
            flags: NavStatusFlags::empty(),
            fix_stat: 0,
            flags2: 0,
            time_to_first_fix: 0,
            uptime_ms: 0,
        }
    }
}

impl NavStatusBuilder {
    pub const PACKET_LEN: usize = 24;

    pub fn into_packet_bytes(self) -> [u8; Self::PACKET_LEN] {
        let mut payload = [0u8; 16];
        payload[0..4].copy_from_slice(&self.itow.to_le_bytes());
        payload[4] = self.fix_type.into_raw();
        payload[5] = self.flags.bits();
        payload[6] = self.fix_stat;
        payload[7] = self.flags2;
        payload[8..12].copy_from_slice(&self.time_to_first_fix.to_le_bytes());
        payload[12..16].copy_from_slice(&self.uptime_ms.to_le_bytes());
        frame_fixed(NavStatus::CLASS, NavStatus::ID, payload)
    }
}
