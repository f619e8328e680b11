/// GNSS fix Type
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GnssFixType {
    NoFix = 0,
    DeadReckoningOnly = 1,
    Fix2D = 2,
    Fix3D = 3,
    GnssPlusDeadReckoning = 4,
    TimeOnlyFix = 5,
}

impl GnssFixType {
    pub const fn into_raw(self) -> u8 {
        self as u8
    }

    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::NoFix),
            1 => Some(Self::DeadReckoningOnly),
            2 => Some(Self::Fix2D),
            3 => Some(Self::Fix3D),
            4 => Some(Self::GnssPlusDeadReckoning),
            5 => Some(Self::TimeOnlyFix),
            _ => None,
        }
    }

    /// Whether the solution carries a horizontal position at all.
    /// `NoFix` and `TimeOnlyFix` leave latitude/longitude meaningless.
    pub const fn has_position(self) -> bool {
        matches!(
            self,
            Self::DeadReckoningOnly | Self::Fix2D | Self::Fix3D | Self::GnssPlusDeadReckoning
        )
    }
}

impl core::fmt::Display for GnssFixType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::NoFix => "no fix",
            Self::DeadReckoningOnly => "dead reckoning",
            Self::Fix2D => "2D",
            Self::Fix3D => "3D",
            Self::GnssPlusDeadReckoning => "GNSS + dead reckoning",
            Self::TimeOnlyFix => "time only",
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn raw_values_round_trip_and_reject_reserved() {
        for raw in 0..=5u8 {
            let fix = GnssFixType::from_raw(raw).unwrap();
            assert_eq!(fix.into_raw(), raw);
        }
        assert_eq!(GnssFixType::from_raw(6), None);
        assert_eq!(GnssFixType::from_raw(0xff), None);
    }

    #[test]
    fn only_positional_fixes_have_position() {
        assert!(!GnssFixType::NoFix.has_position());
        assert!(!GnssFixType::TimeOnlyFix.has_position());
        assert!(GnssFixType::Fix3D.has_position());
        assert!(GnssFixType::DeadReckoningOnly.has_position());
    }
}
