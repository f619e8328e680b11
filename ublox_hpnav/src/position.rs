//! Exact representation of the receiver's split coordinates and the fix
//! record handed to the control loop.
//!
//! Latitude and longitude arrive as a standard part in 1e-7 degrees plus a
//! high precision part in 1e-9 degrees. Both are combined in integer
//! nanodegrees, `standard * 100 + hp`, so no precision is lost on targets
//! without a 64-bit FPU. Floating point conversions are only offered as a
//! convenience on top.

use core::fmt;

use crate::ubx_packets::{GnssFixType, NavHpPosLlhFlags, NavHpPosLlhRef, NavStatusRef};

const NANODEG_PER_DEG: i64 = 1_000_000_000;
const HP_PER_STANDARD: i64 = 100;

/// Latitude or longitude as reported by NAV-HPPOSLLH.
///
/// The `hp` part only refines `standard` and is meaningless alone. Its sign
/// is not required to match the sign of `standard`, the two scaled values
/// are simply summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HpCoordinate {
    /// degrees * 1e-7
    pub standard: i32,
    /// degrees * 1e-9, -99..=99
    pub hp: i8,
}

/// Coordinate split into parts that print without any rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDegrees {
    pub negative: bool,
    pub whole: u32,
    /// Fractional part, 0..1_000_000_000
    pub nanodegrees: u32,
}

impl HpCoordinate {
    pub const fn new(standard: i32, hp: i8) -> Self {
        Self { standard, hp }
    }

    /// Exact value in integer nanodegrees
    pub const fn nanodegrees(&self) -> i64 {
        self.standard as i64 * HP_PER_STANDARD + self.hp as i64
    }

    /// Inverse of [`HpCoordinate::nanodegrees`], producing the canonical
    /// split where `hp` carries the sign of the whole value. `None` if the
    /// value does not fit the standard part.
    pub fn from_nanodegrees(nanodeg: i64) -> Option<Self> {
        let standard = i32::try_from(nanodeg / HP_PER_STANDARD).ok()?;
        // |rem| <= 99
        let hp = (nanodeg % HP_PER_STANDARD) as i8;
        Some(Self { standard, hp })
    }

    /// Degrees as `f64`. The conversion is correctly rounded, values closer
    /// together than 1e-9 degrees only collapse beyond `f64` precision.
    pub fn degrees(&self) -> f64 {
        self.nanodegrees() as f64 / NANODEG_PER_DEG as f64
    }

    /// Degrees as `f32` for targets with single precision floats only.
    /// Resolution is limited to about 1e-6 degrees; compare and store
    /// [`HpCoordinate::nanodegrees`] instead.
    pub fn degrees_f32(&self) -> f32 {
        let whole = self.standard / 10_000_000;
        let frac = self.standard % 10_000_000;
        whole as f32 + (frac as f32 + f32::from(self.hp) / 100.0) / 1e7
    }

    pub fn split(&self) -> SplitDegrees {
        let nanodeg = self.nanodegrees();
        let abs = nanodeg.unsigned_abs();
        SplitDegrees {
            negative: nanodeg < 0,
            whole: (abs / NANODEG_PER_DEG as u64) as u32,
            nanodegrees: (abs % NANODEG_PER_DEG as u64) as u32,
        }
    }
}

/// Prints the exact value with nine decimals, e.g. `-0.000000005`
impl fmt::Display for HpCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let split = self.split();
        if split.negative {
            f.write_str("-")?;
        }
        write!(f, "{}.{:09}", split.whole, split.nanodegrees)
    }
}

/// Height as reported by NAV-HPPOSLLH: millimeters plus a 0.1 mm refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HpHeight {
    pub mm: i32,
    /// 0.1 mm, -9..=9
    pub hp: i8,
}

impl HpHeight {
    pub const fn new(mm: i32, hp: i8) -> Self {
        Self { mm, hp }
    }

    pub const fn tenths_of_mm(&self) -> i64 {
        self.mm as i64 * 10 + self.hp as i64
    }

    pub fn meters(&self) -> f64 {
        self.tenths_of_mm() as f64 / 10_000.0
    }
}

/// Last known position solution.
///
/// Always replaced as a whole: a consumer never sees latitude from one
/// solution paired with longitude or accuracy from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionFix {
    /// GPS time of week of the solution (ms)
    pub itow: u32,
    pub latitude: HpCoordinate,
    pub longitude: HpCoordinate,
    pub height_ellipsoid: HpHeight,
    pub height_msl: HpHeight,
    /// 0.1 mm
    pub horizontal_accuracy: u32,
    /// 0.1 mm
    pub vertical_accuracy: u32,
    pub fix_type: GnssFixType,
    /// Fix within DOP and accuracy masks (NAV-STATUS gpsFixOk)
    pub fix_ok: bool,
    /// Receiver flagged lat/lon/height as invalid
    pub invalid_llh: bool,
}

impl PositionFix {
    /// Whether latitude/longitude carry a position at all. `NoFix` and
    /// `TimeOnlyFix` invalidate them regardless of the numbers present.
    pub fn has_valid_position(&self) -> bool {
        self.fix_type.has_position() && !self.invalid_llh
    }

    /// Consumer side gate: a 3D (or GNSS + dead reckoning) solution with a
    /// horizontal accuracy at least as good as `max_h_acc` (0.1 mm)
    pub fn is_usable(&self, max_h_acc: u32) -> bool {
        self.has_valid_position()
            && matches!(
                self.fix_type,
                GnssFixType::Fix3D | GnssFixType::GnssPlusDeadReckoning
            )
            && self.horizontal_accuracy <= max_h_acc
    }

    /// Horizontal accuracy in whole millimeters, rounded down
    pub fn horizontal_accuracy_mm(&self) -> u32 {
        self.horizontal_accuracy / 10
    }

    pub fn vertical_accuracy_mm(&self) -> u32 {
        self.vertical_accuracy / 10
    }
}

/// Position part of a fix, decoded completely before anything is published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HpSolution {
    pub itow: u32,
    pub latitude: HpCoordinate,
    pub longitude: HpCoordinate,
    pub height_ellipsoid: HpHeight,
    pub height_msl: HpHeight,
    pub horizontal_accuracy: u32,
    pub vertical_accuracy: u32,
    pub invalid_llh: bool,
}

impl From<&NavHpPosLlhRef<'_>> for HpSolution {
    fn from(pkt: &NavHpPosLlhRef<'_>) -> Self {
        Self {
            itow: pkt.itow(),
            latitude: pkt.latitude(),
            longitude: pkt.longitude(),
            height_ellipsoid: pkt.height_ellipsoid(),
            height_msl: pkt.height_above_msl(),
            horizontal_accuracy: pkt.horizontal_accuracy(),
            vertical_accuracy: pkt.vertical_accuracy(),
            invalid_llh: pkt.flags().contains(NavHpPosLlhFlags::INVALID_LLH),
        }
    }
}

/// Fix quality of one navigation epoch, from NAV-STATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FixStatus {
    pub itow: u32,
    pub fix_type: GnssFixType,
    pub fix_ok: bool,
}

impl From<&NavStatusRef<'_>> for FixStatus {
    fn from(pkt: &NavStatusRef<'_>) -> Self {
        Self {
            itow: pkt.itow(),
            fix_type: pkt.fix_type(),
            fix_ok: pkt.fix_ok(),
        }
    }
}

impl HpSolution {
    /// `status` must belong to the same epoch (iTOW)
    pub(crate) fn with_status(self, status: FixStatus) -> PositionFix {
        debug_assert_eq!(self.itow, status.itow);
        PositionFix {
            itow: self.itow,
            latitude: self.latitude,
            longitude: self.longitude,
            height_ellipsoid: self.height_ellipsoid,
            height_msl: self.height_msl,
            horizontal_accuracy: self.horizontal_accuracy,
            vertical_accuracy: self.vertical_accuracy,
            fix_type: status.fix_type,
            fix_ok: status.fix_ok,
            invalid_llh: self.invalid_llh,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combine_standard_and_hp() {
        let lat = HpCoordinate::new(123_456_789, 50);
        // 12.3456789 + 0.00000005
        assert_eq!(lat.nanodegrees(), 12_345_678_950);
        assert_eq!(lat.degrees(), 12.34567895);
        assert_eq!(lat.to_string(), "12.345678950");
    }

    #[test]
    fn hp_sign_is_independent() {
        let c = HpCoordinate::new(0, -5);
        assert_eq!(c.nanodegrees(), -5);
        assert_eq!(c.to_string(), "-0.000000005");

        let c = HpCoordinate::new(1, -99);
        assert_eq!(c.nanodegrees(), 1);
        // same value as the canonical split, different representation
        assert_eq!(c.nanodegrees(), HpCoordinate::new(0, 1).nanodegrees());
        assert_ne!(c, HpCoordinate::new(0, 1));

        let c = HpCoordinate::new(-1_220_837_270, 37);
        assert_eq!(c.nanodegrees(), -122_083_726_963);
        assert_eq!(c.to_string(), "-122.083726963");
    }

    #[test]
    fn extremes_stay_exact() {
        let c = HpCoordinate::new(-1_800_000_000, -99);
        assert_eq!(c.nanodegrees(), -180_000_000_099);
        let split = c.split();
        assert!(split.negative);
        assert_eq!(split.whole, 180);
        assert_eq!(split.nanodegrees, 99);

        let c = HpCoordinate::new(i32::MAX, 99);
        assert_eq!(c.nanodegrees(), i64::from(i32::MAX) * 100 + 99);
    }

    #[test]
    fn from_nanodegrees_is_canonical() {
        let c = HpCoordinate::from_nanodegrees(-122_083_726_963).unwrap();
        assert_eq!(c, HpCoordinate::new(-1_220_837_269, -63));
        assert_eq!(HpCoordinate::from_nanodegrees(i64::MAX), None);
    }

    #[test]
    fn single_precision_is_close() {
        let c = HpCoordinate::new(123_456_789, 50);
        let err = (c.degrees_f32() - 12.345_679).abs();
        assert!(err < 2e-6, "error {}", err);
    }

    #[test]
    fn height_with_hp() {
        let h = HpHeight::new(-1_234, -5);
        assert_eq!(h.tenths_of_mm(), -12_345);
        assert_eq!(h.meters(), -1.2345);
    }

    fn fix(fix_type: GnssFixType, horizontal_accuracy: u32) -> PositionFix {
        PositionFix {
            itow: 0,
            latitude: HpCoordinate::new(0, 0),
            longitude: HpCoordinate::new(0, 0),
            height_ellipsoid: HpHeight::new(0, 0),
            height_msl: HpHeight::new(0, 0),
            horizontal_accuracy,
            vertical_accuracy: 0,
            fix_type,
            fix_ok: true,
            invalid_llh: false,
        }
    }

    #[test]
    fn usable_requires_3d_and_accuracy() {
        assert!(fix(GnssFixType::Fix3D, 499).is_usable(500));
        assert!(fix(GnssFixType::Fix3D, 500).is_usable(500));
        assert!(!fix(GnssFixType::Fix3D, 501).is_usable(500));
        assert!(!fix(GnssFixType::Fix2D, 10).is_usable(500));
        assert!(!fix(GnssFixType::NoFix, 10).is_usable(500));
        assert!(!fix(GnssFixType::NoFix, 10).has_valid_position());

        let mut invalid = fix(GnssFixType::Fix3D, 10);
        invalid.invalid_llh = true;
        assert!(!invalid.is_usable(500));
    }
}
