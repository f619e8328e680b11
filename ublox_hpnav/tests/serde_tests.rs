#![cfg(feature = "serde")]

use ublox_hpnav::{GnssFixType, HpCoordinate, HpHeight, PositionFix};

fn fix() -> PositionFix {
    PositionFix {
        itow: 345_600_200,
        latitude: HpCoordinate::new(123_456_789, 50),
        longitude: HpCoordinate::new(-987_654_321, -12),
        height_ellipsoid: HpHeight::new(512_340, 7),
        height_msl: HpHeight::new(498_111, -3),
        horizontal_accuracy: 140,
        vertical_accuracy: 260,
        fix_type: GnssFixType::Fix3D,
        fix_ok: true,
        invalid_llh: false,
    }
}

#[test]
fn fix_serializes_split_coordinates() {
    let json = serde_json::to_value(fix()).unwrap();
    assert_eq!(json["itow"], 345_600_200);
    assert_eq!(json["latitude"]["standard"], 123_456_789);
    assert_eq!(json["latitude"]["hp"], 50);
    assert_eq!(json["longitude"]["hp"], -12);
    assert_eq!(json["fix_type"], "Fix3D");
}

#[test]
fn fix_survives_json() {
    let text = serde_json::to_string(&fix()).unwrap();
    let back: PositionFix = serde_json::from_str(&text).unwrap();
    assert_eq!(back, fix());
    assert_eq!(back.latitude.nanodegrees(), 12_345_678_950);
}
