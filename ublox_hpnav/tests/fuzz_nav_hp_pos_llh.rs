//! Property tests for NAV-HPPOSLLH framing and the exact coordinate decode.
//!
//! Frames are produced byte by byte (with `byteorder`) independently of the
//! crate's own builders, so encoder and decoder cannot hide each other's
//! mistakes.

use byteorder::{LittleEndian, WriteBytesExt};
use proptest::prelude::*;
use ublox_hpnav::{
    constants::{UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2},
    HpCoordinate, NavHpPosLlhFlags, PacketRef, Parser,
};

/// Raw NAV-HPPOSLLH fields in wire order
#[derive(Debug, Clone)]
struct HpPosLlhFields {
    flags: u8,
    itow: u32,
    lon: i32,
    lat: i32,
    height: i32,
    h_msl: i32,
    lon_hp: i8,
    lat_hp: i8,
    height_hp: i8,
    h_msl_hp: i8,
    h_acc: u32,
    v_acc: u32,
}

impl HpPosLlhFields {
    fn payload(&self) -> Vec<u8> {
        let mut wtr = Vec::with_capacity(36);
        wtr.write_u8(0).unwrap(); // version
        wtr.write_u16::<LittleEndian>(0).unwrap(); // reserved
        wtr.write_u8(self.flags).unwrap();
        wtr.write_u32::<LittleEndian>(self.itow).unwrap();
        wtr.write_i32::<LittleEndian>(self.lon).unwrap();
        wtr.write_i32::<LittleEndian>(self.lat).unwrap();
        wtr.write_i32::<LittleEndian>(self.height).unwrap();
        wtr.write_i32::<LittleEndian>(self.h_msl).unwrap();
        wtr.write_i8(self.lon_hp).unwrap();
        wtr.write_i8(self.lat_hp).unwrap();
        wtr.write_i8(self.height_hp).unwrap();
        wtr.write_i8(self.h_msl_hp).unwrap();
        wtr.write_u32::<LittleEndian>(self.h_acc).unwrap();
        wtr.write_u32::<LittleEndian>(self.v_acc).unwrap();
        wtr
    }

    fn frame(&self) -> Vec<u8> {
        let payload = self.payload();
        let mut core = vec![0x01, 0x14];
        core.write_u16::<LittleEndian>(payload.len() as u16).unwrap();
        core.extend_from_slice(&payload);

        let (mut ck_a, mut ck_b) = (0u8, 0u8);
        for byte in &core {
            ck_a = ck_a.wrapping_add(*byte);
            ck_b = ck_b.wrapping_add(ck_a);
        }

        let mut frame = vec![UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2];
        frame.extend_from_slice(&core);
        frame.push(ck_a);
        frame.push(ck_b);
        frame
    }
}

fn hp_pos_llh_strategy() -> impl Strategy<Value = HpPosLlhFields> {
    let header = (0u8..=1, any::<u32>());
    let position = (
        -1_800_000_000..=1_800_000_000i32,
        -900_000_000..=900_000_000i32,
        any::<i32>(),
        any::<i32>(),
    );
    let high_precision = (-99..=99i8, -99..=99i8, -9..=9i8, -9..=9i8);
    let accuracy = (any::<u32>(), any::<u32>());

    (header, position, high_precision, accuracy).prop_map(
        |(
            (flags, itow),
            (lon, lat, height, h_msl),
            (lon_hp, lat_hp, height_hp, h_msl_hp),
            (h_acc, v_acc),
        )| HpPosLlhFields {
            flags,
            itow,
            lon,
            lat,
            height,
            h_msl,
            lon_hp,
            lat_hp,
            height_hp,
            h_msl_hp,
            h_acc,
            v_acc,
        },
    )
}

proptest! {
    #[test]
    fn parser_decodes_generated_frames(fields in hp_pos_llh_strategy(), split in 1usize..44) {
        let frame = fields.frame();
        let mut parser = Parser::new();
        // split delivery must not matter
        parser.consume(&frame[..split]);
        prop_assert!(parser.next().is_none());
        parser.consume(&frame[split..]);

        let Some(Ok(PacketRef::NavHpPosLlh(p))) = parser.next() else {
            panic!("Parser failed to parse a NAV-HPPOSLLH valid packet");
        };

        prop_assert_eq!(p.itow(), fields.itow);
        prop_assert_eq!(p.lon(), fields.lon);
        prop_assert_eq!(p.lat(), fields.lat);
        prop_assert_eq!(p.height(), fields.height);
        prop_assert_eq!(p.height_msl(), fields.h_msl);
        prop_assert_eq!(p.lon_hp(), fields.lon_hp);
        prop_assert_eq!(p.lat_hp(), fields.lat_hp);
        prop_assert_eq!(p.height_hp(), fields.height_hp);
        prop_assert_eq!(p.height_msl_hp(), fields.h_msl_hp);
        prop_assert_eq!(p.horizontal_accuracy(), fields.h_acc);
        prop_assert_eq!(p.vertical_accuracy(), fields.v_acc);
        prop_assert_eq!(
            p.flags().contains(NavHpPosLlhFlags::INVALID_LLH),
            fields.flags == 1
        );
        prop_assert_eq!(
            p.latitude().nanodegrees(),
            i64::from(fields.lat) * 100 + i64::from(fields.lat_hp)
        );
        prop_assert_eq!(
            p.height_ellipsoid().tenths_of_mm(),
            i64::from(fields.height) * 10 + i64::from(fields.height_hp)
        );
    }

    #[test]
    fn out_of_range_hp_is_never_decoded(
        fields in hp_pos_llh_strategy(),
        lat_hp in prop_oneof![-128..=-100i8, 100..=127i8],
    ) {
        let fields = HpPosLlhFields { lat_hp, ..fields };
        let mut parser = Parser::new();
        parser.consume(&fields.frame());
        prop_assert!(matches!(parser.next(), Some(Err(_))));
    }

    #[test]
    fn decode_is_monotonic_in_standard(
        standard in -1_800_000_000..1_800_000_000i32,
        hp in -99..=99i8,
    ) {
        let lower = HpCoordinate::new(standard, hp);
        let upper = HpCoordinate::new(standard + 1, hp);
        prop_assert!(lower.nanodegrees() < upper.nanodegrees());
        prop_assert!(lower.degrees() <= upper.degrees());
    }

    #[test]
    fn decode_is_monotonic_in_hp(
        standard in -1_800_000_000..=1_800_000_000i32,
        hp in -99..99i8,
    ) {
        let lower = HpCoordinate::new(standard, hp);
        let upper = HpCoordinate::new(standard, hp + 1);
        prop_assert_eq!(upper.nanodegrees() - lower.nanodegrees(), 1);
    }

    #[test]
    fn display_matches_nanodegrees(standard in any::<i32>(), hp in -99..=99i8) {
        let c = HpCoordinate::new(standard, hp);
        let text = c.to_string();
        let digits: String = text.chars().filter(|ch| *ch != '.').collect();
        prop_assert_eq!(digits.parse::<i64>().unwrap(), c.nanodegrees());
        prop_assert_eq!(text.split('.').nth(1).map(str::len), Some(9));
    }

    #[test]
    fn canonical_split_round_trips(nanodeg in -180_000_000_099i64..=180_000_000_099) {
        let c = HpCoordinate::from_nanodegrees(nanodeg).unwrap();
        prop_assert_eq!(c.nanodegrees(), nanodeg);
        prop_assert!((-99..=99).contains(&c.hp));
    }
}
