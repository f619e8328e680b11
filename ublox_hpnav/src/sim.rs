//! In-memory receiver speaking enough UBX to exercise a [`Session`]
//! without hardware.
//!
//! It answers NAV-HPPOSLLH / NAV-STATUS polls from a configurable
//! solution, applies CFG-VALSET per configuration layer, answers CFG-VALGET,
//! and emits NMEA text until NMEA output is switched off. Bus faults can be
//! injected and output can be delivered in small chunks to exercise frame
//! reassembly.
//!
//! [`Session`]: crate::Session

use alloc::{collections::VecDeque, vec::Vec};
use core::fmt;

use crate::{
    constants::MIN_MEAS_RATE_MS,
    parser::Parser,
    position::PositionFix,
    transport::UbxTransport,
    ubx_packets::{
        cfg_val::{CfgKey, CfgVal},
        AckAckBuilder, AckNakBuilder, CfgLayerGet, CfgLayerSet, CfgValGet,
        CfgValGetResponseBuilder, CfgValSet, NavHpPosLlh, NavHpPosLlhBuilder, NavStatus,
        NavStatusBuilder, NavStatusFlags, PacketRef, UbxPacketMeta,
    },
};

const NMEA_NOISE: &[u8] = b"$GNTXT,01,01,02,u-blox AG - www.u-blox.com*4E\r\n";

const FACTORY_MEAS_MS: u16 = 1000;
const FACTORY_NAV: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    BusFault,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::BusFault => f.write_str("simulated bus fault"),
        }
    }
}

impl core::error::Error for SimError {}

/// Rate items stored in one configuration layer
#[derive(Debug, Clone, Copy, Default)]
struct RateLayer {
    meas_ms: Option<u16>,
    nav: Option<u16>,
}

/// Request decoded from the host, detached from the parser buffer
enum Command {
    Poll { class: u8, msg_id: u8 },
    ValSet { layers: CfgLayerSet, values: Vec<CfgVal> },
    ValGet { layer: Option<CfgLayerGet>, keys: Vec<CfgKey> },
}

impl Command {
    fn from_packet(pkt: &PacketRef<'_>) -> Option<Self> {
        match pkt {
            PacketRef::PollRequest(req) => Some(Self::Poll {
                class: req.class(),
                msg_id: req.msg_id(),
            }),
            PacketRef::CfgValSet(set) => Some(Self::ValSet {
                layers: set.layers(),
                values: set.values().collect(),
            }),
            PacketRef::CfgValGet(get) if !get.is_response() => Some(Self::ValGet {
                layer: get.layer(),
                keys: get.keys().collect(),
            }),
            _ => None,
        }
    }
}

pub struct SimulatedReceiver {
    present: bool,
    open: bool,
    ubx_out: bool,
    nmea_out: bool,
    ram: RateLayer,
    bbr: RateLayer,
    flash: RateLayer,
    solution: Option<PositionFix>,
    auto_advance: bool,
    min_meas_ms: u16,
    chunk_len: usize,
    bus_faults: u32,
    input: Parser,
    output: VecDeque<u8>,
}

impl Default for SimulatedReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedReceiver {
    /// Receiver in factory state: 1 Hz, UBX and NMEA output, no solution
    pub fn new() -> Self {
        Self {
            present: true,
            open: false,
            ubx_out: true,
            nmea_out: true,
            ram: RateLayer {
                meas_ms: Some(FACTORY_MEAS_MS),
                nav: Some(FACTORY_NAV),
            },
            bbr: RateLayer::default(),
            flash: RateLayer::default(),
            solution: None,
            auto_advance: false,
            min_meas_ms: MIN_MEAS_RATE_MS,
            chunk_len: usize::MAX,
            bus_faults: 0,
            input: Parser::new(),
            output: VecDeque::new(),
        }
    }

    /// Nothing answers on the bus
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new()
        }
    }

    /// Hand out at most `chunk_len` bytes per read
    pub fn with_chunk_len(mut self, chunk_len: usize) -> Self {
        self.chunk_len = chunk_len.max(1);
        self
    }

    /// Move the solution one navigation period ahead after every
    /// NAV-HPPOSLLH answer, as a receiver producing fresh fixes would
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Refuse measurement periods shorter than `min_meas_ms`, like modules
    /// limited to lower navigation rates do
    pub fn with_min_meas_ms(mut self, min_meas_ms: u16) -> Self {
        self.min_meas_ms = min_meas_ms;
        self
    }

    pub fn set_solution(&mut self, fix: PositionFix) {
        self.solution = Some(fix);
    }

    pub fn clear_solution(&mut self) {
        self.solution = None;
    }

    pub fn solution(&self) -> Option<PositionFix> {
        self.solution
    }

    /// Fail the next `count` bus operations
    pub fn inject_bus_faults(&mut self, count: u32) {
        self.bus_faults += count;
    }

    pub fn is_ubx_enabled(&self) -> bool {
        self.ubx_out
    }

    pub fn is_nmea_enabled(&self) -> bool {
        self.nmea_out
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// CFG-RATE-MEAS stored in `layer`
    pub fn rate_meas_ms(&self, layer: CfgLayerGet) -> Option<u16> {
        self.layer(layer).meas_ms
    }

    /// Bytes queued for the host
    pub fn pending_output(&self) -> usize {
        self.output.len()
    }

    fn check_bus(&mut self) -> Result<(), SimError> {
        if self.bus_faults > 0 {
            self.bus_faults -= 1;
            return Err(SimError::BusFault);
        }
        Ok(())
    }

    fn layer(&self, layer: CfgLayerGet) -> RateLayer {
        match layer {
            CfgLayerGet::Ram => self.ram,
            CfgLayerGet::Bbr => self.bbr,
            CfgLayerGet::Flash => self.flash,
            CfgLayerGet::Default => RateLayer {
                meas_ms: Some(FACTORY_MEAS_MS),
                nav: Some(FACTORY_NAV),
            },
        }
    }

    fn emit(&mut self, frame: &[u8]) {
        if self.ubx_out {
            self.output.extend(frame.iter().copied());
        }
    }

    fn ack<M: UbxPacketMeta>(&mut self, accepted: bool) {
        if accepted {
            self.emit(
                &AckAckBuilder {
                    class: M::CLASS,
                    msg_id: M::ID,
                }
                .into_packet_bytes(),
            );
        } else {
            self.emit(
                &AckNakBuilder {
                    class: M::CLASS,
                    msg_id: M::ID,
                }
                .into_packet_bytes(),
            );
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Poll { class, msg_id } => self.answer_poll(class, msg_id),
            Command::ValSet { layers, values } => {
                let accepted = self.apply_val_set(layers, &values);
                self.ack::<CfgValSet>(accepted);
            },
            Command::ValGet { layer, keys } => self.answer_val_get(layer, &keys),
        }
    }

    fn answer_poll(&mut self, class: u8, msg_id: u8) {
        match (class, msg_id) {
            (NavHpPosLlh::CLASS, NavHpPosLlh::ID) => {
                let Some(fix) = self.solution else {
                    return;
                };
                let frame = NavHpPosLlhBuilder {
                    version: 0,
                    flags: u8::from(fix.invalid_llh),
                    itow: fix.itow,
                    lon: fix.longitude.standard,
                    lat: fix.latitude.standard,
                    height: fix.height_ellipsoid.mm,
                    height_msl: fix.height_msl.mm,
                    lon_hp: fix.longitude.hp,
                    lat_hp: fix.latitude.hp,
                    height_hp: fix.height_ellipsoid.hp,
                    height_msl_hp: fix.height_msl.hp,
                    horizontal_accuracy: fix.horizontal_accuracy,
                    vertical_accuracy: fix.vertical_accuracy,
                }
                .into_packet_bytes();
                self.emit(&frame);
                if self.auto_advance {
                    self.advance();
                }
            },
            (NavStatus::CLASS, NavStatus::ID) => {
                let mut status = NavStatusBuilder::default();
                if let Some(fix) = self.solution {
                    status.itow = fix.itow;
                    status.fix_type = fix.fix_type;
                    status.flags = NavStatusFlags::TOW_SET | NavStatusFlags::WKN_SET;
                    if fix.fix_ok {
                        status.flags |= NavStatusFlags::GPS_FIX_OK;
                    }
                }
                self.emit(&status.into_packet_bytes());
            },
            _ => {},
        }
    }

    fn advance(&mut self) {
        let period = match (self.ram.meas_ms, self.ram.nav) {
            (Some(meas), Some(nav)) => u32::from(meas) * u32::from(nav),
            _ => u32::from(FACTORY_MEAS_MS),
        };
        if let Some(fix) = self.solution.as_mut() {
            fix.itow = fix.itow.wrapping_add(period);
        }
    }

    /// All or nothing, like the receiver's own transaction-less VALSET
    fn apply_val_set(&mut self, layers: CfgLayerSet, values: &[CfgVal]) -> bool {
        let valid = values.iter().all(|value| match *value {
            CfgVal::RateMeas(ms) => ms >= self.min_meas_ms,
            CfgVal::RateNav(nav) => nav >= 1,
            CfgVal::I2cOutProtUbx(_)
            | CfgVal::I2cOutProtNmea(_)
            | CfgVal::Uart1OutProtUbx(_)
            | CfgVal::Uart1OutProtNmea(_) => true,
            CfgVal::Other { .. } => false,
        });
        if !valid || layers.is_empty() {
            return false;
        }

        for value in values {
            for (flag, layer) in [
                (CfgLayerSet::RAM, &mut self.ram),
                (CfgLayerSet::BBR, &mut self.bbr),
                (CfgLayerSet::FLASH, &mut self.flash),
            ] {
                if !layers.contains(flag) {
                    continue;
                }
                match *value {
                    CfgVal::RateMeas(ms) => layer.meas_ms = Some(ms),
                    CfgVal::RateNav(nav) => layer.nav = Some(nav),
                    _ => {},
                }
            }
            if layers.contains(CfgLayerSet::RAM) {
                match *value {
                    CfgVal::I2cOutProtUbx(on) => self.ubx_out = on,
                    CfgVal::I2cOutProtNmea(on) => self.nmea_out = on,
                    _ => {},
                }
            }
        }
        true
    }

    fn answer_val_get(&mut self, layer: Option<CfgLayerGet>, keys: &[CfgKey]) {
        let Some(layer) = layer else {
            self.ack::<CfgValGet>(false);
            return;
        };
        let rates = self.layer(layer);
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            let value = match *key {
                CfgKey::RATE_MEAS => rates.meas_ms.map(CfgVal::RateMeas),
                CfgKey::RATE_NAV => rates.nav.map(CfgVal::RateNav),
                CfgKey::I2COUTPROT_UBX => Some(CfgVal::I2cOutProtUbx(self.ubx_out)),
                CfgKey::I2COUTPROT_NMEA => Some(CfgVal::I2cOutProtNmea(self.nmea_out)),
                _ => None,
            };
            match value {
                Some(value) => values.push(value),
                None => {
                    self.ack::<CfgValGet>(false);
                    return;
                },
            }
        }

        let mut frame = Vec::new();
        let encoded = CfgValGetResponseBuilder {
            layer,
            position: 0,
            cfg_data: &values,
        }
        .extend_to(&mut frame);
        if encoded.is_ok() {
            self.emit(&frame);
        }
        self.ack::<CfgValGet>(encoded.is_ok());
    }
}

impl UbxTransport for SimulatedReceiver {
    type Error = SimError;

    fn open(&mut self) -> Result<(), Self::Error> {
        self.check_bus()?;
        self.open = true;
        Ok(())
    }

    fn probe(&mut self) -> Result<bool, Self::Error> {
        self.check_bus()?;
        Ok(self.present)
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.check_bus()?;
        if !self.present {
            return Err(SimError::BusFault);
        }
        if self.nmea_out {
            self.output.extend(NMEA_NOISE.iter().copied());
        }

        self.input.consume(frame);
        let mut commands = Vec::new();
        while let Some(res) = self.input.next() {
            if let Ok(pkt) = res {
                commands.extend(Command::from_packet(&pkt));
            }
        }
        for cmd in commands {
            self.handle(cmd);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.check_bus()?;
        let n = buf.len().min(self.chunk_len).min(self.output.len());
        for (dst, src) in buf.iter_mut().zip(self.output.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}
