//! Receiver session: bring-up, configuration and position polling.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, trace, warn};

use crate::{
    constants::MAX_NAV_RATE_HZ,
    error::{ConfigError, InitError},
    parser::Parser,
    position::{FixStatus, HpSolution, PositionFix},
    transport::{OutputPort, UbxTransport},
    ubx_packets::{
        cfg_val::{CfgKey, CfgVal},
        CfgLayerGet, CfgLayerSet, CfgValGet, CfgValGetRequestBuilder, CfgValSet,
        CfgValSetBuilder, NavHpPosLlh, NavStatus, PacketRef, SliceWriter, UbxPacketMeta,
        UbxPacketRequest,
    },
};

/// Bytes pulled from the transport per read
const READ_CHUNK_LEN: usize = 128;
/// Enough for every request the session sends
const REQUEST_BUF_LEN: usize = 64;
/// Reads spent discarding stale output before a configuration request
const MAX_FLUSH_READS: u32 = 16;

/// Configuration bank a setting is written to or read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PersistenceLayer {
    Ram,
    BatteryBackedRam,
    Flash,
    /// Writing targets RAM and BBR, reading returns the factory defaults
    Default,
}

impl PersistenceLayer {
    pub fn set_layers(self) -> CfgLayerSet {
        match self {
            Self::Ram => CfgLayerSet::RAM,
            Self::BatteryBackedRam => CfgLayerSet::BBR,
            Self::Flash => CfgLayerSet::FLASH,
            Self::Default => CfgLayerSet::RAM | CfgLayerSet::BBR,
        }
    }

    pub fn get_layer(self) -> CfgLayerGet {
        match self {
            Self::Ram => CfgLayerGet::Ram,
            Self::BatteryBackedRam => CfgLayerGet::Bbr,
            Self::Flash => CfgLayerGet::Flash,
            Self::Default => CfgLayerGet::Default,
        }
    }
}

/// Tunables of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pause between two reads that returned nothing (us)
    pub read_interval_us: u32,
    /// How long to wait for ACK/NAK or a CFG-VALGET answer (ms)
    pub ack_timeout_ms: u32,
    /// Rate assumed active until one is set or read back
    pub initial_rate_hz: u16,
    /// Banks the output protocol selection is written to
    pub output_layers: CfgLayerSet,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_interval_us: 1_000,
            ack_timeout_ms: 1_100,
            initial_rate_hz: 1,
            output_layers: CfgLayerSet::RAM | CfgLayerSet::BBR,
        }
    }
}

impl SessionConfig {
    pub fn with_read_interval_us(mut self, read_interval_us: u32) -> Self {
        self.read_interval_us = read_interval_us.max(1);
        self
    }

    pub fn with_ack_timeout_ms(mut self, ack_timeout_ms: u32) -> Self {
        self.ack_timeout_ms = ack_timeout_ms;
        self
    }

    pub fn with_initial_rate_hz(mut self, initial_rate_hz: u16) -> Self {
        self.initial_rate_hz = initial_rate_hz.max(1);
        self
    }

    pub fn with_output_layers(mut self, output_layers: CfgLayerSet) -> Self {
        self.output_layers = output_layers;
        self
    }
}

/// Outcome counters of [`Session::poll`] and frame decoding
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollStats {
    pub polls: u32,
    pub updates: u32,
    /// Polls without a new solution
    pub stale: u32,
    pub bus_errors: u32,
    /// Frames dropped for a bad checksum, length or field value
    pub parse_errors: u32,
}

/// Measurement period for `hz`, `None` unless it reads back as the same rate
fn meas_rate_ms(hz: u16) -> Option<u16> {
    if hz == 0 || hz > MAX_NAV_RATE_HZ {
        return None;
    }
    let meas = 1000 / hz;
    (rate_hz(meas, 1) == Some(hz)).then_some(meas)
}

/// Solution rate for a measurement period and measurements per solution,
/// truncated to whole Hz
fn rate_hz(meas_ms: u16, nav: u16) -> Option<u16> {
    let period = u32::from(meas_ms) * u32::from(nav);
    if period == 0 {
        return None;
    }
    match 1000 / period {
        0 => None,
        hz => u16::try_from(hz).ok(),
    }
}

/// Connection to a receiver that answered at initialization.
///
/// Owns the transport exclusively and the last decoded [`PositionFix`].
pub struct Session<T: UbxTransport, D: DelayNs> {
    transport: T,
    delay: D,
    parser: Parser,
    config: SessionConfig,
    nav_rate_hz: u16,
    last_fix: Option<PositionFix>,
    stats: PollStats,
}

impl<T: UbxTransport, D: DelayNs> Session<T, D> {
    /// Opens the bus and checks that a receiver answers.
    ///
    /// Every error is fatal for the position subsystem: no session exists
    /// without a receiver, so nothing can be polled.
    pub fn initialize(
        mut transport: T,
        delay: D,
        config: SessionConfig,
    ) -> Result<Self, InitError<T::Error>> {
        transport.open().map_err(|e| {
            error!("Unable to open bus: {:?}", e);
            InitError::Open(e)
        })?;
        match transport.probe() {
            Ok(true) => {},
            Ok(false) => {
                error!("GNSS receiver not detected");
                return Err(InitError::NotFound);
            },
            Err(e) => {
                error!("Bus error while probing receiver: {:?}", e);
                return Err(InitError::Probe(e));
            },
        }
        info!("GNSS receiver connected");

        Ok(Self {
            transport,
            delay,
            parser: Parser::new(),
            nav_rate_hz: config.initial_rate_hz.max(1),
            config,
            last_fix: None,
            stats: PollStats::default(),
        })
    }

    /// Restrict the output of the port the transport is wired to to UBX,
    /// turning NMEA off
    pub fn configure_output_protocol(&mut self) -> Result<(), ConfigError<T::Error>> {
        let layers = self.config.output_layers;
        let port = self.transport.output_port();
        let values = match port {
            OutputPort::I2c => [CfgVal::I2cOutProtUbx(true), CfgVal::I2cOutProtNmea(false)],
            OutputPort::Uart1 => [
                CfgVal::Uart1OutProtUbx(true),
                CfgVal::Uart1OutProtNmea(false),
            ],
        };
        self.send_val_set(layers, &values)?;
        info!("{:?} output restricted to UBX ({:?})", port, layers);
        Ok(())
    }

    /// Write the solution rate to `layer`.
    ///
    /// Rates the receiver cannot run at exactly, or that it refuses, are
    /// reported as [`ConfigError::RateUnsupported`]. The active rate only
    /// changes when RAM is among the written banks.
    pub fn set_navigation_rate(
        &mut self,
        hz: u16,
        layer: PersistenceLayer,
    ) -> Result<(), ConfigError<T::Error>> {
        let Some(meas_ms) = meas_rate_ms(hz) else {
            warn!("Navigation rate of {} Hz not supported", hz);
            return Err(ConfigError::RateUnsupported { hz });
        };
        let layers = layer.set_layers();
        match self.send_val_set(layers, &[CfgVal::RateMeas(meas_ms), CfgVal::RateNav(1)]) {
            Ok(()) => {},
            Err(ConfigError::Nak { .. }) => {
                warn!("Receiver refused navigation rate of {} Hz", hz);
                return Err(ConfigError::RateUnsupported { hz });
            },
            Err(e) => return Err(e),
        }
        if layers.contains(CfgLayerSet::RAM) {
            self.nav_rate_hz = hz;
        }
        info!("Navigation rate set to {} Hz ({:?})", hz, layer);
        Ok(())
    }

    /// Read back the rate of the active (RAM) configuration
    pub fn get_navigation_rate(&mut self) -> Result<u16, ConfigError<T::Error>> {
        self.get_navigation_rate_from(PersistenceLayer::Ram)
    }

    /// Read back the rate stored in `layer`.
    ///
    /// Any failure, including a report this crate does not understand or a
    /// rate below 1 Hz, is [`ConfigError::ReadFailed`]; the rate in use is
    /// kept.
    pub fn get_navigation_rate_from(
        &mut self,
        layer: PersistenceLayer,
    ) -> Result<u16, ConfigError<T::Error>> {
        let hz = match self.read_rate_config(layer.get_layer()) {
            Ok(Some((meas, nav))) => rate_hz(meas, nav),
            Ok(None) => None,
            Err(e) => {
                warn!("Reading navigation rate failed: {}", e);
                None
            },
        };
        let Some(hz) = hz else {
            return Err(ConfigError::ReadFailed);
        };
        if layer == PersistenceLayer::Ram {
            self.nav_rate_hz = hz;
        }
        Ok(hz)
    }

    /// Query the newest high precision solution.
    ///
    /// Returns `Some` only for a solution that differs from the previous
    /// one. Bus faults and missing answers are not errors: the last fix is
    /// kept untouched and `None` is returned. Waits at most one navigation
    /// period.
    pub fn poll(&mut self) -> Option<PositionFix> {
        self.stats.polls = self.stats.polls.wrapping_add(1);
        match self.query_position() {
            Ok(Some(fix)) if self.last_fix.map(|last| last.itow) != Some(fix.itow) => {
                trace!("New fix at iTOW {}", fix.itow);
                self.last_fix = Some(fix);
                self.stats.updates = self.stats.updates.wrapping_add(1);
                Some(fix)
            },
            Ok(_) => {
                debug!("No new navigation solution");
                self.stats.stale = self.stats.stale.wrapping_add(1);
                None
            },
            Err(e) => {
                warn!("Bus error while polling position: {:?}", e);
                self.stats.bus_errors = self.stats.bus_errors.wrapping_add(1);
                None
            },
        }
    }

    /// Last successfully decoded fix
    pub fn latest(&self) -> Option<PositionFix> {
        self.last_fix
    }

    /// Rate the session believes the receiver runs at
    pub fn navigation_rate_hz(&self) -> u16 {
        self.nav_rate_hz
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    fn query_position(&mut self) -> Result<Option<PositionFix>, T::Error> {
        self.transport
            .write(&UbxPacketRequest::request_for::<NavStatus>().into_packet_bytes())?;
        self.transport
            .write(&UbxPacketRequest::request_for::<NavHpPosLlh>().into_packet_bytes())?;

        // a status is only valid for the solution of the same epoch
        let mut solution: Option<HpSolution> = None;
        let mut status: Option<FixStatus> = None;
        let attempts = self.poll_attempts();
        let fix = self.await_packet(attempts, |pkt| {
            match pkt {
                PacketRef::NavHpPosLlh(pkt) => solution = Some(HpSolution::from(pkt)),
                PacketRef::NavStatus(pkt) => status = Some(FixStatus::from(pkt)),
                _ => {},
            }
            match (solution, status) {
                (Some(solution), Some(status)) if solution.itow == status.itow => {
                    Some(solution.with_status(status))
                },
                _ => None,
            }
        })?;

        if fix.is_none() {
            if let Some(solution) = solution {
                debug!("No NAV-STATUS for iTOW {}, dropping solution", solution.itow);
            }
        }
        Ok(fix)
    }

    /// Throw away whatever the receiver queued before the next request,
    /// so late answers to an earlier one cannot be taken for its reply
    fn flush_input(&mut self) -> Result<(), T::Error> {
        self.parser.reset();
        let mut chunk = [0u8; READ_CHUNK_LEN];
        let mut dropped = 0;
        for _ in 0..MAX_FLUSH_READS {
            let n = self.transport.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            dropped += n;
        }
        if dropped > 0 {
            trace!("Discarded {} stale bytes", dropped);
        }
        Ok(())
    }

    fn send_val_set(
        &mut self,
        layers: CfgLayerSet,
        values: &[CfgVal],
    ) -> Result<(), ConfigError<T::Error>> {
        let mut buf = [0u8; REQUEST_BUF_LEN];
        let mut out = SliceWriter::new(&mut buf);
        CfgValSetBuilder {
            version: 0,
            layers,
            cfg_data: values,
        }
        .extend_to(&mut out)?;
        self.flush_input().map_err(ConfigError::Bus)?;
        self.transport
            .write(out.as_slice())
            .map_err(ConfigError::Bus)?;
        self.wait_for_ack::<CfgValSet>()
    }

    fn wait_for_ack<M: UbxPacketMeta>(&mut self) -> Result<(), ConfigError<T::Error>> {
        let attempts = self.ack_attempts();
        let acked = self
            .await_packet(attempts, |pkt| match pkt {
                PacketRef::AckAck(ack) if ack.is_ack_for::<M>() => Some(true),
                PacketRef::AckNak(nak) if nak.is_nak_for::<M>() => Some(false),
                _ => None,
            })
            .map_err(ConfigError::Bus)?;
        match acked {
            Some(true) => Ok(()),
            Some(false) => Err(ConfigError::Nak {
                class: M::CLASS,
                msg_id: M::ID,
            }),
            None => Err(ConfigError::AckTimeout {
                class: M::CLASS,
                msg_id: M::ID,
            }),
        }
    }

    /// CFG-RATE-MEAS and CFG-RATE-NAV of `layer`, `None` if the answer
    /// lacks one of them
    fn read_rate_config(
        &mut self,
        layer: CfgLayerGet,
    ) -> Result<Option<(u16, u16)>, ConfigError<T::Error>> {
        let mut buf = [0u8; REQUEST_BUF_LEN];
        let mut out = SliceWriter::new(&mut buf);
        CfgValGetRequestBuilder {
            version: 0,
            layer,
            position: 0,
            cfg_keys: &[CfgKey::RATE_MEAS, CfgKey::RATE_NAV],
        }
        .extend_to(&mut out)?;
        self.flush_input().map_err(ConfigError::Bus)?;
        self.transport
            .write(out.as_slice())
            .map_err(ConfigError::Bus)?;

        let attempts = self.ack_attempts();
        let answer = self
            .await_packet(attempts, |pkt| match pkt {
                PacketRef::CfgValGet(resp) if resp.is_response() => {
                    let (mut meas, mut nav) = (None, None);
                    for value in resp.values() {
                        match value {
                            CfgVal::RateMeas(v) => meas = Some(v),
                            CfgVal::RateNav(v) => nav = Some(v),
                            _ => {},
                        }
                    }
                    Some(Ok(meas.zip(nav)))
                },
                PacketRef::AckNak(nak) if nak.is_nak_for::<CfgValGet>() => Some(Err(())),
                _ => None,
            })
            .map_err(ConfigError::Bus)?;
        match answer {
            Some(Ok(rate)) => Ok(rate),
            Some(Err(())) => Err(ConfigError::Nak {
                class: CfgValGet::CLASS,
                msg_id: CfgValGet::ID,
            }),
            None => Err(ConfigError::AckTimeout {
                class: CfgValGet::CLASS,
                msg_id: CfgValGet::ID,
            }),
        }
    }

    /// Read and parse until `matcher` accepts a packet or `attempts` reads
    /// were made. Only empty reads are followed by a pause.
    fn await_packet<R>(
        &mut self,
        attempts: u32,
        mut matcher: impl FnMut(&PacketRef<'_>) -> Option<R>,
    ) -> Result<Option<R>, T::Error> {
        let mut chunk = [0u8; READ_CHUNK_LEN];
        for _ in 0..attempts {
            let len = core::cmp::min(chunk.len(), self.parser.free_space());
            let n = self.transport.read(&mut chunk[..len])?;
            if n > 0 {
                let lost = self.parser.consume(&chunk[..n]);
                if lost > 0 {
                    debug!("Parser buffer full, {} bytes lost", lost);
                }
            }
            while let Some(res) = self.parser.next() {
                match res {
                    Ok(pkt) => {
                        trace!("Received {:02x?}", pkt.class_and_msg_id());
                        if let Some(ret) = matcher(&pkt) {
                            return Ok(Some(ret));
                        }
                    },
                    Err(e) => {
                        self.stats.parse_errors = self.stats.parse_errors.wrapping_add(1);
                        debug!("Dropping malformed frame: {}", e);
                    },
                }
            }
            if n == 0 {
                self.delay.delay_us(self.config.read_interval_us);
            }
        }
        Ok(None)
    }

    fn ack_attempts(&self) -> u32 {
        let interval = self.config.read_interval_us.max(1);
        (self.config.ack_timeout_ms.saturating_mul(1000) / interval).max(1)
    }

    /// Reads fitting into one navigation period
    fn poll_attempts(&self) -> u32 {
        let interval = self.config.read_interval_us.max(1);
        let period_us = 1_000_000 / u32::from(self.nav_rate_hz.max(1));
        (period_us / interval).max(1)
    }
}
