#![cfg(feature = "alloc")]

use embedded_hal::delay::DelayNs;
use ublox_hpnav::{
    cfg_val::CfgVal,
    sim::{SimError, SimulatedReceiver},
    CfgLayerGet, ConfigError, GnssFixType, HpCoordinate, HpHeight, InitError, NavStatus,
    OutputPort, PacketRef, Parser, PersistenceLayer, PositionFix, Session, SessionConfig,
    UbxPacketRequest, UbxTransport,
};

/// Counts requested pauses instead of sleeping
#[derive(Default)]
struct FakeDelay {
    total_us: u64,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_us += u64::from(ns / 1_000);
    }
}

/// Simulated receiver behind a link that can lose NAV-STATUS polls or
/// hold back the receiver's answers
struct Link {
    sim: SimulatedReceiver,
    port: OutputPort,
    drop_status_polls: bool,
    hold_output: bool,
    sent: Vec<Vec<u8>>,
}

impl Link {
    fn new(sim: SimulatedReceiver) -> Self {
        Self {
            sim,
            port: OutputPort::I2c,
            drop_status_polls: false,
            hold_output: false,
            sent: Vec::new(),
        }
    }
}

impl UbxTransport for Link {
    type Error = SimError;

    fn open(&mut self) -> Result<(), Self::Error> {
        self.sim.open()
    }

    fn probe(&mut self) -> Result<bool, Self::Error> {
        self.sim.probe()
    }

    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.sent.push(frame.to_vec());
        let status_poll = UbxPacketRequest::request_for::<NavStatus>().into_packet_bytes();
        if self.drop_status_polls && frame == status_poll {
            return Ok(());
        }
        self.sim.write(frame)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.hold_output {
            return Ok(0);
        }
        self.sim.read(buf)
    }

    fn output_port(&self) -> OutputPort {
        self.port
    }
}

fn rtk_fix() -> PositionFix {
    PositionFix {
        itow: 345_600_000,
        latitude: HpCoordinate::new(473_977_418, 37),
        longitude: HpCoordinate::new(85_455_939, -12),
        height_ellipsoid: HpHeight::new(488_123, 4),
        height_msl: HpHeight::new(440_871, -2),
        horizontal_accuracy: 140,
        vertical_accuracy: 210,
        fix_type: GnssFixType::Fix3D,
        fix_ok: true,
        invalid_llh: false,
    }
}

fn connect<T: UbxTransport>(transport: T) -> Session<T, FakeDelay> {
    let mut session = Session::initialize(transport, FakeDelay::default(), SessionConfig::default())
        .expect("simulated receiver answers");
    session.configure_output_protocol().unwrap();
    session
}

#[test]
fn missing_receiver_yields_no_session() {
    let res = Session::initialize(
        SimulatedReceiver::absent(),
        FakeDelay::default(),
        SessionConfig::default(),
    );
    assert!(matches!(res, Err(InitError::NotFound)));
}

#[test]
fn bus_fault_at_open_is_fatal() {
    let mut sim = SimulatedReceiver::new();
    sim.inject_bus_faults(1);
    let res = Session::initialize(sim, FakeDelay::default(), SessionConfig::default());
    assert!(matches!(res, Err(InitError::Open(SimError::BusFault))));
}

#[test]
fn output_restricted_to_ubx() {
    let session = connect(SimulatedReceiver::new());
    let (sim, _) = session.release();
    assert!(sim.is_ubx_enabled());
    assert!(!sim.is_nmea_enabled());
    assert!(sim.is_open());
}

#[test]
fn set_then_get_rate() {
    let mut session = connect(SimulatedReceiver::new());
    session.set_navigation_rate(5, PersistenceLayer::Ram).unwrap();
    assert_eq!(session.get_navigation_rate().unwrap(), 5);
    assert_eq!(session.navigation_rate_hz(), 5);
    assert_eq!(
        session.transport_mut().rate_meas_ms(CfgLayerGet::Ram),
        Some(200)
    );
}

#[test]
fn rate_written_to_flash_only_keeps_active_rate() {
    let mut session = connect(SimulatedReceiver::new());
    session.set_navigation_rate(10, PersistenceLayer::Flash).unwrap();
    assert_eq!(session.navigation_rate_hz(), 1);
    assert_eq!(session.get_navigation_rate().unwrap(), 1);
    assert_eq!(
        session
            .get_navigation_rate_from(PersistenceLayer::Flash)
            .unwrap(),
        10
    );
}

#[test]
fn default_layer_writes_ram_and_bbr() {
    let mut session = connect(SimulatedReceiver::new());
    session.set_navigation_rate(10, PersistenceLayer::Default).unwrap();
    assert_eq!(session.navigation_rate_hz(), 10);
    let sim = session.transport_mut();
    assert_eq!(sim.rate_meas_ms(CfgLayerGet::Ram), Some(100));
    assert_eq!(sim.rate_meas_ms(CfgLayerGet::Bbr), Some(100));
    assert_eq!(sim.rate_meas_ms(CfgLayerGet::Flash), None);
    // the default layer holds the factory configuration
    assert_eq!(
        session
            .get_navigation_rate_from(PersistenceLayer::Default)
            .unwrap(),
        1
    );
}

#[test]
fn unrepresentable_rates_never_reach_the_bus() {
    let mut session = connect(SimulatedReceiver::new());
    for hz in [0, 36, 39, 41, 1000] {
        assert!(matches!(
            session.set_navigation_rate(hz, PersistenceLayer::Ram),
            Err(ConfigError::RateUnsupported { hz: rejected }) if rejected == hz
        ));
    }
    assert_eq!(session.transport_mut().pending_output(), 0);
    assert_eq!(session.navigation_rate_hz(), 1);
}

#[test]
fn refused_rate_is_unsupported() {
    let mut session = connect(SimulatedReceiver::new().with_min_meas_ms(100));
    session.set_navigation_rate(5, PersistenceLayer::Ram).unwrap();
    assert!(matches!(
        session.set_navigation_rate(20, PersistenceLayer::Ram),
        Err(ConfigError::RateUnsupported { hz: 20 })
    ));
    assert_eq!(session.navigation_rate_hz(), 5);
    assert_eq!(session.get_navigation_rate().unwrap(), 5);
}

#[test]
fn failed_read_keeps_previous_rate() {
    let mut session = connect(SimulatedReceiver::new());
    session.set_navigation_rate(5, PersistenceLayer::Ram).unwrap();

    session.transport_mut().inject_bus_faults(1);
    assert!(matches!(
        session.get_navigation_rate(),
        Err(ConfigError::ReadFailed)
    ));
    assert_eq!(session.navigation_rate_hz(), 5);

    // nothing stored in battery backed RAM yet: receiver answers NAK
    assert!(matches!(
        session.get_navigation_rate_from(PersistenceLayer::BatteryBackedRam),
        Err(ConfigError::ReadFailed)
    ));
    assert_eq!(session.get_navigation_rate().unwrap(), 5);
}

#[test]
fn ten_polls_at_20hz_are_trustworthy() {
    let mut sim = SimulatedReceiver::new().with_auto_advance(true);
    sim.set_solution(rtk_fix());
    let mut session = connect(sim);
    session.set_navigation_rate(20, PersistenceLayer::Ram).unwrap();

    let mut last_itow = None;
    for _ in 0..10 {
        let fix = session.poll().expect("fresh solution every poll");
        assert_eq!(fix.fix_type, GnssFixType::Fix3D);
        assert!(fix.horizontal_accuracy < 500);
        assert!(fix.is_usable(500));
        assert_ne!(Some(fix.itow), last_itow);
        last_itow = Some(fix.itow);
    }
    let stats = session.stats();
    assert_eq!(stats.polls, 10);
    assert_eq!(stats.updates, 10);
    assert_eq!(stats.bus_errors, 0);
}

#[test]
fn poll_decodes_exact_position() {
    let mut sim = SimulatedReceiver::new();
    sim.set_solution(rtk_fix());
    let mut session = connect(sim);

    let fix = session.poll().unwrap();
    assert_eq!(fix, rtk_fix());
    assert_eq!(fix.latitude.nanodegrees(), 47_397_741_837);
    assert_eq!(fix.longitude.to_string(), "8.545593888");
    assert_eq!(session.latest(), Some(fix));
}

#[test]
fn injected_bus_fault_leaves_fix_untouched() {
    let mut sim = SimulatedReceiver::new().with_auto_advance(true);
    sim.set_solution(rtk_fix());
    let mut session = connect(sim);
    let before = session.poll().unwrap();

    session.transport_mut().inject_bus_faults(1);
    assert_eq!(session.poll(), None);
    assert_eq!(session.latest(), Some(before));
    assert_eq!(session.stats().bus_errors, 1);

    // the loop carries on with the next solution
    let after = session.poll().unwrap();
    assert_ne!(after.itow, before.itow);
    assert_eq!(after.latitude, before.latitude);
}

#[test]
fn chunked_delivery_is_reassembled() {
    let mut sim = SimulatedReceiver::new().with_chunk_len(5);
    sim.set_solution(rtk_fix());
    let mut session = connect(sim);
    session.set_navigation_rate(20, PersistenceLayer::Ram).unwrap();
    assert_eq!(session.poll(), Some(rtk_fix()));
    assert_eq!(session.stats().parse_errors, 0);
}

#[test]
fn no_fix_is_reported_but_not_usable() {
    let mut sim = SimulatedReceiver::new();
    sim.set_solution(PositionFix {
        fix_type: GnssFixType::NoFix,
        fix_ok: false,
        ..rtk_fix()
    });
    let mut session = connect(sim);
    let fix = session.poll().unwrap();
    assert_eq!(fix.fix_type, GnssFixType::NoFix);
    assert!(!fix.has_valid_position());
    assert!(!fix.is_usable(u32::MAX));
}

#[test]
fn unchanged_solution_is_no_new_data() {
    let mut sim = SimulatedReceiver::new();
    sim.set_solution(rtk_fix());
    let mut session = connect(sim);

    assert!(session.poll().is_some());
    assert_eq!(session.poll(), None);
    assert_eq!(session.stats().stale, 1);
    assert_eq!(session.latest(), Some(rtk_fix()));
}

#[test]
fn silent_receiver_bounds_poll_latency() {
    let mut delay = FakeDelay::default();
    let mut sim = SimulatedReceiver::new();
    sim.clear_solution();
    let config = SessionConfig::default().with_initial_rate_hz(10);
    let mut session = Session::initialize(sim, &mut delay, config).unwrap();
    assert_eq!(session.poll(), None);
    assert_eq!(session.stats().stale, 1);
    drop(session);

    // one navigation period at 10 Hz
    let spent = delay.total_us;
    assert!(spent > 0);
    assert!(spent <= 100_000, "poll waited {} us", spent);
}

#[test]
fn position_without_status_of_its_epoch_is_not_published() {
    let mut sim = SimulatedReceiver::new();
    sim.set_solution(rtk_fix());
    let mut session = connect(Link::new(sim));
    let first = session.poll().unwrap();
    assert!(first.is_usable(500));

    // the receiver loses its fix while the status poll goes missing
    let link = session.transport_mut();
    link.drop_status_polls = true;
    link.sim.set_solution(PositionFix {
        itow: first.itow + 50,
        fix_type: GnssFixType::NoFix,
        fix_ok: false,
        ..rtk_fix()
    });
    assert_eq!(session.poll(), None);
    assert_eq!(session.latest(), Some(first));
    assert_eq!(session.stats().stale, 1);

    session.transport_mut().drop_status_polls = false;
    let fix = session.poll().unwrap();
    assert_eq!(fix.itow, first.itow + 50);
    assert_eq!(fix.fix_type, GnssFixType::NoFix);
    assert!(!fix.fix_ok);
    assert!(!fix.is_usable(500));
}

#[test]
fn late_ack_does_not_confirm_next_request() {
    let sim = SimulatedReceiver::new().with_min_meas_ms(100);
    let config = SessionConfig::default().with_ack_timeout_ms(5);
    let mut session = Session::initialize(Link::new(sim), FakeDelay::default(), config).unwrap();
    session.configure_output_protocol().unwrap();

    // the ACK for 5 Hz only shows up after the session gave up waiting
    session.transport_mut().hold_output = true;
    assert!(matches!(
        session.set_navigation_rate(5, PersistenceLayer::Ram),
        Err(ConfigError::AckTimeout { .. })
    ));
    assert_eq!(session.navigation_rate_hz(), 1);
    session.transport_mut().hold_output = false;

    // 20 Hz is refused, the queued ACK must not count as acceptance
    assert!(matches!(
        session.set_navigation_rate(20, PersistenceLayer::Ram),
        Err(ConfigError::RateUnsupported { hz: 20 })
    ));
    assert_eq!(session.get_navigation_rate().unwrap(), 5);
}

#[test]
fn uart_link_restricts_uart_output() {
    let mut link = Link::new(SimulatedReceiver::new());
    link.port = OutputPort::Uart1;
    let (link, _) = connect(link).release();

    let mut parser = Parser::new();
    parser.consume(&link.sent[0]);
    let Some(Ok(PacketRef::CfgValSet(set))) = parser.next() else {
        panic!("expected CFG-VALSET");
    };
    let values: Vec<CfgVal> = set.values().collect();
    assert_eq!(
        values,
        [CfgVal::Uart1OutProtUbx(true), CfgVal::Uart1OutProtNmea(false)]
    );
}
