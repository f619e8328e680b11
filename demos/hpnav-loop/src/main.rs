use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};
use ublox_hpnav::{
    sim::SimulatedReceiver, GnssFixType, HpCoordinate, HpHeight, PositionFix, Session,
    SessionConfig, UbxTransport,
};

mod cli;
mod serial;

use cli::Args;
use serial::SerialTransport;

/// Period of the shared control loop
const LOOP_PERIOD: Duration = Duration::from_millis(100);

struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .format_timestamp(None)
        .format_target(false)
        .filter_level(log::LevelFilter::Info)
        .parse_env("LOG_LEVEL")
        .init();

    let matches = cli::command().get_matches();
    let args = Args::from_matches(&matches)?;
    let config = SessionConfig::default();

    if args.simulate {
        let mut sim = SimulatedReceiver::new()
            .with_auto_advance(true)
            .with_chunk_len(32);
        sim.set_solution(simulated_fix());
        return run(sim, &args, config);
    }

    let port_name = args.port.as_deref().context("no serial port given")?;
    let port = serialport::new(port_name, args.baud)
        .timeout(Duration::from_millis(1))
        .open()
        .with_context(|| format!("failed to open serial port {}", port_name))?;
    run(SerialTransport::new(port), &args, config)
}

fn run<T: UbxTransport>(transport: T, args: &Args, config: SessionConfig) -> Result<()> {
    let mut session = match Session::initialize(transport, StdDelay, config) {
        Ok(session) => session,
        Err(e) => {
            // positions from a missing receiver would be garbage: stop here
            error!("{}", e);
            std::process::exit(1);
        },
    };

    if let Err(e) = session.configure_output_protocol() {
        warn!("Unable to restrict output to UBX: {}", e);
    }
    if let Err(e) = session.set_navigation_rate(args.rate, args.layer) {
        warn!("{}", e);
    }
    match session.get_navigation_rate() {
        Ok(hz) => info!("Navigation rate: {} Hz", hz),
        Err(e) => warn!("{}, keeping {} Hz", e, session.navigation_rate_hz()),
    }

    let mut iteration = 0u64;
    while args.iterations.map_or(true, |max| iteration < max) {
        iteration += 1;
        let start = Instant::now();

        if let Some(fix) = session.poll() {
            report(&fix, args)?;
        }
        let spent = start.elapsed();
        debug!("Position slot took {:?}", spent);

        std::thread::sleep(LOOP_PERIOD.saturating_sub(spent));
    }

    let stats = session.stats();
    info!(
        "{} polls: {} fixes, {} without new data, {} bus errors, {} malformed frames",
        stats.polls, stats.updates, stats.stale, stats.bus_errors, stats.parse_errors
    );
    Ok(())
}

fn report(fix: &PositionFix, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string(fix)?);
        return Ok(());
    }
    let usable = if fix.is_usable(args.max_h_acc) {
        "usable"
    } else {
        "not usable"
    };
    println!(
        "lat {} lon {} h {:.4} m hAcc {} mm fix {} ({})",
        fix.latitude,
        fix.longitude,
        fix.height_ellipsoid.meters(),
        fix.horizontal_accuracy_mm(),
        fix.fix_type,
        usable
    );
    Ok(())
}

fn simulated_fix() -> PositionFix {
    PositionFix {
        itow: 0,
        latitude: HpCoordinate::new(401_091_375, 28),
        longitude: HpCoordinate::new(-1_052_415_234, -61),
        height_ellipsoid: HpHeight::new(1_612_345, 3),
        height_msl: HpHeight::new(1_634_908, -4),
        horizontal_accuracy: 140,
        vertical_accuracy: 230,
        fix_type: GnssFixType::Fix3D,
        fix_ok: true,
        invalid_llh: false,
    }
}
