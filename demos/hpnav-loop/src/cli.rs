use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, ValueEnum};
use ublox_hpnav::PersistenceLayer;

const DEFAULT_RATE_HZ: &str = "5";
/// 5 cm, in 0.1 mm
const DEFAULT_MAX_H_ACC: &str = "500";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliLayer {
    Ram,
    Bbr,
    Flash,
    Default,
}

impl From<CliLayer> for PersistenceLayer {
    fn from(layer: CliLayer) -> Self {
        match layer {
            CliLayer::Ram => PersistenceLayer::Ram,
            CliLayer::Bbr => PersistenceLayer::BatteryBackedRam,
            CliLayer::Flash => PersistenceLayer::Flash,
            CliLayer::Default => PersistenceLayer::Default,
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub port: Option<String>,
    pub baud: u32,
    pub simulate: bool,
    pub rate: u16,
    pub layer: PersistenceLayer,
    /// 0.1 mm
    pub max_h_acc: u32,
    pub iterations: Option<u64>,
    pub json: bool,
}

pub fn command() -> clap::Command {
    clap::Command::new("hpnav-loop")
        .about("Polls high precision position fixes from a u-blox receiver in a fixed-period loop")
        .arg(
            Arg::new("port")
                .value_name("port")
                .short('p')
                .long("port")
                .required_unless_present("simulate")
                .help("Serial port the receiver is connected to"),
        )
        .arg(
            Arg::new("baud")
                .value_name("baud")
                .short('s')
                .long("baud")
                .default_value("38400")
                .value_parser(value_parser!(u32))
                .help("Baud rate of the serial port"),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .action(ArgAction::SetTrue)
                .conflicts_with("port")
                .help("Run against a simulated receiver instead of hardware"),
        )
        .arg(
            Arg::new("rate")
                .value_name("hz")
                .short('r')
                .long("rate")
                .default_value(DEFAULT_RATE_HZ)
                .value_parser(value_parser!(u16).range(1..))
                .help("Navigation rate to configure"),
        )
        .arg(
            Arg::new("layer")
                .long("layer")
                .default_value("ram")
                .value_parser(value_parser!(CliLayer))
                .help("Configuration layer the navigation rate is written to"),
        )
        .arg(
            Arg::new("max-h-acc")
                .value_name("0.1mm")
                .long("max-h-acc")
                .default_value(DEFAULT_MAX_H_ACC)
                .value_parser(value_parser!(u32))
                .help("Horizontal accuracy a fix needs to be reported as usable"),
        )
        .arg(
            Arg::new("iterations")
                .short('n')
                .long("iterations")
                .value_parser(value_parser!(u64))
                .help("Stop after this many loop iterations"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print every fix as a JSON object"),
        )
}

impl Args {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let layer = *matches
            .get_one::<CliLayer>("layer")
            .context("missing layer")?;
        Ok(Self {
            port: matches.get_one::<String>("port").cloned(),
            baud: *matches.get_one::<u32>("baud").context("missing baud rate")?,
            simulate: matches.get_flag("simulate"),
            rate: *matches
                .get_one::<u16>("rate")
                .context("missing navigation rate")?,
            layer: layer.into(),
            max_h_acc: *matches
                .get_one::<u32>("max-h-acc")
                .context("missing accuracy limit")?,
            iterations: matches.get_one::<u64>("iterations").copied(),
            json: matches.get_flag("json"),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simulate_needs_no_port() {
        let matches = command()
            .try_get_matches_from(["hpnav-loop", "--simulate", "--rate", "20", "-n", "10"])
            .unwrap();
        let args = Args::from_matches(&matches).unwrap();
        assert!(args.simulate);
        assert_eq!(args.port, None);
        assert_eq!(args.rate, 20);
        assert_eq!(args.layer, PersistenceLayer::Ram);
        assert_eq!(args.max_h_acc, 500);
        assert_eq!(args.iterations, Some(10));
    }

    #[test]
    fn port_is_required_without_simulation() {
        assert!(command().try_get_matches_from(["hpnav-loop"]).is_err());
        let matches = command()
            .try_get_matches_from(["hpnav-loop", "-p", "/dev/ttyACM0", "--layer", "flash"])
            .unwrap();
        let args = Args::from_matches(&matches).unwrap();
        assert_eq!(args.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(args.layer, PersistenceLayer::Flash);
        assert_eq!(args.baud, 38400);
    }
}
