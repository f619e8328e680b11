//! # ublox_hpnav
//!
//! High precision position acquisition from u-blox receivers over a polled
//! bus, using the UBX protocol.
//!
//! A [`Session`] is created once with [`Session::initialize`], which fails
//! if no receiver answers. Afterwards the control loop calls
//! [`Session::poll`] every iteration; it returns a [`PositionFix`] only when
//! the receiver produced a new solution and never surfaces bus faults.
//!
//! Exact coordinates
//! =================
//!
//! Latitude and longitude are combined in integer nanodegrees, so the full
//! 1e-9 degree resolution survives on targets without 64-bit floats:
//! ```
//! use ublox_hpnav::HpCoordinate;
//!
//! let lat = HpCoordinate::new(123_456_789, 50);
//! assert_eq!(lat.nanodegrees(), 12_345_678_950);
//! assert_eq!(lat.to_string(), "12.345678950");
//! ```
//!
//! Running against a receiver
//! ==========================
//!
//! Any [`UbxTransport`] works, [`DdcTransport`] wraps an `embedded-hal`
//! I2C bus. The simulated receiver stands in for hardware here:
//! ```
//! # #[cfg(feature = "alloc")] {
//! use ublox_hpnav::{sim::SimulatedReceiver, PersistenceLayer, Session, SessionConfig};
//!
//! struct NoDelay;
//! impl embedded_hal::delay::DelayNs for NoDelay {
//!     fn delay_ns(&mut self, _ns: u32) {}
//! }
//!
//! let mut session =
//!     Session::initialize(SimulatedReceiver::new(), NoDelay, SessionConfig::default())
//!         .expect("receiver present");
//! session.configure_output_protocol().unwrap();
//! session.set_navigation_rate(5, PersistenceLayer::Ram).unwrap();
//! assert_eq!(session.get_navigation_rate().unwrap(), 5);
//!
//! // no solution yet
//! assert!(session.poll().is_none());
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "serde")]
extern crate serde;

pub mod constants;
mod error;
mod parser;
mod position;
mod session;
#[cfg(feature = "alloc")]
pub mod sim;
mod transport;
mod ubx_packets;

pub use crate::{
    error::{ConfigError, InitError, MemWriterError, ParserError},
    parser::{ubx_checksum, Parser},
    position::{HpCoordinate, HpHeight, PositionFix, SplitDegrees},
    session::{PersistenceLayer, PollStats, Session, SessionConfig},
    transport::{DdcTransport, OutputPort, UbxTransport},
    ubx_packets::*,
};
