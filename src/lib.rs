//! Driver crate for PHY calibration of Cadence QSPI/OSPI flash controllers
//!
//! When a Cadence QSPI controller runs its flash interface at high clock
//! rates with the PHY enabled, the point at which read data is sampled has
//! to be tuned against board-level signal skew. The tunable parameters are
//! the RX delay line, the TX delay line (each 0..=63 steps) and a coarse
//! capture read delay (0..=4 clock cycles). Somewhere in that space lies a
//! region where a known tuning pattern reads back correctly; this crate
//! finds that region and picks an operating point inside it with margin
//! against temperature drift.
//!
//! The entry point is [`PhyCalibrator`], which is generic over the hardware
//! seams: a [`PhyInterface`] that programs the delay lines and performs
//! memory-read transactions, and a [`ThermalSensor`] for the temperature
//! compensation input (use [`NoThermal`] if the system has none).
//!
//! ```ignore
//! let mut cal = PhyCalibrator::new(controller, sensor, CalibrationConfig::default());
//! match cal.calibrate() {
//!     Ok(setting) => { /* PHY reads are good to go at `setting` */ }
//!     Err(_) => { /* fall back to non-PHY timing */ }
//! }
//! ```
//!
//! Calibration is fully synchronous and assumes exclusive ownership of the
//! interface while it runs. Nothing is persisted across power cycles; a
//! speed or chip-select change should trigger re-calibration (see
//! [`PhyCalibrator::ensure_calibrated`]).

#![no_std]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

mod bisect;
mod calibrate;
mod error;
mod scan;
mod verify;

pub mod configs;
pub mod interface;
pub mod tuning;

#[cfg(test)]
mod mock;

pub use calibrate::PhyCalibrator;
pub use configs::CalibrationConfig;
pub use error::Error;
pub use interface::{NoThermal, PhyInterface, ThermalSensor};
pub use tuning::PhySetting;
