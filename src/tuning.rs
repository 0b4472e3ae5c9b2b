//! The tuning-point type, the PHY search-space limits and the reference
//! pattern
//!
//! All of the numeric limits in this module are properties of the Cadence
//! controller's delay lines and of the calibration procedure itself, not of
//! any particular flash part.

use serde::{Deserialize, Serialize};

/// Highest RX delay-line step.
pub const MAX_RX: u8 = 63;

/// Highest TX delay-line step.
pub const MAX_TX: u8 = 63;

/// Read delay the boundary scans start sweeping from.
pub const INIT_READ_DELAY: u8 = 1;

/// Highest capture read delay, in clock cycles.
pub const MAX_READ_DELAY: u8 = 4;

/// Upper RX limit for the low-edge scan. A low edge above this is not a
/// usable window.
pub const LOW_RX_BOUND: u8 = 15;

/// Lower RX limit for the high-edge scan.
pub const HIGH_RX_BOUND: u8 = 25;

/// Upper TX limit for the low-edge scan.
pub const LOW_TX_BOUND: u8 = 32;

/// Lower TX limit for the high-edge scan.
pub const HIGH_TX_BOUND: u8 = 48;

/// Last TX coordinate tried when looking for the RX window at the lower end
/// of the TX range.
pub const TX_LOOKUP_LOW_BOUND: u8 = 24;

/// Last TX coordinate tried when looking for the RX window at the upper end
/// of the TX range.
pub const TX_LOOKUP_HIGH_BOUND: u8 = 38;

/// Temperature assumed when the sensor cannot be read, in degrees Celsius.
pub const DEFAULT_TEMP: i16 = 45;

/// Lowest accepted sensor reading, in degrees Celsius.
pub const MIN_TEMP: i16 = -45;

/// Highest accepted sensor reading, in degrees Celsius.
pub const MAX_TEMP: i16 = 135;

/// Midpoint of the accepted temperature range. The compensation term
/// divides by the deviation from this value.
pub const MID_TEMP: i16 = MIN_TEMP + (MAX_TEMP - MIN_TEMP) / 2;

/// Length of [`TUNING_PATTERN`] in bytes.
pub const PATTERN_LEN: usize = 128;

/// The reference pattern expected at the configured flash offset.
///
/// The byte values are chosen to stress the bus: runs of 0xFE/0xFF/0x01
/// produce worst-case transitions on every data line at once, so a sampling
/// point that reads this back exactly is trustworthy for arbitrary data.
pub const TUNING_PATTERN: [u8; PATTERN_LEN] = [
    0xFE, 0xFF, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0xFE, 0xFE, 0x01,
    0x01, 0x01, 0x01, 0x00, 0x00, 0xFE, 0xFE, 0x01, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x00, 0x00, 0xFE, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0xFE,
    0xFE, 0xFF, 0x01, 0x01, 0x01, 0x01, 0x01, 0xFE, 0x00, 0xFE, 0xFE, 0x01,
    0x01, 0x01, 0x01, 0xFE, 0x00, 0xFE, 0xFE, 0x01, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFE, 0x00, 0xFE, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0x00, 0xFE,
    0xFE, 0xFF, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0xFE, 0xFE, 0xFE, 0x01,
    0x01, 0x01, 0x01, 0x00, 0xFE, 0xFE, 0xFE, 0x01, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x00, 0xFE, 0xFE, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0xFE, 0xFE,
    0xFE, 0xFF, 0x01, 0x01, 0x01, 0x01, 0x01, 0xFE, 0xFE, 0xFE, 0xFE, 0x01,
    0x01, 0x01, 0x01, 0xFE, 0xFE, 0xFE, 0xFE, 0x01,
];

/// One hardware-applicable timing configuration
///
/// A setting combines the two fine-grained delay-line steps with the coarse
/// capture read delay. Settings are cheap value types; the calibration code
/// creates them freely and hands the chosen one back to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhySetting {
    /// RX delay-line step, `0..=63`
    pub rx: u8,
    /// TX delay-line step, `0..=63`
    pub tx: u8,
    /// Capture read delay in clock cycles, `0..=4`
    pub read_delay: u8,
}

impl PhySetting {
    /// Creates a new `PhySetting`
    ///
    /// Returns `Some(...)` if all three coordinates are within their valid
    /// ranges (rx, tx in `0..=63`, read_delay in `0..=4`), `None` if any
    /// is not.
    pub fn new(rx: u8, tx: u8, read_delay: u8) -> Option<Self> {
        if rx <= MAX_RX && tx <= MAX_TX && read_delay <= MAX_READ_DELAY {
            Some(PhySetting { rx, tx, read_delay })
        } else {
            None
        }
    }
}
