//! Static configuration for a calibration run
//!
//! These values come from the board or device description (on Linux/U-Boot
//! systems, the `cdns,phy-*` device-tree properties) and stay fixed for
//! the lifetime of a [`PhyCalibrator`].
//!
//! [`PhyCalibrator`]: crate::PhyCalibrator

use serde::{Deserialize, Serialize};

/// Configuration for PHY calibration
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    /// Flash offset where the tuning pattern is stored.
    ///
    /// The pattern has to be written there ahead of time (typically by the
    /// flashing tool); calibration only ever reads it.
    pub pattern_address: u32,

    /// TX coordinate the RX-window search starts at.
    pub tx_start: u8,

    /// TX coordinate the degenerate-window re-scan starts at, at the other
    /// end of the usable TX range.
    pub tx_end: u8,

    /// Whether PHY calibration is enabled at all.
    ///
    /// When false, [`calibrate`] returns [`Error::Disabled`] without
    /// touching the hardware, and the caller should use non-PHY timing.
    ///
    /// [`calibrate`]: crate::PhyCalibrator::calibrate
    /// [`Error::Disabled`]: crate::Error::Disabled
    pub enabled: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            pattern_address: 0,
            tx_start: 16,
            tx_end: 48,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_can_be_stored_and_restored_through_serde() {
        fn assert_serde<T: Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<CalibrationConfig>();
    }
}
