//! Synthetic hardware for the test suite
//!
//! [`OracleFlash`] emulates a controller whose passing region is a set of
//! rectangles in (rx, tx, read_delay) space: a pattern read returns the
//! tuning pattern verbatim when the currently applied setting falls in a
//! rectangle, and a corrupted copy otherwise.

use embedded_storage::nor_flash::{
    ErrorType, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

use crate::configs::CalibrationConfig;
use crate::interface::{NoThermal, PhyInterface, ThermalSensor};
use crate::tuning::{PhySetting, PATTERN_LEN, TUNING_PATTERN};
use crate::PhyCalibrator;

/// One passing rectangle; all bounds inclusive.
pub(crate) struct Rect {
    pub read_delay: (u8, u8),
    pub rx: (u8, u8),
    pub tx: (u8, u8),
}

impl Rect {
    fn contains(&self, setting: PhySetting) -> bool {
        setting.read_delay >= self.read_delay.0
            && setting.read_delay <= self.read_delay.1
            && setting.rx >= self.rx.0
            && setting.rx <= self.rx.1
            && setting.tx >= self.tx.0
            && setting.tx <= self.tx.1
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct OracleError;

impl NorFlashError for OracleError {
    fn kind(&self) -> NorFlashErrorKind {
        NorFlashErrorKind::Other
    }
}

pub(crate) struct OracleFlash {
    regions: &'static [Rect],
    applied: PhySetting,
    pub reads: usize,
    pub fail_reads: bool,
}

impl OracleFlash {
    pub fn new(regions: &'static [Rect]) -> Self {
        OracleFlash {
            regions,
            applied: PhySetting {
                rx: 0,
                tx: 0,
                read_delay: 0,
            },
            reads: 0,
            fail_reads: false,
        }
    }
}

impl ErrorType for OracleFlash {
    type Error = OracleError;
}

impl ReadNorFlash for OracleFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_reads {
            return Err(OracleError);
        }
        self.reads += 1;

        let n = bytes.len().min(PATTERN_LEN);
        bytes[..n].copy_from_slice(&TUNING_PATTERN[..n]);

        let applied = self.applied;
        let passing = offset == 0
            && self.regions.iter().any(|region| region.contains(applied));
        if !passing {
            bytes[0] ^= 0xff;
        }

        Ok(())
    }

    fn capacity(&self) -> usize {
        1 << 24
    }
}

impl PhyInterface for OracleFlash {
    fn set_rx_delay(&mut self, value: u8) -> Result<(), Self::Error> {
        self.applied.rx = value;
        Ok(())
    }

    fn set_tx_delay(&mut self, value: u8) -> Result<(), Self::Error> {
        self.applied.tx = value;
        Ok(())
    }

    fn set_read_delay(&mut self, value: u8) -> Result<(), Self::Error> {
        self.applied.read_delay = value;
        Ok(())
    }
}

/// A sensor that always reads the same temperature.
pub(crate) struct FixedThermal(pub i16);

impl ThermalSensor for FixedThermal {
    type Error = ();

    fn temperature_celsius(&mut self) -> Result<i16, Self::Error> {
        Ok(self.0)
    }
}

/// A calibrator over the oracle with no thermal sensor and the default
/// config (pattern at offset 0, tx range 16..48).
pub(crate) fn calibrator(
    regions: &'static [Rect],
) -> PhyCalibrator<OracleFlash, NoThermal> {
    calibrator_with_thermal(regions, NoThermal)
}

pub(crate) fn calibrator_with_thermal<TS: ThermalSensor>(
    regions: &'static [Rect],
    thermal: TS,
) -> PhyCalibrator<OracleFlash, TS> {
    PhyCalibrator::new(
        OracleFlash::new(regions),
        thermal,
        CalibrationConfig::default(),
    )
}
