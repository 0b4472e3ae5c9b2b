//! Hardware seams the calibration runs against
//!
//! The calibration core never touches registers directly. It talks to a
//! [`PhyInterface`], which extends the `embedded-storage` read contract
//! with the three delay-line setters, and to a [`ThermalSensor`] for the
//! compensation input. Platform code implements these against the real
//! controller and SoC thermal block; the test suite implements them
//! against a synthetic pass/fail oracle.

use embedded_storage::nor_flash::ReadNorFlash;

/// Timing control over one Cadence QSPI/OSPI interface
///
/// Each setter takes effect before the next transaction issued through the
/// `ReadNorFlash` side of the trait. Errors from either side are transport
/// errors: they abort the calibration attempt and are never interpreted as
/// a failing calibration point.
pub trait PhyInterface: ReadNorFlash {
    /// Programs the RX delay line, `value` in `0..=63`.
    fn set_rx_delay(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Programs the TX delay line, `value` in `0..=63`.
    fn set_tx_delay(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Programs the capture read delay, `value` in `0..=4` clock cycles.
    fn set_read_delay(&mut self, value: u8) -> Result<(), Self::Error>;
}

/// A fallible temperature sensor
///
/// A read failure is not fatal to calibration; the procedure substitutes
/// [`DEFAULT_TEMP`] and carries on with a warning. A reading outside the
/// accepted range is fatal.
///
/// [`DEFAULT_TEMP`]: crate::tuning::DEFAULT_TEMP
pub trait ThermalSensor {
    /// Sensor error. Never propagated, only noted.
    type Error;

    /// Reads the current die or board temperature in degrees Celsius.
    fn temperature_celsius(&mut self) -> Result<i16, Self::Error>;
}

/// Stand-in sensor for systems without one
///
/// Always fails to read, which makes the calibration fall back to the
/// default temperature.
pub struct NoThermal;

impl ThermalSensor for NoThermal {
    type Error = ();

    fn temperature_celsius(&mut self) -> Result<i16, Self::Error> {
        Err(())
    }
}
