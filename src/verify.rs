//! Applying a setting and checking the tuning pattern
//!
//! One apply-and-check round-trip is the pass/fail primitive everything
//! else is built on. A mismatch is a definitive failing verdict for that
//! point; only transport errors propagate.

use crate::calibrate::PhyCalibrator;
use crate::error::Error;
use crate::interface::{PhyInterface, ThermalSensor};
use crate::tuning::{PhySetting, PATTERN_LEN, TUNING_PATTERN};

impl<IF, TS> PhyCalibrator<IF, TS>
where
    IF: PhyInterface,
    TS: ThermalSensor,
{
    /// Programs the delay lines and the capture read delay with `setting`.
    pub(crate) fn apply_setting(
        &mut self,
        setting: PhySetting,
    ) -> Result<(), Error<IF::Error>> {
        self.interface
            .set_rx_delay(setting.rx)
            .map_err(Error::Flash)?;
        self.interface
            .set_tx_delay(setting.tx)
            .map_err(Error::Flash)?;
        self.interface
            .set_read_delay(setting.read_delay)
            .map_err(Error::Flash)?;

        Ok(())
    }

    /// Applies `setting` and reads the pattern window back once.
    ///
    /// Returns `Ok(true)` iff every byte matches the tuning pattern.
    pub(crate) fn apply_and_check(
        &mut self,
        setting: PhySetting,
    ) -> Result<bool, Error<IF::Error>> {
        self.apply_setting(setting)?;

        let mut read_back = [0; PATTERN_LEN];
        self.interface
            .read(self.config.pattern_address, &mut read_back)
            .map_err(Error::Flash)?;

        Ok(read_back == TUNING_PATTERN)
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::{calibrator, OracleError, Rect};
    use crate::tuning::PhySetting;
    use crate::Error;

    const REGION: &[Rect] = &[Rect {
        read_delay: (2, 2),
        rx: (10, 40),
        tx: (5, 50),
    }];

    #[test]
    fn matching_read_passes() {
        let mut cal = calibrator(REGION);
        let setting = PhySetting {
            rx: 20,
            tx: 20,
            read_delay: 2,
        };
        assert_eq!(cal.apply_and_check(setting), Ok(true));
    }

    #[test]
    fn mismatch_is_a_failing_verdict_not_an_error() {
        let mut cal = calibrator(REGION);
        let setting = PhySetting {
            rx: 20,
            tx: 20,
            read_delay: 1,
        };
        assert_eq!(cal.apply_and_check(setting), Ok(false));
    }

    #[test]
    fn transport_error_propagates() {
        let mut cal = calibrator(REGION);
        cal.interface_mut().fail_reads = true;
        let setting = PhySetting {
            rx: 20,
            tx: 20,
            read_delay: 2,
        };
        assert_eq!(
            cal.apply_and_check(setting),
            Err(Error::Flash(OracleError))
        );
    }
}
