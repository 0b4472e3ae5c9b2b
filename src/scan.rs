//! Directional boundary scans
//!
//! Each scan fixes one axis and sweeps the other to find the first passing
//! point from one side. The swept axis is the inner loop and runs to
//! completion before the read delay is advanced, so the point returned
//! always carries the lowest read delay that passes at all.
//!
//! The inner sweeps are deliberately bounded well short of the full axis:
//! a "low" edge found above its bound (or a "high" edge below its bound)
//! would leave too small a window to operate in, so those points are not
//! worth finding.

use crate::calibrate::PhyCalibrator;
use crate::error::Error;
use crate::interface::{PhyInterface, ThermalSensor};
use crate::tuning::{
    PhySetting, HIGH_RX_BOUND, HIGH_TX_BOUND, LOW_RX_BOUND, LOW_TX_BOUND,
    MAX_READ_DELAY, MAX_RX, MAX_TX,
};

impl<IF, TS> PhyCalibrator<IF, TS>
where
    IF: PhyInterface,
    TS: ThermalSensor,
{
    /// Sweeps RX upward from 0 at a fixed TX coordinate.
    pub(crate) fn find_rx_low(
        &mut self,
        tx: u8,
        from_read_delay: u8,
    ) -> Result<PhySetting, Error<IF::Error>> {
        for read_delay in from_read_delay..=MAX_READ_DELAY {
            for rx in 0..=LOW_RX_BOUND {
                let setting = PhySetting { rx, tx, read_delay };
                if self.apply_and_check(setting)? {
                    return Ok(setting);
                }
            }
        }

        debug!("unable to find rx low at tx = {}", tx);
        Err(Error::BoundaryNotFound)
    }

    /// Sweeps RX downward from the maximum at a fixed TX coordinate.
    pub(crate) fn find_rx_high(
        &mut self,
        tx: u8,
        from_read_delay: u8,
    ) -> Result<PhySetting, Error<IF::Error>> {
        for read_delay in from_read_delay..=MAX_READ_DELAY {
            for rx in (HIGH_RX_BOUND..=MAX_RX).rev() {
                let setting = PhySetting { rx, tx, read_delay };
                if self.apply_and_check(setting)? {
                    return Ok(setting);
                }
            }
        }

        debug!("unable to find rx high at tx = {}", tx);
        Err(Error::BoundaryNotFound)
    }

    /// Sweeps TX upward from 0 at a fixed RX coordinate.
    pub(crate) fn find_tx_low(
        &mut self,
        rx: u8,
        from_read_delay: u8,
    ) -> Result<PhySetting, Error<IF::Error>> {
        for read_delay in from_read_delay..=MAX_READ_DELAY {
            for tx in 0..=LOW_TX_BOUND {
                let setting = PhySetting { rx, tx, read_delay };
                if self.apply_and_check(setting)? {
                    return Ok(setting);
                }
            }
        }

        debug!("unable to find tx low at rx = {}", rx);
        Err(Error::BoundaryNotFound)
    }

    /// Sweeps TX downward from the maximum at a fixed RX coordinate.
    pub(crate) fn find_tx_high(
        &mut self,
        rx: u8,
        from_read_delay: u8,
    ) -> Result<PhySetting, Error<IF::Error>> {
        for read_delay in from_read_delay..=MAX_READ_DELAY {
            for tx in (HIGH_TX_BOUND..=MAX_TX).rev() {
                let setting = PhySetting { rx, tx, read_delay };
                if self.apply_and_check(setting)? {
                    return Ok(setting);
                }
            }
        }

        debug!("unable to find tx high at rx = {}", rx);
        Err(Error::BoundaryNotFound)
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::{calibrator, Rect};
    use crate::tuning::{PhySetting, INIT_READ_DELAY};
    use crate::Error;

    const REGION: &[Rect] = &[Rect {
        read_delay: (2, 2),
        rx: (10, 40),
        tx: (5, 50),
    }];

    #[test]
    fn rx_low_finds_first_passing_point() {
        let mut cal = calibrator(REGION);
        assert_eq!(
            cal.find_rx_low(16, INIT_READ_DELAY),
            Ok(PhySetting {
                rx: 10,
                tx: 16,
                read_delay: 2
            })
        );
    }

    #[test]
    fn rx_high_scans_downward() {
        let mut cal = calibrator(REGION);
        assert_eq!(
            cal.find_rx_high(16, INIT_READ_DELAY),
            Ok(PhySetting {
                rx: 40,
                tx: 16,
                read_delay: 2
            })
        );
    }

    #[test]
    fn tx_high_scans_downward() {
        let mut cal = calibrator(REGION);
        assert_eq!(
            cal.find_tx_high(17, INIT_READ_DELAY),
            Ok(PhySetting {
                rx: 17,
                tx: 50,
                read_delay: 2
            })
        );
    }

    #[test]
    fn scan_starts_at_the_given_read_delay() {
        // Starting above the only passing read delay must miss the region.
        let mut cal = calibrator(REGION);
        assert_eq!(cal.find_rx_low(16, 3), Err(Error::BoundaryNotFound));
    }

    #[test]
    fn exhaustion_reports_boundary_not_found() {
        let mut cal = calibrator(&[]);
        assert_eq!(
            cal.find_rx_low(16, INIT_READ_DELAY),
            Err(Error::BoundaryNotFound)
        );
        assert_eq!(
            cal.find_tx_low(16, INIT_READ_DELAY),
            Err(Error::BoundaryNotFound)
        );
    }

    #[test]
    fn low_edge_outside_its_bound_is_not_found() {
        // Window starts at rx 20, above the low-edge bound of 15.
        const HIGH_WINDOW: &[Rect] = &[Rect {
            read_delay: (1, 4),
            rx: (20, 63),
            tx: (0, 63),
        }];
        let mut cal = calibrator(HIGH_WINDOW);
        assert_eq!(
            cal.find_rx_low(16, INIT_READ_DELAY),
            Err(Error::BoundaryNotFound)
        );
    }
}
