//! Lockstep bisection between the two corner estimates
//!
//! Both searches walk the straight line between `bottomleft` and
//! `topright`: a single interpolation step moves rx and tx together, never
//! independently. The read delay stays anchored to one corner, so each
//! search probes exactly one passing region and converges on the point
//! where that region ends along the diagonal.

use crate::calibrate::PhyCalibrator;
use crate::error::Error;
use crate::interface::{PhyInterface, ThermalSensor};
use crate::tuning::PhySetting;

fn toward(from: u8, to: u8) -> u8 {
    (from as i16 + (to as i16 - from as i16) / 2) as u8
}

impl<IF, TS> PhyCalibrator<IF, TS>
where
    IF: PhyInterface,
    TS: ThermalSensor,
{
    /// Finds where the passing region anchored at `bottomleft`'s read
    /// delay ends, moving up the diagonal.
    pub(crate) fn find_gaplow(
        &mut self,
        bottomleft: PhySetting,
        topright: PhySetting,
    ) -> Result<PhySetting, Error<IF::Error>> {
        let mut left = bottomleft;
        let mut right = topright;
        let mut mid = PhySetting {
            rx: toward(left.rx, right.rx),
            tx: toward(left.tx, right.tx),
            read_delay: left.read_delay,
        };

        loop {
            if self.apply_and_check(mid)? {
                // Still inside the region, move toward the upper half.
                left.tx = mid.tx;
                left.rx = mid.rx;

                mid.tx = toward(mid.tx, right.tx);
                mid.rx = toward(mid.rx, right.rx);
            } else {
                // Past the region, move toward the lower half.
                right.tx = mid.tx;
                right.rx = mid.rx;

                mid.tx = toward(left.tx, mid.tx);
                mid.rx = toward(left.rx, mid.rx);
            }

            // Stop once the window has closed on either axis.
            if (right.tx as i16 - left.tx as i16) < 2
                || (right.rx as i16 - left.rx as i16) < 2
            {
                return Ok(mid);
            }
        }
    }

    /// Finds where the passing region anchored at `topright`'s read delay
    /// starts, moving down the diagonal.
    pub(crate) fn find_gaphigh(
        &mut self,
        bottomleft: PhySetting,
        topright: PhySetting,
    ) -> Result<PhySetting, Error<IF::Error>> {
        let mut left = bottomleft;
        let mut right = topright;
        let mut mid = PhySetting {
            rx: toward(left.rx, right.rx),
            tx: toward(left.tx, right.tx),
            read_delay: right.read_delay,
        };

        loop {
            if self.apply_and_check(mid)? {
                // Inside the region, its start is in the lower half.
                right.tx = mid.tx;
                right.rx = mid.rx;

                mid.tx = toward(left.tx, mid.tx);
                mid.rx = toward(left.rx, mid.rx);
            } else {
                // Not reached yet, move toward the upper half.
                left.tx = mid.tx;
                left.rx = mid.rx;

                mid.tx = toward(mid.tx, right.tx);
                mid.rx = toward(mid.rx, right.rx);
            }

            if (right.tx as i16 - left.tx as i16) < 2
                || (right.rx as i16 - left.rx as i16) < 2
            {
                return Ok(mid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::{calibrator, Rect};
    use crate::tuning::PhySetting;

    #[test]
    fn gaplow_converges_on_the_failing_edge() {
        // Passing up to rx 20 / tx 20 on the diagonal from (5, 5).
        const LOWER: &[Rect] = &[Rect {
            read_delay: (1, 1),
            rx: (0, 20),
            tx: (0, 20),
        }];
        let mut cal = calibrator(LOWER);

        let bottomleft = PhySetting {
            rx: 5,
            tx: 5,
            read_delay: 1,
        };
        let topright = PhySetting {
            rx: 60,
            tx: 60,
            read_delay: 1,
        };
        let gap = cal.find_gaplow(bottomleft, topright).unwrap();

        assert_eq!(gap.read_delay, 1);
        assert!(gap.rx >= 18 && gap.rx <= 22, "rx = {}", gap.rx);
        assert!(gap.tx >= 18 && gap.tx <= 22, "tx = {}", gap.tx);
    }

    #[test]
    fn gaphigh_converges_on_the_region_start() {
        // Passing from rx 40 / tx 40 up to the corner at (60, 60).
        const UPPER: &[Rect] = &[Rect {
            read_delay: (1, 1),
            rx: (40, 63),
            tx: (40, 63),
        }];
        let mut cal = calibrator(UPPER);

        let bottomleft = PhySetting {
            rx: 5,
            tx: 5,
            read_delay: 1,
        };
        let topright = PhySetting {
            rx: 60,
            tx: 60,
            read_delay: 1,
        };
        let gap = cal.find_gaphigh(bottomleft, topright).unwrap();

        assert_eq!(gap.read_delay, 1);
        assert!(gap.rx >= 38 && gap.rx <= 42, "rx = {}", gap.rx);
        assert!(gap.tx >= 38 && gap.tx <= 42, "tx = {}", gap.tx);
    }
}
