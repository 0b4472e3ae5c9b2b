//! The calibration procedure
//!
//! [`PhyCalibrator`] sequences the boundary scans and bisections into the
//! full search: locate the RX and TX windows, frame the passing region
//! with two corner estimates, classify whether one or two passing regions
//! exist across the read-delay range, then select and verify the final
//! operating point.

use crate::configs::CalibrationConfig;
use crate::error::Error;
use crate::interface::{PhyInterface, ThermalSensor};
use crate::tuning::{
    PhySetting, DEFAULT_TEMP, INIT_READ_DELAY, MAX_READ_DELAY, MAX_RX,
    MAX_TEMP, MAX_TX, MID_TEMP, MIN_TEMP, TX_LOOKUP_HIGH_BOUND,
    TX_LOOKUP_LOW_BOUND,
};

/// How far corners are nudged inward before re-verification, on both axes.
const CORNER_NUDGE: i32 = 4;

/// Inset from the chosen corner along the diagonal when two passing
/// regions exist.
const CORNER_INSET: i32 = 16;

/// Entry point to the calibration API
///
/// Owns the hardware interface and the thermal sensor for the duration of
/// a session, together with the static configuration, the `use_phy`
/// verdict and the last-calibrated cache key.
pub struct PhyCalibrator<IF, TS> {
    pub(crate) interface: IF,
    thermal: TS,
    pub(crate) config: CalibrationConfig,
    use_phy: bool,
    last_setting: Option<PhySetting>,
    calibrated_key: Option<(u32, u8)>,
}

impl<IF, TS> PhyCalibrator<IF, TS> {
    /// Creates a new calibrator around the given interface and sensor.
    pub fn new(interface: IF, thermal: TS, config: CalibrationConfig) -> Self {
        PhyCalibrator {
            interface,
            thermal,
            config,
            use_phy: false,
            last_setting: None,
            calibrated_key: None,
        }
    }

    /// Whether the interface may currently run in PHY mode.
    ///
    /// True after a successful [`calibrate`], false initially and after
    /// any failed attempt.
    ///
    /// [`calibrate`]: PhyCalibrator::calibrate
    pub fn use_phy(&self) -> bool {
        self.use_phy
    }

    /// The setting chosen by the last successful calibration, if any.
    pub fn last_setting(&self) -> Option<PhySetting> {
        self.last_setting
    }

    /// Direct access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IF {
        &mut self.interface
    }

    /// Consumes the calibrator, returning the interface and the sensor.
    pub fn free(self) -> (IF, TS) {
        (self.interface, self.thermal)
    }
}

impl<IF, TS> PhyCalibrator<IF, TS>
where
    IF: PhyInterface,
    TS: ThermalSensor,
{
    /// Runs the full calibration search
    ///
    /// On success the returned setting has been applied to the hardware,
    /// verified against the tuning pattern and cached; the caller should
    /// persist it as the active configuration. On failure `use_phy` is
    /// cleared and the caller must fall back to non-PHY timing for the
    /// session.
    pub fn calibrate(&mut self) -> Result<PhySetting, Error<IF::Error>> {
        if !self.config.enabled {
            self.use_phy = false;
            return Err(Error::Disabled);
        }

        self.use_phy = true;
        match self.run_search() {
            Ok(setting) => {
                debug!(
                    "final tuning point: rx: {} tx: {} rd: {}",
                    setting.rx, setting.tx, setting.read_delay
                );
                self.last_setting = Some(setting);
                Ok(setting)
            }
            Err(error) => {
                self.use_phy = false;
                self.last_setting = None;
                self.calibrated_key = None;
                Err(error)
            }
        }
    }

    /// Calibrates unless the interface is already calibrated for the given
    /// clock rate and chip select.
    ///
    /// A speed or chip-select change invalidates the cached key, so the
    /// whole procedure re-runs from scratch; repeated calls with the same
    /// key return the cached setting without touching the hardware.
    pub fn ensure_calibrated(
        &mut self,
        sclk_hz: u32,
        cs: u8,
    ) -> Result<PhySetting, Error<IF::Error>> {
        if self.calibrated_key == Some((sclk_hz, cs)) {
            if let Some(setting) = self.last_setting {
                return Ok(setting);
            }
        }

        let setting = self.calibrate()?;
        self.calibrated_key = Some((sclk_hz, cs));
        Ok(setting)
    }

    fn run_search(&mut self) -> Result<PhySetting, Error<IF::Error>> {
        let (rx_low, rx_high) = self.scan_rx_window()?;
        let (tx_low, tx_high) = self.scan_tx_window(rx_low, rx_high)?;

        // Theoretical corners. They may not themselves be good points,
        // but the longest diagonal of the passing region runs between
        // them.
        let bottomleft = self.build_corner_low(rx_low, tx_low)?;
        let topright = self.build_corner_high(rx_high, tx_high)?;
        debug!(
            "bottomleft: rx: {} tx: {} rd: {}",
            bottomleft.rx, bottomleft.tx, bottomleft.read_delay
        );
        debug!(
            "topright: rx: {} tx: {} rd: {}",
            topright.rx, topright.tx, topright.read_delay
        );

        let gaplow = self.find_gaplow(bottomleft, topright)?;
        debug!(
            "gaplow: rx: {} tx: {} rd: {}",
            gaplow.rx, gaplow.tx, gaplow.read_delay
        );

        let searchpoint = if bottomleft.read_delay == topright.read_delay {
            self.single_region_point(bottomleft, gaplow)?
        } else {
            let gaphigh = self.find_gaphigh(bottomleft, topright)?;
            debug!(
                "gaphigh: rx: {} tx: {} rd: {}",
                gaphigh.rx, gaphigh.tx, gaphigh.read_delay
            );
            double_region_point(bottomleft, topright, gaplow, gaphigh)
        };

        if self.apply_and_check(searchpoint)? {
            Ok(searchpoint)
        } else {
            debug!("pattern not found at the final calibration point");
            Err(Error::FinalPointUnverifiable)
        }
    }

    /// Locates the RX window edges, walking the fixed TX coordinate up
    /// from `tx_start` until a window appears at all.
    fn scan_rx_window(
        &mut self,
    ) -> Result<(PhySetting, PhySetting), Error<IF::Error>> {
        let mut tx = self.config.tx_start;
        let mut rx_low = loop {
            debug!("searching for rx low at tx = {}", tx);
            match self.find_rx_low(tx, INIT_READ_DELAY) {
                Ok(setting) => break setting,
                Err(Error::BoundaryNotFound) if tx < TX_LOOKUP_LOW_BOUND => {
                    tx += 1
                }
                Err(error) => return Err(error),
            }
        };
        debug!(
            "rx low: rx: {} tx: {} rd: {}",
            rx_low.rx, rx_low.tx, rx_low.read_delay
        );

        let mut rx_high = self.find_rx_high(rx_low.tx, rx_low.read_delay)?;
        debug!(
            "rx high: rx: {} tx: {} rd: {}",
            rx_high.rx, rx_high.tx, rx_high.read_delay
        );

        // Both edges on the same read delay may mean they straddle the
        // failing band instead of bounding a real RX window. Check again
        // at the other end of the TX range and keep the wider estimates.
        if rx_low.read_delay == rx_high.read_delay {
            debug!("rx low and rx high at the same read delay");
            if let Some((alt_low, alt_high)) = self.rescan_rx_window()? {
                if alt_low.rx < rx_low.rx {
                    debug!("updating rx low to the one at tx = {}", alt_low.tx);
                    rx_low = alt_low;
                }
                if alt_high.rx > rx_high.rx {
                    debug!(
                        "updating rx high to the one at tx = {}",
                        alt_high.tx
                    );
                    rx_high = alt_high;
                }
            }
        }

        Ok((rx_low, rx_high))
    }

    /// Repeats the RX edge search from `tx_end` downward.
    ///
    /// Exhaustion here is recoverable: the caller keeps the original
    /// estimates.
    fn rescan_rx_window(
        &mut self,
    ) -> Result<Option<(PhySetting, PhySetting)>, Error<IF::Error>> {
        let mut tx = self.config.tx_end;
        let alt_low = loop {
            debug!("searching for rx low at tx = {}", tx);
            match self.find_rx_low(tx, INIT_READ_DELAY) {
                Ok(setting) => break setting,
                Err(Error::BoundaryNotFound) if tx > TX_LOOKUP_HIGH_BOUND => {
                    tx -= 1
                }
                Err(Error::BoundaryNotFound) => return Ok(None),
                Err(error) => return Err(error),
            }
        };

        let alt_high = match self.find_rx_high(alt_low.tx, alt_low.read_delay)
        {
            Ok(setting) => setting,
            Err(Error::BoundaryNotFound) => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(Some((alt_low, alt_high)))
    }

    /// Locates the TX window edges at 1/4 of the RX window.
    fn scan_tx_window(
        &mut self,
        rx_low: PhySetting,
        rx_high: PhySetting,
    ) -> Result<(PhySetting, PhySetting), Error<IF::Error>> {
        let rx = rx_low.rx + (rx_high.rx - rx_low.rx) / 4;

        let mut tx_low = self.find_tx_low(rx, INIT_READ_DELAY)?;
        debug!(
            "tx low: rx: {} tx: {} rd: {}",
            tx_low.rx, tx_low.tx, tx_low.read_delay
        );

        let mut tx_high = self.find_tx_high(rx, tx_low.read_delay)?;
        debug!(
            "tx high: rx: {} tx: {} rd: {}",
            tx_high.rx, tx_high.tx, tx_high.read_delay
        );

        // Same degenerate-window rule as for RX, re-sampled at 3/4 of the
        // RX window.
        if tx_low.read_delay == tx_high.read_delay {
            let rx_alt = rx_low.rx + 3 * (rx_high.rx - rx_low.rx) / 4;
            debug!(
                "tx low and tx high at the same read delay, checking rx = {}",
                rx_alt
            );
            if let Some((alt_low, alt_high)) = self.rescan_tx_window(rx_alt)? {
                if alt_low.tx < tx_low.tx {
                    debug!("updating tx low to the one at rx = {}", alt_low.rx);
                    tx_low = alt_low;
                }
                if alt_high.tx > tx_high.tx {
                    debug!(
                        "updating tx high to the one at rx = {}",
                        alt_high.rx
                    );
                    tx_high = alt_high;
                }
            }
        }

        Ok((tx_low, tx_high))
    }

    /// Repeats the TX edge search at an alternate RX coordinate.
    /// Exhaustion is recoverable, as in [`rescan_rx_window`].
    ///
    /// [`rescan_rx_window`]: PhyCalibrator::rescan_rx_window
    fn rescan_tx_window(
        &mut self,
        rx: u8,
    ) -> Result<Option<(PhySetting, PhySetting)>, Error<IF::Error>> {
        let alt_low = match self.find_tx_low(rx, INIT_READ_DELAY) {
            Ok(setting) => setting,
            Err(Error::BoundaryNotFound) => return Ok(None),
            Err(error) => return Err(error),
        };

        let alt_high = match self.find_tx_high(rx, alt_low.read_delay) {
            Ok(setting) => setting,
            Err(Error::BoundaryNotFound) => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(Some((alt_low, alt_high)))
    }

    /// Combines the low edges into the bottom-left corner, then nudges it
    /// inward and re-verifies to correct a mis-estimated read delay.
    fn build_corner_low(
        &mut self,
        rx_low: PhySetting,
        tx_low: PhySetting,
    ) -> Result<PhySetting, Error<IF::Error>> {
        let mut corner = PhySetting {
            rx: rx_low.rx,
            tx: tx_low.tx,
            read_delay: rx_low.read_delay.min(tx_low.read_delay),
        };

        let mut probe = corner;
        probe.rx = shifted(probe.rx, CORNER_NUDGE, MAX_RX);
        probe.tx = shifted(probe.tx, CORNER_NUDGE, MAX_TX);
        let mut passed = self.apply_and_check(probe)?;
        if !passed {
            // One-shot correction toward the interior.
            if let Some(read_delay) = probe.read_delay.checked_sub(1) {
                probe.read_delay = read_delay;
                passed = self.apply_and_check(probe)?;
            }
        }
        if passed {
            corner.read_delay = probe.read_delay;
        }

        Ok(corner)
    }

    /// Combines the high edges into the top-right corner; the mirror image
    /// of [`build_corner_low`].
    ///
    /// [`build_corner_low`]: PhyCalibrator::build_corner_low
    fn build_corner_high(
        &mut self,
        rx_high: PhySetting,
        tx_high: PhySetting,
    ) -> Result<PhySetting, Error<IF::Error>> {
        let mut corner = PhySetting {
            rx: rx_high.rx,
            tx: tx_high.tx,
            read_delay: rx_high.read_delay.max(tx_high.read_delay),
        };

        let mut probe = corner;
        probe.rx = shifted(probe.rx, -CORNER_NUDGE, MAX_RX);
        probe.tx = shifted(probe.tx, -CORNER_NUDGE, MAX_TX);
        let mut passed = self.apply_and_check(probe)?;
        if !passed && probe.read_delay < MAX_READ_DELAY {
            probe.read_delay += 1;
            passed = self.apply_and_check(probe)?;
        }
        if passed {
            corner.read_delay = probe.read_delay;
        }

        Ok(corner)
    }

    /// Selects the operating point when one continuous passing region
    /// spans the examined read-delay range.
    ///
    /// The true top-right corner was too small to find, so the start of
    /// the failing region (`gaplow`) stands in for it; the point goes in
    /// the middle of the diagonal, shifted toward where the region will
    /// drift as the temperature deviates from nominal.
    fn single_region_point(
        &mut self,
        bottomleft: PhySetting,
        gaplow: PhySetting,
    ) -> Result<PhySetting, Error<IF::Error>> {
        let topright = gaplow;
        let mut point = PhySetting {
            rx: bottomleft.rx + (topright.rx - bottomleft.rx) / 2,
            tx: bottomleft.tx + (topright.tx - bottomleft.tx) / 2,
            read_delay: bottomleft.read_delay,
        };

        let mut celsius = match self.thermal.temperature_celsius() {
            Ok(celsius) => celsius,
            Err(_) => {
                warn!(
                    "unable to read temperature, assuming {} C",
                    DEFAULT_TEMP
                );
                DEFAULT_TEMP
            }
        };
        if celsius < MIN_TEMP || celsius > MAX_TEMP {
            return Err(Error::TemperatureOutOfRange(celsius));
        }
        // Avoid a zero divisor at the nominal midpoint.
        if celsius == MID_TEMP {
            celsius += 1;
        }
        debug!("temperature: {} C", celsius);

        // Empirically tuned drift term carried over from the vendor
        // calibration; the 330 constant has no documented derivation.
        let divisor = 330 / (celsius as i32 - MID_TEMP as i32);
        let rx_span = topright.rx as i32 - bottomleft.rx as i32;
        let tx_span = topright.tx as i32 - bottomleft.tx as i32;
        point.rx = shifted(point.rx, rx_span / divisor, MAX_RX);
        point.tx = shifted(point.tx, tx_span / divisor, MAX_TX);

        Ok(point)
    }
}

/// Selects the operating point when two disjoint passing regions exist.
///
/// Whichever corner lies farther from its gap has more margin before the
/// failing band; the point is inset from that corner along the diagonal,
/// with the RX axis scaled to the slope of the corner span.
fn double_region_point(
    bottomleft: PhySetting,
    topright: PhySetting,
    gaplow: PhySetting,
    gaphigh: PhySetting,
) -> PhySetting {
    let rx_span = topright.rx as i32 - bottomleft.rx as i32;
    let tx_span = (topright.tx as i32 - bottomleft.tx as i32).max(1);
    let rx_inset = (CORNER_INSET * rx_span) / tx_span;

    if manhattan(gaplow, bottomleft) < manhattan(gaphigh, topright) {
        PhySetting {
            rx: shifted(topright.rx, -rx_inset, MAX_RX),
            tx: shifted(topright.tx, -CORNER_INSET, MAX_TX),
            read_delay: topright.read_delay,
        }
    } else {
        PhySetting {
            rx: shifted(bottomleft.rx, rx_inset, MAX_RX),
            tx: shifted(bottomleft.tx, CORNER_INSET, MAX_TX),
            read_delay: bottomleft.read_delay,
        }
    }
}

fn manhattan(a: PhySetting, b: PhySetting) -> i32 {
    (a.tx as i32 - b.tx as i32).abs() + (a.rx as i32 - b.rx as i32).abs()
}

/// Moves `value` by `shift`, saturating into `0..=max`.
fn shifted(value: u8, shift: i32, max: u8) -> u8 {
    let moved = value as i32 + shift;
    if moved < 0 {
        0
    } else if moved > max as i32 {
        max
    } else {
        moved as u8
    }
}
