/// An error that can occur during PHY calibration
///
/// `E` is the error type of the underlying [`PhyInterface`]. Any value of
/// this enum is terminal for the calibration attempt: the calibrator
/// clears its `use_phy` flag and the caller is expected to fall back to
/// non-PHY timing for the session.
///
/// [`PhyInterface`]: crate::PhyInterface
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Error occurred while talking to the controller or flash
    ///
    /// This is a transport failure, distinct from a correctly executed
    /// read that returned the wrong bytes.
    Flash(E),

    /// PHY calibration is disabled by configuration
    Disabled,

    /// An axis scan exhausted its search space without a passing point
    ///
    /// There is no usable passing region; the interface cannot run in PHY
    /// mode at the current speed.
    BoundaryNotFound,

    /// The sensor reported a temperature outside the operating range
    ///
    /// Carries the offending reading in degrees Celsius. The accepted
    /// range is [`MIN_TEMP`]`..=`[`MAX_TEMP`].
    ///
    /// [`MIN_TEMP`]: crate::tuning::MIN_TEMP
    /// [`MAX_TEMP`]: crate::tuning::MAX_TEMP
    TemperatureOutOfRange(i16),

    /// The selected operating point failed verification
    ///
    /// The search converged, but the final pattern read at the chosen
    /// point did not match. There is no further retry at this level.
    FinalPointUnverifiable,
}
