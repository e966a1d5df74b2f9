use petanque_calibration::CalibrationError;

/// Errors that can occur when measuring a frame.
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    /// A detected object violates its invariants.
    #[error("Invalid detection: {0}")]
    InvalidDetection(String),

    /// An explicit fallback scale factor is not strictly positive.
    #[error("Invalid fallback scale factor: {0}")]
    InvalidFallbackScale(f64),

    /// Error related to calibration.
    #[error(transparent)]
    CalibrationError(#[from] CalibrationError),
}
