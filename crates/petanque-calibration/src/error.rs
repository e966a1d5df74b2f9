use std::path::PathBuf;

/// Errors that can occur when calibrating or using a calibration.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationError {
    /// A size or pixel measurement is not strictly positive and finite.
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// Multi-sample calibration was attempted without samples.
    #[error("Cannot calibrate from an empty sample set")]
    EmptySampleSet,

    /// No active calibration exists and no fallback was supplied.
    #[error("No active calibration")]
    NoCalibration,

    /// The reference object kind has no known physical size.
    #[error("Unknown reference object: {0}")]
    MissingReferenceObject(String),

    /// The configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The persisted record was written by a newer schema.
    #[error("Unsupported calibration schema version {found} (supported up to {supported})")]
    UnsupportedSchema {
        /// Version found in the persisted record.
        found: u32,
        /// Highest version this crate understands.
        supported: u32,
    },

    /// Failed to access the persisted calibration.
    #[error("Failed to access calibration file {0}")]
    FileError(PathBuf, #[source] std::io::Error),

    /// Failed to encode or decode the persisted calibration.
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    /// A lock guarding the active calibration was poisoned.
    #[error("Calibration storage lock poisoned")]
    LockPoisoned,
}

impl CalibrationError {
    /// Create an invalid measurement error.
    pub fn invalid_measurement(details: impl Into<String>) -> Self {
        Self::InvalidMeasurement(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CalibrationError::invalid_measurement("pixel size must be positive");
        assert!(format!("{err}").contains("pixel size must be positive"));

        let err = CalibrationError::MissingReferenceObject("tennis".to_string());
        assert!(format!("{err}").contains("tennis"));

        let err = CalibrationError::UnsupportedSchema {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            format!("{err}"),
            "Unsupported calibration schema version 3 (supported up to 1)"
        );
    }
}
