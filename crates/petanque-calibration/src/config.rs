use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Default age after which a calibration is reported as stale: 7 days.
pub const DEFAULT_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Default relative error accepted by the accuracy check: 10%.
pub const DEFAULT_ACCURACY_TOLERANCE: f64 = 0.10;

/// Policy used when validating the active calibration.
///
/// Missing fields take their default values when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Age in seconds after which a calibration is stale.
    pub max_age_secs: u64,
    /// Largest accepted `|measured - expected| / expected`.
    pub accuracy_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            accuracy_tolerance: DEFAULT_ACCURACY_TOLERANCE,
        }
    }
}

impl CalibrationConfig {
    /// Load a configuration from a JSON file and validate it.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| CalibrationError::FileError(path.to_path_buf(), e))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the policy values are usable.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.max_age_secs == 0 {
            return Err(CalibrationError::InvalidConfig(
                "max_age_secs must be greater than zero".to_string(),
            ));
        }
        if !(self.accuracy_tolerance > 0.0 && self.accuracy_tolerance <= 1.0) {
            return Err(CalibrationError::InvalidConfig(format!(
                "accuracy_tolerance must be in (0, 1], got {}",
                self.accuracy_tolerance
            )));
        }
        Ok(())
    }
}
