use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::reference::ReferenceObjectKind;

/// Schema version written by this crate.
pub const CALIBRATION_SCHEMA_VERSION: u32 = 1;

/// Number of seconds in a day.
pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Current Unix timestamp, in seconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn default_schema_version() -> u32 {
    CALIBRATION_SCHEMA_VERSION
}

/// The active pixel to meter calibration and where it came from.
///
/// For a single sample `scale_factor == known_size_meters / pixel_size_observed`.
/// For several samples it is the mean of the per-sample scale factors, and
/// `known_size_meters` and `pixel_size_observed` hold the sample means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    /// Version of the persisted layout.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Meters per pixel.
    pub scale_factor: f64,
    /// The object used as size reference.
    pub reference_object_kind: ReferenceObjectKind,
    /// Physical size of the reference, in meters.
    pub known_size_meters: f64,
    /// Size of the reference in the image, in pixels.
    pub pixel_size_observed: f64,
    /// Number of samples the scale factor was averaged over.
    pub sample_count: usize,
    /// Population standard deviation of the per-sample scale factors.
    pub standard_deviation: f64,
    /// Confidence in the scale factor, in `[0, 1]`.
    pub confidence: f64,
    /// Unix timestamp of creation, in seconds.
    pub created_at: u64,
}

impl CalibrationRecord {
    /// Convert a length in pixels to meters.
    #[inline]
    pub fn pixels_to_meters(&self, pixels: f64) -> f64 {
        pixels * self.scale_factor
    }

    /// Convert a length in meters to pixels.
    #[inline]
    pub fn meters_to_pixels(&self, meters: f64) -> f64 {
        meters / self.scale_factor
    }

    /// Seconds elapsed between creation and `now`. Clamped at zero.
    pub fn age_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    /// Whole days elapsed between creation and `now`.
    pub fn age_days(&self, now: u64) -> u64 {
        self.age_secs(now) / SECONDS_PER_DAY
    }

    /// Check that the record can be interpreted by this crate.
    pub fn check_schema(&self) -> Result<(), CalibrationError> {
        if self.schema_version > CALIBRATION_SCHEMA_VERSION {
            return Err(CalibrationError::UnsupportedSchema {
                found: self.schema_version,
                supported: CALIBRATION_SCHEMA_VERSION,
            });
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(CalibrationError::invalid_measurement(format!(
                "persisted scale factor {} is not positive",
                self.scale_factor
            )));
        }
        if self.sample_count == 0 {
            return Err(CalibrationError::invalid_measurement("persisted record has no samples"));
        }
        Ok(())
    }
}
