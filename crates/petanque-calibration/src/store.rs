use serde::{Deserialize, Serialize};

use crate::backend::CalibrationBackend;
use crate::config::CalibrationConfig;
use crate::error::CalibrationError;
use crate::record::{current_timestamp, CalibrationRecord};

/// Relative slack applied to the accuracy tolerance to absorb rounding of the scale factor.
const TOLERANCE_RELATIVE_EPSILON: f64 = 1e-9;

/// An independent measurement used to check the accuracy of the active calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyCheck {
    /// The true length of the measured segment, in meters.
    pub expected_distance_meters: f64,
    /// The same segment measured in the image, in pixels.
    pub observed_pixels: f64,
}

/// Why a calibration failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationFailure {
    /// There is no active calibration.
    NoCalibration,
    /// The active calibration is older than the configured maximum age.
    StaleCalibration,
    /// The accuracy check exceeded the configured tolerance.
    AccuracyOutOfTolerance,
}

/// Outcome of validating the active calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the calibration can be trusted.
    pub valid: bool,
    /// The reason the calibration is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ValidationFailure>,
    /// The accuracy check segment measured with the active scale factor, in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_distance: Option<f64>,
    /// The true length of the accuracy check segment, in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_distance: Option<f64>,
    /// Relative error of the accuracy check, in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_percent: Option<f64>,
    /// Age of the active calibration, in whole days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<u64>,
}

impl ValidationResult {
    fn failed(reason: ValidationFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            measured_distance: None,
            expected_distance: None,
            error_percent: None,
            age_days: None,
        }
    }
}

/// Calibration state as seen by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationState {
    /// No record is stored.
    Uncalibrated,
    /// A record is stored and within its maximum age.
    Calibrated,
    /// A record is stored but older than the maximum age. It remains usable.
    Stale,
}

/// Holds the single active calibration for one device or camera.
///
/// The store is shared by reference between the calibrator and the distance engine.
/// Read-after-write consistency and atomic replacement come from the backend.
#[derive(Debug)]
pub struct CalibrationStore<B: CalibrationBackend> {
    backend: B,
    config: CalibrationConfig,
}

impl<B: CalibrationBackend> CalibrationStore<B> {
    /// Create a store with the default validation policy.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: CalibrationConfig::default(),
        }
    }

    /// Create a store with a custom validation policy.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::InvalidConfig`] if the policy values are out of range.
    pub fn with_config(backend: B, config: CalibrationConfig) -> Result<Self, CalibrationError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// The validation policy.
    #[inline]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// The persistence backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Make `record` the active calibration, replacing any previous one.
    pub fn save(&self, record: &CalibrationRecord) -> Result<(), CalibrationError> {
        record.check_schema()?;
        self.backend.write(record)?;
        log::info!(
            "Saved calibration: {:.6} m/px from {}",
            record.scale_factor,
            record.reference_object_kind
        );
        Ok(())
    }

    /// The active calibration, if any.
    pub fn load(&self) -> Result<Option<CalibrationRecord>, CalibrationError> {
        self.backend.read()
    }

    /// Whether an active calibration exists.
    pub fn is_calibrated(&self) -> Result<bool, CalibrationError> {
        Ok(self.load()?.is_some())
    }

    /// Remove the active calibration. Clearing an empty store is a no-op.
    pub fn clear(&self) -> Result<(), CalibrationError> {
        self.backend.remove()?;
        log::info!("Cleared calibration");
        Ok(())
    }

    /// The calibration state at time `now` (Unix seconds).
    pub fn status(&self, now: u64) -> Result<CalibrationState, CalibrationError> {
        Ok(match self.load()? {
            None => CalibrationState::Uncalibrated,
            Some(record) if record.age_secs(now) > self.config.max_age_secs => {
                CalibrationState::Stale
            }
            Some(_) => CalibrationState::Calibrated,
        })
    }

    /// Validate the active calibration against the system clock.
    ///
    /// See [`CalibrationStore::validate_at`].
    pub fn validate(
        &self,
        check: Option<AccuracyCheck>,
    ) -> Result<ValidationResult, CalibrationError> {
        self.validate_at(check, current_timestamp())
    }

    /// Validate the active calibration at time `now` (Unix seconds).
    ///
    /// Missing, stale and inaccurate calibrations are reported in the returned
    /// [`ValidationResult`]; they are verdicts, not errors. A stale record is not
    /// deleted.
    ///
    /// # Arguments
    ///
    /// * `check` - An optional independent measurement of a known length.
    /// * `now` - The current Unix timestamp in seconds.
    ///
    /// # Errors
    ///
    /// * [`CalibrationError::InvalidMeasurement`] if the accuracy check has a
    ///   non-positive expected distance or pixel count.
    /// * Backend errors when the record cannot be read.
    pub fn validate_at(
        &self,
        check: Option<AccuracyCheck>,
        now: u64,
    ) -> Result<ValidationResult, CalibrationError> {
        let Some(record) = self.load()? else {
            return Ok(ValidationResult::failed(ValidationFailure::NoCalibration));
        };

        let age_days = record.age_days(now);

        if record.age_secs(now) > self.config.max_age_secs {
            log::warn!("Calibration is {} days old, recalibration advised", age_days);
            return Ok(ValidationResult {
                age_days: Some(age_days),
                ..ValidationResult::failed(ValidationFailure::StaleCalibration)
            });
        }

        let Some(check) = check else {
            return Ok(ValidationResult {
                valid: true,
                reason: None,
                measured_distance: None,
                expected_distance: None,
                error_percent: None,
                age_days: Some(age_days),
            });
        };

        let expected = check.expected_distance_meters;
        if !(expected.is_finite() && expected > 0.0) {
            return Err(CalibrationError::invalid_measurement(format!(
                "expected test distance must be positive, got {expected}"
            )));
        }
        if !(check.observed_pixels.is_finite() && check.observed_pixels > 0.0) {
            return Err(CalibrationError::invalid_measurement(format!(
                "observed test pixels must be positive, got {}",
                check.observed_pixels
            )));
        }

        let measured = record.pixels_to_meters(check.observed_pixels);
        let relative_error = (measured - expected).abs() / expected;
        // rounding must not decide a check that sits exactly on the tolerance
        let valid =
            relative_error <= self.config.accuracy_tolerance * (1.0 + TOLERANCE_RELATIVE_EPSILON);

        log::debug!(
            "Accuracy check: measured {:.4} m, expected {:.4} m ({:.2}% error)",
            measured,
            expected,
            relative_error * 100.0
        );

        Ok(ValidationResult {
            valid,
            reason: (!valid).then_some(ValidationFailure::AccuracyOutOfTolerance),
            measured_distance: Some(measured),
            expected_distance: Some(expected),
            error_percent: Some(relative_error * 100.0),
            age_days: Some(age_days),
        })
    }
}
