use serde::{Deserialize, Serialize};

use crate::backend::CalibrationBackend;
use crate::error::CalibrationError;
use crate::record::{current_timestamp, CalibrationRecord, CALIBRATION_SCHEMA_VERSION};
use crate::reference::ReferenceObjectKind;
use crate::store::CalibrationStore;

/// One measurement of an object of known size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationSample {
    /// Physical size of the object, in meters.
    pub known_size_meters: f64,
    /// Size of the object in the image, in pixels.
    pub observed_pixel_size: f64,
}

impl CalibrationSample {
    /// Create a new sample.
    pub fn new(known_size_meters: f64, observed_pixel_size: f64) -> Self {
        Self {
            known_size_meters,
            observed_pixel_size,
        }
    }

    /// Meters per pixel for this sample, after checking both sizes are positive.
    pub fn scale_factor(&self) -> Result<f64, CalibrationError> {
        if !(self.observed_pixel_size.is_finite() && self.observed_pixel_size > 0.0) {
            return Err(CalibrationError::invalid_measurement(format!(
                "observed pixel size must be positive, got {}",
                self.observed_pixel_size
            )));
        }
        if !(self.known_size_meters.is_finite() && self.known_size_meters > 0.0) {
            return Err(CalibrationError::invalid_measurement(format!(
                "known size must be positive, got {}",
                self.known_size_meters
            )));
        }
        let scale_factor = self.known_size_meters / self.observed_pixel_size;
        if !scale_factor.is_finite() {
            return Err(CalibrationError::invalid_measurement(format!(
                "scale factor of {} m over {} px overflows",
                self.known_size_meters, self.observed_pixel_size
            )));
        }
        Ok(scale_factor)
    }
}

/// Derives calibration records from reference measurements.
///
/// The calibrator is stateless apart from the clock used to stamp records.
#[derive(Debug, Clone, Copy)]
pub struct Calibrator {
    clock: fn() -> u64,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            clock: current_timestamp,
        }
    }
}

impl Calibrator {
    /// Create a calibrator stamping records with the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calibrator stamping records with a custom clock returning Unix seconds.
    pub fn with_clock(clock: fn() -> u64) -> Self {
        Self { clock }
    }

    /// Calibrate from a single object of known size.
    ///
    /// # Arguments
    ///
    /// * `known_size_meters` - Physical size of the object, in meters.
    /// * `observed_pixel_size` - Size of the object in the image, in pixels.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::InvalidMeasurement`] if either size is not strictly positive.
    pub fn calibrate_single(
        &self,
        known_size_meters: f64,
        observed_pixel_size: f64,
    ) -> Result<CalibrationRecord, CalibrationError> {
        self.single(
            ReferenceObjectKind::Custom,
            CalibrationSample::new(known_size_meters, observed_pixel_size),
        )
    }

    /// Calibrate from a cochonnet or a boule using its nominal diameter.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::MissingReferenceObject`] if the kind has no nominal size.
    pub fn calibrate_with_reference(
        &self,
        kind: ReferenceObjectKind,
        observed_pixel_size: f64,
    ) -> Result<CalibrationRecord, CalibrationError> {
        let known_size = kind
            .nominal_diameter()
            .ok_or_else(|| CalibrationError::MissingReferenceObject(kind.to_string()))?;

        log::debug!(
            "Calibrating with {} ({} mm) observed at {} px",
            kind,
            known_size * 1000.0,
            observed_pixel_size
        );

        self.single(kind, CalibrationSample::new(known_size, observed_pixel_size))
    }

    /// Calibrate from several measurements.
    ///
    /// The scale factor is the mean of the per-sample scale factors. The confidence
    /// is `1 - stddev / mean`, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// * [`CalibrationError::EmptySampleSet`] if `samples` is empty.
    /// * [`CalibrationError::InvalidMeasurement`] if any sample is not strictly positive.
    pub fn calibrate_multi_sample(
        &self,
        samples: &[CalibrationSample],
    ) -> Result<CalibrationRecord, CalibrationError> {
        if samples.is_empty() {
            return Err(CalibrationError::EmptySampleSet);
        }

        let scale_factors = samples
            .iter()
            .map(CalibrationSample::scale_factor)
            .collect::<Result<Vec<_>, _>>()?;

        // Welford's update keeps identical samples at exactly zero deviation
        let (mean, m2) = scale_factors
            .iter()
            .enumerate()
            .fold((0.0_f64, 0.0_f64), |(mean, m2), (i, &x)| {
                let delta = x - mean;
                let mean = mean + delta / (i + 1) as f64;
                (mean, m2 + delta * (x - mean))
            });
        let n = samples.len() as f64;
        let standard_deviation = (m2 / n).sqrt();

        let confidence = if standard_deviation == 0.0 {
            1.0
        } else {
            (1.0 - standard_deviation / mean).clamp(0.0, 1.0)
        };

        let record = CalibrationRecord {
            schema_version: CALIBRATION_SCHEMA_VERSION,
            scale_factor: mean,
            reference_object_kind: ReferenceObjectKind::Custom,
            known_size_meters: samples.iter().map(|s| s.known_size_meters).sum::<f64>() / n,
            pixel_size_observed: samples.iter().map(|s| s.observed_pixel_size).sum::<f64>() / n,
            sample_count: samples.len(),
            standard_deviation,
            confidence,
            created_at: (self.clock)(),
        };

        log::info!(
            "Calibrated from {} samples: {:.6} m/px (stddev {:.6}, confidence {:.2})",
            record.sample_count,
            record.scale_factor,
            record.standard_deviation,
            record.confidence
        );

        Ok(record)
    }

    /// Calibrate from a reference object and make the result the active calibration.
    ///
    /// The store is only written when calibration succeeds.
    pub fn calibrate_reference_into<B: CalibrationBackend>(
        &self,
        store: &CalibrationStore<B>,
        kind: ReferenceObjectKind,
        observed_pixel_size: f64,
    ) -> Result<CalibrationRecord, CalibrationError> {
        let record = self.calibrate_with_reference(kind, observed_pixel_size)?;
        store.save(&record)?;
        Ok(record)
    }

    /// Calibrate from several samples and make the result the active calibration.
    ///
    /// The store is only written when calibration succeeds.
    pub fn calibrate_samples_into<B: CalibrationBackend>(
        &self,
        store: &CalibrationStore<B>,
        samples: &[CalibrationSample],
    ) -> Result<CalibrationRecord, CalibrationError> {
        let record = self.calibrate_multi_sample(samples)?;
        store.save(&record)?;
        Ok(record)
    }

    fn single(
        &self,
        kind: ReferenceObjectKind,
        sample: CalibrationSample,
    ) -> Result<CalibrationRecord, CalibrationError> {
        let scale_factor = sample.scale_factor()?;

        let record = CalibrationRecord {
            schema_version: CALIBRATION_SCHEMA_VERSION,
            scale_factor,
            reference_object_kind: kind,
            known_size_meters: sample.known_size_meters,
            pixel_size_observed: sample.observed_pixel_size,
            sample_count: 1,
            standard_deviation: 0.0,
            confidence: 1.0,
            created_at: (self.clock)(),
        };

        log::info!("Calibrated with {}: {:.6} m/px", kind, scale_factor);

        Ok(record)
    }
}
