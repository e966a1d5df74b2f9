use petanque_calibration::{CalibrationRecord, Calibrator, ReferenceObjectKind};
use serde::{Deserialize, Serialize};

use crate::error::DistanceError;
use crate::observation::FrameObservation;

/// Meters per pixel of the approximate fallback scale: one millimeter per pixel.
pub const APPROXIMATE_SCALE_FACTOR: f64 = 0.001;

/// A scale factor chosen by the caller without a calibration.
///
/// Distances measured with it are flagged as approximate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackCalibration {
    scale_factor: f64,
}

impl FallbackCalibration {
    /// Create a fallback with an explicit scale factor in meters per pixel.
    pub fn new(scale_factor: f64) -> Result<Self, DistanceError> {
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(DistanceError::InvalidFallbackScale(scale_factor));
        }
        Ok(Self { scale_factor })
    }

    /// The rough default of one millimeter per pixel.
    pub fn approximate() -> Self {
        Self {
            scale_factor: APPROXIMATE_SCALE_FACTOR,
        }
    }

    /// Meters per pixel.
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}

/// Where the pixel to meter conversion of a measurement comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ScaleSource {
    /// A calibration derived from a reference object.
    Calibrated(CalibrationRecord),
    /// A scale factor supplied explicitly without calibration.
    Fallback(FallbackCalibration),
}

impl ScaleSource {
    /// Meters per pixel.
    #[inline]
    pub fn scale_factor(&self) -> f64 {
        match self {
            ScaleSource::Calibrated(record) => record.scale_factor,
            ScaleSource::Fallback(fallback) => fallback.scale_factor(),
        }
    }

    /// Whether measurements made with this scale are approximations.
    #[inline]
    pub fn is_approximate(&self) -> bool {
        matches!(self, ScaleSource::Fallback(_))
    }

    /// Derive the scale from the cochonnet detected in the same frame, assuming its
    /// nominal diameter.
    ///
    /// # Errors
    ///
    /// [`petanque_calibration::CalibrationError::MissingReferenceObject`] if the frame
    /// holds no cochonnet.
    pub fn from_cochonnet(
        observation: &FrameObservation,
        calibrator: &Calibrator,
    ) -> Result<Self, DistanceError> {
        let cochonnet = observation.cochonnet.as_ref().ok_or_else(|| {
            petanque_calibration::CalibrationError::MissingReferenceObject(
                "no cochonnet detected in frame".to_string(),
            )
        })?;

        let record = calibrator
            .calibrate_with_reference(ReferenceObjectKind::Cochonnet, cochonnet.diameter_pixels())?;

        Ok(ScaleSource::Calibrated(record))
    }
}

impl From<CalibrationRecord> for ScaleSource {
    fn from(record: CalibrationRecord) -> Self {
        ScaleSource::Calibrated(record)
    }
}

impl From<FallbackCalibration> for ScaleSource {
    fn from(fallback: FallbackCalibration) -> Self {
        ScaleSource::Fallback(fallback)
    }
}
