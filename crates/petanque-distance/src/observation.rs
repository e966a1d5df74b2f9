use petanque_geometry::Point2d;
use serde::{Deserialize, Serialize};

use crate::error::DistanceError;

/// Identifier assigned to a detected object by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedObjectData {
    id: ObjectId,
    center: Point2d,
    radius_pixels: f64,
    confidence: f64,
}

impl TryFrom<DetectedObjectData> for DetectedObject {
    type Error = DistanceError;

    fn try_from(data: DetectedObjectData) -> Result<Self, Self::Error> {
        DetectedObject::new(data.id, data.center, data.radius_pixels, data.confidence)
    }
}

/// A ball found in the image by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DetectedObjectData")]
pub struct DetectedObject {
    id: ObjectId,
    center: Point2d,
    radius_pixels: f64,
    confidence: f64,
}

impl DetectedObject {
    /// Create a new detection.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier of the object.
    /// * `center` - Center of the object in the image, in pixels.
    /// * `radius_pixels` - Radius of the object in the image, in pixels.
    /// * `confidence` - Detector confidence, clipped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// [`DistanceError::InvalidDetection`] if the radius is not strictly positive
    /// or the center is not finite.
    pub fn new(
        id: ObjectId,
        center: Point2d,
        radius_pixels: f64,
        confidence: f64,
    ) -> Result<Self, DistanceError> {
        if !(radius_pixels.is_finite() && radius_pixels > 0.0) {
            return Err(DistanceError::InvalidDetection(format!(
                "object {id} has radius {radius_pixels}, expected a positive value"
            )));
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(DistanceError::InvalidDetection(format!(
                "object {id} has a non-finite center"
            )));
        }

        // NaN confidence carries no information
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Ok(Self {
            id,
            center,
            radius_pixels,
            confidence,
        })
    }

    /// Identifier of the object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Center of the object, in pixels.
    #[inline]
    pub fn center(&self) -> &Point2d {
        &self.center
    }

    /// Radius of the object, in pixels.
    #[inline]
    pub fn radius_pixels(&self) -> f64 {
        self.radius_pixels
    }

    /// Diameter of the object, in pixels.
    #[inline]
    pub fn diameter_pixels(&self) -> f64 {
        2.0 * self.radius_pixels
    }

    /// Detector confidence, in `[0, 1]`.
    #[inline]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Everything the detector found in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    /// The target ball, if detected.
    #[serde(default)]
    pub cochonnet: Option<DetectedObject>,
    /// The playing balls, in detection order.
    #[serde(default)]
    pub balls: Vec<DetectedObject>,
}

impl FrameObservation {
    /// Create a new observation.
    pub fn new(cochonnet: Option<DetectedObject>, balls: Vec<DetectedObject>) -> Self {
        Self { cochonnet, balls }
    }

    /// Whether the frame holds both a cochonnet and at least one ball.
    pub fn has_measurable_balls(&self) -> bool {
        self.cochonnet.is_some() && !self.balls.is_empty()
    }
}
