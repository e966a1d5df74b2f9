use petanque_calibration::{
    current_timestamp, CalibrationBackend, CalibrationError, CalibrationStore,
};
use petanque_geometry::ops::distance_2d;
use serde::{Deserialize, Serialize};

use crate::error::DistanceError;
use crate::observation::{FrameObservation, ObjectId};
use crate::scale::{FallbackCalibration, ScaleSource};

/// The measured distance of one ball to the cochonnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResult {
    /// The ball the distance belongs to.
    pub object_id: ObjectId,
    /// Distance between the ball and cochonnet centers, in meters.
    pub distance_meters: f64,
    /// Position in the ranking, 0 being the closest ball.
    pub rank: usize,
    /// The lower of the ball and cochonnet detection confidences.
    pub confidence: f64,
}

/// The measured distance between two balls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairDistance {
    /// The ball detected first.
    pub object_a_id: ObjectId,
    /// The ball detected second.
    pub object_b_id: ObjectId,
    /// Distance between the two centers, in meters.
    pub distance_meters: f64,
}

/// Everything measured in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeasurement {
    /// Balls ordered by distance to the cochonnet.
    pub ranking: Vec<DistanceResult>,
    /// Distances between every pair of balls.
    pub pairs: Vec<PairDistance>,
    /// Distance of the closest ball, if any ball was ranked.
    pub closest_distance: Option<f64>,
    /// Whether the distances rely on a fallback scale instead of a calibration.
    pub approximate: bool,
    /// The scale factor used, in meters per pixel. Absent when nothing was measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
}

/// Rank the balls of a frame by their distance to the cochonnet.
///
/// An observation without cochonnet or without balls yields an empty ranking. The
/// sort is stable: balls at exactly the same distance keep their detection order.
///
/// # Arguments
///
/// * `observation` - The detector output for the frame.
/// * `scale` - The pixel to meter conversion.
///
/// # Returns
///
/// The balls in ascending distance order, ranked from 0.
///
/// # Example
///
/// ```
/// use petanque_distance::{
///     compute_distances, DetectedObject, FallbackCalibration, FrameObservation, ObjectId,
/// };
/// use petanque_geometry::Point2d;
///
/// let cochonnet = DetectedObject::new(ObjectId(0), Point2d::new(0.0, 0.0), 15.0, 1.0).unwrap();
/// let ball = DetectedObject::new(ObjectId(1), Point2d::new(30.0, 40.0), 35.0, 0.9).unwrap();
/// let observation = FrameObservation::new(Some(cochonnet), vec![ball]);
///
/// let ranking = compute_distances(&observation, &FallbackCalibration::approximate().into());
/// assert_eq!(ranking.len(), 1);
/// assert!((ranking[0].distance_meters - 0.05).abs() < 1e-12);
/// ```
pub fn compute_distances(
    observation: &FrameObservation,
    scale: &ScaleSource,
) -> Vec<DistanceResult> {
    let Some(cochonnet) = observation.cochonnet.as_ref() else {
        return Vec::new();
    };

    let scale_factor = scale.scale_factor();

    let mut results = observation
        .balls
        .iter()
        .map(|ball| DistanceResult {
            object_id: ball.id(),
            distance_meters: distance_2d(ball.center(), cochonnet.center()) * scale_factor,
            rank: 0,
            confidence: ball.confidence().min(cochonnet.confidence()),
        })
        .collect::<Vec<_>>();

    results.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

    for (rank, result) in results.iter_mut().enumerate() {
        result.rank = rank;
        log::debug!(
            "ball {} rank {} at {:.4} m",
            result.object_id,
            rank,
            result.distance_meters
        );
    }

    results
}

/// Distances between every unordered pair of balls, the cochonnet excluded.
///
/// Pairs are listed in detection order: `(0, 1), (0, 2), .., (1, 2), ..`.
pub fn pairwise_distances(
    observation: &FrameObservation,
    scale: &ScaleSource,
) -> Vec<PairDistance> {
    let scale_factor = scale.scale_factor();
    let balls = &observation.balls;

    let mut pairs = Vec::with_capacity(balls.len() * balls.len().saturating_sub(1) / 2);
    for (i, a) in balls.iter().enumerate() {
        for b in &balls[i + 1..] {
            pairs.push(PairDistance {
                object_a_id: a.id(),
                object_b_id: b.id(),
                distance_meters: distance_2d(a.center(), b.center()) * scale_factor,
            });
        }
    }

    pairs
}

/// Measures frames against the active calibration of a store.
///
/// When the store holds no calibration the engine falls back to an explicit
/// [`FallbackCalibration`] if one was given, and flags the measurements as
/// approximate.
pub struct DistanceEngine<'s, B: CalibrationBackend> {
    store: &'s CalibrationStore<B>,
    fallback: Option<FallbackCalibration>,
}

impl<'s, B: CalibrationBackend> DistanceEngine<'s, B> {
    /// Create an engine that requires a calibration.
    pub fn new(store: &'s CalibrationStore<B>) -> Self {
        Self {
            store,
            fallback: None,
        }
    }

    /// Use `fallback` when the store holds no calibration.
    pub fn with_fallback(mut self, fallback: FallbackCalibration) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// The scale to measure with: the active calibration, else the fallback.
    ///
    /// A stale calibration is still used; staleness is only logged.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::NoCalibration`] if the store is empty and no fallback was
    /// given.
    pub fn resolve_scale(&self) -> Result<ScaleSource, DistanceError> {
        self.resolve_scale_at(current_timestamp())
    }

    /// The scale to measure with at time `now` (Unix seconds).
    ///
    /// See [`DistanceEngine::resolve_scale`].
    pub fn resolve_scale_at(&self, now: u64) -> Result<ScaleSource, DistanceError> {
        if let Some(record) = self.store.load()? {
            if record.age_secs(now) > self.store.config().max_age_secs {
                log::warn!(
                    "Measuring with a calibration {} days old",
                    record.age_days(now)
                );
            }
            return Ok(ScaleSource::Calibrated(record));
        }

        match self.fallback {
            Some(fallback) => {
                log::warn!(
                    "No calibration, using approximate scale of {} m/px",
                    fallback.scale_factor()
                );
                Ok(ScaleSource::Fallback(fallback))
            }
            None => Err(CalibrationError::NoCalibration.into()),
        }
    }

    /// Rank the balls of a frame with the resolved scale.
    ///
    /// A frame with nothing to rank returns an empty ranking without resolving the
    /// scale, so it is not an error even when uncalibrated.
    pub fn compute_distances(
        &self,
        observation: &FrameObservation,
    ) -> Result<Vec<DistanceResult>, DistanceError> {
        if !observation.has_measurable_balls() {
            return Ok(Vec::new());
        }
        let scale = self.resolve_scale()?;
        Ok(compute_distances(observation, &scale))
    }

    /// Distances between every pair of balls with the resolved scale.
    pub fn pairwise_distances(
        &self,
        observation: &FrameObservation,
    ) -> Result<Vec<PairDistance>, DistanceError> {
        if observation.balls.len() < 2 {
            return Ok(Vec::new());
        }
        let scale = self.resolve_scale()?;
        Ok(pairwise_distances(observation, &scale))
    }

    /// Rank the balls and measure every pair in one pass over a single scale.
    pub fn measure_frame(
        &self,
        observation: &FrameObservation,
    ) -> Result<FrameMeasurement, DistanceError> {
        if !observation.has_measurable_balls() && observation.balls.len() < 2 {
            return Ok(FrameMeasurement::default());
        }

        let scale = self.resolve_scale()?;
        let ranking = compute_distances(observation, &scale);
        let pairs = pairwise_distances(observation, &scale);

        Ok(FrameMeasurement {
            closest_distance: ranking.first().map(|r| r.distance_meters),
            ranking,
            pairs,
            approximate: scale.is_approximate(),
            scale_factor: Some(scale.scale_factor()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::DetectedObject;
    use approx::assert_relative_eq;
    use petanque_calibration::{CalibrationRecord, CalibrationState, Calibrator, InMemoryBackend};
    use petanque_geometry::Point2d;

    fn object(id: u32, x: f64, y: f64, confidence: f64) -> Result<DetectedObject, DistanceError> {
        DetectedObject::new(ObjectId(id), Point2d::new(x, y), 10.0, confidence)
    }

    fn fallback(scale_factor: f64) -> Result<ScaleSource, DistanceError> {
        Ok(FallbackCalibration::new(scale_factor)?.into())
    }

    #[test]
    fn test_compute_distances_ranking() -> Result<(), DistanceError> {
        let observation = FrameObservation::new(
            Some(object(100, 0.0, 0.0, 1.0)?),
            vec![
                object(0, 50.0, 0.0, 1.0)?,
                object(1, 0.0, 20.0, 1.0)?,
                object(2, -80.0, 0.0, 1.0)?,
            ],
        );

        let results = compute_distances(&observation, &fallback(0.001)?);

        let ids = results.iter().map(|r| r.object_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![ObjectId(1), ObjectId(0), ObjectId(2)]);
        let ranks = results.iter().map(|r| r.rank).collect::<Vec<_>>();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_relative_eq!(results[0].distance_meters, 0.02, epsilon = 1e-12);
        assert_relative_eq!(results[1].distance_meters, 0.05, epsilon = 1e-12);
        assert_relative_eq!(results[2].distance_meters, 0.08, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_compute_distances_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let record = Calibrator::new().calibrate_single(0.03, 100.0)?;
        let observation = FrameObservation::new(
            Some(object(0, 10.0, 10.0, 1.0)?),
            vec![object(1, 210.0, 10.0, 1.0)?],
        );

        let results = compute_distances(&observation, &ScaleSource::from(record));
        assert_relative_eq!(results[0].distance_meters, 0.06, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_compute_distances_stable_ties() -> Result<(), DistanceError> {
        let observation = FrameObservation::new(
            Some(object(0, 0.0, 0.0, 1.0)?),
            vec![
                object(5, 30.0, 0.0, 1.0)?,
                object(3, 0.0, 30.0, 1.0)?,
                object(4, -30.0, 0.0, 1.0)?,
            ],
        );

        let results = compute_distances(&observation, &fallback(0.001)?);
        let ids = results.iter().map(|r| r.object_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![ObjectId(5), ObjectId(3), ObjectId(4)]);
        Ok(())
    }

    #[test]
    fn test_compute_distances_confidence() -> Result<(), DistanceError> {
        let observation = FrameObservation::new(
            Some(object(0, 0.0, 0.0, 0.8)?),
            vec![object(1, 10.0, 0.0, 0.95)?, object(2, 20.0, 0.0, 0.6)?],
        );

        let results = compute_distances(&observation, &fallback(0.001)?);
        assert_eq!(results[0].confidence, 0.8);
        assert_eq!(results[1].confidence, 0.6);
        Ok(())
    }

    #[test]
    fn test_compute_distances_nothing_to_measure() -> Result<(), DistanceError> {
        let scale = fallback(0.001)?;

        let no_cochonnet = FrameObservation::new(None, vec![object(1, 10.0, 0.0, 1.0)?]);
        assert!(compute_distances(&no_cochonnet, &scale).is_empty());

        let no_balls = FrameObservation::new(Some(object(0, 0.0, 0.0, 1.0)?), vec![]);
        assert!(compute_distances(&no_balls, &scale).is_empty());
        Ok(())
    }

    #[test]
    fn test_pairwise_distances() -> Result<(), DistanceError> {
        let observation = FrameObservation::new(
            None,
            vec![
                object(1, 0.0, 0.0, 1.0)?,
                object(2, 30.0, 40.0, 1.0)?,
                object(3, 0.0, 40.0, 1.0)?,
            ],
        );

        let pairs = pairwise_distances(&observation, &fallback(0.01)?);
        assert_eq!(pairs.len(), 3);
        let ids = pairs
            .iter()
            .map(|p| (p.object_a_id.0, p.object_b_id.0))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![(1, 2), (1, 3), (2, 3)]);
        assert_relative_eq!(pairs[0].distance_meters, 0.5, epsilon = 1e-12);
        assert_relative_eq!(pairs[1].distance_meters, 0.4, epsilon = 1e-12);
        assert_relative_eq!(pairs[2].distance_meters, 0.3, epsilon = 1e-12);

        let single = FrameObservation::new(None, vec![object(1, 0.0, 0.0, 1.0)?]);
        assert!(pairwise_distances(&single, &fallback(0.01)?).is_empty());
        Ok(())
    }

    #[test]
    fn test_engine_requires_calibration() -> Result<(), DistanceError> {
        let store = CalibrationStore::new(InMemoryBackend::default());
        let engine = DistanceEngine::new(&store);
        let observation = FrameObservation::new(
            Some(object(0, 0.0, 0.0, 1.0)?),
            vec![object(1, 10.0, 0.0, 1.0)?],
        );

        assert!(matches!(
            engine.compute_distances(&observation),
            Err(DistanceError::CalibrationError(CalibrationError::NoCalibration))
        ));

        // nothing to measure is not an error, even uncalibrated
        assert!(engine.compute_distances(&FrameObservation::default())?.is_empty());
        assert_eq!(
            engine.measure_frame(&FrameObservation::default())?,
            FrameMeasurement::default()
        );
        Ok(())
    }

    #[test]
    fn test_engine_uses_fallback() -> Result<(), DistanceError> {
        let store = CalibrationStore::new(InMemoryBackend::default());
        let engine = DistanceEngine::new(&store).with_fallback(FallbackCalibration::approximate());
        let observation = FrameObservation::new(
            Some(object(0, 0.0, 0.0, 1.0)?),
            vec![object(1, 0.0, 120.0, 1.0)?, object(2, 0.0, 40.0, 1.0)?],
        );

        let measurement = engine.measure_frame(&observation)?;
        assert!(measurement.approximate);
        assert_eq!(measurement.scale_factor, Some(0.001));
        assert_eq!(measurement.ranking[0].object_id, ObjectId(2));
        assert_relative_eq!(
            measurement.closest_distance.unwrap_or_default(),
            0.04,
            epsilon = 1e-12
        );
        assert_eq!(measurement.pairs.len(), 1);
        assert_relative_eq!(measurement.pairs[0].distance_meters, 0.08, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_engine_prefers_calibration() -> Result<(), Box<dyn std::error::Error>> {
        let record: CalibrationRecord = Calibrator::new().calibrate_single(0.03, 100.0)?;
        let store = CalibrationStore::new(InMemoryBackend::with_record(record.clone()));
        let engine = DistanceEngine::new(&store).with_fallback(FallbackCalibration::approximate());

        assert_eq!(engine.resolve_scale()?, ScaleSource::Calibrated(record));

        let observation = FrameObservation::new(
            Some(object(0, 0.0, 0.0, 1.0)?),
            vec![object(1, 200.0, 0.0, 1.0)?],
        );
        let measurement = engine.measure_frame(&observation)?;
        assert!(!measurement.approximate);
        assert_relative_eq!(measurement.ranking[0].distance_meters, 0.06, epsilon = 1e-12);
        assert!(measurement.pairs.is_empty());
        Ok(())
    }

    #[test]
    fn test_engine_measures_with_stale_calibration() -> Result<(), Box<dyn std::error::Error>> {
        let record = Calibrator::with_clock(|| 1_000).calibrate_single(0.03, 100.0)?;
        let store = CalibrationStore::new(InMemoryBackend::with_record(record.clone()));
        let engine = DistanceEngine::new(&store).with_fallback(FallbackCalibration::approximate());

        // thirty days after calibration the record is stale but still preferred
        let now = 1_000 + 30 * 24 * 60 * 60;
        assert_eq!(store.status(now)?, CalibrationState::Stale);
        let scale = engine.resolve_scale_at(now)?;
        assert!(!scale.is_approximate());
        assert_eq!(scale, ScaleSource::Calibrated(record));
        Ok(())
    }

    #[test]
    fn test_measure_frame_json() -> Result<(), Box<dyn std::error::Error>> {
        let measurement = FrameMeasurement {
            ranking: vec![DistanceResult {
                object_id: ObjectId(1),
                distance_meters: 0.25,
                rank: 0,
                confidence: 0.5,
            }],
            pairs: vec![],
            closest_distance: Some(0.25),
            approximate: true,
            scale_factor: Some(0.001),
        };
        let value = serde_json::to_value(&measurement)?;
        assert_eq!(value["ranking"][0]["objectId"], 1);
        assert_eq!(value["ranking"][0]["distanceMeters"], 0.25);
        assert_eq!(value["closestDistance"], 0.25);
        assert_eq!(value["scaleFactor"], 0.001);
        assert_eq!(value["approximate"], true);
        Ok(())
    }
}
