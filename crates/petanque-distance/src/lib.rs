#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Per-frame distance computation.
pub mod engine;

/// Error types for the distance module.
pub mod error;

/// Detector output consumed by the engine.
pub mod observation;

/// Scale factors used to convert pixels to meters.
pub mod scale;

/// Proximity scoring.
pub mod scoring;

pub use engine::{
    compute_distances, pairwise_distances, DistanceEngine, DistanceResult, FrameMeasurement,
    PairDistance,
};
pub use error::DistanceError;
pub use observation::{DetectedObject, FrameObservation, ObjectId};
pub use scale::{FallbackCalibration, ScaleSource};
pub use scoring::{score_by_proximity, ProximityScore};
