#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Storage backends for the active calibration.
pub mod backend;

/// Scale factor estimation from reference objects.
pub mod calibrator;

/// Calibration policy configuration.
pub mod config;

/// Error types for the calibration module.
pub mod error;

/// The persisted calibration record.
pub mod record;

/// Reference objects of known physical size.
pub mod reference;

/// The calibration store and its validation logic.
pub mod store;

pub use backend::{CalibrationBackend, InMemoryBackend, JsonFileBackend};
pub use calibrator::{CalibrationSample, Calibrator};
pub use config::CalibrationConfig;
pub use error::CalibrationError;
pub use record::{current_timestamp, CalibrationRecord};
pub use reference::ReferenceObjectKind;
pub use store::{
    AccuracyCheck, CalibrationState, CalibrationStore, ValidationFailure, ValidationResult,
};
