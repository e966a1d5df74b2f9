use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Nominal diameter of the cochonnet, in meters.
pub const COCHONNET_DIAMETER: f64 = 0.030;

/// Nominal diameter of a boule, in meters.
pub const BOULE_DIAMETER: f64 = 0.0755;

/// Diameters allowed for a cochonnet in play, in meters.
pub const COCHONNET_DIAMETER_RANGE: RangeInclusive<f64> = 0.025..=0.035;

/// Diameters allowed for a boule in play, in meters.
pub const BOULE_DIAMETER_RANGE: RangeInclusive<f64> = 0.0705..=0.080;

/// The kind of object used as a size reference during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceObjectKind {
    /// The target ball.
    Cochonnet,
    /// A playing ball.
    Boule,
    /// Any object whose size the caller measured themselves.
    Custom,
}

impl ReferenceObjectKind {
    /// The nominal diameter of the object, in meters.
    ///
    /// `Custom` objects have no nominal size.
    pub fn nominal_diameter(&self) -> Option<f64> {
        match self {
            ReferenceObjectKind::Cochonnet => Some(COCHONNET_DIAMETER),
            ReferenceObjectKind::Boule => Some(BOULE_DIAMETER),
            ReferenceObjectKind::Custom => None,
        }
    }

    /// The range of diameters found in practice, in meters.
    pub fn diameter_range(&self) -> Option<RangeInclusive<f64>> {
        match self {
            ReferenceObjectKind::Cochonnet => Some(COCHONNET_DIAMETER_RANGE),
            ReferenceObjectKind::Boule => Some(BOULE_DIAMETER_RANGE),
            ReferenceObjectKind::Custom => None,
        }
    }

    /// The lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceObjectKind::Cochonnet => "cochonnet",
            ReferenceObjectKind::Boule => "boule",
            ReferenceObjectKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ReferenceObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceObjectKind {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cochonnet" => Ok(ReferenceObjectKind::Cochonnet),
            "boule" => Ok(ReferenceObjectKind::Boule),
            "custom" => Ok(ReferenceObjectKind::Custom),
            _ => Err(CalibrationError::MissingReferenceObject(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_diameter() {
        assert_eq!(
            ReferenceObjectKind::Cochonnet.nominal_diameter(),
            Some(0.030)
        );
        assert_eq!(ReferenceObjectKind::Boule.nominal_diameter(), Some(0.0755));
        assert_eq!(ReferenceObjectKind::Custom.nominal_diameter(), None);
    }

    #[test]
    fn test_nominal_within_range() {
        for kind in [ReferenceObjectKind::Cochonnet, ReferenceObjectKind::Boule] {
            let (Some(nominal), Some(range)) = (kind.nominal_diameter(), kind.diameter_range())
            else {
                panic!("{kind} should have a known size");
            };
            assert!(range.contains(&nominal));
        }
    }

    #[test]
    fn test_from_str() -> Result<(), CalibrationError> {
        assert_eq!(
            "cochonnet".parse::<ReferenceObjectKind>()?,
            ReferenceObjectKind::Cochonnet
        );
        assert_eq!(" Boule ".parse::<ReferenceObjectKind>()?, ReferenceObjectKind::Boule);
        assert!(matches!(
            "jack".parse::<ReferenceObjectKind>(),
            Err(CalibrationError::MissingReferenceObject(name)) if name == "jack"
        ));
        Ok(())
    }

    #[test]
    fn test_serde_lowercase() -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(&ReferenceObjectKind::Boule)?;
        assert_eq!(json, "\"boule\"");
        let kind: ReferenceObjectKind = serde_json::from_str("\"cochonnet\"")?;
        assert_eq!(kind, ReferenceObjectKind::Cochonnet);
        Ok(())
    }
}
