#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use petanque_geometry as geometry;

#[doc(inline)]
pub use petanque_calibration as calibration;

#[doc(inline)]
pub use petanque_distance as distance;
