use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Allows the retrieval of the point on the image the feature came from.
pub trait ImagePoint {
    /// Retrieves the point on the image
    fn image_point(&self) -> Point2<f64>;
}

impl ImagePoint for Point2<f64> {
    #[inline(always)]
    fn image_point(&self) -> Point2<f64> {
        *self
    }
}

/// A point on an image frame in pixel coordinates.
///
/// Tracked corners, matched descriptors and optical-flow tracks all end up as a `KeyPoint`
/// before they are paired into a [`FeatureMatch`](crate::FeatureMatch).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint(pub Point2<f64>);

impl KeyPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }
}

impl ImagePoint for KeyPoint {
    #[inline(always)]
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}
