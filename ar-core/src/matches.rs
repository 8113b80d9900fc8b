#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::ImagePoint;
use nalgebra::Point2;

/// A correspondence between a point in the source (reference) image and the
/// point it was matched to in the destination (live) image.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FeatureMatch<P>(pub P, pub P);

impl<P: ImagePoint> FeatureMatch<P> {
    /// Retrieves `(source, destination)` image points.
    #[inline(always)]
    pub fn image_points(&self) -> (Point2<f64>, Point2<f64>) {
        (self.0.image_point(), self.1.image_point())
    }
}
