use crate::{FeatureMatch, ImagePoint};
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix3, Point2, Vector2, Vector3};
use num_traits::Float;
use sample_consensus::Model;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A projective transform between two views of a plane.
///
/// The matrix is only defined up to scale. Operations that compare homographies
/// should either normalize them with [`Homography::normalized`] or compare
/// the mapped points instead of the raw coefficients.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    /// The homography which maps every point onto itself.
    #[inline(always)]
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Creates a homography from nine coefficients in row-major order.
    #[inline(always)]
    pub fn from_row_major(h: [f64; 9]) -> Self {
        Self(Matrix3::from_row_slice(&h))
    }

    /// Retrieves the nine coefficients in row-major order.
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = &self.0;
        [
            m.m11, m.m12, m.m13, m.m21, m.m22, m.m23, m.m31, m.m32, m.m33,
        ]
    }

    /// Creates a similarity which rotates by `angle` radians, scales by `scale`,
    /// and then translates by `translation`.
    pub fn similarity(translation: Vector2<f64>, angle: f64, scale: f64) -> Self {
        let c = scale * Float::cos(angle);
        let s = scale * Float::sin(angle);
        #[rustfmt::skip]
        let m = Matrix3::new(
            c, -s, translation.x,
            s,  c, translation.y,
            0.0, 0.0, 1.0,
        );
        Self(m)
    }

    /// Maps a point and performs the perspective divide.
    ///
    /// The result is not checked. Points on the line at infinity of the
    /// destination view produce non-finite coordinates.
    #[inline(always)]
    pub fn project(&self, point: Point2<f64>) -> Point2<f64> {
        let m = &self.0;
        let w = m.m31 * point.x + m.m32 * point.y + m.m33;
        Point2::new(
            (m.m11 * point.x + m.m12 * point.y + m.m13) / w,
            (m.m21 * point.x + m.m22 * point.y + m.m23) / w,
        )
    }

    /// Maps a point, failing if it lands at (or numerically near) infinity.
    pub fn transform_point(&self, point: Point2<f64>) -> Option<Point2<f64>> {
        let homogeneous: Vector3<f64> = self.0 * point.to_homogeneous();
        if homogeneous.z == 0.0 {
            return None;
        }
        let mapped = Point2::from_homogeneous(homogeneous)?;
        if mapped.x.is_finite() && mapped.y.is_finite() {
            Some(mapped)
        } else {
            None
        }
    }

    /// Scales the homography so that the bottom-right coefficient is one.
    ///
    /// Returns `None` if that coefficient is zero, which happens when the
    /// source origin maps to infinity.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let h22 = self.0.m33;
        if h22 == 0.0 || !h22.is_finite() {
            None
        } else {
            Some(Self(self.0 / h22))
        }
    }

    #[inline(always)]
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// Inverts the homography if its determinant magnitude is at least `epsilon`.
    pub fn inverse(&self, epsilon: f64) -> Option<Self> {
        if Float::abs(self.determinant()) < epsilon {
            return None;
        }
        self.0.try_inverse().map(Self)
    }

    /// Expresses the homography in coordinates scaled by `s` on both views.
    ///
    /// This computes `inv(S) * H * S` where `S = diag(s, s, 1)`. It is used to carry a
    /// homography between pyramid levels.
    #[must_use]
    pub fn rescaled(mut self, s: f64) -> Self {
        self.0.m13 /= s;
        self.0.m23 /= s;
        self.0.m31 *= s;
        self.0.m32 *= s;
        self
    }

    /// Applies an incremental translation of the source view, computing `H * (I + T)`
    /// where `T` translates by `(tx, ty)`.
    #[must_use]
    pub fn translated(mut self, tx: f64, ty: f64) -> Self {
        let m = &mut self.0;
        m.m13 += m.m11 * tx + m.m12 * ty;
        m.m23 += m.m21 * tx + m.m22 * ty;
        m.m33 += m.m31 * tx + m.m32 * ty;
        self
    }

    /// The distance in the destination view between the mapped `p` and `q`.
    #[inline(always)]
    pub fn reprojection_error(&self, p: Point2<f64>, q: Point2<f64>) -> f64 {
        let error = (self.project(p) - q).norm();
        if error.is_finite() {
            error
        } else {
            f64::INFINITY
        }
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl<P: ImagePoint> Model<FeatureMatch<P>> for Homography {
    #[inline(always)]
    fn residual(&self, data: &FeatureMatch<P>) -> f64 {
        let (p, q) = data.image_points();
        self.reprojection_error(p, q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPoint;
    use approx::assert_relative_eq;

    #[test]
    fn row_major_round_trip_keeps_layout() {
        let coefficients = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let h = Homography::from_row_major(coefficients);
        assert_eq!(h.0[(0, 2)], 3.0);
        assert_eq!(h.0[(2, 0)], 7.0);
        assert_eq!(h.to_row_major(), coefficients);
    }

    #[test]
    fn similarity_maps_points() {
        let h = Homography::similarity(Vector2::new(3.0, 4.0), core::f64::consts::FRAC_PI_2, 2.0);
        let mapped = h.transform_point(Point2::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(mapped, Point2::new(3.0, 6.0), epsilon = 1e-12);
    }

    #[test]
    fn point_at_infinity_is_rejected() {
        let h = Homography::from_row_major([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0]);
        assert!(h.transform_point(Point2::new(1.0, 5.0)).is_none());
        assert_eq!(
            h.reprojection_error(Point2::new(1.0, 5.0), Point2::origin()),
            f64::INFINITY
        );
    }

    #[test]
    fn normalized_sets_last_coefficient() {
        let h = Homography(Matrix3::identity() * 4.0).normalized().unwrap();
        assert_eq!(h, Homography::identity());
        let mut singular = Homography::identity();
        singular.0.m33 = 0.0;
        assert!(singular.normalized().is_none());
    }

    #[test]
    fn inverse_undoes_mapping() {
        let h = Homography::from_row_major([1.1, 0.2, 5.0, -0.1, 0.9, 3.0, 1e-3, 2e-3, 1.0]);
        let inv = h.inverse(1e-9).unwrap();
        let p = Point2::new(12.0, -7.0);
        let back = inv.transform_point(h.transform_point(p).unwrap()).unwrap();
        assert_relative_eq!(back, p, epsilon = 1e-9);
    }

    #[test]
    fn rescaled_matches_conjugation() {
        let h = Homography::from_row_major([1.1, 0.2, 5.0, -0.1, 0.9, 3.0, 1e-3, 2e-3, 1.0]);
        let s = 0.5;
        let scale = Matrix3::new(s, 0.0, 0.0, 0.0, s, 0.0, 0.0, 0.0, 1.0);
        let expected = scale.try_inverse().unwrap() * h.0 * scale;
        assert_relative_eq!(h.rescaled(s).0, expected, epsilon = 1e-12);
    }

    #[test]
    fn translated_composes_on_the_right() {
        let h = Homography::from_row_major([1.1, 0.2, 5.0, -0.1, 0.9, 3.0, 1e-3, 2e-3, 1.0]);
        let t = Matrix3::new(1.0, 0.0, 2.0, 0.0, 1.0, -3.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(h.translated(2.0, -3.0).0, h.0 * t, epsilon = 1e-12);
    }

    #[test]
    fn residual_is_reprojection_distance() {
        let h = Homography::similarity(Vector2::new(1.0, 1.0), 0.0, 1.0);
        let data = FeatureMatch(KeyPoint::new(0.0, 0.0), KeyPoint::new(4.0, 5.0));
        assert_relative_eq!(h.residual(&data), 5.0);
    }
}
