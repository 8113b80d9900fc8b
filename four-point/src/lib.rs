//! Solves the homography that exactly maps four source points onto four destination points
//! using the normalized [Direct Linear Transform](https://en.wikipedia.org/wiki/Direct_linear_transformation)
//! as described by Richard Hartley and Andrew Zisserman.
//!
//! Each point set is first conditioned independently to zero mean and a mean radius of `sqrt(2)`.
//! Every correspondence contributes two rows of the constraint `q x (H p) = 0`, giving an 8x9
//! homogeneous system whose null vector is the conditioned homography. The conditioning is then
//! undone in closed form.
//!
//! This solver is meant to produce hypotheses for a consensus algorithm. With noisy input it
//! still returns a homography that fits the four points exactly, so it should not be used as a
//! final estimate on its own.
#![no_std]

mod condition;
mod consistency;

pub use condition::*;
pub use consistency::*;

use arrayvec::ArrayVec;
use ar_core::{
    nalgebra::{Matrix3, Point2, SMatrix},
    sample_consensus::Estimator,
    FeatureMatch, Homography, ImagePoint,
};
use derive_more::Display;
use num_traits::Float;

/// Reasons a minimal sample could not produce a homography.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum SolveError {
    /// The points coincide, are collinear, or violate the orientation check.
    #[display(fmt = "degenerate four-point sample")]
    DegenerateSample,
    /// The null vector could not be found or describes a (near) singular homography.
    #[display(fmt = "near-singular homography solution")]
    NearSingularSolution,
}

fn encode_homography_constraint(
    p: &[Point2<f64>; 4],
    q: &[Point2<f64>; 4],
) -> SMatrix<f64, 9, 9> {
    // The ninth row is left at zero so that the SVD exposes the full right singular basis.
    let mut out = SMatrix::<f64, 9, 9>::zeros();
    for (i, (x, xp)) in p.iter().zip(q).enumerate() {
        #[rustfmt::skip]
        let rows = [
            [-x.x, -x.y, -1.0, 0.0, 0.0, 0.0, xp.x * x.x, xp.x * x.y, xp.x],
            [0.0, 0.0, 0.0, -x.x, -x.y, -1.0, xp.y * x.x, xp.y * x.y, xp.y],
        ];
        for (r, row) in rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                out[(2 * i + r, j)] = v;
            }
        }
    }
    out
}

/// Computes `inv(Tq) * hn * Tp` without forming any inverse, where `Tp` and `Tq` are the
/// conditioning similarities of the source and destination points.
fn denormalize(hn: &Matrix3<f64>, source: &Conditioned, destination: &Conditioned) -> Matrix3<f64> {
    let s = source.scale;
    let t = source.mean;
    let sp = destination.scale;
    let tp = destination.mean;

    // Rows of inv(Tq) * hn.
    let r0 = hn.row(0) / sp + hn.row(2) * tp.x;
    let r1 = hn.row(1) / sp + hn.row(2) * tp.y;
    let r2 = hn.row(2).into_owned();

    let mut out = Matrix3::zeros();
    for (i, r) in [r0, r1, r2].iter().enumerate() {
        out[(i, 0)] = s * r[0];
        out[(i, 1)] = s * r[1];
        out[(i, 2)] = r[2] - s * (t.x * r[0] + t.y * r[1]);
    }
    out
}

/// Normalized four-point DLT homography solver.
///
/// This struct is marked as `#[non_exhaustive]` to allow the backwards-compatible addition of new fields.
#[derive(Copy, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct FourPoint {
    /// Convergence epsilon of the SVD used to find the null vector.
    pub epsilon: f64,
    /// Maximum number of SVD iterations.
    pub iterations: usize,
    /// Solutions whose conditioned, unit-norm matrix has a determinant magnitude
    /// below this are rejected as near-singular.
    pub singular_threshold: f64,
    /// Predicate used to reject samples before solving in [`FourPoint::from_matches`].
    pub consistency: GeometricConsistency,
}

impl FourPoint {
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the [`FourPoint::singular_threshold`].
    #[must_use]
    pub fn singular_threshold(self, singular_threshold: f64) -> Self {
        Self {
            singular_threshold,
            ..self
        }
    }

    /// Sets the [`FourPoint::consistency`] predicate.
    #[must_use]
    pub fn consistency(self, consistency: GeometricConsistency) -> Self {
        Self {
            consistency,
            ..self
        }
    }

    /// Solves for the homography mapping each `p[i]` onto `q[i]`.
    ///
    /// The result is not normalized; it is only meaningful up to scale.
    /// No geometric consistency check is done here.
    pub fn solve(
        &self,
        p: &[Point2<f64>; 4],
        q: &[Point2<f64>; 4],
    ) -> Result<Homography, SolveError> {
        let source = condition(p)?;
        let destination = condition(q)?;

        let constraint = encode_homography_constraint(&source.points, &destination.points);
        let svd = constraint
            .try_svd(false, true, self.epsilon, self.iterations)
            .ok_or(SolveError::NearSingularSolution)?;
        let v_t = svd.v_t.ok_or(SolveError::NearSingularSolution)?;
        let null_ix = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| float_ord::FloatOrd(n))
            .map(|(ix, _)| ix)
            .ok_or(SolveError::NearSingularSolution)?;
        let h = v_t.row(null_ix);
        #[rustfmt::skip]
        let hn = Matrix3::new(
            h[0], h[1], h[2],
            h[3], h[4], h[5],
            h[6], h[7], h[8],
        );

        let det = hn.determinant();
        if !(Float::abs(det) >= self.singular_threshold) {
            return Err(SolveError::NearSingularSolution);
        }

        Ok(Homography(denormalize(&hn, &source, &destination)))
    }

    /// Solves for the homography from the first four matches after checking them with
    /// [`FourPoint::consistency`].
    pub fn from_matches<P, I>(&self, data: I) -> Result<Homography, SolveError>
    where
        P: ImagePoint,
        I: Iterator<Item = FeatureMatch<P>>,
    {
        let (p, q): (ArrayVec<Point2<f64>, 4>, ArrayVec<Point2<f64>, 4>) =
            data.take(4).map(|m| m.image_points()).unzip();
        let p = p
            .into_inner()
            .map_err(|_| SolveError::DegenerateSample)?;
        let q = q
            .into_inner()
            .map_err(|_| SolveError::DegenerateSample)?;
        if !self.consistency.sample_consistent(&p, &q) {
            return Err(SolveError::DegenerateSample);
        }
        self.solve(&p, &q)
    }
}

impl Default for FourPoint {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            iterations: 1000,
            singular_threshold: 1e-5,
            consistency: GeometricConsistency::default(),
        }
    }
}

impl<P> Estimator<FeatureMatch<P>> for FourPoint
where
    P: ImagePoint,
{
    type Model = Homography;
    type ModelIter = Option<Homography>;
    const MIN_SAMPLES: usize = 4;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = FeatureMatch<P>> + Clone,
    {
        self.from_matches(data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn scaled_and_translated_square() {
        let q = [
            Point2::new(3.0, 4.0),
            Point2::new(5.0, 4.0),
            Point2::new(5.0, 6.0),
            Point2::new(3.0, 6.0),
        ];
        let h = FourPoint::new()
            .solve(&unit_square(), &q)
            .unwrap()
            .normalized()
            .unwrap();
        let expected = Matrix3::new(2.0, 0.0, 3.0, 0.0, 2.0, 4.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(h.0, expected, epsilon = 1e-9);
    }

    #[test]
    fn denormalize_matches_explicit_product() {
        let p = [
            Point2::new(10.0, 20.0),
            Point2::new(110.0, 25.0),
            Point2::new(90.0, 140.0),
            Point2::new(5.0, 95.0),
        ];
        let q = [
            Point2::new(-3.0, 2.0),
            Point2::new(40.0, 8.0),
            Point2::new(38.0, 61.0),
            Point2::new(-6.0, 50.0),
        ];
        let source = condition(&p).unwrap();
        let destination = condition(&q).unwrap();
        let hn = Matrix3::new(0.9, 0.1, 0.2, -0.05, 1.1, -0.3, 0.01, 0.02, 1.0);
        let explicit =
            destination.transform().try_inverse().unwrap() * hn * source.transform();
        assert_relative_eq!(
            denormalize(&hn, &source, &destination),
            explicit,
            epsilon = 1e-9
        );
    }

    #[test]
    fn coincident_destination_fails() {
        let q = [Point2::new(1.0, 1.0); 4];
        assert_eq!(
            FourPoint::new().solve(&unit_square(), &q),
            Err(SolveError::DegenerateSample)
        );
    }

    #[test]
    fn collapsed_destination_is_singular() {
        // Three corners land on one point, so no invertible homography fits.
        let q = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
        ];
        assert_eq!(
            FourPoint::new().solve(&unit_square(), &q),
            Err(SolveError::NearSingularSolution)
        );
    }

    #[test]
    fn too_few_matches_are_degenerate() {
        let matches = unit_square()
            .into_iter()
            .take(3)
            .map(|p| FeatureMatch(p, p))
            .collect::<ArrayVec<_, 4>>();
        assert_eq!(
            FourPoint::new().from_matches(matches.into_iter()),
            Err(SolveError::DegenerateSample)
        );
    }
}
