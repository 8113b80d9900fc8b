//! Local parameterization of homographies by the Lie algebra sl(3).
//!
//! An 8-vector `delta` is mapped onto a traceless 3x3 matrix. Its exponential has
//! determinant one, so updates of the form `exp(A(delta)) * H` never leave the group
//! and never change the scale of `H`.

use ar_core::nalgebra::{Matrix3, Point2, SMatrix, SVector};

pub type Tangent = SVector<f64, 8>;

/// Scaling and squaring is applied until the 1-norm is at most this.
const SQUARING_NORM: f64 = 0.5;
const PADE_ORDER: i32 = 6;

/// Sums the sl(3) generators weighted by `delta`.
///
/// Generators 0 and 1 translate, 2 and 3 shear, 4 scales anisotropically,
/// 5 scales isotropically and 6 and 7 are the projective terms.
pub fn algebra(delta: &Tangent) -> Matrix3<f64> {
    let d = delta;
    #[rustfmt::skip]
    let a = Matrix3::new(
        d[4], d[2], d[0],
        d[3], -d[4] - d[5], d[1],
        d[6], d[7], d[5],
    );
    a
}

/// Computes the matrix exponential with a diagonal Padé approximant after scaling and squaring.
///
/// Returns `None` when the input is not finite or the approximant cannot be inverted.
pub fn exp(a: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    if !a.iter().all(|v| v.is_finite()) {
        return None;
    }
    let norm = (0..3)
        .map(|j| a.column(j).iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max);
    let squarings = if norm > SQUARING_NORM {
        (norm / SQUARING_NORM).log2().ceil() as i32
    } else {
        0
    };
    let x = a / 2f64.powi(squarings);

    let mut coefficient = 1.0;
    let mut power = Matrix3::identity();
    let mut numerator = Matrix3::identity();
    let mut denominator = Matrix3::identity();
    for k in 1..=PADE_ORDER {
        coefficient *= f64::from(PADE_ORDER - k + 1) / f64::from(k * (2 * PADE_ORDER - k + 1));
        power *= x;
        numerator += power * coefficient;
        if k % 2 == 0 {
            denominator += power * coefficient;
        } else {
            denominator -= power * coefficient;
        }
    }

    let mut e = denominator.lu().solve(&numerator)?;
    for _ in 0..squarings {
        e = e * e;
    }
    Some(e)
}

/// The Jacobian of the projected point `exp(A(delta)) * H * p` with respect to `delta` at zero,
/// given the point `mapped = H * p` after the perspective divide.
pub fn projection_jacobian(mapped: Point2<f64>) -> SMatrix<f64, 2, 8> {
    let (x, y) = (mapped.x, mapped.y);
    #[rustfmt::skip]
    let j = SMatrix::<f64, 2, 8>::from_row_slice(&[
        1.0, 0.0, y, 0.0, x, -x, -x * x, -x * y,
        0.0, 1.0, 0.0, x, -y, -2.0 * y, -x * y, -y * y,
    ]);
    j
}
