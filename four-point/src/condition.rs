use crate::SolveError;
use ar_core::nalgebra::{Matrix3, Point2, Vector2};
use core::f64::consts::SQRT_2;

/// Four points translated to zero mean and scaled so that their mean
/// distance from the origin is `sqrt(2)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Conditioned {
    pub points: [Point2<f64>; 4],
    /// The isotropic scale that was applied after centering.
    pub scale: f64,
    /// The centroid of the original points.
    pub mean: Vector2<f64>,
}

impl Conditioned {
    /// The similarity `T` such that `T * x` gives the conditioned point for an original point `x`.
    pub fn transform(&self) -> Matrix3<f64> {
        let s = self.scale;
        #[rustfmt::skip]
        let t = Matrix3::new(
            s, 0.0, -s * self.mean.x,
            0.0, s, -s * self.mean.y,
            0.0, 0.0, 1.0,
        );
        t
    }
}

/// Conditions four points for the DLT.
///
/// Fails with [`SolveError::DegenerateSample`] if all points coincide.
pub fn condition(points: &[Point2<f64>; 4]) -> Result<Conditioned, SolveError> {
    let mean = points.iter().map(|p| p.coords).sum::<Vector2<f64>>() / 4.0;
    let deltas = points.map(|p| p.coords - mean);
    let distance = deltas.iter().map(|d| d.norm()).sum::<f64>() / 4.0;
    if distance == 0.0 || !distance.is_finite() {
        return Err(SolveError::DegenerateSample);
    }
    let scale = SQRT_2 / distance;
    Ok(Conditioned {
        points: deltas.map(|d| Point2::from(d * scale)),
        scale,
        mean,
    })
}
