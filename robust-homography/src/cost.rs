use ar_core::{
    nalgebra::{Matrix2, Point2, Vector2},
    Homography,
};

/// The Cauchy robust kernel `ln(1 + |f|^2 / scale^2)` applied to reprojection residuals.
///
/// The kernel is zero at zero residual and grows only logarithmically, so a single
/// outlier cannot dominate a sum of costs the way it would with squared error.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CauchyCost {
    inv_scale2: f64,
}

impl CauchyCost {
    pub fn new(scale: f64) -> Self {
        Self {
            inv_scale2: 1.0 / (scale * scale),
        }
    }

    #[inline(always)]
    pub fn inv_scale2(&self) -> f64 {
        self.inv_scale2
    }

    /// The cost of a single residual vector. Non-finite residuals cost infinity.
    #[inline(always)]
    pub fn kernel(&self, residual: Vector2<f64>) -> f64 {
        let r2 = residual.norm_squared();
        if r2 == 0.0 {
            return 0.0;
        }
        let cost = (r2 * self.inv_scale2).ln_1p();
        if cost.is_nan() {
            f64::INFINITY
        } else {
            cost
        }
    }

    /// The cost of mapping `p` with `homography` when `q` was observed.
    #[inline(always)]
    pub fn reprojection(&self, homography: &Homography, p: Point2<f64>, q: Point2<f64>) -> f64 {
        self.kernel(homography.project(p) - q)
    }

    /// Sums the cost over all correspondences.
    pub fn total(&self, homography: &Homography, p: &[Point2<f64>], q: &[Point2<f64>]) -> f64 {
        p.iter()
            .zip(q)
            .map(|(&p, &q)| self.reprojection(homography, p, q))
            .sum()
    }

    /// Sums the cost over the correspondences selected by `indices`.
    pub fn total_indexed(
        &self,
        homography: &Homography,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
        indices: &[usize],
    ) -> f64 {
        indices
            .iter()
            .map(|&ix| self.reprojection(homography, p[ix], q[ix]))
            .sum()
    }

    /// Rewrites the residual `f` as `g = sqrt(ln(1 + |f|^2 k) / |f|^2) * f` with `k = 1 / scale^2`,
    /// so that `|g|^2` is the Cauchy cost, and returns `g` with its Jacobian `dg/df`.
    ///
    /// The factor has a removable singularity at `f = 0`, where its limit `sqrt(k)` is used.
    pub fn robust_residual(&self, f: Vector2<f64>) -> (Vector2<f64>, Matrix2<f64>) {
        let k = self.inv_scale2;
        let r2 = f.norm_squared();
        if r2 > 0.0 {
            let t = 1.0 + r2 * k;
            let fu = (r2 * k).ln_1p() / r2;
            if fu > 0.0 && fu.is_finite() {
                let sqrt_fu = fu.sqrt();
                let dqdf = f / (2.0 * sqrt_fu);
                let dfdp = (f * (k / (r2 * t)) - f * (fu / r2)) * 2.0;
                let cross = dqdf.x * dfdp.y;
                #[rustfmt::skip]
                let jacobian = Matrix2::new(
                    dqdf.x * dfdp.x + sqrt_fu, cross,
                    cross, dqdf.y * dfdp.y + sqrt_fu,
                );
                return (f * sqrt_fu, jacobian);
            }
        }
        (Vector2::zeros(), Matrix2::identity() * k.sqrt())
    }
}
