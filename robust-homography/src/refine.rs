use crate::{lie, CauchyCost, RefineConfig};
use ar_core::{
    nalgebra::{Point2, SMatrix, SVector},
    Homography,
};
use log::*;

type Matrix8 = SMatrix<f64, 8, 8>;
type Vector8 = SVector<f64, 8>;

/// Why the polish stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The iteration limit was reached.
    MaxIterations,
    /// Too many iterations in a row failed to improve the cost enough.
    Stalled,
    /// The damped normal equations could not be solved. The best homography so far is kept.
    LinearSolveFailure,
}

/// The outcome of [`Refiner::refine`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Refinement {
    pub homography: Homography,
    /// Total Cauchy cost of the seed homography.
    pub initial_cost: f64,
    /// Total Cauchy cost of [`Refinement::homography`]. Never larger than `initial_cost`.
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Levenberg-Marquardt minimization of the total Cauchy cost over homographies.
///
/// Steps are taken in sl(3) and applied on the left, `H <- exp(A(delta)) * H`, which keeps
/// the determinant of `H` fixed and leaves no gauge freedom in the eight parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Refiner {
    pub cost: CauchyCost,
    pub config: RefineConfig,
}

impl Refiner {
    pub fn new(cauchy_scale: f64, config: RefineConfig) -> Self {
        Self {
            cost: CauchyCost::new(cauchy_scale),
            config,
        }
    }

    /// Polishes `seed` against the correspondences `p[i] -> q[i]`.
    ///
    /// Only steps that strictly lower the cost are accepted.
    pub fn refine(&self, seed: Homography, p: &[Point2<f64>], q: &[Point2<f64>]) -> Refinement {
        assert_eq!(p.len(), q.len(), "every source point needs a destination point");
        let config = &self.config;

        let mut homography = seed;
        let initial_cost = self.cost.total(&seed, p, q);
        let mut last_cost = initial_cost;
        let mut lambda = config.initial_lambda;
        let mut stops = 0;
        let mut iterations = 0;
        let mut update = true;
        let mut jtj = Matrix8::zeros();
        let mut jtr = Vector8::zeros();

        let termination = loop {
            if stops >= config.max_non_improving_steps {
                break Termination::Stalled;
            }
            if iterations >= config.max_iterations {
                break Termination::MaxIterations;
            }
            iterations += 1;

            if update {
                (jtj, jtr) = self.normal_equations(&homography, p, q);
            }
            let mut damped = jtj;
            for i in 0..8 {
                damped[(i, i)] += lambda * jtj[(i, i)];
            }
            let delta = match damped.cholesky().map(|c| c.solve(&jtr)) {
                Some(delta) if delta.iter().all(|v| v.is_finite()) => delta,
                _ => break Termination::LinearSolveFailure,
            };

            let candidate = lie::exp(&lie::algebra(&delta)).map(|step| Homography(step * homography.0));
            let cost = candidate.map_or(f64::INFINITY, |candidate| self.cost.total(&candidate, p, q));
            match candidate {
                Some(candidate) if cost < last_cost => {
                    stops = if last_cost - cost < config.min_improvement {
                        stops + 1
                    } else {
                        0
                    };
                    homography = candidate;
                    last_cost = cost;
                    lambda = (lambda * 0.1).max(config.min_lambda);
                    update = true;
                }
                _ => {
                    lambda = (lambda * 10.0).min(config.max_lambda);
                    stops += 1;
                    update = false;
                }
            }
        };

        debug!(
            "refined cost {} -> {} in {} iterations ({:?})",
            initial_cost, last_cost, iterations, termination
        );
        Refinement {
            homography,
            initial_cost,
            cost: last_cost,
            iterations,
            termination,
        }
    }

    /// Accumulates `J^T J` and `-J^T r` of the robustified residuals.
    fn normal_equations(
        &self,
        homography: &Homography,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
    ) -> (Matrix8, Vector8) {
        let mut jtj = Matrix8::zeros();
        let mut jtr = Vector8::zeros();
        for (&p, &q) in p.iter().zip(q) {
            let mapped = homography.project(p);
            let f = mapped - q;
            if !(f.x.is_finite() && f.y.is_finite()) {
                continue;
            }
            let (residual, robust_jacobian) = self.cost.robust_residual(f);
            let j = robust_jacobian * lie::projection_jacobian(mapped);
            jtj += j.tr_mul(&j);
            jtr += j.tr_mul(&residual);
        }
        (jtj, -jtr)
    }
}
