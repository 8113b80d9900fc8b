//! Robust estimation of planar homographies from outlier-contaminated correspondences.
//!
//! Estimation runs in two stages:
//!
//! 1. [Preemptive RANSAC](PreemptiveRansac) builds a pool of hypotheses from random minimal
//!    samples with the [`FourPoint`] solver. It then scores the pool against a growing subset
//!    of the correspondences with the [Cauchy kernel](CauchyCost), halving the pool each round.
//! 2. The winner is polished by [Levenberg-Marquardt](Refiner) on the full set. Increments are
//!    parameterized in the Lie algebra sl(3), see [`lie`].
//!
//! ```
//! use robust_homography::{nalgebra::Point2, Homography, RobustHomography};
//!
//! let p = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//! ];
//! let q = [
//!     Point2::new(3.0, 4.0),
//!     Point2::new(5.0, 4.0),
//!     Point2::new(5.0, 6.0),
//!     Point2::new(3.0, 6.0),
//! ];
//! let h = RobustHomography::default().find(&p, &q).unwrap();
//! let expected = Homography::from_row_major([2.0, 0.0, 3.0, 0.0, 2.0, 4.0, 0.0, 0.0, 1.0]);
//! assert!((h.0 - expected.0).norm() < 1e-6);
//! ```
//!
//! One [`RobustHomography`] keeps scratch buffers between calls and must not be shared across
//! threads while estimating. Use one instance per thread.

mod config;
mod cost;
mod error;
pub mod lie;
mod ransac;
mod refine;
pub mod verify;

pub use ar_core::{nalgebra, sample_consensus, FeatureMatch, Homography, ImagePoint, KeyPoint};
pub use config::*;
pub use cost::*;
pub use error::*;
pub use four_point::{FourPoint, GeometricConsistency, SolveError};
pub use ransac::*;
pub use refine::*;

use log::*;
use nalgebra::Point2;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use sample_consensus::Consensus;

/// Seed of the default generator.
pub const DEFAULT_SEED: u64 = 1234;

/// Estimates homographies with preemptive RANSAC followed by robust refinement.
///
/// The generator `R` is cloned at the start of every call, so identical input always gives
/// identical output.
#[derive(Clone, Debug)]
pub struct RobustHomography<R = Xoshiro256PlusPlus> {
    config: Config,
    solver: FourPoint,
    ransac: PreemptiveRansac,
    rng: R,
}

impl RobustHomography {
    /// Creates an estimator using a [`Xoshiro256PlusPlus`] generator seeded with [`DEFAULT_SEED`].
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, Xoshiro256PlusPlus::seed_from_u64(DEFAULT_SEED))
    }
}

impl Default for RobustHomography {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<R> RobustHomography<R>
where
    R: Rng + Clone,
{
    pub fn with_rng(config: Config, rng: R) -> Self {
        let mut estimator = Self {
            config,
            solver: FourPoint::new(),
            ransac: PreemptiveRansac::new(),
            rng,
        };
        estimator.init(config);
        estimator
    }

    /// Replaces the configuration and grows the scratch buffers to match it.
    pub fn init(&mut self, config: Config) {
        self.solver = FourPoint::new()
            .consistency(GeometricConsistency::new(config.min_area_ratio));
        self.ransac.reserve(config.max_hypotheses);
        self.config = config;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Estimates the homography mapping each `p[i]` onto `q[i]`.
    ///
    /// The result is normalized so that its bottom-right coefficient is one whenever possible.
    ///
    /// # Panics
    ///
    /// Panics if `p` and `q` have different lengths.
    pub fn find(&mut self, p: &[Point2<f64>], q: &[Point2<f64>]) -> Result<Homography> {
        let solver = self.solver;
        self.find_with(&solver, p, q)
    }

    /// Runs only the sampling stage, discarding every hypothesis that flips the orientation
    /// of consecutive `test_points`.
    ///
    /// The result is not refined. Pass it to [`RobustHomography::refine`] if needed.
    ///
    /// # Panics
    ///
    /// Panics if `p` and `q` have different lengths.
    pub fn find_with_test_points(
        &mut self,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
        test_points: &[Point2<f64>],
    ) -> Result<Homography> {
        let solver = self.solver;
        self.hypothesize(&solver, p, q, test_points)
    }

    /// Estimates the homography from a planar reference image of the given size into a view of it.
    ///
    /// The corners of the reference image are used as test points, and the result must
    /// pass [`verify::check_heuristics`].
    pub fn find_for_reference(
        &mut self,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
        width: f64,
        height: f64,
    ) -> Result<Homography> {
        let corners = verify::reference_corners(width, height);
        let homography = self.find_with_test_points(p, q, &corners)?;
        if verify::check_heuristics(&homography, width, height) {
            Ok(homography)
        } else {
            debug!("homography rejected by the reference heuristics");
            Err(Error::ImplausibleHomography)
        }
    }

    /// Polishes `seed` on all correspondences, minimizing the total Cauchy cost.
    pub fn refine(&self, seed: Homography, p: &[Point2<f64>], q: &[Point2<f64>]) -> Refinement {
        Refiner::new(self.config.cauchy_scale, self.config.refine).refine(seed, p, q)
    }

    /// Total Cauchy cost of `homography` over all correspondences.
    pub fn cost(&self, homography: &Homography, p: &[Point2<f64>], q: &[Point2<f64>]) -> f64 {
        CauchyCost::new(self.config.cauchy_scale).total(homography, p, q)
    }

    /// Indices of the correspondences within [`Config::inlier_threshold`] of `homography`.
    pub fn inliers(
        &self,
        homography: &Homography,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
    ) -> Vec<usize> {
        verify::find_inliers(homography, p, q, self.config.inlier_threshold).collect()
    }

    fn find_with(
        &mut self,
        solver: &FourPoint,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
    ) -> Result<Homography> {
        let seed = self.hypothesize(solver, p, q, &[])?;
        let refinement = self.refine(seed, p, q);
        Ok(refinement
            .homography
            .normalized()
            .unwrap_or(refinement.homography))
    }

    fn hypothesize(
        &mut self,
        solver: &FourPoint,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
        test_points: &[Point2<f64>],
    ) -> Result<Homography> {
        let mut rng = self.rng.clone();
        self.ransac
            .run(&self.config, solver, p, q, test_points, &mut rng)
            .map(|hypothesis| hypothesis.homography)
    }
}

impl<R, P> Consensus<FourPoint, FeatureMatch<P>> for RobustHomography<R>
where
    R: Rng + Clone,
    P: ImagePoint,
{
    type Inliers = Vec<usize>;

    fn model<I>(&mut self, estimator: &FourPoint, data: I) -> Option<Homography>
    where
        I: Iterator<Item = FeatureMatch<P>> + Clone,
    {
        let (p, q): (Vec<_>, Vec<_>) = data.map(|m| m.image_points()).unzip();
        self.find_with(estimator, &p, &q)
            .map_err(|e| debug!("consensus failed: {}", e))
            .ok()
    }

    fn model_inliers<I>(
        &mut self,
        estimator: &FourPoint,
        data: I,
    ) -> Option<(Homography, Self::Inliers)>
    where
        I: Iterator<Item = FeatureMatch<P>> + Clone,
    {
        let (p, q): (Vec<_>, Vec<_>) = data.map(|m| m.image_points()).unzip();
        let homography = self
            .find_with(estimator, &p, &q)
            .map_err(|e| debug!("consensus failed: {}", e))
            .ok()?;
        let inliers = self.inliers(&homography, &p, &q);
        Some((homography, inliers))
    }
}
