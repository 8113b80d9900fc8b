#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Default scale of the Cauchy kernel, in destination pixels.
pub const DEFAULT_CAUCHY_SCALE: f64 = 0.01;
pub const DEFAULT_MAX_HYPOTHESES: usize = 1024;
pub const DEFAULT_MAX_TRIALS: usize = 1064;
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Settings of the preemptive RANSAC stage and the robust cost.
///
/// This struct is marked as `#[non_exhaustive]` to allow the backwards-compatible addition of new fields.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(default))]
#[non_exhaustive]
pub struct Config {
    /// Residual magnitude at which the Cauchy kernel starts to flatten out.
    pub cauchy_scale: f64,
    /// Capacity of the hypothesis pool. Sampling stops once this many hypotheses are accepted.
    pub max_hypotheses: usize,
    /// Maximum number of minimal samples drawn, including rejected ones.
    pub max_trials: usize,
    /// Number of correspondences revealed to the surviving hypotheses per pruning round.
    pub chunk_size: usize,
    /// See [`four_point::GeometricConsistency::min_area_ratio`].
    pub min_area_ratio: f64,
    /// Reprojection distance in pixels under which a correspondence counts as an inlier.
    pub inlier_threshold: f64,
    pub refine: RefineConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the [`Config::cauchy_scale`].
    #[must_use]
    pub fn cauchy_scale(self, cauchy_scale: f64) -> Self {
        Self {
            cauchy_scale,
            ..self
        }
    }

    /// Sets the [`Config::max_hypotheses`].
    #[must_use]
    pub fn max_hypotheses(self, max_hypotheses: usize) -> Self {
        Self {
            max_hypotheses,
            ..self
        }
    }

    /// Sets the [`Config::max_trials`].
    #[must_use]
    pub fn max_trials(self, max_trials: usize) -> Self {
        Self { max_trials, ..self }
    }

    /// Sets the [`Config::chunk_size`].
    #[must_use]
    pub fn chunk_size(self, chunk_size: usize) -> Self {
        Self { chunk_size, ..self }
    }

    /// Sets the [`Config::min_area_ratio`].
    #[must_use]
    pub fn min_area_ratio(self, min_area_ratio: f64) -> Self {
        Self {
            min_area_ratio,
            ..self
        }
    }

    /// Sets the [`Config::inlier_threshold`].
    #[must_use]
    pub fn inlier_threshold(self, inlier_threshold: f64) -> Self {
        Self {
            inlier_threshold,
            ..self
        }
    }

    /// Sets the [`Config::refine`] settings.
    #[must_use]
    pub fn refine(self, refine: RefineConfig) -> Self {
        Self { refine, ..self }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cauchy_scale: DEFAULT_CAUCHY_SCALE,
            max_hypotheses: DEFAULT_MAX_HYPOTHESES,
            max_trials: DEFAULT_MAX_TRIALS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_area_ratio: 1e-6,
            inlier_threshold: 3.0,
            refine: RefineConfig::default(),
        }
    }
}

/// Settings of the Levenberg-Marquardt polish.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(default))]
#[non_exhaustive]
pub struct RefineConfig {
    pub max_iterations: usize,
    /// Iterations that fail to improve the cost by at least [`RefineConfig::min_improvement`]
    /// before the polish gives up.
    pub max_non_improving_steps: usize,
    pub min_improvement: f64,
    /// Damping of the first step, relative to the diagonal of `J^T J`.
    pub initial_lambda: f64,
    /// Lower bound of the damping after accepted steps.
    pub min_lambda: f64,
    /// Upper bound of the damping after rejected steps.
    pub max_lambda: f64,
}

impl RefineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the [`RefineConfig::max_iterations`].
    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Sets the [`RefineConfig::max_non_improving_steps`].
    #[must_use]
    pub fn max_non_improving_steps(self, max_non_improving_steps: usize) -> Self {
        Self {
            max_non_improving_steps,
            ..self
        }
    }

    /// Sets the [`RefineConfig::min_improvement`].
    #[must_use]
    pub fn min_improvement(self, min_improvement: f64) -> Self {
        Self {
            min_improvement,
            ..self
        }
    }

    /// Sets the [`RefineConfig::initial_lambda`].
    #[must_use]
    pub fn initial_lambda(self, initial_lambda: f64) -> Self {
        Self {
            initial_lambda,
            ..self
        }
    }

    /// Sets the [`RefineConfig::min_lambda`].
    #[must_use]
    pub fn min_lambda(self, min_lambda: f64) -> Self {
        Self { min_lambda, ..self }
    }

    /// Sets the [`RefineConfig::max_lambda`].
    #[must_use]
    pub fn max_lambda(self, max_lambda: f64) -> Self {
        Self { max_lambda, ..self }
    }
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            max_non_improving_steps: 20,
            min_improvement: 1e-4,
            initial_lambda: 0.01,
            min_lambda: 1e-6,
            max_lambda: 1e5,
        }
    }
}
