use crate::{CauchyCost, Config, Error, Result};
use ar_core::{nalgebra::Point2, Homography};
use float_ord::FloatOrd;
use four_point::FourPoint;
use log::*;
use rand::{seq::SliceRandom, Rng};

/// A candidate homography together with the sample that produced it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hypothesis {
    pub homography: Homography,
    /// The Cauchy cost accumulated over the correspondences revealed so far.
    pub cost: f64,
    /// Indices of the four correspondences the homography was solved from.
    pub sample: [usize; 4],
}

/// Preemptive RANSAC over a fixed pool of hypotheses.
///
/// All hypotheses are generated up front. The correspondences are then revealed in chunks
/// in a random order and after every chunk the worse half of the surviving hypotheses is
/// dropped, so that the total scoring work stays close to linear in the pool size.
///
/// The buffers are kept between calls so that repeated estimation does not allocate once
/// they have grown to the largest input seen.
#[derive(Clone, Debug, Default)]
pub struct PreemptiveRansac {
    hypotheses: Vec<Hypothesis>,
    permutation: Vec<usize>,
}

impl PreemptiveRansac {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes room for a pool of `max_hypotheses`. The point permutation grows on demand.
    pub fn reserve(&mut self, max_hypotheses: usize) {
        self.hypotheses
            .reserve(max_hypotheses.saturating_sub(self.hypotheses.len()));
    }

    /// Finds the hypothesis with the lowest cost after pruning.
    ///
    /// When `test_points` is non-empty, hypotheses that flip the orientation of any
    /// consecutive triple of test points are discarded.
    ///
    /// `p` and `q` must have the same length.
    pub fn run<R>(
        &mut self,
        config: &Config,
        solver: &FourPoint,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
        test_points: &[Point2<f64>],
        rng: &mut R,
    ) -> Result<Hypothesis>
    where
        R: Rng + ?Sized,
    {
        assert_eq!(p.len(), q.len(), "every source point needs a destination point");
        let n = p.len();
        if n < 4 {
            return Err(Error::InsufficientPoints { found: n });
        }

        let trials = self.hypothesize(config, solver, p, q, test_points, rng);
        if self.hypotheses.is_empty() {
            debug!("no hypothesis survived {} minimal samples", trials);
            return Err(Error::NoValidHypotheses { trials });
        }
        debug!(
            "generated {} hypotheses from {} minimal samples",
            self.hypotheses.len(),
            trials
        );

        let survivors = self.prune(config, p, q);
        let best = self.hypotheses[..survivors]
            .iter()
            .min_by_key(|h| FloatOrd(h.cost))
            .copied()
            .ok_or(Error::NoValidHypotheses { trials })?;
        trace!(
            "best hypothesis from sample {:?} has cost {}",
            best.sample,
            best.cost
        );
        Ok(Hypothesis {
            homography: best.homography.normalized().unwrap_or(best.homography),
            ..best
        })
    }

    /// Fills the pool and returns the number of samples drawn.
    fn hypothesize<R>(
        &mut self,
        config: &Config,
        solver: &FourPoint,
        p: &[Point2<f64>],
        q: &[Point2<f64>],
        test_points: &[Point2<f64>],
        rng: &mut R,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        self.permutation.clear();
        self.permutation.extend(0..p.len());
        self.permutation.shuffle(rng);
        self.hypotheses.clear();

        let mut trials = 0;
        while trials < config.max_trials && self.hypotheses.len() < config.max_hypotheses {
            trials += 1;
            let (chosen, _) = self.permutation.partial_shuffle(rng, 4);
            let sample = [chosen[0], chosen[1], chosen[2], chosen[3]];
            let ps = sample.map(|ix| p[ix]);
            let qs = sample.map(|ix| q[ix]);

            if !solver.consistency.sample_consistent(&ps, &qs) {
                trace!("sample {:?} is geometrically inconsistent", sample);
                continue;
            }
            let homography = match solver.solve(&ps, &qs) {
                Ok(homography) => homography,
                Err(e) => {
                    trace!("sample {:?} rejected: {}", sample, e);
                    continue;
                }
            };
            if !test_points.is_empty()
                && !solver.consistency.points_consistent(&homography, test_points)
            {
                trace!("sample {:?} flips the test points", sample);
                continue;
            }
            self.hypotheses.push(Hypothesis {
                homography,
                cost: 0.0,
                sample,
            });
        }
        trials
    }

    /// Scores the pool chunk by chunk, halving it after each chunk until at most two hypotheses
    /// remain. The first chunk is always scored, even for a pool of one or two. Returns the
    /// number of survivors, which are kept at the front of the pool.
    fn prune(&mut self, config: &Config, p: &[Point2<f64>], q: &[Point2<f64>]) -> usize {
        let cost = CauchyCost::new(config.cauchy_scale);
        let chunk_size = config.chunk_size.clamp(1, p.len());
        let mut remaining = self.hypotheses.len();
        for (round, chunk) in self.permutation.chunks(chunk_size).enumerate() {
            if round > 0 && remaining <= 2 {
                break;
            }
            let survivors = &mut self.hypotheses[..remaining];
            for hypothesis in survivors.iter_mut() {
                hypothesis.cost += cost.total_indexed(&hypothesis.homography, p, q, chunk);
            }
            if remaining > 2 {
                let keep = remaining / 2;
                survivors.select_nth_unstable_by_key(keep - 1, |h| FloatOrd(h.cost));
                remaining = keep;
                trace!("pruned to {} hypotheses", remaining);
            }
        }
        remaining
    }
}
