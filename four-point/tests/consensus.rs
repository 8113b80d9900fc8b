use ar_core::{
    nalgebra::{Point2, Vector2},
    sample_consensus::{Consensus, Model},
    FeatureMatch, Homography, KeyPoint,
};
use arrsac::Arrsac;
use four_point::FourPoint;
use rand::{rngs::SmallRng, Rng, SeedableRng};

const INLIERS: usize = 30;
const OUTLIERS: usize = 5;

#[test]
fn arrsac_with_four_point() {
    let mut rng = SmallRng::seed_from_u64(0);
    let mut truth = Homography::similarity(Vector2::new(20.0, -10.0), 0.2, 1.3);
    truth.0.m31 = 5e-5;
    truth.0.m32 = -3e-5;

    let mut samples: Vec<FeatureMatch<KeyPoint>> = (0..INLIERS)
        .map(|_| {
            let p = Point2::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0));
            FeatureMatch(KeyPoint(p), KeyPoint(truth.transform_point(p).unwrap()))
        })
        .collect();
    samples.extend((0..OUTLIERS).map(|_| {
        FeatureMatch(
            KeyPoint::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)),
            KeyPoint::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)),
        )
    }));

    let mut arrsac = Arrsac::new(1.0, SmallRng::seed_from_u64(0));
    let homography = arrsac
        .model(&FourPoint::new(), samples.iter().cloned())
        .expect("arrsac found no homography");

    for inlier in &samples[..INLIERS] {
        assert!(homography.residual(inlier) < 1e-3);
    }
}
