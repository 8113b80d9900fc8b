use ar_core::{
    nalgebra::{Matrix3, Point2, Vector2},
    FeatureMatch, Homography, KeyPoint,
};
use four_point::FourPoint;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const ROUNDS: usize = 1000;
const RELATIVE_TOLERANCE: f64 = 1e-6;

const BOX_SIZE: f64 = 500.0;
const CORNER_JITTER: f64 = 100.0;
const PERSPECTIVE_MAGNITUDE: f64 = 1e-4;

#[test]
fn randomized_exactness() {
    let mut rng = Pcg64::seed_from_u64(0);
    let solver = FourPoint::new();
    for _ in 0..ROUNDS {
        let (truth, p, q) = some_test_data(&mut rng);
        let estimated = solver.solve(&p, &q).expect("solver rejected exact data");
        assert!(
            relative_error(&estimated, &truth) < RELATIVE_TOLERANCE,
            "estimated {:?} expected {:?}",
            estimated,
            truth
        );
    }
}

#[test]
fn randomized_scale_invariance() {
    let mut rng = Pcg64::seed_from_u64(1);
    let solver = FourPoint::new();
    for _ in 0..ROUNDS {
        let (truth, p, q) = some_test_data(&mut rng);
        let k: f64 = rng.gen_range(0.01..100.0);
        let scale = Matrix3::new(k, 0.0, 0.0, 0.0, k, 0.0, 0.0, 0.0, 1.0);
        let inv_scale = Matrix3::new(1.0 / k, 0.0, 0.0, 0.0, 1.0 / k, 0.0, 0.0, 0.0, 1.0);

        let scaled_q = q.map(|x| Point2::from(x.coords * k));
        let estimated = solver.solve(&p, &scaled_q).unwrap();
        assert!(relative_error(&estimated, &Homography(scale * truth.0)) < RELATIVE_TOLERANCE);

        let scaled_p = p.map(|x| Point2::from(x.coords * k));
        let estimated = solver.solve(&scaled_p, &q).unwrap();
        assert!(relative_error(&estimated, &Homography(truth.0 * inv_scale)) < RELATIVE_TOLERANCE);
    }
}

#[test]
fn matches_go_through_consistency_check() {
    let mut rng = Pcg64::seed_from_u64(2);
    let (truth, p, q) = some_test_data(&mut rng);
    let matches = p
        .iter()
        .zip(&q)
        .map(|(&a, &b)| FeatureMatch(KeyPoint(a), KeyPoint(b)));
    let estimated = FourPoint::new().from_matches(matches).unwrap();
    assert!(relative_error(&estimated, &truth) < RELATIVE_TOLERANCE);

    // Swapping two destinations flips the orientation of the quadrilateral.
    let matches = p
        .iter()
        .zip([q[1], q[0], q[2], q[3]])
        .map(|(&a, b)| FeatureMatch(KeyPoint(a), KeyPoint(b)));
    assert!(FourPoint::new().from_matches(matches).is_err());
}

fn relative_error(estimated: &Homography, truth: &Homography) -> f64 {
    let estimated = estimated.normalized().unwrap().0;
    let truth = truth.normalized().unwrap().0;
    (estimated - truth).norm() / truth.norm()
}

/// Gets a random orientation-preserving homography, four well-spread source points,
/// and the four destination points they map to.
pub fn some_test_data(rng: &mut impl Rng) -> (Homography, [Point2<f64>; 4], [Point2<f64>; 4]) {
    let mut truth = Homography::similarity(
        Vector2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(0.5..2.0),
    );
    truth.0.m31 = rng.gen_range(-PERSPECTIVE_MAGNITUDE..PERSPECTIVE_MAGNITUDE);
    truth.0.m32 = rng.gen_range(-PERSPECTIVE_MAGNITUDE..PERSPECTIVE_MAGNITUDE);

    let corners = [(0.0, 0.0), (BOX_SIZE, 0.0), (BOX_SIZE, BOX_SIZE), (0.0, BOX_SIZE)];
    let p = corners.map(|(x, y)| {
        Point2::new(
            x + rng.gen_range(-CORNER_JITTER..CORNER_JITTER),
            y + rng.gen_range(-CORNER_JITTER..CORNER_JITTER),
        )
    });
    let q = p.map(|x| truth.transform_point(x).unwrap());
    (truth, p, q)
}
