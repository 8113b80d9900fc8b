use criterion::{criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use robust_homography::{
    nalgebra::{Point2, Vector2},
    Homography, RobustHomography,
};

const POINTS: usize = 200;
const OUTLIER_RATIO: f64 = 0.3;

fn correspondences() -> (Vec<Point2<f64>>, Vec<Point2<f64>>) {
    let mut rng = Pcg64::seed_from_u64(0);
    let mut truth = Homography::similarity(Vector2::new(30.0, -12.0), 0.15, 0.9);
    truth.0.m31 = 4e-5;
    truth.0.m32 = -6e-5;
    (0..POINTS)
        .map(|_| {
            let p = Point2::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0));
            let noise = if rng.gen_bool(OUTLIER_RATIO) {
                Vector2::new(rng.gen_range(-80.0..80.0), rng.gen_range(-80.0..80.0))
            } else {
                Vector2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5))
            };
            (p, truth.project(p) + noise)
        })
        .unzip()
}

fn find(c: &mut Criterion) {
    let (p, q) = correspondences();
    let mut estimator = RobustHomography::default();
    c.bench_function("find", |b| b.iter(|| estimator.find(&p, &q)));
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(640.0, 0.0),
        Point2::new(640.0, 480.0),
        Point2::new(0.0, 480.0),
    ];
    c.bench_function("find_with_test_points", |b| {
        b.iter(|| estimator.find_with_test_points(&p, &q, &corners))
    });
}

criterion_group!(
    name = robust_homography;
    config = Criterion::default().sample_size(10);
    targets = find
);
criterion_main!(robust_homography);
